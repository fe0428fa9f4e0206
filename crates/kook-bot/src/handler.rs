//! Gateway event handler for the bot

use crate::api::PlatformApi;
use crate::assistant::Assistant;
use anyhow::Context;
use async_trait::async_trait;
use kook_gateway::router::log_message;
use kook_gateway::{EventHandler, MessageEvent};
use std::sync::Arc;
use tracing::{debug, info};

/// Replies to messages that mention the bot
pub struct BotHandler {
    platform: Arc<dyn PlatformApi>,
    assistant: Assistant,
    bot_id: String,
    mention: String,
}

impl BotHandler {
    #[must_use]
    pub fn new(platform: Arc<dyn PlatformApi>, assistant: Assistant, bot_id: impl Into<String>) -> Self {
        let bot_id = bot_id.into();
        let mention = mention_of(&bot_id);
        Self {
            platform,
            assistant,
            bot_id,
            mention,
        }
    }

    /// The query addressed to the bot, if the message mentions it
    fn query(&self, event: &MessageEvent) -> Option<String> {
        if !event.message_type.is_textual() || !event.content.contains(&self.mention) {
            return None;
        }
        Some(event.content.replace(&self.mention, "").trim().to_string())
    }
}

/// KMarkdown mention markup for a user
#[must_use]
pub fn mention_of(user_id: &str) -> String {
    format!("(met){user_id}(met)")
}

#[async_trait]
impl EventHandler for BotHandler {
    async fn on_message(&self, event: &MessageEvent) -> anyhow::Result<()> {
        if event.author_id == self.bot_id {
            debug!(msg_id = %event.msg_id, "Ignoring own message");
            return Ok(());
        }

        log_message(event);

        let Some(query) = self.query(event) else {
            return Ok(());
        };

        info!(author_id = %event.author_id, target_id = %event.target_id, "Bot mentioned");
        let reply = self.assistant.reply(&query).await;
        let content = format!("{} {reply}", mention_of(&event.author_id));

        self.platform
            .create_message(&event.target_id, &content)
            .await
            .with_context(|| format!("failed to reply in {}", event.target_id))
    }
}
