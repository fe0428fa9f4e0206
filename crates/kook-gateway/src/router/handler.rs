//! Event handler trait

use crate::events::{MessageEvent, MessageType, SystemEvent, SystemEventKind};
use async_trait::async_trait;

/// Receives routed gateway events
///
/// Both methods default to logging the event. Errors are logged by the
/// router and never reach the connection.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn on_message(&self, event: &MessageEvent) -> anyhow::Result<()> {
        log_message(event);
        Ok(())
    }

    async fn on_system_event(&self, event: &SystemEvent) -> anyhow::Result<()> {
        log_system_event(event);
        Ok(())
    }
}

/// Log a message with its routing fields
pub fn log_message(event: &MessageEvent) {
    match event.message_type {
        MessageType::Unknown(kind) => tracing::info!(
            kind,
            target_id = %event.target_id,
            author_id = %event.author_id,
            msg_id = %event.msg_id,
            "Received message of unknown type"
        ),
        kind => tracing::info!(
            kind = kind.name(),
            target_id = %event.target_id,
            author_id = %event.author_id,
            content = %event.content,
            "Received message"
        ),
    }
}

/// Log a system event with the body fields relevant to its kind
pub fn log_system_event(event: &SystemEvent) {
    let field = |key: &str| event.body_str(key).unwrap_or_default();

    match &event.kind {
        SystemEventKind::JoinedChannel => tracing::info!(
            user_id = %field("user_id"),
            channel_id = %field("channel_id"),
            joined_at = %field("joined_at"),
            "User joined voice channel"
        ),
        SystemEventKind::ExitedChannel => tracing::info!(
            user_id = %field("user_id"),
            channel_id = %field("channel_id"),
            exited_at = %field("exited_at"),
            "User left voice channel"
        ),
        SystemEventKind::UserUpdated => tracing::info!(
            user_id = %field("user_id"),
            username = %field("username"),
            avatar = %field("avatar"),
            "User profile updated"
        ),
        SystemEventKind::SelfJoinedGuild => tracing::info!(
            guild_id = %field("guild_id"),
            state = %field("state"),
            "Joined guild"
        ),
        SystemEventKind::SelfExitedGuild => {
            tracing::info!(guild_id = %field("guild_id"), "Left guild");
        }
        SystemEventKind::MessageBtnClick => tracing::info!(
            user_id = %field("user_id"),
            msg_id = %field("msg_id"),
            value = %field("value"),
            "Card button clicked"
        ),
        SystemEventKind::Other(name) => tracing::info!(
            kind = %name,
            extra = %event.extra,
            "Received unknown system event"
        ),
    }
}
