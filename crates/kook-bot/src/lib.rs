//! # kook-bot
//!
//! KOOK chat bot: REST client, LLM-backed assistant and the gateway event
//! handler that ties them together.

pub mod api;
pub mod assistant;
pub mod handler;
pub mod llm;

pub use api::{ApiError, KookApi, PlatformApi};
pub use assistant::{Assistant, Tool};
pub use handler::BotHandler;
pub use llm::{ChatModel, DeepSeekClient, LlmError};

use kook_common::{AppConfig, AppError, AppResult};
use kook_gateway::{GatewaySessionManager, WsConnector};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run the bot until shutdown or until the gateway gives up
pub async fn run(config: AppConfig, shutdown: CancellationToken) -> AppResult<()> {
    let api = Arc::new(KookApi::from_config(&config.bot, &config.gateway)?);

    let bot_id = match config.bot.user_id.clone() {
        Some(id) => id,
        None => {
            let me = api.current_user().await?;
            info!(user_id = %me.id, username = %me.username, "Resolved bot identity");
            me.id
        }
    };

    let llm: Option<Arc<dyn ChatModel>> = match DeepSeekClient::new(&config.llm) {
        Ok(client) => Some(Arc::new(client)),
        Err(LlmError::NotConfigured) => {
            info!("DEEPSEEK_API_KEY not set, LLM replies disabled");
            None
        }
        Err(e) => return Err(AppError::Llm(e.to_string())),
    };

    let assistant = Assistant::new(llm, api.clone());
    let handler = Arc::new(BotHandler::new(api.clone(), assistant, bot_id));

    let mut manager = GatewaySessionManager::new(
        config.gateway,
        config.bot.token,
        api,
        Arc::new(WsConnector::new()),
        handler,
    );

    manager.run(shutdown).await?;
    info!("Gateway session ended");
    Ok(())
}
