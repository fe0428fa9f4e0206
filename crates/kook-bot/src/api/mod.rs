//! Platform REST API
//!
//! Thin wrapper over the KOOK v3 endpoints the bot needs.

mod client;
mod error;
mod types;

pub use client::KookApi;
pub use error::{ApiError, ApiResult};
pub use types::{CurrentUser, Game};

use async_trait::async_trait;

/// Platform operations used by the assistant and the event handler
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn list_games(&self) -> ApiResult<Vec<Game>>;

    async fn add_game_activity(&self, game_id: i64) -> ApiResult<()>;

    async fn delete_game_activity(&self) -> ApiResult<()>;

    async fn create_message(&self, channel_id: &str, content: &str) -> ApiResult<()>;
}
