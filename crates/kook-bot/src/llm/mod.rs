//! LLM backend

mod client;
mod error;

pub use client::DeepSeekClient;
pub use error::LlmError;

use async_trait::async_trait;

/// Produces a reply for a single user message
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, user_message: &str) -> Result<String, LlmError>;
}
