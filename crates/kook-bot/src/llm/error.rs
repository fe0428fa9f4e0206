//! LLM error types

use thiserror::Error;

/// Errors that can occur when calling the chat-completions API
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key configured
    #[error("LLM API key is not configured")]
    NotConfigured,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The response carried no message content
    #[error("Response contained no choices")]
    EmptyResponse,
}
