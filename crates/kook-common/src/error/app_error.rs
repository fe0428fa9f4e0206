//! Application error types
//!
//! Unified error handling at the process boundary.

use crate::config::ConfigError;
use crate::telemetry::TracingError;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Startup errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tracing(#[from] TracingError),

    // Gateway errors
    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Gateway connection exhausted: {0}")]
    ConnectionExhausted(String),

    // External service errors
    #[error("Platform API error: {0}")]
    Api(String),

    #[error("LLM service error: {0}")]
    Llm(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Get a stable error code for logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Tracing(_) => "TRACING_ERROR",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::ConnectionExhausted(_) => "CONNECTION_EXHAUSTED",
            Self::Api(_) => "API_ERROR",
            Self::Llm(_) => "LLM_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Process exit code for this error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Tracing(_) => 2,
            _ => 1,
        }
    }

    /// Whether this error ends the process rather than a single operation
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Tracing(_) | Self::ConnectionExhausted(_)
        )
    }

    /// Create a gateway error
    #[must_use]
    pub fn gateway(msg: impl fmt::Display) -> Self {
        Self::Gateway(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
