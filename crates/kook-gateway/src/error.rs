//! Gateway error types

use kook_common::AppError;
use std::time::Duration;
use thiserror::Error;

/// Endpoint resolution errors
///
/// All of these are retryable and leave the session intact.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The HTTP request itself failed
    #[error("Endpoint request failed: {0}")]
    Request(String),

    /// The API answered with a non-zero application code
    #[error("Endpoint rejected (code {code}): {message}")]
    Api { code: i64, message: String },

    /// The response did not carry a usable URL
    #[error("Endpoint response is malformed: {0}")]
    InvalidResponse(String),
}

/// Transport errors
///
/// Retryable with resume: the session is preserved across them.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("Read failed: {0}")]
    Receive(String),

    #[error("Write failed: {0}")]
    Send(String),

    /// The server closed the stream
    #[error("Connection closed by server")]
    Closed,

    /// The writer task is gone
    #[error("Writer channel closed")]
    WriterClosed,

    #[error("No Hello received within {0:?}")]
    HelloTimeout(Duration),
}

/// Gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A retry budget ran out; fatal
    #[error("Gave up after {attempts} attempts: {reason}")]
    ConnectionExhausted { attempts: u32, reason: String },
}

impl GatewayError {
    /// Whether the manager may try again
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::ConnectionExhausted { .. })
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::ConnectionExhausted { .. } => Self::ConnectionExhausted(err.to_string()),
            other => Self::gateway(other),
        }
    }
}

/// Gateway result type
pub type GatewayResult<T> = Result<T, GatewayError>;
