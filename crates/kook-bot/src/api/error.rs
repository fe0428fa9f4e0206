//! Platform API error types

use kook_common::AppError;
use kook_gateway::EndpointError;
use thiserror::Error;

/// REST API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Non-zero application code in the response envelope
    #[error("API error (code {code}): {message}")]
    Api { code: i64, message: String },

    /// Response body did not match the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

impl From<ApiError> for EndpointError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Api { code, message } => Self::Api { code, message },
            ApiError::Decode(msg) => Self::InvalidResponse(msg),
            other => Self::Request(other.to_string()),
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        Self::Api(err.to_string())
    }
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;
