//! Gateway endpoint
//!
//! The WebSocket URL for one connection attempt, built fresh every time.

use super::ResumeParams;
use crate::error::EndpointError;
use async_trait::async_trait;
use url::form_urlencoded;

/// Resolves the WebSocket URL through the REST API
#[async_trait]
pub trait EndpointResolver: Send + Sync {
    /// Fetch a gateway URL, asking for zlib frames when `compress` is set
    async fn resolve(&self, compress: bool) -> Result<String, EndpointError>;
}

/// Resolved URL plus optional resume parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
    resume: Option<ResumeParams>,
}

impl Endpoint {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            resume: None,
        }
    }

    #[must_use]
    pub fn with_resume(mut self, resume: Option<ResumeParams>) -> Self {
        self.resume = resume;
        self
    }

    #[must_use]
    pub fn is_resume(&self) -> bool {
        self.resume.is_some()
    }

    #[must_use]
    pub fn resume(&self) -> Option<&ResumeParams> {
        self.resume.as_ref()
    }

    /// The URL to open
    ///
    /// Resolved URLs always carry a query string, so resume parameters are
    /// appended with `&`. The session id is form-encoded.
    #[must_use]
    pub fn connect_url(&self) -> String {
        match &self.resume {
            Some(params) => format!(
                "{}&resume=1&sn={}&session_id={}",
                self.url,
                params.sequence,
                form_urlencoded::byte_serialize(params.session_id.as_bytes()).collect::<String>()
            ),
            None => self.url.clone(),
        }
    }

    /// Scheme, host and path only, safe for logs (query carries the token)
    #[must_use]
    pub fn display_url(&self) -> &str {
        self.url
            .split_once('?')
            .map_or(self.url.as_str(), |(base, _)| base)
    }
}
