//! Transport seam
//!
//! The manager talks to the socket only through these traits, so the
//! WebSocket stack can be swapped for a scripted one in tests.

use crate::error::TransportError;
use async_trait::async_trait;

/// A frame read from the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Possibly zlib-compressed
    Binary(Vec<u8>),
    /// Never compressed
    Text(String),
}

/// Write half of a connection
#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the connection politely
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Read half of a connection
#[async_trait]
pub trait FrameSource: Send {
    /// Next data frame; `None` once the stream has ended
    async fn next_frame(&mut self) -> Option<Result<InboundFrame, TransportError>>;
}

/// An open connection split into halves
pub struct Transport {
    pub sink: Box<dyn FrameSink>,
    pub source: Box<dyn FrameSource>,
}

impl Transport {
    #[must_use]
    pub fn new(sink: Box<dyn FrameSink>, source: Box<dyn FrameSource>) -> Self {
        Self { sink, source }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

/// Opens connections
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Transport, TransportError>;
}
