//! # kook-gateway
//!
//! Client for the KOOK real-time gateway: frame decompression, signal
//! decoding, session tracking with resume, heartbeats, bounded reconnects and
//! event routing.

pub mod codec;
pub mod connection;
pub mod error;
pub mod events;
pub mod heartbeat;
pub mod protocol;
pub mod router;

pub use connection::{
    ConnectionStatus, Connector, EndpointResolver, GatewaySessionManager, Session, WsConnector,
};
pub use error::{EndpointError, GatewayError, GatewayResult, TransportError};
pub use events::{GatewayEvent, MessageEvent, MessageType, SystemEvent, SystemEventKind};
pub use router::EventHandler;
