//! Connection management
//!
//! Session state, endpoint resolution, the transport seam and the manager
//! that ties them together.

mod connection;
mod endpoint;
mod manager;
mod retry;
mod session;
mod transport;
mod websocket;

pub use connection::ActiveConnection;
pub use endpoint::{Endpoint, EndpointResolver};
pub use manager::GatewaySessionManager;
pub use retry::{RetryBudget, RetryDecision};
pub use session::{ConnectionStatus, EpochReader, ResumeParams, SequenceReader, Session};
pub use transport::{Connector, FrameSink, FrameSource, InboundFrame, Transport};
pub use websocket::WsConnector;
