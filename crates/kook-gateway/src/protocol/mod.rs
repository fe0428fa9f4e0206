//! Gateway protocol definitions
//!
//! Signal codes, hello codes, payloads, outbound frames and the inbound decoder.

mod hello_codes;
mod messages;
mod payloads;
mod signal;
mod signal_codes;

pub use hello_codes::HelloCode;
pub use messages::GatewayFrame;
pub use payloads::{
    HelloPayload, IdentifyPayload, ReconnectPayload, ResumeAckPayload, DEFAULT_INTENTS,
};
pub use signal::{parse, DecodeError, Signal};
pub use signal_codes::SignalCode;
