//! Gateway events
//!
//! Event payloads delivered by the gateway and their classification.

mod event_types;
mod payloads;

pub use event_types::{MessageType, SystemEventKind, SYSTEM_EVENT_TYPE};
pub use payloads::{EventData, GatewayEvent, MessageEvent, SystemEvent};
