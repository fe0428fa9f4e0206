//! Outbound gateway frames
//!
//! Every frame the client writes to the socket is built here.

use super::{IdentifyPayload, SignalCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Gateway frame format
///
/// `{ "s": <signal>, "sn": <sequence>?, "d": <payload>? }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayFrame {
    /// Signal code
    pub s: SignalCode,

    /// Sequence number (heartbeats and events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sn: Option<u64>,

    /// Payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayFrame {
    /// Create the Identify frame
    ///
    /// Sent with signal 2 (the heartbeat code) and no `sn`.
    #[must_use]
    pub fn identify(payload: &IdentifyPayload) -> Self {
        Self {
            s: SignalCode::Ping,
            sn: None,
            d: Some(json!({
                "token": payload.token,
                "intents": payload.intents,
                "shard": payload.shard,
            })),
        }
    }

    /// Create a heartbeat Ping carrying the last accepted sequence
    #[must_use]
    pub fn ping(last_sequence: u64) -> Self {
        Self {
            s: SignalCode::Ping,
            sn: Some(last_sequence),
            d: None,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl std::fmt::Display for GatewayFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.sn {
            Some(sn) => write!(f, "GatewayFrame(s={}, sn={sn})", self.s),
            None => write!(f, "GatewayFrame(s={})", self.s),
        }
    }
}
