//! Signal payload types
//!
//! Data structures carried in the `d` field of gateway frames.

use serde::{Deserialize, Serialize};

/// Default capability bitmask (guild messages and direct messages)
pub const DEFAULT_INTENTS: u32 = 513;

/// Identify payload (client -> server)
///
/// Sent once right after every connect.
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Bot token
    pub token: String,

    /// Capability bitmask
    pub intents: u32,

    /// `[shard_id, shard_count]`
    pub shard: [u32; 2],
}

impl IdentifyPayload {
    /// Create an Identify payload for a single unsharded connection
    #[must_use]
    pub fn new(token: impl Into<String>, intents: u32) -> Self {
        Self {
            token: token.into(),
            intents,
            shard: [0, 1],
        }
    }
}

impl std::fmt::Debug for IdentifyPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifyPayload")
            .field("token", &"<redacted>")
            .field("intents", &self.intents)
            .field("shard", &self.shard)
            .finish()
    }
}

/// Hello payload (server -> client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Handshake result, 0 on success
    pub code: u32,

    /// Session assigned by the server; present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Reconnect payload (server -> client)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconnectPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,

    /// Human-readable reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

/// Resume acknowledgement payload (server -> client)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeAckPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}
