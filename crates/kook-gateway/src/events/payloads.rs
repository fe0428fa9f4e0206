//! Event payload definitions
//!
//! The raw `d` of an Event signal and the typed events routed to handlers.

use super::{MessageType, SystemEventKind, SYSTEM_EVENT_TYPE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw event payload (the `d` of an `s=0` frame)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    /// `GROUP`, `PERSON` or `BROADCAST`
    #[serde(default)]
    pub channel_type: String,

    /// Message type, 255 for system events
    #[serde(rename = "type")]
    pub kind: u32,

    /// Channel (or user, for direct messages) the event belongs to
    #[serde(default)]
    pub target_id: String,

    #[serde(default)]
    pub author_id: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub msg_id: String,

    /// Milliseconds since the epoch
    #[serde(default)]
    pub msg_timestamp: i64,

    #[serde(default)]
    pub nonce: String,

    #[serde(default)]
    pub extra: Value,
}

impl EventData {
    #[must_use]
    pub const fn is_system(&self) -> bool {
        self.kind == SYSTEM_EVENT_TYPE
    }
}

/// A user message
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    pub message_type: MessageType,
    pub channel_type: String,
    pub target_id: String,
    pub author_id: String,
    pub content: String,
    pub msg_id: String,
    pub msg_timestamp: i64,
    pub nonce: String,
    pub extra: Value,
}

impl MessageEvent {
    /// When the message was sent, if the timestamp is valid
    #[must_use]
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.msg_timestamp)
    }
}

/// A system notification (membership, profile, button clicks)
#[derive(Debug, Clone, PartialEq)]
pub struct SystemEvent {
    pub kind: SystemEventKind,
    pub target_id: String,
    pub msg_id: String,
    pub msg_timestamp: i64,
    /// `extra.body`, `Null` when absent
    pub body: Value,
    /// The full `extra` object
    pub extra: Value,
}

impl SystemEvent {
    /// Read a body field as a string, accepting numbers
    #[must_use]
    pub fn body_str(&self, key: &str) -> Option<String> {
        match self.body.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// An event ready for a handler
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    Message(MessageEvent),
    System(SystemEvent),
}

impl From<EventData> for GatewayEvent {
    fn from(data: EventData) -> Self {
        if data.is_system() {
            let kind = data
                .extra
                .get("type")
                .and_then(Value::as_str)
                .map_or_else(
                    || SystemEventKind::Other(String::new()),
                    SystemEventKind::from_name,
                );
            let body = data.extra.get("body").cloned().unwrap_or(Value::Null);

            Self::System(SystemEvent {
                kind,
                target_id: data.target_id,
                msg_id: data.msg_id,
                msg_timestamp: data.msg_timestamp,
                body,
                extra: data.extra,
            })
        } else {
            Self::Message(MessageEvent {
                message_type: MessageType::from_u32(data.kind),
                channel_type: data.channel_type,
                target_id: data.target_id,
                author_id: data.author_id,
                content: data.content,
                msg_id: data.msg_id,
                msg_timestamp: data.msg_timestamp,
                nonce: data.nonce,
                extra: data.extra,
            })
        }
    }
}

impl GatewayEvent {
    /// Short label for logs
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Message(msg) => format!("message:{}", msg.message_type.name()),
            Self::System(sys) => format!("system:{}", sys.kind),
        }
    }
}
