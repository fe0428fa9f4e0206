//! Inbound signal decoding
//!
//! Turns the text of one gateway frame into a typed [`Signal`].

use super::{HelloCode, HelloPayload, ReconnectPayload, ResumeAckPayload, SignalCode};
use crate::events::EventData;
use serde::Deserialize;
use serde_json::Value;

/// A decoded inbound signal
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Handshake result
    Hello {
        code: HelloCode,
        session_id: Option<String>,
    },
    /// Platform event with its sequence number
    Event { sequence: u64, data: EventData },
    /// Server-side ping
    Ping,
    /// Heartbeat acknowledgement
    Pong,
    /// Server demands a fresh session
    Reconnect {
        code: Option<u32>,
        message: Option<String>,
    },
    /// Resume completed
    ResumeAck { session_id: Option<String> },
    /// Signal code this client does not handle
    Unknown { code: u64, raw: Value },
}

impl Signal {
    /// Get the name of this signal for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "Hello",
            Self::Event { .. } => "Event",
            Self::Ping => "Ping",
            Self::Pong => "Pong",
            Self::Reconnect { .. } => "Reconnect",
            Self::ResumeAck { .. } => "ResumeAck",
            Self::Unknown { .. } => "Unknown",
        }
    }
}

/// Signal decoding errors
///
/// Never fatal: the frame is logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Frame is missing field `{0}`")]
    MissingField(&'static str),

    #[error("Invalid {signal} payload: {reason}")]
    InvalidPayload {
        signal: &'static str,
        reason: String,
    },
}

#[derive(Deserialize)]
struct RawFrame {
    s: Option<u64>,
    #[serde(default)]
    sn: Option<u64>,
    #[serde(default)]
    d: Option<Value>,
}

/// Parse one decoded frame
///
/// # Errors
/// Returns [`DecodeError`] when the text is not JSON, has no `s`, or carries a
/// malformed Hello or Event payload
pub fn parse(text: &str) -> Result<Signal, DecodeError> {
    let raw: Value = serde_json::from_str(text)?;
    let frame = RawFrame::deserialize(&raw)?;
    let code = frame.s.ok_or(DecodeError::MissingField("s"))?;

    // Resume is client-only and falls through to Unknown
    let signal = u8::try_from(code)
        .ok()
        .and_then(SignalCode::from_u8)
        .filter(|signal| *signal != SignalCode::Resume);

    match signal {
        Some(SignalCode::Hello) => parse_hello(frame.d),
        Some(SignalCode::Event) => parse_event(frame.sn, frame.d),
        Some(SignalCode::Ping) => Ok(Signal::Ping),
        Some(SignalCode::Pong) => Ok(Signal::Pong),
        Some(SignalCode::Reconnect) => {
            let payload: ReconnectPayload = optional_payload(frame.d, "Reconnect")?;
            Ok(Signal::Reconnect {
                code: payload.code,
                message: payload.err,
            })
        }
        Some(SignalCode::ResumeAck) => {
            let payload: ResumeAckPayload = optional_payload(frame.d, "ResumeAck")?;
            Ok(Signal::ResumeAck {
                session_id: payload.session_id,
            })
        }
        Some(SignalCode::Resume) | None => Ok(Signal::Unknown { code, raw }),
    }
}

fn parse_hello(d: Option<Value>) -> Result<Signal, DecodeError> {
    let d = d.ok_or(DecodeError::MissingField("d"))?;
    if d.get("code").is_none() {
        return Err(DecodeError::MissingField("d.code"));
    }

    let payload: HelloPayload =
        serde_json::from_value(d).map_err(|e| DecodeError::InvalidPayload {
            signal: "Hello",
            reason: e.to_string(),
        })?;

    let code = HelloCode::from_u32(payload.code);
    let session_id = payload.session_id.filter(|id| !id.is_empty());
    if code.is_success() && session_id.is_none() {
        return Err(DecodeError::MissingField("d.session_id"));
    }

    Ok(Signal::Hello { code, session_id })
}

fn parse_event(sn: Option<u64>, d: Option<Value>) -> Result<Signal, DecodeError> {
    let sequence = sn.ok_or(DecodeError::MissingField("sn"))?;
    let d = d.ok_or(DecodeError::MissingField("d"))?;
    if !d.is_object() {
        return Err(DecodeError::InvalidPayload {
            signal: "Event",
            reason: "`d` is not an object".to_string(),
        });
    }

    let data = serde_json::from_value(d).map_err(|e| DecodeError::InvalidPayload {
        signal: "Event",
        reason: e.to_string(),
    })?;

    Ok(Signal::Event { sequence, data })
}

fn optional_payload<T>(d: Option<Value>, signal: &'static str) -> Result<T, DecodeError>
where
    T: Default + serde::de::DeserializeOwned,
{
    match d {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value).map_err(|e| DecodeError::InvalidPayload {
            signal,
            reason: e.to_string(),
        }),
    }
}
