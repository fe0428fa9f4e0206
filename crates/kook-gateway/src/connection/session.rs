//! Session state
//!
//! The gateway session survives reconnects: `session_id` and `last_sequence`
//! are carried into the next attempt so the server can replay missed events.
//! Only the manager mutates it; other tasks get read-only handles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// No connection and none in progress
    Disconnected,
    /// Asking the REST API for a gateway URL
    ResolvingEndpoint,
    /// Opening the WebSocket
    Connecting,
    /// Waiting for Hello on a fresh session
    Authenticating,
    /// Waiting for Hello on a connection that carried resume parameters
    Resuming,
    /// Hello accepted, events flowing
    Connected,
    /// Between attempts
    Reconnecting,
}

impl ConnectionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::ResolvingEndpoint => "resolving_endpoint",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Resuming => "resuming",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        }
    }

    /// Whether a Hello is being awaited
    #[must_use]
    pub const fn is_handshaking(self) -> bool {
        matches!(self, Self::Authenticating | Self::Resuming)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters appended to the gateway URL to resume a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeParams {
    pub session_id: String,
    pub sequence: u64,
}

/// Read-only view of the last accepted sequence
#[derive(Debug, Clone)]
pub struct SequenceReader(Arc<AtomicU64>);

impl SequenceReader {
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

/// Read-only view of the session epoch
///
/// The epoch changes every time the session is invalidated, so work queued
/// under an older epoch belongs to a session that no longer exists.
#[derive(Debug, Clone)]
pub struct EpochReader(Arc<AtomicU64>);

impl EpochReader {
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

/// Gateway session
#[derive(Debug)]
pub struct Session {
    session_id: Option<String>,
    last_sequence: Arc<AtomicU64>,
    epoch: Arc<AtomicU64>,
    status: watch::Sender<ConnectionStatus>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty, disconnected session
    #[must_use]
    pub fn new() -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            session_id: None,
            last_sequence: Arc::new(AtomicU64::new(0)),
            epoch: Arc::new(AtomicU64::new(0)),
            status,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[must_use]
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence.load(Ordering::Acquire)
    }

    /// Accept an event sequence
    ///
    /// Returns `true` only when `sn` is strictly greater than the last accepted
    /// value; duplicates and replays of older events are rejected.
    pub fn accept_sequence(&mut self, sn: u64) -> bool {
        let current = self.last_sequence();
        if sn <= current {
            return false;
        }
        self.last_sequence.store(sn, Ordering::Release);
        true
    }

    /// Record the session assigned by a successful Hello
    ///
    /// A different id than the one held means the server refused the resume:
    /// the sequence restarts at 0 and the epoch moves on, as in
    /// [`Session::invalidate`]. Returns `true` in that case.
    pub fn establish(&mut self, session_id: impl Into<String>) -> bool {
        let session_id = session_id.into();
        let replaced = match self.session_id.as_deref() {
            Some(current) if current != session_id => {
                tracing::warn!(
                    session_id = %session_id,
                    previous = %current,
                    last_sequence = self.last_sequence(),
                    "Resume refused, server assigned a new session"
                );
                self.last_sequence.store(0, Ordering::Release);
                self.epoch.fetch_add(1, Ordering::AcqRel);
                true
            }
            Some(_) => false,
            None => {
                tracing::debug!(session_id = %session_id, "Session established");
                false
            }
        };
        self.session_id = Some(session_id);
        replaced
    }

    /// Forget the session; the next connection starts fresh
    pub fn invalidate(&mut self) {
        if let Some(id) = self.session_id.take() {
            tracing::info!(
                session_id = %id,
                last_sequence = self.last_sequence(),
                "Session invalidated"
            );
        }
        self.last_sequence.store(0, Ordering::Release);
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// Resume parameters, if the session can be resumed
    #[must_use]
    pub fn resume_params(&self) -> Option<ResumeParams> {
        let sequence = self.last_sequence();
        match &self.session_id {
            Some(id) if sequence > 0 => Some(ResumeParams {
                session_id: id.clone(),
                sequence,
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn set_status(&mut self, status: ConnectionStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            tracing::debug!(from = %previous, to = %status, "Connection status changed");
        }
    }

    /// Subscribe to status changes
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn sequence_reader(&self) -> SequenceReader {
        SequenceReader(Arc::clone(&self.last_sequence))
    }

    #[must_use]
    pub fn epoch_reader(&self) -> EpochReader {
        EpochReader(Arc::clone(&self.epoch))
    }
}
