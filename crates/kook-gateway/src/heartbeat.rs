//! Heartbeat scheduler
//!
//! Sends `{"s":2,"sn":<last_sequence>}` on a fixed interval for the lifetime of
//! one connection. The scheduler has no retry logic of its own: the first
//! failed send is reported and the loop ends.

use crate::connection::SequenceReader;
use crate::error::TransportError;
use crate::protocol::GatewayFrame;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatState {
    Idle,
    Running,
    Stopped,
}

/// Per-connection heartbeat loop
#[derive(Debug)]
pub struct HeartbeatScheduler {
    interval: Duration,
    state: HeartbeatState,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl HeartbeatScheduler {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: HeartbeatState::Idle,
            cancel: CancellationToken::new(),
            handle: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> HeartbeatState {
        self.state
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, HeartbeatState::Running)
    }

    /// Start the loop
    ///
    /// Returns `false` without doing anything unless the scheduler is idle.
    pub fn start(
        &mut self,
        sequence: SequenceReader,
        outbound: mpsc::Sender<GatewayFrame>,
        failures: mpsc::Sender<TransportError>,
    ) -> bool {
        if self.state != HeartbeatState::Idle {
            return false;
        }

        let interval = self.interval;
        let cancel = self.cancel.clone();
        self.handle = Some(tokio::spawn(run_heartbeat(
            interval, sequence, outbound, failures, cancel,
        )));
        self.state = HeartbeatState::Running;

        tracing::debug!(interval_ms = interval.as_millis(), "Heartbeat started");
        true
    }

    /// Cancel the loop and wait for it to finish
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "Heartbeat task panicked");
                }
            }
        }
        if self.state == HeartbeatState::Running {
            tracing::debug!("Heartbeat stopped");
        }
        self.state = HeartbeatState::Stopped;
    }
}

impl Drop for HeartbeatScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn run_heartbeat(
    interval: Duration,
    sequence: SequenceReader,
    outbound: mpsc::Sender<GatewayFrame>,
    failures: mpsc::Sender<TransportError>,
    cancel: CancellationToken,
) {
    if interval.is_zero() {
        tracing::error!("Heartbeat interval is zero, not starting");
        let _ = failures.try_send(TransportError::Send("heartbeat interval is zero".to_string()));
        return;
    }

    // First ping one full interval after Hello
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            _ = ticker.tick() => {
                let sn = sequence.get();
                if outbound.send(GatewayFrame::ping(sn)).await.is_err() {
                    tracing::warn!(sequence = sn, "Heartbeat could not be queued");
                    let _ = failures.try_send(TransportError::WriterClosed);
                    break;
                }
                tracing::trace!(sequence = sn, "Heartbeat queued");
            }
        }
    }
}
