//! A single live connection
//!
//! Owns everything that must not outlive one connection attempt: the read
//! half, the writer task, and the heartbeat.

use super::{FrameSink, FrameSource, SequenceReader, Transport};
use crate::error::TransportError;
use crate::heartbeat::HeartbeatScheduler;
use crate::protocol::GatewayFrame;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Time the writer gets to flush queued frames on close
const WRITER_GRACE: Duration = Duration::from_secs(2);

/// Outbound queue size
const OUTBOUND_BUFFER: usize = 64;

/// One open connection
pub struct ActiveConnection {
    pub(crate) source: Box<dyn FrameSource>,
    pub(crate) failures: mpsc::Receiver<TransportError>,
    failure_tx: mpsc::Sender<TransportError>,
    outbound: Option<mpsc::Sender<GatewayFrame>>,
    writer: Option<JoinHandle<()>>,
    heartbeat: HeartbeatScheduler,
}

impl ActiveConnection {
    /// Take ownership of a transport and spawn its writer
    #[must_use]
    pub fn open(transport: Transport, heartbeat_interval: Duration) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (failure_tx, failures) = mpsc::channel(4);
        let writer = spawn_writer(transport.sink, outbound_rx, failure_tx.clone());

        Self {
            source: transport.source,
            failures,
            failure_tx,
            outbound: Some(outbound_tx),
            writer: Some(writer),
            heartbeat: HeartbeatScheduler::new(heartbeat_interval),
        }
    }

    /// Queue a frame for the writer
    ///
    /// # Errors
    /// Returns [`TransportError::WriterClosed`] if the writer has stopped
    pub fn send(&self, frame: GatewayFrame) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::WriterClosed)?;
        outbound.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                TransportError::Send("outbound queue full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => TransportError::WriterClosed,
        })
    }

    /// Start the heartbeat; `false` if it was already started
    pub fn start_heartbeat(&mut self, sequence: SequenceReader) -> bool {
        let Some(outbound) = self.outbound.clone() else {
            return false;
        };
        self.heartbeat
            .start(sequence, outbound, self.failure_tx.clone())
    }

    #[must_use]
    pub fn heartbeat_running(&self) -> bool {
        self.heartbeat.is_running()
    }

    /// Stop the heartbeat, let the writer flush and close the socket
    pub async fn close(&mut self) {
        self.heartbeat.stop().await;

        // Dropping the last sender lets the writer drain and close
        self.outbound = None;

        if let Some(mut writer) = self.writer.take() {
            tokio::select! {
                _ = &mut writer => {}
                () = tokio::time::sleep(WRITER_GRACE) => {
                    tracing::debug!("Writer did not finish in time, aborting");
                    writer.abort();
                }
            }
        }
    }
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            writer.abort();
        }
    }
}

fn spawn_writer(
    mut sink: Box<dyn FrameSink>,
    mut outbound_rx: mpsc::Receiver<GatewayFrame>,
    failures: mpsc::Sender<TransportError>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let json = match frame.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize gateway frame");
                    continue;
                }
            };
            if let Err(e) = sink.send_text(json).await {
                tracing::debug!(error = %e, "Writer task: send failed");
                let _ = failures.try_send(e);
                return;
            }
        }

        if let Err(e) = sink.close().await {
            tracing::debug!(error = %e, "Writer task: close failed");
        }
    })
}
