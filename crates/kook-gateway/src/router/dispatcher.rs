//! Event router
//!
//! Hands accepted events to the [`EventHandler`] without blocking the receive
//! loop. One worker task drains the queue in arrival order and spawns each
//! handler invocation, bounded by a semaphore. The queue itself is bounded;
//! events arriving while it is full are dropped.

use super::EventHandler;
use crate::connection::EpochReader;
use crate::events::{EventData, GatewayEvent};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

/// Events that may wait for a handler slot
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// An event tagged with the session epoch it was accepted under
#[derive(Debug)]
struct RoutedEvent {
    epoch: u64,
    sequence: u64,
    event: GatewayEvent,
}

/// Routes events to a handler
pub struct EventRouter {
    queue: Option<mpsc::Sender<RoutedEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl EventRouter {
    /// Spawn the router worker with the default queue capacity
    #[must_use]
    pub fn spawn(handler: Arc<dyn EventHandler>, epoch: EpochReader, concurrency: usize) -> Self {
        Self::spawn_with_capacity(handler, epoch, concurrency, DEFAULT_QUEUE_CAPACITY)
    }

    #[must_use]
    pub fn spawn_with_capacity(
        handler: Arc<dyn EventHandler>,
        epoch: EpochReader,
        concurrency: usize,
        capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(handler, epoch, rx, concurrency.max(1)));

        Self {
            queue: Some(tx),
            worker: Some(worker),
        }
    }

    /// Queue an event; returns `false` if it was dropped
    pub fn route(&self, epoch: u64, sequence: u64, data: EventData) -> bool {
        let Some(queue) = &self.queue else {
            tracing::warn!(sequence, "Event router is shut down, event dropped");
            return false;
        };
        let item = RoutedEvent {
            epoch,
            sequence,
            event: GatewayEvent::from(data),
        };
        match queue.try_send(item) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(item)) => {
                tracing::warn!(
                    sequence,
                    event = %item.event.label(),
                    "Event router queue is full, event dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(sequence, "Event router worker is gone, event dropped");
                false
            }
        }
    }

    /// Stop accepting events and wait for queued and in-flight handlers
    pub async fn shutdown(&mut self) {
        self.queue = None;
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "Event router worker failed");
            }
        }
    }
}

impl Drop for EventRouter {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

async fn run_worker(
    handler: Arc<dyn EventHandler>,
    epoch: EpochReader,
    mut rx: mpsc::Receiver<RoutedEvent>,
    concurrency: usize,
) {
    let permits = Arc::new(Semaphore::new(concurrency));
    let mut in_flight = JoinSet::new();

    while let Some(item) = rx.recv().await {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };

        // Checked after the permit wait, which may span a reconnect
        if item.epoch != epoch.get() {
            tracing::debug!(
                sequence = item.sequence,
                "Skipping event from an invalidated session"
            );
            continue;
        }

        let handler = Arc::clone(&handler);
        in_flight.spawn(async move {
            let _permit = permit;
            dispatch(handler.as_ref(), item).await;
        });

        while let Some(result) = in_flight.try_join_next() {
            log_join_error(result);
        }
    }

    while let Some(result) = in_flight.join_next().await {
        log_join_error(result);
    }
}

async fn dispatch(handler: &dyn EventHandler, item: RoutedEvent) {
    let label = item.event.label();
    let outcome = match &item.event {
        GatewayEvent::Message(event) => {
            AssertUnwindSafe(handler.on_message(event))
                .catch_unwind()
                .await
        }
        GatewayEvent::System(event) => {
            AssertUnwindSafe(handler.on_system_event(event))
                .catch_unwind()
                .await
        }
    };

    match outcome {
        Ok(Ok(())) => {
            tracing::trace!(sequence = item.sequence, event = %label, "Event handled");
        }
        Ok(Err(e)) => tracing::warn!(
            sequence = item.sequence,
            event = %label,
            error = %e,
            "Event handler failed"
        ),
        Err(_) => tracing::error!(
            sequence = item.sequence,
            event = %label,
            "Event handler panicked"
        ),
    }
}

fn log_join_error(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Event handler task failed");
    }
}
