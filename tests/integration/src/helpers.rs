//! Test doubles for the gateway seams
//!
//! [`ScriptedConnector`] plays back one [`Attempt`] per connect call and
//! records every URL it was asked to open and, per attempt, every frame
//! written to it.

use async_trait::async_trait;
use kook_common::GatewayConfig;
use kook_gateway::connection::{Connector, FrameSink, FrameSource, InboundFrame, Transport};
use kook_gateway::{
    EndpointError, EndpointResolver, EventHandler, GatewaySessionManager, MessageEvent,
    SystemEvent, TransportError,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// WebSocket URL handed out by [`StaticResolver`]
pub const GATEWAY_URL: &str = "wss://gw.example/abc";

/// One step of a scripted connection
#[derive(Debug)]
pub enum Step {
    /// Deliver a text frame
    Text(String),
    /// Deliver a binary frame (compressed or not)
    Binary(Vec<u8>),
    /// Fail the read
    Fail(TransportError),
    /// End the stream as if the server closed it
    End,
    /// Let time pass before the next step
    Wait(Duration),
    /// Request shutdown, then keep the connection idle
    Cancel(CancellationToken),
    /// Wake a parked handler
    Release(Arc<Notify>),
}

/// Outcome of one connect call
#[derive(Debug)]
pub enum Attempt {
    Fail(TransportError),
    Open(Vec<Step>),
}

/// Plays back scripted connection attempts
#[derive(Default)]
pub struct ScriptedConnector {
    attempts: Mutex<VecDeque<Attempt>>,
    urls: Mutex<Vec<String>>,
    sinks: Mutex<Vec<Arc<Mutex<SinkLog>>>>,
}

/// What one attempt's sink saw
#[derive(Debug, Clone, Default)]
pub struct SinkLog {
    /// Frames written before the sink was closed
    pub frames: Vec<String>,
    pub closed: bool,
    /// Frames written after the sink was closed
    pub late: Vec<String>,
}

impl SinkLog {
    /// Heartbeat frames among `frames`
    pub fn heartbeats(&self) -> Vec<serde_json::Value> {
        heartbeats_in(&self.frames)
    }
}

fn heartbeats_in(frames: &[String]) -> Vec<serde_json::Value> {
    frames
        .iter()
        .filter_map(|text| serde_json::from_str::<serde_json::Value>(text).ok())
        .filter(|frame| frame["s"] == 2 && frame.get("sn").is_some())
        .collect()
}

impl ScriptedConnector {
    pub fn new(attempts: impl IntoIterator<Item = Attempt>) -> Arc<Self> {
        Arc::new(Self {
            attempts: Mutex::new(attempts.into_iter().collect()),
            ..Self::default()
        })
    }

    /// URLs passed to `connect`, in order
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }

    /// Text frames written by the client across all attempts
    pub fn sent(&self) -> Vec<String> {
        self.sinks
            .lock()
            .iter()
            .flat_map(|log| log.lock().frames.clone())
            .collect()
    }

    /// Writes seen by the sink of the `index`-th opened connection
    pub fn sink(&self, index: usize) -> SinkLog {
        self.sinks
            .lock()
            .get(index)
            .map(|log| log.lock().clone())
            .unwrap_or_default()
    }

    /// Heartbeat frames written by the client
    pub fn heartbeats(&self) -> Vec<serde_json::Value> {
        heartbeats_in(&self.sent())
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &str) -> Result<Transport, TransportError> {
        self.urls.lock().push(url.to_string());

        let attempt = self.attempts.lock().pop_front();
        match attempt {
            Some(Attempt::Fail(err)) => Err(err),
            Some(Attempt::Open(steps)) => {
                let log = Arc::new(Mutex::new(SinkLog::default()));
                self.sinks.lock().push(Arc::clone(&log));
                Ok(Transport::new(
                    Box::new(RecordingSink { log }),
                    Box::new(ScriptedSource {
                        steps: steps.into(),
                    }),
                ))
            }
            None => Err(TransportError::Connect("no scripted attempt left".into())),
        }
    }
}

struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
}

#[async_trait]
impl FrameSink for RecordingSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let mut log = self.log.lock();
        if log.closed {
            log.late.push(text);
            return Err(TransportError::Closed);
        }
        log.frames.push(text);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.log.lock().closed = true;
        Ok(())
    }
}

struct ScriptedSource {
    steps: VecDeque<Step>,
}

#[async_trait]
impl FrameSource for ScriptedSource {
    async fn next_frame(&mut self) -> Option<Result<InboundFrame, TransportError>> {
        while let Some(step) = self.steps.pop_front() {
            match step {
                Step::Text(text) => return Some(Ok(InboundFrame::Text(text))),
                Step::Binary(bytes) => return Some(Ok(InboundFrame::Binary(bytes))),
                Step::Fail(err) => return Some(Err(err)),
                Step::End => return None,
                Step::Wait(duration) => tokio::time::sleep(duration).await,
                Step::Cancel(token) => token.cancel(),
                Step::Release(gate) => gate.notify_one(),
            }
        }
        std::future::pending().await
    }
}

/// Resolver returning [`GATEWAY_URL`], optionally failing first
#[derive(Default)]
pub struct StaticResolver {
    failures: AtomicU32,
    calls: AtomicU32,
}

impl StaticResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the first `failures` resolutions
    pub fn failing(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures: AtomicU32::new(failures),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EndpointResolver for StaticResolver {
    async fn resolve(&self, _compress: bool) -> Result<String, EndpointError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(EndpointError::Request("connection refused".into()));
        }
        Ok(GATEWAY_URL.to_string())
    }
}

/// Records the events it receives as `msg_id`s
#[derive(Default)]
pub struct RecordingHandler {
    messages: Mutex<Vec<String>>,
    system: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn system_events(&self) -> Vec<String> {
        self.system.lock().clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn on_message(&self, event: &MessageEvent) -> anyhow::Result<()> {
        self.messages.lock().push(event.msg_id.clone());
        Ok(())
    }

    async fn on_system_event(&self, event: &SystemEvent) -> anyhow::Result<()> {
        self.system.lock().push(event.kind.to_string());
        Ok(())
    }
}

/// Records message contents, parking on any message whose content is
/// [`GatedHandler::PARK`] until the gate is released
pub struct GatedHandler {
    gate: Arc<Notify>,
    contents: Mutex<Vec<String>>,
}

impl GatedHandler {
    pub const PARK: &'static str = "park";

    pub fn new(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            gate,
            contents: Mutex::new(Vec::new()),
        })
    }

    pub fn contents(&self) -> Vec<String> {
        self.contents.lock().clone()
    }
}

#[async_trait]
impl EventHandler for GatedHandler {
    async fn on_message(&self, event: &MessageEvent) -> anyhow::Result<()> {
        if event.content == Self::PARK {
            self.gate.notified().await;
        }
        self.contents.lock().push(event.content.clone());
        Ok(())
    }
}

/// Gateway settings with the production timings and a single handler slot
pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        handler_concurrency: 1,
        ..GatewayConfig::new("https://api.example/gateway/index")
    }
}

/// Build a manager over the doubles
pub fn manager(
    config: GatewayConfig,
    resolver: Arc<StaticResolver>,
    connector: Arc<ScriptedConnector>,
    handler: Arc<dyn EventHandler>,
) -> GatewaySessionManager {
    GatewaySessionManager::new(config, "test-token", resolver, connector, handler)
}
