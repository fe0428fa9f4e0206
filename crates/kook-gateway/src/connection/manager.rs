//! Gateway session manager
//!
//! Drives one logical gateway connection: resolve the endpoint, connect,
//! identify, wait for Hello, then pump frames until something fails.
//!
//! Two kinds of failure lead back to the top of the loop:
//!
//! - transport failures (connect errors, resets, timeouts, endpoint errors)
//!   keep the session so the next attempt can resume, and are bounded by
//!   the transport budget with a fixed delay between attempts;
//! - protocol rejections (a failed Hello, a Reconnect signal) discard the
//!   session and reconnect immediately, bounded by their own budget.
//!
//! Either budget running out ends [`GatewaySessionManager::run`] with
//! [`GatewayError::ConnectionExhausted`].

use super::{
    ActiveConnection, ConnectionStatus, Connector, Endpoint, EndpointResolver, InboundFrame,
    RetryBudget, RetryDecision, Session,
};
use crate::codec;
use crate::error::{GatewayError, TransportError};
use crate::protocol::{self, GatewayFrame, HelloCode, IdentifyPayload, Signal};
use crate::router::{EventHandler, EventRouter};
use kook_common::GatewayConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Outcome of one connection attempt
#[derive(Debug)]
enum LoopAction {
    /// Shutdown was requested
    Shutdown,
    /// The server refused or dropped the session
    Rejected { reason: String },
}

/// Gateway session manager
pub struct GatewaySessionManager {
    config: GatewayConfig,
    token: String,
    resolver: Arc<dyn EndpointResolver>,
    connector: Arc<dyn Connector>,
    handler: Arc<dyn EventHandler>,
    session: Session,
    transport_budget: RetryBudget,
    rejection_budget: RetryBudget,
    last_pong: Option<Instant>,
}

impl GatewaySessionManager {
    /// Create a manager
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        token: impl Into<String>,
        resolver: Arc<dyn EndpointResolver>,
        connector: Arc<dyn Connector>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        let transport_budget = RetryBudget::new(config.max_retries, config.retry_delay());
        let rejection_budget = RetryBudget::new(config.max_retries, Duration::ZERO);

        Self {
            config,
            token: token.into(),
            resolver,
            connector,
            handler,
            session: Session::new(),
            transport_budget,
            rejection_budget,
            last_pong: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.session.status()
    }

    /// Watch status transitions
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.session.subscribe_status()
    }

    /// Transport failures counted since the last accepted Hello
    #[must_use]
    pub fn transport_attempts(&self) -> u32 {
        self.transport_budget.attempts()
    }

    /// Protocol rejections counted since the last accepted Hello
    #[must_use]
    pub fn rejection_attempts(&self) -> u32 {
        self.rejection_budget.attempts()
    }

    /// When the last Pong arrived
    #[must_use]
    pub fn last_pong(&self) -> Option<Instant> {
        self.last_pong
    }

    /// Run until shutdown or until a retry budget is exhausted
    ///
    /// # Errors
    /// Returns [`GatewayError::ConnectionExhausted`] when no further attempt
    /// will be made
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<(), GatewayError> {
        let mut router = EventRouter::spawn(
            Arc::clone(&self.handler),
            self.session.epoch_reader(),
            self.config.handler_concurrency,
        );

        let result = self.run_loop(&router, &shutdown).await;

        router.shutdown().await;
        self.session.set_status(ConnectionStatus::Disconnected);

        match &result {
            Ok(()) => tracing::info!("Gateway session manager stopped"),
            Err(e) => tracing::error!(error = %e, "Gateway session manager gave up"),
        }
        result
    }

    async fn run_loop(
        &mut self,
        router: &EventRouter,
        shutdown: &CancellationToken,
    ) -> Result<(), GatewayError> {
        loop {
            match self.connect_and_run(router, shutdown).await {
                Ok(LoopAction::Shutdown) => return Ok(()),
                Ok(LoopAction::Rejected { reason }) => {
                    self.session.invalidate();
                    self.session.set_status(ConnectionStatus::Reconnecting);

                    match self.rejection_budget.record_failure() {
                        RetryDecision::Retry { attempt, .. } => {
                            tracing::warn!(
                                reason = %reason,
                                attempt,
                                max_attempts = self.rejection_budget.max_attempts(),
                                "Session rejected, reconnecting with a fresh session"
                            );
                        }
                        RetryDecision::Exhausted { attempts } => {
                            return Err(GatewayError::ConnectionExhausted { attempts, reason });
                        }
                    }
                }
                Err(err) => match self.transport_budget.record_failure() {
                    RetryDecision::Retry { attempt, delay } => {
                        tracing::warn!(
                            error = %err,
                            attempt,
                            max_attempts = self.transport_budget.max_attempts(),
                            delay_ms = delay.as_millis(),
                            "Gateway connection failed, retrying"
                        );
                        self.session.set_status(ConnectionStatus::Reconnecting);
                        if sleep_or_shutdown(delay, shutdown).await {
                            return Ok(());
                        }
                    }
                    RetryDecision::Exhausted { attempts } => {
                        return Err(GatewayError::ConnectionExhausted {
                            attempts,
                            reason: err.to_string(),
                        });
                    }
                },
            }
        }
    }

    /// One attempt: resolve, connect, identify and pump frames
    async fn connect_and_run(
        &mut self,
        router: &EventRouter,
        shutdown: &CancellationToken,
    ) -> Result<LoopAction, GatewayError> {
        self.session.set_status(ConnectionStatus::ResolvingEndpoint);
        let url = tokio::select! {
            biased;
            () = shutdown.cancelled() => return Ok(LoopAction::Shutdown),
            resolved = self.resolver.resolve(self.config.compress) => resolved?,
        };

        let endpoint = Endpoint::new(url).with_resume(self.session.resume_params());
        self.session.set_status(ConnectionStatus::Connecting);
        tracing::info!(
            url = %endpoint.display_url(),
            resume = endpoint.is_resume(),
            session_id = ?self.session.session_id(),
            last_sequence = self.session.last_sequence(),
            "Connecting to gateway"
        );

        let connect_timeout = self.config.connect_timeout();
        let target = endpoint.connect_url();
        let transport = tokio::select! {
            biased;
            () = shutdown.cancelled() => return Ok(LoopAction::Shutdown),
            connected = tokio::time::timeout(connect_timeout, self.connector.connect(&target)) => {
                connected.map_err(|_| TransportError::ConnectTimeout(connect_timeout))??
            }
        };

        let mut conn = ActiveConnection::open(transport, self.config.heartbeat_interval());
        let action = match conn.send(GatewayFrame::identify(&IdentifyPayload::new(
            self.token.as_str(),
            self.config.intents,
        ))) {
            Ok(()) => {
                self.session.set_status(if endpoint.is_resume() {
                    ConnectionStatus::Resuming
                } else {
                    ConnectionStatus::Authenticating
                });
                self.event_loop(&mut conn, router, shutdown).await
            }
            Err(e) => Err(e.into()),
        };

        conn.close().await;
        action
    }

    async fn event_loop(
        &mut self,
        conn: &mut ActiveConnection,
        router: &EventRouter,
        shutdown: &CancellationToken,
    ) -> Result<LoopAction, GatewayError> {
        let hello_timeout = self.config.hello_timeout();
        let hello_deadline = tokio::time::sleep(hello_timeout);
        tokio::pin!(hello_deadline);

        loop {
            let awaiting_hello = self.session.status().is_handshaking();

            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    tracing::info!("Gateway received shutdown signal");
                    return Ok(LoopAction::Shutdown);
                }

                Some(err) = conn.failures.recv() => return Err(err.into()),

                () = &mut hello_deadline, if awaiting_hello => {
                    return Err(TransportError::HelloTimeout(hello_timeout).into());
                }

                frame = conn.source.next_frame() => {
                    let frame = match frame {
                        Some(Ok(frame)) => frame,
                        Some(Err(e)) => return Err(e.into()),
                        None => return Err(TransportError::Closed.into()),
                    };

                    let decoded = match frame {
                        InboundFrame::Binary(bytes) => codec::decode(&bytes),
                        InboundFrame::Text(text) => codec::decode_text(text),
                    };

                    match protocol::parse(decoded.text()) {
                        Ok(signal) => {
                            if let Some(action) = self.handle_signal(signal, conn, router) {
                                return Ok(action);
                            }
                        }
                        Err(e) => tracing::warn!(
                            error = %e,
                            compressed = decoded.was_compressed(),
                            "Dropping undecodable frame"
                        ),
                    }
                }
            }
        }
    }

    fn handle_signal(
        &mut self,
        signal: Signal,
        conn: &mut ActiveConnection,
        router: &EventRouter,
    ) -> Option<LoopAction> {
        match signal {
            Signal::Hello { code, session_id } => self.handle_hello(code, session_id, conn),
            Signal::Event { sequence, data } => {
                if self.session.status() != ConnectionStatus::Connected {
                    tracing::debug!(sequence, "Dropping event received before Hello");
                } else if self.session.accept_sequence(sequence) {
                    router.route(self.session.epoch(), sequence, data);
                } else {
                    tracing::debug!(
                        sequence,
                        last_sequence = self.session.last_sequence(),
                        "Dropping duplicate or out-of-order event"
                    );
                }
                None
            }
            Signal::Pong => {
                self.last_pong = Some(Instant::now());
                tracing::debug!("Received Pong");
                None
            }
            Signal::Reconnect { code, message } => {
                tracing::warn!(code = ?code, message = ?message, "Server requested reconnect");
                Some(LoopAction::Rejected {
                    reason: format!(
                        "reconnect requested (code {}): {}",
                        code.map_or_else(|| "none".to_string(), |c| c.to_string()),
                        message.unwrap_or_default()
                    ),
                })
            }
            Signal::ResumeAck { session_id } => {
                tracing::info!(session_id = ?session_id, "Session resumed");
                None
            }
            Signal::Ping => {
                tracing::debug!("Ignoring server Ping");
                None
            }
            Signal::Unknown { code, .. } => {
                tracing::debug!(code, "Ignoring unknown signal");
                None
            }
        }
    }

    fn handle_hello(
        &mut self,
        code: HelloCode,
        session_id: Option<String>,
        conn: &mut ActiveConnection,
    ) -> Option<LoopAction> {
        if !code.is_success() {
            tracing::warn!(
                code = code.as_u32(),
                description = code.description(),
                credentials = code.is_credential_failure(),
                "Hello rejected"
            );
            return Some(LoopAction::Rejected {
                reason: format!("hello rejected: {code}"),
            });
        }

        if self.session.status() == ConnectionStatus::Connected {
            tracing::debug!(session_id = ?session_id, "Duplicate Hello ignored");
            return None;
        }

        let replaced = session_id.is_some_and(|id| self.session.establish(id));
        let resumed = self.session.status() == ConnectionStatus::Resuming && !replaced;
        self.session.set_status(ConnectionStatus::Connected);
        self.transport_budget.reset();
        self.rejection_budget.reset();

        if !conn.start_heartbeat(self.session.sequence_reader()) {
            tracing::debug!("Heartbeat already running");
        }

        tracing::info!(
            session_id = ?self.session.session_id(),
            resumed,
            last_sequence = self.session.last_sequence(),
            "Gateway connected"
        );
        None
    }
}

/// Sleep for `delay`; returns `true` if shutdown was requested first
async fn sleep_or_shutdown(delay: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = shutdown.cancelled() => true,
        () = tokio::time::sleep(delay) => false,
    }
}
