//! End-to-end session manager scenarios over scripted connections
//!
//! All tests run on tokio's paused clock, so retry delays, heartbeat ticks and
//! handshake timeouts elapse instantly.

use integration_tests::*;
use kook_gateway::{ConnectionStatus, GatewayError, TransportError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn text(frame: String) -> Step {
    Step::Text(frame)
}

fn receive_error() -> TransportError {
    TransportError::Receive("connection reset".into())
}

// ============================================================================
// Handshake
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_identify_sent_first() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([Attempt::Open(vec![
        text(hello_ok("S1")),
        Step::Cancel(shutdown.clone()),
    ])]);
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector.clone(),
        RecordingHandler::new(),
    );

    manager.run(shutdown).await.unwrap();

    let sent = connector.sent();
    let identify: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
    assert_eq!(
        identify,
        json!({"s": 2, "d": {"token": "test-token", "intents": 513, "shard": [0, 1]}})
    );
    assert_eq!(connector.urls(), vec![GATEWAY_URL.to_string()]);
    assert_eq!(manager.session().session_id(), Some("S1"));
    assert_eq!(manager.status(), ConnectionStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_hello_starts_one_heartbeat() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([Attempt::Open(vec![
        text(hello_ok("S1")),
        text(hello_ok("S1")),
        Step::Wait(Duration::from_secs(45)),
        Step::Cancel(shutdown.clone()),
    ])]);
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector.clone(),
        RecordingHandler::new(),
    );

    manager.run(shutdown).await.unwrap();

    assert_eq!(connector.heartbeats(), vec![json!({"s": 2, "sn": 0})]);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_hello_keeps_session() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([Attempt::Open(vec![
        text(hello_ok("S1")),
        text(message_event(3, "alice", "one")),
        text(hello_ok("S2")),
        text(message_event(4, "alice", "two")),
        Step::Cancel(shutdown.clone()),
    ])]);
    let handler = RecordingHandler::new();
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector,
        handler.clone(),
    );

    manager.run(shutdown).await.unwrap();

    assert_eq!(manager.session().session_id(), Some("S1"));
    assert_eq!(manager.session().last_sequence(), 4);
    assert_eq!(handler.messages(), vec!["m3", "m4"]);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_carries_last_sequence() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([Attempt::Open(vec![
        text(hello_ok("S1")),
        text(message_event(7, "alice", "hi")),
        Step::Wait(Duration::from_secs(61)),
        Step::Cancel(shutdown.clone()),
    ])]);
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector.clone(),
        RecordingHandler::new(),
    );

    manager.run(shutdown).await.unwrap();

    assert_eq!(
        connector.heartbeats(),
        vec![json!({"s": 2, "sn": 7}), json!({"s": 2, "sn": 7})]
    );
}

#[tokio::test(start_paused = true)]
async fn test_pong_recorded() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([Attempt::Open(vec![
        text(hello_ok("S1")),
        text(pong()),
        Step::Cancel(shutdown.clone()),
    ])]);
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector,
        RecordingHandler::new(),
    );

    assert!(manager.last_pong().is_none());
    manager.run(shutdown).await.unwrap();
    assert!(manager.last_pong().is_some());
}

// ============================================================================
// Event delivery
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_duplicate_and_replayed_events_not_routed() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([Attempt::Open(vec![
        text(hello_ok("S1")),
        text(message_event(1, "alice", "one")),
        text(message_event(2, "alice", "two")),
        text(message_event(2, "alice", "two again")),
        text(message_event(1, "alice", "one again")),
        text(message_event(3, "alice", "three")),
        Step::Cancel(shutdown.clone()),
    ])]);
    let handler = RecordingHandler::new();
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector,
        handler.clone(),
    );

    manager.run(shutdown).await.unwrap();

    assert_eq!(handler.messages(), vec!["m1", "m2", "m3"]);
    assert_eq!(manager.session().last_sequence(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_events_before_hello_dropped() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([Attempt::Open(vec![
        text(message_event(1, "alice", "early")),
        text(hello_ok("S1")),
        text(message_event(2, "alice", "on time")),
        Step::Cancel(shutdown.clone()),
    ])]);
    let handler = RecordingHandler::new();
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector,
        handler.clone(),
    );

    manager.run(shutdown).await.unwrap();

    assert_eq!(handler.messages(), vec!["m2"]);
    assert_eq!(manager.session().last_sequence(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_compressed_uncompressed_and_garbage_frames() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([Attempt::Open(vec![
        Step::Binary(compress(&hello_ok("S1"))),
        Step::Binary(message_event(1, "alice", "raw").into_bytes()),
        Step::Binary(compress(&system_event(2, "joined_channel"))),
        Step::Binary(b"\x00\x01 not a frame".to_vec()),
        text(message_event(3, "alice", "text")),
        Step::Cancel(shutdown.clone()),
    ])]);
    let handler = RecordingHandler::new();
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector,
        handler.clone(),
    );

    manager.run(shutdown).await.unwrap();

    assert_eq!(handler.messages(), vec!["m1", "m3"]);
    assert_eq!(handler.system_events(), vec!["joined_channel"]);
    assert_eq!(manager.session().last_sequence(), 3);
}

// ============================================================================
// Transport failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_transport_failure_resumes_session() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([
        Attempt::Open(vec![
            text(hello_ok("S1")),
            text(message_event(5, "alice", "hello")),
            Step::Fail(receive_error()),
        ]),
        Attempt::Open(vec![text(hello_ok("S1")), Step::Cancel(shutdown.clone())]),
    ]);
    let handler = RecordingHandler::new();
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector.clone(),
        handler.clone(),
    );

    let started = Instant::now();
    manager.run(shutdown).await.unwrap();

    assert_eq!(
        connector.urls(),
        vec![
            GATEWAY_URL.to_string(),
            "wss://gw.example/abc&resume=1&sn=5&session_id=S1".to_string(),
        ]
    );
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert_eq!(handler.messages(), vec!["m5"]);
    assert_eq!(manager.session().session_id(), Some("S1"));
    assert_eq!(manager.session().last_sequence(), 5);
    assert_eq!(manager.transport_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_refused_resume_restarts_sequence() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([
        Attempt::Open(vec![
            text(hello_ok("S1")),
            text(message_event(5, "alice", "before")),
            Step::Fail(receive_error()),
        ]),
        Attempt::Open(vec![
            text(hello_ok("S2")),
            text(message_event(1, "alice", "after one")),
            text(message_event(2, "alice", "after two")),
            Step::Cancel(shutdown.clone()),
        ]),
    ]);
    let handler = RecordingHandler::new();
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector.clone(),
        handler.clone(),
    );

    manager.run(shutdown).await.unwrap();

    assert_eq!(
        connector.urls()[1],
        "wss://gw.example/abc&resume=1&sn=5&session_id=S1"
    );
    // The new session numbers from 1 again; none of its events are replays
    assert_eq!(handler.messages(), vec!["m5", "m1", "m2"]);
    assert_eq!(manager.session().session_id(), Some("S2"));
    assert_eq!(manager.session().last_sequence(), 2);
    assert_eq!(manager.session().epoch(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_stops_with_failed_connection() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([
        Attempt::Open(vec![
            text(hello_ok("S1")),
            text(message_event(1, "alice", "hi")),
            Step::Wait(Duration::from_secs(45)),
            Step::Fail(receive_error()),
        ]),
        Attempt::Open(vec![
            text(hello_ok("S1")),
            Step::Wait(Duration::from_secs(100)),
            Step::Cancel(shutdown.clone()),
        ]),
    ]);
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector.clone(),
        RecordingHandler::new(),
    );

    manager.run(shutdown).await.unwrap();

    let first = connector.sink(0);
    assert!(first.closed);
    assert!(first.late.is_empty());
    // Identify plus the single tick before the failure
    assert_eq!(first.frames.len(), 2);
    assert_eq!(first.heartbeats(), vec![json!({"s": 2, "sn": 1})]);

    let second = connector.sink(1);
    assert!(second.late.is_empty());
    assert_eq!(second.heartbeats(), vec![json!({"s": 2, "sn": 1}); 3]);
}

#[tokio::test(start_paused = true)]
async fn test_server_close_resumes_session() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([
        Attempt::Open(vec![
            text(hello_ok("S1")),
            text(message_event(2, "alice", "hi")),
            Step::End,
        ]),
        Attempt::Open(vec![text(hello_ok("S1")), Step::Cancel(shutdown.clone())]),
    ]);
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector.clone(),
        RecordingHandler::new(),
    );

    manager.run(shutdown).await.unwrap();

    assert_eq!(
        connector.urls()[1],
        "wss://gw.example/abc&resume=1&sn=2&session_id=S1"
    );
}

#[tokio::test(start_paused = true)]
async fn test_transport_failures_exhaust_budget() {
    let connector = ScriptedConnector::new([
        Attempt::Fail(TransportError::Connect("refused".into())),
        Attempt::Fail(TransportError::Connect("refused".into())),
        Attempt::Fail(TransportError::Connect("refused".into())),
    ]);
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector.clone(),
        RecordingHandler::new(),
    );

    let started = Instant::now();
    let err = manager.run(CancellationToken::new()).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::ConnectionExhausted { attempts: 3, .. }
    ));
    assert!(!err.is_retryable());
    assert_eq!(connector.urls().len(), 3);
    // Two retry delays between three attempts
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(10));
    assert!(elapsed < Duration::from_secs(15));
    assert_eq!(manager.status(), ConnectionStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_session_survives_retries_before_exhaustion() {
    let connector = ScriptedConnector::new([
        Attempt::Open(vec![
            text(hello_ok("S1")),
            text(message_event(4, "alice", "hi")),
            Step::Fail(receive_error()),
        ]),
        Attempt::Fail(TransportError::Connect("refused".into())),
        Attempt::Fail(TransportError::Connect("refused".into())),
    ]);
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector.clone(),
        RecordingHandler::new(),
    );

    let err = manager.run(CancellationToken::new()).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::ConnectionExhausted { attempts: 3, .. }
    ));
    let resume = "wss://gw.example/abc&resume=1&sn=4&session_id=S1".to_string();
    assert_eq!(connector.urls()[1..], [resume.clone(), resume]);
    assert_eq!(manager.session().session_id(), Some("S1"));
}

#[tokio::test(start_paused = true)]
async fn test_hello_timeout_counts_as_transport_failure() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([
        Attempt::Open(Vec::new()),
        Attempt::Open(vec![text(hello_ok("S1")), Step::Cancel(shutdown.clone())]),
    ]);
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector.clone(),
        RecordingHandler::new(),
    );

    let started = Instant::now();
    manager.run(shutdown).await.unwrap();

    assert_eq!(connector.urls().len(), 2);
    assert!(started.elapsed() >= Duration::from_secs(35));
}

#[tokio::test(start_paused = true)]
async fn test_endpoint_failure_retried() {
    let shutdown = CancellationToken::new();
    let resolver = StaticResolver::failing(1);
    let connector = ScriptedConnector::new([Attempt::Open(vec![
        text(hello_ok("S1")),
        Step::Cancel(shutdown.clone()),
    ])]);
    let mut manager = manager(
        test_config(),
        resolver.clone(),
        connector.clone(),
        RecordingHandler::new(),
    );

    manager.run(shutdown).await.unwrap();

    assert_eq!(resolver.calls(), 2);
    assert_eq!(connector.urls().len(), 1);
}

// ============================================================================
// Server rejections
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_reconnect_and_hello_failure_start_fresh_session() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([
        Attempt::Open(vec![
            text(hello_ok("S1")),
            text(message_event(1, "alice", "one")),
            text(message_event(2, "alice", "two")),
            text(reconnect(41008, "missing sn")),
        ]),
        Attempt::Open(vec![text(hello(40101, None))]),
        Attempt::Open(vec![
            text(hello_ok("S2")),
            text(message_event(1, "alice", "fresh")),
            Step::Cancel(shutdown.clone()),
        ]),
    ]);
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector.clone(),
        RecordingHandler::new(),
    );

    let started = Instant::now();
    manager.run(shutdown).await.unwrap();

    // Fresh sessions never carry resume parameters
    assert_eq!(connector.urls(), vec![GATEWAY_URL.to_string(); 3]);
    // Rejections reconnect without the retry delay
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(manager.session().session_id(), Some("S2"));
    assert_eq!(manager.session().last_sequence(), 1);
    assert_eq!(manager.rejection_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_events_queued_behind_busy_handler_skipped_after_reconnect() {
    let shutdown = CancellationToken::new();
    let gate = Arc::new(Notify::new());
    let connector = ScriptedConnector::new([
        Attempt::Open(vec![
            text(hello_ok("S1")),
            text(message_event(1, "alice", GatedHandler::PARK)),
            // Lets the handler take the only slot before more events arrive
            Step::Wait(Duration::from_secs(1)),
            text(message_event(2, "alice", "queued two")),
            text(message_event(3, "alice", "queued three")),
            text(reconnect(41008, "missing sn")),
        ]),
        Attempt::Open(vec![
            text(hello_ok("S2")),
            Step::Release(gate.clone()),
            text(message_event(1, "alice", "fresh")),
            Step::Cancel(shutdown.clone()),
        ]),
    ]);
    let handler = GatedHandler::new(gate);
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector,
        handler.clone(),
    );

    manager.run(shutdown).await.unwrap();

    // The in-flight handler finishes; its queued siblings are dropped
    assert_eq!(handler.contents(), vec![GatedHandler::PARK, "fresh"]);
    assert_eq!(manager.session().session_id(), Some("S2"));
}

#[tokio::test(start_paused = true)]
async fn test_repeated_hello_rejection_exhausts() {
    let connector = ScriptedConnector::new([
        Attempt::Open(vec![text(hello(40100, None))]),
        Attempt::Open(vec![text(hello(40100, None))]),
        Attempt::Open(vec![text(hello(40100, None))]),
    ]);
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector.clone(),
        RecordingHandler::new(),
    );

    let err = manager.run(CancellationToken::new()).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::ConnectionExhausted { attempts: 3, .. }
    ));
    assert_eq!(connector.urls().len(), 3);
    assert_eq!(manager.transport_attempts(), 0);
    assert_eq!(manager.session().session_id(), None);
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_retry_delay() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new([
        Attempt::Fail(TransportError::Connect("refused".into())),
        Attempt::Open(Vec::new()),
    ]);
    let mut manager = manager(
        test_config(),
        StaticResolver::new(),
        connector.clone(),
        RecordingHandler::new(),
    );

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    manager.run(shutdown).await.unwrap();

    assert_eq!(connector.urls().len(), 1);
    assert_eq!(manager.status(), ConnectionStatus::Disconnected);
}
