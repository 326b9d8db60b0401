//! Reconnect Tests
//!
//! Tests for end-of-file detection and recovery: session replay after a
//! reconnect, refusal inside transactions and WATCH, and giving up after the
//! attempt limit.

#[path = "../common/mod.rs"]
mod common;

use std::time::{Duration, Instant};

use common::{ok, reply, words, Event, MockServer, Step};
use resplink::config::MAX_RECONNECT_ATTEMPTS;
use resplink::network::Backoff;
use resplink::{Client, Connection, Mode, RespError, Status, Value};

// =============================================================================
// Helper Functions
// =============================================================================

/// Commands received on connection `index`, in order
fn commands_on(events: &[Event], index: usize) -> Vec<Vec<Vec<u8>>> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Command(i, words) if *i == index => Some(words.clone()),
            _ => None,
        })
        .collect()
}

fn drain(server: &MockServer) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = server.next_event(Duration::from_millis(300)) {
        events.push(event);
    }
    events
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_reconnect_replays_auth_then_select() {
    let server = MockServer::start(vec![
        vec![ok(), ok(), Step::Close],
        vec![ok(), ok(), reply(b"$5\r\nvalue\r\n")],
    ]);
    let mut config = server.config();
    config.auth = Some(b"pw".to_vec());
    config.database = 2;

    let mut client = Client::open(config).unwrap();
    let mut seen = server.wait_closed(0);

    assert_eq!(client.get(b"k").unwrap(), Value::from("value"));
    assert_eq!(client.status(), Status::Connected);
    assert_eq!(client.connection().stats().reconnects, 1);
    assert_eq!(client.connection().stats().reconnect_attempts, 1);

    seen.extend(drain(&server));
    assert_eq!(
        commands_on(&seen, 0),
        vec![words(&["AUTH", "pw"]), words(&["SELECT", "2"])]
    );
    assert_eq!(
        commands_on(&seen, 1),
        vec![words(&["AUTH", "pw"]), words(&["SELECT", "2"]), words(&["GET", "k"])]
    );
}

#[test]
fn test_reconnect_without_session_state_sends_command_only() {
    let server = MockServer::start(vec![vec![Step::Close], vec![reply(b":1\r\n")]]);
    let mut client = Client::open(server.config()).unwrap();
    server.wait_closed(0);

    assert_eq!(client.incr(b"n").unwrap(), Value::Int(1));
    let events = drain(&server);
    assert_eq!(commands_on(&events, 1), vec![words(&["INCR", "n"])]);
}

#[test]
fn test_selected_db_is_replayed() {
    let server = MockServer::start(vec![
        vec![ok(), Step::Close],
        vec![ok(), reply(b"+PONG\r\n")],
    ]);
    let mut client = Client::open(server.config()).unwrap();

    assert_eq!(client.select(4).unwrap(), Value::Bool(true));
    assert_eq!(client.connection().database(), 4);
    server.wait_closed(0);

    assert_eq!(client.ping().unwrap(), Value::from("PONG"));
    let events = drain(&server);
    assert_eq!(
        commands_on(&events, 1),
        vec![words(&["SELECT", "4"]), words(&["PING"])]
    );
}

#[test]
fn test_failed_replay_fails_connection() {
    let server = MockServer::start(vec![
        vec![ok(), Step::Close],
        vec![reply(b"-ERR invalid password\r\n")],
    ]);
    let mut config = server.config();
    config.auth = Some(b"pw".to_vec());

    let mut client = Client::open(config).unwrap();
    server.wait_closed(0);

    assert!(matches!(client.get(b"k"), Err(RespError::Connection(_))));
    assert_eq!(client.status(), Status::Failed);
}

// =============================================================================
// Refusal Tests
// =============================================================================

#[test]
fn test_watch_refuses_reconnect() {
    let server = MockServer::start(vec![
        vec![ok(), Step::Close],
        vec![reply(b"$1\r\nx\r\n")],
    ]);
    let mut client = Client::open(server.config()).unwrap();

    assert!(client.watch(&["k"]).unwrap());
    assert!(client.connection().is_watching());
    server.wait_closed(0);

    match client.get(b"k") {
        Err(RespError::Connection(msg)) => assert_eq!(msg, "connection lost"),
        other => panic!("Expected connection error, got {:?}", other),
    }
    assert_eq!(client.status(), Status::Failed);
    assert!(!client.connection().is_watching());
    assert_eq!(client.connection().stats().reconnect_attempts, 0);

    let events = drain(&server);
    assert!(!events.contains(&Event::Accepted(1)));
}

#[test]
fn test_transaction_refuses_reconnect() {
    let server = MockServer::start(vec![
        vec![ok(), Step::Close],
        vec![ok()],
    ]);
    let mut client = Client::open(server.config()).unwrap();

    assert!(client.multi().unwrap());
    assert_eq!(client.mode(), Mode::Transaction);
    server.wait_closed(0);

    assert!(matches!(client.set(b"k", "v"), Err(RespError::Connection(_))));
    assert_eq!(client.status(), Status::Failed);
    assert_eq!(client.mode(), Mode::Atomic);
    assert_eq!(client.connection().stats().reconnect_attempts, 0);

    let events = drain(&server);
    assert!(!events.contains(&Event::Accepted(1)));
}

#[test]
fn test_discard_on_lost_connection_fails() {
    let server = MockServer::start(vec![vec![ok(), Step::Close], vec![ok()]]);
    let mut client = Client::open(server.config()).unwrap();

    assert!(client.multi().unwrap());
    server.wait_closed(0);

    assert!(matches!(client.discard(), Err(RespError::Connection(_))));
    assert_eq!(client.status(), Status::Failed);
    assert_eq!(client.mode(), Mode::Atomic);
    assert_eq!(client.connection().stats().reconnect_attempts, 0);

    let events = drain(&server);
    assert!(!events.contains(&Event::Accepted(1)));
}

#[test]
fn test_gives_up_after_attempt_limit() {
    // One connection, then the listener goes away and every reconnect is refused
    let server = MockServer::start(vec![vec![Step::Close]]);
    let mut client = Client::open(server.config()).unwrap();
    server.wait_closed(0);
    server.wait_for(&Event::Stopped);

    match client.ping() {
        Err(RespError::Connection(msg)) => assert_eq!(msg, "connection lost"),
        other => panic!("Expected connection error, got {:?}", other),
    }
    assert_eq!(client.status(), Status::Failed);
    assert_eq!(
        client.connection().stats().reconnect_attempts,
        MAX_RECONNECT_ATTEMPTS as u64
    );
    assert_eq!(client.connection().stats().reconnects, 0);
}

#[test]
fn test_backoff_waits_between_attempts() {
    let server = MockServer::start(vec![vec![Step::Close]]);
    let mut config = server.config();
    config.retry_interval_ms = 20;

    let conn = Connection::open(config)
        .unwrap()
        .with_backoff(Backoff::with_seed(Some(Duration::from_millis(20)), 1));
    let mut client = Client::from_connection(conn);
    server.wait_closed(0);
    server.wait_for(&Event::Stopped);

    let started = Instant::now();
    assert!(client.ping().is_err());
    // Nine full intervals after the jittered first one
    assert!(started.elapsed() >= Duration::from_millis(9 * 20));
    assert_eq!(
        client.connection().stats().reconnect_attempts,
        MAX_RECONNECT_ATTEMPTS as u64
    );
}

#[test]
fn test_live_connection_is_not_reconnected() {
    let server = MockServer::start(vec![vec![reply(b"+PONG\r\n"), reply(b"+PONG\r\n")]]);
    let mut client = Client::open(server.config()).unwrap();

    assert_eq!(client.ping().unwrap(), Value::from("PONG"));
    assert_eq!(client.ping().unwrap(), Value::from("PONG"));
    assert_eq!(client.connection().stats().reconnect_attempts, 0);
}
