// Connection manager behavior against real loopback sockets.
use std::net::TcpListener;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lumen_core::event::{Event, EventQueue};
use lumen_core::net::{ConnectOptions, ConnectionManager, CONN_CLOSED, CONN_OPEN, CONN_RECONNECT_ATTEMPT};
use lumen_core::sched::HandlerRegistry;
use lumen_core::{LumenError, RuntimeConfig};

/// Manager with a short poll timeout so timing assertions stay tight.
fn started_manager() -> (ConnectionManager, Arc<EventQueue>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = RuntimeConfig {
        poll_timeout_ms: 20,
        ..RuntimeConfig::default()
    };
    let events = Arc::new(EventQueue::with_capacity(32));
    let handlers = Arc::new(HandlerRegistry::new());
    let mut mgr =
        ConnectionManager::new(Arc::clone(&events), handlers, &config).expect("manager");
    mgr.start().expect("io thread");
    (mgr, events)
}

/// Pop the next event, waiting up to `deadline`.
fn next_event(events: &EventQueue, deadline: Instant) -> Option<Event> {
    loop {
        if let Some(ev) = events.pop() {
            return Some(ev);
        }
        if Instant::now() >= deadline {
            return None;
        }
        events.wait(Duration::from_millis(20));
    }
}

#[test]
fn connect_completion_emits_conn_open() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (mgr, events) = started_manager();

    let id = mgr
        .connect("127.0.0.1", port, ConnectOptions::default())
        .unwrap();
    let (_peer, _) = listener.accept().unwrap();

    let ev = next_event(&events, Instant::now() + Duration::from_secs(2))
        .expect("conn_open within deadline");
    assert_eq!(ev.conn, Some(id));
    assert_eq!(ev.payload.bytes(), CONN_OPEN);
}

#[test]
fn inbound_bytes_arrive_in_order_then_one_conn_closed() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (mgr, events) = started_manager();

    let server = std::thread::spawn(move || {
        use std::io::Write;
        let (mut peer, _) = listener.accept().unwrap();
        peer.write_all(b"one").unwrap();
        std::thread::sleep(Duration::from_millis(50));
        peer.write_all(b"two").unwrap();
        // Dropping the socket closes the connection.
    });

    // No network handler registered, so data lands in the recv queue.
    let id = mgr
        .connect("127.0.0.1", port, ConnectOptions::default())
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(3);
    let open = next_event(&events, deadline).expect("conn_open");
    assert_eq!(open.payload.bytes(), CONN_OPEN);

    // Chunk boundaries may differ from the writes; order within the byte
    // stream may not.
    let mut received = Vec::new();
    while received.len() < 6 && Instant::now() < deadline {
        match mgr.recv(id) {
            Ok(chunk) => received.extend_from_slice(&chunk),
            Err(LumenError::NoData) => std::thread::sleep(Duration::from_millis(10)),
            Err(e) => panic!("unexpected recv error: {e}"),
        }
    }
    assert_eq!(received, b"onetwo");

    let closed = next_event(&events, deadline).expect("conn_closed");
    assert_eq!(closed.conn, Some(id));
    assert_eq!(closed.payload.bytes(), CONN_CLOSED);
    // Exactly one close notification: reconnect is off, so the queue must
    // stay quiet afterward.
    assert!(next_event(&events, Instant::now() + Duration::from_millis(200)).is_none());

    server.join().unwrap();
}

#[test]
fn reconnect_attempts_back_off_exponentially() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (mgr, events) = started_manager();

    let opts = ConnectOptions {
        reconnect: true,
        backoff: Duration::from_millis(100),
        max_retries: 0, // unlimited
        ..ConnectOptions::default()
    };
    let id = mgr.connect("127.0.0.1", port, opts).unwrap();

    // Accept once, close immediately, and stop listening so every
    // reconnect attempt is refused.
    let (peer, _) = listener.accept().unwrap();
    drop(peer);
    drop(listener);

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut saw_closed = false;
    let mut attempts = Vec::new();
    while attempts.len() < 3 {
        let ev = next_event(&events, deadline).expect("event before deadline");
        assert_eq!(ev.conn, Some(id));
        match ev.payload.bytes() {
            b if b == CONN_OPEN => {}
            b if b == CONN_CLOSED => saw_closed = true,
            b if b == CONN_RECONNECT_ATTEMPT => attempts.push(Instant::now()),
            other => panic!("unexpected event payload: {other:?}"),
        }
    }
    assert!(saw_closed);

    // Delays double per failed attempt: ~100ms, ~200ms, ~400ms. Allow poll
    // granularity but require clear growth.
    let gap1 = attempts[1] - attempts[0];
    let gap2 = attempts[2] - attempts[1];
    assert!(gap1 >= Duration::from_millis(150), "gap1 = {gap1:?}");
    assert!(gap2 >= gap1 + Duration::from_millis(100), "gap2 = {gap2:?}");

    mgr.disconnect(id);
}

#[test]
fn disconnect_mid_stream_is_clean_and_reusable() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (mgr, events) = started_manager();

    let id = mgr
        .connect("127.0.0.1", port, ConnectOptions::default())
        .unwrap();
    let (_peer, _) = listener.accept().unwrap();
    assert!(next_event(&events, Instant::now() + Duration::from_secs(2)).is_some());

    assert!(mgr.disconnect(id));
    assert!(mgr.disconnect(id)); // second call still reports success

    // The freed slot is allocatable again.
    let id2 = mgr
        .connect("127.0.0.1", port, ConnectOptions::default())
        .unwrap();
    assert_eq!(id2, id);
}
