//! Connection pool and readiness-multiplexing I/O loop.
//!
//! All sockets are non-blocking and driven from one `lumen-net` thread that
//! waits on a mio [`Poll`] with a bounded timeout, so reconnect timers are
//! revisited even when no socket is active. Write-readiness doubles as the
//! completion signal for pending non-blocking connects. The pool mutex is
//! held while scanning or mutating slots, never across the poll wait.

use std::io::{self, Read, Write};
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use mio::net::TcpStream;
use mio::{Events, Interest, Poll, Registry, Token};
use parking_lot::Mutex;

use super::conn::{ConnState, ConnectOptions, Slot};
use super::{ConnectionId, CONN_CLOSED, CONN_OPEN, CONN_RECONNECT_ATTEMPT};
use crate::config::RuntimeConfig;
use crate::error::{LumenError, LumenResult};
use crate::event::{Event, EventKind, EventQueue};
use crate::sched::HandlerRegistry;

/// Resolve a hostname to its first address.
pub fn resolve(host: &str) -> LumenResult<IpAddr> {
    resolve_addr(host, 0).map(|addr| addr.ip())
}

fn resolve_addr(host: &str, port: u16) -> LumenResult<SocketAddr> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| LumenError::ResolutionFailed(format!("{host}: {e}")))?;
    addrs
        .next()
        .ok_or_else(|| LumenError::ResolutionFailed(format!("{host}: no addresses returned")))
}

struct Shared {
    slots: Mutex<Vec<Slot>>,
    registry: Registry,
    events: Arc<EventQueue>,
    handlers: Arc<HandlerRegistry>,
    shutdown: AtomicBool,
    tx_queue_len: usize,
    rx_queue_len: usize,
    read_buffer_size: usize,
}

/// Fixed pool of non-blocking connections multiplexed on one I/O thread.
///
/// All operations are synchronous and non-blocking; connect completion,
/// inbound data and disconnections are observed asynchronously through the
/// event queue (or `recv` polling).
pub struct ConnectionManager {
    shared: Arc<Shared>,
    poll: Option<Poll>,
    poll_timeout: Duration,
    io_thread: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Create a manager producing into `events` and consulting `handlers`
    /// for dispatch preference. Call [`start`](Self::start) to spawn the
    /// I/O thread.
    pub fn new(
        events: Arc<EventQueue>,
        handlers: Arc<HandlerRegistry>,
        config: &RuntimeConfig,
    ) -> LumenResult<Self> {
        config.validate()?;
        let poll = Poll::new()?;
        let registry = poll.registry().try_clone()?;
        let slots = (0..config.max_connections)
            .map(|i| Slot::unbound(i as ConnectionId + 1))
            .collect();

        Ok(Self {
            shared: Arc::new(Shared {
                slots: Mutex::new(slots),
                registry,
                events,
                handlers,
                shutdown: AtomicBool::new(false),
                tx_queue_len: config.tx_queue_len,
                rx_queue_len: config.rx_queue_len,
                read_buffer_size: config.read_buffer_size,
            }),
            poll: Some(poll),
            poll_timeout: config.poll_timeout(),
            io_thread: None,
        })
    }

    /// Spawn the `lumen-net` I/O thread. Errors if already started.
    pub fn start(&mut self) -> LumenResult<()> {
        let poll = self
            .poll
            .take()
            .ok_or_else(|| LumenError::Internal("I/O loop already started".to_string()))?;
        let shared = Arc::clone(&self.shared);
        let timeout = self.poll_timeout;
        let handle = std::thread::Builder::new()
            .name("lumen-net".to_string())
            .spawn(move || io_loop(poll, shared, timeout))
            .map_err(|e| LumenError::Internal(format!("failed to spawn I/O thread: {e}")))?;
        self.io_thread = Some(handle);
        Ok(())
    }

    /// Signal the I/O thread to exit and join it. Safe to call twice.
    pub fn stop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.io_thread.take() {
            let _ = handle.join();
        }
    }

    /// Allocate a slot and issue a non-blocking connect to `host:port`.
    ///
    /// Completion is detected asynchronously by the I/O loop: a `conn_open`
    /// network event is emitted once the connection is established.
    /// Resolution failures are returned synchronously.
    pub fn connect(
        &self,
        host: &str,
        port: u16,
        opts: ConnectOptions,
    ) -> LumenResult<ConnectionId> {
        let addr = resolve_addr(host, port)?;

        let mut slots = self.shared.slots.lock();
        let Some(slot) = slots.iter_mut().find(|s| s.is_free()) else {
            return Err(LumenError::ResourceExhausted(
                "no free connection slots".to_string(),
            ));
        };

        let mut stream =
            TcpStream::connect(addr).map_err(|e| LumenError::ConnectFailed(e.to_string()))?;
        self.shared.registry.register(
            &mut stream,
            Token(slot.id as usize - 1),
            Interest::READABLE | Interest::WRITABLE,
        )?;

        slot.state = ConnState::Connecting;
        slot.socket = Some(stream);
        slot.opts = opts;
        slot.retries = 0;
        slot.next_retry_at = None;
        slot.host = host.to_string();
        slot.port = port;
        debug!("connection {} connecting to {host}:{port}", slot.id);
        Ok(slot.id)
    }

    /// Close the socket, drain both queues and return the slot to the free
    /// pool. Idempotent: an already-released id reports success; only an id
    /// outside the pool range fails.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut slots = self.shared.slots.lock();
        let Some(idx) = slot_index(&slots, id) else {
            return false;
        };
        let slot = &mut slots[idx];
        if let Some(mut sock) = slot.socket.take() {
            let _ = self.shared.registry.deregister(&mut sock);
        }
        slot.release();
        true
    }

    /// Queue an owned copy of `data` for transmission. The I/O loop makes a
    /// single best-effort send attempt per buffer.
    pub fn send(&self, id: ConnectionId, data: &[u8]) -> LumenResult<usize> {
        let mut slots = self.shared.slots.lock();
        let slot = bound_slot(&mut slots, id)?;
        if slot.tx.len() >= self.shared.tx_queue_len {
            return Err(LumenError::ResourceExhausted("tx queue full".to_string()));
        }
        slot.tx.push_back(data.to_vec());
        Ok(data.len())
    }

    /// Non-blocking poll of the connection's receive queue. Only used when
    /// dispatch delivery is disabled or no network handler is registered.
    pub fn recv(&self, id: ConnectionId) -> LumenResult<Vec<u8>> {
        let mut slots = self.shared.slots.lock();
        let slot = bound_slot(&mut slots, id)?;
        slot.rx.pop_front().ok_or(LumenError::NoData)
    }

    /// Toggle whether inbound data prefers event-queue dispatch over `recv`
    /// polling.
    pub fn set_dispatch_preference(&self, id: ConnectionId, prefer: bool) -> LumenResult<()> {
        let mut slots = self.shared.slots.lock();
        let slot = bound_slot(&mut slots, id)?;
        slot.opts.prefer_dispatch = prefer;
        Ok(())
    }

    /// Close and release every connection in the pool.
    pub fn shutdown_all(&self) {
        let mut slots = self.shared.slots.lock();
        for slot in slots.iter_mut() {
            if let Some(mut sock) = slot.socket.take() {
                let _ = self.shared.registry.deregister(&mut sock);
            }
            slot.release();
        }
    }

    /// Current lifecycle state of a connection, if the id is in range.
    pub fn state(&self, id: ConnectionId) -> Option<ConnState> {
        let slots = self.shared.slots.lock();
        slot_index(&slots, id).map(|idx| slots[idx].state)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.stop();
    }
}

fn slot_index(slots: &[Slot], id: ConnectionId) -> Option<usize> {
    if id == 0 || id as usize > slots.len() {
        None
    } else {
        Some(id as usize - 1)
    }
}

fn bound_slot(slots: &mut [Slot], id: ConnectionId) -> LumenResult<&mut Slot> {
    let idx = slot_index(slots, id).ok_or(LumenError::InvalidHandle(id))?;
    let slot = &mut slots[idx];
    if slot.is_free() {
        return Err(LumenError::InvalidHandle(id));
    }
    Ok(slot)
}

fn io_loop(mut poll: Poll, shared: Arc<Shared>, timeout: Duration) {
    info!("lumen-net I/O loop started");
    let mut events = Events::with_capacity(64);
    let mut buf = vec![0u8; shared.read_buffer_size];

    while !shared.shutdown.load(Ordering::Relaxed) {
        if let Err(e) = poll.poll(&mut events, Some(timeout)) {
            if e.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            warn!("poll error: {e}");
            std::thread::sleep(Duration::from_millis(50));
            continue;
        }

        let mut slots = shared.slots.lock();
        for ev in events.iter() {
            let Some(slot) = slots.get_mut(ev.token().0) else {
                continue;
            };
            if slot.is_free() || slot.socket.is_none() {
                continue;
            }
            if ev.is_writable() && slot.state == ConnState::Connecting {
                check_connect_completion(&shared, slot);
            }
            if ev.is_readable() && slot.state == ConnState::Open && slot.socket.is_some() {
                read_ready(&shared, slot, &mut buf);
            }
        }

        // Maintenance pass: single-attempt tx drain and retry timers.
        for slot in slots.iter_mut() {
            if slot.is_free() {
                continue;
            }
            flush_tx(slot);
            maybe_reconnect(&shared, slot);
        }
    }
    info!("lumen-net I/O loop stopped");
}

/// Write-readiness on a `Connecting` socket: query the socket error state
/// to learn whether the non-blocking connect succeeded.
fn check_connect_completion(shared: &Shared, slot: &mut Slot) {
    let Some(sock) = slot.socket.as_ref() else {
        return;
    };
    match sock.take_error() {
        Ok(Some(err)) | Err(err) => fail_connect(shared, slot, &err),
        Ok(None) => match sock.peer_addr() {
            Ok(_) => {
                slot.state = ConnState::Open;
                slot.retries = 0;
                slot.next_retry_at = None;
                debug!("connection {} open to {}:{}", slot.id, slot.host, slot.port);
                emit(shared, Event::network(slot.id, CONN_OPEN));
            }
            // Spurious wakeup before the handshake finished.
            Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
            Err(e) => fail_connect(shared, slot, &e),
        },
    }
}

fn fail_connect(shared: &Shared, slot: &mut Slot, err: &io::Error) {
    debug!("connection {} connect failed: {err}", slot.id);
    close_socket(shared, slot);
    slot.state = ConnState::Closed;
    if slot.opts.reconnect {
        schedule_retry(slot);
    }
}

/// Read until the socket would block, delivering each chunk in order.
fn read_ready(shared: &Shared, slot: &mut Slot, buf: &mut [u8]) {
    loop {
        let Some(sock) = slot.socket.as_mut() else {
            return;
        };
        match sock.read(buf) {
            Ok(0) => {
                peer_closed(shared, slot);
                return;
            }
            Ok(n) => {
                let chunk = buf[..n].to_vec();
                deliver_inbound(shared, slot, chunk);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("connection {} read error: {e}", slot.id);
                peer_closed(shared, slot);
                return;
            }
        }
    }
}

/// Hand an owned inbound buffer to the dispatcher when the connection
/// prefers it and a handler exists; otherwise buffer it for `recv`. A full
/// destination drops the buffer rather than blocking the I/O loop.
fn deliver_inbound(shared: &Shared, slot: &mut Slot, data: Vec<u8>) {
    if slot.opts.prefer_dispatch && shared.handlers.is_registered(EventKind::Network) {
        let len = data.len();
        if shared
            .events
            .push(Event::network_owned(slot.id, data.into_boxed_slice()))
            .is_err()
        {
            warn!(
                "event queue full, dropping {len} inbound bytes on connection {}",
                slot.id
            );
        }
    } else if slot.rx.len() < shared.rx_queue_len {
        slot.rx.push_back(data);
    } else {
        warn!(
            "rx queue full, dropping {} bytes on connection {}",
            data.len(),
            slot.id
        );
    }
}

fn peer_closed(shared: &Shared, slot: &mut Slot) {
    debug!("connection {} closed by peer", slot.id);
    close_socket(shared, slot);
    slot.state = ConnState::Closed;
    if slot.opts.reconnect {
        schedule_retry(slot);
    }
    emit(shared, Event::network(slot.id, CONN_CLOSED));
}

fn close_socket(shared: &Shared, slot: &mut Slot) {
    if let Some(mut sock) = slot.socket.take() {
        let _ = shared.registry.deregister(&mut sock);
    }
}

/// Producer-side push of a connection marker. A full queue drops the event.
fn emit(shared: &Shared, event: Event) {
    if shared.events.push(event).is_err() {
        warn!("event queue full, dropping connection event");
    }
}

/// Arm the retry timer for the next reconnect attempt. `retries` counts
/// attempts already made, so the upcoming attempt is number `retries + 1`.
fn schedule_retry(slot: &mut Slot) {
    let delay = slot.opts.backoff_policy().delay(slot.retries + 1);
    slot.next_retry_at = Some(Instant::now() + delay);
}

/// Single best-effort send attempt per queued buffer; a short write is not
/// re-queued and the buffer is always released afterward, whatever state
/// the connection is in.
fn flush_tx(slot: &mut Slot) {
    while let Some(data) = slot.tx.pop_front() {
        let Some(sock) = slot.socket.as_mut() else {
            debug!(
                "connection {} has no socket, dropping {}-byte buffer",
                slot.id,
                data.len()
            );
            continue;
        };
        match sock.write(&data) {
            Ok(n) if n < data.len() => {
                debug!(
                    "short write on connection {}: {n}/{} bytes",
                    slot.id,
                    data.len()
                );
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                debug!("connection {} not writable, dropping buffer", slot.id);
            }
            Err(e) => debug!("send error on connection {}: {e}", slot.id),
        }
    }
}

/// Reconnect a closed connection once its retry timer elapses, using the
/// stored host and port. Resolution failures here are logged and extend the
/// backoff; they are never surfaced to callers.
fn maybe_reconnect(shared: &Shared, slot: &mut Slot) {
    if slot.state != ConnState::Closed || !slot.opts.reconnect || slot.socket.is_some() {
        return;
    }
    if slot.host.is_empty() || slot.port == 0 {
        return;
    }
    let policy = slot.opts.backoff_policy();
    if !policy.should_retry(slot.retries) {
        warn!(
            "connection {}: giving up after {} failed reconnect attempts",
            slot.id, slot.retries
        );
        slot.opts.reconnect = false;
        return;
    }
    if let Some(at) = slot.next_retry_at {
        if Instant::now() < at {
            return;
        }
    }

    emit(shared, Event::network(slot.id, CONN_RECONNECT_ATTEMPT));
    slot.retries += 1;
    match resolve_addr(&slot.host, slot.port) {
        Ok(addr) => match TcpStream::connect(addr) {
            Ok(mut stream) => {
                match shared.registry.register(
                    &mut stream,
                    Token(slot.id as usize - 1),
                    Interest::READABLE | Interest::WRITABLE,
                ) {
                    Ok(()) => {
                        slot.socket = Some(stream);
                        slot.state = ConnState::Connecting;
                    }
                    Err(e) => {
                        warn!("connection {}: register failed: {e}", slot.id);
                        schedule_retry(slot);
                    }
                }
            }
            Err(e) => {
                debug!("connection {}: reconnect failed: {e}", slot.id);
                schedule_retry(slot);
            }
        },
        Err(e) => {
            debug!("connection {}: reconnect resolution failed: {e}", slot.id);
            schedule_retry(slot);
        }
    }
}
