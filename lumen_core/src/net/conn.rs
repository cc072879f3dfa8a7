//! Connection slots and per-connection policy.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use mio::net::TcpStream;

use super::backoff::Backoff;
use super::ConnectionId;

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Slot is free: no socket, empty queues.
    Unbound,
    /// Non-blocking connect issued; completion pending on write-readiness.
    Connecting,
    /// Connected; data may flow.
    Open,
    /// Socket gone; reconnect may be scheduled.
    Closed,
}

/// Per-connection policy supplied at `connect` time.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Reconnect automatically after the peer closes or the socket fails.
    pub reconnect: bool,
    /// Initial reconnect backoff; doubles per failed attempt, capped at 60 s.
    pub backoff: Duration,
    /// Maximum reconnect attempts; 0 means unlimited.
    pub max_retries: u32,
    /// Prefer event-queue dispatch over `recv` polling for inbound data.
    pub prefer_dispatch: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            reconnect: false,
            backoff: Duration::from_millis(1000),
            max_retries: 3,
            prefer_dispatch: true,
        }
    }
}

impl ConnectOptions {
    pub(crate) fn backoff_policy(&self) -> Backoff {
        Backoff::new(self.backoff, self.max_retries)
    }
}

/// One pool slot. Either fully `Unbound` or fully populated; the invariant
/// is maintained by [`Slot::release`].
pub(crate) struct Slot {
    pub id: ConnectionId,
    pub state: ConnState,
    pub socket: Option<TcpStream>,
    pub tx: VecDeque<Vec<u8>>,
    pub rx: VecDeque<Vec<u8>>,
    pub opts: ConnectOptions,
    /// Reconnect attempts made since the connection was last open.
    pub retries: u32,
    pub next_retry_at: Option<Instant>,
    pub host: String,
    pub port: u16,
}

impl Slot {
    pub fn unbound(id: ConnectionId) -> Self {
        Self {
            id,
            state: ConnState::Unbound,
            socket: None,
            tx: VecDeque::new(),
            rx: VecDeque::new(),
            opts: ConnectOptions::default(),
            retries: 0,
            next_retry_at: None,
            host: String::new(),
            port: 0,
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == ConnState::Unbound
    }

    /// Drop the socket, drain both queues and return the slot to `Unbound`.
    pub fn release(&mut self) {
        self.socket = None;
        self.tx.clear();
        self.rx.clear();
        self.state = ConnState::Unbound;
        self.opts = ConnectOptions::default();
        self.retries = 0;
        self.next_retry_at = None;
        self.host.clear();
        self.port = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_restores_invariant() {
        let mut slot = Slot::unbound(1);
        slot.state = ConnState::Closed;
        slot.tx.push_back(vec![1, 2]);
        slot.rx.push_back(vec![3]);
        slot.host = "example.invalid".to_string();
        slot.port = 80;
        slot.retries = 5;

        slot.release();

        assert!(slot.is_free());
        assert!(slot.socket.is_none());
        assert!(slot.tx.is_empty() && slot.rx.is_empty());
        assert!(slot.host.is_empty());
        assert_eq!(slot.retries, 0);
    }

    #[test]
    fn default_options_match_pool_defaults() {
        let opts = ConnectOptions::default();
        assert!(!opts.reconnect);
        assert_eq!(opts.backoff, Duration::from_millis(1000));
        assert_eq!(opts.max_retries, 3);
        assert!(opts.prefer_dispatch);
    }
}
