//! # Non-blocking connection manager
//!
//! Maintains a fixed pool of TCP connections and drives all of them from a
//! single readiness-multiplexing loop:
//!
//! - **ConnectionManager**: slot allocation, `connect`/`disconnect`/`send`/
//!   `recv`, and the `lumen-net` I/O thread
//! - **ConnectOptions / ConnState**: per-connection policy and lifecycle
//! - **Backoff**: capped exponential reconnect delays
//!
//! Inbound data is delivered either through the event queue (dispatch) or a
//! per-connection poll queue, in the order received from the socket. Socket
//! errors only ever affect the connection involved; the loop itself never
//! terminates on them.

pub mod backoff;
pub mod conn;
pub mod manager;

pub use backoff::Backoff;
pub use conn::{ConnState, ConnectOptions};
pub use manager::{resolve, ConnectionManager};

/// Stable 1-based handle addressing a connection slot.
pub type ConnectionId = u32;

/// Network event marker emitted when a non-blocking connect completes.
pub const CONN_OPEN: &[u8] = b"conn_open";

/// Network event marker emitted when the peer closes or the socket fails.
pub const CONN_CLOSED: &[u8] = b"conn_closed";

/// Network event marker emitted before each automatic reconnect attempt.
pub const CONN_RECONNECT_ATTEMPT: &[u8] = b"conn_reconnect_attempt";
