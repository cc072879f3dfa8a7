//! # Event plumbing
//!
//! Typed events flow from producer contexts (driver callbacks, the network
//! I/O loop) into the single consumer that drives automation handlers:
//!
//! - **Event**: tagged payload, either copied inline at enqueue time or an
//!   owned buffer whose lifetime travels with the event
//! - **EventQueue**: bounded multi-producer / single-consumer queue with a
//!   non-blocking `push`/`pop` contract
//!
//! Producers must never block, so a full queue fails the push and hands the
//! event back for the producer to release.

pub mod queue;

pub use queue::EventQueue;

use crate::net::ConnectionId;

/// Largest payload that is copied inline at enqueue time. Larger payloads
/// must transfer buffer ownership via [`Payload::Owned`].
pub const MAX_INLINE_PAYLOAD: usize = 64;

/// Source category of an event. Each kind has at most one registered
/// handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Frame from the radio link driver shim.
    Radio,
    /// Data or connection state change from the network manager.
    Network,
}

/// Event payload with explicit ownership.
///
/// `Inline` holds a copy made at enqueue time; `Owned` moves the buffer
/// into the event, so dropping the event releases it exactly once.
pub enum Payload {
    /// Small payload copied into a fixed inline buffer.
    Inline {
        len: usize,
        bytes: [u8; MAX_INLINE_PAYLOAD],
    },
    /// Heap buffer whose ownership was transferred to the event.
    Owned(Box<[u8]>),
}

impl Payload {
    /// Copy `data` into an inline payload, truncating at
    /// [`MAX_INLINE_PAYLOAD`] bytes.
    pub fn inline(data: &[u8]) -> Self {
        let len = data.len().min(MAX_INLINE_PAYLOAD);
        let mut bytes = [0u8; MAX_INLINE_PAYLOAD];
        bytes[..len].copy_from_slice(&data[..len]);
        Payload::Inline { len, bytes }
    }

    /// View the payload bytes.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Payload::Inline { len, bytes } => &bytes[..*len],
            Payload::Owned(buf) => buf,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Inline { len, .. } => write!(f, "Inline({len} bytes)"),
            Payload::Owned(buf) => write!(f, "Owned({} bytes)", buf.len()),
        }
    }
}

/// A unit of work dispatched to a registered handler.
#[derive(Debug)]
pub struct Event {
    pub kind: EventKind,
    /// Set for [`EventKind::Network`] events; identifies the connection.
    pub conn: Option<ConnectionId>,
    pub payload: Payload,
}

impl Event {
    /// Radio frame, copied inline.
    pub fn radio(data: &[u8]) -> Self {
        Event {
            kind: EventKind::Radio,
            conn: None,
            payload: Payload::inline(data),
        }
    }

    /// Radio frame from a driver callback: copied inline when it fits,
    /// moved to an owned buffer otherwise so no bytes are lost.
    pub fn radio_frame(data: &[u8]) -> Self {
        if data.len() <= MAX_INLINE_PAYLOAD {
            Event::radio(data)
        } else {
            Event::radio_owned(data.to_vec().into_boxed_slice())
        }
    }

    /// Radio frame carrying an owned buffer.
    pub fn radio_owned(data: Box<[u8]>) -> Self {
        Event {
            kind: EventKind::Radio,
            conn: None,
            payload: Payload::Owned(data),
        }
    }

    /// Network control marker or small payload, copied inline.
    pub fn network(conn: ConnectionId, data: &[u8]) -> Self {
        Event {
            kind: EventKind::Network,
            conn: Some(conn),
            payload: Payload::inline(data),
        }
    }

    /// Network data event taking ownership of the receive buffer.
    pub fn network_owned(conn: ConnectionId, data: Box<[u8]>) -> Self {
        Event {
            kind: EventKind::Network,
            conn: Some(conn),
            payload: Payload::Owned(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_payload_copies_and_truncates() {
        let p = Payload::inline(b"hello");
        assert_eq!(p.bytes(), b"hello");

        let big = vec![0xAB; MAX_INLINE_PAYLOAD + 10];
        let p = Payload::inline(&big);
        assert_eq!(p.len(), MAX_INLINE_PAYLOAD);
    }

    #[test]
    fn owned_payload_keeps_buffer() {
        let buf: Box<[u8]> = vec![1, 2, 3].into_boxed_slice();
        let ev = Event::network_owned(3, buf);
        assert_eq!(ev.kind, EventKind::Network);
        assert_eq!(ev.conn, Some(3));
        assert_eq!(ev.payload.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn radio_frame_keeps_oversized_payloads_intact() {
        let small = Event::radio_frame(b"fits");
        assert!(matches!(small.payload, Payload::Inline { .. }));
        assert_eq!(small.payload.bytes(), b"fits");

        let big = vec![0xCD; MAX_INLINE_PAYLOAD + 136];
        let ev = Event::radio_frame(&big);
        assert!(matches!(ev.payload, Payload::Owned(_)));
        assert_eq!(ev.payload.bytes(), big.as_slice());
    }

    #[test]
    fn radio_event_has_no_connection() {
        let ev = Event::radio(b"frame");
        assert_eq!(ev.kind, EventKind::Radio);
        assert!(ev.conn.is_none());
    }
}
