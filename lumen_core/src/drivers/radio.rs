//! Radio link boundary.

use std::sync::Arc;

use log::warn;

use crate::error::LumenResult;
use crate::event::{Event, EventQueue};

/// Primitives a radio transport must provide. Frame format and association
/// management belong to the implementation.
pub trait RadioLink: Send {
    /// Scan for reachable peers, returning their identifiers.
    fn scan(&mut self) -> LumenResult<Vec<String>>;
    /// Associate with a peer by identifier.
    fn connect(&mut self, peer: &str) -> LumenResult<()>;
    /// Non-blocking read of one received frame, if any.
    fn read(&mut self) -> LumenResult<Option<Vec<u8>>>;
    /// Transmit one frame.
    fn write(&mut self, frame: &[u8]) -> LumenResult<usize>;
}

/// Producer handle handed to radio driver callbacks.
///
/// Callbacks run in driver context and must never call into the scheduler;
/// pushing a frame here is their only way into the runtime. Cheap to clone.
#[derive(Clone)]
pub struct RadioEvents {
    events: Arc<EventQueue>,
}

impl RadioEvents {
    pub fn new(events: Arc<EventQueue>) -> Self {
        Self { events }
    }

    /// Enqueue a received frame as a radio event. Frames larger than the
    /// inline payload bound are carried as owned buffers. A full queue
    /// drops the frame; driver context cannot block.
    pub fn push_frame(&self, frame: &[u8]) {
        if self.events.push(Event::radio_frame(frame)).is_err() {
            warn!("event queue full, dropping {}-byte radio frame", frame.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    #[test]
    fn pushed_frame_arrives_as_radio_event() {
        let events = Arc::new(EventQueue::new());
        let radio = RadioEvents::new(Arc::clone(&events));

        radio.push_frame(b"frame");

        let ev = events.pop().unwrap();
        assert_eq!(ev.kind, EventKind::Radio);
        assert_eq!(ev.payload.bytes(), b"frame");
    }

    #[test]
    fn large_frames_survive_whole() {
        let events = Arc::new(EventQueue::new());
        let radio = RadioEvents::new(Arc::clone(&events));
        let frame = vec![0x5A; 200];

        radio.push_frame(&frame);

        let ev = events.pop().unwrap();
        assert_eq!(ev.payload.len(), 200);
        assert_eq!(ev.payload.bytes(), frame.as_slice());
    }

    #[test]
    fn full_queue_drops_frame_without_blocking() {
        let events = Arc::new(EventQueue::with_capacity(1));
        let radio = RadioEvents::new(Arc::clone(&events));

        radio.push_frame(b"first");
        radio.push_frame(b"dropped");

        assert_eq!(events.pop().unwrap().payload.bytes(), b"first");
        assert!(events.pop().is_none());
    }
}
