//! Bounded multi-producer / single-consumer event queue.
//!
//! Producers run in driver callbacks and the network I/O thread and must
//! never block, so `push` fails fast when the queue is full and returns the
//! event to the caller, which is then responsible for releasing any owned
//! payload (dropping the returned event does that). The consumer side pairs
//! non-blocking `pop` with a bounded `wait` so the scheduler can sleep until
//! either a deadline or the next event.

use std::time::Duration;

use crossbeam::queue::ArrayQueue;
use parking_lot::{Condvar, Mutex};

use super::Event;

/// Default queue capacity.
pub const DEFAULT_CAPACITY: usize = 8;

/// Bounded MPSC queue carrying [`Event`]s across thread and callback
/// boundaries into the scheduler.
pub struct EventQueue {
    ring: ArrayQueue<Event>,
    // Wake signal for the single consumer. Producers take the lock only
    // long enough to notify.
    signal: Mutex<()>,
    available: Condvar,
}

impl EventQueue {
    /// Create a queue with the given capacity (at least 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ring: ArrayQueue::new(capacity.max(1)),
            signal: Mutex::new(()),
            available: Condvar::new(),
        }
    }

    /// Create a queue with [`DEFAULT_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Non-blocking enqueue. On a full queue the event is handed back so
    /// the producer can release it.
    pub fn push(&self, event: Event) -> Result<(), Event> {
        self.ring.push(event)?;
        // Pairing the notify with the lock closes the race against a
        // consumer that checked the ring and is about to wait.
        let _guard = self.signal.lock();
        self.available.notify_one();
        Ok(())
    }

    /// Non-blocking dequeue; `None` when no event is pending. Called only
    /// by the single consumer.
    pub fn pop(&self) -> Option<Event> {
        self.ring.pop()
    }

    /// Block the consumer for at most `timeout` or until a producer pushes.
    /// Returns immediately if an event is already pending.
    pub fn wait(&self, timeout: Duration) {
        let mut guard = self.signal.lock();
        if !self.ring.is_empty() {
            return;
        }
        let _ = self.available.wait_for(&mut guard, timeout);
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Queue capacity.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn push_pop_fifo() {
        let q = EventQueue::new();
        q.push(Event::radio(b"a")).unwrap();
        q.push(Event::radio(b"b")).unwrap();

        assert_eq!(q.pop().unwrap().payload.bytes(), b"a");
        assert_eq!(q.pop().unwrap().payload.bytes(), b"b");
        assert!(q.pop().is_none());
    }

    #[test]
    fn full_queue_returns_event_to_producer() {
        let q = EventQueue::with_capacity(2);
        q.push(Event::radio(b"1")).unwrap();
        q.push(Event::radio(b"2")).unwrap();

        // The rejected event comes back with its payload intact; dropping
        // it is the producer-side release.
        let rejected = q
            .push(Event::network_owned(1, vec![9u8; 128].into_boxed_slice()))
            .unwrap_err();
        assert_eq!(rejected.payload.len(), 128);
        drop(rejected);

        // Queue contents are untouched by the failed push.
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop().unwrap().payload.bytes(), b"1");
    }

    #[test]
    fn wait_returns_early_when_event_pending() {
        let q = EventQueue::new();
        q.push(Event::radio(b"x")).unwrap();

        let start = Instant::now();
        q.wait(Duration::from_secs(5));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn wait_wakes_on_cross_thread_push() {
        let q = Arc::new(EventQueue::new());
        let producer = Arc::clone(&q);

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            producer.push(Event::radio(b"wake")).unwrap();
        });

        let start = Instant::now();
        q.wait(Duration::from_secs(5));
        handle.join().unwrap();

        assert!(start.elapsed() < Duration::from_secs(2));
        let ev = q.pop().expect("event should be pending after wake");
        assert_eq!(ev.kind, EventKind::Radio);
    }

    #[test]
    fn wait_times_out_when_idle() {
        let q = EventQueue::new();
        let start = Instant::now();
        q.wait(Duration::from_millis(30));
        assert!(start.elapsed() >= Duration::from_millis(25));
    }
}
