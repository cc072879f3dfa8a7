//! Single-slot event handler registry.
//!
//! Each [`EventKind`] has exactly one handler slot; registering a handler
//! replaces whatever was there before. This is a deliberate 1:1 registration
//! model for a single-consumer automation runtime, not a subscription list.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use parking_lot::Mutex;

use crate::error::LumenResult;
use crate::event::{Event, EventKind};
use crate::net::ConnectionId;

/// Handler for radio frames.
pub type RadioHandler = Box<dyn FnMut(&[u8]) -> LumenResult<()> + Send>;

/// Handler for network data and connection state markers. Receives the
/// originating connection id alongside the payload.
pub type NetworkHandler = Box<dyn FnMut(ConnectionId, &[u8]) -> LumenResult<()> + Send>;

#[derive(Default)]
struct Slots {
    radio: Option<RadioHandler>,
    network: Option<NetworkHandler>,
    // Bumped on every registration change so a handler taken out for
    // dispatch is only put back if nothing replaced it meanwhile.
    epoch: u64,
}

/// Shared registry of per-kind handlers.
///
/// The scheduler invokes handlers while draining the event queue; the
/// connection manager queries [`is_registered`](Self::is_registered) to
/// decide between dispatch delivery and `rx` buffering.
#[derive(Default)]
pub struct HandlerRegistry {
    slots: Mutex<Slots>,
    // Mirrors of slot occupancy. `is_registered` is called from the I/O
    // thread while it holds the connection pool lock; reading an atomic
    // instead of the slot mutex keeps the two locks from ever nesting in
    // opposite orders.
    radio_set: AtomicBool,
    network_set: AtomicBool,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the radio handler, replacing any previous registration.
    pub fn set_radio_handler(&self, handler: RadioHandler) {
        let mut slots = self.slots.lock();
        if slots.radio.is_some() {
            debug!("replacing registered radio handler");
        }
        slots.radio = Some(handler);
        slots.epoch += 1;
        self.radio_set.store(true, Ordering::Release);
    }

    /// Install the network handler, replacing any previous registration.
    pub fn set_network_handler(&self, handler: NetworkHandler) {
        let mut slots = self.slots.lock();
        if slots.network.is_some() {
            debug!("replacing registered network handler");
        }
        slots.network = Some(handler);
        slots.epoch += 1;
        self.network_set.store(true, Ordering::Release);
    }

    /// Remove the handler for a kind.
    pub fn clear(&self, kind: EventKind) {
        let mut slots = self.slots.lock();
        match kind {
            EventKind::Radio => {
                slots.radio = None;
                self.radio_set.store(false, Ordering::Release);
            }
            EventKind::Network => {
                slots.network = None;
                self.network_set.store(false, Ordering::Release);
            }
        }
        slots.epoch += 1;
    }

    /// Whether a handler is currently registered for `kind`. Lock-free, so
    /// it is safe to call from any producer context.
    pub fn is_registered(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Radio => self.radio_set.load(Ordering::Acquire),
            EventKind::Network => self.network_set.load(Ordering::Acquire),
        }
    }

    /// Deliver one event to its registered handler. The handler is taken
    /// out of its slot and runs with the registry unlocked, so it may
    /// register or clear handlers itself. Handler errors are logged and
    /// swallowed; events without a handler are dropped.
    pub fn dispatch(&self, event: Event) {
        match event.kind {
            EventKind::Radio => {
                let (taken, epoch) = {
                    let mut slots = self.slots.lock();
                    (slots.radio.take(), slots.epoch)
                };
                let Some(mut handler) = taken else {
                    debug!("dropping radio event: no handler registered");
                    return;
                };
                if let Err(e) = handler(event.payload.bytes()) {
                    warn!("event handler error ({:?}): {e}", event.kind);
                }
                let mut slots = self.slots.lock();
                // A registration or clear made while the handler ran wins.
                if slots.epoch == epoch && slots.radio.is_none() {
                    slots.radio = Some(handler);
                }
            }
            EventKind::Network => {
                let (taken, epoch) = {
                    let mut slots = self.slots.lock();
                    (slots.network.take(), slots.epoch)
                };
                let Some(mut handler) = taken else {
                    debug!("dropping network event: no handler registered");
                    return;
                };
                if let Err(e) = handler(event.conn.unwrap_or(0), event.payload.bytes()) {
                    warn!("event handler error ({:?}): {e}", event.kind);
                }
                let mut slots = self.slots.lock();
                if slots.epoch == epoch && slots.network.is_none() {
                    slots.network = Some(handler);
                }
            }
        }
    }
}
