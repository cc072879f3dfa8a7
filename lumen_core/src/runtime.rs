//! Runtime assembly: wires the event queue, handler registry, connection
//! manager and scheduler into the surface automation code programs against.
//!
//! Threading model: [`Runtime::new`] spawns the `lumen-net` I/O thread; the
//! thread calling [`Runtime::run`] becomes the scheduler thread. Everything
//! else (driver callbacks, other threads) reaches the runtime only through
//! the event queue or the thread-safe connection operations.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::config::RuntimeConfig;
use crate::drivers::RadioEvents;
use crate::error::LumenResult;
use crate::event::{Event, EventKind, EventQueue};
use crate::net::{ConnectOptions, ConnState, ConnectionId, ConnectionManager};
use crate::sched::handlers::{NetworkHandler, RadioHandler};
use crate::sched::{HandlerRegistry, Scheduler, Task};

/// The automation-layer runtime.
pub struct Runtime {
    events: Arc<EventQueue>,
    handlers: Arc<HandlerRegistry>,
    net: ConnectionManager,
    sched: Scheduler,
}

impl Runtime {
    /// Build the runtime and start the network I/O thread.
    pub fn new(config: RuntimeConfig) -> LumenResult<Self> {
        config.validate()?;
        let events = Arc::new(EventQueue::with_capacity(config.event_queue_capacity));
        let handlers = Arc::new(HandlerRegistry::new());
        let mut net =
            ConnectionManager::new(Arc::clone(&events), Arc::clone(&handlers), &config)?;
        net.start()?;
        let sched = Scheduler::new(Arc::clone(&events), Arc::clone(&handlers));
        info!(
            "runtime initialized ({} connection slots, {}-event queue)",
            config.max_connections, config.event_queue_capacity
        );
        Ok(Self {
            events,
            handlers,
            net,
            sched,
        })
    }

    /// Build a runtime with [`RuntimeConfig::default`] settings.
    pub fn with_defaults() -> LumenResult<Self> {
        Self::new(RuntimeConfig::default())
    }

    // ---- scheduling ----

    /// Suspend `task` and resume it after at least `delay`.
    pub fn spawn(&mut self, task: impl Task + 'static, delay: Duration) {
        self.sched.schedule(task, delay);
    }

    /// Run the scheduler on the calling thread until no tasks remain.
    pub fn run(&mut self) {
        self.sched.run();
    }

    /// One non-blocking scheduler pump; returns `true` while tasks remain.
    pub fn run_once(&mut self) -> bool {
        self.sched.run_once()
    }

    /// Block the calling context for `duration` while keeping due tasks and
    /// event dispatch alive. Degrade path for code that cannot yield.
    pub fn wait_with_pump(&mut self, duration: Duration) {
        self.sched.wait_with_pump(duration);
    }

    /// Number of suspended tasks.
    pub fn pending_tasks(&self) -> usize {
        self.sched.pending_tasks()
    }

    // ---- handlers ----

    /// Install the radio frame handler, replacing any previous one.
    pub fn register_radio_handler(&self, handler: RadioHandler) {
        self.handlers.set_radio_handler(handler);
    }

    /// Install the network handler, replacing any previous one.
    pub fn register_network_handler(&self, handler: NetworkHandler) {
        self.handlers.set_network_handler(handler);
    }

    /// Whether a handler is registered for `kind`.
    pub fn is_handler_registered(&self, kind: EventKind) -> bool {
        self.handlers.is_registered(kind)
    }

    // ---- network ----

    pub fn connect(
        &self,
        host: &str,
        port: u16,
        opts: ConnectOptions,
    ) -> LumenResult<ConnectionId> {
        self.net.connect(host, port, opts)
    }

    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.net.disconnect(id)
    }

    pub fn send(&self, id: ConnectionId, data: &[u8]) -> LumenResult<usize> {
        self.net.send(id, data)
    }

    pub fn recv(&self, id: ConnectionId) -> LumenResult<Vec<u8>> {
        self.net.recv(id)
    }

    pub fn set_use_dispatcher(&self, id: ConnectionId, enabled: bool) -> LumenResult<()> {
        self.net.set_dispatch_preference(id, enabled)
    }

    pub fn connection_state(&self, id: ConnectionId) -> Option<ConnState> {
        self.net.state(id)
    }

    /// Close and release every connection.
    pub fn shutdown_all(&self) {
        self.net.shutdown_all();
    }

    // ---- producers ----

    /// Enqueue a received radio frame. Producer call for driver callbacks;
    /// oversized frames are carried as owned buffers and a full queue drops
    /// the frame.
    pub fn enqueue_radio_event(&self, frame: &[u8]) {
        if self.events.push(Event::radio_frame(frame)).is_err() {
            log::warn!("event queue full, dropping {}-byte radio frame", frame.len());
        }
    }

    /// Clonable producer handle for radio driver callbacks.
    pub fn radio_events(&self) -> RadioEvents {
        RadioEvents::new(Arc::clone(&self.events))
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.net.shutdown_all();
        self.net.stop();
    }
}
