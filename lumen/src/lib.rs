//! # LUMEN - Lightweight Unified Microcontroller Event Network
//!
//! LUMEN provides the automation-layer runtime for small connected devices:
//! cooperative task scheduling, typed event delivery and managed TCP
//! connections behind one small surface.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumen::prelude::*;
//!
//! fn main() -> AnyResult<()> {
//!     let mut rt = Runtime::new(RuntimeConfig::default())?;
//!
//!     let conn = rt.connect("example.com", 9000, ConnectOptions {
//!         reconnect: true,
//!         ..ConnectOptions::default()
//!     })?;
//!     rt.register_network_handler(Box::new(move |id, data| {
//!         println!("conn {id}: {} bytes", data.len());
//!         Ok(())
//!     }));
//!
//!     rt.spawn(move || Ok(Step::Yield(Duration::from_secs(1))), Duration::ZERO);
//!     rt.run();
//!     let _ = conn;
//!     Ok(())
//! }
//! ```

// Re-export the core runtime
pub use lumen_core::{self, *};

/// The LUMEN prelude - everything you need to get started
pub mod prelude {
    // Runtime surface
    pub use lumen_core::config::RuntimeConfig;
    pub use lumen_core::runtime::Runtime;

    // Events
    pub use lumen_core::event::{Event, EventKind, EventQueue, Payload};

    // Scheduling
    pub use lumen_core::sched::{Scheduler, Step, Task};

    // Networking
    pub use lumen_core::net::{ConnState, ConnectOptions, ConnectionId};

    // Driver seams
    pub use lumen_core::drivers::{Indicator, RadioEvents, RadioLink, SerialPort, Status};

    // Error types
    pub use lumen_core::error::{LumenError, LumenResult};
    pub type Result<T> = LumenResult<T>;

    // Common std types
    pub use std::sync::Arc;
    pub use std::time::{Duration, Instant};

    // Re-export anyhow for application-level error handling
    pub use anyhow::{anyhow, bail, ensure, Context, Result as AnyResult};

    // Re-export log so applications share the runtime's logging facade
    pub use log;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get LUMEN version
pub fn version() -> &'static str {
    VERSION
}
