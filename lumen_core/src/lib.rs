//! # LUMEN Core
//!
//! The core runtime for the LUMEN automation layer.
//!
//! LUMEN runs user automation logic over a small set of shared services on
//! resource-constrained devices. This crate provides the fundamental
//! building blocks:
//!
//! - **Events**: bounded multi-producer / single-consumer queue carrying
//!   typed payloads from drivers and the network into automation handlers
//! - **Scheduling**: deadline-ordered cooperative task scheduler; one
//!   continuation at a time, no preemption
//! - **Networking**: fixed pool of non-blocking TCP connections driven by a
//!   single readiness-multiplexing I/O thread, with capped exponential
//!   reconnect backoff
//! - **Drivers**: trait seams for the radio link, serial port and status
//!   light
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use lumen_core::{Runtime, RuntimeConfig, Step};
//!
//! let mut rt = Runtime::new(RuntimeConfig::default())?;
//! rt.register_network_handler(Box::new(|conn, data| {
//!     println!("conn {conn}: {} bytes", data.len());
//!     Ok(())
//! }));
//! rt.spawn(|| Ok(Step::Yield(Duration::from_secs(1))), Duration::ZERO);
//! rt.run();
//! # Ok::<(), lumen_core::LumenError>(())
//! ```

pub mod config;
pub mod drivers;
pub mod error;
pub mod event;
pub mod net;
pub mod runtime;
pub mod sched;

// Re-export commonly used types for easy access
pub use config::RuntimeConfig;
pub use error::{LumenError, LumenResult};
pub use event::{Event, EventKind, EventQueue, Payload};
pub use net::{ConnState, ConnectOptions, ConnectionId, ConnectionManager};
pub use runtime::Runtime;
pub use sched::{HandlerRegistry, Scheduler, Step, Task};
