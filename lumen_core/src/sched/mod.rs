//! # Cooperative scheduling
//!
//! The scheduler resumes suspended automation tasks at wall-clock deadlines
//! and is the sole consumer of the shared event queue:
//!
//! - **Task**: a resumable unit of automation logic; each resume runs to the
//!   next suspend point and reports [`Step::Yield`] or [`Step::Complete`]
//! - **Scheduler**: deadline-ordered task list with FIFO tie-break, drains
//!   the event queue between resumptions
//! - **HandlerRegistry**: single-slot, last-registration-wins callback per
//!   event kind
//!
//! Only one task runs at a time; there is no preemption and no cancellation
//! primitive. A task that returns an error is logged and discarded.

pub mod handlers;
pub mod scheduler;
pub mod task;

pub use handlers::HandlerRegistry;
pub use scheduler::Scheduler;
pub use task::{Step, Task};
