//! Hardware driver boundary.
//!
//! The runtime never talks to hardware directly; it defines the traits a
//! board support package implements and a producer handle drivers use to
//! push results into the event queue. Vendor timing, link association and
//! self-test logic live behind these seams.

pub mod light;
pub mod radio;
pub mod serial;

pub use light::{Color, Indicator, Status};
pub use radio::{RadioEvents, RadioLink};
pub use serial::{SerialConfig, SerialPort};
