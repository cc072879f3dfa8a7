//! Status light boundary.

use crate::error::LumenResult;

/// RGB triple for the status light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0 };
    pub const AMBER: Color = Color { r: 255, g: 160, b: 0 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
}

/// Coarse runtime health reported through the status light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Runtime up, all connections healthy.
    Ok,
    /// At least one connection is reconnecting.
    Degraded,
    /// A startup check or connection gave up permanently.
    Fault,
}

/// Driver seam for the status light.
pub trait Indicator: Send {
    fn set_color(&mut self, color: Color) -> LumenResult<()>;
    fn off(&mut self) -> LumenResult<()>;

    /// Map a runtime status onto the light.
    fn indicate(&mut self, status: Status) -> LumenResult<()> {
        match status {
            Status::Ok => self.set_color(Color::GREEN),
            Status::Degraded => self.set_color(Color::AMBER),
            Status::Fault => self.set_color(Color::RED),
        }
    }
}
