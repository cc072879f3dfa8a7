//! Serial port boundary.

use crate::error::LumenResult;

/// Line settings for a serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: 8,
            stop_bits: 1,
        }
    }
}

/// Primitives a serial transport must provide.
pub trait SerialPort: Send {
    fn configure(&mut self, config: SerialConfig) -> LumenResult<()>;
    /// Non-blocking read into `buf`; returns bytes read (0 when none
    /// pending).
    fn read(&mut self, buf: &mut [u8]) -> LumenResult<usize>;
    fn write(&mut self, data: &[u8]) -> LumenResult<usize>;
}
