//! Runtime configuration.
//!
//! Sizing knobs for the event queue, the connection pool and the I/O loop.
//! Defaults mirror what a small automation controller needs; presets cover
//! the common deployments.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{LumenError, LumenResult};

/// Configuration for a [`Runtime`](crate::Runtime) instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum number of simultaneously allocated connection slots.
    pub max_connections: usize,
    /// Capacity of the shared event queue.
    pub event_queue_capacity: usize,
    /// Per-connection bound on queued outbound buffers.
    pub tx_queue_len: usize,
    /// Per-connection bound on buffered inbound reads awaiting `recv`.
    pub rx_queue_len: usize,
    /// Upper bound on one readiness wait, so retry timers are revisited
    /// even with no socket activity.
    pub poll_timeout_ms: u64,
    /// Size of the stack buffer used for each socket read.
    pub read_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_connections: 8,
            event_queue_capacity: 8,
            tx_queue_len: 8,
            rx_queue_len: 8,
            poll_timeout_ms: 200,
            read_buffer_size: 1024,
        }
    }
}

impl RuntimeConfig {
    /// Standard configuration for a mains-powered controller.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Configuration for tightly constrained targets: half-size pools and
    /// smaller read buffers.
    pub fn constrained() -> Self {
        Self {
            max_connections: 4,
            event_queue_capacity: 8,
            tx_queue_len: 4,
            rx_queue_len: 4,
            poll_timeout_ms: 200,
            read_buffer_size: 512,
        }
    }

    /// Load a configuration from a TOML file. Missing keys fall back to the
    /// defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> LumenResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let cfg: Self = toml::from_str(&text)
            .map_err(|e| LumenError::config(format!("{}: {e}", path.as_ref().display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations that cannot work at runtime.
    pub fn validate(&self) -> LumenResult<()> {
        if self.max_connections == 0 {
            return Err(LumenError::config("max_connections must be at least 1"));
        }
        if self.event_queue_capacity == 0 {
            return Err(LumenError::config("event_queue_capacity must be at least 1"));
        }
        if self.read_buffer_size == 0 {
            return Err(LumenError::config("read_buffer_size must be at least 1"));
        }
        Ok(())
    }

    /// Poll timeout as a [`Duration`].
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}
