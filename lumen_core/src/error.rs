//! Error types for the LUMEN runtime.
//!
//! All fallible public APIs return [`LumenResult`]. Resource and validation
//! failures are reported to the caller as values; errors inside the I/O loop
//! or a resumed task are absorbed and logged, never allowed to take the
//! process down.

use thiserror::Error;

/// Unified error type for the LUMEN runtime.
#[derive(Debug, Error)]
pub enum LumenError {
    /// A bounded resource (connection pool, queue) is exhausted.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Hostname resolution failed.
    #[error("resolution failed: {0}")]
    ResolutionFailed(String),

    /// A connection attempt could not be initiated.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// Unknown or already-freed connection id.
    #[error("invalid connection id {0}")]
    InvalidHandle(u32),

    /// A non-blocking poll found nothing to return.
    #[error("no data")]
    NoData,

    /// A resumed task raised an unrecoverable error.
    #[error("task faulted: {0}")]
    Faulted(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal runtime error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LumenError {
    /// Create a configuration error from any displayable value.
    pub fn config(msg: impl Into<String>) -> Self {
        LumenError::Config(msg.into())
    }

    /// Create a fault from any displayable value.
    pub fn faulted(msg: impl Into<String>) -> Self {
        LumenError::Faulted(msg.into())
    }
}

/// Convenience alias used throughout the crate.
pub type LumenResult<T> = Result<T, LumenError>;
