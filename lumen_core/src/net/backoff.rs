//! Capped exponential backoff between reconnection attempts.

use std::time::Duration;

/// Hard ceiling on any single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Reconnect timing policy: `base * 2^(attempt-1)`, capped at
/// [`MAX_BACKOFF`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    /// Maximum attempts before giving up; 0 means retry forever.
    pub max_retries: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            max_retries: 3,
        }
    }
}

impl Backoff {
    pub fn new(base: Duration, max_retries: u32) -> Self {
        Self { base, max_retries }
    }

    /// Delay to wait before the given attempt (1-based). Attempt 0 means no
    /// failure has happened yet and carries no delay.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let shift = (attempt - 1).min(31);
        let delay = self
            .base
            .checked_mul(1u32 << shift)
            .unwrap_or(MAX_BACKOFF);
        delay.min(MAX_BACKOFF)
    }

    /// Whether another attempt is allowed after `attempt` failures.
    pub fn should_retry(&self, attempt: u32) -> bool {
        self.max_retries == 0 || attempt < self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_per_attempt() {
        let b = Backoff::new(Duration::from_millis(100), 0);
        assert_eq!(b.delay(1), Duration::from_millis(100));
        assert_eq!(b.delay(2), Duration::from_millis(200));
        assert_eq!(b.delay(3), Duration::from_millis(400));
    }

    #[test]
    fn delay_caps_at_sixty_seconds() {
        let b = Backoff::new(Duration::from_millis(100), 0);
        assert_eq!(b.delay(30), MAX_BACKOFF);
        // Shift amounts past the u32 range must not overflow.
        assert_eq!(b.delay(200), MAX_BACKOFF);
    }

    #[test]
    fn zero_attempt_has_no_delay() {
        let b = Backoff::default();
        assert_eq!(b.delay(0), Duration::ZERO);
    }

    #[test]
    fn max_retries_limits_attempts() {
        let b = Backoff::new(Duration::from_millis(10), 3);
        assert!(b.should_retry(0));
        assert!(b.should_retry(2));
        assert!(!b.should_retry(3));
        assert!(!b.should_retry(4));
    }

    #[test]
    fn zero_max_retries_means_unlimited() {
        let b = Backoff::new(Duration::from_millis(10), 0);
        assert!(b.should_retry(1000));
    }
}
