//! Exponential backoff for failed ticks
//!
//! ## Table of Contents
//! - **BackoffConfig**: Base delay and the doubling schedule

use std::time::Duration;

/// Exponential backoff schedule applied between failed tick attempts.
/// The delay doubles per consecutive failure and is capped at the
/// campaign's current interval so a failing campaign never waits longer
/// than its normal cadence.
#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    /// Delay after the first failure
    pub base: Duration,
}

impl BackoffConfig {
    /// Create a schedule with the given base delay
    pub fn new(base: Duration) -> Self {
        Self { base }
    }

    /// Delay before the next attempt after `failures` consecutive fatal
    /// failures, capped at `cap`.
    pub fn delay_for(&self, failures: u32, cap: Duration) -> Duration {
        if failures == 0 {
            return cap;
        }
        let exponent = failures.min(32);
        let delay_ms = (self.base.as_millis()) << exponent;
        Duration::from_millis(delay_ms.min(cap.as_millis()) as u64)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubles_per_failure() {
        let backoff = BackoffConfig::new(Duration::from_millis(100));
        let cap = Duration::from_secs(3600);
        assert_eq!(backoff.delay_for(1, cap), Duration::from_millis(200));
        assert_eq!(backoff.delay_for(2, cap), Duration::from_millis(400));
        assert_eq!(backoff.delay_for(3, cap), Duration::from_millis(800));
        assert_eq!(backoff.delay_for(4, cap), Duration::from_millis(1600));
    }

    #[test]
    fn test_capped_at_interval() {
        let backoff = BackoffConfig::default();
        let cap = Duration::from_secs(120);
        // 30s * 2^4 = 480s, capped to the 120s interval
        assert_eq!(backoff.delay_for(4, cap), cap);
        // first failure stays under the cap: 30s * 2 = 60s
        assert_eq!(backoff.delay_for(1, cap), Duration::from_secs(60));
    }

    #[test]
    fn test_large_failure_count_does_not_overflow() {
        let backoff = BackoffConfig::default();
        let cap = Duration::from_secs(300);
        assert_eq!(backoff.delay_for(u32::MAX, cap), cap);
    }

    #[test]
    fn test_zero_failures_waits_full_interval() {
        let backoff = BackoffConfig::default();
        let cap = Duration::from_secs(120);
        assert_eq!(backoff.delay_for(0, cap), cap);
    }
}
