//! Retry policy for external calls.
//!
//! A single injected value describes how many times a transient failure is
//! retried and how the backoff grows, so call sites never hand-roll sleep
//! loops and tests can run the whole schedule with a zero delay.

use std::time::Duration;

/// Exponential backoff: the delay before retry `k` (1-based) is
/// `base_delay * 2^(k-1)` — 2 s, 4 s, 8 s with the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        RetryPolicy {
            max_retries,
            base_delay,
        }
    }

    /// A policy with no waiting between attempts. For tests.
    pub fn immediate(max_retries: u32) -> Self {
        RetryPolicy {
            max_retries,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before the given retry attempt (1-based; 0 is the initial
    /// attempt and never waits). The exponent is capped so a large retry
    /// count cannot overflow into absurd waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let shift = (attempt - 1).min(5);
        self.base_delay * (1u32 << shift)
    }

    /// Sleep out the backoff before retry `attempt`.
    pub async fn wait(&self, attempt: u32) {
        let delay = self.delay_before(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_is_2_4_8() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay_before(0), Duration::ZERO);
        assert_eq!(policy.delay_before(1), Duration::from_secs(2));
        assert_eq!(policy.delay_before(2), Duration::from_secs(4));
        assert_eq!(policy.delay_before(3), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(6), Duration::from_secs(64));
        assert_eq!(policy.delay_before(40), Duration::from_secs(64));
    }

    #[test]
    fn test_immediate_never_waits() {
        let policy = RetryPolicy::immediate(3);
        for attempt in 0..10 {
            assert_eq!(policy.delay_before(attempt), Duration::ZERO);
        }
    }
}
