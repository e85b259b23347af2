//! Retry backoff policy
//!
//! Exponential backoff with jitter, used when BatchWriteItem returns
//! unprocessed items. Jitter spreads concurrent retries so they do not
//! hammer a throttled partition in lockstep.

use rand::Rng;
use std::time::Duration;

/// Delay policy for retrying throttled/unprocessed batch writes.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Maximum retry attempts (not counting the initial request)
    pub max_retries: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Cap on the exponential growth
    pub max_delay: Duration,

    /// Growth factor per attempt
    pub multiplier: f64,

    /// Add a random 0..delay component on top of the base delay
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl BackoffPolicy {
    /// Calculate the delay for a given retry attempt (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms =
            self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let base_ms = base_ms.min(self.max_delay.as_millis() as f64);

        let delay_ms = if self.jitter && base_ms > 0.0 {
            base_ms + rand::thread_rng().gen_range(0.0..base_ms)
        } else {
            base_ms
        };

        Duration::from_millis(delay_ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> BackoffPolicy {
        BackoffPolicy {
            jitter: false,
            ..BackoffPolicy::default()
        }
    }

    #[test]
    fn test_delay_grows_exponentially() {
        let policy = no_jitter();
        assert_eq!(policy.delay_for(0), Duration::from_millis(50));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_respects_cap() {
        let policy = no_jitter();
        assert_eq!(policy.delay_for(10), Duration::from_secs(2));
        assert_eq!(policy.delay_for(30), Duration::from_secs(2));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = BackoffPolicy::default();
        for _ in 0..100 {
            let delay = policy.delay_for(0);
            assert!(delay >= Duration::from_millis(50));
            assert!(delay <= Duration::from_millis(100));
        }
    }
}
