//! Capped exponential backoff between retry attempts.

use rand::Rng;
use std::time::Duration;

/// Default delay before the first retry.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Default ceiling on any single backoff delay.
pub const DEFAULT_BACKOFF_CAP: Duration = Duration::from_secs(5);

/// Backoff policy: `min(base * 2^attempt, cap)`, optionally jittered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
    /// Add up to 10% random extra delay.
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BACKOFF_BASE,
            cap: DEFAULT_BACKOFF_CAP,
            jitter: false,
        }
    }
}

impl BackoffPolicy {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            jitter: false,
        }
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay to wait after the failed attempt `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base, self.cap, self.jitter)
    }
}

/// Calculate capped exponential backoff with optional jitter.
pub fn calculate_backoff(attempt: u32, base: Duration, cap: Duration, jitter: bool) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    let capped = base.saturating_mul(factor).min(cap);

    if !jitter {
        return capped;
    }

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped.as_millis() as u64 / 10;
    let extra = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    capped + Duration::from_millis(extra)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(3), Duration::from_secs(5));
        assert_eq!(policy.delay(40), Duration::from_secs(5));
    }

    #[test]
    fn test_backoff_jitter_bounds() {
        let policy = BackoffPolicy::new(Duration::from_millis(100), Duration::from_millis(1000))
            .with_jitter(true);

        for _ in 0..50 {
            let d = policy.delay(1);
            assert!(d >= Duration::from_millis(200));
            assert!(d < Duration::from_millis(220));
        }

        let max = policy.delay(10);
        assert!(max >= Duration::from_millis(1000));
    }
}
