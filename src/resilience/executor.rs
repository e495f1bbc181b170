//! Retry execution of one logical call.
//!
//! # Responsibilities
//! - Run up to `max_retries + 1` attempts, each under its own deadline
//! - Sleep a capped exponential backoff between attempts
//! - Fold the attempts into a single [`CallResult`]
//!
//! # Design Decisions
//! - No knowledge of circuit state; usable on its own
//! - Backoff sleeps do not count against the per-attempt deadline
//! - The last attempt's error is the one reported

use crate::resilience::backoff::BackoffPolicy;
use crate::resilience::error::CallError;
use crate::resilience::operation::Operation;
use crate::resilience::result::CallResult;
use crate::resilience::timeouts::run_with_deadline;
use std::time::Duration;
use tokio::time::Instant;

/// Executes operations with a per-attempt timeout and bounded retries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExecutor {
    timeout: Duration,
    max_retries: u32,
    backoff: BackoffPolicy,
}

impl CallExecutor {
    pub fn new(timeout: Duration, max_retries: u32, backoff: BackoffPolicy) -> Self {
        Self {
            timeout,
            max_retries,
            backoff,
        }
    }

    /// Run `op` until it succeeds or attempts are exhausted.
    pub async fn execute<O>(&self, op: &O) -> CallResult<O::Output, O::Error>
    where
        O: Operation + ?Sized,
    {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            let error = match run_with_deadline(op, self.timeout).await {
                Ok(value) => return CallResult::succeeded(value, start.elapsed(), attempt),
                Err(err) => err,
            };

            match &error {
                CallError::Timeout(limit) => {
                    tracing::warn!(attempt = attempt + 1, timeout = ?limit, "Attempt timed out");
                }
                CallError::Operation(_) => {
                    tracing::warn!(attempt = attempt + 1, "Attempt failed");
                }
            }

            if attempt >= self.max_retries {
                return CallResult::failed(error, start.elapsed(), self.max_retries);
            }

            let delay = self.backoff.delay(attempt);
            tracing::debug!(attempt = attempt + 1, delay = ?delay, "Backing off before retry");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::operation::non_blocking;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_backoff() -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_millis(10), Duration::from_millis(40))
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let executor = CallExecutor::new(Duration::from_millis(100), 2, fast_backoff());
        let op = non_blocking(|_| async { Ok::<_, String>("ok") });

        let result = executor.execute(&op).await;
        assert!(result.is_success());
        assert_eq!(result.retries(), 0);
        assert_eq!(result.value(), Some(&"ok"));
    }

    #[tokio::test]
    async fn test_transient_failure_recovered() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let op = non_blocking(move |_| {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("flaky".to_string())
                } else {
                    Ok(99u32)
                }
            }
        });

        let executor = CallExecutor::new(Duration::from_millis(100), 2, fast_backoff());
        let result = executor.execute(&op).await;

        assert!(result.is_success());
        assert_eq!(result.retries(), 2);
        assert_eq!(result.value(), Some(&99));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let op = non_blocking(move |_| {
            let c = c.clone();
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(format!("failure {}", n))
            }
        });

        let executor = CallExecutor::new(Duration::from_millis(100), 1, fast_backoff());
        let result = executor.execute(&op).await;

        assert!(!result.is_success());
        assert_eq!(result.retries(), 1);
        assert_eq!(result.error(), Some(&CallError::Operation("failure 1".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_retries_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let op = non_blocking(move |_| {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("down")
            }
        });

        let executor = CallExecutor::new(Duration::from_millis(100), 0, fast_backoff());
        let result = executor.execute(&op).await;

        assert!(!result.is_success());
        assert_eq!(result.retries(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeouts_then_backoff_elapsed() {
        let op = non_blocking(|_| async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<_, String>(())
        });

        let backoff = BackoffPolicy::new(Duration::from_millis(50), Duration::from_millis(50));
        let executor = CallExecutor::new(Duration::from_millis(40), 1, backoff);

        let started = std::time::Instant::now();
        let result = executor.execute(&op).await;
        let elapsed = started.elapsed();

        assert_eq!(result.error(), Some(&CallError::Timeout(Duration::from_millis(40))));
        // Two deadlines plus one backoff.
        assert!(elapsed >= Duration::from_millis(130));
        assert!(elapsed < Duration::from_millis(900));
        assert!(result.execution_time() >= Duration::from_millis(130));
    }
}
