//! Shared utilities for breaker integration tests.

#![allow(dead_code)]

use futures_util::future::{BoxFuture, FutureExt};
use pillar_breaker::resilience::{BackoffPolicy, CancellationToken, CircuitBreakerConfig, Operation};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// How a scripted pillar answers each attempt.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    /// Fail the first `n` attempts, then succeed.
    FailFirst(u32),
    /// Sleep, then succeed.
    Slow(Duration),
}

/// Fake dependency that counts how often it is invoked.
pub struct ScriptedPillar {
    behavior: Behavior,
    invocations: AtomicU32,
}

impl ScriptedPillar {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            invocations: AtomicU32::new(0),
        }
    }

    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl Operation for ScriptedPillar {
    type Output = u32;
    type Error = String;

    fn run(&self, _cancel: CancellationToken) -> BoxFuture<'_, Result<u32, String>> {
        let attempt = self.invocations.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior;
        async move {
            match behavior {
                Behavior::Succeed => Ok(attempt),
                Behavior::Fail => Err(format!("attempt {attempt} failed")),
                Behavior::FailFirst(n) if attempt < n => Err(format!("attempt {attempt} failed")),
                Behavior::FailFirst(_) => Ok(attempt),
                Behavior::Slow(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(attempt)
                }
            }
        }
        .boxed()
    }
}

/// Small, fast config for tests: no retries, short timeouts, tiny backoff.
pub fn fast_config() -> CircuitBreakerConfig {
    CircuitBreakerConfig::default()
        .with_failure_threshold(3)
        .with_recovery_timeout(Duration::from_millis(200))
        .with_success_threshold(1)
        .with_timeout(Duration::from_millis(500))
        .with_max_retries(0)
        .with_backoff(BackoffPolicy::new(Duration::from_millis(5), Duration::from_millis(20)))
}
