//! Operations bound to a pillar.
//!
//! # Responsibilities
//! - Pair one operation with the breaker of the pillar it belongs to
//! - Let call sites invoke it without naming the pillar again
//!
//! # Design Decisions
//! - The breaker is resolved once, when the handle is made; `reset_all`
//!   keeps breaker identities, so the handle never goes stale

use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::error::BreakerResult;
use crate::resilience::operation::Operation;
use std::sync::Arc;

/// An operation whose every call goes through its pillar's breaker.
///
/// Built by [`CircuitBreakerManager::protect`](crate::resilience::CircuitBreakerManager::protect).
#[derive(Debug, Clone)]
pub struct Protected<O> {
    breaker: Arc<CircuitBreaker>,
    op: O,
}

impl<O: Operation> Protected<O> {
    pub(crate) fn new(breaker: Arc<CircuitBreaker>, op: O) -> Self {
        Self { breaker, op }
    }

    pub fn pillar(&self) -> &str {
        self.breaker.name()
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Run the wrapped operation under breaker protection.
    pub async fn call(&self) -> BreakerResult<O::Output, O::Error> {
        self.breaker.call(&self.op).await
    }
}
