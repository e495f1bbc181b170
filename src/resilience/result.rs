//! Outcome record of one logical call.

use crate::resilience::error::CallError;
use std::time::Duration;

/// Result of executing a protected operation, retries included.
///
/// Produced once by the executor and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CallResult<T, E> {
    outcome: Result<T, CallError<E>>,
    execution_time: Duration,
    retries: u32,
}

impl<T, E> CallResult<T, E> {
    pub fn succeeded(value: T, execution_time: Duration, retries: u32) -> Self {
        Self {
            outcome: Ok(value),
            execution_time,
            retries,
        }
    }

    pub fn failed(error: CallError<E>, execution_time: Duration, retries: u32) -> Self {
        Self {
            outcome: Err(error),
            execution_time,
            retries,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&CallError<E>> {
        self.outcome.as_ref().err()
    }

    /// Wall time from the first attempt to the final outcome, backoff included.
    pub fn execution_time(&self) -> Duration {
        self.execution_time
    }

    /// Attempts made after the first one.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Metadata kept in breaker history once the payload has been handed back.
    pub fn record(&self) -> CallRecord {
        CallRecord {
            success: self.is_success(),
            execution_time: self.execution_time,
            retries: self.retries,
        }
    }

    /// Split into the record and the payload.
    pub fn into_outcome(self) -> (CallRecord, Result<T, CallError<E>>) {
        (self.record(), self.outcome)
    }
}

/// Payload-free summary of a call, stored in the breaker's history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallRecord {
    pub success: bool,
    pub execution_time: Duration,
    pub retries: u32,
}
