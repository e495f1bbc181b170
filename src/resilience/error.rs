//! Error types for protected calls.

use std::time::Duration;
use thiserror::Error;

/// Outcome of a failed logical call, as seen by the executor.
///
/// The executor knows nothing about circuits, so this carries no breaker name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError<E> {
    /// The attempt did not finish within its deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// The operation itself failed.
    #[error("operation failed: {0}")]
    Operation(E),
}

/// Errors returned from a breaker-protected call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BreakerError<E> {
    /// The circuit is open; the operation was not invoked.
    #[error("circuit open for {name}")]
    CircuitOpen { name: String },

    /// The final attempt exceeded its per-attempt deadline.
    #[error("call timeout for {name} after {timeout:?}")]
    Timeout { name: String, timeout: Duration },

    /// The operation's own error, passed through unchanged.
    #[error("{0}")]
    Operation(E),
}

impl<E> BreakerError<E> {
    pub(crate) fn from_call(name: &str, err: CallError<E>) -> Self {
        match err {
            CallError::Timeout(timeout) => BreakerError::Timeout {
                name: name.to_string(),
                timeout,
            },
            CallError::Operation(e) => BreakerError::Operation(e),
        }
    }

    /// True for the breaker's fast-fail rejection.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, BreakerError::CircuitOpen { .. })
    }

    /// True when the call failed on its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BreakerError::Timeout { .. })
    }

    /// The operation's own error, if that is what failed the call.
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            BreakerError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for breaker-protected calls.
pub type BreakerResult<T, E> = Result<T, BreakerError<E>>;
