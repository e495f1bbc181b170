//! Circuit state machine states.
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: recovery timeout elapsed and a call arrives
//! Half-Open → Closed: success_count >= success_threshold
//! Half-Open → Open: any probe failure
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed,
    /// Dependency assumed down, calls fail fast.
    Open,
    /// Testing whether the dependency recovered.
    HalfOpen,
}

impl CircuitState {
    /// Stable lowercase name, matches the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }

    /// Gauge value exported for this state (0 closed, 1 half-open, 2 open).
    pub fn gauge_value(&self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::HalfOpen => 1.0,
            CircuitState::Open => 2.0,
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
