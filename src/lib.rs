//! Circuit breakers for named, independently failing pillars.
//!
//! ```text
//! caller → CircuitBreakerManager → CircuitBreaker(pillar) → CallExecutor → Operation
//!                                        ↑ state machine      ↑ timeout/retry/backoff
//! ```

pub mod config;
pub mod observability;
pub mod resilience;

pub use config::ManagerConfig;
pub use resilience::{
    blocking, non_blocking, BreakerError, BreakerStatistics, CircuitBreaker, CircuitBreakerConfig,
    CircuitBreakerManager, CircuitState, Operation, Protected,
};
