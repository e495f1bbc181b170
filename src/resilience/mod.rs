//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to pillar:
//!     → manager.rs (resolve or lazily create the pillar's breaker)
//!     → circuit_breaker.rs (fail fast if open, admit probe if recovering)
//!     → executor.rs (attempt loop, backoff.rs between attempts)
//!     → timeouts.rs (enforce per-attempt deadline, cancel token on expiry)
//!     → result.rs (fold attempts into one CallResult)
//!     → circuit_breaker.rs (record outcome, drive state machine)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Retries are local to one logical call; only the final outcome
//!   reaches the state machine
//! - Circuit breaker prevents hammering a failing pillar
//! - Statistics are an in-memory snapshot; exporting them is the caller's job

pub mod backoff;
pub mod circuit_breaker;
pub mod error;
pub mod executor;
pub mod manager;
pub mod operation;
pub mod protected;
pub mod result;
pub mod state;
pub mod statistics;
pub mod timeouts;

pub use backoff::BackoffPolicy;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
pub use error::{BreakerError, BreakerResult, CallError};
pub use executor::CallExecutor;
pub use manager::{CircuitBreakerManager, DEFAULT_DEGRADED_THRESHOLD};
pub use operation::{blocking, non_blocking, Blocking, NonBlocking, Operation};
pub use protected::Protected;
pub use result::{CallRecord, CallResult};
pub use state::CircuitState;
pub use statistics::BreakerStatistics;
pub use tokio_util::sync::CancellationToken;
