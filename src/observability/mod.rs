//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breakers and executors produce:
//!     → logging.rs (structured log events, per-call spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Whatever metrics recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Pillar name is a field on every event, never baked into the message
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
