//! Metrics collection.
//!
//! # Responsibilities
//! - Define breaker metrics (calls, rejections, latency, state)
//! - Record through the `metrics` facade only
//!
//! # Metrics
//! - `breaker_calls_total` (counter): logical calls by pillar, outcome
//! - `breaker_rejections_total` (counter): fast-failed calls by pillar
//! - `breaker_call_duration_seconds` (histogram): logical call latency
//! - `breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `breaker_state_transitions_total` (counter): transitions by pillar, target
//!
//! # Design Decisions
//! - No exporter is installed here; without a recorder every call is a no-op
//! - Labels are the pillar name and a small fixed set of values

use crate::resilience::CircuitState;
use std::time::Duration;

pub fn record_call(pillar: &str, success: bool, duration: Duration) {
    let outcome = if success { "success" } else { "failure" };

    metrics::counter!(
        "breaker_calls_total",
        "pillar" => pillar.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    metrics::histogram!("breaker_call_duration_seconds", "pillar" => pillar.to_string())
        .record(duration.as_secs_f64());
}

pub fn record_rejection(pillar: &str) {
    metrics::counter!("breaker_rejections_total", "pillar" => pillar.to_string()).increment(1);
}

pub fn record_state(pillar: &str, state: CircuitState) {
    metrics::gauge!("breaker_state", "pillar" => pillar.to_string()).set(state.gauge_value());
}

pub fn record_transition(pillar: &str, to: CircuitState) {
    metrics::counter!(
        "breaker_state_transitions_total",
        "pillar" => pillar.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
    record_state(pillar, to);
}
