//! Circuit breaker for pillar protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: pillar assumed down, calls fail fast
//! - Half-Open: testing if pillar recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: recovery timeout elapsed and a call arrives
//! Half-Open → Closed: success_count >= success_threshold
//! Half-Open → Open: probe fails
//! Closed → Closed: success decays failure_count by one
//! ```
//!
//! # Design Decisions
//! - One breaker per pillar, one mutex per breaker
//! - The mutex is never held across an await
//! - Fail fast in Open state without touching the operation
//! - Single probe in flight while Half-Open

use crate::observability::metrics;
use crate::resilience::backoff::BackoffPolicy;
use crate::resilience::error::{BreakerError, BreakerResult};
use crate::resilience::executor::CallExecutor;
use crate::resilience::operation::Operation;
use crate::resilience::result::CallRecord;
use crate::resilience::state::CircuitState;
use crate::resilience::statistics::{
    average_seconds, unix_seconds, BreakerStatistics, CallHistory, RECENT_CALLS_REPORTED,
};
use parking_lot::Mutex;
use std::time::{Duration, SystemTime};
use tokio::time::Instant;
use tracing::Instrument;

/// Per-breaker configuration, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Failures in Closed state before opening.
    pub failure_threshold: u32,
    /// Minimum time spent Open before a probe is allowed.
    pub recovery_timeout: Duration,
    /// Successes in Half-Open state required to close.
    pub success_threshold: u32,
    /// Deadline for a single attempt.
    pub timeout: Duration,
    /// Additional attempts after the first, within one logical call.
    pub max_retries: u32,
    /// Delay policy between attempts.
    pub backoff: BackoffPolicy,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            success_threshold: 3,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Executor running attempts under this configuration.
    pub fn executor(&self) -> CallExecutor {
        CallExecutor::new(self.timeout, self.max_retries, self.backoff)
    }
}

/// How a call was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Probe,
}

/// Mutable breaker data, guarded by the breaker's mutex.
#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    /// Monotonic time of the last trip, drives the recovery timeout.
    opened_at: Option<Instant>,
    last_failure_time: Option<SystemTime>,
    last_state_change: SystemTime,
    probe_in_flight: bool,
    /// Bumped by `reset`; calls admitted under an older epoch are not recorded.
    epoch: u64,
    history: CallHistory,
    total_calls: u64,
    total_failures: u64,
    total_successes: u64,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            opened_at: None,
            last_failure_time: None,
            last_state_change: SystemTime::now(),
            probe_in_flight: false,
            epoch: 0,
            history: CallHistory::default(),
            total_calls: 0,
            total_failures: 0,
            total_successes: 0,
        }
    }

    fn failure_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 0.0;
        }
        self.total_failures as f64 / self.total_calls as f64
    }
}

/// Ticket for one admitted call.
///
/// Releases the half-open probe slot if the call is dropped mid-flight.
struct CallPermit<'a> {
    inner: &'a Mutex<BreakerState>,
    admission: Admission,
    epoch: u64,
}

impl CallPermit<'_> {
    fn is_probe(&self) -> bool {
        self.admission == Admission::Probe
    }

    /// The breaker was reset after this call was admitted.
    fn is_stale(&self, state: &BreakerState) -> bool {
        state.epoch != self.epoch
    }

    /// Release the slot while the caller already holds the lock.
    fn release(mut self, state: &mut BreakerState) {
        if self.is_probe() && !self.is_stale(state) {
            state.probe_in_flight = false;
        }
        self.admission = Admission::Normal;
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if self.is_probe() {
            let mut state = self.inner.lock();
            if !self.is_stale(&state) {
                state.probe_in_flight = false;
            }
        }
    }
}

/// Circuit breaker guarding one named pillar.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    executor: CallExecutor,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        tracing::info!(
            pillar = %name,
            failure_threshold = config.failure_threshold,
            success_threshold = config.success_threshold,
            recovery_timeout = ?config.recovery_timeout,
            timeout = ?config.timeout,
            max_retries = config.max_retries,
            "Circuit breaker initialized"
        );
        metrics::record_state(&name, CircuitState::Closed);

        Self {
            executor: config.executor(),
            name,
            config,
            inner: Mutex::new(BreakerState::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// True unless the circuit is open.
    pub fn is_available(&self) -> bool {
        self.state() != CircuitState::Open
    }

    /// `total_failures / total_calls`, or 0 before any call.
    pub fn failure_rate(&self) -> f64 {
        self.inner.lock().failure_rate()
    }

    /// Execute `op` under breaker protection.
    ///
    /// Fails with [`BreakerError::CircuitOpen`] without invoking `op` while the
    /// circuit is open, or while another half-open probe is outstanding.
    pub async fn call<O>(&self, op: &O) -> BreakerResult<O::Output, O::Error>
    where
        O: Operation + ?Sized,
    {
        let Some(permit) = self.admit() else {
            tracing::debug!(pillar = %self.name, "Call rejected, circuit open");
            metrics::record_rejection(&self.name);
            return Err(BreakerError::CircuitOpen {
                name: self.name.clone(),
            });
        };

        let span = tracing::debug_span!("breaker_call", pillar = %self.name, probe = permit.is_probe());
        let result = self.executor.execute(op).instrument(span).await;
        let (record, outcome) = result.into_outcome();

        self.record(record, permit);

        outcome.map_err(|err| BreakerError::from_call(&self.name, err))
    }

    /// Force the circuit closed and clear all counters and history.
    ///
    /// Calls still in flight complete normally, but their outcomes are not
    /// recorded and a pending probe no longer holds the half-open slot.
    pub fn reset(&self) {
        let mut state = self.inner.lock();
        let epoch = state.epoch.wrapping_add(1);
        *state = BreakerState::new();
        state.epoch = epoch;
        drop(state);

        metrics::record_state(&self.name, CircuitState::Closed);
        tracing::info!(pillar = %self.name, "Circuit reset to CLOSED state");
    }

    /// Read-only snapshot of the breaker.
    pub fn get_statistics(&self) -> BreakerStatistics {
        let state = self.inner.lock();
        let recent_call_times: Vec<f64> = state
            .history
            .recent_times(RECENT_CALLS_REPORTED)
            .iter()
            .map(Duration::as_secs_f64)
            .collect();

        BreakerStatistics {
            name: self.name.clone(),
            state: state.state,
            failure_count: state.failure_count,
            success_count: state.success_count,
            total_calls: state.total_calls,
            total_failures: state.total_failures,
            total_successes: state.total_successes,
            failure_rate: state.failure_rate(),
            last_failure_time: state.last_failure_time.map(unix_seconds),
            last_state_change: unix_seconds(state.last_state_change),
            average_call_time: average_seconds(&recent_call_times),
            recent_call_times,
        }
    }

    fn admit(&self) -> Option<CallPermit<'_>> {
        let mut state = self.inner.lock();
        let admission = match state.state {
            CircuitState::Closed => Admission::Normal,
            CircuitState::Open => {
                let recovered = state
                    .opened_at
                    .map_or(true, |at| at.elapsed() >= self.config.recovery_timeout);
                if !recovered {
                    return None;
                }
                self.transition_to_half_open(&mut state);
                state.probe_in_flight = true;
                Admission::Probe
            }
            CircuitState::HalfOpen => {
                if state.probe_in_flight {
                    return None;
                }
                state.probe_in_flight = true;
                Admission::Probe
            }
        };

        Some(CallPermit {
            inner: &self.inner,
            admission,
            epoch: state.epoch,
        })
    }

    fn record(&self, record: CallRecord, permit: CallPermit<'_>) {
        let mut state = self.inner.lock();
        if permit.is_stale(&state) {
            tracing::debug!(pillar = %self.name, "Discarding outcome of call admitted before reset");
            permit.release(&mut state);
            return;
        }
        let probe = permit.is_probe();
        permit.release(&mut state);

        state.history.push(record);
        state.total_calls += 1;
        if record.success {
            state.total_successes += 1;
        } else {
            state.total_failures += 1;
        }
        metrics::record_call(&self.name, record.success, record.execution_time);

        if record.success {
            match state.state {
                // Only probes count toward closing; late normal calls do not.
                CircuitState::HalfOpen if probe => {
                    state.success_count += 1;
                    if state.success_count >= self.config.success_threshold {
                        self.transition_to_closed(&mut state);
                    }
                }
                CircuitState::Closed => {
                    state.failure_count = state.failure_count.saturating_sub(1);
                }
                CircuitState::HalfOpen | CircuitState::Open => {}
            }
        } else {
            state.failure_count = state.failure_count.saturating_add(1);
            match state.state {
                CircuitState::Closed => {
                    if state.failure_count >= self.config.failure_threshold {
                        self.transition_to_open(&mut state);
                    }
                }
                CircuitState::HalfOpen => self.transition_to_open(&mut state),
                CircuitState::Open => {}
            }
        }
    }

    fn transition_to_open(&self, state: &mut BreakerState) {
        let now = SystemTime::now();
        state.state = CircuitState::Open;
        state.opened_at = Some(Instant::now());
        state.last_failure_time = Some(now);
        state.last_state_change = now;

        tracing::error!(
            pillar = %self.name,
            failures = state.failure_count,
            "Circuit OPENED"
        );
        metrics::record_transition(&self.name, CircuitState::Open);
    }

    fn transition_to_half_open(&self, state: &mut BreakerState) {
        state.state = CircuitState::HalfOpen;
        state.success_count = 0;
        state.last_state_change = SystemTime::now();

        tracing::info!(pillar = %self.name, "Circuit transitioning to HALF_OPEN");
        metrics::record_transition(&self.name, CircuitState::HalfOpen);
    }

    fn transition_to_closed(&self, state: &mut BreakerState) {
        state.state = CircuitState::Closed;
        state.failure_count = 0;
        state.success_count = 0;
        state.last_state_change = SystemTime::now();

        tracing::info!(pillar = %self.name, "Circuit CLOSED, recovery successful");
        metrics::record_transition(&self.name, CircuitState::Closed);
    }
}
