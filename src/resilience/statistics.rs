//! Breaker statistics: bounded call history and read-only snapshots.

use crate::resilience::result::CallRecord;
use crate::resilience::state::CircuitState;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Capacity of each breaker's call history.
pub const CALL_HISTORY_CAPACITY: usize = 100;

/// Number of most recent calls reported in a snapshot.
pub const RECENT_CALLS_REPORTED: usize = 10;

/// Sliding window of recent call records; oldest evicted first.
#[derive(Debug, Clone)]
pub struct CallHistory {
    records: VecDeque<CallRecord>,
    capacity: usize,
}

impl CallHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, record: CallRecord) {
        if self.capacity == 0 {
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Execution times of the last `n` calls, oldest first.
    pub fn recent_times(&self, n: usize) -> Vec<Duration> {
        let skip = self.records.len().saturating_sub(n);
        self.records
            .iter()
            .skip(skip)
            .map(|r| r.execution_time)
            .collect()
    }
}

impl Default for CallHistory {
    fn default() -> Self {
        Self::new(CALL_HISTORY_CAPACITY)
    }
}

/// Point-in-time view of one breaker, ready for any monitoring sink.
///
/// Timestamps are seconds since the Unix epoch; durations are seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerStatistics {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub total_calls: u64,
    pub total_failures: u64,
    pub total_successes: u64,
    pub failure_rate: f64,
    pub last_failure_time: Option<f64>,
    pub last_state_change: f64,
    pub recent_call_times: Vec<f64>,
    pub average_call_time: f64,
}

impl BreakerStatistics {
    /// Human-readable one-line summary for logs.
    pub fn format_summary(&self) -> String {
        format!(
            "{} | State: {} | Calls: {} | Failures: {} | Failure rate: {:.1}% | Avg: {:.3}s",
            self.name,
            self.state,
            self.total_calls,
            self.total_failures,
            self.failure_rate * 100.0,
            self.average_call_time
        )
    }
}

/// Seconds since the Unix epoch.
pub(crate) fn unix_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

pub(crate) fn average_seconds(times: &[f64]) -> f64 {
    if times.is_empty() {
        return 0.0;
    }
    times.iter().sum::<f64>() / times.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ms: u64) -> CallRecord {
        CallRecord {
            success: true,
            execution_time: Duration::from_millis(ms),
            retries: 0,
        }
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut history = CallHistory::new(3);
        for ms in 1..=5 {
            history.push(record(ms));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(
            history.recent_times(10),
            vec![
                Duration::from_millis(3),
                Duration::from_millis(4),
                Duration::from_millis(5)
            ]
        );
    }

    #[test]
    fn test_history_never_exceeds_capacity() {
        let mut history = CallHistory::default();
        for ms in 0..250 {
            history.push(record(ms));
        }
        assert_eq!(history.len(), CALL_HISTORY_CAPACITY);
        assert_eq!(history.recent_times(2), vec![Duration::from_millis(248), Duration::from_millis(249)]);
    }

    #[test]
    fn test_average() {
        assert_eq!(average_seconds(&[]), 0.0);
        assert!((average_seconds(&[0.5, 1.5]) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistics_serialize() {
        let stats = BreakerStatistics {
            name: "rendering".into(),
            state: CircuitState::HalfOpen,
            failure_count: 1,
            success_count: 1,
            total_calls: 4,
            total_failures: 3,
            total_successes: 1,
            failure_rate: 0.75,
            last_failure_time: None,
            last_state_change: 1_700_000_000.0,
            recent_call_times: vec![0.25],
            average_call_time: 0.25,
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["state"], "half_open");
        assert!(json["last_failure_time"].is_null());
        assert_eq!(json["total_calls"], 4);
        assert!(stats.format_summary().contains("75.0%"));
    }
}
