//! Circuit breaker registry.
//!
//! # Responsibilities
//! - Map pillar name → breaker, creating breakers lazily on first use
//! - Route calls through the right breaker, or bind an operation to one
//! - Aggregate health across breakers (open circuits, degraded pillars)
//!
//! # Design Decisions
//! - Explicitly constructed and shared via `Arc`; no process-global instance
//! - `DashMap::entry` makes first insertion atomic, one breaker per name
//! - Breakers are never removed; `reset_all` keeps identities

use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::resilience::error::BreakerResult;
use crate::resilience::operation::Operation;
use crate::resilience::protected::Protected;
use crate::resilience::state::CircuitState;
use crate::resilience::statistics::BreakerStatistics;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Failure rate above which a pillar is reported as degraded.
pub const DEFAULT_DEGRADED_THRESHOLD: f64 = 0.1;

/// Registry of circuit breakers keyed by pillar name.
#[derive(Debug)]
pub struct CircuitBreakerManager {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    default_config: CircuitBreakerConfig,
    /// Per-pillar configuration used when a breaker is first created.
    overrides: HashMap<String, CircuitBreakerConfig>,
}

impl CircuitBreakerManager {
    /// Create a manager whose breakers default to `default_config`.
    pub fn new(default_config: CircuitBreakerConfig) -> Self {
        tracing::info!("Circuit breaker manager initialized");
        Self {
            breakers: DashMap::new(),
            default_config,
            overrides: HashMap::new(),
        }
    }

    /// Register per-pillar configurations, applied on first use of each name.
    pub fn with_overrides(
        mut self,
        overrides: impl IntoIterator<Item = (String, CircuitBreakerConfig)>,
    ) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// Get the breaker for `name`, creating it if absent.
    ///
    /// `config` only matters on creation. Without it the pillar's registered
    /// override is used, then the manager default.
    pub fn get_breaker(&self, name: &str, config: Option<CircuitBreakerConfig>) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return Arc::clone(existing.value());
        }

        let entry = self.breakers.entry(name.to_string()).or_insert_with(|| {
            let config = config
                .or_else(|| self.overrides.get(name).copied())
                .unwrap_or(self.default_config);
            Arc::new(CircuitBreaker::new(name, config))
        });
        Arc::clone(entry.value())
    }

    /// Call `op` through the breaker for `name`.
    pub async fn call_through<O>(&self, name: &str, op: &O) -> BreakerResult<O::Output, O::Error>
    where
        O: Operation + ?Sized,
    {
        let breaker = self.get_breaker(name, None);
        breaker.call(op).await
    }

    /// Bind `op` to the breaker for `name`, creating it with `config` if absent.
    pub fn protect<O: Operation>(
        &self,
        name: &str,
        config: Option<CircuitBreakerConfig>,
        op: O,
    ) -> Protected<O> {
        Protected::new(self.get_breaker(name, config), op)
    }

    /// Names of all managed pillars, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.breakers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    pub fn get_all_statistics(&self) -> BTreeMap<String, BreakerStatistics> {
        self.snapshot()
            .into_iter()
            .map(|breaker| (breaker.name().to_string(), breaker.get_statistics()))
            .collect()
    }

    /// Reset every managed breaker to Closed.
    pub fn reset_all(&self) {
        for breaker in self.snapshot() {
            breaker.reset();
        }
        tracing::info!(count = self.breakers.len(), "All circuit breakers reset");
    }

    /// Pillars whose circuit is currently open.
    pub fn get_open_circuits(&self) -> Vec<String> {
        self.filter_names(|breaker| breaker.state() == CircuitState::Open)
    }

    /// Pillars whose failure rate exceeds `threshold`, whatever their state.
    pub fn get_degraded_pillars(&self, threshold: f64) -> Vec<String> {
        self.filter_names(|breaker| breaker.failure_rate() > threshold)
    }

    /// Clone the breaker handles so no map shard lock is held while breakers are locked.
    fn snapshot(&self) -> Vec<Arc<CircuitBreaker>> {
        self.breakers.iter().map(|e| Arc::clone(e.value())).collect()
    }

    fn filter_names(&self, predicate: impl Fn(&CircuitBreaker) -> bool) -> Vec<String> {
        let mut names: Vec<String> = self
            .snapshot()
            .into_iter()
            .filter(|breaker| predicate(breaker.as_ref()))
            .map(|breaker| breaker.name().to_string())
            .collect();
        names.sort();
        names
    }
}

impl Default for CircuitBreakerManager {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::operation::non_blocking;
    use std::time::Duration;

    fn quick_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig::default()
            .with_failure_threshold(2)
            .with_timeout(Duration::from_millis(100))
            .with_max_retries(0)
    }

    #[test]
    fn test_get_breaker_is_lazy_and_stable() {
        let manager = CircuitBreakerManager::new(quick_config());
        assert!(manager.is_empty());

        let a = manager.get_breaker("assets", None);
        let b = manager.get_breaker("assets", Some(CircuitBreakerConfig::default()));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(manager.len(), 1);

        // Config supplied after creation is ignored.
        assert_eq!(b.config().failure_threshold, 2);
    }

    #[test]
    fn test_config_precedence() {
        let manager = CircuitBreakerManager::new(quick_config()).with_overrides([(
            "genetics".to_string(),
            quick_config().with_failure_threshold(9),
        )]);

        assert_eq!(manager.get_breaker("genetics", None).config().failure_threshold, 9);
        assert_eq!(manager.get_breaker("assets", None).config().failure_threshold, 2);
        assert_eq!(
            manager
                .get_breaker("rendering", Some(quick_config().with_failure_threshold(7)))
                .config()
                .failure_threshold,
            7
        );
        assert_eq!(manager.names(), vec!["assets", "genetics", "rendering"]);
    }

    #[tokio::test]
    async fn test_open_and_degraded_queries() {
        let manager = CircuitBreakerManager::new(quick_config());
        let failing = non_blocking(|_| async { Err::<(), _>("down".to_string()) });
        let healthy = non_blocking(|_| async { Ok::<(), String>(()) });

        for _ in 0..2 {
            manager.call_through("assets", &failing).await.unwrap_err();
        }
        manager.call_through("rendering", &healthy).await.unwrap();

        assert_eq!(manager.get_open_circuits(), vec!["assets"]);
        assert_eq!(manager.get_degraded_pillars(DEFAULT_DEGRADED_THRESHOLD), vec!["assets"]);

        let stats = manager.get_all_statistics();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats["assets"].state, CircuitState::Open);
        assert_eq!(stats["rendering"].total_successes, 1);

        manager.reset_all();
        assert!(manager.get_open_circuits().is_empty());
        assert!(manager.get_degraded_pillars(0.0).is_empty());
        assert_eq!(manager.len(), 2);
    }
}
