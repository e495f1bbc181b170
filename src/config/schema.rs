//! Configuration schema definitions.
//!
//! This module defines the file-facing configuration for breaker managers.
//! All types derive Serde traits for deserialization from config files.
//! Durations are written as (fractional) seconds.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::resilience::{BackoffPolicy, CircuitBreakerConfig, DEFAULT_DEGRADED_THRESHOLD};

/// Root configuration for a circuit breaker manager.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ManagerConfig {
    /// Settings for every breaker without its own pillar entry.
    pub defaults: BreakerSettings,

    /// Failure rate above which a pillar is reported as degraded.
    pub degraded_threshold: f64,

    /// Per-pillar overrides.
    pub pillars: Vec<PillarConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            defaults: BreakerSettings::default(),
            degraded_threshold: DEFAULT_DEGRADED_THRESHOLD,
            pillars: Vec::new(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Per-pillar breaker configurations, overrides applied over `defaults`.
    pub fn pillar_configs(&self) -> Vec<(String, CircuitBreakerConfig)> {
        self.pillars
            .iter()
            .map(|p| (p.name.clone(), p.overrides.apply(&self.defaults).to_breaker_config()))
            .collect()
    }

    /// Effective settings for `pillar`.
    pub fn settings_for(&self, pillar: &str) -> BreakerSettings {
        self.pillars
            .iter()
            .find(|p| p.name == pillar)
            .map(|p| p.overrides.apply(&self.defaults))
            .unwrap_or_else(|| self.defaults.clone())
    }
}

/// Breaker settings as written in a config file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BreakerSettings {
    /// Failures in Closed state before the circuit opens.
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before a probe is allowed.
    pub recovery_timeout_secs: f64,

    /// Half-open successes required to close.
    pub success_threshold: u32,

    /// Per-attempt timeout in seconds.
    pub timeout_secs: f64,

    /// Additional attempts after the first.
    pub max_retries: u32,

    /// Delay before the first retry, in seconds; doubles per attempt.
    pub backoff_base_secs: f64,

    /// Upper bound on any retry delay, in seconds.
    pub backoff_cap_secs: f64,

    /// Add up to 10% random extra delay to each backoff.
    pub backoff_jitter: bool,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        let defaults = CircuitBreakerConfig::default();
        Self {
            failure_threshold: defaults.failure_threshold,
            recovery_timeout_secs: defaults.recovery_timeout.as_secs_f64(),
            success_threshold: defaults.success_threshold,
            timeout_secs: defaults.timeout.as_secs_f64(),
            max_retries: defaults.max_retries,
            backoff_base_secs: defaults.backoff.base.as_secs_f64(),
            backoff_cap_secs: defaults.backoff.cap.as_secs_f64(),
            backoff_jitter: defaults.backoff.jitter,
        }
    }
}

impl BreakerSettings {
    /// Convert into a runtime configuration.
    ///
    /// Expects validated settings; negative or non-finite seconds clamp to zero.
    pub fn to_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            recovery_timeout: seconds(self.recovery_timeout_secs),
            success_threshold: self.success_threshold,
            timeout: seconds(self.timeout_secs),
            max_retries: self.max_retries,
            backoff: BackoffPolicy::new(seconds(self.backoff_base_secs), seconds(self.backoff_cap_secs))
                .with_jitter(self.backoff_jitter),
        }
    }
}

fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

/// Per-pillar breaker settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PillarConfig {
    /// Pillar name, as passed to the manager.
    pub name: String,

    /// Fields set here replace the `[defaults]` value.
    #[serde(flatten)]
    pub overrides: BreakerOverrides,
}

/// Optional replacements for [`BreakerSettings`] fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BreakerOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_timeout_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_base_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_cap_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_jitter: Option<bool>,
}

impl BreakerOverrides {
    /// Overlay these overrides on `base`.
    pub fn apply(&self, base: &BreakerSettings) -> BreakerSettings {
        BreakerSettings {
            failure_threshold: self.failure_threshold.unwrap_or(base.failure_threshold),
            recovery_timeout_secs: self.recovery_timeout_secs.unwrap_or(base.recovery_timeout_secs),
            success_threshold: self.success_threshold.unwrap_or(base.success_threshold),
            timeout_secs: self.timeout_secs.unwrap_or(base.timeout_secs),
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            backoff_base_secs: self.backoff_base_secs.unwrap_or(base.backoff_base_secs),
            backoff_cap_secs: self.backoff_cap_secs.unwrap_or(base.backoff_cap_secs),
            backoff_jitter: self.backoff_jitter.unwrap_or(base.backoff_jitter),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
