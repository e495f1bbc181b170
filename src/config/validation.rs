//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds > 0, durations finite and positive)
//! - Detect duplicate pillar entries
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ManagerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{BreakerSettings, ManagerConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{scope}: {field} must be at least 1")]
    ZeroThreshold { scope: String, field: &'static str },

    #[error("{scope}: {field} must be a positive, finite number of seconds (got {value})")]
    InvalidDuration {
        scope: String,
        field: &'static str,
        value: f64,
    },

    #[error("{scope}: backoff_cap_secs ({cap}) is below backoff_base_secs ({base})")]
    BackoffCapBelowBase { scope: String, base: f64, cap: f64 },

    #[error("degraded_threshold must be within [0, 1] (got {0})")]
    DegradedThresholdOutOfRange(f64),

    #[error("pillar entry {0} has an empty name")]
    EmptyPillarName(usize),

    #[error("pillar {0} is configured more than once")]
    DuplicatePillar(String),
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &ManagerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_settings("defaults", &config.defaults, &mut errors);

    if !(0.0..=1.0).contains(&config.degraded_threshold) {
        errors.push(ValidationError::DegradedThresholdOutOfRange(config.degraded_threshold));
    }

    let mut seen = HashSet::new();
    for (index, pillar) in config.pillars.iter().enumerate() {
        if pillar.name.trim().is_empty() {
            errors.push(ValidationError::EmptyPillarName(index));
            continue;
        }
        if !seen.insert(pillar.name.as_str()) {
            errors.push(ValidationError::DuplicatePillar(pillar.name.clone()));
        }

        let scope = format!("pillars.{}", pillar.name);
        validate_settings(&scope, &pillar.overrides.apply(&config.defaults), &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one set of breaker settings under `scope`.
pub fn validate_settings(scope: &str, settings: &BreakerSettings, errors: &mut Vec<ValidationError>) {
    for (field, value) in [
        ("failure_threshold", settings.failure_threshold),
        ("success_threshold", settings.success_threshold),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroThreshold {
                scope: scope.to_string(),
                field,
            });
        }
    }

    for (field, value) in [
        ("recovery_timeout_secs", settings.recovery_timeout_secs),
        ("timeout_secs", settings.timeout_secs),
        ("backoff_cap_secs", settings.backoff_cap_secs),
    ] {
        if !(value.is_finite() && value > 0.0) {
            errors.push(ValidationError::InvalidDuration {
                scope: scope.to_string(),
                field,
                value,
            });
        }
    }

    // A zero base is allowed: retries then fire back to back.
    if !(settings.backoff_base_secs.is_finite() && settings.backoff_base_secs >= 0.0) {
        errors.push(ValidationError::InvalidDuration {
            scope: scope.to_string(),
            field: "backoff_base_secs",
            value: settings.backoff_base_secs,
        });
    } else if settings.backoff_cap_secs < settings.backoff_base_secs {
        errors.push(ValidationError::BackoffCapBelowBase {
            scope: scope.to_string(),
            base: settings.backoff_base_secs,
            cap: settings.backoff_cap_secs,
        });
    }
}
