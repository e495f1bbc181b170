//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ManagerConfig (validated, immutable)
//!     → CircuitBreakerConfig per pillar, fixed at breaker creation
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; breakers never change thresholds
//! - All fields have defaults to allow minimal configs
//! - Pillar entries override only the fields they set
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::BreakerOverrides;
pub use schema::BreakerSettings;
pub use schema::ManagerConfig;
pub use schema::ObservabilityConfig;
pub use schema::PillarConfig;
pub use validation::ValidationError;

use crate::resilience::CircuitBreakerManager;

impl ManagerConfig {
    /// Build a manager with these defaults and pillar overrides.
    pub fn build_manager(&self) -> CircuitBreakerManager {
        CircuitBreakerManager::new(self.defaults.to_breaker_config())
            .with_overrides(self.pillar_configs())
    }
}
