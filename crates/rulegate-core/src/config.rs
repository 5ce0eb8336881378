//! Engine configuration.
//!
//! Configuration structs deserialize with per-field defaults, so they can be
//! read from any serde source. With the `config` feature they can also be
//! loaded from prefixed environment variables:
//!
//! ```ignore
//! use rulegate_core::config::{load_dotenv, EngineConfig};
//!
//! load_dotenv();
//! // RULEGATE_FAIL_FAST=true RULEGATE_MAX_PARALLEL=8
//! let config = EngineConfig::from_env_prefixed("RULEGATE")?;
//! ```

use serde::{Deserialize, Serialize};

/// Default per-bucket task cap.
pub const DEFAULT_MAX_PARALLEL: usize = 5;

/// Settings of a [`ValidationEngine`](crate::ValidationEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Stop at the next bucket boundary once the run recorded an error
    pub fail_fast: bool,
    /// Maximum concurrently running rules per bucket; 1 forces serial execution
    pub max_parallel: usize,
    /// Record Prometheus metrics (requires the `metrics` feature)
    pub enable_metrics: bool,
    /// Emit tracing events for runs and buckets
    pub enable_tracing: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_parallel: DEFAULT_MAX_PARALLEL,
            enable_metrics: false,
            enable_tracing: false,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration running every rule in registration order.
    pub fn serial() -> Self {
        Self {
            max_parallel: 1,
            ..Self::default()
        }
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    pub fn enable_tracing(mut self, enable: bool) -> Self {
        self.enable_tracing = enable;
        self
    }

    /// Load from environment variables starting with `prefix` and an underscore.
    #[cfg(feature = "config")]
    pub fn from_env_prefixed(prefix: &str) -> Result<Self, ConfigError> {
        load_prefixed(prefix)
    }
}

/// Error type for configuration loading failures.
#[cfg(feature = "config")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Env(#[from] envy::Error),
}

/// Deserialize `T` from environment variables starting with `prefix_`.
#[cfg(feature = "config")]
pub fn load_prefixed<T: serde::de::DeserializeOwned>(prefix: &str) -> Result<T, ConfigError> {
    envy::prefixed(format!("{}_", prefix))
        .from_env::<T>()
        .map_err(ConfigError::from)
}

/// Load environment variables from a `.env` file, without overriding existing
/// variables. A missing file is not an error.
#[cfg(feature = "config")]
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert!(!config.fail_fast);
        assert_eq!(config.max_parallel, DEFAULT_MAX_PARALLEL);
        assert!(!config.enable_metrics);
        assert!(!config.enable_tracing);
    }

    #[test]
    fn partial_deserialization_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"fail_fast": true}"#).unwrap();
        assert!(config.fail_fast);
        assert_eq!(config.max_parallel, DEFAULT_MAX_PARALLEL);
    }

    #[test]
    fn max_parallel_floor_is_one() {
        assert_eq!(EngineConfig::new().max_parallel(0).max_parallel, 1);
        assert_eq!(EngineConfig::serial().max_parallel, 1);
    }
}
