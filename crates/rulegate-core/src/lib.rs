//! Staged validation engine for Rulegate
//!
//! This crate provides the building blocks of a validation pass:
//!
//! - [`MultiError`]: an append-only, field-scoped error accumulator
//! - [`ValidationRule`]: the rule contract, plus the variants in [`rules`]
//! - [`ValidationEngine`]: runs rules by stage, then priority, with bounded
//!   parallelism inside each `(stage, priority)` bucket
//! - [`predicates`]: reusable field checks
//!
//! Validation failures are data, recorded in the accumulator. Infrastructure
//! failures are [`RuleFault`]s, which the engine records as `system-error`
//! entries before moving on.
//!
//! ## Features
//!
//! - `tracing` (default): log runs and rule faults through `tracing`
//! - `metrics`: Prometheus counters and histograms ([`ValidationMetrics`])
//! - `config`: load [`EngineConfig`] from `.env` files and prefixed environment variables

mod tracing_macros;

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod fault;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod multi;
pub mod predicates;
pub mod rules;
pub mod stage;
pub mod traits;
mod value;

pub use config::EngineConfig;
pub use context::{Context, ContextBuilder};
pub use engine::ValidationEngine;
pub use error::{ErrorCode, FieldError, Problem, ALL_FIELDS, SYSTEM_FIELD};
pub use fault::{Result, RuleFault};
#[cfg(feature = "metrics")]
pub use metrics::ValidationMetrics;
pub use multi::MultiError;
pub use stage::{Priority, Stage};
pub use traits::{CheckFn, Condition, IntoRule, SharedRule, ValidateFn, ValidationRule};
pub use value::FieldValue;

#[cfg(feature = "config")]
pub use config::{load_dotenv, ConfigError};

/// Re-exports used by the exported macros.
#[doc(hidden)]
pub mod __private {
    pub use tracing;
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::context::Context;
    pub use crate::engine::ValidationEngine;
    pub use crate::error::{ErrorCode, FieldError};
    pub use crate::fault::RuleFault;
    pub use crate::multi::MultiError;
    pub use crate::rules::{
        AsyncRule, BusinessRule, ComplianceRule, CompositeRule, ConcreteRule, ConditionalRule,
        DatabaseRule, FieldRule, LogicalOperator,
    };
    pub use crate::stage::{Priority, Stage};
    pub use crate::traits::{IntoRule, SharedRule, ValidationRule};
    pub use crate::value::FieldValue;
    pub use async_trait::async_trait;
}
