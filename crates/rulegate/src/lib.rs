//! # Rulegate
//!
//! Declarative, staged validation for Rust services.
//!
//! Rules declare a [`Stage`] and a [`Priority`]. The [`ValidationEngine`] runs
//! them stage by stage, highest priority first, in parallel inside each
//! `(stage, priority)` bucket, and collects every failure into one
//! [`MultiError`] whose fields carry their full path (`order.items[2].sku`).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rulegate::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = ValidationEngine::default()
//!         .for_field("customer")
//!         .with_rule(
//!             FieldRule::for_value("email", "not-an-email")
//!                 .check(predicates::required)
//!                 .check(predicates::email),
//!         );
//!
//!     if let Some(errors) = engine.validate(&Context::background()).await {
//!         println!("{}", serde_json::to_string_pretty(&errors.to_problem()).unwrap());
//!     }
//! }
//! ```
//!
//! ## Crates
//!
//! - the crate root: accumulator, rules, engine, predicates
//! - [`tenant`]: validator factory for multi-tenant entities, uniqueness checks
//! - [`batch`]: chunked collection validation
//!
//! ## Optional Features
//!
//! - `tracing` (default): log engine runs and rule faults
//! - `metrics`: Prometheus metrics for engines
//! - `config`: load engine and batch settings from `.env` and the environment
//! - `postgres`: `sqlx` backed [`tenant::PostgresStore`]
//! - `full`: all of the above

pub use rulegate_batch as batch;
pub use rulegate_tenant as tenant;

pub use rulegate_core::*;

pub use rulegate_batch::{
    BatchConfig, BatchProgress, BatchReport, BatchValidator, CollectionValidator,
    IndexedBatchValidator,
};
pub use rulegate_tenant::{
    InMemoryStore, StoreError, TenantStore, TenantedEntity, TenantedValidatorFactory, UniqueField,
    UniquenessRule, ValidationContext,
};

/// Prelude module - import everything you need with `use rulegate::prelude::*`
pub mod prelude {
    pub use rulegate_core::prelude::*;
    pub use rulegate_core::predicates;

    pub use rulegate_tenant::{
        InMemoryStore, TenantStore, TenantedEntity, TenantedValidatorFactory, UniqueField,
        ValidationContext,
    };

    pub use rulegate_batch::{
        BatchConfig, BatchReport, BatchValidator, CollectionValidator, IndexedBatchValidator,
    };
}
