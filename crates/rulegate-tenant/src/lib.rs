//! Tenant-scoped validation for Rulegate
//!
//! [`TenantedValidatorFactory`] turns any [`TenantedEntity`] into a composed
//! [`ValidationEngine`](rulegate_core::ValidationEngine): the entity's own
//! checks, the id-on-create invariant, uniqueness within the entity's
//! organization and business unit, and caller-supplied rules.
//!
//! Uniqueness is checked against a [`TenantStore`]. [`InMemoryStore`] is
//! always available; enable the `postgres` feature for a `sqlx` backed store.

pub mod entity;
pub mod error;
pub mod factory;
pub mod store;
pub mod unique;

pub use entity::{TenantedEntity, ValidationContext};
pub use error::{Result, StoreError};
pub use factory::TenantedValidatorFactory;
pub use store::memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use store::postgres::PostgresStore;
pub use store::{CountQuery, TenantStore};
pub use unique::{StoreProvider, UniqueField, UniquenessRule};
