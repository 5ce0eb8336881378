//! Collection validation for Rulegate
//!
//! - [`BatchValidator`]: runs a per-item validator over chunks with bounded
//!   concurrency, fail-fast and an error cap
//! - [`IndexedBatchValidator`]: the same, filing errors under `field[index]`
//! - [`CollectionValidator`]: a batch wrapped in pre-load and post-load hooks
//!
//! ## Features
//!
//! - `config`: load [`BatchConfig`] from prefixed environment variables

pub mod collection;
pub mod config;
pub mod report;
pub mod validator;

pub use collection::{CollectionValidator, PostLoadFn, PreLoadFn};
pub use config::BatchConfig;
pub use report::{BatchProgress, BatchReport};
pub use validator::{BatchValidator, IndexedBatchValidator, ItemFn, ProgressFn};
