//! Testing utilities for Rulegate
//!
//! Doubles for the two seams of a validation pass:
//!
//! - rules: [`SpyRule`] counts invocations against a [`Times`] expectation,
//!   [`StaticRule`] records a fixed set of errors
//! - stores: [`FailingStore`] fails every query, [`RecordingStore`] keeps
//!   the queries it forwards
//!
//! plus assertion helpers over [`MultiError`](rulegate_core::MultiError).

pub mod assertions;
pub mod expectation;
pub mod rules;
pub mod store;

pub use assertions::{
    assert_error, assert_fields, assert_invalid, assert_system_errors, assert_valid,
};
pub use expectation::Times;
pub use rules::{SpyRule, StaticRule};
pub use store::{FailingStore, RecordingStore};
