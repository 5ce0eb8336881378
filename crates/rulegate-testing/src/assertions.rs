//! Assertions over validation results.

use rulegate_core::{ErrorCode, FieldError, MultiError};

/// Assert that validation passed.
#[track_caller]
pub fn assert_valid(result: Option<&MultiError>) {
    if let Some(errors) = result {
        panic!("expected no validation errors, got {:?}", errors.errors());
    }
}

/// Assert that validation failed and return the errors.
#[track_caller]
pub fn assert_invalid(result: Option<MultiError>) -> MultiError {
    match result {
        Some(errors) if errors.has_errors() => errors,
        _ => panic!("expected validation errors, got none"),
    }
}

/// Assert the exact list of error fields, in recorded order.
#[track_caller]
pub fn assert_fields(errors: &MultiError, expected: &[&str]) {
    let fields = errors.fields();
    assert_eq!(fields, expected, "error fields differ");
}

/// Assert that `field` carries an error with `code` and return the first such error.
#[track_caller]
pub fn assert_error(errors: &MultiError, field: &str, code: ErrorCode) -> FieldError {
    let all = errors.errors();
    match all.iter().find(|e| e.field == field && e.code == code) {
        Some(error) => error.clone(),
        None => panic!("expected a {code:?} error on {field:?}, got {all:?}"),
    }
}

/// Assert that exactly `count` system errors were recorded.
#[track_caller]
pub fn assert_system_errors(errors: &MultiError, count: usize) {
    let found = errors.errors().iter().filter(|e| e.is_system()).count();
    assert_eq!(found, count, "system error count differs");
}
