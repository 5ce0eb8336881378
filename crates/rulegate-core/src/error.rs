//! Field-level validation errors and the API problem format.

use crate::stage::Priority;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Field marker used for errors that concern the whole object.
pub const ALL_FIELDS: &str = "__all__";

/// Field name used for infrastructure failures reported by the engine.
pub const SYSTEM_FIELD: &str = "system";

/// Kind of a validation failure.
///
/// Serialized in kebab-case (`invalid-format`, `system-error`, ...). Codes that
/// are not recognized when deserializing are read back as [`ErrorCode::Invalid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    Required,
    InvalidFormat,
    InvalidLength,
    ComplianceViolation,
    Authorization,
    SystemError,
    NotFound,
    #[serde(other)]
    Invalid,
}

impl ErrorCode {
    /// Get the wire name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Required => "required",
            ErrorCode::Invalid => "invalid",
            ErrorCode::InvalidFormat => "invalid-format",
            ErrorCode::InvalidLength => "invalid-length",
            ErrorCode::ComplianceViolation => "compliance-violation",
            ErrorCode::Authorization => "authorization",
            ErrorCode::SystemError => "system-error",
            ErrorCode::NotFound => "not-found",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field (`order.items[2].sku`)
    pub field: String,
    /// Kind of failure
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Display weight of the error
    #[serde(default)]
    pub priority: Priority,
    /// Optional structured details
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, serde_json::Value>,
}

impl FieldError {
    /// Create a new field error with medium priority.
    pub fn new(field: impl Into<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
            priority: Priority::default(),
            details: HashMap::new(),
        }
    }

    /// Create a `system-error` on the [`SYSTEM_FIELD`] field.
    pub fn system(message: impl Into<String>) -> Self {
        Self::new(SYSTEM_FIELD, ErrorCode::SystemError, message)
    }

    /// Set the priority of the error.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Attach a structured detail to the error.
    pub fn detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.insert(key.into(), v);
        }
        self
    }

    /// Whether the error reports an infrastructure failure rather than bad input.
    pub fn is_system(&self) -> bool {
        self.code == ErrorCode::SystemError
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.field, self.code, self.message)
    }
}

impl std::error::Error for FieldError {}

/// API response format for validation failures.
///
/// ```json
/// {
///   "type": "validation_error",
///   "message": "Validation failed",
///   "errors": [{"field": "name", "code": "required", "message": "...", "priority": "high"}]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub message: String,
    pub errors: Vec<FieldError>,
}

impl Problem {
    /// Build the problem object for a list of errors.
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            problem_type: "validation_error".to_string(),
            message: "Validation failed".to_string(),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_creation() {
        let error = FieldError::new("email", ErrorCode::Required, "Email is required");
        assert_eq!(error.field, "email");
        assert_eq!(error.code, ErrorCode::Required);
        assert_eq!(error.priority, Priority::Medium);
        assert!(error.details.is_empty());
    }

    #[test]
    fn field_error_with_details() {
        let error = FieldError::new("name", ErrorCode::InvalidLength, "Too long")
            .detail("max", 50)
            .detail("actual", 72);

        assert_eq!(error.details.len(), 2);
        assert_eq!(error.details["max"], serde_json::json!(50));
    }

    #[test]
    fn system_error_shape() {
        let error = FieldError::system("connection refused");
        assert_eq!(error.field, SYSTEM_FIELD);
        assert!(error.is_system());
    }

    #[test]
    fn error_code_wire_names() {
        let json = serde_json::to_string(&ErrorCode::InvalidFormat).unwrap();
        assert_eq!(json, "\"invalid-format\"");

        let parsed: ErrorCode = serde_json::from_str("\"compliance-violation\"").unwrap();
        assert_eq!(parsed, ErrorCode::ComplianceViolation);
    }

    #[test]
    fn unknown_error_code_reads_as_invalid() {
        let parsed: ErrorCode = serde_json::from_str("\"duplicate\"").unwrap();
        assert_eq!(parsed, ErrorCode::Invalid);
    }

    #[test]
    fn field_error_serialization() {
        let error = FieldError::new("sku", ErrorCode::Required, "SKU is required")
            .with_priority(Priority::High);
        let value = serde_json::to_value(&error).unwrap();

        assert_eq!(value["field"], "sku");
        assert_eq!(value["code"], "required");
        assert_eq!(value["priority"], "high");
        assert!(value.get("details").is_none());
    }
}
