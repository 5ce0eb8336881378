//! Infrastructure failures raised by rules, kept apart from field errors.

use std::time::Duration;
use thiserror::Error;

/// Infrastructure failure raised by a rule.
///
/// A fault is not a validation failure: the engine records it as a single
/// `system-error` on the `system` field and carries on with the remaining rules.
#[derive(Debug, Error)]
pub enum RuleFault {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Rule '{rule}' timed out after {timeout:?}")]
    Timeout { rule: String, timeout: Duration },

    #[error("Validation cancelled")]
    Cancelled,

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl RuleFault {
    /// Create a fault from any error type.
    pub fn other(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        RuleFault::Other(Box::new(error))
    }

    pub fn message(message: impl Into<String>) -> Self {
        RuleFault::Message(message.into())
    }
}

pub type Result<T, E = RuleFault> = std::result::Result<T, E>;
