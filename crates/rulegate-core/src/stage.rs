//! Execution stages and priorities.
//!
//! Both enums are totally ordered: the engine runs `Basic` before
//! `DataIntegrity` before `BusinessRules` before `Compliance`, and within a
//! stage `High` before `Medium` before `Low`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad execution phase of a rule.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Basic,
    DataIntegrity,
    BusinessRules,
    Compliance,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [
        Stage::Basic,
        Stage::DataIntegrity,
        Stage::BusinessRules,
        Stage::Compliance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Basic => "basic",
            Stage::DataIntegrity => "data_integrity",
            Stage::BusinessRules => "business_rules",
            Stage::Compliance => "compliance",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fine-grained execution order within a stage, and display weight of errors.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// All priorities in execution order.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
