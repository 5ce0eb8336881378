use crate::context::Context;
use crate::error::{ErrorCode, FieldError};
use crate::fault::RuleFault;
use crate::multi::MultiError;
use crate::stage::{Priority, Stage};
use crate::traits::{IntoRule, SharedRule, ValidationRule};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a [`CompositeRule`] combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    /// Every child must pass; all child errors are reported
    And,
    /// At least one child must pass; otherwise all child errors are reported
    Or,
    /// Exactly one child must pass
    Xor,
}

/// Combines child rules with a logical operator.
///
/// Each child runs into its own scratch accumulator. A child that faults
/// counts as failed and its fault is recorded as a system error in that
/// scratch accumulator.
pub struct CompositeRule {
    name: String,
    stage: Stage,
    priority: Priority,
    operator: LogicalOperator,
    rules: Vec<SharedRule>,
    stop_on_first: bool,
}

impl CompositeRule {
    pub fn new(name: impl Into<String>, operator: LogicalOperator) -> Self {
        Self {
            name: name.into(),
            stage: Stage::default(),
            priority: Priority::default(),
            operator,
            rules: Vec::new(),
            stop_on_first: false,
        }
    }

    pub fn and(name: impl Into<String>) -> Self {
        Self::new(name, LogicalOperator::And)
    }

    pub fn or(name: impl Into<String>) -> Self {
        Self::new(name, LogicalOperator::Or)
    }

    pub fn xor(name: impl Into<String>) -> Self {
        Self::new(name, LogicalOperator::Xor)
    }

    pub fn with_rule(mut self, rule: impl IntoRule) -> Self {
        self.rules.push(rule.into_rule());
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// With `And`, stop at the first failing child.
    pub fn stop_on_first(mut self, stop: bool) -> Self {
        self.stop_on_first = stop;
        self
    }

    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    async fn run_child(
        rule: &SharedRule,
        ctx: &Context,
        priority: Priority,
    ) -> MultiError {
        let mut scratch = MultiError::new();
        scratch.set_priority(priority);
        if let Err(fault) = rule.validate(ctx, &mut scratch).await {
            scratch.add_error(FieldError::system(fault.to_string()).with_priority(priority));
        }
        scratch
    }
}

impl fmt::Debug for CompositeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeRule")
            .field("name", &self.name)
            .field("operator", &self.operator)
            .field("rules", &self.rules.len())
            .finish()
    }
}

#[async_trait]
impl ValidationRule for CompositeRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    async fn validate(&self, ctx: &Context, errors: &mut MultiError) -> Result<(), RuleFault> {
        let priority = errors.current_priority();
        match self.operator {
            LogicalOperator::And => {
                for rule in &self.rules {
                    let scratch = Self::run_child(rule, ctx, priority).await;
                    let failed = scratch.has_errors();
                    errors.merge(&scratch);
                    if failed && self.stop_on_first {
                        break;
                    }
                }
            }
            LogicalOperator::Or => {
                let mut failures = Vec::with_capacity(self.rules.len());
                for rule in &self.rules {
                    let scratch = Self::run_child(rule, ctx, priority).await;
                    if scratch.is_empty() {
                        return Ok(());
                    }
                    failures.push(scratch);
                }
                for scratch in &failures {
                    errors.merge(scratch);
                }
            }
            LogicalOperator::Xor => {
                let mut passed = 0;
                for rule in &self.rules {
                    if Self::run_child(rule, ctx, priority).await.is_empty() {
                        passed += 1;
                    }
                }
                if passed != 1 {
                    errors.add(
                        "",
                        ErrorCode::Invalid,
                        format!(
                            "XOR validation failed: expected exactly 1 rule to pass, but {passed} passed"
                        ),
                    );
                }
            }
        }
        Ok(())
    }
}
