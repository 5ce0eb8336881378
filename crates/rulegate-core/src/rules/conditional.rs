use crate::context::Context;
use crate::fault::RuleFault;
use crate::multi::MultiError;
use crate::stage::{Priority, Stage};
use crate::traits::{Condition, IntoRule, SharedRule, ValidationRule};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Runs the wrapped rule only while `condition` holds.
///
/// Stage, priority and name are those of the wrapped rule.
pub struct ConditionalRule {
    inner: SharedRule,
    condition: Condition,
}

impl ConditionalRule {
    pub fn new<F>(rule: impl IntoRule, condition: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            inner: rule.into_rule(),
            condition: Arc::new(condition),
        }
    }
}

impl fmt::Debug for ConditionalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalRule")
            .field("inner", &self.inner.name())
            .finish()
    }
}

#[async_trait]
impl ValidationRule for ConditionalRule {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn stage(&self) -> Stage {
        self.inner.stage()
    }

    fn priority(&self) -> Priority {
        self.inner.priority()
    }

    async fn validate(&self, ctx: &Context, errors: &mut MultiError) -> Result<(), RuleFault> {
        if !(self.condition)() {
            return Ok(());
        }
        self.inner.validate(ctx, errors).await
    }
}
