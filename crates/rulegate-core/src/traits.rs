//! The rule contract.

use crate::context::Context;
use crate::fault::RuleFault;
use crate::multi::MultiError;
use crate::stage::{Priority, Stage};
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::sync::Arc;

/// A unit of validation logic with a declared stage and priority.
///
/// Rules write validation failures into the accumulator they are handed and
/// return `Err` only for infrastructure failures (database down, remote check
/// unreachable). The engine turns such a fault into a `system-error` and keeps
/// going.
///
/// ## Example
///
/// ```rust,ignore
/// use rulegate_core::prelude::*;
///
/// struct NonEmptyName(String);
///
/// #[async_trait]
/// impl ValidationRule for NonEmptyName {
///     fn stage(&self) -> Stage {
///         Stage::Basic
///     }
///
///     fn priority(&self) -> Priority {
///         Priority::High
///     }
///
///     async fn validate(&self, _ctx: &Context, errors: &mut MultiError) -> Result<(), RuleFault> {
///         if self.0.is_empty() {
///             errors.add("name", ErrorCode::Required, "Name is required");
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ValidationRule: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &str {
        "rule"
    }

    /// Stage the rule runs in.
    fn stage(&self) -> Stage;

    /// Priority of the rule within its stage.
    fn priority(&self) -> Priority;

    /// Run the rule, recording failures into `errors`.
    async fn validate(&self, ctx: &Context, errors: &mut MultiError) -> Result<(), RuleFault>;
}

/// A rule shared between an engine and the tasks it spawns.
pub type SharedRule = Arc<dyn ValidationRule>;

/// Asynchronous validation body of a closure-based rule.
pub type ValidateFn = Arc<
    dyn for<'a> Fn(&'a Context, &'a mut MultiError) -> BoxFuture<'a, Result<(), RuleFault>>
        + Send
        + Sync,
>;

/// Synchronous validation body of a closure-based rule.
pub type CheckFn = Arc<dyn Fn(&mut MultiError) -> Result<(), RuleFault> + Send + Sync>;

/// Predicate deciding whether a rule runs.
pub type Condition = Arc<dyn Fn() -> bool + Send + Sync>;

#[async_trait]
impl<R: ValidationRule + ?Sized> ValidationRule for Arc<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn stage(&self) -> Stage {
        (**self).stage()
    }

    fn priority(&self) -> Priority {
        (**self).priority()
    }

    async fn validate(&self, ctx: &Context, errors: &mut MultiError) -> Result<(), RuleFault> {
        (**self).validate(ctx, errors).await
    }
}

/// Conversion into a [`SharedRule`].
pub trait IntoRule {
    fn into_rule(self) -> SharedRule;
}

impl<R: ValidationRule + 'static> IntoRule for R {
    fn into_rule(self) -> SharedRule {
        Arc::new(self)
    }
}
