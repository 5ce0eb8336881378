//! Closure-backed rules: the generic concrete rule and its business and
//! compliance specializations.

use crate::context::Context;
use crate::error::{ErrorCode, FieldError};
use crate::fault::RuleFault;
use crate::multi::MultiError;
use crate::stage::{Priority, Stage};
use crate::traits::{CheckFn, Condition, ValidateFn, ValidationRule};
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Default)]
enum Check {
    #[default]
    None,
    Sync(CheckFn),
    Async(ValidateFn),
}

/// A rule assembled from closures.
///
/// Defaults to stage `Basic`, priority `Medium`, an always-true condition and
/// no validation body (the rule passes).
///
/// ## Example
///
/// ```rust
/// use rulegate_core::prelude::*;
///
/// let name = String::new();
/// let rule = ConcreteRule::new("name_required")
///     .with_priority(Priority::High)
///     .with_check(move |errors| {
///         if name.is_empty() {
///             errors.add("name", ErrorCode::Required, "Name is required");
///         }
///         Ok(())
///     });
/// assert_eq!(rule.stage(), Stage::Basic);
/// ```
#[derive(Clone)]
pub struct ConcreteRule {
    name: String,
    stage: Stage,
    priority: Priority,
    condition: Option<Condition>,
    check: Check,
}

impl ConcreteRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage: Stage::default(),
            priority: Priority::default(),
            condition: None,
            check: Check::None,
        }
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Skip the rule whenever `condition` returns false.
    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Use a synchronous validation body.
    pub fn with_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&mut MultiError) -> Result<(), RuleFault> + Send + Sync + 'static,
    {
        self.check = Check::Sync(Arc::new(check));
        self
    }

    /// Use an asynchronous validation body.
    pub fn with_validation<F>(mut self, validation: F) -> Self
    where
        F: for<'a> Fn(&'a Context, &'a mut MultiError) -> BoxFuture<'a, Result<(), RuleFault>>
            + Send
            + Sync
            + 'static,
    {
        self.check = Check::Async(Arc::new(validation));
        self
    }

    fn should_run(&self) -> bool {
        self.condition.as_ref().map_or(true, |condition| condition())
    }
}

impl fmt::Debug for ConcreteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcreteRule")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("priority", &self.priority)
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}

#[async_trait]
impl ValidationRule for ConcreteRule {
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
        if !self.should_run() {
            return Ok(());
        }
        match &self.check {
            Check::None => Ok(()),
            Check::Sync(check) => check(errors),
            Check::Async(validation) => validation(ctx, errors).await,
        }
    }
}

/// Generates the builder methods shared by rules wrapping a [`ConcreteRule`].
macro_rules! delegate_builders {
    ($ty:ty) => {
        impl $ty {
            pub fn with_priority(mut self, priority: Priority) -> Self {
                self.inner = self.inner.with_priority(priority);
                self
            }

            pub fn with_condition<F>(mut self, condition: F) -> Self
            where
                F: Fn() -> bool + Send + Sync + 'static,
            {
                self.inner = self.inner.with_condition(condition);
                self
            }

            pub fn with_check<F>(mut self, check: F) -> Self
            where
                F: Fn(&mut MultiError) -> Result<(), RuleFault> + Send + Sync + 'static,
            {
                self.inner = self.inner.with_check(check);
                self
            }

            pub fn with_validation<F>(mut self, validation: F) -> Self
            where
                F: for<'a> Fn(&'a Context, &'a mut MultiError) -> BoxFuture<'a, Result<(), RuleFault>>
                    + Send
                    + Sync
                    + 'static,
            {
                self.inner = self.inner.with_validation(validation);
                self
            }
        }
    };
}

/// A rule in the `BusinessRules` stage, optionally naming the rules it relies on.
#[derive(Debug, Clone)]
pub struct BusinessRule {
    inner: ConcreteRule,
    dependencies: Vec<String>,
}

impl BusinessRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: ConcreteRule::new(name).with_stage(Stage::BusinessRules),
            dependencies: Vec::new(),
        }
    }

    /// Move the rule to another stage.
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.inner = self.inner.with_stage(stage);
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

delegate_builders!(BusinessRule);

#[async_trait]
impl ValidationRule for BusinessRule {
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
        self.inner.validate(ctx, errors).await
    }
}

/// A `Compliance`-stage rule tied to a regulation.
///
/// Every error the rule emits carries `regulation` and `section` details.
#[derive(Debug, Clone)]
pub struct ComplianceRule {
    inner: ConcreteRule,
    regulation: String,
    section: String,
}

impl ComplianceRule {
    pub fn new(name: impl Into<String>, regulation: impl Into<String>) -> Self {
        Self {
            inner: ConcreteRule::new(name)
                .with_stage(Stage::Compliance)
                .with_priority(Priority::High),
            regulation: regulation.into(),
            section: String::new(),
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    pub fn regulation(&self) -> &str {
        &self.regulation
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    /// A `compliance-violation` error carrying this rule's regulation details.
    pub fn violation(&self, field: &str, message: impl Into<String>) -> FieldError {
        self.annotate(
            FieldError::new(field, ErrorCode::ComplianceViolation, message)
                .with_priority(self.inner.priority()),
        )
    }

    fn annotate(&self, mut error: FieldError) -> FieldError {
        error
            .details
            .entry("regulation".to_string())
            .or_insert_with(|| self.regulation.clone().into());
        if !self.section.is_empty() {
            error
                .details
                .entry("section".to_string())
                .or_insert_with(|| self.section.clone().into());
        }
        error
    }
}

delegate_builders!(ComplianceRule);

#[async_trait]
impl ValidationRule for ComplianceRule {
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
        let mut scratch = MultiError::new();
        scratch.set_priority(errors.current_priority());
        let outcome = self.inner.validate(ctx, &mut scratch).await;
        for error in scratch.errors() {
            errors.add_error(self.annotate(error));
        }
        outcome
    }
}
