use crate::context::Context;
use crate::fault::RuleFault;
use crate::multi::MultiError;
use crate::predicates::{FieldValue, Predicate};
use crate::stage::{Priority, Stage};
use crate::traits::ValidationRule;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

type Getter = Arc<dyn Fn() -> FieldValue + Send + Sync>;

/// Runs a list of predicates against one field.
///
/// ```rust
/// use rulegate_core::predicates;
/// use rulegate_core::rules::FieldRule;
///
/// let rule = FieldRule::for_value("email", "not-an-email")
///     .check(predicates::required)
///     .check(predicates::email)
///     .check(predicates::max_length(100));
/// ```
pub struct FieldRule {
    field: String,
    stage: Stage,
    priority: Priority,
    getter: Getter,
    predicates: Vec<Predicate>,
    stop_on_first: bool,
}

impl FieldRule {
    /// Rule reading the value through `getter` each time it runs.
    pub fn new<F>(field: impl Into<String>, getter: F) -> Self
    where
        F: Fn() -> FieldValue + Send + Sync + 'static,
    {
        Self {
            field: field.into(),
            stage: Stage::default(),
            priority: Priority::default(),
            getter: Arc::new(getter),
            predicates: Vec::new(),
            stop_on_first: false,
        }
    }

    /// Rule over a fixed value.
    pub fn for_value(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        Self::new(field, move || value.clone())
    }

    /// Append a predicate; predicates run in the order they were added.
    pub fn check<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&str, &FieldValue) -> Option<crate::error::FieldError> + Send + Sync + 'static,
    {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Stop after the first failing predicate.
    pub fn stop_on_first(mut self, stop: bool) -> Self {
        self.stop_on_first = stop;
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

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("field", &self.field)
            .field("stage", &self.stage)
            .field("priority", &self.priority)
            .field("predicates", &self.predicates.len())
            .field("stop_on_first", &self.stop_on_first)
            .finish()
    }
}

#[async_trait]
impl ValidationRule for FieldRule {
    fn name(&self) -> &str {
        &self.field
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    async fn validate(&self, _ctx: &Context, errors: &mut MultiError) -> Result<(), RuleFault> {
        let value = (self.getter)();
        for predicate in &self.predicates {
            if let Some(error) = predicate(&self.field, &value) {
                let priority = errors.current_priority();
                errors.add_error(error.with_priority(priority));
                if self.stop_on_first {
                    break;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::predicates;

    #[tokio::test]
    async fn collects_every_failure() {
        let rule = FieldRule::for_value("code", "a b")
            .check(predicates::min_length(5))
            .check(predicates::no_whitespace);

        let mut errors = MultiError::new();
        rule.validate(&Context::background(), &mut errors).await.unwrap();

        let codes: Vec<_> = errors.errors().into_iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![ErrorCode::InvalidLength, ErrorCode::InvalidFormat]);
    }

    #[tokio::test]
    async fn stop_on_first_failure() {
        let rule = FieldRule::for_value("email", "")
            .check(predicates::required)
            .check(predicates::min_length(3))
            .stop_on_first(true);

        let mut errors = MultiError::new();
        rule.validate(&Context::background(), &mut errors).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors()[0].message, "email is required");
    }

    #[tokio::test]
    async fn stamps_view_priority_and_prefix() {
        let rule = FieldRule::for_value("zip", "1234").check(predicates::zip_code);

        let root = MultiError::new();
        let mut view = root.with_prefix("address");
        view.set_priority(Priority::Low);
        rule.validate(&Context::background(), &mut view).await.unwrap();

        let recorded = root.errors();
        assert_eq!(recorded[0].field, "address.zip");
        assert_eq!(recorded[0].priority, Priority::Low);
    }

    #[tokio::test]
    async fn getter_is_read_at_validation_time() {
        use std::sync::atomic::{AtomicI64, Ordering};

        let quantity = Arc::new(AtomicI64::new(5));
        let source = Arc::clone(&quantity);
        let rule = FieldRule::new("quantity", move || source.load(Ordering::SeqCst).into())
            .check(predicates::positive);

        let mut errors = MultiError::new();
        rule.validate(&Context::background(), &mut errors).await.unwrap();
        assert!(errors.is_empty());

        quantity.store(0, Ordering::SeqCst);
        rule.validate(&Context::background(), &mut errors).await.unwrap();
        assert_eq!(errors.fields(), vec!["quantity"]);
    }
}
