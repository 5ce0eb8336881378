//! Rule doubles.

use crate::expectation::Times;
use async_trait::async_trait;
use rulegate_core::{Context, FieldError, MultiError, Priority, RuleFault, Stage, ValidationRule};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A rule that always records the same errors.
#[derive(Debug, Clone)]
pub struct StaticRule {
    name: String,
    stage: Stage,
    priority: Priority,
    errors: Vec<FieldError>,
}

impl StaticRule {
    /// A passing rule in `stage` at `priority`.
    pub fn new(stage: Stage, priority: Priority) -> Self {
        Self {
            name: format!("static:{stage}:{priority}"),
            stage,
            priority,
            errors: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Record `error` on every run. The error keeps the priority it carries.
    pub fn with_error(mut self, error: FieldError) -> Self {
        self.errors.push(error);
        self
    }

    /// Record an `invalid` error on `field`, stamped with the bucket priority.
    pub fn failing(self, field: &str, message: impl Into<String>) -> Self {
        let priority = self.priority;
        self.with_error(
            FieldError::new(field, rulegate_core::ErrorCode::Invalid, message)
                .with_priority(priority),
        )
    }
}

#[async_trait]
impl ValidationRule for StaticRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    async fn validate(&self, _ctx: &Context, errors: &mut MultiError) -> Result<(), RuleFault> {
        for error in &self.errors {
            errors.add_error(error.clone());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SpyState {
    calls: AtomicUsize,
    prefixes: Mutex<Vec<String>>,
}

/// A rule that records its invocations and can be told how to behave.
///
/// Clones share the same call record, so a clone can be registered with an
/// engine while the original is kept for assertions.
///
/// ```rust,ignore
/// let spy = SpyRule::new(Stage::Basic, Priority::High).expect(Times::Once);
/// engine.add_rule(spy.clone());
/// engine.validate(&ctx).await;
/// spy.verify();
/// ```
#[derive(Debug, Clone)]
pub struct SpyRule {
    name: String,
    stage: Stage,
    priority: Priority,
    delay: Option<Duration>,
    emit: Vec<(String, String)>,
    fault: Option<String>,
    times: Times,
    state: Arc<SpyState>,
}

impl SpyRule {
    pub fn new(stage: Stage, priority: Priority) -> Self {
        Self {
            name: "spy".to_string(),
            stage,
            priority,
            delay: None,
            emit: Vec::new(),
            fault: None,
            times: Times::Any,
            state: Arc::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sleep for `delay` before recording anything.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add an `invalid` error on `field` on every run.
    pub fn emitting(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.emit.push((field.into(), message.into()));
        self
    }

    /// Return a fault with `message` after recording any errors.
    pub fn faulting(mut self, message: impl Into<String>) -> Self {
        self.fault = Some(message.into());
        self
    }

    pub fn expect(mut self, times: Times) -> Self {
        self.times = times;
        self
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Accumulator prefixes seen by each call, in call order.
    pub fn prefixes(&self) -> Vec<String> {
        self.state
            .prefixes
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Panic unless the call count satisfies the expectation.
    pub fn verify(&self) {
        self.times.verify(&format!("rule {:?}", self.name), self.calls());
    }
}

#[async_trait]
impl ValidationRule for SpyRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    async fn validate(&self, _ctx: &Context, errors: &mut MultiError) -> Result<(), RuleFault> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prefixes) = self.state.prefixes.lock() {
            prefixes.push(errors.prefix().to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        for (field, message) in &self.emit {
            errors.add(field, rulegate_core::ErrorCode::Invalid, message.clone());
        }

        match &self.fault {
            Some(message) => Err(RuleFault::Message(message.clone())),
            None => Ok(()),
        }
    }
}
