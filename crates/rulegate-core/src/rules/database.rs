use crate::context::Context;
use crate::fault::RuleFault;
use crate::multi::MultiError;
use crate::stage::{Priority, Stage};
use crate::traits::ValidationRule;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default time a database rule may take.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

type QueryFn =
    Arc<dyn for<'a> Fn(&'a Context) -> BoxFuture<'a, Result<(), RuleFault>> + Send + Sync>;

/// Runs a store query under a timeout.
///
/// The query never sees the accumulator: every failure it reports, and the
/// timeout itself, surfaces as a fault and so as a system error. Field-level
/// outcomes of lookups belong to separately registered rules.
pub struct DatabaseRule {
    name: String,
    stage: Stage,
    priority: Priority,
    timeout: Duration,
    query: QueryFn,
}

impl DatabaseRule {
    pub fn new<F>(name: impl Into<String>, query: F) -> Self
    where
        F: for<'a> Fn(&'a Context) -> BoxFuture<'a, Result<(), RuleFault>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            stage: Stage::DataIntegrity,
            priority: Priority::default(),
            timeout: DEFAULT_QUERY_TIMEOUT,
            query: Arc::new(query),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
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
}

impl fmt::Debug for DatabaseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseRule")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl ValidationRule for DatabaseRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    async fn validate(&self, ctx: &Context, _errors: &mut MultiError) -> Result<(), RuleFault> {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(RuleFault::Cancelled),
            outcome = tokio::time::timeout(self.timeout, (self.query)(ctx)) => match outcome {
                Ok(result) => result,
                Err(_) => Err(RuleFault::Timeout {
                    rule: self.name.clone(),
                    timeout: self.timeout,
                }),
            },
        }
    }
}
