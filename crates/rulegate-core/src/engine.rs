//! The staged validation engine.
//!
//! Rules are bucketed by `(stage, priority)`. Buckets run strictly one after
//! another in stage order, then priority order. Inside a bucket the rules may
//! run concurrently, bounded by [`EngineConfig::max_parallel`].
//!
//! Every rule writes into its own private accumulator whose priority is set to
//! the bucket's priority before the rule starts; the engine merges that
//! accumulator into the target when the rule returns. A rule fault is recorded
//! as a `system-error` on the `system` field and the run continues.

use crate::config::EngineConfig;
use crate::context::Context;
use crate::error::FieldError;
use crate::multi::MultiError;
use crate::stage::{Priority, Stage};
use crate::traits::{IntoRule, SharedRule, ValidationRule};
use crate::{trace_debug, trace_trace, trace_warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[cfg(feature = "metrics")]
use crate::metrics::ValidationMetrics;

/// Holds rules and runs them in stage and priority order.
///
/// ## Example
///
/// ```rust
/// use rulegate_core::prelude::*;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut engine = ValidationEngine::default();
/// engine.add_rule(
///     ConcreteRule::new("name_required")
///         .with_priority(Priority::High)
///         .with_check(|errors| {
///             errors.add("name", ErrorCode::Required, "name is required");
///             Ok(())
///         }),
/// );
///
/// let errors = engine.validate(&Context::background()).await.unwrap();
/// assert_eq!(errors.fields(), vec!["name"]);
/// # }
/// ```
pub struct ValidationEngine {
    config: EngineConfig,
    rules: Vec<SharedRule>,
    buckets: HashMap<(Stage, Priority), Vec<SharedRule>>,
    field: Option<String>,
    index: Option<usize>,
    parent: Option<MultiError>,
    #[cfg(feature = "metrics")]
    metrics: Option<Arc<ValidationMetrics>>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ValidationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            rules: Vec::new(),
            buckets: HashMap::new(),
            field: None,
            index: None,
            parent: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Prefix every error produced by this engine with `name`.
    pub fn for_field(mut self, name: impl Into<String>) -> Self {
        self.field = Some(name.into());
        self
    }

    /// Prefix every error with `[index]`, after the field name if any.
    pub fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Route errors into `parent` instead of a fresh accumulator.
    ///
    /// [`validate`](Self::validate) then always returns `None`; inspect the
    /// parent instead.
    pub fn with_parent(mut self, parent: MultiError) -> Self {
        self.parent = Some(parent);
        self
    }

    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: Arc<ValidationMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a rule.
    pub fn add_rule(&mut self, rule: impl IntoRule) -> &mut Self {
        let rule = rule.into_rule();
        self.buckets
            .entry((rule.stage(), rule.priority()))
            .or_default()
            .push(Arc::clone(&rule));
        self.rules.push(rule);
        self
    }

    /// Register several rules, keeping their order.
    pub fn add_rules<I>(&mut self, rules: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: IntoRule,
    {
        for rule in rules {
            self.add_rule(rule);
        }
        self
    }

    /// Builder form of [`add_rule`](Self::add_rule).
    pub fn with_rule(mut self, rule: impl IntoRule) -> Self {
        self.add_rule(rule);
        self
    }

    /// Remove every registered rule.
    pub fn clear(&mut self) {
        self.rules.clear();
        self.buckets.clear();
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// All registered rules in registration order.
    pub fn rules(&self) -> &[SharedRule] {
        &self.rules
    }

    /// Rules of one bucket in registration order.
    pub fn rules_by_stage_and_priority(&self, stage: Stage, priority: Priority) -> &[SharedRule] {
        self.buckets
            .get(&(stage, priority))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Run every rule.
    ///
    /// Returns `None` when no error was recorded, or when a parent accumulator
    /// was configured with [`with_parent`](Self::with_parent).
    pub async fn validate(&self, ctx: &Context) -> Option<MultiError> {
        if let Some(parent) = &self.parent {
            self.validate_into(ctx, parent).await;
            return None;
        }
        let errors = MultiError::new();
        self.validate_into(ctx, &errors).await;
        errors.into_option()
    }

    /// Run every rule, merging errors into `acc` under this engine's prefix.
    pub async fn validate_into(&self, ctx: &Context, acc: &MultiError) {
        let started = Instant::now();
        let mut target = self.scope(acc);
        let baseline = acc.len();

        if self.config.enable_tracing {
            trace_debug!(
                rules = self.rules.len(),
                prefix = target.prefix(),
                fail_fast = self.config.fail_fast,
                max_parallel = self.config.max_parallel,
                "validation started"
            );
        }

        'stages: for stage in Stage::ALL {
            for priority in Priority::ALL {
                if ctx.is_cancelled() {
                    if self.config.enable_tracing {
                        trace_warn!(%stage, %priority, "validation cancelled");
                    }
                    break 'stages;
                }
                if self.config.fail_fast && acc.len() > baseline {
                    break 'stages;
                }

                let bucket = self.rules_by_stage_and_priority(stage, priority);
                if bucket.is_empty() {
                    continue;
                }

                target.set_priority(priority);
                let before = acc.len();
                if self.config.max_parallel > 1 && bucket.len() > 1 {
                    self.run_parallel(ctx, bucket, &mut target, priority).await;
                } else {
                    self.run_serial(ctx, bucket, &mut target, priority, baseline, acc)
                        .await;
                }

                if self.config.enable_tracing {
                    trace_trace!(
                        %stage,
                        %priority,
                        rules = bucket.len(),
                        errors = acc.len() - before,
                        "bucket finished"
                    );
                }
            }
        }

        #[cfg(feature = "metrics")]
        if self.config.enable_metrics {
            if let Some(metrics) = &self.metrics {
                metrics.record_errors(&acc.errors()[baseline.min(acc.len())..]);
                metrics.record_duration(started.elapsed());
            }
        }

        if self.config.enable_tracing {
            trace_debug!(
                errors = acc.len() - baseline,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "validation finished"
            );
        }
    }

    fn scope(&self, acc: &MultiError) -> MultiError {
        match (&self.field, self.index) {
            (Some(field), Some(index)) => acc.with_index(field, index),
            (Some(field), None) => acc.with_prefix(field),
            (None, Some(index)) => acc.with_index("", index),
            (None, None) => acc.clone(),
        }
    }

    async fn run_serial(
        &self,
        ctx: &Context,
        bucket: &[SharedRule],
        target: &mut MultiError,
        priority: Priority,
        baseline: usize,
        acc: &MultiError,
    ) {
        for rule in bucket {
            if self.config.fail_fast && acc.len() > baseline {
                break;
            }
            if ctx.is_cancelled() {
                break;
            }
            let local = self.run_rule(rule.as_ref(), ctx, priority).await;
            target.merge(&local);
        }
    }

    async fn run_parallel(
        &self,
        ctx: &Context,
        bucket: &[SharedRule],
        target: &mut MultiError,
        priority: Priority,
    ) {
        let semaphore = Arc::new(Semaphore::new(
            self.config.max_parallel.clamp(1, Semaphore::MAX_PERMITS),
        ));
        let mut join_set = JoinSet::new();

        for rule in bucket {
            let rule = Arc::clone(rule);
            let ctx = ctx.clone();
            let sem = Arc::clone(&semaphore);
            let task = RuleTask {
                tracing: self.config.enable_tracing,
                #[cfg(feature = "metrics")]
                metrics: self.active_metrics(),
            };
            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                task.run(rule.as_ref(), &ctx, priority).await
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(local) => target.merge(&local),
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => {
                    trace_warn!(error = %err, "rule task aborted");
                }
            }
        }
    }

    async fn run_rule(&self, rule: &dyn ValidationRule, ctx: &Context, priority: Priority) -> MultiError {
        RuleTask {
            tracing: self.config.enable_tracing,
            #[cfg(feature = "metrics")]
            metrics: self.active_metrics(),
        }
        .run(rule, ctx, priority)
        .await
    }

    #[cfg(feature = "metrics")]
    fn active_metrics(&self) -> Option<Arc<ValidationMetrics>> {
        if self.config.enable_metrics {
            self.metrics.clone()
        } else {
            None
        }
    }
}

/// Per-rule execution settings, owned so that spawned tasks can carry them.
struct RuleTask {
    tracing: bool,
    #[cfg(feature = "metrics")]
    metrics: Option<Arc<ValidationMetrics>>,
}

impl RuleTask {
    async fn run(&self, rule: &dyn ValidationRule, ctx: &Context, priority: Priority) -> MultiError {
        let mut local = MultiError::new();
        local.set_priority(priority);

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_rule(rule.stage(), priority);
        }

        if let Err(fault) = rule.validate(ctx, &mut local).await {
            if self.tracing {
                trace_warn!(rule = rule.name(), error = %fault, "rule failed");
            }
            #[cfg(feature = "metrics")]
            if let Some(metrics) = &self.metrics {
                metrics.record_fault();
            }
            local.add_error(FieldError::system(fault.to_string()).with_priority(priority));
        }
        local
    }
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("config", &self.config)
            .field("rules", &self.rules.len())
            .field("field", &self.field)
            .field("index", &self.index)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
