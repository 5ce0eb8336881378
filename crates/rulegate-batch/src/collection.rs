//! Batch validation wrapped in load hooks.

use crate::report::BatchReport;
use crate::validator::BatchValidator;
use futures_util::future::BoxFuture;
use rulegate_core::{
    trace_warn, Context, ErrorCode, FieldError, MultiError, RuleFault, ALL_FIELDS,
};
use std::sync::Arc;

/// Runs before the batch, typically to preload lookups the items refer to.
pub type PreLoadFn<T> =
    Arc<dyn for<'a> Fn(&'a Context, &'a [T]) -> BoxFuture<'a, Result<(), RuleFault>> + Send + Sync>;

/// Runs after the batch with the collected errors, typically for checks that
/// span items (duplicates across the collection, totals).
pub type PostLoadFn<T> = Arc<
    dyn for<'a> Fn(&'a Context, &'a [T], &'a mut MultiError) -> BoxFuture<'a, Result<(), RuleFault>>
        + Send
        + Sync,
>;

/// A [`BatchValidator`] with optional pre-load and post-load hooks.
///
/// A pre-load fault aborts the run: no item is validated and the fault is
/// reported as a `system-error` on `__all__`. The post-load hook runs whatever
/// the items produced; its fault is recorded the same way.
pub struct CollectionValidator<T> {
    batch: BatchValidator<T>,
    pre_load: Option<PreLoadFn<T>>,
    post_load: Option<PostLoadFn<T>>,
}

impl<T: Send + Sync + 'static> CollectionValidator<T> {
    pub fn new(batch: impl Into<BatchValidator<T>>) -> Self {
        Self {
            batch: batch.into(),
            pre_load: None,
            post_load: None,
        }
    }

    pub fn with_pre_load<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a Context, &'a [T]) -> BoxFuture<'a, Result<(), RuleFault>>
            + Send
            + Sync
            + 'static,
    {
        self.pre_load = Some(Arc::new(hook));
        self
    }

    pub fn with_post_load<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a Context, &'a [T], &'a mut MultiError) -> BoxFuture<'a, Result<(), RuleFault>>
            + Send
            + Sync
            + 'static,
    {
        self.post_load = Some(Arc::new(hook));
        self
    }

    pub async fn run(&self, ctx: &Context, items: impl Into<Arc<[T]>>) -> BatchReport {
        let items: Arc<[T]> = items.into();

        if let Some(pre_load) = &self.pre_load {
            if let Err(fault) = pre_load(ctx, &items[..]).await {
                trace_warn!(error = %fault, "collection pre-load failed");
                let mut errors = MultiError::new();
                errors.add_error(hook_failure("pre-load", &fault));
                return BatchReport {
                    errors: Some(errors),
                    total: items.len(),
                    processed: 0,
                    failed: 0,
                    skipped: items.len(),
                };
            }
        }

        let mut report = self.batch.run(ctx, Arc::clone(&items)).await;

        if let Some(post_load) = &self.post_load {
            let mut errors = report.errors.take().unwrap_or_default();
            if let Err(fault) = post_load(ctx, &items[..], &mut errors).await {
                trace_warn!(error = %fault, "collection post-load failed");
                errors.add_error(hook_failure("post-load", &fault));
            }
            report.errors = errors.into_option();
        }

        report
    }

    pub async fn validate(&self, ctx: &Context, items: impl Into<Arc<[T]>>) -> Option<MultiError> {
        self.run(ctx, items).await.errors
    }
}

fn hook_failure(hook: &str, fault: &RuleFault) -> FieldError {
    FieldError::new(
        ALL_FIELDS,
        ErrorCode::SystemError,
        format!("Collection {hook} failed: {fault}"),
    )
}

impl<T> std::fmt::Debug for CollectionValidator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionValidator")
            .field("batch", &self.batch)
            .field("pre_load", &self.pre_load.is_some())
            .field("post_load", &self.post_load.is_some())
            .finish()
    }
}
