//! Chunked, bounded-concurrency validation of item collections.

use crate::config::BatchConfig;
use crate::report::{BatchProgress, BatchReport};
use futures_util::future::BoxFuture;
use rulegate_core::{trace_debug, trace_warn, Context, MultiError, ValidationEngine};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Validation of a single item, given its position in the batch.
pub type ItemFn<T> = Arc<
    dyn for<'a> Fn(&'a Context, &'a T, usize) -> BoxFuture<'a, Option<MultiError>> + Send + Sync,
>;

/// Callback invoked after each item when progress is enabled.
pub type ProgressFn = Arc<dyn Fn(BatchProgress) + Send + Sync>;

/// Validates a collection by running a per-item validator over chunks.
///
/// Items are split into contiguous chunks of `chunk_size`. Up to
/// `max_parallel` chunks run at once; the items of one chunk run in order.
/// Errors of every item land in one accumulator. Their relative order across
/// chunks is not defined.
///
/// ## Example
///
/// ```rust,ignore
/// let batch = BatchValidator::new(BatchConfig::default(), |ctx, order: &Order, _index| {
///     Box::pin(async move { order_engine(order).validate(ctx).await })
/// });
///
/// let report = batch.run(&Context::background(), orders).await;
/// println!("{} of {} orders failed", report.failed, report.total);
/// ```
pub struct BatchValidator<T> {
    validate_item: ItemFn<T>,
    config: BatchConfig,
    progress: Vec<ProgressFn>,
    scope: Option<String>,
}

impl<T: Send + Sync + 'static> BatchValidator<T> {
    pub fn new<F>(config: BatchConfig, validate_item: F) -> Self
    where
        F: for<'a> Fn(&'a Context, &'a T, usize) -> BoxFuture<'a, Option<MultiError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            validate_item: Arc::new(validate_item),
            config,
            progress: Vec::new(),
            scope: None,
        }
    }

    /// Validate each item with the engine `build` composes for it.
    pub fn from_engine<F>(config: BatchConfig, build: F) -> Self
    where
        F: Fn(&T, usize) -> ValidationEngine + Send + Sync + 'static,
    {
        Self::new(config, move |ctx, item, index| {
            let engine = build(item, index);
            Box::pin(async move { engine.validate(ctx).await })
        })
    }

    /// Register a progress callback. Callbacks only fire when
    /// `enable_progress` is set.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(BatchProgress) + Send + Sync + 'static,
    {
        self.progress.push(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Validate `items` and report counters along with the errors.
    pub async fn run(&self, ctx: &Context, items: impl Into<Arc<[T]>>) -> BatchReport {
        let items: Arc<[T]> = items.into();
        let total = items.len();
        if total == 0 {
            return BatchReport::default();
        }

        let chunk_size = self.config.chunk_size.max(1);
        let errors = MultiError::new();
        let state = Arc::new(RunState::default());
        let semaphore = Arc::new(Semaphore::new(
            self.config.max_parallel.clamp(1, Semaphore::MAX_PERMITS),
        ));
        let mut join_set = JoinSet::new();

        trace_debug!(
            total,
            chunk_size,
            max_parallel = self.config.max_parallel,
            "batch validation started"
        );

        for start in (0..total).step_by(chunk_size) {
            let worker = ChunkWorker {
                items: Arc::clone(&items),
                validate_item: Arc::clone(&self.validate_item),
                progress: self.progress.clone(),
                config: self.config.clone(),
                scope: self.scope.clone(),
                state: Arc::clone(&state),
                errors: errors.clone(),
                ctx: ctx.clone(),
                total,
            };
            let sem = Arc::clone(&semaphore);
            let range = start..(start + chunk_size).min(total);
            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                worker.run(range).await;
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(()) => {}
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => {
                    trace_warn!(error = %err, "batch chunk aborted");
                }
            }
        }

        let processed = state.processed.load(Ordering::SeqCst);
        let failed = state.failed.load(Ordering::SeqCst);
        trace_debug!(total, processed, failed, "batch validation finished");

        BatchReport {
            errors: errors.into_option(),
            total,
            processed,
            failed,
            skipped: total - processed,
        }
    }

    /// Validate `items`, returning only the collected errors.
    pub async fn validate(&self, ctx: &Context, items: impl Into<Arc<[T]>>) -> Option<MultiError> {
        self.run(ctx, items).await.errors
    }
}

impl<T> std::fmt::Debug for BatchValidator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchValidator")
            .field("config", &self.config)
            .field("progress_callbacks", &self.progress.len())
            .field("scope", &self.scope)
            .finish()
    }
}

/// A [`BatchValidator`] that files each item's errors under `field[index]`.
///
/// With field `items`, an error on `sku` for the fourth item is reported as
/// `items[3].sku`.
pub struct IndexedBatchValidator<T> {
    inner: BatchValidator<T>,
}

impl<T: Send + Sync + 'static> IndexedBatchValidator<T> {
    pub fn new<F>(field: impl Into<String>, config: BatchConfig, validate_item: F) -> Self
    where
        F: for<'a> Fn(&'a Context, &'a T, usize) -> BoxFuture<'a, Option<MultiError>>
            + Send
            + Sync
            + 'static,
    {
        let mut inner = BatchValidator::new(config, validate_item);
        inner.scope = Some(field.into());
        Self { inner }
    }

    /// Validate each item with the engine `build` composes for it.
    pub fn from_engine<F>(field: impl Into<String>, config: BatchConfig, build: F) -> Self
    where
        F: Fn(&T, usize) -> ValidationEngine + Send + Sync + 'static,
    {
        let mut inner = BatchValidator::from_engine(config, build);
        inner.scope = Some(field.into());
        Self { inner }
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(BatchProgress) + Send + Sync + 'static,
    {
        self.inner = self.inner.on_progress(callback);
        self
    }

    pub fn field(&self) -> &str {
        self.inner.scope.as_deref().unwrap_or_default()
    }

    pub async fn run(&self, ctx: &Context, items: impl Into<Arc<[T]>>) -> BatchReport {
        self.inner.run(ctx, items).await
    }

    pub async fn validate(&self, ctx: &Context, items: impl Into<Arc<[T]>>) -> Option<MultiError> {
        self.inner.validate(ctx, items).await
    }
}

impl<T> From<IndexedBatchValidator<T>> for BatchValidator<T> {
    fn from(indexed: IndexedBatchValidator<T>) -> Self {
        indexed.inner
    }
}

impl<T> std::fmt::Debug for IndexedBatchValidator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("IndexedBatchValidator").field(&self.inner).finish()
    }
}

#[derive(Debug, Default)]
struct RunState {
    processed: AtomicUsize,
    failed: AtomicUsize,
    stopped: AtomicBool,
    first_kept: AtomicBool,
}

/// Everything one spawned chunk needs, owned.
struct ChunkWorker<T> {
    items: Arc<[T]>,
    validate_item: ItemFn<T>,
    progress: Vec<ProgressFn>,
    config: BatchConfig,
    scope: Option<String>,
    state: Arc<RunState>,
    errors: MultiError,
    ctx: Context,
    total: usize,
}

impl<T> ChunkWorker<T> {
    async fn run(self, range: Range<usize>) {
        for index in range {
            if self.state.stopped.load(Ordering::SeqCst) || self.ctx.is_cancelled() {
                break;
            }

            let item_errors = (self.validate_item)(&self.ctx, &self.items[index], index).await;
            let processed = self.state.processed.fetch_add(1, Ordering::SeqCst) + 1;

            let failed = match item_errors.filter(MultiError::has_errors) {
                Some(item_errors) => {
                    let failed = self.state.failed.fetch_add(1, Ordering::SeqCst) + 1;
                    self.collect(index, &item_errors);
                    failed
                }
                None => self.state.failed.load(Ordering::SeqCst),
            };

            if self.config.enable_progress {
                let progress = BatchProgress {
                    processed,
                    failed,
                    total: self.total,
                };
                for callback in &self.progress {
                    callback(progress);
                }
            }
        }
    }

    fn collect(&self, index: usize, item_errors: &MultiError) {
        if self.config.stops_on_failure() {
            self.state.stopped.store(true, Ordering::SeqCst);
        }
        if !self.config.collect_all_errors && self.state.first_kept.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut target = match &self.scope {
            Some(field) => self.errors.with_index(field, index),
            None => self.errors.clone(),
        };
        target.merge_up_to(item_errors, self.config.error_cap());

        if self.config.max_errors > 0 && self.errors.len() >= self.config.max_errors {
            trace_debug!(max_errors = self.config.max_errors, "batch error cap reached");
            self.state.stopped.store(true, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegate_core::ErrorCode;
    use std::sync::Mutex;

    fn even_numbers_fail(config: BatchConfig) -> BatchValidator<u32> {
        BatchValidator::new(config, |_ctx, n: &u32, _index| {
            let n = *n;
            Box::pin(async move {
                let mut errors = MultiError::new();
                if n % 2 == 0 {
                    errors.add("value", ErrorCode::Invalid, format!("{n} is even"));
                }
                errors.into_option()
            })
        })
    }

    #[tokio::test]
    async fn counts_and_collects() {
        let batch = even_numbers_fail(BatchConfig::new().chunk_size(3).max_parallel(2));
        let report = batch.run(&Context::background(), (1..=10).collect::<Vec<_>>()).await;

        assert_eq!(report.total, 10);
        assert_eq!(report.processed, 10);
        assert_eq!(report.failed, 5);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.errors.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn unbounded_parallelism_is_capped() {
        let config = BatchConfig {
            max_parallel: usize::MAX,
            ..BatchConfig::new().chunk_size(2)
        };
        let report = even_numbers_fail(config)
            .run(&Context::background(), vec![1, 2, 3, 4])
            .await;

        assert_eq!(report.processed, 4);
        assert_eq!(report.failed, 2);
    }

    #[tokio::test]
    async fn empty_batch_reports_nothing() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&ticks);
        let batch = even_numbers_fail(BatchConfig::new().enable_progress(true)).on_progress(
            move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            },
        );

        let report = batch.run(&Context::background(), Vec::new()).await;
        assert!(report.is_valid());
        assert_eq!(report.total, 0);
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn progress_ticks_once_per_item() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let batch = even_numbers_fail(BatchConfig::new().chunk_size(2).enable_progress(true))
            .on_progress(move |p| sink.lock().unwrap().push(p));

        batch.run(&Context::background(), vec![1, 2, 3, 4, 5]).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 5);
        assert!(seen.iter().all(|p| p.total == 5));
        let last = seen.iter().max_by_key(|p| p.processed).unwrap();
        assert_eq!(last.processed, 5);
        assert_eq!(last.ratio(), 1.0);
    }

    #[tokio::test]
    async fn progress_is_off_by_default() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&ticks);
        let batch = even_numbers_fail(BatchConfig::new()).on_progress(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        batch.run(&Context::background(), vec![1, 2, 3]).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fail_fast_skips_remaining_items() {
        let batch = even_numbers_fail(BatchConfig::new().chunk_size(100).fail_fast(true));
        let report = batch.run(&Context::background(), (1..=10).collect::<Vec<_>>()).await;

        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 8);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn error_cap_truncates_and_stops() {
        let batch = BatchValidator::new(
            BatchConfig::new().chunk_size(100).max_errors(3),
            |_ctx, _n: &u32, _index| {
                Box::pin(async move {
                    let mut errors = MultiError::new();
                    errors.add("a", ErrorCode::Invalid, "a");
                    errors.add("b", ErrorCode::Invalid, "b");
                    Some(errors)
                })
            },
        );

        let report = batch.run(&Context::background(), vec![1, 2, 3, 4]).await;
        assert_eq!(report.errors.unwrap().len(), 3);
        assert_eq!(report.processed, 2);
        assert_eq!(report.skipped, 2);
    }

    #[tokio::test]
    async fn first_failing_item_only() {
        let batch = even_numbers_fail(BatchConfig::new().chunk_size(100).collect_all_errors(false));
        let errors = batch
            .validate(&Context::background(), vec![1, 2, 3, 4])
            .await
            .unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors()[0].message, "2 is even");
    }

    #[tokio::test]
    async fn cancelled_context_skips_everything() {
        let ctx = Context::background().child();
        ctx.cancel();

        let report = even_numbers_fail(BatchConfig::new())
            .run(&ctx, vec![2, 4])
            .await;
        assert_eq!(report.processed, 0);
        assert_eq!(report.skipped, 2);
        assert!(report.is_valid());
    }

    #[tokio::test]
    async fn indexed_scopes_item_errors() {
        let batch = IndexedBatchValidator::new(
            "items",
            BatchConfig::new().max_parallel(1),
            |_ctx, sku: &&'static str, _index| {
                let sku = *sku;
                Box::pin(async move {
                    let mut errors = MultiError::new();
                    if sku.is_empty() {
                        errors.add("sku", ErrorCode::Required, "SKU is required");
                    }
                    errors.into_option()
                })
            },
        );
        assert_eq!(batch.field(), "items");

        let errors = batch
            .validate(&Context::background(), vec!["A-1", "", "B-2", ""])
            .await
            .unwrap();
        assert_eq!(errors.fields(), vec!["items[1].sku", "items[3].sku"]);
    }
}
