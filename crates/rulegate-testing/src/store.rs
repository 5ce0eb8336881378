//! Store doubles.

use async_trait::async_trait;
use rulegate_tenant::{CountQuery, StoreError, TenantStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A store whose every query fails.
#[derive(Debug, Clone)]
pub struct FailingStore {
    message: String,
    calls: Arc<AtomicUsize>,
}

impl FailingStore {
    /// Fails with [`StoreError::Unavailable`] carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TenantStore for FailingStore {
    async fn count(&self, _query: &CountQuery) -> rulegate_tenant::Result<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable(self.message.clone()))
    }
}

/// Wraps a store and records every query passed through it.
#[derive(Debug, Clone)]
pub struct RecordingStore<S> {
    inner: S,
    queries: Arc<Mutex<Vec<CountQuery>>>,
}

impl<S: TenantStore> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            queries: Arc::default(),
        }
    }

    /// Queries seen so far, in order.
    pub fn queries(&self) -> Vec<CountQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl<S: TenantStore> TenantStore for RecordingStore<S> {
    async fn count(&self, query: &CountQuery) -> rulegate_tenant::Result<i64> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }
        self.inner.count(query).await
    }
}
