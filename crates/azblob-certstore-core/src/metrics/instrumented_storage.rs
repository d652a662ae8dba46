//! Instrumented storage decorator.
//!
//! This module provides a decorator that wraps any `Storage` implementation
//! with metrics instrumentation, recording latency, bytes transferred, errors
//! and lock outcomes.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;

use super::labels::{ErrorType, LockAction, LockOutcome, StorageOperation};
use super::registry::PrometheusMetrics;
use crate::config::Config;
use crate::storage::{KeyInfo, Storage};
use crate::Result;

/// A storage wrapper that records metrics for all operations.
///
/// # Example
///
/// ```rust,ignore
/// use azblob_certstore_core::metrics::{InstrumentedStorage, PrometheusMetrics};
///
/// let storage = create_storage(&config)?;
/// let metrics = Arc::new(PrometheusMetrics::new());
/// let instrumented = InstrumentedStorage::new(storage, "azure", metrics);
/// ```
pub struct InstrumentedStorage {
    /// The wrapped storage.
    inner: Arc<dyn Storage>,

    /// The backend name for metric labels (azure, memory).
    backend_name: String,

    /// Reference to the Prometheus metrics registry.
    metrics: Arc<PrometheusMetrics>,
}

impl InstrumentedStorage {
    /// Wrap `inner`, labelling every metric with `backend_name`.
    pub fn new(
        inner: Arc<dyn Storage>,
        backend_name: impl Into<String>,
        metrics: Arc<PrometheusMetrics>,
    ) -> Self {
        Self {
            inner,
            backend_name: backend_name.into(),
            metrics,
        }
    }

    /// Get the backend name.
    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// Get the inner storage.
    pub fn inner(&self) -> &Arc<dyn Storage> {
        &self.inner
    }

    fn observe<T>(&self, operation: StorageOperation, start: Instant, result: &Result<T>) {
        self.metrics.record_storage_latency(
            &self.backend_name,
            operation,
            start.elapsed().as_secs_f64(),
        );
        if let Err(e) = result {
            self.metrics
                .inc_storage_error(&self.backend_name, ErrorType::from_error(e));
        }
    }

    fn observe_lock(&self, action: LockAction, result: &Result<()>) {
        self.metrics
            .inc_lock_attempt(&self.backend_name, action, LockOutcome::from_result(result));
    }
}

#[async_trait]
impl Storage for InstrumentedStorage {
    async fn store(&self, key: &str, value: Bytes) -> Result<()> {
        let bytes_len = value.len() as u64;
        let start = Instant::now();

        let result = self.inner.store(key, value).await;

        self.observe(StorageOperation::Store, start, &result);
        if result.is_ok() {
            self.metrics
                .inc_storage_write_bytes(&self.backend_name, bytes_len);
        }

        result
    }

    async fn load(&self, key: &str) -> Result<Bytes> {
        let start = Instant::now();

        let result = self.inner.load(key).await;

        self.observe(StorageOperation::Load, start, &result);
        if let Ok(data) = &result {
            self.metrics
                .inc_storage_read_bytes(&self.backend_name, data.len() as u64);
        }

        result
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.delete(key).await;
        self.observe(StorageOperation::Delete, start, &result);
        result
    }

    async fn exists(&self, key: &str) -> bool {
        let start = Instant::now();
        let found = self.inner.exists(key).await;
        self.metrics.record_storage_latency(
            &self.backend_name,
            StorageOperation::Exists,
            start.elapsed().as_secs_f64(),
        );
        found
    }

    async fn list(&self, prefix: &str, recursive: bool) -> Result<Vec<String>> {
        let start = Instant::now();
        let result = self.inner.list(prefix, recursive).await;
        self.observe(StorageOperation::List, start, &result);
        result
    }

    async fn stat(&self, key: &str) -> Result<KeyInfo> {
        let start = Instant::now();
        let result = self.inner.stat(key).await;
        self.observe(StorageOperation::Stat, start, &result);
        result
    }

    async fn lock(&self, key: &str) -> Result<()> {
        let result = self.inner.lock(key).await;
        self.observe_lock(LockAction::Lock, &result);
        result
    }

    async fn unlock(&self, key: &str) -> Result<()> {
        let result = self.inner.unlock(key).await;
        self.observe_lock(LockAction::Unlock, &result);
        result
    }
}

/// Create an instrumented storage from configuration.
///
/// Convenience wrapper around [`crate::storage::create_storage`] that labels
/// metrics with the configured backend name.
pub fn create_instrumented_storage(
    config: &Config,
    metrics: Arc<PrometheusMetrics>,
) -> Result<Arc<dyn Storage>> {
    let inner = crate::storage::create_storage(config)?;
    let backend_name = config.storage.backend_name();

    Ok(Arc::new(InstrumentedStorage::new(
        inner,
        backend_name,
        metrics,
    )))
}
