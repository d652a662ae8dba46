//! Prometheus metrics registry for azblob-certstore.

use parking_lot::RwLock;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

use super::labels::{
    ErrorType, LockAction, LockLabels, LockOutcome, StorageBytesLabels, StorageErrorLabels,
    StorageLabels, StorageOperation,
};

/// Storage latency histogram buckets (in seconds).
/// Covers typical cloud storage latencies: 10ms to 10s.
const STORAGE_LATENCY_BUCKETS: [f64; 9] = [0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Prometheus metrics registry for azblob-certstore.
///
/// Holds storage I/O and lock metrics. Families are cheap to clone; the
/// registry keeps a handle to each one for encoding.
pub struct PrometheusMetrics {
    /// Internal prometheus-client registry.
    registry: RwLock<Registry>,

    // ========================================
    // Storage I/O Metrics
    // ========================================
    /// Storage latency histogram (by backend and operation).
    pub storage_latency_seconds: Family<StorageLabels, Histogram>,

    /// Cumulative bytes written to storage.
    pub storage_write_bytes_total: Family<StorageBytesLabels, Counter>,

    /// Cumulative bytes read from storage.
    pub storage_read_bytes_total: Family<StorageBytesLabels, Counter>,

    /// Storage operation errors by type.
    pub storage_errors_total: Family<StorageErrorLabels, Counter>,

    // ========================================
    // Lock Metrics
    // ========================================
    /// Lock and unlock attempts by outcome.
    pub lock_attempts_total: Family<LockLabels, Counter>,
}

impl PrometheusMetrics {
    /// Create a new metrics registry with every family registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let storage_latency_seconds =
            Family::<StorageLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(STORAGE_LATENCY_BUCKETS.iter().cloned())
            });
        let storage_write_bytes_total = Family::<StorageBytesLabels, Counter>::default();
        let storage_read_bytes_total = Family::<StorageBytesLabels, Counter>::default();
        let storage_errors_total = Family::<StorageErrorLabels, Counter>::default();
        let lock_attempts_total = Family::<LockLabels, Counter>::default();

        registry.register(
            "certstore_storage_latency_seconds",
            "Storage operation latency",
            storage_latency_seconds.clone(),
        );
        registry.register(
            "certstore_storage_write_bytes",
            "Cumulative bytes written to storage",
            storage_write_bytes_total.clone(),
        );
        registry.register(
            "certstore_storage_read_bytes",
            "Cumulative bytes read from storage",
            storage_read_bytes_total.clone(),
        );
        registry.register(
            "certstore_storage_errors",
            "Storage operation errors by type",
            storage_errors_total.clone(),
        );
        registry.register(
            "certstore_lock_attempts",
            "Lock and unlock attempts by outcome",
            lock_attempts_total.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            storage_latency_seconds,
            storage_write_bytes_total,
            storage_read_bytes_total,
            storage_errors_total,
            lock_attempts_total,
        }
    }

    /// Record storage operation latency.
    pub fn record_storage_latency(
        &self,
        backend: &str,
        operation: StorageOperation,
        latency_secs: f64,
    ) {
        let labels = StorageLabels::new(backend, operation);
        self.storage_latency_seconds
            .get_or_create(&labels)
            .observe(latency_secs);
    }

    /// Increment storage write bytes counter.
    pub fn inc_storage_write_bytes(&self, backend: &str, bytes: u64) {
        let labels = StorageBytesLabels::new(backend);
        self.storage_write_bytes_total
            .get_or_create(&labels)
            .inc_by(bytes);
    }

    /// Increment storage read bytes counter.
    pub fn inc_storage_read_bytes(&self, backend: &str, bytes: u64) {
        let labels = StorageBytesLabels::new(backend);
        self.storage_read_bytes_total
            .get_or_create(&labels)
            .inc_by(bytes);
    }

    /// Increment storage error counter.
    pub fn inc_storage_error(&self, backend: &str, error_type: ErrorType) {
        let labels = StorageErrorLabels::new(backend, error_type);
        self.storage_errors_total.get_or_create(&labels).inc();
    }

    /// Count a lock or unlock attempt.
    pub fn inc_lock_attempt(&self, backend: &str, action: LockAction, outcome: LockOutcome) {
        let labels = LockLabels::new(backend, action, outcome);
        self.lock_attempts_total.get_or_create(&labels).inc();
    }

    /// Encode all metrics to Prometheus text format.
    pub fn encode(&self) -> String {
        let registry = self.registry.read();
        let mut buffer = String::new();
        if encode(&mut buffer, &registry).is_err() {
            return String::new();
        }
        buffer
    }
}

impl Default for PrometheusMetrics {
    fn default() -> Self {
        Self::new()
    }
}
