//! Storage and lock metrics.
//!
//! ## Modules
//!
//! - [`labels`] - Label types for Prometheus metrics dimensions
//! - [`registry`] - The `PrometheusMetrics` registry
//! - [`instrumented_storage`] - Storage decorator with metrics instrumentation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use azblob_certstore_core::metrics::{create_instrumented_storage, PrometheusMetrics};
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(PrometheusMetrics::new());
//! let storage = create_instrumented_storage(&config, metrics.clone())?;
//! storage.store("certificates/a.com/a.com.crt", data).await?;
//!
//! println!("{}", metrics.encode());
//! ```

pub mod instrumented_storage;
pub mod labels;
pub mod registry;

pub use instrumented_storage::{create_instrumented_storage, InstrumentedStorage};
pub use labels::{
    ErrorType, LockAction, LockLabels, LockOutcome, StorageBytesLabels, StorageErrorLabels,
    StorageLabels, StorageOperation,
};
pub use registry::PrometheusMetrics;
