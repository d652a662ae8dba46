//! Azure Blob certificate storage core library
//!
//! This crate provides the storage contract a certificate manager persists
//! certificates, keys and account data through, an Azure Blob Storage
//! implementation of it, and lease-based distributed locking so that several
//! processes sharing one container coordinate issuance and renewal.

pub mod config;
pub mod error;
pub mod lease;
pub mod metrics;
pub mod storage;

pub use config::{Config, LockConfig, LockScope};
pub use error::{Error, LockError, Result, StorageError};
pub use lease::{HolderToken, LeaseClient, LeaseDuration, LeaseTarget};
pub use metrics::{create_instrumented_storage, InstrumentedStorage, PrometheusMetrics};
pub use storage::{
    create_storage, AzureBackend, AzureConfig, BlobStorage, KeyInfo, MemoryBackend, Storage,
    StorageBackendConfig,
};
