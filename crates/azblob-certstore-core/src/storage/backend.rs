//! Storage contract consumed by the certificate manager.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::Result;

/// Metadata about a stored key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    /// The logical key
    pub key: String,
    /// Last modified timestamp reported by the object store
    pub modified: DateTime<Utc>,
    /// Payload size in bytes
    pub size: u64,
    /// Always true: a flat blob namespace has no directory nodes
    pub is_terminal: bool,
}

/// Key-value storage with distributed locking, as a certificate manager
/// expects it.
///
/// Keys are non-empty `/`-separated strings. Every method is a single remote
/// round trip (or a short fixed sequence); dropping the returned future
/// cancels the in-flight request.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `value` under `key`, overwriting unconditionally.
    async fn store(&self, key: &str, value: Bytes) -> Result<()>;

    /// Read the full payload of `key`.
    ///
    /// A missing key yields an error for which `is_not_found()` is true.
    async fn load(&self, key: &str) -> Result<Bytes>;

    /// Delete `key`. Deleting a missing key is a `NotFound` error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Whether `key` exists (exact match).
    async fn exists(&self, key: &str) -> bool;

    /// List keys under `prefix`.
    ///
    /// With `recursive` every key below the prefix is returned; without it
    /// only the immediate children, including directory-like prefixes.
    async fn list(&self, prefix: &str, recursive: bool) -> Result<Vec<String>>;

    /// Describe `key`.
    async fn stat(&self, key: &str) -> Result<KeyInfo>;

    /// Acquire the lock guarding `key`. Fails fast if another holder has it.
    async fn lock(&self, key: &str) -> Result<()>;

    /// Release the lock guarding `key`.
    async fn unlock(&self, key: &str) -> Result<()>;
}
