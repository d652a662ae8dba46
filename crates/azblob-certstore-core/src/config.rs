//! Configuration structures for the certificate storage backend.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::storage::StorageBackendConfig;

/// Shortest bounded lease the blob service grants.
pub const MIN_LEASE_DURATION_SECS: u64 = 15;

/// Longest bounded lease the blob service grants.
pub const MAX_LEASE_DURATION_SECS: u64 = 60;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration (Azure or Memory)
    pub storage: StorageBackendConfig,

    /// Lease lock options
    #[serde(default)]
    pub lock: LockConfig,

    /// Deadline applied to every remote call, in seconds (unbounded if unset)
    #[serde(default)]
    pub operation_timeout_secs: Option<u64>,
}

/// What a `lock(key)` call actually leases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockScope {
    /// One lease over the whole container; the key is ignored, so at most one
    /// issuance is in flight per container.
    #[default]
    Container,
    /// One lease per key, taken on a derived lock blob.
    ///
    /// Lock blobs (`locks/<key>.lock`) are created on first use and kept
    /// after unlock: deleting one could race another holder's acquire. They
    /// are empty and show up in `list`.
    Key,
}

/// Lease lock configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Lease granularity
    #[serde(default)]
    pub scope: LockScope,

    /// Bounded lease duration in seconds (15-60). Unset means an infinite
    /// lease that is only ever released by `unlock`.
    #[serde(default)]
    pub lease_duration_secs: Option<u64>,
}

impl LockConfig {
    /// Validate the lock options
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(secs) = self.lease_duration_secs {
            if !(MIN_LEASE_DURATION_SECS..=MAX_LEASE_DURATION_SECS).contains(&secs) {
                return Err(crate::Error::Config(format!(
                    "lease_duration_secs must be between {} and {}, got {}",
                    MIN_LEASE_DURATION_SECS, MAX_LEASE_DURATION_SECS, secs
                )));
            }
        }
        Ok(())
    }

    /// Lease duration as a `Duration`, `None` for infinite.
    pub fn lease_duration(&self) -> Option<Duration> {
        self.lease_duration_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Build a configuration around a storage backend with default options.
    pub fn new(storage: StorageBackendConfig) -> Self {
        Self {
            storage,
            lock: LockConfig::default(),
            operation_timeout_secs: None,
        }
    }

    /// Parse a YAML document.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Fill blank credentials from the process environment.
    pub fn resolve_env(mut self) -> Self {
        self.storage = self.storage.resolve_env();
        self
    }

    /// Per-call deadline, if configured.
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_secs.map(Duration::from_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        self.storage.validate()?;
        self.lock.validate()?;

        if self.operation_timeout_secs == Some(0) {
            return Err(crate::Error::Config(
                "operation_timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
