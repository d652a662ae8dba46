//! Lease primitive and the lock built on top of it.
//!
//! The blob service can grant a named holder exclusive, time-bounded
//! ownership of a container or a blob. `object_store` does not expose this,
//! so it is modelled here as its own client trait:
//!
//! - **Azure**: signed `comp=lease` REST calls
//! - **Memory**: a process-local lease table (for testing)
//!
//! [`LeaseLock`] turns the primitive into `lock(key)` / `unlock(key)`.

mod azure;
mod lock;
mod memory;

pub use azure::AzureLeaseClient;
pub use lock::LeaseLock;
pub use memory::MemoryLeaseClient;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::Result;

/// What a lease is taken on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LeaseTarget {
    /// The whole container
    Container,
    /// A single blob
    Blob(String),
}

impl fmt::Display for LeaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaseTarget::Container => f.write_str("container"),
            LeaseTarget::Blob(name) => write!(f, "blob {}", name),
        }
    }
}

/// Identity a backend instance uses as its lease id.
///
/// Generated once per instance and never shared: the service only lets the
/// token that acquired a lease renew or release it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HolderToken(Uuid);

impl HolderToken {
    /// A fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for HolderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Requested lease lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseDuration {
    /// Held until released
    Infinite,
    /// Expires unless renewed within the duration
    Bounded(Duration),
}

impl LeaseDuration {
    /// From an optional bound, `None` meaning infinite.
    pub fn from_option(duration: Option<Duration>) -> Self {
        duration.map_or(LeaseDuration::Infinite, LeaseDuration::Bounded)
    }

    /// Value of the `x-ms-lease-duration` header.
    pub fn header_value(&self) -> String {
        match self {
            LeaseDuration::Infinite => "-1".to_string(),
            LeaseDuration::Bounded(d) => d.as_secs().to_string(),
        }
    }

    /// How often a holder renews a bounded lease.
    pub fn renew_interval(&self) -> Option<Duration> {
        match self {
            LeaseDuration::Infinite => None,
            LeaseDuration::Bounded(d) => Some(*d / 3),
        }
    }
}

/// Lease operations of the object store.
#[async_trait]
pub trait LeaseClient: Send + Sync {
    /// Acquire `target` for `holder`.
    ///
    /// Fails with `LockError::Conflict` if another holder has an active lease.
    async fn acquire(
        &self,
        target: &LeaseTarget,
        holder: &HolderToken,
        duration: LeaseDuration,
    ) -> Result<()>;

    /// Extend a bounded lease held by `holder`.
    async fn renew(&self, target: &LeaseTarget, holder: &HolderToken) -> Result<()>;

    /// Release a lease held by `holder`.
    ///
    /// Fails with `LockError::NotHeld` if no lease exists or another holder
    /// owns it.
    async fn release(&self, target: &LeaseTarget, holder: &HolderToken) -> Result<()>;
}
