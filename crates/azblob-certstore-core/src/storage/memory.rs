//! In-memory storage backend for testing.

use object_store::memory::InMemory;
use std::sync::Arc;
use std::time::Duration;

use super::BlobStorage;
use crate::config::LockConfig;
use crate::lease::MemoryLeaseClient;

/// In-memory container using object_store and a local lease table
///
/// This backend is primarily useful for testing purposes as it doesn't
/// persist data between runs. Every [`MemoryBackend::connect`] call shares
/// the same blobs and leases but gets its own holder token, which is how
/// tests stand in for several processes sharing one container.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    store: Arc<InMemory>,
    leases: MemoryLeaseClient,
}

impl MemoryBackend {
    /// Create a new, empty in-memory container
    pub fn new() -> Self {
        Self::default()
    }

    /// A storage instance with a fresh holder token.
    pub fn connect(&self, lock: &LockConfig, timeout: Option<Duration>) -> BlobStorage {
        BlobStorage::new(
            self.store.clone(),
            Arc::new(self.leases.clone()),
            "Memory",
            lock.scope,
            lock.lease_duration(),
        )
        .with_timeout(timeout)
    }

    /// The shared lease table.
    pub fn leases(&self) -> &MemoryLeaseClient {
        &self.leases
    }
}
