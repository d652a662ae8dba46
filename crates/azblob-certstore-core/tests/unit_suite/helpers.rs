//! Test helper utilities.

use async_trait::async_trait;
use azblob_certstore_core::lease::MemoryLeaseClient;
use azblob_certstore_core::{
    BlobStorage, HolderToken, LeaseClient, LeaseDuration, LeaseTarget, LockConfig, LockError,
    LockScope, MemoryBackend, Result,
};
use object_store::memory::InMemory;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default lock options: container scope, infinite lease.
pub fn container_lock() -> LockConfig {
    LockConfig::default()
}

/// Per-key locks with an infinite lease.
pub fn key_lock() -> LockConfig {
    LockConfig {
        scope: LockScope::Key,
        lease_duration_secs: None,
    }
}

/// Container lock with a bounded, renewed lease.
pub fn bounded_lock(secs: u64) -> LockConfig {
    LockConfig {
        scope: LockScope::Container,
        lease_duration_secs: Some(secs),
    }
}

/// A single storage instance over a fresh in-memory container.
pub fn single() -> BlobStorage {
    MemoryBackend::new().connect(&container_lock(), None)
}

/// Two "processes" sharing one in-memory container.
pub fn two_processes(lock: &LockConfig) -> (MemoryBackend, BlobStorage, BlobStorage) {
    let backend = MemoryBackend::new();
    let p1 = backend.connect(lock, None);
    let p2 = backend.connect(lock, None);
    (backend, p1, p2)
}

/// Certificate-manager style key for a domain asset.
pub fn cert_key(domain: &str, ext: &str) -> String {
    format!("certificates/acme-v02/{}/{}.{}", domain, domain, ext)
}

/// Lease client over a shared [`MemoryLeaseClient`] that behaves like a slow,
/// flaky network.
///
/// Every acquire yields before reaching the table, so concurrent callers
/// interleave. `acquire_stall` holds the call open after the lease has been
/// granted. The first `failing_renewals` renewals fail with a transport error.
#[derive(Clone, Default)]
pub struct FlakyLeases {
    pub table: MemoryLeaseClient,
    pub acquire_stall: Option<Duration>,
    failing_renewals: Arc<AtomicUsize>,
}

impl FlakyLeases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stall_acquire(mut self, stall: Duration) -> Self {
        self.acquire_stall = Some(stall);
        self
    }

    pub fn fail_renewals(self, count: usize) -> Self {
        self.failing_renewals.store(count, Ordering::SeqCst);
        self
    }

    /// A storage instance with its own holder token over these leases.
    pub fn connect(&self, lock: &LockConfig, timeout: Option<Duration>) -> BlobStorage {
        BlobStorage::new(
            Arc::new(InMemory::new()),
            Arc::new(self.clone()),
            "Memory",
            lock.scope,
            lock.lease_duration(),
        )
        .with_timeout(timeout)
    }
}

#[async_trait]
impl LeaseClient for FlakyLeases {
    async fn acquire(
        &self,
        target: &LeaseTarget,
        holder: &HolderToken,
        duration: LeaseDuration,
    ) -> Result<()> {
        tokio::task::yield_now().await;
        self.table.acquire(target, holder, duration).await?;
        if let Some(stall) = self.acquire_stall {
            tokio::time::sleep(stall).await;
        }
        Ok(())
    }

    async fn renew(&self, target: &LeaseTarget, holder: &HolderToken) -> Result<()> {
        let failing = self
            .failing_renewals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(LockError::Transport("connection reset".to_string()).into());
        }
        self.table.renew(target, holder).await
    }

    async fn release(&self, target: &LeaseTarget, holder: &HolderToken) -> Result<()> {
        self.table.release(target, holder).await
    }
}
