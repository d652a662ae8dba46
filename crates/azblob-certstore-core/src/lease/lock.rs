//! Lock/unlock on top of the lease primitive.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{HolderToken, LeaseClient, LeaseDuration, LeaseTarget};
use crate::config::LockScope;
use crate::error::LockError;
use crate::storage::keys::lock_blob_name;
use crate::Result;

/// Local state of one lease target.
enum Slot {
    /// An acquire is in flight; other callers on this instance conflict.
    Pending,
    /// Lease granted, with its renewal task for bounded leases.
    Held(Option<JoinHandle<()>>),
}

impl Slot {
    fn abort_renewal(self) {
        if let Slot::Held(Some(handle)) = self {
            handle.abort();
        }
    }
}

/// Distributed lock owned by one backend instance.
///
/// The holder token is generated at construction and used for every lease
/// call this instance makes. Bounded leases are kept alive by a renewal task
/// per held target until `unlock` (or drop).
pub struct LeaseLock {
    client: Arc<dyn LeaseClient>,
    holder: HolderToken,
    scope: LockScope,
    duration: LeaseDuration,
    held: Arc<Mutex<HashMap<LeaseTarget, Slot>>>,
}

impl LeaseLock {
    /// Create a lock with a fresh holder token.
    pub fn new(client: Arc<dyn LeaseClient>, scope: LockScope, duration: LeaseDuration) -> Self {
        let holder = HolderToken::generate();
        info!(
            "Created lease lock: holder={}, scope={:?}, duration={:?}",
            holder, scope, duration
        );
        Self {
            client,
            holder,
            scope,
            duration,
            held: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// This instance's holder token.
    pub fn holder(&self) -> HolderToken {
        self.holder
    }

    /// Configured lock granularity.
    pub fn scope(&self) -> LockScope {
        self.scope
    }

    /// What `lock(key)` leases under the configured scope.
    pub fn target_for(&self, key: &str) -> LeaseTarget {
        match self.scope {
            LockScope::Container => LeaseTarget::Container,
            LockScope::Key => LeaseTarget::Blob(lock_blob_name(key)),
        }
    }

    /// Whether this instance currently believes it holds the lock for `key`.
    pub fn is_held(&self, key: &str) -> bool {
        matches!(
            self.held.lock().get(&self.target_for(key)),
            Some(Slot::Held(_))
        )
    }

    /// Acquire the lease guarding `key`.
    ///
    /// Dropping the returned future before it completes (a deadline, a
    /// cancelled caller) releases the lease in the background, since the
    /// service may already have granted it.
    pub async fn lock(&self, key: &str) -> Result<()> {
        let target = self.target_for(key);

        // The service accepts a repeat acquire from the same lease id, which
        // would let two callers in this process both "hold" the lock. The
        // slot is reserved before the first await.
        {
            let mut held = self.held.lock();
            if held.contains_key(&target) {
                return Err(LockError::Conflict {
                    target: target.to_string(),
                }
                .into());
            }
            held.insert(target.clone(), Slot::Pending);
        }
        let mut pending = PendingAcquire::new(self, target.clone());

        if let Err(e) = self
            .client
            .acquire(&target, &self.holder, self.duration)
            .await
        {
            // A transport failure may hide a granted lease.
            pending.release_on_drop = matches!(e, crate::Error::Lock(LockError::Transport(_)));
            return Err(e);
        }

        let renewal = self
            .duration
            .renew_interval()
            .map(|period| self.spawn_renewal(target.clone(), period));
        self.held.lock().insert(target.clone(), Slot::Held(renewal));
        pending.committed = true;

        info!("Acquired lock on {} (key {}) as {}", target, key, self.holder);
        Ok(())
    }

    /// Release the lease guarding `key`.
    pub async fn unlock(&self, key: &str) -> Result<()> {
        let target = self.target_for(key);

        let result = self.client.release(&target, &self.holder).await;

        match &result {
            Ok(()) => {
                self.forget(&target);
                info!("Released lock on {} (key {}) as {}", target, key, self.holder);
            }
            Err(crate::Error::Lock(LockError::NotHeld { .. })) => {
                // Whatever we thought we held is gone remotely.
                self.forget(&target);
                warn!("Unlock of {} (key {}): not held by {}", target, key, self.holder);
            }
            Err(e) => {
                warn!("Unlock of {} (key {}) failed: {}", target, key, e);
            }
        }

        result
    }

    /// Drop a held slot. An in-flight acquire keeps its reservation.
    fn forget(&self, target: &LeaseTarget) {
        let mut held = self.held.lock();
        if matches!(held.get(target), Some(Slot::Held(_))) {
            if let Some(slot) = held.remove(target) {
                slot.abort_renewal();
            }
        }
    }

    fn spawn_renewal(&self, target: LeaseTarget, period: Duration) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let holder = self.holder;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately; the lease was just acquired.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match client.renew(&target, &holder).await {
                    Ok(()) => debug!("Renewed lease on {} as {}", target, holder),
                    Err(crate::Error::Lock(LockError::Transport(e))) => {
                        // Renewal runs at a third of the lease, so the next
                        // tick still lands before expiry.
                        warn!("Lease renewal on {} as {} failed, retrying: {}", target, holder, e);
                    }
                    Err(e) => {
                        warn!("Lease renewal on {} as {} stopped: {}", target, holder, e);
                        break;
                    }
                }
            }
        })
    }
}

impl Drop for LeaseLock {
    fn drop(&mut self) {
        for (_, slot) in self.held.lock().drain() {
            slot.abort_renewal();
        }
    }
}

/// Reservation for an acquire in flight.
///
/// Unless committed, dropping it frees the slot and, when the outcome is
/// unknown, releases the lease in the background.
struct PendingAcquire {
    client: Arc<dyn LeaseClient>,
    held: Arc<Mutex<HashMap<LeaseTarget, Slot>>>,
    holder: HolderToken,
    target: LeaseTarget,
    committed: bool,
    release_on_drop: bool,
}

impl PendingAcquire {
    fn new(lock: &LeaseLock, target: LeaseTarget) -> Self {
        Self {
            client: Arc::clone(&lock.client),
            held: Arc::clone(&lock.held),
            holder: lock.holder,
            target,
            committed: false,
            release_on_drop: true,
        }
    }
}

impl Drop for PendingAcquire {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        {
            let mut held = self.held.lock();
            if matches!(held.get(&self.target), Some(Slot::Pending)) {
                held.remove(&self.target);
            }
        }

        if !self.release_on_drop {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime to release abandoned lease on {}", self.target);
            return;
        };

        let client = Arc::clone(&self.client);
        let holder = self.holder;
        let target = self.target.clone();
        runtime.spawn(async move {
            match client.release(&target, &holder).await {
                Ok(()) => info!("Released abandoned lease on {} as {}", target, holder),
                Err(e) => debug!("Release of abandoned lease on {} as {}: {}", target, holder, e),
            }
        });
    }
}
