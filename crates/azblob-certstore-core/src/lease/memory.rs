//! In-memory lease table for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

use super::{HolderToken, LeaseClient, LeaseDuration, LeaseTarget};
use crate::error::LockError;
use crate::Result;

#[derive(Debug, Clone)]
struct MemoryLease {
    holder: HolderToken,
    expires_at: Option<Instant>,
    duration: LeaseDuration,
}

impl MemoryLease {
    fn is_active(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Lease table shared by every clone.
///
/// Clones model separate processes talking to the same container: hand one
/// clone to each backend instance and they contend for the same leases.
/// Expiry follows tokio's clock, so tests can drive it with paused time.
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaseClient {
    leases: Arc<Mutex<HashMap<LeaseTarget, MemoryLease>>>,
}

impl MemoryLeaseClient {
    /// Create an empty lease table
    pub fn new() -> Self {
        Self::default()
    }

    /// Current active holder of `target`, if any.
    pub fn holder_of(&self, target: &LeaseTarget) -> Option<HolderToken> {
        let now = Instant::now();
        self.leases
            .lock()
            .get(target)
            .filter(|lease| lease.is_active(now))
            .map(|lease| lease.holder)
    }
}

fn expiry(duration: LeaseDuration, now: Instant) -> Option<Instant> {
    match duration {
        LeaseDuration::Infinite => None,
        LeaseDuration::Bounded(d) => Some(now + d),
    }
}

#[async_trait]
impl LeaseClient for MemoryLeaseClient {
    async fn acquire(
        &self,
        target: &LeaseTarget,
        holder: &HolderToken,
        duration: LeaseDuration,
    ) -> Result<()> {
        let now = Instant::now();
        let mut leases = self.leases.lock();

        if let Some(existing) = leases.get(target) {
            // The same holder may re-acquire its own active lease.
            if existing.is_active(now) && existing.holder != *holder {
                return Err(LockError::Conflict {
                    target: target.to_string(),
                }
                .into());
            }
        }

        leases.insert(
            target.clone(),
            MemoryLease {
                holder: *holder,
                expires_at: expiry(duration, now),
                duration,
            },
        );
        Ok(())
    }

    async fn renew(&self, target: &LeaseTarget, holder: &HolderToken) -> Result<()> {
        let now = Instant::now();
        let mut leases = self.leases.lock();

        match leases.get_mut(target) {
            Some(lease) if lease.holder == *holder => {
                lease.expires_at = expiry(lease.duration, now);
                Ok(())
            }
            _ => Err(LockError::NotHeld {
                target: target.to_string(),
            }
            .into()),
        }
    }

    async fn release(&self, target: &LeaseTarget, holder: &HolderToken) -> Result<()> {
        let mut leases = self.leases.lock();

        match leases.get(target) {
            Some(lease) if lease.holder == *holder => {
                leases.remove(target);
                Ok(())
            }
            _ => Err(LockError::NotHeld {
                target: target.to_string(),
            }
            .into()),
        }
    }
}
