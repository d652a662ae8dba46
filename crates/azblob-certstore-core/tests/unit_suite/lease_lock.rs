//! Lease lock tests.
//!
//! Covers:
//! - Mutual exclusion between holder tokens
//! - Unlock by a non-holder
//! - Container and key scope
//! - Bounded lease renewal and expiry
//! - Concurrent callers on one instance

use azblob_certstore_core::{Error, LeaseTarget, LockError, Storage};
use std::time::Duration;

use super::helpers::{bounded_lock, container_lock, key_lock, two_processes, FlakyLeases};

#[tokio::test]
async fn lock_excludes_other_holder_until_unlocked() {
    let (_, p1, p2) = two_processes(&container_lock());

    p1.lock("issue_cert_a.com").await.unwrap();

    let err = p2.lock("issue_cert_a.com").await.unwrap_err();
    assert!(err.is_lock_conflict());

    p1.unlock("issue_cert_a.com").await.unwrap();
    p2.lock("issue_cert_a.com").await.unwrap();
    p2.unlock("issue_cert_a.com").await.unwrap();
}

#[tokio::test]
async fn container_scope_serialises_different_keys() {
    let (backend, p1, p2) = two_processes(&container_lock());

    p1.lock("issue_cert_a.com").await.unwrap();
    assert!(p2.lock("issue_cert_b.com").await.unwrap_err().is_lock_conflict());
    assert_eq!(
        backend.leases().holder_of(&LeaseTarget::Container),
        Some(p1.holder())
    );
}

#[tokio::test]
async fn unlock_without_lock_fails() {
    let (_, p1, _) = two_processes(&container_lock());
    let err = p1.unlock("issue_cert_a.com").await.unwrap_err();
    assert!(matches!(err, Error::Lock(LockError::NotHeld { .. })));
}

#[tokio::test]
async fn unlock_by_other_holder_fails_and_keeps_lease() {
    let (_, p1, p2) = two_processes(&container_lock());

    p1.lock("k").await.unwrap();
    assert!(p2.unlock("k").await.is_err());

    // Still held by p1
    assert!(p2.lock("k").await.unwrap_err().is_lock_conflict());
}

#[tokio::test]
async fn relock_by_same_holder_conflicts() {
    let (_, p1, _) = two_processes(&container_lock());

    p1.lock("k").await.unwrap();
    assert!(p1.lock("k").await.unwrap_err().is_lock_conflict());
    p1.unlock("k").await.unwrap();
    p1.lock("k").await.unwrap();
}

#[tokio::test]
async fn key_scope_locks_are_independent() {
    let (_, p1, p2) = two_processes(&key_lock());

    p1.lock("a.com").await.unwrap();
    p2.lock("b.com").await.unwrap();
    assert!(p2.lock("a.com").await.unwrap_err().is_lock_conflict());

    // Lock blobs are visible in the container
    assert!(p1.exists("locks/a.com.lock").await);
    assert!(p1.exists("locks/b.com.lock").await);
}

#[tokio::test]
async fn key_scope_lock_blob_outlives_unlock() {
    let (_, p1, p2) = two_processes(&key_lock());

    p1.lock("a.com").await.unwrap();
    p1.unlock("a.com").await.unwrap();
    assert!(p1.exists("locks/a.com.lock").await);

    // The leftover blob is reused by the next holder
    p2.lock("a.com").await.unwrap();
    p2.unlock("a.com").await.unwrap();
}

#[tokio::test]
async fn concurrent_locks_on_one_instance_conflict() {
    let leases = FlakyLeases::new();
    let p1 = leases.connect(&container_lock(), None);

    let (a, b) = tokio::join!(p1.lock("issue_cert_a.com"), p1.lock("issue_cert_b.com"));

    assert!(a.is_ok() != b.is_ok());
    let err = a.and(b).unwrap_err();
    assert!(err.is_lock_conflict());

    // The winner still holds the lease and can release it
    assert_eq!(
        leases.table.holder_of(&LeaseTarget::Container),
        Some(p1.holder())
    );
    p1.unlock("issue_cert_a.com").await.unwrap();
    assert_eq!(leases.table.holder_of(&LeaseTarget::Container), None);
}

#[tokio::test(start_paused = true)]
async fn bounded_lease_is_renewed_while_held() {
    let (_, p1, p2) = two_processes(&bounded_lock(15));

    p1.lock("k").await.unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert!(p2.lock("k").await.unwrap_err().is_lock_conflict());
}

#[tokio::test(start_paused = true)]
async fn renewal_survives_transport_failure() {
    let leases = FlakyLeases::new().fail_renewals(1);
    let p1 = leases.connect(&bounded_lock(15), None);
    let p2 = leases.connect(&bounded_lock(15), None);

    p1.lock("k").await.unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(
        leases.table.holder_of(&LeaseTarget::Container),
        Some(p1.holder())
    );
    assert!(p2.lock("k").await.unwrap_err().is_lock_conflict());
    p1.unlock("k").await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn bounded_lease_of_crashed_holder_expires() {
    let (backend, p1, p2) = two_processes(&bounded_lock(15));

    p1.lock("k").await.unwrap();
    // Dropping the instance stops renewal without releasing.
    drop(p1);

    tokio::time::sleep(Duration::from_secs(16)).await;
    assert_eq!(backend.leases().holder_of(&LeaseTarget::Container), None);
    p2.lock("k").await.unwrap();
}

#[tokio::test]
async fn two_process_issuance_handoff() {
    let (_, p1, p2) = two_processes(&container_lock());

    p1.lock("issue_cert_a.com").await.unwrap();
    assert!(p2.lock("issue_cert_a.com").await.unwrap_err().is_lock_conflict());
    p1.unlock("issue_cert_a.com").await.unwrap();
    p2.lock("issue_cert_a.com").await.unwrap();
}
