//! Storage contract tests.
//!
//! Covers:
//! - Store/Load/Delete/Exists/Stat semantics
//! - NotFound detection
//! - Exact-match existence
//! - Prefix and recursion handling in List
//! - Per-call deadlines

use azblob_certstore_core::{
    Error, HolderToken, LeaseClient, LeaseDuration, LeaseTarget, Storage, StorageError,
};
use bytes::Bytes;
use std::time::Duration;

use super::helpers::{cert_key, container_lock, single, FlakyLeases};

// ============================================================================
// Store / Load
// ============================================================================

#[tokio::test]
async fn store_then_load_returns_payload() {
    let storage = single();
    let key = cert_key("example.com", "crt");
    let payload = Bytes::from_static(b"-----BEGIN CERTIFICATE-----\nMIIB\n");

    storage.store(&key, payload.clone()).await.unwrap();
    assert_eq!(storage.load(&key).await.unwrap(), payload);
}

#[tokio::test]
async fn store_overwrites_previous_value() {
    let storage = single();
    let key = cert_key("example.com", "json");

    storage.store(&key, Bytes::from("{\"v\":1}")).await.unwrap();
    storage.store(&key, Bytes::from("{\"v\":2}")).await.unwrap();
    assert_eq!(storage.load(&key).await.unwrap(), Bytes::from("{\"v\":2}"));
}

#[tokio::test]
async fn storing_identical_payload_twice_is_idempotent() {
    let storage = single();
    let key = cert_key("example.com", "key");
    let payload = Bytes::from("PRIVATE KEY");

    storage.store(&key, payload.clone()).await.unwrap();
    storage.store(&key, payload.clone()).await.unwrap();
    assert_eq!(storage.load(&key).await.unwrap(), payload);
    assert_eq!(storage.list("", true).await.unwrap(), vec![key]);
}

#[tokio::test]
async fn empty_payload_is_stored() {
    let storage = single();
    storage.store("acme/empty", Bytes::new()).await.unwrap();

    assert!(storage.load("acme/empty").await.unwrap().is_empty());
    assert_eq!(storage.stat("acme/empty").await.unwrap().size, 0);
}

#[tokio::test]
async fn load_missing_key_is_not_found() {
    let storage = single();
    let err = storage.load("certificates/never/stored.crt").await.unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(
        err,
        Error::Storage(StorageError::NotFound(ref key)) if key == "certificates/never/stored.crt"
    ));
}

#[tokio::test]
async fn empty_key_is_rejected() {
    let storage = single();
    let err = storage.store("", Bytes::from("x")).await.unwrap_err();

    assert!(matches!(err, Error::Storage(StorageError::InvalidKey(_))));
    assert!(!err.is_not_found());
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn delete_then_load_is_not_found() {
    let storage = single();
    let key = cert_key("example.com", "crt");

    storage.store(&key, Bytes::from("CERT")).await.unwrap();
    storage.delete(&key).await.unwrap();

    assert!(storage.load(&key).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn delete_missing_key_is_not_found() {
    let storage = single();
    let err = storage.delete("acme/missing").await.unwrap_err();
    assert!(err.is_not_found());
}

// ============================================================================
// Exists
// ============================================================================

#[tokio::test]
async fn exists_is_exact_match() {
    let storage = single();
    storage
        .store("certs/a.com.crt", Bytes::from("CERT"))
        .await
        .unwrap();

    assert!(storage.exists("certs/a.com.crt").await);
    assert!(!storage.exists("a.com").await);
    assert!(!storage.exists("certs/a.com").await);
    assert!(!storage.exists("certs").await);
}

#[tokio::test]
async fn exists_on_invalid_key_is_false() {
    let storage = single();
    assert!(!storage.exists("").await);
    assert!(!storage.exists("a//b").await);
}

// ============================================================================
// Stat
// ============================================================================

#[tokio::test]
async fn stat_reports_payload_size() {
    let storage = single();
    let key = cert_key("example.com", "crt");
    let payload = Bytes::from(vec![b'x'; 1500]);

    storage.store(&key, payload).await.unwrap();
    let info = storage.stat(&key).await.unwrap();

    assert_eq!(info.key, key);
    assert_eq!(info.size, 1500);
    assert!(info.is_terminal);
}

#[tokio::test]
async fn stat_missing_key_is_not_found() {
    let storage = single();
    assert!(storage.stat("acme/missing").await.unwrap_err().is_not_found());
}

// ============================================================================
// List
// ============================================================================

async fn seed_listing(storage: &impl Storage) {
    for key in [
        "certificates/a.com/a.com.crt",
        "certificates/a.com/a.com.key",
        "certificates/b.com/b.com.crt",
        "certificatesX/other",
        "acme/account.json",
    ] {
        storage.store(key, Bytes::from("x")).await.unwrap();
    }
}

#[tokio::test]
async fn list_recursive_honours_prefix() {
    let storage = single();
    seed_listing(&storage).await;

    let keys = storage.list("certificates", true).await.unwrap();
    assert_eq!(
        keys,
        vec![
            "certificates/a.com/a.com.crt",
            "certificates/a.com/a.com.key",
            "certificates/b.com/b.com.crt",
        ]
    );

    // Trailing separator is the same prefix
    assert_eq!(storage.list("certificates/", true).await.unwrap(), keys);
}

#[tokio::test]
async fn list_non_recursive_returns_immediate_children() {
    let storage = single();
    seed_listing(&storage).await;

    let children = storage.list("certificates", false).await.unwrap();
    assert_eq!(children, vec!["certificates/a.com", "certificates/b.com"]);

    let leaves = storage.list("certificates/a.com", false).await.unwrap();
    assert_eq!(
        leaves,
        vec!["certificates/a.com/a.com.crt", "certificates/a.com/a.com.key"]
    );
}

#[tokio::test]
async fn list_empty_prefix_covers_container() {
    let storage = single();
    seed_listing(&storage).await;

    assert_eq!(storage.list("", true).await.unwrap().len(), 5);
    assert_eq!(
        storage.list("", false).await.unwrap(),
        vec!["acme", "certificates", "certificatesX"]
    );
}

#[tokio::test]
async fn list_unknown_prefix_is_empty() {
    let storage = single();
    seed_listing(&storage).await;

    assert!(storage.list("nothing-here", true).await.unwrap().is_empty());
}

// ============================================================================
// Deadlines
// ============================================================================

#[tokio::test(start_paused = true)]
async fn lock_deadline_releases_granted_lease() {
    let leases = FlakyLeases::new().stall_acquire(Duration::from_secs(10));
    let p1 = leases.connect(&container_lock(), Some(Duration::from_secs(1)));

    let err = p1.lock("issue_cert_a.com").await.unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::Timeout(_))));

    // The lease was granted before the deadline hit; let the release run.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(leases.table.holder_of(&LeaseTarget::Container), None);

    // Another holder gets straight in
    leases
        .table
        .acquire(
            &LeaseTarget::Container,
            &HolderToken::generate(),
            LeaseDuration::Infinite,
        )
        .await
        .unwrap();
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn certificate_lifecycle() {
    let storage = single();
    let key = "certs/a.com/a.com.crt";

    storage.store(key, Bytes::from("CERTDATA")).await.unwrap();
    assert!(storage.exists(key).await);
    assert_eq!(storage.load(key).await.unwrap(), Bytes::from("CERTDATA"));

    storage.delete(key).await.unwrap();
    assert!(!storage.exists(key).await);
    assert!(storage.load(key).await.unwrap_err().is_not_found());
}
