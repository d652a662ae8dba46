//! Mapping between logical keys and blob names.
//!
//! Keys map to blob names unchanged. The object store namespace is flat, so
//! hierarchical listing is emulated on top of `/`-delimited names.

use object_store::path::Path;

use crate::error::StorageError;

/// Prefix under which key-scoped lock blobs live.
pub const LOCK_PREFIX: &str = "locks";

/// Blob path for a logical key.
///
/// Rejects keys the store cannot address: empty keys, empty inner segments
/// (`a//b`) and `.`/`..` segments. A single leading or trailing `/` is
/// dropped by the store's own path rules.
pub fn blob_path(key: &str) -> Result<Path, StorageError> {
    let path =
        Path::parse(key).map_err(|e| StorageError::InvalidKey(format!("{}: {}", key, e)))?;
    if path.as_ref().is_empty() {
        return Err(StorageError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(path)
}

/// Listing prefix for a logical prefix. An empty prefix lists everything.
///
/// Trailing separators are tolerated since callers commonly pass
/// `certificates/` to mean the `certificates` directory.
pub fn prefix_path(prefix: &str) -> Result<Option<Path>, StorageError> {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(None);
    }
    blob_path(trimmed).map(Some)
}

/// Name of the blob whose lease guards `key` when locks are key-scoped.
pub fn lock_blob_name(key: &str) -> String {
    format!("{}/{}.lock", LOCK_PREFIX, key.trim_matches('/'))
}
