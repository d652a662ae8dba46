//! Certificate storage over an object store and a lease client.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore, PutMode, PutOptions, PutPayload};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::keys::{blob_path, prefix_path};
use super::{KeyInfo, Storage};
use crate::config::LockScope;
use crate::error::StorageError;
use crate::lease::{HolderToken, LeaseClient, LeaseDuration, LeaseLock, LeaseTarget};
use crate::{Error, Result};

/// Storage contract implementation shared by every backend.
///
/// Content operations go to the object store; `lock`/`unlock` go to the
/// lease client under this instance's holder token. Backends differ only in
/// which store and lease client they plug in.
pub struct BlobStorage {
    store: Arc<dyn ObjectStore>,
    lock: LeaseLock,
    label: String,
    timeout: Option<Duration>,
}

impl BlobStorage {
    /// Assemble a backend.
    ///
    /// `label` names the backend in logs and error messages ("Azure",
    /// "Memory").
    pub fn new(
        store: Arc<dyn ObjectStore>,
        leases: Arc<dyn LeaseClient>,
        label: impl Into<String>,
        scope: LockScope,
        lease_duration: Option<Duration>,
    ) -> Self {
        Self {
            store,
            lock: LeaseLock::new(leases, scope, LeaseDuration::from_option(lease_duration)),
            label: label.into(),
            timeout: None,
        }
    }

    /// Bound every remote call by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Holder token used for this instance's leases.
    pub fn holder(&self) -> HolderToken {
        self.lock.holder()
    }

    /// The underlying object store.
    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Run `fut` under the configured deadline.
    async fn deadline<T, F>(&self, op: &str, key: &str, fut: F) -> Result<T>
    where
        T: Send,
        F: Future<Output = Result<T>> + Send,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                Error::Storage(StorageError::Timeout(format!(
                    "{} {} {} exceeded {:?}",
                    self.label, op, key, limit
                )))
            })?,
            None => fut.await,
        }
    }

    fn backend_error(&self, op: &str, e: object_store::Error) -> Error {
        Error::Storage(StorageError::Backend(format!(
            "{} {} failed: {}",
            self.label, op, e
        )))
    }

    fn map_read_error(&self, op: &str, key: &str, e: object_store::Error) -> Error {
        match e {
            object_store::Error::NotFound { .. } => {
                Error::Storage(StorageError::NotFound(key.to_string()))
            }
            _ => self.backend_error(op, e),
        }
    }

    async fn head(&self, key: &str, path: &Path) -> Result<ObjectMeta> {
        debug!("{} HEAD: {}", self.label, path);
        self.store
            .head(path)
            .await
            .map_err(|e| self.map_read_error("HEAD", key, e))
    }

    async fn get(&self, key: &str, path: &Path) -> Result<Bytes> {
        debug!("{} GET: {}", self.label, path);
        let result = self
            .store
            .get(path)
            .await
            .map_err(|e| self.map_read_error("GET", key, e))?;

        result.bytes().await.map_err(|e| {
            Error::Storage(StorageError::Backend(format!(
                "Failed to read {} response: {}",
                self.label, e
            )))
        })
    }

    /// Create the empty blob a key-scoped lease is taken on, if missing.
    async fn ensure_lock_blob(&self, name: &str) -> Result<()> {
        let path = blob_path(name)?;
        let opts = PutOptions {
            mode: PutMode::Create,
            ..Default::default()
        };

        let result = self
            .store
            .put_opts(&path, PutPayload::from_bytes(Bytes::new()), opts)
            .await;
        match result {
            Ok(_) | Err(object_store::Error::AlreadyExists { .. }) => Ok(()),
            Err(e) => Err(self.backend_error("PUT", e)),
        }
    }

    async fn list_recursive(&self, prefix: Option<&Path>) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut stream = self.store.list(prefix);

        while let Some(result) = stream.next().await {
            match result {
                Ok(meta) => keys.push(meta.location.to_string()),
                Err(e) => return Err(self.backend_error("LIST", e)),
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn list_children(&self, prefix: Option<&Path>) -> Result<Vec<String>> {
        let listing = self
            .store
            .list_with_delimiter(prefix)
            .await
            .map_err(|e| self.backend_error("LIST", e))?;

        let keys: BTreeSet<String> = listing
            .common_prefixes
            .iter()
            .map(|p| p.to_string())
            .chain(listing.objects.iter().map(|m| m.location.to_string()))
            .collect();
        Ok(keys.into_iter().collect())
    }
}

#[async_trait]
impl Storage for BlobStorage {
    async fn store(&self, key: &str, value: Bytes) -> Result<()> {
        let path = blob_path(key)?;
        debug!("{} PUT: {} ({} bytes)", self.label, path, value.len());

        self.deadline("PUT", key, async {
            self.store
                .put(&path, PutPayload::from_bytes(value))
                .await
                .map_err(|e| self.backend_error("PUT", e))?;
            Ok(())
        })
        .await
    }

    async fn load(&self, key: &str) -> Result<Bytes> {
        let path = blob_path(key)?;
        self.deadline("GET", key, self.get(key, &path)).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = blob_path(key)?;

        self.deadline("DELETE", key, async {
            // HEAD first: some stores treat deleting a missing blob as success.
            self.head(key, &path).await?;

            debug!("{} DELETE: {}", self.label, path);
            self.store
                .delete(&path)
                .await
                .map_err(|e| self.map_read_error("DELETE", key, e))
        })
        .await
    }

    async fn exists(&self, key: &str) -> bool {
        let path = match blob_path(key) {
            Ok(path) => path,
            Err(e) => {
                warn!("{} exists check on invalid key: {}", self.label, e);
                return false;
            }
        };

        match self.deadline("HEAD", key, self.head(key, &path)).await {
            Ok(_) => true,
            Err(e) if e.is_not_found() => false,
            Err(e) => {
                warn!("{} exists check for {} failed: {}", self.label, key, e);
                false
            }
        }
    }

    async fn list(&self, prefix: &str, recursive: bool) -> Result<Vec<String>> {
        let location = prefix_path(prefix)?;
        debug!(
            "{} LIST: {:?} (recursive: {})",
            self.label, location, recursive
        );

        self.deadline("LIST", prefix, async {
            if recursive {
                self.list_recursive(location.as_ref()).await
            } else {
                self.list_children(location.as_ref()).await
            }
        })
        .await
    }

    async fn stat(&self, key: &str) -> Result<KeyInfo> {
        let path = blob_path(key)?;

        self.deadline("STAT", key, async {
            let meta = self.head(key, &path).await?;
            // Size is the length of what a load actually returns.
            let data = self.get(key, &path).await?;

            Ok(KeyInfo {
                key: key.to_string(),
                modified: meta.last_modified,
                size: data.len() as u64,
                is_terminal: true,
            })
        })
        .await
    }

    async fn lock(&self, key: &str) -> Result<()> {
        // On expiry the dropped acquire releases whatever it may have been granted.
        self.deadline("LOCK", key, async {
            if let LeaseTarget::Blob(name) = self.lock.target_for(key) {
                self.ensure_lock_blob(&name).await?;
            }
            self.lock.lock(key).await
        })
        .await
    }

    async fn unlock(&self, key: &str) -> Result<()> {
        self.deadline("UNLOCK", key, self.lock.unlock(key)).await
    }
}
