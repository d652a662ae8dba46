//! Storage contract and backend implementations.
//!
//! This module provides the key-value-with-locking contract a certificate
//! manager persists through, and the backends that implement it:
//!
//! - **Azure**: Azure Blob Storage, with container or blob leases for locking
//! - **Memory**: In-memory storage and lease table (for testing)

mod azure;
mod backend;
mod blob;
mod config;
pub mod keys;
mod memory;

pub use azure::{AzureBackend, AzureConfig};
pub use backend::{KeyInfo, Storage};
pub use blob::BlobStorage;
pub use config::{StorageBackendConfig, ENV_ACCOUNT_KEY, ENV_ACCOUNT_NAME, ENV_CONTAINER_NAME};
pub use memory::MemoryBackend;

use crate::config::Config;
use crate::Result;
use std::sync::Arc;

/// Create a storage backend from configuration.
///
/// The configuration is validated first, so missing credentials surface as
/// `Error::Config` rather than on the first remote call. Environment fallback
/// is the caller's choice (see [`Config::resolve_env`]).
///
/// # Example
///
/// ```rust,ignore
/// use azblob_certstore_core::{create_storage, Config, StorageBackendConfig};
///
/// let config = Config::new(StorageBackendConfig::Memory);
/// let storage = create_storage(&config)?;
/// ```
pub fn create_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    config.validate()?;
    let timeout = config.operation_timeout();

    match &config.storage {
        StorageBackendConfig::Azure {
            account_name,
            account_key,
            container_name,
            endpoint,
            allow_http,
        } => {
            let azure_config = AzureConfig {
                account_name: account_name.clone(),
                account_key: account_key.clone(),
                container_name: container_name.clone(),
                endpoint: endpoint.clone(),
                allow_http: *allow_http,
            };
            let backend = AzureBackend::new(azure_config)?;
            Ok(Arc::new(backend.connect(&config.lock, timeout)))
        }

        StorageBackendConfig::Memory => {
            Ok(Arc::new(MemoryBackend::new().connect(&config.lock, timeout)))
        }
    }
}
