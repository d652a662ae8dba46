//! Azure Blob Storage backend.

use object_store::azure::MicrosoftAzureBuilder;
use object_store::ObjectStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::BlobStorage;
use crate::config::LockConfig;
use crate::lease::AzureLeaseClient;
use crate::{Error, Result};

/// Azure Blob Storage backend configuration
#[derive(Clone)]
pub struct AzureConfig {
    /// Azure storage account name
    pub account_name: String,
    /// Storage account shared key (base64)
    pub account_key: String,
    /// Azure blob container name
    pub container_name: String,
    /// Custom endpoint URL (Azurite, sovereign clouds)
    pub endpoint: Option<String>,
    /// Allow HTTP (insecure) connections
    pub allow_http: bool,
}

/// A provisioned Azure container.
///
/// Holds the blob client and the lease client for one container. Each
/// [`AzureBackend::connect`] call yields a storage instance with its own
/// holder token, so two connections contend for locks exactly like two
/// processes would.
pub struct AzureBackend {
    store: Arc<dyn ObjectStore>,
    leases: Arc<AzureLeaseClient>,
    account_name: String,
    container_name: String,
}

impl AzureBackend {
    /// Provision the Azure clients.
    ///
    /// Fails with `Error::Config` when a required field is blank, the key is
    /// not base64, or the endpoint does not parse.
    pub fn new(config: AzureConfig) -> Result<Self> {
        for (name, value) in [
            ("account_name", &config.account_name),
            ("account_key", &config.account_key),
            ("container_name", &config.container_name),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("Azure {} is required", name)));
            }
        }

        // Rejects a non-base64 key or a malformed endpoint up front.
        let leases = AzureLeaseClient::new(
            &config.account_name,
            &config.account_key,
            &config.container_name,
            config.endpoint.as_deref(),
        )?;

        let mut builder = MicrosoftAzureBuilder::new()
            .with_account(&config.account_name)
            .with_access_key(&config.account_key)
            .with_container_name(&config.container_name)
            .with_allow_http(config.allow_http);

        // Custom endpoint for Azurite or sovereign clouds
        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint.clone());
            debug!("Azure endpoint override: {}", endpoint);
        }

        let store = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create Azure client: {}", e)))?;

        info!(
            "Created Azure backend for account: {}, container: {}, endpoint: {:?}",
            config.account_name, config.container_name, config.endpoint
        );

        Ok(Self {
            store: Arc::new(store),
            leases: Arc::new(leases),
            account_name: config.account_name,
            container_name: config.container_name,
        })
    }

    /// A storage instance with a fresh holder token.
    pub fn connect(&self, lock: &LockConfig, timeout: Option<Duration>) -> BlobStorage {
        BlobStorage::new(
            Arc::clone(&self.store),
            self.leases.clone(),
            format!("Azure[{}/{}]", self.account_name, self.container_name),
            lock.scope,
            lock.lease_duration(),
        )
        .with_timeout(timeout)
    }
}
