pub mod delete;
pub mod exists;
pub mod get;
pub mod list;
pub mod lock;
pub mod put;
pub mod stat;

use anyhow::{Context, Result};
use azblob_certstore_core::storage::StorageBackendConfig;
use azblob_certstore_core::{
    create_instrumented_storage, create_storage, Config, PrometheusMetrics, Storage,
};
use std::sync::Arc;
use tracing::debug;

/// Where the store comes from, as given on the command line.
pub struct StoreArgs {
    pub config: Option<String>,
    pub url: Option<String>,
    pub metrics: bool,
}

/// An opened store plus the metrics registry, when requested.
pub struct OpenStore {
    pub storage: Arc<dyn Storage>,
    metrics: Option<Arc<PrometheusMetrics>>,
}

impl OpenStore {
    /// Dump collected metrics to stderr, if enabled.
    pub fn print_metrics(&self) {
        if let Some(metrics) = &self.metrics {
            eprint!("{}", metrics.encode());
        }
    }
}

/// Resolve configuration and build the storage.
///
/// Without `--config` or `--url` the Azure credentials come entirely from
/// the `AZBLOB_*` environment variables.
pub fn open(args: &StoreArgs) -> Result<OpenStore> {
    let config = match (&args.config, &args.url) {
        (Some(path), _) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        (None, Some(url)) => Config::new(StorageBackendConfig::from_url(url)?),
        (None, None) => Config::new(StorageBackendConfig::azure("", "", "")),
    }
    .resolve_env();

    debug!("Resolved storage configuration: {:?}", config.storage);

    if args.metrics {
        let metrics = Arc::new(PrometheusMetrics::new());
        let storage = create_instrumented_storage(&config, metrics.clone())?;
        Ok(OpenStore {
            storage,
            metrics: Some(metrics),
        })
    } else {
        Ok(OpenStore {
            storage: create_storage(&config)?,
            metrics: None,
        })
    }
}
