use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

use super::OpenStore;

/// Acquire the lock for `key`, keep it for `seconds`, then release it.
///
/// Lock and unlock only exist together here: every invocation has its own
/// holder token, so a lock taken by one run could never be released by
/// another.
pub async fn hold(store: &OpenStore, key: &str, seconds: u64) -> Result<()> {
    match store.storage.lock(key).await {
        Ok(()) => info!("Lock acquired for {}", key),
        Err(e) if e.is_lock_conflict() => anyhow::bail!("Lock for {} is held elsewhere", key),
        Err(e) => return Err(e.into()),
    }
    info!("Holding lock for {} for {}s (Ctrl-C releases early)", key, seconds);

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, releasing lock for {}", key);
        }
    }

    store.storage.unlock(key).await?;
    info!("Lock released for {}", key);
    Ok(())
}
