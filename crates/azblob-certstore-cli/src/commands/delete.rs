use anyhow::Result;
use tracing::info;

use super::OpenStore;

pub async fn run(store: &OpenStore, key: &str) -> Result<()> {
    match store.storage.delete(key).await {
        Ok(()) => {
            info!("Deleted {}", key);
            Ok(())
        }
        Err(e) if e.is_not_found() => anyhow::bail!("Key not found: {}", key),
        Err(e) => Err(e.into()),
    }
}
