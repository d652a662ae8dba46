use anyhow::Result;
use tracing::info;

use super::OpenStore;

pub async fn run(store: &OpenStore, prefix: &str, recursive: bool) -> Result<()> {
    info!("Listing keys under '{}' (recursive: {})", prefix, recursive);
    let keys = store.storage.list(prefix, recursive).await?;

    if keys.is_empty() {
        info!("No keys found under '{}'", prefix);
    }
    for key in keys {
        println!("{}", key);
    }

    Ok(())
}
