use anyhow::{Context, Result};
use std::io::Write;
use tracing::info;

use super::OpenStore;

pub async fn run(store: &OpenStore, key: &str, output: Option<&str>) -> Result<()> {
    let data = match store.storage.load(key).await {
        Ok(data) => data,
        Err(e) if e.is_not_found() => anyhow::bail!("Key not found: {}", key),
        Err(e) => return Err(e.into()),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &data).with_context(|| format!("Failed to write {}", path))?;
            info!("Wrote {} ({} bytes) to {}", key, data.len(), path);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
