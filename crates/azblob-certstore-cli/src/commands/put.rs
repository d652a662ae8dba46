use anyhow::{bail, Context, Result};
use bytes::Bytes;
use tracing::info;

use super::OpenStore;

pub async fn run(
    store: &OpenStore,
    key: &str,
    file: Option<&str>,
    value: Option<&str>,
) -> Result<()> {
    let data = match (file, value) {
        (Some(path), _) => {
            Bytes::from(std::fs::read(path).with_context(|| format!("Failed to read {}", path))?)
        }
        (None, Some(value)) => Bytes::from(value.to_string()),
        (None, None) => bail!("Either --file or --value is required"),
    };

    let size = data.len();
    store.storage.store(key, data).await?;

    info!("Stored {} ({} bytes)", key, size);
    Ok(())
}
