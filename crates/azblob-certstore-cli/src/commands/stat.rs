use anyhow::Result;

use super::OpenStore;

/// Stat command output format
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

pub async fn run(store: &OpenStore, key: &str, format: &str) -> Result<()> {
    let info = match store.storage.stat(key).await {
        Ok(info) => info,
        Err(e) if e.is_not_found() => anyhow::bail!("Key not found: {}", key),
        Err(e) => return Err(e.into()),
    };

    match OutputFormat::from(format) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Text => {
            println!("Key:      {}", info.key);
            println!("Size:     {}", format_bytes(info.size));
            println!(
                "Modified: {}",
                info.modified.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("Terminal: {}", info.is_terminal);
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
