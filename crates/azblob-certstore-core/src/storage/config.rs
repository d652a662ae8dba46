//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable consulted when `account_name` is blank.
pub const ENV_ACCOUNT_NAME: &str = "AZBLOB_ACCOUNT_NAME";
/// Environment variable consulted when `account_key` is blank.
pub const ENV_ACCOUNT_KEY: &str = "AZBLOB_ACCOUNT_KEY";
/// Environment variable consulted when `container_name` is blank.
pub const ENV_CONTAINER_NAME: &str = "AZBLOB_ACCOUNT_CONTAINER_NAME";

/// Storage backend configuration using tagged enum for type-safe configuration.
///
/// Supports two backends:
/// - Azure Blob Storage (shared key authentication)
/// - In-memory (for testing)
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "backend")]
pub enum StorageBackendConfig {
    /// Azure Blob Storage
    #[serde(rename = "azure")]
    Azure {
        /// Storage account name (falls back to AZBLOB_ACCOUNT_NAME)
        #[serde(default)]
        account_name: String,
        /// Storage account shared key, base64 (falls back to AZBLOB_ACCOUNT_KEY)
        #[serde(default)]
        account_key: String,
        /// Blob container name (falls back to AZBLOB_ACCOUNT_CONTAINER_NAME)
        #[serde(default)]
        container_name: String,
        /// Custom blob endpoint, e.g. `http://127.0.0.1:10000/devstoreaccount1` for Azurite
        #[serde(default)]
        endpoint: Option<String>,
        /// Allow HTTP (insecure) connections
        #[serde(default)]
        allow_http: bool,
    },

    /// In-memory storage (for testing)
    #[serde(rename = "memory")]
    Memory,
}

impl StorageBackendConfig {
    /// Azure configuration from its three required fields.
    pub fn azure(
        account_name: impl Into<String>,
        account_key: impl Into<String>,
        container_name: impl Into<String>,
    ) -> Self {
        Self::Azure {
            account_name: account_name.into(),
            account_key: account_key.into(),
            container_name: container_name.into(),
            endpoint: None,
            allow_http: false,
        }
    }

    /// Parse configuration from a URL string
    ///
    /// Supported URL formats:
    /// - `azblob://container@account` (or `account.blob.core.windows.net`)
    /// - `azblob://account/container`
    /// - `memory://`
    ///
    /// The account key is never part of the URL; it comes from the
    /// environment through [`StorageBackendConfig::resolve_env`].
    pub fn from_url(url: &str) -> crate::Result<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|e| crate::Error::Config(format!("Invalid storage URL: {}", e)))?;

        match parsed.scheme() {
            "azblob" | "azure" | "az" => {
                let host = parsed.host_str().unwrap_or_default();
                let account_name = host.split('.').next().unwrap_or(host).to_string();
                let container_name = if parsed.username().is_empty() {
                    parsed.path().trim_matches('/').to_string()
                } else {
                    parsed.username().to_string()
                };

                Ok(Self::Azure {
                    account_name,
                    account_key: String::new(),
                    container_name,
                    endpoint: None,
                    allow_http: false,
                })
            }
            "memory" => Ok(Self::Memory),
            scheme => Err(crate::Error::Config(format!(
                "Unknown storage scheme: {}",
                scheme
            ))),
        }
    }

    /// Fill blank Azure fields from the process environment.
    pub fn resolve_env(self) -> Self {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Fill blank Azure fields using `lookup` for environment values.
    ///
    /// Explicit values always win; the lookup is only consulted for fields
    /// that are empty.
    pub fn resolve_with<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            Self::Azure {
                account_name,
                account_key,
                container_name,
                endpoint,
                allow_http,
            } => {
                let fill = |value: String, var: &str| {
                    if value.is_empty() {
                        lookup(var).unwrap_or_default()
                    } else {
                        value
                    }
                };
                Self::Azure {
                    account_name: fill(account_name, ENV_ACCOUNT_NAME),
                    account_key: fill(account_key, ENV_ACCOUNT_KEY),
                    container_name: fill(container_name, ENV_CONTAINER_NAME),
                    endpoint,
                    allow_http,
                }
            }
            Self::Memory => Self::Memory,
        }
    }

    /// Check that every required field is present.
    pub fn validate(&self) -> crate::Result<()> {
        if let Self::Azure {
            account_name,
            account_key,
            container_name,
            ..
        } = self
        {
            let missing: Vec<&str> = [
                ("account_name", account_name),
                ("account_key", account_key),
                ("container_name", container_name),
            ]
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

            if !missing.is_empty() {
                return Err(crate::Error::Config(format!(
                    "Azure storage requires {} (set in config or via {}, {}, {})",
                    missing.join(", "),
                    ENV_ACCOUNT_NAME,
                    ENV_ACCOUNT_KEY,
                    ENV_CONTAINER_NAME
                )));
            }
        }
        Ok(())
    }

    /// Short backend name used for metric labels and logs.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Azure { .. } => "azure",
            Self::Memory => "memory",
        }
    }
}

// Hand-written so the shared key never reaches a log line.
impl fmt::Debug for StorageBackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Azure {
                account_name,
                account_key,
                container_name,
                endpoint,
                allow_http,
            } => f
                .debug_struct("Azure")
                .field("account_name", account_name)
                .field(
                    "account_key",
                    &if account_key.is_empty() { "" } else { "<redacted>" },
                )
                .field("container_name", container_name)
                .field("endpoint", endpoint)
                .field("allow_http", allow_http)
                .finish(),
            Self::Memory => f.write_str("Memory"),
        }
    }
}
