//! Azure Blob Storage lease client.
//!
//! Issues `PUT ...?comp=lease` requests authenticated with the storage
//! account's shared key. Outcomes are classified from the HTTP status and
//! the `x-ms-error-code` response header.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_LENGTH;
use reqwest::StatusCode;
use sha2::Sha256;
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

use super::{HolderToken, LeaseClient, LeaseDuration, LeaseTarget};
use crate::error::LockError;
use crate::{Error, Result};

/// REST API version sent with every lease request.
const API_VERSION: &str = "2021-08-06";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy)]
enum LeaseAction {
    Acquire(LeaseDuration),
    Renew,
    Release,
}

impl LeaseAction {
    fn name(&self) -> &'static str {
        match self {
            LeaseAction::Acquire(_) => "acquire",
            LeaseAction::Renew => "renew",
            LeaseAction::Release => "release",
        }
    }
}

/// Lease client for one container of one storage account.
pub struct AzureLeaseClient {
    http: reqwest::Client,
    account: String,
    key: Vec<u8>,
    base_url: Url,
    container: String,
}

impl AzureLeaseClient {
    /// Create a lease client.
    ///
    /// `account_key` is the base64 shared key. `endpoint` overrides the
    /// default `https://<account>.blob.core.windows.net`, e.g. for Azurite.
    pub fn new(
        account: &str,
        account_key: &str,
        container: &str,
        endpoint: Option<&str>,
    ) -> Result<Self> {
        let key = STANDARD
            .decode(account_key.trim())
            .map_err(|e| Error::Config(format!("Azure account key is not valid base64: {}", e)))?;

        let endpoint = endpoint
            .map(str::to_string)
            .unwrap_or_else(|| format!("https://{}.blob.core.windows.net", account));
        let base_url = Url::parse(&endpoint)
            .map_err(|e| Error::Config(format!("Invalid blob endpoint {}: {}", endpoint, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Invalid blob endpoint {}", endpoint)));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            account: account.to_string(),
            key,
            base_url,
            container: container.to_string(),
        })
    }

    /// Request URL for a lease on `target`.
    fn lease_url(&self, target: &LeaseTarget) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.container);
            if let LeaseTarget::Blob(name) = target {
                segments.extend(name.split('/'));
            }
        }

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("comp", "lease");
            if *target == LeaseTarget::Container {
                query.append_pair("restype", "container");
            }
        }
        url
    }

    async fn send(
        &self,
        target: &LeaseTarget,
        holder: &HolderToken,
        action: LeaseAction,
    ) -> Result<()> {
        let url = self.lease_url(target);

        let mut headers = BTreeMap::new();
        headers.insert("x-ms-date".to_string(), http_date());
        headers.insert("x-ms-version".to_string(), API_VERSION.to_string());
        headers.insert("x-ms-lease-action".to_string(), action.name().to_string());
        match action {
            LeaseAction::Acquire(duration) => {
                headers.insert("x-ms-lease-duration".to_string(), duration.header_value());
                headers.insert("x-ms-proposed-lease-id".to_string(), holder.to_string());
            }
            LeaseAction::Renew | LeaseAction::Release => {
                headers.insert("x-ms-lease-id".to_string(), holder.to_string());
            }
        }

        let signature = sign(
            &self.key,
            &string_to_sign("PUT", &headers, &self.account, &url),
        )?;

        debug!("Azure LEASE {}: {}", action.name(), url);

        let mut request = self
            .http
            .put(url)
            .header(CONTENT_LENGTH, "0")
            .header(
                "Authorization",
                format!("SharedKey {}:{}", self.account, signature),
            );
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .body(Vec::<u8>::new())
            .send()
            .await
            .map_err(|e| LockError::Transport(format!("Azure LEASE {} failed: {}", action.name(), e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let code = response
            .headers()
            .get("x-ms-error-code")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Err(classify_failure(status, &code, target).into())
    }
}

#[async_trait]
impl LeaseClient for AzureLeaseClient {
    async fn acquire(
        &self,
        target: &LeaseTarget,
        holder: &HolderToken,
        duration: LeaseDuration,
    ) -> Result<()> {
        self.send(target, holder, LeaseAction::Acquire(duration)).await
    }

    async fn renew(&self, target: &LeaseTarget, holder: &HolderToken) -> Result<()> {
        self.send(target, holder, LeaseAction::Renew).await
    }

    async fn release(&self, target: &LeaseTarget, holder: &HolderToken) -> Result<()> {
        self.send(target, holder, LeaseAction::Release).await
    }
}

/// Map a failed lease response to a lock error.
fn classify_failure(status: StatusCode, code: &str, target: &LeaseTarget) -> LockError {
    match code {
        "LeaseAlreadyPresent" | "LeaseIsBreakingAndCannotBeAcquired" => LockError::Conflict {
            target: target.to_string(),
        },
        "LeaseNotPresentWithLeaseOperation"
        | "LeaseIdMismatchWithLeaseOperation"
        | "LeaseIsBrokenAndCannotBeRenewed"
        | "LeaseLost" => LockError::NotHeld {
            target: target.to_string(),
        },
        "" => LockError::Transport(format!("{} on {}", status, target)),
        code => LockError::Transport(format!("{} ({}) on {}", status, code, target)),
    }
}

/// Current time in the RFC 1123 form the service expects in `x-ms-date`.
fn http_date() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Shared-key string-to-sign for a body-less request.
///
/// Eleven standard headers (all empty here, Content-Length included since it
/// is zero) follow the verb, then the canonicalized `x-ms-*` headers and the
/// canonicalized resource.
fn string_to_sign(
    method: &str,
    ms_headers: &BTreeMap<String, String>,
    account: &str,
    url: &Url,
) -> String {
    let mut out = String::new();
    out.push_str(method);
    out.push('\n');
    out.push_str(&"\n".repeat(11));

    for (name, value) in ms_headers {
        out.push_str(&name.to_ascii_lowercase());
        out.push(':');
        out.push_str(value.trim());
        out.push('\n');
    }

    out.push('/');
    out.push_str(account);
    out.push_str(url.path());

    let query: BTreeMap<String, String> = url
        .query_pairs()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.into_owned()))
        .collect();
    for (name, value) in query {
        out.push('\n');
        out.push_str(&name);
        out.push(':');
        out.push_str(&value);
    }
    out
}

fn sign(key: &[u8], string_to_sign: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::Config(format!("Invalid signing key: {}", e)))?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
