// # RouterOS Host Source
//
// This crate implements the `HostSource` trait against a MikroTik
// RouterOS REST API: the DHCP lease table is the router's known-hosts
// list.
//
// ## Scope
//
// One GET per run, HTTP basic auth, typed lease decoding, and the
// lease-to-host mapping. No filtering (owned by the host filter), no
// retries, no state.
//
// ## API Reference
//
// - Leases: `GET /rest/ip/dhcp-server/lease`

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use hostsync_core::config::RouterConfig;
use hostsync_core::host::HostRecord;
use hostsync_core::traits::HostSource;
use hostsync_core::{Error, Result};

/// Default HTTP timeout for router requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A lease is considered active when the router reports this status
const LEASE_STATUS_BOUND: &str = "bound";

/// One entry from the router's DHCP lease table
#[derive(Debug, Clone, Deserialize)]
pub struct Lease {
    /// Leased IP address
    #[serde(default)]
    pub address: String,

    /// Client MAC address
    #[serde(default, rename = "mac-address")]
    pub mac_address: String,

    /// Hostname the client announced, if any
    #[serde(default, rename = "host-name")]
    pub host_name: String,

    /// Lease state (`bound`, `waiting`, ...)
    #[serde(default)]
    pub status: String,

    /// Operator-assigned comment; preferred over the announced hostname
    #[serde(default)]
    pub comment: String,
}

impl Lease {
    /// The name this lease joins against IPAM with
    ///
    /// Operator comments win over client-announced hostnames; a lease with
    /// neither falls back to its MAC so the record is still addressable.
    fn display_name(&self) -> &str {
        if !self.comment.is_empty() {
            &self.comment
        } else if !self.host_name.is_empty() {
            &self.host_name
        } else {
            &self.mac_address
        }
    }
}

impl From<&Lease> for HostRecord {
    fn from(lease: &Lease) -> Self {
        HostRecord::new(
            lease.status == LEASE_STATUS_BOUND,
            lease.address.clone(),
            lease.mac_address.clone(),
            lease.display_name(),
        )
    }
}

/// RouterOS-backed host source
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the password.
pub struct RouterOsHostSource {
    /// Base URL of the router, e.g. `"https://192.168.1.1"`
    base_url: String,

    /// API username
    username: String,

    /// API password; never logged
    password: String,

    /// HTTP client
    client: reqwest::Client,
}

impl std::fmt::Debug for RouterOsHostSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterOsHostSource")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

impl RouterOsHostSource {
    /// Create a host source from the router configuration
    pub fn new(config: &RouterConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            client,
        })
    }

    /// Fetch the raw lease table
    pub async fn get_leases(&self) -> Result<Vec<Lease>> {
        let url = format!("{}/rest/ip/dhcp-server/lease", self.base_url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| Error::router(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::router(format!(
                "lease query returned {status} for {url}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::router(format!("failed to read response: {e}")))?;
        let leases: Vec<Lease> = serde_json::from_str(&body)
            .map_err(|e| Error::decode(format!("unexpected lease payload: {e}")))?;

        tracing::debug!(count = leases.len(), "lease table fetched");
        Ok(leases)
    }
}

#[async_trait]
impl HostSource for RouterOsHostSource {
    async fn get_hosts(&self) -> Result<Vec<HostRecord>> {
        let leases = self.get_leases().await?;
        let hosts: Vec<HostRecord> = leases.iter().map(HostRecord::from).collect();
        tracing::info!(hosts = hosts.len(), "router snapshot fetched");
        Ok(hosts)
    }

    fn source_name(&self) -> &'static str {
        "routeros"
    }
}
