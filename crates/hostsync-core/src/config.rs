//! Configuration types for the reconciliation system
//!
//! This module defines all configuration structures used throughout the
//! crate. The daemon assembles them from environment variables; they can
//! also be deserialized directly for embedded use.

use serde::{Deserialize, Serialize};

/// Main sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Router connection settings
    pub router: RouterConfig,

    /// IPAM connection settings
    pub ipam: IpamConfig,

    /// Host filter settings
    #[serde(default)]
    pub filter: FilterConfig,

    /// Path of the local snapshot cache file, if caching is enabled
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

impl SyncConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.router.validate()?;
        self.ipam.validate()?;
        Ok(())
    }
}

/// Router connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Base URL of the router's HTTP API, e.g. `"https://192.168.1.1"`
    pub url: String,

    /// API username
    pub username: String,

    /// API password
    pub password: String,
}

impl RouterConfig {
    /// Validate the router configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("router URL cannot be empty"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "router URL must use http or https: {}",
                self.url
            )));
        }
        Ok(())
    }
}

/// IPAM connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpamConfig {
    /// Protocol, `"http"` or `"https"`
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// IPAM hostname
    pub host: String,

    /// IPAM port
    #[serde(default = "default_port")]
    pub port: u16,

    /// API token
    pub token: String,

    /// Tenant id attached to created IP addresses
    #[serde(default)]
    pub tenant_id: Option<u64>,
}

impl IpamConfig {
    /// Validate the IPAM configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self.protocol.as_str() {
            "http" | "https" => {}
            other => {
                return Err(crate::Error::config(format!(
                    "IPAM protocol must be http or https, got {other:?}"
                )));
            }
        }
        if self.host.is_empty() {
            return Err(crate::Error::config("IPAM host cannot be empty"));
        }
        if self.token.is_empty() {
            return Err(crate::Error::config("IPAM token cannot be empty"));
        }
        Ok(())
    }

    /// Base URL of the IPAM instance
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Host filter settings
///
/// Both lists default to empty. `accept_list` is carried through to the
/// filter but not currently applied as a predicate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// IP addresses excluded from reconciliation
    #[serde(default)]
    pub ignore_list: Vec<String>,

    /// IP addresses explicitly accepted (reserved, not yet applied)
    #[serde(default)]
    pub accept_list: Vec<String>,
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_port() -> u16 {
    8000
}
