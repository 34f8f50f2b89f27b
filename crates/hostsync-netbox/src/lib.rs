// # NetBox IPAM Backend
//
// This crate implements the `IpamStore` trait against the NetBox REST API.
//
// ## Scope
//
// A thin request/response wrapper: one HTTP call per trait method, typed
// decoding at this boundary, no matching or caching logic (owned by the
// reconciler), no retries (every call is attempted exactly once).
//
// ## Session
//
// The client owns one `reqwest::Client` with a cookie store. The
// `Authorization: Token <t>` header is attached to requests and the
// session cookie NetBox hands back is carried automatically on subsequent
// calls. Nothing about the session is global; drop the client, drop the
// session.
//
// ## API Reference
//
// - IP addresses: `/api/ipam/ip-addresses/`
// - MAC addresses: `/api/dcim/mac-addresses/`
// - Interfaces: `/api/dcim/interfaces/`
// - Status: `/api/status/`

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use hostsync_core::config::IpamConfig;
use hostsync_core::ipam::{
    INTERFACE_OBJECT_TYPE, InterfaceRecord, IpAddressRecord, IpamStatus, MacAddressRecord,
    ObjectRef,
};
use hostsync_core::traits::IpamStore;
use hostsync_core::{Error, Result};

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// NetBox IPAM backend
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct NetBoxIpam {
    /// Base URL without trailing slash, e.g. `"http://ipam.lan:8000"`
    base_url: String,

    /// API token; never logged
    token: String,

    /// Tenant attached to created IP addresses
    tenant_id: Option<u64>,

    /// HTTP client carrying the session cookie
    client: reqwest::Client,
}

impl std::fmt::Debug for NetBoxIpam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetBoxIpam")
            .field("base_url", &self.base_url)
            .field("token", &"<REDACTED>")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

impl NetBoxIpam {
    /// Create a client from the IPAM configuration
    pub fn new(config: &IpamConfig) -> Result<Self> {
        config.validate()?;
        Self::with_base_url(config.base_url(), &config.token, config.tenant_id)
    }

    /// Create a client against an explicit base URL
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        tenant_id: Option<u64>,
    ) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::config("IPAM token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .cookie_store(true)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            tenant_id,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Map an unexpected status to a typed error, reading the body for
    /// context
    async fn expect_status(
        response: reqwest::Response,
        expected: StatusCode,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status == expected {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error response".to_string());

        Err(match status.as_u16() {
            401 | 403 => Error::auth(format!("IPAM rejected the token ({status})")),
            404 => Error::not_found(body),
            _ => Error::api(status.as_u16(), body),
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let body = response
            .text()
            .await
            .map_err(|e| Error::ipam(format!("failed to read response: {e}")))?;
        serde_json::from_str(&body).map_err(|e| Error::decode(format!("unexpected IPAM payload: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(|e| Error::ipam(format!("GET {path} failed: {e}")))?;
        let response = Self::expect_status(response, StatusCode::OK).await?;
        Self::decode(response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(self.url(path))
            .header(AUTHORIZATION, self.auth_header())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::ipam(format!("POST {path} failed: {e}")))?;
        let response = Self::expect_status(response, StatusCode::CREATED).await?;
        Self::decode(response).await
    }

    async fn patch_json<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        let response = self
            .client
            .patch(self.url(path))
            .header(AUTHORIZATION, self.auth_header())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::ipam(format!("PATCH {path} failed: {e}")))?;
        let response = Self::expect_status(response, StatusCode::OK).await?;
        Self::decode(response).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(path))
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(|e| Error::ipam(format!("DELETE {path} failed: {e}")))?;
        Self::expect_status(response, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    fn create_ip_body(&self, address: &str, dns_name: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "address": address,
            "dns_name": dns_name,
            "status": "reserved",
        });
        if let Some(tenant) = self.tenant_id {
            body["tenant"] = serde_json::json!({ "id": tenant });
        }
        body
    }
}

// ---------------------------------------------------------------------------
// Wire types
//
// NetBox's serializers are decoded into these shapes and converted to the
// core records. A payload missing a required field is a decode error, not
// a silent default.

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    count: u64,
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct WireFamily {
    value: u8,
}

#[derive(Debug, Deserialize)]
struct WireIpAddress {
    id: u64,
    address: String,
    dns_name: String,
    family: WireFamily,
    assigned_object_type: Option<String>,
    assigned_object_id: Option<u64>,
}

impl From<WireIpAddress> for IpAddressRecord {
    fn from(wire: WireIpAddress) -> Self {
        Self {
            id: wire.id,
            address: wire.address,
            dns_name: wire.dns_name,
            family: wire.family.value,
            assigned_object: wire.assigned_object_id.map(|id| ObjectRef { id }),
            assigned_object_type: wire.assigned_object_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMacAddress {
    id: u64,
    mac_address: String,
    // Absent in the brief list serializer
    #[serde(default)]
    assigned_object_id: Option<u64>,
}

impl From<WireMacAddress> for MacAddressRecord {
    fn from(wire: WireMacAddress) -> Self {
        Self {
            id: wire.id,
            mac_address: wire.mac_address,
            assigned_object_id: wire.assigned_object_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireInterface {
    id: u64,
    name: String,
    mac_address: Option<String>,
}

impl From<WireInterface> for InterfaceRecord {
    fn from(wire: WireInterface) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            mac_address: wire.mac_address,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    #[serde(rename = "netbox-version")]
    version: String,
}

#[async_trait]
impl IpamStore for NetBoxIpam {
    async fn list_ip_addresses(&self) -> Result<Vec<IpAddressRecord>> {
        let envelope: ListEnvelope<WireIpAddress> =
            self.get_json("/api/ipam/ip-addresses/?limit=0").await?;
        tracing::debug!(count = envelope.count, "IP-address inventory fetched");
        Ok(envelope.results.into_iter().map(Into::into).collect())
    }

    async fn create_ip_address(&self, address: &str, dns_name: &str) -> Result<IpAddressRecord> {
        let body = self.create_ip_body(address, dns_name);
        let wire: WireIpAddress = self.post_json("/api/ipam/ip-addresses/", &body).await?;
        Ok(wire.into())
    }

    async fn update_ip_address(&self, id: u64, address: &str, dns_name: &str) -> Result<IpAddressRecord> {
        let body = serde_json::json!({ "address": address, "dns_name": dns_name });
        let wire: WireIpAddress = self
            .patch_json(&format!("/api/ipam/ip-addresses/{id}/"), &body)
            .await?;
        Ok(wire.into())
    }

    async fn delete_ip_address(&self, id: u64) -> Result<()> {
        self.delete(&format!("/api/ipam/ip-addresses/{id}/")).await
    }

    async fn list_mac_addresses(&self, limit: usize) -> Result<Vec<MacAddressRecord>> {
        let envelope: ListEnvelope<WireMacAddress> = self
            .get_json(&format!("/api/dcim/mac-addresses/?limit={limit}&brief=1"))
            .await?;
        tracing::debug!(count = envelope.count, "MAC-address inventory fetched");
        Ok(envelope.results.into_iter().map(Into::into).collect())
    }

    async fn get_mac_address(&self, id: u64) -> Result<MacAddressRecord> {
        let wire: WireMacAddress = self
            .get_json(&format!("/api/dcim/mac-addresses/{id}/"))
            .await?;
        Ok(wire.into())
    }

    async fn create_mac_address(&self, mac: &str, interface_id: Option<u64>) -> Result<MacAddressRecord> {
        let mut body = serde_json::json!({ "mac_address": mac });
        if let Some(interface_id) = interface_id {
            body["assigned_object_type"] = serde_json::json!(INTERFACE_OBJECT_TYPE);
            body["assigned_object_id"] = serde_json::json!(interface_id);
        }
        let wire: WireMacAddress = self.post_json("/api/dcim/mac-addresses/", &body).await?;
        Ok(wire.into())
    }

    async fn delete_mac_address(&self, id: u64) -> Result<()> {
        self.delete(&format!("/api/dcim/mac-addresses/{id}/")).await
    }

    async fn get_interface(&self, id: u64) -> Result<InterfaceRecord> {
        let wire: WireInterface = self.get_json(&format!("/api/dcim/interfaces/{id}/")).await?;
        Ok(wire.into())
    }

    async fn set_interface_primary_mac(&self, interface_id: u64, mac_id: u64) -> Result<InterfaceRecord> {
        let body = serde_json::json!({ "primary_mac_address": { "id": mac_id } });
        let wire: WireInterface = self
            .patch_json(&format!("/api/dcim/interfaces/{interface_id}/"), &body)
            .await?;
        Ok(wire.into())
    }

    async fn status(&self) -> Result<IpamStatus> {
        let wire: WireStatus = self.get_json("/api/status/").await?;
        Ok(IpamStatus {
            version: wire.version,
        })
    }

    fn store_name(&self) -> &'static str {
        "netbox"
    }
}
