// # IPAM Store Trait
//
// Defines the interface for querying and mutating the IPAM inventory.
//
// ## Implementations
//
// - NetBox REST: `hostsync-netbox` crate
//
// The store is a thin request/response wrapper. Matching, caching and the
// create-or-patch decision procedure live in the reconciler; the store
// performs exactly one API call per method, with no retries and no state
// beyond its HTTP session.

use async_trait::async_trait;

use crate::ipam::{InterfaceRecord, IpAddressRecord, IpamStatus, MacAddressRecord};

/// Trait for IPAM backend implementations
///
/// Every method maps to a single HTTP call. Unexpected status codes must
/// surface as [`crate::Error::Api`]; the reconciler decides whether that is
/// fatal (initial fetch) or a per-host failure (mutations).
#[async_trait]
pub trait IpamStore: Send + Sync {
    /// List the full IP-address inventory
    async fn list_ip_addresses(&self) -> Result<Vec<IpAddressRecord>, crate::Error>;

    /// Create an IP address bound to a DNS name
    ///
    /// `address` must already carry a prefix length. The record is created
    /// as reserved under the configured tenant.
    async fn create_ip_address(
        &self,
        address: &str,
        dns_name: &str,
    ) -> Result<IpAddressRecord, crate::Error>;

    /// Re-point an existing IP-address record to a new address and name
    async fn update_ip_address(
        &self,
        id: u64,
        address: &str,
        dns_name: &str,
    ) -> Result<IpAddressRecord, crate::Error>;

    /// Delete an IP-address record
    ///
    /// Utility operation; the reconciliation flow never calls this.
    async fn delete_ip_address(&self, id: u64) -> Result<(), crate::Error>;

    /// List up to `limit` MAC-address records (brief form)
    async fn list_mac_addresses(&self, limit: usize) -> Result<Vec<MacAddressRecord>, crate::Error>;

    /// Fetch one MAC-address record by id
    async fn get_mac_address(&self, id: u64) -> Result<MacAddressRecord, crate::Error>;

    /// Create a MAC-address record, optionally attached to an interface
    async fn create_mac_address(
        &self,
        mac: &str,
        interface_id: Option<u64>,
    ) -> Result<MacAddressRecord, crate::Error>;

    /// Delete a MAC-address record
    ///
    /// Utility operation; the reconciliation flow never calls this.
    async fn delete_mac_address(&self, id: u64) -> Result<(), crate::Error>;

    /// Fetch one interface record by id
    async fn get_interface(&self, id: u64) -> Result<InterfaceRecord, crate::Error>;

    /// Re-point an interface's primary MAC to an existing MAC record
    async fn set_interface_primary_mac(
        &self,
        interface_id: u64,
        mac_id: u64,
    ) -> Result<InterfaceRecord, crate::Error>;

    /// Fetch the instance status
    async fn status(&self) -> Result<IpamStatus, crate::Error>;

    /// Short identifier for logging (e.g. "netbox")
    fn store_name(&self) -> &'static str;
}
