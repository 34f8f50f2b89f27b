//! Typed IPAM records and normalization helpers
//!
//! These are the records the reconciler works with. The HTTP client crate
//! decodes the wire payloads into these shapes at its boundary; missing or
//! malformed fields surface as decode errors there, never as silent
//! defaults inside the engine.

use serde::{Deserialize, Serialize};

/// Object type discriminator an IP address must carry for the interface/MAC
/// step to run.
pub const INTERFACE_OBJECT_TYPE: &str = "dcim.interface";

/// Prefix length assumed when a caller supplies a bare address. Host
/// records never carry a prefix.
const DEFAULT_PREFIX_LEN: u8 = 24;

/// Reference to an assigned object (an interface, in practice)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Identifier of the referenced object
    pub id: u64,
}

/// One entry from the IPAM IP-address table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddressRecord {
    /// IPAM identifier
    pub id: u64,

    /// Dotted quad plus prefix length, e.g. `"10.0.0.5/24"`
    pub address: String,

    /// DNS name bound to the address; matched case-insensitively against
    /// the router hostname
    pub dns_name: String,

    /// Address family (4 or 6)
    pub family: u8,

    /// Interface the address is assigned to, if any
    pub assigned_object: Option<ObjectRef>,

    /// Type discriminator for `assigned_object`, e.g. `"dcim.interface"`
    pub assigned_object_type: Option<String>,
}

impl IpAddressRecord {
    /// The interface id, when the assigned object is an interface
    pub fn interface_id(&self) -> Option<u64> {
        match self.assigned_object_type.as_deref() {
            Some(INTERFACE_OBJECT_TYPE) => self.assigned_object.map(|obj| obj.id),
            _ => None,
        }
    }
}

/// One entry from the IPAM MAC-address table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacAddressRecord {
    /// IPAM identifier
    pub id: u64,

    /// MAC address, normalized to upper case by the IPAM system
    pub mac_address: String,

    /// Interface the MAC is attached to, if any
    pub assigned_object_id: Option<u64>,
}

/// One entry from the IPAM interfaces table
///
/// Read and conditionally patched by the reconciler; never created or
/// deleted by this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    /// IPAM identifier
    pub id: u64,

    /// Interface name
    pub name: String,

    /// Currently configured primary MAC, if any
    pub mac_address: Option<String>,
}

/// IPAM instance status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamStatus {
    /// Version string reported by the instance
    pub version: String,
}

/// Normalize an address to a network: bare addresses get a `/24` suffix,
/// already-prefixed addresses pass through unchanged.
pub fn with_default_prefix(address: &str) -> String {
    if address.contains('/') {
        address.to_string()
    } else {
        format!("{address}/{DEFAULT_PREFIX_LEN}")
    }
}

/// The host part of an address, with any prefix length stripped
pub fn address_host(address: &str) -> &str {
    address.split('/').next().unwrap_or(address)
}

/// Upper-case a MAC for comparison against IPAM records
pub fn normalize_mac(mac: &str) -> String {
    mac.to_ascii_uppercase()
}

/// Case-insensitive MAC equality
pub fn mac_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
