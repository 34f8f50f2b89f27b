//! Router host records and the snapshot filter
//!
//! A router reports every device it currently or recently saw: connection
//! status, IPv4/IPv6 address, MAC and hostname. Before reconciliation the
//! snapshot is narrowed to hosts that are active, IPv4-addressed and not on
//! the ignore list, and the result is checked for duplicate hostnames.
//! The hostname is the join key against the IPAM inventory, so duplicates
//! make the whole run undecidable and abort it before any mutation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};

/// One entry from the router's known-hosts table
///
/// Created fresh on each run from a point-in-time router query (or loaded
/// from a cached snapshot) and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Whether the host is currently connected
    pub status: bool,

    /// IP address as reported by the router; may be empty for stale entries
    #[serde(default)]
    pub ip: String,

    /// MAC address as reported by the router; may be empty
    #[serde(default)]
    pub mac: String,

    /// Router-assigned or DHCP-reported hostname (the IPAM join key)
    pub name: String,
}

impl HostRecord {
    /// Create a new host record
    pub fn new(
        status: bool,
        ip: impl Into<String>,
        mac: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            status,
            ip: ip.into(),
            mac: mac.into(),
            name: name.into(),
        }
    }
}

/// Snapshot filter configured from the ignore/accept lists
///
/// The accept list is carried through from configuration but is not applied
/// as a positive predicate; see DESIGN.md for the open question around its
/// intended semantics.
#[derive(Debug, Clone, Default)]
pub struct HostFilter {
    ignore: HashSet<String>,

    #[allow(dead_code)]
    accept: HashSet<String>,
}

impl HostFilter {
    /// Create a filter from the configured ignore and accept lists
    pub fn new<I, A>(ignore: I, accept: A) -> Self
    where
        I: IntoIterator<Item = String>,
        A: IntoIterator<Item = String>,
    {
        Self {
            ignore: ignore.into_iter().collect(),
            accept: accept.into_iter().collect(),
        }
    }

    /// Keep hosts that are connected, carry an address, and are not ignored
    pub fn active(&self, hosts: &[HostRecord]) -> Vec<HostRecord> {
        hosts
            .iter()
            .filter(|h| h.status && !h.ip.is_empty() && !self.ignore.contains(&h.ip))
            .cloned()
            .collect()
    }

    /// Keep hosts whose address looks like a dotted quad
    ///
    /// An address counts as IPv4 iff splitting on `.` yields exactly four
    /// components. This is a syntactic check, not an address validator:
    /// malformed four-component strings pass, and that is intentional.
    pub fn keep_ipv4(hosts: &[HostRecord]) -> Vec<HostRecord> {
        hosts
            .iter()
            .filter(|h| h.ip.split('.').count() == 4)
            .cloned()
            .collect()
    }

    /// Apply the full filter chain: active + ignore list, then IPv4 only
    pub fn apply(&self, hosts: &[HostRecord]) -> Vec<HostRecord> {
        Self::keep_ipv4(&self.active(hosts))
    }
}

/// True iff at least two hosts share a `name` value exactly
pub fn has_duplicate_names(hosts: &[HostRecord]) -> bool {
    let mut seen = HashSet::new();
    hosts.iter().any(|h| !seen.insert(h.name.as_str()))
}

/// Names that appear more than once, each reported once
pub fn duplicate_names(hosts: &[HostRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dupes = Vec::new();
    for host in hosts {
        if !seen.insert(host.name.as_str()) && !dupes.contains(&host.name) {
            dupes.push(host.name.clone());
        }
    }
    dupes
}

/// Fail with [`Error::DuplicateHostnames`] when the snapshot contains
/// duplicate names. Callers run this before any IPAM mutation.
pub fn ensure_unique_names(hosts: &[HostRecord]) -> Result<()> {
    let dupes = duplicate_names(hosts);
    if dupes.is_empty() {
        Ok(())
    } else {
        Err(Error::DuplicateHostnames(dupes))
    }
}
