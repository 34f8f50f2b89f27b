//! Per-run MAC-address inventory cache
//!
//! Fetching the full MAC table for every host would dominate a run's
//! round-trips. The cache fetches the brief listing once, on first need,
//! and appends records it creates instead of re-fetching. It is owned by
//! one reconciliation run and never persisted.

use tracing::debug;

use crate::error::Result;
use crate::ipam::{MacAddressRecord, mac_eq, normalize_mac};
use crate::traits::IpamStore;

/// Listing page size requested when the cache is first populated
pub const DEFAULT_MAC_LIST_LIMIT: usize = 1000;

/// Lazily populated MAC-address cache
#[derive(Debug, Default)]
pub struct MacCache {
    /// `None` until the first [`MacCache::ensure`] call
    entries: Option<Vec<MacAddressRecord>>,

    /// Listing limit passed to the store on the initial fetch
    limit: usize,
}

impl MacCache {
    /// Create an empty cache with the default listing limit
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAC_LIST_LIMIT)
    }

    /// Create an empty cache with a custom listing limit
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: None,
            limit,
        }
    }

    /// Ensure a record for `mac` exists, creating it if absent
    ///
    /// Matching is case-insensitive. Idempotent: two calls with the same
    /// MAC (in any letter case) issue at most one creation call. On a
    /// cache hit the full record is re-fetched by id, since the cached
    /// listing is the brief form; newly created records are appended to
    /// the cache as returned.
    pub async fn ensure(
        &mut self,
        ipam: &dyn IpamStore,
        mac: &str,
        interface_id: Option<u64>,
    ) -> Result<MacAddressRecord> {
        if self.entries.is_none() {
            let fetched = ipam.list_mac_addresses(self.limit).await?;
            debug!(count = fetched.len(), "MAC inventory cached");
            self.entries = Some(fetched);
        }
        let entries = self.entries.get_or_insert_with(Vec::new);

        if let Some(found) = entries.iter().find(|r| mac_eq(&r.mac_address, mac)) {
            return ipam.get_mac_address(found.id).await;
        }

        let created = ipam
            .create_mac_address(&normalize_mac(mac), interface_id)
            .await?;
        debug!(mac = %created.mac_address, id = created.id, "MAC record created");
        entries.push(created.clone());
        Ok(created)
    }
}
