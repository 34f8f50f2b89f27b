// # Host Source Trait
//
// Defines the interface for obtaining the router's known-hosts snapshot.
//
// ## Implementations
//
// - RouterOS REST: `hostsync-routeros` crate
// - Cached snapshot file: [`crate::snapshot::SnapshotFile`]
//
// A host source returns records, nothing else: no filtering, no duplicate
// checks, no decisions. Those belong to the filter and the reconciler.

use async_trait::async_trait;

use crate::host::HostRecord;

/// Trait for host snapshot providers
///
/// One blocking call returning the full known-hosts table, in router
/// order. Implementations must be thread-safe and usable across async
/// tasks; they must not retry. A failed fetch aborts the run.
#[async_trait]
pub trait HostSource: Send + Sync {
    /// Fetch the full known-hosts table
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<HostRecord>)`: the snapshot, possibly empty
    /// - `Err(Error)`: the router was unreachable or returned a bad payload
    async fn get_hosts(&self) -> Result<Vec<HostRecord>, crate::Error>;

    /// Short identifier for logging (e.g. "routeros", "snapshot")
    fn source_name(&self) -> &'static str;
}
