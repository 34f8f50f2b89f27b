// # hostsync-core
//
// Core library for the router-to-IPAM reconciliation system.
//
// ## Architecture Overview
//
// This library provides the decision procedure that keeps an IPAM
// inventory in agreement with a router's known-hosts table:
//
// - **HostSource**: Trait for fetching the router snapshot
// - **HostFilter**: Narrows the snapshot to active, IPv4, non-ignored hosts
//   and detects duplicate hostnames (a fatal precondition)
// - **IpamStore**: Trait for querying and mutating the IPAM inventory
// - **Reconciler**: Core engine applying the create/patch/no-op decision
//   per host, including interface MAC reconciliation
// - **MacCache**: Per-run, lazily populated MAC-address inventory
// - **SnapshotFile**: Local cache of the last router snapshot
//
// ## Design Principles
//
// 1. **Router wins**: the router snapshot is the source of truth; IPAM is
//    never pushed back to the router
// 2. **Per-host isolation**: one host's failed mutation never aborts the
//    run; only preconditions and the initial fetches are fatal
// 3. **Typed boundaries**: collaborators decode wire payloads into typed
//    records; the engine never sees raw JSON
// 4. **One attempt**: no retries anywhere; every network call runs once

pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod ipam;
pub mod snapshot;
pub mod traits;

// Re-export core types for convenience
pub use config::{FilterConfig, IpamConfig, RouterConfig, SyncConfig};
pub use engine::{Action, HostOutcome, MacCache, Reconciler, SyncReport};
pub use error::{Error, Result};
pub use host::{HostFilter, HostRecord, duplicate_names, ensure_unique_names, has_duplicate_names};
pub use ipam::{
    InterfaceRecord, IpAddressRecord, IpamStatus, MacAddressRecord, ObjectRef, address_host,
    normalize_mac, with_default_prefix,
};
pub use snapshot::{HostSnapshot, SnapshotFile};
pub use traits::{HostSource, IpamStore};
