//! Core traits for the reconciliation system
//!
//! This module defines the abstract interfaces the collaborator crates
//! implement.
//!
//! - [`HostSource`]: Produce the router's known-hosts snapshot
//! - [`IpamStore`]: Query and mutate the IPAM inventory

pub mod host_source;
pub mod ipam_store;

pub use host_source::HostSource;
pub use ipam_store::IpamStore;
