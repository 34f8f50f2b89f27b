//! Core reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Matching each filtered host against the IPAM IP-address inventory
//! - Creating, patching, or leaving records untouched
//! - Second-order reconciliation of the MAC bound to a record's interface
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐
//! │ HostSource  │─────▶│ HostFilter  │
//! └─────────────┘      └──────┬──────┘
//!                             │ filtered hosts
//!                             ▼
//!                      ┌─────────────┐      ┌─────────────┐
//!                      │ Reconciler  │◀────▶│  IpamStore  │
//!                      └──────┬──────┘      └─────────────┘
//!                             │
//!                             ▼
//!                      ┌─────────────┐
//!                      │  MacCache   │
//!                      └─────────────┘
//! ```
//!
//! ## Flow, per host (strictly in order, one host at a time)
//!
//! 1. Case-insensitive name match against the inventory
//! 2. No match → create; create rejected → adopt the record found by
//!    address, or fail this host
//! 3. One match → patch when the normalized address differs
//! 4. When the resolved record is assigned to an interface and the host
//!    reports a MAC: ensure the MAC record exists, re-point the
//!    interface's primary MAC if it differs
//!
//! Mutations are applied as the loop runs; this is not a pure planner. A
//! failed host never aborts the run: the loop logs, records the failure
//! and continues with the next host. Only the duplicate-hostname
//! precondition and the initial inventory fetch are fatal.

mod mac_cache;

pub use mac_cache::{DEFAULT_MAC_LIST_LIMIT, MacCache};

use crate::error::{Error, Result};
use crate::host::{self, HostRecord};
use crate::ipam::{IpAddressRecord, address_host, mac_eq, with_default_prefix};
use crate::traits::IpamStore;
use tracing::{debug, error, info, warn};

/// What happened to one host's IPAM record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A new IP-address record was created
    Created,
    /// An existing record was patched to the host's address/name
    Updated,
    /// The record already matched; no mutation was issued
    Unchanged,
    /// A mutation for this host failed; the run continued
    Failed(String),
}

impl Action {
    /// Short lower-case label for reports and logs
    pub fn label(&self) -> &'static str {
        match self {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Unchanged => "unchanged",
            Action::Failed(_) => "failed",
        }
    }
}

/// Per-host outcome of a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOutcome {
    /// Hostname the outcome refers to
    pub host: String,
    /// Address the router reported for the host
    pub ip: String,
    /// What the reconciler did
    pub action: Action,
}

/// Outcome of a full reconciliation run
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// One outcome per filtered host, in processing order
    pub outcomes: Vec<HostOutcome>,
}

impl SyncReport {
    fn count(&self, want: fn(&Action) -> bool) -> usize {
        self.outcomes.iter().filter(|o| want(&o.action)).count()
    }

    /// Number of records created
    pub fn created(&self) -> usize {
        self.count(|a| matches!(a, Action::Created))
    }

    /// Number of records patched
    pub fn updated(&self) -> usize {
        self.count(|a| matches!(a, Action::Updated))
    }

    /// Number of hosts that required no mutation
    pub fn unchanged(&self) -> usize {
        self.count(|a| matches!(a, Action::Unchanged))
    }

    /// Number of hosts whose reconciliation failed
    pub fn failed(&self) -> usize {
        self.count(|a| matches!(a, Action::Failed(_)))
    }

    /// Whether any host failed
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| matches!(o.action, Action::Failed(_)))
    }
}

/// Core reconciliation engine
///
/// Owns the IPAM store and the per-run MAC cache for exactly one run. Runs
/// are strictly sequential: every network round-trip for a host completes
/// before the next host starts. No retries anywhere; every call is
/// attempted exactly once.
pub struct Reconciler {
    /// IPAM backend for queries and mutations
    ipam: Box<dyn IpamStore>,

    /// Lazily populated MAC-address inventory
    mac_cache: MacCache,
}

impl Reconciler {
    /// Create a reconciler on top of an IPAM store
    pub fn new(ipam: Box<dyn IpamStore>) -> Self {
        Self {
            ipam,
            mac_cache: MacCache::new(),
        }
    }

    /// Override the MAC listing limit (mainly for tests)
    pub fn with_mac_list_limit(mut self, limit: usize) -> Self {
        self.mac_cache = MacCache::with_limit(limit);
        self
    }

    /// Reconcile the filtered host list against the IPAM inventory
    ///
    /// Fatal errors: duplicate hostnames (checked before any IPAM call)
    /// and a failed inventory fetch. Everything after that is isolated per
    /// host and reported through the returned [`SyncReport`].
    pub async fn run(&mut self, hosts: &[HostRecord]) -> Result<SyncReport> {
        host::ensure_unique_names(hosts)?;

        let index = self.ipam.list_ip_addresses().await?;
        info!(
            hosts = hosts.len(),
            records = index.len(),
            store = self.ipam.store_name(),
            "starting reconciliation"
        );

        let mut report = SyncReport::default();
        for host in hosts {
            let action = match self.reconcile_host(host, &index).await {
                Ok(action) => action,
                Err(e) => {
                    error!(host = %host.name, ip = %host.ip, error = %e, "host reconciliation failed");
                    Action::Failed(e.to_string())
                }
            };
            report.outcomes.push(HostOutcome {
                host: host.name.clone(),
                ip: host.ip.clone(),
                action,
            });
        }

        info!(
            created = report.created(),
            updated = report.updated(),
            unchanged = report.unchanged(),
            failed = report.failed(),
            "reconciliation finished"
        );
        Ok(report)
    }

    /// Fully reconcile one host: resolve its record, then its interface MAC
    async fn reconcile_host(&mut self, host: &HostRecord, index: &[IpAddressRecord]) -> Result<Action> {
        let (action, record) = self.resolve_record(host, index).await?;

        if let Some(record) = record
            && let Err(e) = self.reconcile_interface_mac(host, &record).await
        {
            // The record-level work already took effect; only the MAC step
            // failed. Still a per-host failure per the patch result.
            return Ok(Action::Failed(format!(
                "record {}, but interface MAC sync failed: {e}",
                action.label()
            )));
        }

        Ok(action)
    }

    /// Steps 1-3: name match, create-or-adopt, or patch-if-changed
    ///
    /// Returns the action taken plus the resolved record (if any) for the
    /// interface/MAC step. A name match always outranks an address match;
    /// the address search runs only as the create-rejected fallback.
    async fn resolve_record(
        &mut self,
        host: &HostRecord,
        index: &[IpAddressRecord],
    ) -> Result<(Action, Option<IpAddressRecord>)> {
        let matches: Vec<&IpAddressRecord> = index
            .iter()
            .filter(|r| r.dns_name.eq_ignore_ascii_case(&host.name))
            .collect();

        match matches.as_slice() {
            [] => self.create_or_adopt(host, index).await,
            [found] => {
                let desired = with_default_prefix(&host.ip);
                if found.address == desired {
                    debug!(host = %host.name, address = %found.address, "record up to date");
                    Ok((Action::Unchanged, Some((*found).clone())))
                } else {
                    let updated = self
                        .ipam
                        .update_ip_address(found.id, &desired, &host.name)
                        .await?;
                    info!(host = %host.name, from = %found.address, to = %desired, "record address updated");
                    Ok((Action::Updated, Some(updated)))
                }
            }
            _ => Err(Error::MultipleMatches(host.name.clone())),
        }
    }

    /// Step 2: create by name; on rejection, adopt the record that already
    /// holds the host's address
    async fn create_or_adopt(
        &mut self,
        host: &HostRecord,
        index: &[IpAddressRecord],
    ) -> Result<(Action, Option<IpAddressRecord>)> {
        let desired = with_default_prefix(&host.ip);

        match self.ipam.create_ip_address(&desired, &host.name).await {
            Ok(created) => {
                info!(host = %host.name, address = %desired, id = created.id, "record created");
                Ok((Action::Created, Some(created)))
            }
            Err(e) => {
                warn!(host = %host.name, error = %e, "create rejected, searching by address");
                match index.iter().find(|r| address_host(&r.address) == host.ip) {
                    Some(existing) => {
                        let updated = self
                            .ipam
                            .update_ip_address(existing.id, &desired, &host.name)
                            .await?;
                        info!(host = %host.name, id = existing.id, "adopted record matched by address");
                        Ok((Action::Updated, Some(updated)))
                    }
                    None => Err(Error::not_found(format!(
                        "no IPAM record matches host {:?} by name or address",
                        host.name
                    ))),
                }
            }
        }
    }

    /// Step 4: ensure the host MAC exists and is the interface's primary
    ///
    /// Soft skips (no interface assignment, non-interface object type, host
    /// without a MAC) return Ok without touching IPAM.
    async fn reconcile_interface_mac(
        &mut self,
        host: &HostRecord,
        record: &IpAddressRecord,
    ) -> Result<()> {
        let Some(interface_id) = record.interface_id() else {
            debug!(host = %host.name, "no assigned interface, skipping MAC step");
            return Ok(());
        };
        if host.mac.is_empty() {
            debug!(host = %host.name, "router reported no MAC, skipping MAC step");
            return Ok(());
        }

        let interface = self.ipam.get_interface(interface_id).await?;
        let mac_record = self
            .mac_cache
            .ensure(self.ipam.as_ref(), &host.mac, Some(interface.id))
            .await?;

        let current = interface.mac_address.as_deref().unwrap_or("");
        if mac_eq(current, &host.mac) {
            debug!(host = %host.name, interface = %interface.name, "primary MAC already correct");
            return Ok(());
        }

        self.ipam
            .set_interface_primary_mac(interface.id, mac_record.id)
            .await?;
        info!(
            host = %host.name,
            interface = %interface.name,
            mac = %mac_record.mac_address,
            "interface primary MAC re-pointed"
        );
        Ok(())
    }
}
