//! Test doubles and common utilities for reconciler contract tests
//!
//! `MockIpam` is an in-memory IPAM inventory that counts every call, so
//! tests can assert exactly which mutations a scenario issued.

use std::sync::{Arc, Mutex};

use hostsync_core::error::{Error, Result};
use hostsync_core::ipam::{
    INTERFACE_OBJECT_TYPE, InterfaceRecord, IpAddressRecord, IpamStatus, MacAddressRecord,
    ObjectRef,
};
use hostsync_core::traits::IpamStore;
use hostsync_core::HostRecord;

/// Per-method call counters
#[derive(Debug, Clone, Default)]
pub struct CallCounts {
    pub list_ip: usize,
    pub create_ip: usize,
    pub update_ip: usize,
    pub delete_ip: usize,
    pub list_mac: usize,
    pub get_mac: usize,
    pub create_mac: usize,
    pub delete_mac: usize,
    pub get_interface: usize,
    pub patch_interface: usize,
    pub status: usize,
}

impl CallCounts {
    /// Total number of calls of any kind
    pub fn total(&self) -> usize {
        self.list_ip
            + self.create_ip
            + self.update_ip
            + self.delete_ip
            + self.list_mac
            + self.get_mac
            + self.create_mac
            + self.delete_mac
            + self.get_interface
            + self.patch_interface
            + self.status
    }
}

#[derive(Debug, Default)]
struct MockState {
    ip_addresses: Vec<IpAddressRecord>,
    macs: Vec<MacAddressRecord>,
    interfaces: Vec<InterfaceRecord>,
    next_id: u64,
    fail_ip_list: bool,
    reject_ip_creates: bool,
    fail_interface_patch: bool,
    calls: CallCounts,
}

/// In-memory IPAM store with shared state across clones
#[derive(Debug, Clone, Default)]
pub struct MockIpam {
    state: Arc<Mutex<MockState>>,
}

impl MockIpam {
    pub fn new() -> Self {
        let mock = Self::default();
        mock.state.lock().unwrap().next_id = 100;
        mock
    }

    /// Seed an IP-address record into the inventory
    pub fn seed_ip(&self, record: IpAddressRecord) {
        self.state.lock().unwrap().ip_addresses.push(record);
    }

    /// Seed a MAC-address record into the inventory
    pub fn seed_mac(&self, record: MacAddressRecord) {
        self.state.lock().unwrap().macs.push(record);
    }

    /// Seed an interface record into the inventory
    pub fn seed_interface(&self, record: InterfaceRecord) {
        self.state.lock().unwrap().interfaces.push(record);
    }

    /// Make the inventory listing fail with an API error
    pub fn fail_ip_list(&self) {
        self.state.lock().unwrap().fail_ip_list = true;
    }

    /// Make every create_ip_address call fail with an API error
    pub fn reject_ip_creates(&self) {
        self.state.lock().unwrap().reject_ip_creates = true;
    }

    /// Make every interface patch fail with an API error
    pub fn fail_interface_patch(&self) {
        self.state.lock().unwrap().fail_interface_patch = true;
    }

    /// Snapshot of the call counters
    pub fn calls(&self) -> CallCounts {
        self.state.lock().unwrap().calls.clone()
    }

    /// Current IP-address inventory
    pub fn ip_records(&self) -> Vec<IpAddressRecord> {
        self.state.lock().unwrap().ip_addresses.clone()
    }

    /// Current MAC-address inventory
    pub fn mac_records(&self) -> Vec<MacAddressRecord> {
        self.state.lock().unwrap().macs.clone()
    }

    /// Look up an interface by id
    pub fn interface(&self, id: u64) -> Option<InterfaceRecord> {
        self.state
            .lock()
            .unwrap()
            .interfaces
            .iter()
            .find(|i| i.id == id)
            .cloned()
    }
}

#[async_trait::async_trait]
impl IpamStore for MockIpam {
    async fn list_ip_addresses(&self) -> Result<Vec<IpAddressRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_ip += 1;
        if state.fail_ip_list {
            return Err(Error::api(502, "bad gateway"));
        }
        Ok(state.ip_addresses.clone())
    }

    async fn create_ip_address(&self, address: &str, dns_name: &str) -> Result<IpAddressRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.create_ip += 1;
        if state.reject_ip_creates {
            return Err(Error::api(400, "duplicate address"));
        }
        state.next_id += 1;
        let record = IpAddressRecord {
            id: state.next_id,
            address: address.to_string(),
            dns_name: dns_name.to_string(),
            family: 4,
            assigned_object: None,
            assigned_object_type: None,
        };
        state.ip_addresses.push(record.clone());
        Ok(record)
    }

    async fn update_ip_address(&self, id: u64, address: &str, dns_name: &str) -> Result<IpAddressRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.update_ip += 1;
        let record = state
            .ip_addresses
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::not_found(format!("ip address {id}")))?;
        record.address = address.to_string();
        record.dns_name = dns_name.to_string();
        Ok(record.clone())
    }

    async fn delete_ip_address(&self, id: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.delete_ip += 1;
        state.ip_addresses.retain(|r| r.id != id);
        Ok(())
    }

    async fn list_mac_addresses(&self, limit: usize) -> Result<Vec<MacAddressRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_mac += 1;
        Ok(state.macs.iter().take(limit).cloned().collect())
    }

    async fn get_mac_address(&self, id: u64) -> Result<MacAddressRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_mac += 1;
        state
            .macs
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("mac address {id}")))
    }

    async fn create_mac_address(&self, mac: &str, interface_id: Option<u64>) -> Result<MacAddressRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.create_mac += 1;
        state.next_id += 1;
        let record = MacAddressRecord {
            id: state.next_id,
            mac_address: mac.to_string(),
            assigned_object_id: interface_id,
        };
        state.macs.push(record.clone());
        Ok(record)
    }

    async fn delete_mac_address(&self, id: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.delete_mac += 1;
        state.macs.retain(|r| r.id != id);
        Ok(())
    }

    async fn get_interface(&self, id: u64) -> Result<InterfaceRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_interface += 1;
        state
            .interfaces
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("interface {id}")))
    }

    async fn set_interface_primary_mac(&self, interface_id: u64, mac_id: u64) -> Result<InterfaceRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.patch_interface += 1;
        if state.fail_interface_patch {
            return Err(Error::api(400, "patch rejected"));
        }
        let mac_address = state
            .macs
            .iter()
            .find(|r| r.id == mac_id)
            .map(|r| r.mac_address.clone())
            .ok_or_else(|| Error::not_found(format!("mac address {mac_id}")))?;
        let interface = state
            .interfaces
            .iter_mut()
            .find(|i| i.id == interface_id)
            .ok_or_else(|| Error::not_found(format!("interface {interface_id}")))?;
        interface.mac_address = Some(mac_address);
        Ok(interface.clone())
    }

    async fn status(&self) -> Result<IpamStatus> {
        let mut state = self.state.lock().unwrap();
        state.calls.status += 1;
        Ok(IpamStatus {
            version: "4.2.0".to_string(),
        })
    }

    fn store_name(&self) -> &'static str {
        "mock"
    }
}

/// Host record shorthand for scenarios
pub fn host(name: &str, ip: &str, mac: &str) -> HostRecord {
    HostRecord::new(true, ip, mac, name)
}

/// Bare IP-address record (no interface assignment)
pub fn ip_record(id: u64, address: &str, dns_name: &str) -> IpAddressRecord {
    IpAddressRecord {
        id,
        address: address.to_string(),
        dns_name: dns_name.to_string(),
        family: 4,
        assigned_object: None,
        assigned_object_type: None,
    }
}

/// IP-address record assigned to an interface
pub fn ip_record_on_interface(id: u64, address: &str, dns_name: &str, interface_id: u64) -> IpAddressRecord {
    IpAddressRecord {
        assigned_object: Some(ObjectRef { id: interface_id }),
        assigned_object_type: Some(INTERFACE_OBJECT_TYPE.to_string()),
        ..ip_record(id, address, dns_name)
    }
}

/// Interface record with an optional current primary MAC
pub fn interface(id: u64, name: &str, mac: Option<&str>) -> InterfaceRecord {
    InterfaceRecord {
        id,
        name: name.to_string(),
        mac_address: mac.map(str::to_string),
    }
}
