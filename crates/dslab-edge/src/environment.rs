//! Interfaces of external collaborators consumed by the orchestrator and their simple in-memory implementations.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::common::Location;
use crate::vm::{VmHandle, VmType};

/// Maps a mobile device to its current location.
pub trait MobilityModel {
    fn location_of(&self, device_id: u32, time: f64) -> Location;
}

/// Provides ordered lists of VMs running on edge and cloud hosts.
///
/// Both the order of hosts and the order of VMs on each host must be stable during the simulation, since cursor-based
/// policies rely on them.
pub trait ServerRegistry {
    fn edge_host_count(&self) -> usize;

    /// Returns VMs of the edge host with the given index (empty slice for unknown host).
    fn edge_vms(&self, host: usize) -> &[VmHandle];

    fn cloud_host_count(&self) -> usize;

    /// Returns VMs of the cloud host with the given index (empty slice for unknown host).
    fn cloud_vms(&self, host: usize) -> &[VmHandle];
}

/// Reports current CPU utilization of VMs in percents.
pub trait UtilizationMonitor {
    fn utilization_of(&self, vm: &VmHandle, time: f64) -> f64;
}

////////////////////////////////////////////////////////////////////////////////

/// Mobility model with fixed device locations.
#[derive(Clone, Debug, Default)]
pub struct StaticMobility {
    locations: BTreeMap<u32, usize>,
    default_host: usize,
}

impl StaticMobility {
    /// Creates model where unknown devices are served by `default_host`.
    pub fn new(default_host: usize) -> Self {
        Self {
            locations: BTreeMap::new(),
            default_host,
        }
    }

    /// Sets the host serving the device.
    pub fn set_location(&mut self, device_id: u32, host: usize) {
        self.locations.insert(device_id, host);
    }
}

impl MobilityModel for StaticMobility {
    fn location_of(&self, device_id: u32, _time: f64) -> Location {
        Location::new(*self.locations.get(&device_id).unwrap_or(&self.default_host))
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Server registry built in memory. Hosts are identified by unique names and ordered by insertion.
#[derive(Clone, Debug, Default)]
pub struct StaticRegistry {
    edge_hosts: IndexMap<String, Vec<VmHandle>>,
    cloud_hosts: IndexMap<String, Vec<VmHandle>>,
    vm_counter: u32,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds edge host (or returns the index of existing one with the same name).
    pub fn add_edge_host(&mut self, name: &str) -> usize {
        let entry = self.edge_hosts.entry(name.to_string());
        let index = entry.index();
        entry.or_default();
        index
    }

    /// Adds cloud host (or returns the index of existing one with the same name).
    pub fn add_cloud_host(&mut self, name: &str) -> usize {
        let entry = self.cloud_hosts.entry(name.to_string());
        let index = entry.index();
        entry.or_default();
        index
    }

    /// Adds VM to the edge host with the given index. Returns `None` if there is no such host.
    pub fn add_edge_vm(&mut self, host: usize, mips: f64) -> Option<VmHandle> {
        let id = self.vm_counter;
        let (_, vms) = self.edge_hosts.get_index_mut(host)?;
        let vm = VmHandle::new(id, VmType::Edge, mips, host);
        vms.push(vm.clone());
        self.vm_counter += 1;
        Some(vm)
    }

    /// Adds VM to the cloud host with the given index. Returns `None` if there is no such host.
    pub fn add_cloud_vm(&mut self, host: usize, mips: f64) -> Option<VmHandle> {
        let id = self.vm_counter;
        let (_, vms) = self.cloud_hosts.get_index_mut(host)?;
        let vm = VmHandle::new(id, VmType::Cloud, mips, host);
        vms.push(vm.clone());
        self.vm_counter += 1;
        Some(vm)
    }

    /// Returns name of the edge host with the given index.
    pub fn edge_host_name(&self, host: usize) -> Option<&str> {
        self.edge_hosts.get_index(host).map(|(name, _)| name.as_str())
    }

    /// Returns all VMs, edge ones first.
    pub fn all_vms(&self) -> impl Iterator<Item = &VmHandle> {
        self.edge_hosts.values().chain(self.cloud_hosts.values()).flatten()
    }
}

impl ServerRegistry for StaticRegistry {
    fn edge_host_count(&self) -> usize {
        self.edge_hosts.len()
    }

    fn edge_vms(&self, host: usize) -> &[VmHandle] {
        self.edge_hosts.get_index(host).map(|(_, vms)| vms.as_slice()).unwrap_or(&[])
    }

    fn cloud_host_count(&self) -> usize {
        self.cloud_hosts.len()
    }

    fn cloud_vms(&self, host: usize) -> &[VmHandle] {
        self.cloud_hosts.get_index(host).map(|(_, vms)| vms.as_slice()).unwrap_or(&[])
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Utilization monitor backed by a table of current VM utilizations. Unknown VMs are idle.
#[derive(Clone, Debug, Default)]
pub struct UtilizationTable {
    utilization: BTreeMap<u32, f64>,
}

impl UtilizationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets VM utilization, clamped to [0, 100].
    pub fn set(&mut self, vm_id: u32, utilization: f64) {
        self.utilization.insert(vm_id, utilization.clamp(0., 100.));
    }

    /// Changes VM utilization by `delta`, the result is clamped to [0, 100].
    pub fn add(&mut self, vm_id: u32, delta: f64) {
        let current = self.get(vm_id);
        self.set(vm_id, current + delta);
    }

    pub fn get(&self, vm_id: u32) -> f64 {
        *self.utilization.get(&vm_id).unwrap_or(&0.)
    }
}

impl UtilizationMonitor for UtilizationTable {
    fn utilization_of(&self, vm: &VmHandle, _time: f64) -> f64 {
        self.get(vm.id)
    }
}
