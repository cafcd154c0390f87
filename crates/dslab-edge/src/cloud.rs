//! VM selection in the cloud tier.

use crate::capacity::CapacityProbe;
use crate::common::VmSlot;
use crate::environment::ServerRegistry;
use crate::error::PlacementError;
use crate::task::Task;

/// Selects the least loaded feasible VM across all cloud hosts.
///
/// Cloud datacenter is not partitioned by serving host, so all (host, VM) pairs are scanned. Among the feasible VMs
/// the one with the largest available capacity is selected, the first one in scan order wins ties.
pub fn select_cloud_vm(
    task: &Task,
    registry: &dyn ServerRegistry,
    probe: &CapacityProbe,
) -> Result<VmSlot, PlacementError> {
    let mut result: Option<VmSlot> = None;
    let mut max_available = f64::NEG_INFINITY;
    let mut vm_count = 0;

    for host in 0..registry.cloud_host_count() {
        for (index, vm) in registry.cloud_vms(host).iter().enumerate() {
            vm_count += 1;
            if probe.is_feasible(task, vm) && probe.available(vm) > max_available {
                max_available = probe.available(vm);
                result = Some(VmSlot::new(host, index));
            }
        }
    }

    if vm_count == 0 {
        return Err(PlacementError::InvalidState("there are no cloud VMs".to_string()));
    }
    result.ok_or(PlacementError::NoCapacity)
}
