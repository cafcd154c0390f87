//! Next Fit policy.

use rand::RngCore;

use crate::capacity::CapacityProbe;
use crate::common::VmSlot;
use crate::environment::ServerRegistry;
use crate::error::PlacementError;
use crate::state::{next_index, SelectionState};
use crate::task::Task;
use crate::vm::VmHandle;
use crate::vm_selection_policy::{ensure_candidates, ensure_edge_vms, PlacementPolicy, VmSelectionPolicy};

/// Continues a circular scan right after the previously probed VM of the host and uses the first feasible one.
///
/// The host cursor is moved on every probe, so after an unsuccessful scan it points to the last probed VM.
/// At most `candidates.len()` VMs are probed per call.
pub struct NextFit;

impl NextFit {
    pub fn new() -> Self {
        Self {}
    }
}

/// Probes VMs of the host starting after its cursor. Returns `None` if there is no feasible VM on the host.
fn probe_host(
    task: &Task,
    host: usize,
    candidates: &[VmHandle],
    probe: &CapacityProbe,
    state: &mut SelectionState,
) -> Result<Option<usize>, PlacementError> {
    let mut cursor = state.last_vm_index(host)?;
    for _ in 0..candidates.len() {
        let index = next_index(cursor, candidates.len());
        state.set_last_vm_index(host, index)?;
        cursor = Some(index);
        if probe.is_feasible(task, &candidates[index]) {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

impl VmSelectionPolicy for NextFit {
    fn policy(&self) -> PlacementPolicy {
        PlacementPolicy::NextFit
    }

    fn select_vm(
        &self,
        task: &Task,
        host: usize,
        candidates: &[VmHandle],
        probe: &CapacityProbe,
        state: &mut SelectionState,
        _rng: &mut dyn RngCore,
    ) -> Result<usize, PlacementError> {
        ensure_candidates(host, candidates)?;
        probe_host(task, host, candidates, probe, state)?.ok_or(PlacementError::NoCapacity)
    }

    /// Moves the global host cursor host by host and continues the scan of each visited host after its own cursor,
    /// until a feasible VM is found or every host is visited once.
    fn select_vm_across_hosts(
        &self,
        task: &Task,
        registry: &dyn ServerRegistry,
        probe: &CapacityProbe,
        state: &mut SelectionState,
        _rng: &mut dyn RngCore,
    ) -> Result<VmSlot, PlacementError> {
        ensure_edge_vms(registry)?;
        let host_count = registry.edge_host_count();
        for _ in 0..host_count {
            let host = next_index(state.last_host_index(), host_count);
            state.set_last_host_index(host);
            if let Some(index) = probe_host(task, host, registry.edge_vms(host), probe, state)? {
                return Ok(VmSlot::new(host, index));
            }
        }
        Err(PlacementError::NoCapacity)
    }
}
