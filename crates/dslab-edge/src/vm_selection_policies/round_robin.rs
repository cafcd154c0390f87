//! Round Robin policy.

use rand::RngCore;

use crate::capacity::CapacityProbe;
use crate::common::VmSlot;
use crate::environment::ServerRegistry;
use crate::error::PlacementError;
use crate::state::{next_index, SelectionState};
use crate::task::Task;
use crate::vm::VmHandle;
use crate::vm_selection_policy::{ensure_candidates, ensure_edge_vms, PlacementPolicy, VmSelectionPolicy};

/// Starts right after the last selected VM of the host and goes around the list once.
///
/// Unlike [`NextFit`](super::next_fit::NextFit), the cursor is updated only when a VM is selected.
pub struct RoundRobin;

impl RoundRobin {
    pub fn new() -> Self {
        Self {}
    }
}

/// Returns the first feasible VM of the host after its cursor without touching the state.
fn find_after_cursor(
    task: &Task,
    candidates: &[VmHandle],
    probe: &CapacityProbe,
    cursor: Option<usize>,
) -> Option<usize> {
    let len = candidates.len();
    if len == 0 {
        return None;
    }
    let start = next_index(cursor, len);
    (0..len)
        .map(|offset| (start + offset) % len)
        .find(|&index| probe.is_feasible(task, &candidates[index]))
}

impl VmSelectionPolicy for RoundRobin {
    fn policy(&self) -> PlacementPolicy {
        PlacementPolicy::RoundRobin
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
        let cursor = state.last_vm_index(host)?;
        let index = find_after_cursor(task, candidates, probe, cursor).ok_or(PlacementError::NoCapacity)?;
        state.set_last_vm_index(host, index)?;
        Ok(index)
    }

    /// Visits hosts after the last selected one, commits host and VM cursors only on success.
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
        let start = next_index(state.last_host_index(), host_count);
        for offset in 0..host_count {
            let host = (start + offset) % host_count;
            let cursor = state.last_vm_index(host)?;
            if let Some(index) = find_after_cursor(task, registry.edge_vms(host), probe, cursor) {
                state.set_last_vm_index(host, index)?;
                state.set_last_host_index(host);
                return Ok(VmSlot::new(host, index));
            }
        }
        Err(PlacementError::NoCapacity)
    }
}
