//! First Fit policy.

use rand::RngCore;

use crate::capacity::CapacityProbe;
use crate::common::VmSlot;
use crate::environment::ServerRegistry;
use crate::error::PlacementError;
use crate::state::SelectionState;
use crate::task::Task;
use crate::vm::VmHandle;
use crate::vm_selection_policy::{edge_slots, ensure_candidates, ensure_edge_vms, PlacementPolicy, VmSelectionPolicy};

/// Uses the first feasible candidate in list order.
pub struct FirstFit;

impl FirstFit {
    pub fn new() -> Self {
        Self {}
    }
}

impl VmSelectionPolicy for FirstFit {
    fn policy(&self) -> PlacementPolicy {
        PlacementPolicy::FirstFit
    }

    fn select_vm(
        &self,
        task: &Task,
        host: usize,
        candidates: &[VmHandle],
        probe: &CapacityProbe,
        _state: &mut SelectionState,
        _rng: &mut dyn RngCore,
    ) -> Result<usize, PlacementError> {
        ensure_candidates(host, candidates)?;
        candidates
            .iter()
            .position(|vm| probe.is_feasible(task, vm))
            .ok_or(PlacementError::NoCapacity)
    }

    fn select_vm_across_hosts(
        &self,
        task: &Task,
        registry: &dyn ServerRegistry,
        probe: &CapacityProbe,
        _state: &mut SelectionState,
        _rng: &mut dyn RngCore,
    ) -> Result<VmSlot, PlacementError> {
        ensure_edge_vms(registry)?;
        edge_slots(registry)
            .find(|(_, vm)| probe.is_feasible(task, vm))
            .map(|(slot, _)| slot)
            .ok_or(PlacementError::NoCapacity)
    }
}
