//! Best Fit policy.

use rand::RngCore;

use crate::capacity::CapacityProbe;
use crate::common::VmSlot;
use crate::environment::ServerRegistry;
use crate::error::PlacementError;
use crate::state::SelectionState;
use crate::task::Task;
use crate::vm::VmHandle;
use crate::vm_selection_policy::{
    edge_slots, ensure_candidates, ensure_edge_vms, select_by_available, PlacementPolicy, VmSelectionPolicy,
};

/// Uses the most loaded feasible candidate, i.e. the one with the smallest sufficient available capacity.
pub struct BestFit;

impl BestFit {
    pub fn new() -> Self {
        Self {}
    }
}

impl VmSelectionPolicy for BestFit {
    fn policy(&self) -> PlacementPolicy {
        PlacementPolicy::BestFit
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
        select_by_available(candidates.iter().enumerate(), task, probe, |available, best| {
            available < best
        })
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
        select_by_available(edge_slots(registry), task, probe, |available, best| available < best)
            .ok_or(PlacementError::NoCapacity)
    }
}
