//! Max-Min policy.

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

/// Max-Min heuristic applied to a single task: among feasible candidates picks the one with the maximum available
/// capacity. For one task at a time this gives exactly the same choice as [`WorstFit`](super::worst_fit::WorstFit).
pub struct MaxMin;

impl MaxMin {
    pub fn new() -> Self {
        Self {}
    }

    fn prefer(available: f64, max_available: f64) -> bool {
        available > max_available
    }
}

impl VmSelectionPolicy for MaxMin {
    fn policy(&self) -> PlacementPolicy {
        PlacementPolicy::MaxMin
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
        select_by_available(candidates.iter().enumerate(), task, probe, Self::prefer).ok_or(PlacementError::NoCapacity)
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
        select_by_available(edge_slots(registry), task, probe, Self::prefer).ok_or(PlacementError::NoCapacity)
    }
}
