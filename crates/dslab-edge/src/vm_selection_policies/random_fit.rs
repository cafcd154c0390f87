//! Random Fit policy.

use rand::{Rng, RngCore};

use crate::capacity::CapacityProbe;
use crate::common::VmSlot;
use crate::environment::ServerRegistry;
use crate::error::PlacementError;
use crate::state::SelectionState;
use crate::task::Task;
use crate::vm::VmHandle;
use crate::vm_selection_policy::{ensure_candidates, PlacementPolicy, VmSelectionPolicy};

/// Checks a single uniformly random candidate. If it is not feasible, no VM is selected (there are no retries).
pub struct RandomFit;

impl RandomFit {
    pub fn new() -> Self {
        Self {}
    }
}

impl VmSelectionPolicy for RandomFit {
    fn policy(&self) -> PlacementPolicy {
        PlacementPolicy::RandomFit
    }

    fn select_vm(
        &self,
        task: &Task,
        host: usize,
        candidates: &[VmHandle],
        probe: &CapacityProbe,
        _state: &mut SelectionState,
        rng: &mut dyn RngCore,
    ) -> Result<usize, PlacementError> {
        ensure_candidates(host, candidates)?;
        let index = rng.gen_range(0..candidates.len());
        if probe.is_feasible(task, &candidates[index]) {
            Ok(index)
        } else {
            Err(PlacementError::NoCapacity)
        }
    }

    /// Draws a random host and then a random VM on it.
    fn select_vm_across_hosts(
        &self,
        task: &Task,
        registry: &dyn ServerRegistry,
        probe: &CapacityProbe,
        state: &mut SelectionState,
        rng: &mut dyn RngCore,
    ) -> Result<VmSlot, PlacementError> {
        let host_count = registry.edge_host_count();
        if host_count == 0 {
            return Err(PlacementError::InvalidState("there are no edge hosts".to_string()));
        }
        let host = rng.gen_range(0..host_count);
        self.select_vm(task, host, registry.edge_vms(host), probe, state, rng)
            .map(|index| VmSlot::new(host, index))
    }
}
