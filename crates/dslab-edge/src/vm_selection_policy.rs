//! VM selection policies.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use log::debug;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::capacity::CapacityProbe;
use crate::common::VmSlot;
use crate::config::options::{normalize_name, parse_config_value, parse_options};
use crate::environment::ServerRegistry;
use crate::error::{ConfigError, PlacementError};
use crate::state::SelectionState;
use crate::task::Task;
use crate::vm::VmHandle;
use crate::vm_selection_policies::ant_colony::{AntColony, AntColonyParams};
use crate::vm_selection_policies::best_fit::BestFit;
use crate::vm_selection_policies::first_fit::FirstFit;
use crate::vm_selection_policies::max_min::MaxMin;
use crate::vm_selection_policies::next_fit::NextFit;
use crate::vm_selection_policies::random_fit::RandomFit;
use crate::vm_selection_policies::round_robin::RoundRobin;
use crate::vm_selection_policies::worst_fit::WorstFit;

/// Trait for implementation of VM selection policies.
///
/// In the host-scoped mode the policy receives the ordered list of VMs of the host serving the task's device and
/// returns an index in this list. In the load-balanced mode the policy may pick a VM on any edge host.
///
/// Policies do not own mutable state: cursors are kept in [`SelectionState`], randomness comes from the passed
/// random source, so that decisions are reproducible for a fixed seed.
pub trait VmSelectionPolicy {
    fn policy(&self) -> PlacementPolicy;

    fn select_vm(
        &self,
        task: &Task,
        host: usize,
        candidates: &[VmHandle],
        probe: &CapacityProbe,
        state: &mut SelectionState,
        rng: &mut dyn RngCore,
    ) -> Result<usize, PlacementError>;

    /// Selects VM across all edge hosts. Policies without a load-balanced variant never find a VM.
    fn select_vm_across_hosts(
        &self,
        task: &Task,
        _registry: &dyn ServerRegistry,
        _probe: &CapacityProbe,
        _state: &mut SelectionState,
        _rng: &mut dyn RngCore,
    ) -> Result<VmSlot, PlacementError> {
        debug!("task {}: policy {} has no load-balanced variant", task.id, self.policy());
        Err(PlacementError::NoCapacity)
    }
}

/// Supported VM selection policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PlacementPolicy {
    RandomFit,
    WorstFit,
    BestFit,
    FirstFit,
    NextFit,
    RoundRobin,
    MaxMin,
    AntColony,
}

impl PlacementPolicy {
    pub const ALL: [PlacementPolicy; 8] = [
        PlacementPolicy::RandomFit,
        PlacementPolicy::WorstFit,
        PlacementPolicy::BestFit,
        PlacementPolicy::FirstFit,
        PlacementPolicy::NextFit,
        PlacementPolicy::RoundRobin,
        PlacementPolicy::MaxMin,
        PlacementPolicy::AntColony,
    ];

    /// Returns true if the policy result does not depend on random draws.
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, PlacementPolicy::RandomFit | PlacementPolicy::AntColony)
    }
}

impl Display for PlacementPolicy {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            PlacementPolicy::RandomFit => "RandomFit",
            PlacementPolicy::WorstFit => "WorstFit",
            PlacementPolicy::BestFit => "BestFit",
            PlacementPolicy::FirstFit => "FirstFit",
            PlacementPolicy::NextFit => "NextFit",
            PlacementPolicy::RoundRobin => "RoundRobin",
            PlacementPolicy::MaxMin => "MaxMin",
            PlacementPolicy::AntColony => "AntColony",
        };
        f.write_str(name)
    }
}

impl FromStr for PlacementPolicy {
    type Err = ConfigError;

    /// Parses policy name ignoring case and separators, e.g. `NEXT_FIT` or `NextFit`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "randomfit" => Ok(PlacementPolicy::RandomFit),
            "worstfit" => Ok(PlacementPolicy::WorstFit),
            "bestfit" => Ok(PlacementPolicy::BestFit),
            "firstfit" => Ok(PlacementPolicy::FirstFit),
            "nextfit" => Ok(PlacementPolicy::NextFit),
            "roundrobin" => Ok(PlacementPolicy::RoundRobin),
            "maxmin" => Ok(PlacementPolicy::MaxMin),
            "antcolony" | "antcolonyoptimization" | "aco" => Ok(PlacementPolicy::AntColony),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl TryFrom<String> for PlacementPolicy {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlacementPolicy> for String {
    fn from(value: PlacementPolicy) -> Self {
        value.to_string()
    }
}

/// Creates policy by its tag.
pub fn create_policy(policy: PlacementPolicy, aco_params: &AntColonyParams) -> Box<dyn VmSelectionPolicy> {
    match policy {
        PlacementPolicy::RandomFit => Box::new(RandomFit::new()),
        PlacementPolicy::WorstFit => Box::new(WorstFit::new()),
        PlacementPolicy::BestFit => Box::new(BestFit::new()),
        PlacementPolicy::FirstFit => Box::new(FirstFit::new()),
        PlacementPolicy::NextFit => Box::new(NextFit::new()),
        PlacementPolicy::RoundRobin => Box::new(RoundRobin::new()),
        PlacementPolicy::MaxMin => Box::new(MaxMin::new()),
        PlacementPolicy::AntColony => Box::new(AntColony::new(aco_params.clone())),
    }
}

/// Creates policy from config string such as `FIRST_FIT` or `AntColony[ants=20,iterations=100]`.
///
/// Options in brackets override the passed ant colony parameters and are ignored by other policies.
pub fn policy_resolver(
    config_str: &str,
    aco_params: &AntColonyParams,
) -> Result<Box<dyn VmSelectionPolicy>, ConfigError> {
    let (policy_name, options) = parse_config_value(config_str);
    let policy: PlacementPolicy = policy_name.parse()?;
    let params = match options {
        Some(options) if policy == PlacementPolicy::AntColony => aco_params.with_options(&parse_options(&options))?,
        _ => aco_params.clone(),
    };
    Ok(create_policy(policy, &params))
}

////////////////////////////////////////////////////////////////////////////////

/// Returns the feasible candidate whose available capacity is preferred by `prefer(candidate, current_best)`.
/// On exact ties the first seen candidate wins.
pub(crate) fn select_by_available<'a, K: Copy>(
    candidates: impl IntoIterator<Item = (K, &'a VmHandle)>,
    task: &Task,
    probe: &CapacityProbe,
    prefer: fn(f64, f64) -> bool,
) -> Option<K> {
    let mut result: Option<(K, f64)> = None;
    for (key, vm) in candidates {
        if !probe.is_feasible(task, vm) {
            continue;
        }
        let available = probe.available(vm);
        if result.map_or(true, |(_, best)| prefer(available, best)) {
            result = Some((key, available));
        }
    }
    result.map(|(key, _)| key)
}

/// Iterates over all edge VMs in (host, VM) order.
pub(crate) fn edge_slots(registry: &dyn ServerRegistry) -> impl Iterator<Item = (VmSlot, &VmHandle)> + '_ {
    (0..registry.edge_host_count()).flat_map(move |host| {
        registry
            .edge_vms(host)
            .iter()
            .enumerate()
            .map(move |(index, vm)| (VmSlot::new(host, index), vm))
    })
}

pub(crate) fn ensure_candidates(host: usize, candidates: &[VmHandle]) -> Result<(), PlacementError> {
    if candidates.is_empty() {
        return Err(PlacementError::InvalidState(format!("host {} has no VMs", host)));
    }
    Ok(())
}

pub(crate) fn ensure_edge_vms(registry: &dyn ServerRegistry) -> Result<(), PlacementError> {
    if edge_slots(registry).next().is_none() {
        return Err(PlacementError::InvalidState("there are no edge VMs".to_string()));
    }
    Ok(())
}
