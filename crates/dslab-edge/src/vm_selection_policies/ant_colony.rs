//! Ant Colony Optimization policy.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use log::{debug, trace, warn};
use rand::distributions::{WeightedError, WeightedIndex};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capacity::CapacityProbe;
use crate::config::options::{normalize_name, parse_option};
use crate::error::{ConfigError, PlacementError};
use crate::state::SelectionState;
use crate::task::Task;
use crate::vm::VmHandle;
use crate::vm_selection_policy::{ensure_candidates, PlacementPolicy, VmSelectionPolicy};

const EXECUTION_TIME_WEIGHT: f64 = 0.7;
const UTILIZATION_WEIGHT: f64 = 0.3;
/// Utilization below one percent is treated as one percent by the utilization heuristic.
const MIN_HEURISTIC_UTILIZATION: f64 = 1.;

/// Heuristic desirability of a VM used together with pheromone during solution construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcoHeuristic {
    /// `1 / available_capacity`, favors nearly full VMs.
    AvailableCapacity,
    /// `1 / utilization`, favors less utilized VMs.
    Utilization,
}

impl AcoHeuristic {
    fn value(&self, utilization: f64) -> f64 {
        match self {
            AcoHeuristic::AvailableCapacity => 1. / (100. - utilization),
            AcoHeuristic::Utilization => 1. / utilization.max(MIN_HEURISTIC_UTILIZATION),
        }
    }
}

impl Display for AcoHeuristic {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            AcoHeuristic::AvailableCapacity => write!(f, "available_capacity"),
            AcoHeuristic::Utilization => write!(f, "utilization"),
        }
    }
}

impl FromStr for AcoHeuristic {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "availablecapacity" | "available" => Ok(AcoHeuristic::AvailableCapacity),
            "utilization" => Ok(AcoHeuristic::Utilization),
            _ => Err(ConfigError::InvalidOption {
                name: "heuristic".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Parameters of the ant colony search. They are fixed for the whole simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntColonyParams {
    /// Number of ants in the colony.
    pub ants: usize,
    /// Number of iterations of a single search.
    pub iterations: usize,
    /// Pheromone exponent.
    pub alpha: f64,
    /// Heuristic exponent.
    pub beta: f64,
    pub evaporation_rate: f64,
    pub initial_pheromone: f64,
    pub heuristic: AcoHeuristic,
}

impl Default for AntColonyParams {
    fn default() -> Self {
        Self {
            ants: 10,
            iterations: 50,
            alpha: 1.0,
            beta: 2.0,
            evaporation_rate: 0.1,
            initial_pheromone: 0.1,
            heuristic: AcoHeuristic::Utilization,
        }
    }
}

impl AntColonyParams {
    /// Returns a copy of parameters overridden by config string options, e.g. `ants=20,evaporation=0.2`.
    pub fn with_options(&self, options: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut params = self.clone();
        if let Some(ants) = parse_option(options, "ants")? {
            params.ants = ants;
        }
        if let Some(iterations) = parse_option(options, "iterations")? {
            params.iterations = iterations;
        }
        if let Some(alpha) = parse_option(options, "alpha")? {
            params.alpha = alpha;
        }
        if let Some(beta) = parse_option(options, "beta")? {
            params.beta = beta;
        }
        if let Some(rate) = parse_option(options, "evaporation")? {
            params.evaporation_rate = rate;
        }
        if let Some(pheromone) = parse_option(options, "initial_pheromone")? {
            params.initial_pheromone = pheromone;
        }
        if let Some(heuristic) = options.get("heuristic") {
            params.heuristic = heuristic.parse()?;
        }
        Ok(params)
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Pheromone intensities, one row per ant and one column per candidate VM.
#[derive(Clone, Debug, PartialEq)]
pub struct PheromoneMatrix {
    ants: usize,
    vms: usize,
    values: Vec<f64>,
}

impl PheromoneMatrix {
    pub fn new(ants: usize, vms: usize, initial: f64) -> Self {
        Self {
            ants,
            vms,
            values: vec![initial; ants * vms],
        }
    }

    pub fn ants(&self) -> usize {
        self.ants
    }

    pub fn vms(&self) -> usize {
        self.vms
    }

    pub fn get(&self, ant: usize, vm: usize) -> f64 {
        self.values[ant * self.vms + vm]
    }

    pub fn row(&self, ant: usize) -> &[f64] {
        &self.values[ant * self.vms..(ant + 1) * self.vms]
    }

    /// Evaporates pheromone of each ant and deposits `1 / fitness` of the ant over its whole row.
    ///
    /// The deposit is not limited to the chosen VM and every ant keeps its own row.
    fn update(&mut self, fitnesses: &[f64], evaporation_rate: f64) {
        for (ant, fitness) in fitnesses.iter().enumerate() {
            let deposit = 1. / fitness;
            for value in &mut self.values[ant * self.vms..(ant + 1) * self.vms] {
                *value = (1. - evaporation_rate) * *value + deposit;
            }
        }
    }
}

/// Reason why an ant failed to construct a solution.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConstructionFailure {
    #[error("weight of candidate {0} is negative or not a number")]
    InvalidWeight(usize),
    #[error("total weight {0} can't be normalized")]
    DegenerateMass(f64),
    #[error("can't build roulette wheel: {0}")]
    Wheel(WeightedError),
}

/// Result of solution construction by a single ant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AntOutcome {
    Constructed(usize),
    Failed(ConstructionFailure),
}

impl AntOutcome {
    /// Returns chosen candidate index, if any.
    pub fn choice(&self) -> Option<usize> {
        match self {
            AntOutcome::Constructed(index) => Some(*index),
            AntOutcome::Failed(_) => None,
        }
    }
}

/// Complete trace of a single search.
#[derive(Clone, Debug, PartialEq)]
pub struct AcoRun {
    /// Selected candidate index.
    pub selection: Option<usize>,
    pub best_fitness: f64,
    /// Choices of all ants in the iteration which produced the best fitness (empty if no ant succeeded).
    pub best_solution: Vec<AntOutcome>,
    /// Best fitness seen so far, recorded after each iteration.
    pub best_fitness_history: Vec<f64>,
    pub failed_constructions: usize,
    /// Pheromone matrix after the last iteration.
    pub pheromones: PheromoneMatrix,
}

/// Returns fitness of running the task on the VM, lower is better.
///
/// Combines estimated execution time in milliseconds (`length / mips * 1000`) and VM utilization in [0, 1].
pub fn evaluate_fitness(task: &Task, vm: &VmHandle, utilization: f64) -> f64 {
    let execution_time = task.length / vm.mips * 1000.;
    let fitness = EXECUTION_TIME_WEIGHT * execution_time + UTILIZATION_WEIGHT * (utilization / 100.);
    if fitness.is_nan() {
        f64::INFINITY
    } else {
        fitness
    }
}

/// Bounded ant colony search over the candidate VMs of a host.
///
/// Each ant picks a VM with roulette-wheel sampling weighted by `pheromone^alpha * heuristic^beta`. Ant choices are
/// evaluated with [`evaluate_fitness`], and pheromone is updated only after all ants of the iteration are evaluated.
/// The iteration with the best fitness is remembered together with choices of all its ants, and the final answer is
/// the choice at the position equal to the index of the serving host.
///
/// The search itself ignores feasibility. The policy rejects the answer if it can't accommodate the task.
pub struct AntColony {
    params: AntColonyParams,
}

impl AntColony {
    pub fn new(params: AntColonyParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &AntColonyParams {
        &self.params
    }

    /// Runs the search and returns its full trace.
    pub fn run(
        &self,
        task: &Task,
        host: usize,
        candidates: &[VmHandle],
        probe: &CapacityProbe,
        rng: &mut dyn RngCore,
    ) -> AcoRun {
        let params = &self.params;
        // utilization is read once, the decision is instantaneous
        let utilizations: Vec<f64> = candidates.iter().map(|vm| probe.utilization(vm)).collect();
        let heuristics: Vec<f64> = utilizations
            .iter()
            .map(|&utilization| params.heuristic.value(utilization).powf(params.beta))
            .collect();

        let mut pheromones = PheromoneMatrix::new(params.ants, candidates.len(), params.initial_pheromone);
        let mut best_fitness = f64::INFINITY;
        let mut best_solution = Vec::new();
        let mut best_fitness_history = Vec::with_capacity(params.iterations);
        let mut failed_constructions = 0;

        for iteration in 0..params.iterations {
            let outcomes: Vec<AntOutcome> = (0..params.ants)
                .map(|ant| self.construct(pheromones.row(ant), &heuristics, rng))
                .collect();
            let fitnesses: Vec<f64> = outcomes
                .iter()
                .map(|outcome| match outcome {
                    AntOutcome::Constructed(index) => {
                        evaluate_fitness(task, &candidates[*index], utilizations[*index])
                    }
                    AntOutcome::Failed(reason) => {
                        debug!("ant failed to construct solution for task {}: {}", task.id, reason);
                        failed_constructions += 1;
                        f64::INFINITY
                    }
                })
                .collect();

            for &fitness in &fitnesses {
                if fitness < best_fitness {
                    best_fitness = fitness;
                    best_solution = outcomes.clone();
                }
            }
            pheromones.update(&fitnesses, params.evaporation_rate);
            best_fitness_history.push(best_fitness);
            trace!(
                "task {}: ACO iteration {} best fitness {}",
                task.id,
                iteration,
                best_fitness
            );
        }

        if failed_constructions > 0 {
            warn!(
                "task {}: {} of {} ant constructions failed",
                task.id,
                failed_constructions,
                params.ants * params.iterations
            );
        }

        let selection = best_solution
            .get(host)
            .and_then(AntOutcome::choice)
            .filter(|&index| index < candidates.len());

        AcoRun {
            selection,
            best_fitness,
            best_solution,
            best_fitness_history,
            failed_constructions,
            pheromones,
        }
    }

    /// Picks a candidate with roulette-wheel sampling.
    fn construct(&self, pheromones: &[f64], heuristics: &[f64], rng: &mut dyn RngCore) -> AntOutcome {
        let weights: Vec<f64> = pheromones
            .iter()
            .zip(heuristics)
            .map(|(pheromone, heuristic)| pheromone.powf(self.params.alpha) * heuristic)
            .collect();
        if let Some(index) = weights.iter().position(|weight| !(*weight >= 0.)) {
            return AntOutcome::Failed(ConstructionFailure::InvalidWeight(index));
        }
        // infinite total can't be sampled
        let total: f64 = weights.iter().sum();
        if !total.is_finite() || total <= 0. {
            return AntOutcome::Failed(ConstructionFailure::DegenerateMass(total));
        }
        match WeightedIndex::new(&weights) {
            Ok(wheel) => AntOutcome::Constructed(wheel.sample(rng)),
            Err(WeightedError::AllWeightsZero) => AntOutcome::Failed(ConstructionFailure::DegenerateMass(total)),
            Err(e) => AntOutcome::Failed(ConstructionFailure::Wheel(e)),
        }
    }
}

impl VmSelectionPolicy for AntColony {
    fn policy(&self) -> PlacementPolicy {
        PlacementPolicy::AntColony
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
        let run = self.run(task, host, candidates, probe, rng);
        debug!(
            "task {}: ACO selected {:?} with best fitness {}",
            task.id, run.selection, run.best_fitness
        );
        match run.selection {
            Some(index) if probe.is_feasible(task, &candidates[index]) => Ok(index),
            _ => Err(PlacementError::NoCapacity),
        }
    }
}
