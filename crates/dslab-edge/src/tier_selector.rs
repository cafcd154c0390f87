//! Selection of the execution tier.

use log::warn;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::common::{ScenarioMode, Tier};
use crate::task::Task;

/// Properties of a task type used by the orchestrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskTypeProfile {
    pub name: Option<String>,
    /// Probability (in percents) of offloading the task to the cloud.
    pub cloud_selection_probability: f64,
}

/// Task type properties indexed by task type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskLookupTable {
    profiles: Vec<TaskTypeProfile>,
}

impl TaskLookupTable {
    pub fn new(profiles: Vec<TaskTypeProfile>) -> Self {
        Self { profiles }
    }

    /// Creates table from cloud selection probabilities of task types.
    pub fn from_probabilities(probabilities: &[f64]) -> Self {
        Self::new(
            probabilities
                .iter()
                .map(|&cloud_selection_probability| TaskTypeProfile {
                    name: None,
                    cloud_selection_probability,
                })
                .collect(),
        )
    }

    pub fn get(&self, task_type: usize) -> Option<&TaskTypeProfile> {
        self.profiles.get(task_type)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Decides whether a task runs in the cloud or at the edge.
pub struct TierSelector {
    scenario: ScenarioMode,
    lookup_table: TaskLookupTable,
}

impl TierSelector {
    pub fn new(scenario: ScenarioMode, lookup_table: TaskLookupTable) -> Self {
        Self { scenario, lookup_table }
    }

    pub fn scenario(&self) -> ScenarioMode {
        self.scenario
    }

    /// In single tier scenario always returns edge. Otherwise draws a uniform integer in [0, 100] and offloads the
    /// task to the cloud if the draw does not exceed the cloud selection probability of the task type.
    ///
    /// Tasks of types missing from the lookup table stay at the edge (the draw is consumed anyway).
    pub fn select_tier(&self, task: &Task, rng: &mut dyn RngCore) -> Tier {
        if !self.scenario.uses_cloud() {
            return Tier::Edge;
        }
        let draw: u32 = rng.gen_range(0..=100);
        match self.lookup_table.get(task.task_type) {
            Some(profile) if f64::from(draw) <= profile.cloud_selection_probability => Tier::Cloud,
            Some(_) => Tier::Edge,
            None => {
                warn!("task {} has unknown type {}, keeping it at the edge", task.id, task.task_type);
                Tier::Edge
            }
        }
    }
}
