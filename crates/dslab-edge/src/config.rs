//! Orchestrator configuration.

pub mod options;

use serde::{Deserialize, Serialize};

use crate::common::ScenarioMode;
use crate::config::options::parse_config_value;
use crate::environment::StaticRegistry;
use crate::error::ConfigError;
use crate::tier_selector::{TaskLookupTable, TaskTypeProfile};
use crate::vm_selection_policies::ant_colony::AntColonyParams;
use crate::vm_selection_policy::{policy_resolver, PlacementPolicy, VmSelectionPolicy};

/// Holds raw orchestrator config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawOrchestratorConfig {
    pub policy: Option<String>,
    pub scenario: Option<ScenarioMode>,
    pub seed: Option<u64>,
    pub task_lookup_table: Option<Vec<TaskTypeProfile>>,
    pub ant_colony: Option<AntColonyParams>,
    pub infrastructure: Option<InfrastructureConfig>,
}

/// Holds configuration of a VM or a set of identical VMs.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct VmConfig {
    /// Processing rate in instructions per second.
    pub mips: f64,
    /// Number of such VMs.
    pub count: Option<u32>,
}

/// Holds configuration of a single host or a set of identical hosts.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct HostConfig {
    /// Host name.
    /// Should be set if count = 1.
    pub name: Option<String>,
    /// Host name prefix.
    /// Full name is produced by appending host instance number to the prefix.
    /// Should be set if count > 1.
    pub name_prefix: Option<String>,
    /// VMs running on the host.
    #[serde(default)]
    pub vms: Vec<VmConfig>,
    /// Number of such hosts.
    pub count: Option<u32>,
}

impl HostConfig {
    fn host_names(&self, default_prefix: &str) -> Vec<String> {
        let count = self.count.unwrap_or(1);
        if count == 1 {
            if let Some(name) = &self.name {
                return vec![name.clone()];
            }
        }
        let prefix = self.name_prefix.as_deref().unwrap_or(default_prefix);
        (0..count).map(|i| format!("{}{}", prefix, i)).collect()
    }
}

/// Edge and cloud hosts with their VMs.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize, Clone)]
pub struct InfrastructureConfig {
    #[serde(default)]
    pub edge_hosts: Vec<HostConfig>,
    #[serde(default)]
    pub cloud_hosts: Vec<HostConfig>,
}

impl InfrastructureConfig {
    /// Creates server registry with configured hosts and VMs.
    ///
    /// Hosts are named `edge-N` and `cloud-N` unless names are configured; hosts with duplicate names are merged.
    pub fn build_registry(&self) -> StaticRegistry {
        let mut registry = StaticRegistry::new();
        for host_config in &self.edge_hosts {
            for name in host_config.host_names("edge-") {
                let host = registry.add_edge_host(&name);
                for vm_config in &host_config.vms {
                    for _ in 0..vm_config.count.unwrap_or(1) {
                        registry.add_edge_vm(host, vm_config.mips);
                    }
                }
            }
        }
        for host_config in &self.cloud_hosts {
            for name in host_config.host_names("cloud-") {
                let host = registry.add_cloud_host(&name);
                for vm_config in &host_config.vms {
                    for _ in 0..vm_config.count.unwrap_or(1) {
                        registry.add_cloud_vm(host, vm_config.mips);
                    }
                }
            }
        }
        registry
    }
}

/// Represents orchestrator configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct OrchestratorConfig {
    /// VM selection policy with optional options, e.g. `NEXT_FIT` or `AntColony[ants=20]`.
    pub policy: String,
    /// Deployment scenario.
    pub scenario: ScenarioMode,
    /// Seed of the random source used by tier selection and stochastic policies.
    pub seed: u64,
    /// Task type properties indexed by task type.
    pub task_lookup_table: TaskLookupTable,
    /// Default parameters of the ant colony policy.
    pub ant_colony: AntColonyParams,
    /// Hosts and VMs used by demos.
    pub infrastructure: InfrastructureConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            policy: PlacementPolicy::FirstFit.to_string(),
            scenario: ScenarioMode::TwoTier,
            seed: 123,
            task_lookup_table: TaskLookupTable::default(),
            ant_colony: AntColonyParams::default(),
            infrastructure: InfrastructureConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Creates orchestrator config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(file_name).map_err(|source| ConfigError::Io {
            path: file_name.to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Creates orchestrator config from YAML string.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let raw: RawOrchestratorConfig = serde_yaml::from_str(content)?;
        let default = Self::default();
        let config = Self {
            policy: raw.policy.unwrap_or(default.policy),
            scenario: raw.scenario.unwrap_or(default.scenario),
            seed: raw.seed.unwrap_or(default.seed),
            task_lookup_table: raw
                .task_lookup_table
                .map(TaskLookupTable::new)
                .unwrap_or(default.task_lookup_table),
            ant_colony: raw.ant_colony.unwrap_or(default.ant_colony),
            infrastructure: raw.infrastructure.unwrap_or(default.infrastructure),
        };
        // fail early on unknown policy or malformed options
        config.create_policy()?;
        Ok(config)
    }

    /// Returns the policy tag of the configured policy.
    pub fn placement_policy(&self) -> Result<PlacementPolicy, ConfigError> {
        parse_config_value(&self.policy).0.parse()
    }

    /// Creates the configured VM selection policy.
    pub fn create_policy(&self) -> Result<Box<dyn VmSelectionPolicy>, ConfigError> {
        policy_resolver(&self.policy, &self.ant_colony)
    }
}
