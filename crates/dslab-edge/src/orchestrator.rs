//! Edge orchestrator making placement decisions for arriving tasks.

use log::{debug, Level};
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::capacity::CapacityProbe;
use crate::cloud::select_cloud_vm;
use crate::common::{ScenarioMode, Tier, VmSlot};
use crate::config::OrchestratorConfig;
use crate::environment::{MobilityModel, ServerRegistry, UtilizationMonitor};
use crate::error::{ConfigError, PlacementError};
use crate::logger::{DecisionRecord, PlacementLogger, StdoutLogger};
use crate::state::SelectionState;
use crate::task::Task;
use crate::tier_selector::{TaskLookupTable, TierSelector};
use crate::vm::VmHandle;
use crate::vm_selection_policy::VmSelectionPolicy;

/// Collaborators queried during a single placement decision.
pub struct PlacementContext<'a> {
    /// Decision time.
    pub time: f64,
    pub registry: &'a dyn ServerRegistry,
    pub mobility: &'a dyn MobilityModel,
    pub monitor: &'a dyn UtilizationMonitor,
}

/// Tier and VM selected for a task.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementDecision {
    pub tier: Tier,
    pub vm: Result<VmHandle, PlacementError>,
}

/// Orchestrator decides where each arriving task runs: first the tier, then the VM within the tier.
///
/// Cloud VMs are selected with the least loaded strategy. Edge VMs are selected by the configured policy either
/// among the VMs of the host serving the task's device or, in load-balanced scenario, across all edge hosts.
///
/// Decisions are made one at a time. The orchestrator owns the cursors of cursor-based policies and the random
/// source, which is seeded from config, so runs with the same seed and inputs produce the same decisions.
pub struct EdgeOrchestrator {
    tier_selector: TierSelector,
    policy: Box<dyn VmSelectionPolicy>,
    state: SelectionState,
    rng: Pcg64,
    logger: Box<dyn PlacementLogger>,
}

impl EdgeOrchestrator {
    /// Creates orchestrator from config.
    pub fn new(config: &OrchestratorConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_policy(
            config.scenario,
            config.task_lookup_table.clone(),
            config.create_policy()?,
            config.seed,
        ))
    }

    /// Creates orchestrator with explicitly specified policy.
    pub fn with_policy(
        scenario: ScenarioMode,
        lookup_table: TaskLookupTable,
        policy: Box<dyn VmSelectionPolicy>,
        seed: u64,
    ) -> Self {
        Self {
            tier_selector: TierSelector::new(scenario, lookup_table),
            policy,
            state: SelectionState::default(),
            rng: Pcg64::seed_from_u64(seed),
            logger: Box::new(StdoutLogger::new()),
        }
    }

    /// Creates cursors for the given number of edge hosts. Should be called before the first decision.
    pub fn initialize(&mut self, edge_host_count: usize) {
        self.state = SelectionState::new(edge_host_count);
    }

    pub fn set_logger(&mut self, logger: Box<dyn PlacementLogger>) {
        self.logger = logger;
    }

    pub fn logger(&self) -> &dyn PlacementLogger {
        self.logger.as_ref()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn scenario(&self) -> ScenarioMode {
        self.tier_selector.scenario()
    }

    pub fn policy(&self) -> &dyn VmSelectionPolicy {
        self.policy.as_ref()
    }

    /// Selects the tier which runs the task.
    pub fn get_device_to_offload(&mut self, task: &Task) -> Tier {
        self.tier_selector.select_tier(task, &mut self.rng)
    }

    /// Selects VM for the task in the given tier.
    pub fn get_vm_to_offload(
        &mut self,
        task: &Task,
        tier: Tier,
        ctx: &PlacementContext,
    ) -> Result<VmHandle, PlacementError> {
        match tier {
            Tier::Cloud => {
                let probe = CapacityProbe::new(ctx.monitor, ctx.time);
                let VmSlot { host, index } = select_cloud_vm(task, ctx.registry, &probe)?;
                debug!("task {}: selected cloud VM {} on host {}", task.id, index, host);
                ctx.registry
                    .cloud_vms(host)
                    .get(index)
                    .cloned()
                    .ok_or_else(|| PlacementError::InvalidState(format!("cloud host {} has no VM {}", host, index)))
            }
            Tier::Edge if self.scenario().uses_load_balancer() => self.select_vm_on_load_balancer(task, ctx),
            Tier::Edge => self.select_vm_on_host(task, ctx),
        }
    }

    /// Selects VM among the VMs of the edge host serving the task's device.
    pub fn select_vm_on_host(&mut self, task: &Task, ctx: &PlacementContext) -> Result<VmHandle, PlacementError> {
        let host = ctx.mobility.location_of(task.device_id, ctx.time).serving_host;
        if host >= ctx.registry.edge_host_count() {
            return Err(PlacementError::InvalidState(format!(
                "device {} is served by unknown host {}",
                task.device_id, host
            )));
        }
        let candidates = ctx.registry.edge_vms(host);
        debug!(
            "task {}: selecting VM on host {} among {} candidates",
            task.id,
            host,
            candidates.len()
        );
        let probe = CapacityProbe::new(ctx.monitor, ctx.time);
        let index = self
            .policy
            .select_vm(task, host, candidates, &probe, &mut self.state, &mut self.rng)?;
        candidates
            .get(index)
            .cloned()
            .ok_or_else(|| PlacementError::InvalidState(format!("host {} has no VM {}", host, index)))
    }

    /// Selects VM across all edge hosts.
    pub fn select_vm_on_load_balancer(
        &mut self,
        task: &Task,
        ctx: &PlacementContext,
    ) -> Result<VmHandle, PlacementError> {
        let probe = CapacityProbe::new(ctx.monitor, ctx.time);
        let VmSlot { host, index } =
            self.policy
                .select_vm_across_hosts(task, ctx.registry, &probe, &mut self.state, &mut self.rng)?;
        ctx.registry
            .edge_vms(host)
            .get(index)
            .cloned()
            .ok_or_else(|| PlacementError::InvalidState(format!("host {} has no VM {}", host, index)))
    }

    /// Selects tier and VM for the task and records the decision in the logger.
    pub fn place(&mut self, task: &Task, ctx: &PlacementContext) -> PlacementDecision {
        let tier = self.get_device_to_offload(task);
        let vm = self.get_vm_to_offload(task, tier, ctx);
        let (level, error) = match &vm {
            Ok(_) => (Level::Info, String::new()),
            Err(e) => (Level::Warn, e.to_string()),
        };
        self.logger.log_decision(
            level,
            DecisionRecord {
                time: ctx.time,
                task_id: task.id,
                task_type: task.task_type,
                tier,
                host: vm.as_ref().ok().map(|vm| vm.host),
                vm_id: vm.as_ref().ok().map(|vm| vm.id),
                error,
            },
        );
        PlacementDecision { tier, vm }
    }
}
