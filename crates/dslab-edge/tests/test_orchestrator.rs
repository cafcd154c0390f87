use log::Level;

use dslab_edge::common::{ScenarioMode, Tier};
use dslab_edge::environment::{StaticMobility, StaticRegistry, UtilizationTable};
use dslab_edge::error::PlacementError;
use dslab_edge::logger::FileLogger;
use dslab_edge::orchestrator::{EdgeOrchestrator, PlacementContext};
use dslab_edge::task::{ConstUtilizationModel, Task, VmTypeUtilizationModel};
use dslab_edge::tier_selector::TaskLookupTable;
use dslab_edge::vm_selection_policies::ant_colony::AntColonyParams;
use dslab_edge::vm_selection_policy::{create_policy, PlacementPolicy};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Environment {
    registry: StaticRegistry,
    mobility: StaticMobility,
    table: UtilizationTable,
}

impl Environment {
    // Two edge hosts with two VMs each and a cloud host with three VMs.
    fn new() -> Self {
        let mut registry = StaticRegistry::new();
        for name in ["edge-0", "edge-1"] {
            let host = registry.add_edge_host(name);
            for _ in 0..2 {
                registry.add_edge_vm(host, 10000.);
            }
        }
        let cloud = registry.add_cloud_host("datacenter");
        for _ in 0..3 {
            registry.add_cloud_vm(cloud, 100000.);
        }
        Self {
            registry,
            mobility: StaticMobility::new(0),
            table: UtilizationTable::new(),
        }
    }

    fn ctx(&self) -> PlacementContext<'_> {
        PlacementContext {
            time: 10.,
            registry: &self.registry,
            mobility: &self.mobility,
            monitor: &self.table,
        }
    }
}

fn task(id: u64, task_type: usize, device_id: u32, required: f64) -> Task {
    Task::new(id, task_type, device_id, 5000., Box::new(ConstUtilizationModel::new(required)))
}

fn new_orchestrator(
    scenario: ScenarioMode,
    probabilities: &[f64],
    policy: PlacementPolicy,
    seed: u64,
) -> EdgeOrchestrator {
    let mut orchestrator = EdgeOrchestrator::with_policy(
        scenario,
        TaskLookupTable::from_probabilities(probabilities),
        create_policy(policy, &AntColonyParams::default()),
        seed,
    );
    orchestrator.initialize(2);
    orchestrator
}

#[test]
fn test_single_tier_always_edge() {
    init_logger();
    let mut orchestrator = new_orchestrator(ScenarioMode::SingleTier, &[100.], PlacementPolicy::FirstFit, 123);
    for id in 0..100 {
        assert_eq!(orchestrator.get_device_to_offload(&task(id, 0, 0, 10.)), Tier::Edge);
    }
}

#[test]
fn test_tier_selection_by_probability() {
    init_logger();
    // type 0 always goes to the cloud, type 1 never, type 2 is missing from the table
    let mut orchestrator = new_orchestrator(ScenarioMode::TwoTier, &[100., -1.], PlacementPolicy::FirstFit, 123);
    for id in 0..100 {
        assert_eq!(orchestrator.get_device_to_offload(&task(id, 0, 0, 10.)), Tier::Cloud);
        assert_eq!(orchestrator.get_device_to_offload(&task(id, 1, 0, 10.)), Tier::Edge);
        assert_eq!(orchestrator.get_device_to_offload(&task(id, 2, 0, 10.)), Tier::Edge);
    }
}

#[test]
fn test_tier_selection_frequency() {
    let mut orchestrator = new_orchestrator(ScenarioMode::TwoTier, &[30.], PlacementPolicy::FirstFit, 123);
    let cloud_count = (0..10000)
        .filter(|&id| orchestrator.get_device_to_offload(&task(id, 0, 0, 10.)) == Tier::Cloud)
        .count();
    // 31 of 101 possible draws select the cloud
    assert!((2700..3450).contains(&cloud_count), "{}", cloud_count);
}

#[test]
fn test_cloud_least_loaded_vm() {
    init_logger();
    let mut env = Environment::new();
    let mut orchestrator = new_orchestrator(ScenarioMode::TwoTier, &[100.], PlacementPolicy::FirstFit, 123);
    let cloud_vms: Vec<u32> = env.registry.all_vms().skip(4).map(|vm| vm.id).collect();
    env.table.set(cloud_vms[0], 60.);
    env.table.set(cloud_vms[1], 20.);
    env.table.set(cloud_vms[2], 20.);

    let vm = orchestrator.get_vm_to_offload(&task(0, 0, 0, 10.), Tier::Cloud, &env.ctx()).unwrap();
    // ties are resolved in favor of the first VM
    assert_eq!(vm.id, cloud_vms[1]);

    // the least loaded VM is skipped if it can't fit the task, so the cloud is full
    let result = orchestrator.get_vm_to_offload(&task(1, 0, 0, 90.), Tier::Cloud, &env.ctx());
    assert_eq!(result, Err(PlacementError::NoCapacity));
}

#[test]
fn test_cloud_uses_cloud_utilization() {
    let env = Environment::new();
    let mut orchestrator = new_orchestrator(ScenarioMode::TwoTier, &[100.], PlacementPolicy::FirstFit, 123);
    let heavy_at_edge = Task::new(0, 0, 0, 5000., Box::new(VmTypeUtilizationModel::new(200., 5., 50.)));
    let vm = orchestrator.get_vm_to_offload(&heavy_at_edge, Tier::Cloud, &env.ctx()).unwrap();
    assert_eq!(vm.host, 0);
    let result = orchestrator.get_vm_to_offload(&heavy_at_edge, Tier::Edge, &env.ctx());
    assert_eq!(result, Err(PlacementError::NoCapacity));
}

#[test]
fn test_cloud_without_vms() {
    let mut registry = StaticRegistry::new();
    let host = registry.add_edge_host("edge-0");
    registry.add_edge_vm(host, 1000.);
    let mobility = StaticMobility::new(0);
    let table = UtilizationTable::new();
    let ctx = PlacementContext {
        time: 0.,
        registry: &registry,
        mobility: &mobility,
        monitor: &table,
    };
    let mut orchestrator = new_orchestrator(ScenarioMode::TwoTier, &[100.], PlacementPolicy::FirstFit, 123);
    let result = orchestrator.get_vm_to_offload(&task(0, 0, 0, 10.), Tier::Cloud, &ctx);
    assert!(matches!(result, Err(PlacementError::InvalidState(_))));
}

#[test]
fn test_edge_vm_on_serving_host() {
    init_logger();
    let mut env = Environment::new();
    env.mobility.set_location(7, 1);
    let mut orchestrator = new_orchestrator(ScenarioMode::TwoTier, &[-1.], PlacementPolicy::FirstFit, 123);

    let vm = orchestrator.get_vm_to_offload(&task(0, 0, 7, 10.), Tier::Edge, &env.ctx()).unwrap();
    assert_eq!(vm.host, 1);
    let vm = orchestrator.get_vm_to_offload(&task(1, 0, 3, 10.), Tier::Edge, &env.ctx()).unwrap();
    assert_eq!(vm.host, 0);

    // device 7 moved to an unknown access point
    env.mobility.set_location(7, 5);
    let result = orchestrator.get_vm_to_offload(&task(2, 0, 7, 10.), Tier::Edge, &env.ctx());
    assert!(matches!(result, Err(PlacementError::InvalidState(_))));
}

#[test]
fn test_cursors_are_kept_between_decisions() {
    let env = Environment::new();
    let mut orchestrator = new_orchestrator(ScenarioMode::TwoTier, &[-1.], PlacementPolicy::RoundRobin, 123);
    let hosts: Vec<(usize, u32)> = (0..4)
        .map(|id| {
            let vm = orchestrator
                .get_vm_to_offload(&task(id, 0, 0, 10.), Tier::Edge, &env.ctx())
                .unwrap();
            (vm.host, vm.id)
        })
        .collect();
    assert_eq!(hosts, vec![(0, 0), (0, 1), (0, 0), (0, 1)]);
    assert_eq!(orchestrator.state().last_vm_index(0), Ok(Some(1)));
    assert_eq!(orchestrator.state().last_vm_index(1), Ok(None));
}

#[test]
fn test_uninitialized_orchestrator() {
    let env = Environment::new();
    let mut orchestrator = EdgeOrchestrator::with_policy(
        ScenarioMode::TwoTier,
        TaskLookupTable::from_probabilities(&[-1.]),
        create_policy(PlacementPolicy::NextFit, &AntColonyParams::default()),
        123,
    );
    let result = orchestrator.get_vm_to_offload(&task(0, 0, 0, 10.), Tier::Edge, &env.ctx());
    assert!(matches!(result, Err(PlacementError::InvalidState(_))));
}

#[test]
fn test_load_balancer_scenario() {
    init_logger();
    let env = Environment::new();
    let mut orchestrator = new_orchestrator(
        ScenarioMode::TwoTierWithLoadBalancer,
        &[-1.],
        PlacementPolicy::NextFit,
        123,
    );
    // all devices are served by host 0, but the load balancer spreads tasks over both hosts
    let placed: Vec<(usize, u32)> = (0..4)
        .map(|id| {
            let decision = orchestrator.place(&task(id, 0, 0, 10.), &env.ctx());
            assert_eq!(decision.tier, Tier::Edge);
            let vm = decision.vm.unwrap();
            (vm.host, vm.id)
        })
        .collect();
    assert_eq!(placed, vec![(0, 0), (1, 2), (0, 1), (1, 3)]);
    assert_eq!(orchestrator.state().last_host_index(), Some(1));

    let mut orchestrator = new_orchestrator(
        ScenarioMode::TwoTierWithLoadBalancer,
        &[-1.],
        PlacementPolicy::AntColony,
        123,
    );
    let decision = orchestrator.place(&task(0, 0, 0, 10.), &env.ctx());
    assert_eq!(decision.tier, Tier::Edge);
    assert_eq!(decision.vm, Err(PlacementError::NoCapacity));
}

#[test]
fn test_same_seed_same_decisions() {
    let env = Environment::new();
    for policy in PlacementPolicy::ALL {
        let decide = |seed: u64| {
            let mut orchestrator = new_orchestrator(ScenarioMode::TwoTier, &[40., 70.], policy, seed);
            (0..30)
                .map(|id| orchestrator.place(&task(id, id as usize % 2, id as u32 % 3, 10.), &env.ctx()))
                .collect::<Vec<_>>()
        };
        assert_eq!(decide(7), decide(7), "{}", policy);
    }
}

#[test]
fn test_decisions_are_logged() {
    let mut env = Environment::new();
    env.table.set(0, 95.);
    env.table.set(1, 95.);
    let mut orchestrator = new_orchestrator(ScenarioMode::SingleTier, &[], PlacementPolicy::WorstFit, 123);
    orchestrator.set_logger(Box::new(FileLogger::with_level(Level::Info)));

    // device 1 is served by host 1 after moving
    env.mobility.set_location(1, 1);
    let decisions = [
        orchestrator.place(&task(0, 0, 0, 10.), &env.ctx()),
        orchestrator.place(&task(1, 0, 1, 10.), &env.ctx()),
    ];
    assert_eq!(decisions[0].vm, Err(PlacementError::NoCapacity));
    assert_eq!(decisions[1].vm.as_ref().map(|vm| vm.id), Ok(2));

    let path = std::env::temp_dir().join(format!("dslab-edge-orchestrator-{}.csv", std::process::id()));
    orchestrator.logger().save_log(path.to_str().unwrap()).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "10.0,0,0,Edge,,,no VM with enough capacity");
    assert_eq!(lines[2], "10.0,1,0,Edge,1,2,");
}
