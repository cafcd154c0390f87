use rand::SeedableRng;
use rand_pcg::Pcg64;

use dslab_edge::capacity::CapacityProbe;
use dslab_edge::common::VmSlot;
use dslab_edge::environment::{StaticRegistry, UtilizationTable};
use dslab_edge::error::PlacementError;
use dslab_edge::state::SelectionState;
use dslab_edge::task::{ConstUtilizationModel, Task};
use dslab_edge::vm_selection_policies::ant_colony::AntColonyParams;
use dslab_edge::vm_selection_policy::{create_policy, PlacementPolicy};

// Edge hosts with VMs of the given utilizations.
fn hosts(utilizations: &[&[f64]]) -> (StaticRegistry, UtilizationTable) {
    let mut registry = StaticRegistry::new();
    let mut table = UtilizationTable::new();
    for (i, host_utilizations) in utilizations.iter().enumerate() {
        let host = registry.add_edge_host(&format!("edge-{}", i));
        for &utilization in host_utilizations.iter() {
            let vm = registry.add_edge_vm(host, 1000.).unwrap();
            table.set(vm.id, utilization);
        }
    }
    (registry, table)
}

fn task(required: f64) -> Task {
    Task::new(0, 0, 0, 1000., Box::new(ConstUtilizationModel::new(required)))
}

fn select_sequence(
    tag: PlacementPolicy,
    registry: &StaticRegistry,
    table: &UtilizationTable,
    required: f64,
    count: usize,
) -> Vec<Result<VmSlot, PlacementError>> {
    let policy = create_policy(tag, &AntColonyParams::default());
    let probe = CapacityProbe::new(table, 0.);
    let mut state = SelectionState::new(2);
    let mut rng = Pcg64::seed_from_u64(123);
    (0..count)
        .map(|_| policy.select_vm_across_hosts(&task(required), registry, &probe, &mut state, &mut rng))
        .collect()
}

#[test]
fn test_cursor_policies_alternate_hosts() {
    let (registry, table) = hosts(&[&[0., 0.], &[0., 0.]]);
    for tag in [PlacementPolicy::NextFit, PlacementPolicy::RoundRobin] {
        let slots = select_sequence(tag, &registry, &table, 10., 5);
        assert_eq!(
            slots,
            vec![
                Ok(VmSlot::new(0, 0)),
                Ok(VmSlot::new(1, 0)),
                Ok(VmSlot::new(0, 1)),
                Ok(VmSlot::new(1, 1)),
                Ok(VmSlot::new(0, 0)),
            ],
            "{}",
            tag
        );
    }
}

#[test]
fn test_cursor_policies_skip_full_host() {
    let (registry, table) = hosts(&[&[95., 95.], &[0., 0.]]);
    for tag in [PlacementPolicy::NextFit, PlacementPolicy::RoundRobin] {
        let slots = select_sequence(tag, &registry, &table, 10., 3);
        assert_eq!(
            slots,
            vec![Ok(VmSlot::new(1, 0)), Ok(VmSlot::new(1, 1)), Ok(VmSlot::new(1, 0))],
            "{}",
            tag
        );
    }
}

#[test]
fn test_next_fit_cursors() {
    let (registry, table) = hosts(&[&[95., 95.], &[0., 95.]]);
    let policy = create_policy(PlacementPolicy::NextFit, &AntColonyParams::default());
    let probe = CapacityProbe::new(&table, 0.);
    let mut state = SelectionState::new(2);
    let mut rng = Pcg64::seed_from_u64(1);

    let slot = policy
        .select_vm_across_hosts(&task(10.), &registry, &probe, &mut state, &mut rng)
        .unwrap();
    assert_eq!(slot, VmSlot::new(1, 0));
    assert_eq!(state.last_host_index(), Some(1));
    assert_eq!(state.last_vm_index(0), Ok(Some(1)));
    assert_eq!(state.last_vm_index(1), Ok(Some(0)));

    // host 0 is scanned again, host 1 continues after VM 0 and wraps around to it
    let slot = policy
        .select_vm_across_hosts(&task(50.), &registry, &probe, &mut state, &mut rng)
        .unwrap();
    assert_eq!(slot, VmSlot::new(1, 0));
    assert_eq!(state.last_vm_index(1), Ok(Some(0)));

    let result = policy.select_vm_across_hosts(&task(101.), &registry, &probe, &mut state, &mut rng);
    assert_eq!(result, Err(PlacementError::NoCapacity));
    // every host visited once
    assert_eq!(state.last_host_index(), Some(1));
    assert_eq!(state.last_vm_index(0), Ok(Some(1)));
}

#[test]
fn test_flat_scans() {
    // available capacities: [10, 40], [90, 50], [30]
    let (registry, table) = hosts(&[&[90., 60.], &[10., 50.], &[70.]]);
    let expected = [
        (PlacementPolicy::FirstFit, VmSlot::new(0, 1)),
        (PlacementPolicy::BestFit, VmSlot::new(2, 0)),
        (PlacementPolicy::WorstFit, VmSlot::new(1, 0)),
        (PlacementPolicy::MaxMin, VmSlot::new(1, 0)),
    ];
    for (tag, slot) in expected {
        let policy = create_policy(tag, &AntColonyParams::default());
        let probe = CapacityProbe::new(&table, 0.);
        let mut state = SelectionState::new(3);
        let result =
            policy.select_vm_across_hosts(&task(25.), &registry, &probe, &mut state, &mut Pcg64::seed_from_u64(0));
        assert_eq!(result, Ok(slot), "{}", tag);
    }
}

#[test]
fn test_random_fit_across_hosts() {
    let (registry, table) = hosts(&[&[0., 95.], &[95.]]);
    let slots = select_sequence(PlacementPolicy::RandomFit, &registry, &table, 10., 200);
    assert!(slots.contains(&Ok(VmSlot::new(0, 0))));
    assert!(slots.contains(&Err(PlacementError::NoCapacity)));
    for slot in slots.into_iter().flatten() {
        assert_eq!(slot, VmSlot::new(0, 0));
    }
}

#[test]
fn test_no_capacity_and_empty_registry() {
    let (registry, table) = hosts(&[&[95.], &[95., 95.]]);
    let (empty_registry, empty_table) = hosts(&[&[], &[]]);
    for tag in PlacementPolicy::ALL {
        if tag == PlacementPolicy::AntColony {
            continue;
        }
        assert_eq!(
            select_sequence(tag, &registry, &table, 10., 1),
            vec![Err(PlacementError::NoCapacity)],
            "{}",
            tag
        );
        let result = select_sequence(tag, &empty_registry, &empty_table, 10., 1);
        assert!(matches!(result[0], Err(PlacementError::InvalidState(_))), "{}", tag);
    }
}

#[test]
// Ant colony has no load-balanced variant, so it never finds a VM across hosts.
fn test_ant_colony_finds_nothing_across_hosts() {
    let (registry, table) = hosts(&[&[0.], &[0., 0.]]);
    let results = select_sequence(PlacementPolicy::AntColony, &registry, &table, 10., 3);
    for result in results {
        assert_eq!(result, Err(PlacementError::NoCapacity));
        assert!(result.unwrap_err().is_no_capacity());
    }
}
