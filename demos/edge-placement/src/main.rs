use std::collections::BTreeMap;
use std::io::Write;

use clap::Parser;
use env_logger::Builder;
use log::{info, warn};
use rand::prelude::*;
use rand_pcg::Pcg64;

use dslab_edge::common::{Location, Tier};
use dslab_edge::config::OrchestratorConfig;
use dslab_edge::environment::{MobilityModel, ServerRegistry, UtilizationTable};
use dslab_edge::logger::FileLogger;
use dslab_edge::orchestrator::{EdgeOrchestrator, PlacementContext};
use dslab_edge::task::{Task, VmTypeUtilizationModel};

/// Places randomly generated tasks of mobile devices on edge and cloud VMs
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to orchestrator config
    #[clap(long, default_value = "config.yaml")]
    config: String,

    /// Number of generated tasks
    #[clap(long, default_value_t = 1000)]
    tasks: u64,

    /// Number of mobile devices
    #[clap(long, default_value_t = 50)]
    devices: u32,

    /// Seed of task generator (overrides orchestrator seed from config too)
    #[clap(long)]
    seed: Option<u64>,

    /// Save placement decisions to this CSV file
    #[clap(long)]
    log_file: Option<String>,
}

/// Devices are assigned to access points in turn and move to the next one every `period` seconds.
struct RotatingMobility {
    host_count: usize,
    period: f64,
}

impl MobilityModel for RotatingMobility {
    fn location_of(&self, device_id: u32, time: f64) -> Location {
        let step = (time / self.period) as usize;
        Location::new((device_id as usize + step) % self.host_count.max(1))
    }
}

struct RunningTask {
    finish_time: f64,
    vm_id: u32,
    utilization: f64,
}

fn init_logger() {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

fn main() {
    init_logger();
    let args = Args::parse();

    let mut config = match OrchestratorConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let registry = config.infrastructure.build_registry();
    let mobility = RotatingMobility {
        host_count: registry.edge_host_count(),
        period: 60.,
    };
    let mut monitor = UtilizationTable::new();

    let mut orchestrator = match EdgeOrchestrator::new(&config) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    orchestrator.initialize(registry.edge_host_count());
    if args.log_file.is_some() {
        orchestrator.set_logger(Box::new(FileLogger::new()));
    }
    info!(
        "policy {}, scenario {}, {} edge hosts, {} cloud hosts",
        orchestrator.policy().policy(),
        orchestrator.scenario(),
        registry.edge_host_count(),
        registry.cloud_host_count()
    );

    let mut rand = Pcg64::seed_from_u64(config.seed);
    let task_types = config.task_lookup_table.len().max(1);
    let mut running: Vec<RunningTask> = Vec::new();
    let mut placed: BTreeMap<Tier, u64> = BTreeMap::new();
    let mut failed: BTreeMap<Tier, u64> = BTreeMap::new();
    let mut time = 0.;

    for id in 0..args.tasks {
        time += rand.gen_range(0.0..0.5);
        running.retain(|task| {
            if task.finish_time <= time {
                monitor.add(task.vm_id, -task.utilization);
                false
            } else {
                true
            }
        });

        let task = Task::new(
            id,
            rand.gen_range(0..task_types),
            rand.gen_range(0..args.devices.max(1)),
            rand.gen_range(1000.0..20000.0),
            Box::new(VmTypeUtilizationModel::new(
                rand.gen_range(5.0..30.0),
                rand.gen_range(1.0..5.0),
                0.,
            )),
        );
        let ctx = PlacementContext {
            time,
            registry: &registry,
            mobility: &mobility,
            monitor: &monitor,
        };
        let decision = orchestrator.place(&task, &ctx);
        match decision.vm {
            Ok(vm) => {
                let utilization = task.predict_utilization(vm.vm_type);
                monitor.add(vm.id, utilization);
                running.push(RunningTask {
                    finish_time: time + task.length / vm.mips,
                    vm_id: vm.id,
                    utilization,
                });
                *placed.entry(decision.tier).or_default() += 1;
            }
            Err(_) => {
                *failed.entry(decision.tier).or_default() += 1;
            }
        }
    }

    if let Some(path) = &args.log_file {
        if let Err(e) = orchestrator.logger().save_log(path) {
            warn!("can't save decisions to {}: {}", path, e);
        }
    }

    println!("Simulated {} tasks in {:.2} s", args.tasks, time);
    for tier in [Tier::Edge, Tier::Cloud] {
        println!(
            "{}: placed {}, failed {}",
            tier,
            placed.get(&tier).unwrap_or(&0),
            failed.get(&tier).unwrap_or(&0)
        );
    }
}
