/// Logging facilities to record placement decisions.
use std::fmt::{Display, Formatter};
use std::fs::File;

use log::Level;
use serde::Serialize;

use crate::common::Tier;

/// Outcome of a single placement decision.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DecisionRecord {
    pub time: f64,
    pub task_id: u64,
    pub task_type: usize,
    pub tier: Tier,
    pub host: Option<usize>,
    pub vm_id: Option<u32>,
    /// Empty if a VM was selected, otherwise the failure reason.
    pub error: String,
}

impl DecisionRecord {
    pub fn is_success(&self) -> bool {
        self.vm_id.is_some()
    }
}

impl Display for DecisionRecord {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match (self.host, self.vm_id) {
            (Some(host), Some(vm_id)) => write!(
                f,
                "[{:.3}] task {} (type {}) placed on {} host {} vm {}",
                self.time, self.task_id, self.task_type, self.tier, host, vm_id
            ),
            _ => write!(
                f,
                "[{:.3}] task {} (type {}) not placed on {}: {}",
                self.time, self.task_id, self.task_type, self.tier, self.error
            ),
        }
    }
}

pub trait PlacementLogger {
    fn log_decision(&mut self, level: Level, record: DecisionRecord);

    fn save_log(&self, _path: &str) -> Result<(), std::io::Error>;
}

/// Forwards decisions to the `log` facade.
#[derive(Default)]
pub struct StdoutLogger {}

impl StdoutLogger {
    pub fn new() -> Self {
        Self {}
    }
}

impl PlacementLogger for StdoutLogger {
    fn log_decision(&mut self, level: Level, record: DecisionRecord) {
        log::log!(level, "{}", record);
    }

    fn save_log(&self, _path: &str) -> Result<(), std::io::Error> {
        Ok(())
    }
}

/// Keeps decisions in memory and saves them as CSV.
pub struct FileLogger {
    log: Vec<DecisionRecord>,
    level: Level,
}

impl Default for FileLogger {
    fn default() -> Self {
        Self {
            log: Vec::new(),
            level: Level::Info,
        }
    }
}

impl FileLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates logger which keeps only decisions with level not more verbose than `level`.
    pub fn with_level(level: Level) -> Self {
        Self { log: Vec::new(), level }
    }

    pub fn records(&self) -> &[DecisionRecord] {
        &self.log
    }
}

impl PlacementLogger for FileLogger {
    fn log_decision(&mut self, level: Level, record: DecisionRecord) {
        if self.level < level {
            return;
        }
        self.log.push(record);
    }

    fn save_log(&self, path: &str) -> Result<(), std::io::Error> {
        let file = File::create(path)?;
        let mut wtr = csv::Writer::from_writer(file);
        for entry in &self.log {
            wtr.serialize(entry)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
