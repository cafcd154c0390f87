//! Placement and configuration errors.

use thiserror::Error;

/// Reason why no VM was selected for a task.
///
/// Placement never panics: every policy either returns a VM or one of these values, and the caller decides whether
/// the task is dropped or retried.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PlacementError {
    /// No candidate VM has enough available capacity for the task.
    #[error("no VM with enough capacity")]
    NoCapacity,
    /// Empty candidate list, unknown host or cursor out of range.
    #[error("invalid selection state: {0}")]
    InvalidState(String),
}

impl PlacementError {
    /// Returns true if the error means that there is nowhere to run the task.
    ///
    /// Invalid state is handled the same way as missing capacity.
    pub fn is_no_capacity(&self) -> bool {
        matches!(self, PlacementError::NoCapacity | PlacementError::InvalidState(_))
    }
}

/// Error produced while loading orchestrator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("can't parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unknown placement policy: {0}")]
    UnknownPolicy(String),
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),
    #[error("invalid value {value:?} for option {name}")]
    InvalidOption { name: String, value: String },
}
