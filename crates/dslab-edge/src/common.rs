//! Common types shared by placement components.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::options::normalize_name;
use crate::error::ConfigError;

/// Execution tier which runs a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Edge,
    Cloud,
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Tier::Edge => write!(f, "edge"),
            Tier::Cloud => write!(f, "cloud"),
        }
    }
}

/// Deployment scenario.
///
/// Defines whether tasks can be offloaded to the cloud and whether edge VMs are selected on the host serving the
/// task's device or across all edge hosts via the load balancer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScenarioMode {
    SingleTier,
    TwoTier,
    TwoTierWithLoadBalancer,
}

impl ScenarioMode {
    /// Returns true if tasks may be offloaded to the cloud tier.
    pub fn uses_cloud(&self) -> bool {
        !matches!(self, ScenarioMode::SingleTier)
    }

    /// Returns true if edge VMs are selected across all edge hosts.
    pub fn uses_load_balancer(&self) -> bool {
        matches!(self, ScenarioMode::TwoTierWithLoadBalancer)
    }
}

impl Display for ScenarioMode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ScenarioMode::SingleTier => write!(f, "SINGLE_TIER"),
            ScenarioMode::TwoTier => write!(f, "TWO_TIER"),
            ScenarioMode::TwoTierWithLoadBalancer => write!(f, "TWO_TIER_WITH_EO"),
        }
    }
}

impl FromStr for ScenarioMode {
    type Err = ConfigError;

    /// Accepts both `TWO_TIER_WITH_EO` and `TwoTierWithLoadBalancer` spellings, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "singletier" => Ok(ScenarioMode::SingleTier),
            "twotier" => Ok(ScenarioMode::TwoTier),
            "twotierwitheo" | "twotierwithloadbalancer" => Ok(ScenarioMode::TwoTierWithLoadBalancer),
            _ => Err(ConfigError::UnknownScenario(s.to_string())),
        }
    }
}

impl TryFrom<String> for ScenarioMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScenarioMode> for String {
    fn from(value: ScenarioMode) -> Self {
        value.to_string()
    }
}

/// Location of a mobile device.
///
/// In the modeled deployment there is exactly one edge host per access point, so the serving access point
/// identifies the edge host which receives the device's tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    pub serving_host: usize,
}

impl Location {
    pub fn new(serving_host: usize) -> Self {
        Self { serving_host }
    }
}

/// Position of a VM in the registry: host index and VM index within the host's list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VmSlot {
    pub host: usize,
    pub index: usize,
}

impl VmSlot {
    pub fn new(host: usize, index: usize) -> Self {
        Self { host, index }
    }
}
