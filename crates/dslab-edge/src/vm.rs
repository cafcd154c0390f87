//! Virtual machine handles.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Type of VM. Task utilization predictions depend on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmType {
    Edge,
    Cloud,
    Mobile,
}

impl Display for VmType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            VmType::Edge => write!(f, "edge"),
            VmType::Cloud => write!(f, "cloud"),
            VmType::Mobile => write!(f, "mobile"),
        }
    }
}

/// Read-only view of a VM owned by the server registry.
///
/// The current CPU utilization is not stored here, it is queried from the utilization monitor at decision time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VmHandle {
    pub id: u32,
    pub vm_type: VmType,
    /// Peak processing rate in instructions per second.
    pub mips: f64,
    /// Index of the owning host within its tier.
    pub host: usize,
}

impl VmHandle {
    pub fn new(id: u32, vm_type: VmType, mips: f64, host: usize) -> Self {
        Self {
            id,
            vm_type,
            mips,
            host,
        }
    }
}
