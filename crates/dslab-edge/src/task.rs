//! Tasks and their CPU utilization models.

use dyn_clone::{clone_trait_object, DynClone};

use crate::vm::VmType;

/// A CPU utilization model predicts how much of a VM's capacity (in percents) a task will require on a VM of the
/// given type.
pub trait CpuUtilizationModel: DynClone {
    fn predict_utilization(&self, vm_type: VmType) -> f64;
}

clone_trait_object!(CpuUtilizationModel);

/// The simplest model, the same utilization on every VM type.
#[derive(Clone)]
pub struct ConstUtilizationModel {
    utilization: f64,
}

impl ConstUtilizationModel {
    pub fn new(utilization: f64) -> Self {
        Self { utilization }
    }
}

impl CpuUtilizationModel for ConstUtilizationModel {
    fn predict_utilization(&self, _vm_type: VmType) -> f64 {
        self.utilization
    }
}

/// Utilization defined separately for each VM type.
#[derive(Clone)]
pub struct VmTypeUtilizationModel {
    edge: f64,
    cloud: f64,
    mobile: f64,
}

impl VmTypeUtilizationModel {
    pub fn new(edge: f64, cloud: f64, mobile: f64) -> Self {
        Self { edge, cloud, mobile }
    }
}

impl CpuUtilizationModel for VmTypeUtilizationModel {
    fn predict_utilization(&self, vm_type: VmType) -> f64 {
        match vm_type {
            VmType::Edge => self.edge,
            VmType::Cloud => self.cloud,
            VmType::Mobile => self.mobile,
        }
    }
}

/// Task submitted by a mobile device.
#[derive(Clone)]
pub struct Task {
    pub id: u64,
    /// Index of the task type in the task lookup table.
    pub task_type: usize,
    pub device_id: u32,
    /// Total length in instructions.
    pub length: f64,
    utilization_model: Box<dyn CpuUtilizationModel>,
}

impl Task {
    pub fn new(
        id: u64,
        task_type: usize,
        device_id: u32,
        length: f64,
        utilization_model: Box<dyn CpuUtilizationModel>,
    ) -> Self {
        Self {
            id,
            task_type,
            device_id,
            length,
            utilization_model,
        }
    }

    /// Returns required capacity (0-100) of this task on a VM of the given type.
    pub fn predict_utilization(&self, vm_type: VmType) -> f64 {
        self.utilization_model.predict_utilization(vm_type)
    }
}
