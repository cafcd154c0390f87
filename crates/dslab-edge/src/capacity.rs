//! Capacity queries used by VM selection policies.

use crate::environment::UtilizationMonitor;
use crate::task::Task;
use crate::vm::VmHandle;

/// Answers capacity questions about VMs at the moment of a placement decision.
///
/// Capacities are measured in percents of VM processing power. Available capacity is `100 - utilization`, and a VM
/// is feasible for a task if the task's predicted required capacity does not exceed the available capacity.
pub struct CapacityProbe<'a> {
    monitor: &'a dyn UtilizationMonitor,
    time: f64,
}

impl<'a> CapacityProbe<'a> {
    pub fn new(monitor: &'a dyn UtilizationMonitor, time: f64) -> Self {
        Self { monitor, time }
    }

    /// Returns current VM utilization clamped to [0, 100].
    pub fn utilization(&self, vm: &VmHandle) -> f64 {
        self.monitor.utilization_of(vm, self.time).clamp(0., 100.)
    }

    pub fn available(&self, vm: &VmHandle) -> f64 {
        100. - self.utilization(vm)
    }

    /// Returns capacity required by the task on the VM's type.
    pub fn required(&self, task: &Task, vm: &VmHandle) -> f64 {
        task.predict_utilization(vm.vm_type)
    }

    pub fn is_feasible(&self, task: &Task, vm: &VmHandle) -> bool {
        self.required(task, vm) <= self.available(vm)
    }
}
