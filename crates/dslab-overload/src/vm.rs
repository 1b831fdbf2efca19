//! Representation of virtual machine.

use crate::error::Result;
use crate::load_model::UtilizationModel;

/// Represents virtual machine (VM).
///
// VM is characterized by its ID, resource requirements (CPU, memory in MB and bandwidth) and utilization models.
// The latter model the actual resource utilization of VM in time as a fraction of its requirements.
#[derive(Clone)]
pub struct VirtualMachine {
    pub id: u32,
    pub cpu_usage: u32,
    pub memory_usage: u64,
    pub bandwidth_usage: u64,
    cpu_model: Box<dyn UtilizationModel>,
    memory_model: Box<dyn UtilizationModel>,
    bandwidth_model: Box<dyn UtilizationModel>,
}

impl VirtualMachine {
    /// Creates virtual machine with specified parameters.
    pub fn new(
        id: u32,
        cpu_usage: u32,
        memory_usage: u64,
        bandwidth_usage: u64,
        cpu_model: Box<dyn UtilizationModel>,
        memory_model: Box<dyn UtilizationModel>,
        bandwidth_model: Box<dyn UtilizationModel>,
    ) -> Self {
        Self {
            id,
            cpu_usage,
            memory_usage,
            bandwidth_usage,
            cpu_model,
            memory_model,
            bandwidth_model,
        }
    }

    /// Returns the current CPU load of VM by invoking the CPU utilization model.
    pub fn get_cpu_load(&self, time: f64) -> Result<f64> {
        self.cpu_model.get_utilization(time)
    }

    /// Returns the current memory load of VM by invoking the memory utilization model.
    pub fn get_memory_load(&self, time: f64) -> Result<f64> {
        self.memory_model.get_utilization(time)
    }

    /// Returns the current bandwidth load of VM by invoking the bandwidth utilization model.
    pub fn get_bandwidth_load(&self, time: f64) -> Result<f64> {
        self.bandwidth_model.get_utilization(time)
    }
}
