//! Physical host as seen by overload detectors.

use std::collections::BTreeMap;

use log::warn;

use crate::config::OverloadDetectionConfig;
use crate::error::{OverloadError, Result};
use crate::history::{PredictionLog, UtilizationHistory};
use crate::vm::VirtualMachine;

/// Converts host bandwidth to the units of VM memory when estimating migration time.
pub const BANDWIDTH_UNITS: f64 = 8000.;

/// Information about a host required to detect its overload.
///
/// Utilization histories are returned most-recent-first, slots that were not observed yet hold zeros.
pub trait MonitoredHost {
    fn id(&self) -> u32;

    fn cpu_utilization_history(&self) -> Vec<f64>;

    fn memory_utilization_history(&self) -> Vec<f64>;

    fn bandwidth_utilization_history(&self) -> Vec<f64>;

    /// Memory sizes of VMs placed on the host.
    fn vm_memory_sizes(&self) -> Vec<u64>;

    fn bandwidth(&self) -> f64;

    /// Latest observed CPU utilization.
    fn cpu_utilization(&self) -> f64;

    /// Latest observed memory utilization.
    fn memory_utilization(&self) -> f64;

    /// Records predicted utilization for later inspection.
    fn add_history_entry(&mut self, predicted_utilization: f64);
}

/// Estimates the time needed to migrate the largest VM from the host.
///
/// Half of the host bandwidth is assumed to be available for migration. Returns zero for a host without VMs.
pub fn maximum_vm_migration_time(host: &dyn MonitoredHost) -> Result<f64> {
    let max_memory = match host.vm_memory_sizes().into_iter().max() {
        Some(memory) => memory,
        None => {
            warn!("host #{} has no VMs, migration time is zero", host.id());
            return Ok(0.);
        }
    };
    let bandwidth = host.bandwidth();
    if !(bandwidth.is_finite() && bandwidth > 0.) {
        return Err(OverloadError::DegenerateFit(format!(
            "host #{} has bandwidth {}",
            host.id(),
            bandwidth
        )));
    }
    Ok(max_memory as f64 / (bandwidth / (2. * BANDWIDTH_UNITS)))
}

/// Host with resource capacities, placed VMs and utilization history.
pub struct Host {
    pub id: u32,

    cpu_total: u32,
    memory_total: u64,
    bandwidth: f64,

    vms: BTreeMap<u32, VirtualMachine>,
    history: UtilizationHistory,
    predictions: PredictionLog,
}

impl Host {
    pub fn new(id: u32, cpu_total: u32, memory_total: u64, bandwidth: f64, history_length: usize) -> Self {
        Self {
            id,
            cpu_total,
            memory_total,
            bandwidth,
            vms: BTreeMap::new(),
            history: UtilizationHistory::new(history_length),
            predictions: PredictionLog::new(),
        }
    }

    /// Creates host keeping `config.history_length` utilization samples.
    pub fn from_config(
        id: u32,
        cpu_total: u32,
        memory_total: u64,
        bandwidth: f64,
        config: &OverloadDetectionConfig,
    ) -> Self {
        Self::new(id, cpu_total, memory_total, bandwidth, config.history_length)
    }

    pub fn add_vm(&mut self, vm: VirtualMachine) {
        self.vms.insert(vm.id, vm);
    }

    pub fn remove_vm(&mut self, vm_id: u32) -> Option<VirtualMachine> {
        self.vms.remove(&vm_id)
    }

    pub fn vms(&self) -> impl Iterator<Item = &VirtualMachine> {
        self.vms.values()
    }

    pub fn cpu_total(&self) -> u32 {
        self.cpu_total
    }

    pub fn memory_total(&self) -> u64 {
        self.memory_total
    }

    pub fn history(&self) -> &UtilizationHistory {
        &self.history
    }

    pub fn predictions(&self) -> &PredictionLog {
        &self.predictions
    }

    pub fn get_cpu_load(&self, time: f64) -> Result<f64> {
        let mut cpu_used = 0.;
        for vm in self.vms.values() {
            cpu_used += vm.cpu_usage as f64 * vm.get_cpu_load(time)?;
        }
        Ok(fraction(cpu_used, self.cpu_total as f64))
    }

    pub fn get_memory_load(&self, time: f64) -> Result<f64> {
        let mut memory_used = 0.;
        for vm in self.vms.values() {
            memory_used += vm.memory_usage as f64 * vm.get_memory_load(time)?;
        }
        Ok(fraction(memory_used, self.memory_total as f64))
    }

    pub fn get_bandwidth_load(&self, time: f64) -> Result<f64> {
        let mut bandwidth_used = 0.;
        for vm in self.vms.values() {
            bandwidth_used += vm.bandwidth_usage as f64 * vm.get_bandwidth_load(time)?;
        }
        Ok(fraction(bandwidth_used, self.bandwidth))
    }

    /// Appends an externally measured utilization sample.
    pub fn record_utilization(&mut self, time: f64, cpu: f64, memory: f64, bandwidth: f64) {
        self.history.push(time, cpu, memory, bandwidth);
    }

    /// Samples utilization models of all VMs at `time` and appends the resulting host utilization.
    pub fn update_utilization(&mut self, time: f64) -> Result<()> {
        let cpu = self.get_cpu_load(time)?;
        let memory = self.get_memory_load(time)?;
        let bandwidth = self.get_bandwidth_load(time)?;
        self.record_utilization(time, cpu, memory, bandwidth);
        Ok(())
    }
}

impl MonitoredHost for Host {
    fn id(&self) -> u32 {
        self.id
    }

    fn cpu_utilization_history(&self) -> Vec<f64> {
        self.history.cpu()
    }

    fn memory_utilization_history(&self) -> Vec<f64> {
        self.history.memory()
    }

    fn bandwidth_utilization_history(&self) -> Vec<f64> {
        self.history.bandwidth()
    }

    fn vm_memory_sizes(&self) -> Vec<u64> {
        self.vms.values().map(|vm| vm.memory_usage).collect()
    }

    fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    fn cpu_utilization(&self) -> f64 {
        self.history.latest().map_or(0., |(cpu, _, _)| cpu)
    }

    fn memory_utilization(&self) -> f64 {
        self.history.latest().map_or(0., |(_, memory, _)| memory)
    }

    fn add_history_entry(&mut self, predicted_utilization: f64) {
        let time = self.history.last_time().unwrap_or(0.);
        self.predictions.add(time, predicted_utilization);
    }
}

fn fraction(used: f64, total: f64) -> f64 {
    if total > 0. {
        used / total
    } else {
        0.
    }
}
