//! Host overload detectors.

use std::fmt::{Display, Formatter};

use log::{debug, trace};

use crate::error::{OverloadError, Result};
use crate::history::CompactedHistory;
use crate::host::{maximum_vm_migration_time, MonitoredHost};
use crate::prediction::UtilizationPredictor;

/// Trait for implementation of host overload detection policies.
///
/// The detector is invoked once per host at every monitoring tick. A positive answer makes the caller select
/// VMs to migrate away from the host.
pub trait OverloadDetector {
    fn is_host_overloaded(&self, host: &mut dyn MonitoredHost) -> bool;

    fn name(&self) -> String;
}

/// Why the regression detector delegated the decision to its fallback.
#[derive(Clone, Debug, PartialEq)]
pub enum FallbackReason {
    InsufficientHistory { required: usize, available: usize },
    RegressionFailed(String),
}

impl From<OverloadError> for FallbackReason {
    fn from(error: OverloadError) -> Self {
        match error {
            OverloadError::InsufficientData { required, available } => {
                FallbackReason::InsufficientHistory { required, available }
            }
            other => FallbackReason::RegressionFailed(other.to_string()),
        }
    }
}

impl Display for FallbackReason {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            FallbackReason::InsufficientHistory { required, available } => {
                write!(f, "{} of {} required samples", available, required)
            }
            FallbackReason::RegressionFailed(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DecisionOutcome {
    Predicted,
    Fallback(FallbackReason),
}

/// Result of a single overload check.
#[derive(Clone, Debug, PartialEq)]
pub struct OverloadDecision {
    pub overloaded: bool,
    /// Safety-adjusted prediction, absent when the fallback detector made the decision.
    pub predicted_utilization: Option<f64>,
    pub outcome: DecisionOutcome,
}

/// Detects overload by predicting future host utilization with regression.
///
/// The raw prediction is multiplied by `safety_parameter` and the host is considered overloaded when the result
/// reaches 1. When the history is too short or the regression cannot be solved, the decision is delegated to the
/// `fallback` detector.
pub struct RegressionOverloadDetector {
    predictor: UtilizationPredictor,
    safety_parameter: f64,
    scheduling_interval: f64,
    utilization_threshold: Option<f64>,
    fallback: Box<dyn OverloadDetector>,
}

impl RegressionOverloadDetector {
    pub fn new(
        predictor: UtilizationPredictor,
        safety_parameter: f64,
        scheduling_interval: f64,
        fallback: Box<dyn OverloadDetector>,
    ) -> Self {
        Self {
            predictor,
            safety_parameter,
            scheduling_interval,
            utilization_threshold: None,
            fallback,
        }
    }

    /// Sets utilization threshold. It is kept for compatibility and does not affect decisions.
    pub fn with_utilization_threshold(mut self, utilization_threshold: f64) -> Self {
        self.utilization_threshold = Some(utilization_threshold);
        self
    }

    pub fn predictor(&self) -> UtilizationPredictor {
        self.predictor
    }

    pub fn safety_parameter(&self) -> f64 {
        self.safety_parameter
    }

    pub fn scheduling_interval(&self) -> f64 {
        self.scheduling_interval
    }

    pub fn utilization_threshold(&self) -> Option<f64> {
        self.utilization_threshold
    }

    pub fn fallback(&self) -> &dyn OverloadDetector {
        self.fallback.as_ref()
    }

    /// Number of scheduling intervals needed to migrate the largest VM from the host.
    pub fn migration_intervals(&self, host: &dyn MonitoredHost) -> Result<f64> {
        Ok((maximum_vm_migration_time(host)? / self.scheduling_interval).ceil())
    }

    /// Checks the host and records the prediction into the host history.
    pub fn decide(&self, host: &mut dyn MonitoredHost) -> OverloadDecision {
        let history = CompactedHistory::from_host(host);
        let required = self.predictor.min_window();
        let available = self.predictor.available_samples(&history);
        if available < required {
            let reason = FallbackReason::InsufficientHistory { required, available };
            return self.delegate(host, reason);
        }

        match self.predict(host, &history) {
            Ok(predicted_utilization) => {
                host.add_history_entry(predicted_utilization);
                let overloaded = predicted_utilization >= 1.;
                debug!(
                    "host #{}: {} predicted utilization {:.4}, overloaded = {}",
                    host.id(),
                    self.predictor,
                    predicted_utilization,
                    overloaded
                );
                OverloadDecision {
                    overloaded,
                    predicted_utilization: Some(predicted_utilization),
                    outcome: DecisionOutcome::Predicted,
                }
            }
            Err(error) => self.delegate(host, error.into()),
        }
    }

    /// Returns safety-adjusted predicted utilization of the host.
    pub fn predict(&self, host: &dyn MonitoredHost, history: &CompactedHistory) -> Result<f64> {
        let migration_intervals = if self.predictor.uses_migration_lookahead() {
            self.migration_intervals(host)?
        } else {
            0.
        };
        let prediction = self.predictor.predict(history, migration_intervals)?;
        trace!(
            "host #{}: estimate {:?}, migration intervals {}",
            host.id(),
            prediction.estimate,
            migration_intervals
        );
        let predicted_utilization = prediction.utilization * self.safety_parameter;
        if !predicted_utilization.is_finite() {
            return Err(OverloadError::DegenerateFit(format!(
                "predicted utilization {}",
                predicted_utilization
            )));
        }
        Ok(predicted_utilization)
    }

    fn delegate(&self, host: &mut dyn MonitoredHost, reason: FallbackReason) -> OverloadDecision {
        debug!(
            "host #{}: {} falls back to {} ({})",
            host.id(),
            self.predictor,
            self.fallback.name(),
            reason
        );
        OverloadDecision {
            overloaded: self.fallback.is_host_overloaded(host),
            predicted_utilization: None,
            outcome: DecisionOutcome::Fallback(reason),
        }
    }
}

impl OverloadDetector for RegressionOverloadDetector {
    fn is_host_overloaded(&self, host: &mut dyn MonitoredHost) -> bool {
        self.decide(host).overloaded
    }

    fn name(&self) -> String {
        format!("{}[safety={}]", self.predictor, self.safety_parameter)
    }
}

/// Considers host overloaded when its current CPU or memory utilization exceeds the threshold.
pub struct StaticThresholdDetector {
    threshold: f64,
}

impl StaticThresholdDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl OverloadDetector for StaticThresholdDetector {
    fn is_host_overloaded(&self, host: &mut dyn MonitoredHost) -> bool {
        let overloaded = host.cpu_utilization() > self.threshold || host.memory_utilization() > self.threshold;
        if overloaded {
            debug!(
                "host #{} is overloaded ({} cpu, {} memory)",
                host.id(),
                host.cpu_utilization(),
                host.memory_utilization()
            );
        }
        overloaded
    }

    fn name(&self) -> String {
        format!("StaticThreshold[threshold={}]", self.threshold)
    }
}
