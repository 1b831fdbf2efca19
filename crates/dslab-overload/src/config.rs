//! Overload detection configuration.

use std::collections::HashMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::detector::{OverloadDetector, RegressionOverloadDetector, StaticThresholdDetector};
use crate::error::{OverloadError, Result};
use crate::prediction::UtilizationPredictor;

/// Holds raw overload detection config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawOverloadDetectionConfig {
    pub scheduling_interval: Option<f64>,
    pub history_length: Option<usize>,
    pub safety_parameter: Option<f64>,
    pub utilization_threshold: Option<f64>,
    pub detector: Option<String>,
    pub fallback: Option<String>,
}

/// Represents overload detection configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct OverloadDetectionConfig {
    /// Duration in seconds between monitoring ticks.
    pub scheduling_interval: f64,
    /// Number of utilization samples kept per host, see [`crate::host::Host::from_config`].
    pub history_length: usize,
    /// Multiplier applied to predicted utilization.
    pub safety_parameter: f64,
    /// Accepted for compatibility, regression detectors do not use it.
    pub utilization_threshold: Option<f64>,
    /// Detector in `Name[option=value,...]` form, e.g. `HybridLocalRegression[safety=1.5]`.
    pub detector: String,
    /// Detector used when regression cannot be applied, e.g. `StaticThreshold[threshold=0.8]`.
    pub fallback: String,
}

impl Default for OverloadDetectionConfig {
    fn default() -> Self {
        Self {
            scheduling_interval: 300.,
            history_length: 30,
            safety_parameter: 1.2,
            utilization_threshold: None,
            detector: "LocalRegression".to_string(),
            fallback: "StaticThreshold[threshold=0.8]".to_string(),
        }
    }
}

impl OverloadDetectionConfig {
    /// Creates config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Result<Self> {
        let yaml = std::fs::read_to_string(file_name)?;
        Self::from_yaml(&yaml).map_err(|e| OverloadError::Config(format!("{}: {}", file_name, e)))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: RawOverloadDetectionConfig =
            serde_yaml::from_str(yaml).map_err(|e| OverloadError::Config(format!("can't parse YAML: {}", e)))?;
        let default = Self::default();
        let config = Self {
            scheduling_interval: raw.scheduling_interval.unwrap_or(default.scheduling_interval),
            history_length: raw.history_length.unwrap_or(default.history_length),
            safety_parameter: raw.safety_parameter.unwrap_or(default.safety_parameter),
            utilization_threshold: raw.utilization_threshold,
            detector: raw.detector.unwrap_or(default.detector),
            fallback: raw.fallback.unwrap_or(default.fallback),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_positive("scheduling_interval", self.scheduling_interval)?;
        check_positive("safety_parameter", self.safety_parameter)?;
        if self.history_length == 0 {
            return Err(OverloadError::Config("history_length must be positive".to_string()));
        }
        Ok(())
    }

    /// Builds the configured detector.
    pub fn build_detector(&self) -> Result<Box<dyn OverloadDetector>> {
        detector_resolver(&self.detector, self)
    }
}

/// Parses config value string, which consists of two parts - name and options.
/// Example: StaticThreshold[threshold=0.8] parts are name StaticThreshold and options string "threshold=0.8".
pub fn parse_config_value(config_str: &str) -> (String, Option<String>) {
    match config_str.trim().split_once('[') {
        Some((name, options)) => (name.trim().to_string(), Some(options.trim_end_matches(']').to_string())),
        None => (config_str.trim().to_string(), None),
    }
}

/// Parses options string from config value, returns map with option names and values.
pub fn parse_options(options_str: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for option_str in options_str.split(',') {
        if let Some((name, value)) = option_str.split_once('=') {
            options.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    options
}

fn numeric_option(options: &HashMap<String, String>, name: &str, config_str: &str) -> Result<Option<f64>> {
    options
        .get(name)
        .map(|value| {
            value
                .parse::<f64>()
                .map_err(|_| OverloadError::Config(format!("invalid {} '{}' in {}", name, value, config_str)))
        })
        .transpose()
}

fn check_positive(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0. {
        Ok(value)
    } else {
        Err(OverloadError::Config(format!("{} must be positive, got {}", name, value)))
    }
}

/// Resolves predictor by its name or short alias.
pub fn predictor_resolver(name: &str) -> Option<UtilizationPredictor> {
    match name {
        "LocalRegression" | "Lr" => Some(UtilizationPredictor::LocalRegression),
        "MultipleRegression" | "OlsMr" => Some(UtilizationPredictor::MultipleRegression),
        "HybridLocalRegression" | "HLrHod" => Some(UtilizationPredictor::HybridLocalRegression),
        _ => None,
    }
}

/// Resolves detector which does not depend on utilization history.
pub fn fallback_resolver(config_str: &str) -> Result<Box<dyn OverloadDetector>> {
    let (name, options_str) = parse_config_value(config_str);
    let options = parse_options(&options_str.unwrap_or_default());
    match name.as_str() {
        "StaticThreshold" => {
            let threshold = numeric_option(&options, "threshold", config_str)?
                .ok_or_else(|| OverloadError::Config(format!("threshold is required in {}", config_str)))?;
            if !(threshold.is_finite() && threshold >= 0.) {
                return Err(OverloadError::Config(format!(
                    "threshold must be non-negative, got {} in {}",
                    threshold, config_str
                )));
            }
            Ok(Box::new(StaticThresholdDetector::new(threshold)))
        }
        _ => Err(OverloadError::Config(format!("can't resolve fallback detector: {}", config_str))),
    }
}

/// Resolves regression detector, its fallback is resolved from `config.fallback`.
pub fn regression_detector_resolver(
    config_str: &str,
    config: &OverloadDetectionConfig,
) -> Result<RegressionOverloadDetector> {
    let (name, options_str) = parse_config_value(config_str);
    let options = parse_options(&options_str.unwrap_or_default());
    let predictor = predictor_resolver(&name)
        .ok_or_else(|| OverloadError::Config(format!("can't resolve regression detector: {}", config_str)))?;
    let safety_parameter = match numeric_option(&options, "safety", config_str)? {
        Some(safety) => check_positive("safety", safety)?,
        None => config.safety_parameter,
    };
    if config.history_length < predictor.min_window() {
        return Err(OverloadError::Config(format!(
            "history_length {} is shorter than {} samples required by {}",
            config.history_length,
            predictor.min_window(),
            predictor
        )));
    }
    let fallback = fallback_resolver(&config.fallback)?;

    let mut detector =
        RegressionOverloadDetector::new(predictor, safety_parameter, config.scheduling_interval, fallback);
    if let Some(utilization_threshold) = config.utilization_threshold {
        detector = detector.with_utilization_threshold(utilization_threshold);
    }
    info!(
        "using overload detector {} with fallback {}",
        detector.name(),
        detector.fallback().name()
    );
    Ok(detector)
}

/// Resolves any supported detector.
pub fn detector_resolver(config_str: &str, config: &OverloadDetectionConfig) -> Result<Box<dyn OverloadDetector>> {
    let (name, _) = parse_config_value(config_str);
    if predictor_resolver(&name).is_some() {
        Ok(Box::new(regression_detector_resolver(config_str, config)?))
    } else {
        fallback_resolver(config_str)
    }
}
