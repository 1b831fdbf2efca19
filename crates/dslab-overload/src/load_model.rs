//! Resource utilization models.

use std::fs::File;
use std::sync::Arc;

use dyn_clone::{clone_trait_object, DynClone};
use log::info;

use crate::error::{OverloadError, Result};

/// Number of samples held by a trace loaded from file.
pub const TRACE_LENGTH: usize = 2000;

/// Memory capacity in MB used to normalize RAM traces.
pub const TRACE_MEMORY_CAPACITY: f64 = 16384.;

/// A utilization model is a function, which defines utilization of some resource at the moment.
/// The returned value is a fraction of the resource capacity.
pub trait UtilizationModel: DynClone {
    fn get_utilization(&self, time: f64) -> Result<f64>;
}

clone_trait_object!(UtilizationModel);

/// The simplest utilization model, the constant utilization.
#[derive(Clone)]
pub struct ConstantUtilizationModel {
    utilization: f64,
}

impl ConstantUtilizationModel {
    pub fn new(utilization: f64) -> Self {
        Self { utilization }
    }
}

impl UtilizationModel for ConstantUtilizationModel {
    fn get_utilization(&self, _time: f64) -> Result<f64> {
        Ok(self.utilization)
    }
}

/// Measurement extracted from a trace record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraceField {
    /// Memory in KB at field 6, normalized by [`TRACE_MEMORY_CAPACITY`].
    RamKilobytes,
    /// Percentage at field 4.
    Percentage,
}

impl TraceField {
    pub fn index(&self) -> usize {
        match self {
            TraceField::RamKilobytes => 6,
            TraceField::Percentage => 4,
        }
    }

    fn normalize(&self, value: f64) -> f64 {
        match self {
            TraceField::RamKilobytes => value / 1024. / TRACE_MEMORY_CAPACITY,
            TraceField::Percentage => value / 100.,
        }
    }
}

/// How the data records of a trace file are turned into samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum TraceReadMode {
    /// Only the first data record is read and its value fills the whole trace.
    #[default]
    RepeatFirstRecord,
    /// Every data record is a separate sample.
    Series,
}

/// Replays a pre-recorded utilization series sampled every `scheduling_interval` seconds.
///
/// Values between two samples are linearly interpolated. The samples are shared between clones of the model.
#[derive(Clone, Debug)]
pub struct TraceUtilizationModel {
    samples: Arc<[f64]>,
    scheduling_interval: f64,
}

impl TraceUtilizationModel {
    /// Creates model from in-memory samples.
    pub fn from_samples(samples: Vec<f64>, scheduling_interval: f64) -> Result<Self> {
        check_interval(scheduling_interval)?;
        if samples.is_empty() {
            return Err(OverloadError::Config("trace must contain at least one sample".to_string()));
        }
        Ok(Self {
            samples: samples.into(),
            scheduling_interval,
        })
    }

    /// Loads trace from semicolon-delimited file, the first line of which is a header.
    pub fn from_file(path: &str, scheduling_interval: f64, field: TraceField, mode: TraceReadMode) -> Result<Self> {
        check_interval(scheduling_interval)?;
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let limit = match mode {
            TraceReadMode::RepeatFirstRecord => 1,
            TraceReadMode::Series => TRACE_LENGTH - 1,
        };
        let mut values = Vec::new();
        for record in reader.records().take(limit) {
            let record = record.map_err(|e| format_error(path, e.to_string()))?;
            values.push(parse_field(path, &record, field)?);
        }
        if values.is_empty() {
            return Err(format_error(path, "no data record after header".to_string()));
        }

        let mut samples = match mode {
            TraceReadMode::RepeatFirstRecord => vec![values[0]; TRACE_LENGTH - 1],
            TraceReadMode::Series => values,
        };
        let last = samples[samples.len() - 1];
        samples.push(last);

        info!(
            "loaded trace {} ({} samples, interval {}s)",
            path,
            samples.len(),
            scheduling_interval
        );
        Self::from_samples(samples, scheduling_interval)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn scheduling_interval(&self) -> f64 {
        self.scheduling_interval
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Returns the time of the last sample.
    pub fn max_time(&self) -> f64 {
        (self.samples.len() - 1) as f64 * self.scheduling_interval
    }

    fn sample(&self, index: usize, time: f64) -> Result<f64> {
        self.samples.get(index).copied().ok_or(OverloadError::Index {
            time,
            max_time: self.max_time(),
        })
    }
}

impl UtilizationModel for TraceUtilizationModel {
    fn get_utilization(&self, time: f64) -> Result<f64> {
        if !time.is_finite() || time < 0. {
            return Err(OverloadError::Index {
                time,
                max_time: self.max_time(),
            });
        }
        let interval = self.scheduling_interval;
        if time % interval == 0. {
            return self.sample((time / interval) as usize, time);
        }
        let index1 = (time / interval).floor() as usize;
        let index2 = (time / interval).ceil() as usize;
        let utilization1 = self.sample(index1, time)?;
        if index1 == index2 {
            return Ok(utilization1);
        }
        let utilization2 = self.sample(index2, time)?;
        let delta = (utilization2 - utilization1) / ((index2 - index1) as f64 * interval);
        Ok(utilization1 + delta * (time - index1 as f64 * interval))
    }
}

fn check_interval(scheduling_interval: f64) -> Result<()> {
    if scheduling_interval.is_finite() && scheduling_interval > 0. {
        Ok(())
    } else {
        Err(OverloadError::Config(format!(
            "scheduling interval must be positive, got {}",
            scheduling_interval
        )))
    }
}

fn format_error(path: &str, reason: String) -> OverloadError {
    OverloadError::Format {
        path: path.to_string(),
        reason,
    }
}

fn parse_field(path: &str, record: &csv::StringRecord, field: TraceField) -> Result<f64> {
    let raw = record.get(field.index()).ok_or_else(|| {
        format_error(
            path,
            format!("record has {} fields, field #{} required", record.len(), field.index()),
        )
    })?;
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| format_error(path, format!("cannot parse field #{} '{}': {}", field.index(), raw, e)))?;
    Ok(field.normalize(value))
}
