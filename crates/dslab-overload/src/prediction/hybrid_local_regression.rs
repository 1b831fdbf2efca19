//! Hybrid local regression over resource saturation volumes.
//!
//! For every observation each resource contributes `max(X) / (1 - X[i])`, which grows quickly as the resource
//! approaches saturation. `max(X)` is taken over the whole compacted series of the resource, while the volumes are
//! computed for the samples common to the three series. The product of the three volumes forms a single series
//! analyzed by local regression.

use log::warn;

use crate::error::Result;
use crate::history::CompactedHistory;
use crate::prediction::local_regression;

/// Number of latest samples used by the hybrid model.
pub const WINDOW: usize = 5;

/// Samples are clamped to this value before computing volumes.
pub const SATURATION_CLAMP: f64 = 0.999999;

pub fn estimate(history: &CompactedHistory) -> Result<(f64, f64)> {
    local_regression::estimate(&volume_series(history), WINDOW)
}

/// Combines the three resource series into a series of volume products.
pub fn volume_series(history: &CompactedHistory) -> Vec<f64> {
    let maximums = [history.cpu(), history.memory(), history.bandwidth()].map(max_value);
    let aligned = history.aligned();
    let series = [aligned.cpu(), aligned.memory(), aligned.bandwidth()];
    let saturated = series
        .iter()
        .map(|s| s.iter().filter(|&&x| x >= SATURATION_CLAMP).count())
        .sum::<usize>();
    if saturated > 0 {
        warn!("{} saturated utilization samples clamped to {}", saturated, SATURATION_CLAMP);
    }
    (0..aligned.aligned_len())
        .map(|i| {
            series
                .iter()
                .zip(&maximums)
                .map(|(s, max)| volume(*max, s[i]))
                .product::<f64>()
        })
        .collect()
}

fn volume(max: f64, sample: f64) -> f64 {
    max / (1. - sample.min(SATURATION_CLAMP))
}

fn max_value(series: &[f64]) -> f64 {
    series.iter().copied().fold(0., f64::max)
}
