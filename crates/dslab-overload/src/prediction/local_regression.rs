//! Local regression over a single utilization series.

use crate::error::{OverloadError, Result};
use crate::math::loess_parameter_estimates;

/// Number of latest samples used by the plain local regression, small enough to follow recent changes.
pub const WINDOW: usize = 10;

/// Fits local regression to the latest `window` samples of chronological `series`.
pub fn estimate(series: &[f64], window: usize) -> Result<(f64, f64)> {
    if series.len() < window {
        return Err(OverloadError::InsufficientData {
            required: window,
            available: series.len(),
        });
    }
    loess_parameter_estimates(&series[series.len() - window..])
}

/// Value of the fitted trend `migration_intervals` steps after the end of the window.
pub fn extrapolate(intercept: f64, slope: f64, window: usize, migration_intervals: f64) -> f64 {
    intercept + slope * (window as f64 + migration_intervals)
}
