//! Multiple linear regression of combined load over CPU, memory and bandwidth utilization.
//!
//! The response is the product of the three utilizations. The fitted model is evaluated at the latest
//! observation to obtain predicted utilization.

use crate::error::{OverloadError, Result};
use crate::history::CompactedHistory;
use crate::math::{evaluate, ols_estimate};

/// Minimum number of compacted samples to rely on the regression.
pub const MIN_HISTORY: usize = 10;

/// Fits the model to the samples common to the three series.
pub fn estimate(history: &CompactedHistory) -> Result<Vec<f64>> {
    let history = history.aligned();
    if history.aligned_len() < MIN_HISTORY {
        return Err(OverloadError::InsufficientData {
            required: MIN_HISTORY,
            available: history.aligned_len(),
        });
    }
    let response: Vec<f64> = (0..history.aligned_len())
        .map(|i| history.cpu()[i] * history.memory()[i] * history.bandwidth()[i])
        .collect();
    ols_estimate(&[history.cpu(), history.memory(), history.bandwidth()], &response)
}

pub fn evaluate_latest(coefficients: &[f64], history: &CompactedHistory) -> f64 {
    match (history.cpu().last(), history.memory().last(), history.bandwidth().last()) {
        (Some(&cpu), Some(&memory), Some(&bandwidth)) => evaluate(coefficients, &[cpu, memory, bandwidth]),
        _ => coefficients[0],
    }
}
