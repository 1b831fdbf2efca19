//! Regression predictors of future host utilization.

pub mod hybrid_local_regression;
pub mod local_regression;
pub mod multiple_regression;

use std::fmt::{Display, Formatter};

use crate::error::Result;
use crate::history::CompactedHistory;

/// Parameters of a fitted regression.
#[derive(Clone, Debug, PartialEq)]
pub enum RegressionEstimate {
    /// Single-variable model over time.
    Trend { intercept: f64, slope: f64 },
    /// Intercept followed by one coefficient per regressor.
    Coefficients(Vec<f64>),
}

/// Predicted utilization together with the estimate it was computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub estimate: RegressionEstimate,
    pub utilization: f64,
}

/// Algorithm used to predict host utilization from its history.
///
/// All variants are stateless, the estimate is computed from scratch on every call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UtilizationPredictor {
    /// Local regression over CPU utilization.
    LocalRegression,
    /// Least squares regression of combined load over CPU, memory and bandwidth utilization.
    MultipleRegression,
    /// Local regression over the product of per-resource saturation volumes.
    HybridLocalRegression,
}

impl UtilizationPredictor {
    /// Number of compacted samples required to make a prediction.
    pub fn min_window(&self) -> usize {
        match self {
            UtilizationPredictor::LocalRegression => local_regression::WINDOW,
            UtilizationPredictor::MultipleRegression => multiple_regression::MIN_HISTORY,
            UtilizationPredictor::HybridLocalRegression => hybrid_local_regression::WINDOW,
        }
    }

    /// Number of compacted samples the predictor can use: the CPU series for local regression and the samples
    /// common to all series for the predictors combining resources.
    pub fn available_samples(&self, history: &CompactedHistory) -> usize {
        match self {
            UtilizationPredictor::LocalRegression => history.cpu().len(),
            UtilizationPredictor::MultipleRegression | UtilizationPredictor::HybridLocalRegression => {
                history.aligned_len()
            }
        }
    }

    /// Whether prediction looks ahead by the time needed to migrate a VM from the host.
    pub fn uses_migration_lookahead(&self) -> bool {
        !matches!(self, UtilizationPredictor::MultipleRegression)
    }

    pub fn estimate(&self, history: &CompactedHistory) -> Result<RegressionEstimate> {
        match self {
            UtilizationPredictor::LocalRegression => {
                let (intercept, slope) = local_regression::estimate(history.cpu(), local_regression::WINDOW)?;
                Ok(RegressionEstimate::Trend { intercept, slope })
            }
            UtilizationPredictor::MultipleRegression => {
                multiple_regression::estimate(history).map(RegressionEstimate::Coefficients)
            }
            UtilizationPredictor::HybridLocalRegression => {
                let (intercept, slope) = hybrid_local_regression::estimate(history)?;
                Ok(RegressionEstimate::Trend { intercept, slope })
            }
        }
    }

    /// Predicts utilization `migration_intervals` scheduling intervals after the window of the latest samples.
    ///
    /// The multiple regression model is evaluated at the latest observation and ignores `migration_intervals`.
    pub fn predict(&self, history: &CompactedHistory, migration_intervals: f64) -> Result<Prediction> {
        let estimate = self.estimate(history)?;
        let utilization = match &estimate {
            RegressionEstimate::Trend { intercept, slope } => {
                local_regression::extrapolate(*intercept, *slope, self.min_window(), migration_intervals)
            }
            RegressionEstimate::Coefficients(coefficients) => {
                multiple_regression::evaluate_latest(coefficients, history)
            }
        };
        Ok(Prediction { estimate, utilization })
    }
}

impl Display for UtilizationPredictor {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            UtilizationPredictor::LocalRegression => write!(f, "LocalRegression"),
            UtilizationPredictor::MultipleRegression => write!(f, "MultipleRegression"),
            UtilizationPredictor::HybridLocalRegression => write!(f, "HybridLocalRegression"),
        }
    }
}
