//! Error type shared by trace loading, regression and configuration.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OverloadError>;

#[derive(Error, Debug)]
pub enum OverloadError {
    /// Trace file content cannot be parsed.
    #[error("malformed trace {path}: {reason}")]
    Format { path: String, reason: String },

    /// Trace queried outside of its time range.
    #[error("time {time} is outside of trace range [0, {max_time}]")]
    Index { time: f64, max_time: f64 },

    #[error("not enough utilization history: {available} samples, {required} required")]
    InsufficientData { required: usize, available: usize },

    /// Regression cannot be solved for the given history.
    #[error("degenerate regression: {0}")]
    DegenerateFit(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
