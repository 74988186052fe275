use std::io;

use thiserror::Error;

/// Provides `SirError` and maps other errors to
/// convert to a `SirError`
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum SirError {
    #[error("invalid model parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid time grid: {0}")]
    InvalidTimeGrid(String),

    #[error("integration failed at t = {time}: {reason}")]
    IntegrationFailed { time: f64, reason: String },

    #[error("codebook has {len} entries but a sample resolved to index {index}")]
    CodebookTooShort { index: usize, len: usize },

    #[error("partitions are not non-decreasing at position {position}")]
    UnsortedPartitions { position: usize },

    #[error("invalid quantizer range: {0}")]
    InvalidQuantizerRange(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl SirError {
    pub(crate) fn integration_failed(time: f64, reason: impl Into<String>) -> Self {
        SirError::IntegrationFailed {
            time,
            reason: reason.into(),
        }
    }
}
