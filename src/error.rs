//! Error taxonomy for the reversal bot
//!
//! Only the band computation and the I/O collaborators surface errors.
//! Detectors return `Option` for "no classification" instead.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BotError {
    /// Not enough history yet (warm-up), never logged as an error
    #[error("insufficient data: {available} candles < required {required}")]
    InsufficientData { required: usize, available: usize },

    /// Market data fetch failed
    #[error("network error: {0}")]
    Network(String),

    /// Alert delivery failed
    #[error("notification error: {0}")]
    Notification(String),

    /// Zero-variance band, %B has no value
    #[error("undefined metric: zero-width band")]
    UndefinedMetric,

    /// Startup configuration rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BotError {
    /// Warm-up and undefined-metric outcomes just mean "no signal this cycle"
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            BotError::InsufficientData { .. } | BotError::UndefinedMetric
        )
    }
}
