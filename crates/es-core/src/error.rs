//! Error types for EventSim

use thiserror::Error;

/// EventSim error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Simulation parameters rejected before any data is generated.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Two raw entries of one estimator map onto the same relative time.
    #[error("estimator '{estimator}': duplicate entries for relative time {relative_time}")]
    DuplicateRelativeTime {
        /// Estimator whose output is ambiguous.
        estimator: String,
        /// Relative time hit more than once.
        relative_time: i64,
    },

    /// A split-label series lacks labels beyond the single omitted reference lead.
    #[error("estimator '{estimator}': missing relative times {missing:?} besides the reference period")]
    MissingReferencePeriod {
        /// Estimator whose output has gaps.
        estimator: String,
        /// Relative times (signed) with no entry.
        missing: Vec<i64>,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
