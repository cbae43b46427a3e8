//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading reference data and raw facts.
#[derive(Debug, Error)]
pub enum DataError {
    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Month/day pair that does not exist in a non-leap year
    #[error("Invalid fiscal year end {month:02}-{day:02}")]
    InvalidMonthDay {
        /// Month component
        month: u32,
        /// Day component
        day: u32,
    },

    /// Tag that is not listed in the catalog for the metric
    #[error("Unknown tag {tag} for metric {metric}")]
    UnknownTag {
        /// Metric the tag was reported under
        metric: String,
        /// Offending tag
        tag: String,
    },

    /// Catalog that fails load-time validation
    #[error("Invalid metric catalog: {0}")]
    InvalidCatalog(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
