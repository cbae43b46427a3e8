//! Error types for the derivation engine.

use pitfund_data::{CompanyId, DataError};
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that abort processing of one company, or of the whole run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Every company's fact set is empty
    #[error("No facts to process: every company's fact set is empty")]
    EmptyInput,

    /// A raw fact violates a structural invariant
    #[error("Invalid fact for {company_id}: {reason}")]
    InvalidFact {
        /// Company whose fact set is invalid
        company_id: CompanyId,
        /// What is wrong with the fact
        reason: String,
    },

    /// Catalog lookup failure, such as an unknown tag
    #[error("Catalog error: {0}")]
    Catalog(#[from] DataError),

    /// Engine configuration out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
