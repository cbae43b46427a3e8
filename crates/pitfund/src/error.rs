//! Error types for the umbrella crate.

use pitfund_data::DataError;
use pitfund_engine::EngineError;
use pitfund_output::ExportError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for loading, deriving and exporting.
pub type Result<T> = std::result::Result<T, PitfundError>;

/// Errors surfaced by the end-to-end pipeline.
#[derive(Debug, Error)]
pub enum PitfundError {
    /// Reference data or fact parsing error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Derivation error
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Export error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Input directory missing or unreadable
    #[error("SEC directory {path}: {source}")]
    Directory {
        /// Directory that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Configuration file error
    #[error("Invalid configuration: {0}")]
    Config(String),
}
