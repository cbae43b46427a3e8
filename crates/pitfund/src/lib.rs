#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pitfund/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod loader;

// Re-export main types from sub-crates
pub use pitfund_data as data;
pub use pitfund_engine as engine;
pub use pitfund_output as output;

pub use config::PipelineConfig;
pub use error::{PitfundError, Result};
pub use loader::{LoadedUniverse, SecDirectory, SkippedDocument};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
