#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pitfund/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod batch;
pub mod config;
pub mod dedup;
pub mod diagnostics;
pub mod error;
pub mod fiscal;
pub mod pipeline;
pub mod record;
pub mod splits;
pub mod ttm;
pub mod ytd;

// Re-export main types
pub use batch::{BatchRunner, CompanyFailure, CompanyReport, DerivationRun, ProgressCallback};
pub use config::{EngineConfig, FiscalConfig, SplitConfig, TtmConfig};
pub use dedup::{DedupOutcome, TagDeduplicator};
pub use diagnostics::{Diagnostic, DiagnosticCounts, Flags};
pub use error::{EngineError, Result};
pub use fiscal::{AssignmentConfidence, FiscalPeriodAssigner, PeriodAssignment};
pub use pipeline::{CompanyInput, CompanyOutput, CompanyPipeline, process_company};
pub use record::{CanonicalFact, Derivation, FactKey, QuarterlyMetricRecord, TtmStatus};
pub use splits::{AdjustedShare, SplitAdjuster, SplitAdjustment, SplitEvent, SplitSchedule};
pub use ttm::{TtmAggregator, VersionIndex};
pub use ytd::YtdConverter;
