#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pitfund/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod frame;
pub mod summary;

pub use export::{
    AdjustedShareRow, CanonicalFactRow, ExportError, ExportFormat, Exporter, FailureRow,
    QuarterlyRow, RunExport, SplitEventRow, TableRow,
};
pub use frame::{adjusted_shares_frame, canonical_frame, pit_frame, quarterly_frame};
pub use summary::{RunSummary, TableCounts, TtmCounts};
