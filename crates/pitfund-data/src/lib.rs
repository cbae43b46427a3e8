#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pitfund/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod company;
pub mod edgar;
pub mod error;
pub mod fact;
pub mod normalize;
pub mod registry;

pub use catalog::{Metric, MetricCatalog, MetricSpec};
pub use company::{Company, CompanyId, MonthDay};
pub use error::{DataError, Result};
pub use fact::{DeclaredPeriod, FiscalQuarter, RawFact};
pub use normalize::ValueNormalizer;
pub use registry::{CalendarSource, CompanyRegistry, FiscalCalendar};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
