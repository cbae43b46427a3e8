//! SEC EDGAR document parsing.
//!
//! This module reads already-downloaded EDGAR JSON documents:
//! - `companyfacts`: every XBRL fact a company has filed, flattened into
//!   [`RawFact`](crate::fact::RawFact) rows for the catalog's tags
//! - `submissions`: declared fiscal year end and filing history
//! - `company_tickers.json`: ticker to CIK mapping

pub mod companyfacts;
pub mod submissions;

pub use companyfacts::{CompanyFactsDocument, NormalizeReport, normalize};
pub use submissions::{SubmissionsDocument, parse_company_tickers};
