//! SEC `submissions` and `company_tickers` documents.
//!
//! The submissions document carries the declared fiscal year end
//! (`fiscalYearEnd`, `MMDD`) and the company's filing history, whose earliest
//! filing date is the first disclosure date. The ticker file maps trading
//! symbols to CIKs.

use crate::company::{Company, CompanyId, MonthDay};
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Company reference data from a `submissions` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionsDocument {
    /// Padded CIK
    pub company_id: CompanyId,
    /// Registrant name
    pub name: Option<String>,
    /// Primary ticker, if listed
    pub ticker: Option<String>,
    /// Declared fiscal year end
    pub fiscal_year_end: Option<MonthDay>,
    /// Earliest filing date in the document
    pub first_filing_date: Option<NaiveDate>,
}

impl SubmissionsDocument {
    /// Parse a `submissions` JSON document.
    ///
    /// A malformed `fiscalYearEnd` is treated as absent so the registry can
    /// infer one from the company's facts.
    pub fn parse_json(json: &str) -> Result<Self> {
        let raw: SecSubmissions = serde_json::from_str(json)
            .map_err(|e| DataError::Parse(format!("Failed to parse submissions JSON: {}", e)))?;
        let company_id = CompanyId::parse(&raw.cik)?;

        let fiscal_year_end = raw
            .fiscal_year_end
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| match s.parse::<MonthDay>() {
                Ok(md) => Some(md),
                Err(e) => {
                    warn!(company = %company_id, error = %e, "ignoring malformed fiscalYearEnd");
                    None
                }
            });

        let first_filing_date = raw
            .filings
            .recent
            .filing_date
            .iter()
            .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .min();

        Ok(Self {
            company_id,
            name: raw.name,
            ticker: raw.tickers.into_iter().next(),
            fiscal_year_end,
            first_filing_date,
        })
    }

    /// Read and parse a `submissions` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse_json(&std::fs::read_to_string(path)?)
    }

    /// Registry row for this company.
    pub fn to_company(&self) -> Company {
        Company {
            company_id: self.company_id.clone(),
            ticker: self.ticker.clone(),
            name: self.name.clone(),
            fiscal_year_end: self.fiscal_year_end,
            first_disclosure_date: self.first_filing_date,
        }
    }
}

/// Parse `company_tickers.json` into registry rows, ordered by CIK.
pub fn parse_company_tickers(json: &str) -> Result<Vec<Company>> {
    let data: HashMap<String, CompanyTicker> = serde_json::from_str(json)
        .map_err(|e| DataError::Parse(format!("Failed to parse company tickers: {}", e)))?;

    let mut companies: Vec<Company> = data
        .into_values()
        .map(|t| Company {
            ticker: Some(t.ticker.to_uppercase()),
            name: Some(t.title),
            ..Company::new(CompanyId::from_cik(t.cik_str))
        })
        .collect();
    companies.sort_by(|a, b| a.company_id.cmp(&b.company_id).then(a.ticker.cmp(&b.ticker)));
    companies.dedup_by(|a, b| a.company_id == b.company_id);
    Ok(companies)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecSubmissions {
    cik: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tickers: Vec<String>,
    #[serde(default)]
    fiscal_year_end: Option<String>,
    #[serde(default)]
    filings: FilingHistory,
}

#[derive(Debug, Default, Deserialize)]
struct FilingHistory {
    #[serde(default)]
    recent: RecentFilings,
}

/// The SEC returns filing information as parallel arrays.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    #[serde(default)]
    filing_date: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CompanyTicker {
    cik_str: u64,
    ticker: String,
    title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_submissions() {
        let json = r#"{
            "cik": "320193",
            "name": "Apple Inc.",
            "tickers": ["AAPL"],
            "fiscalYearEnd": "0926",
            "filings": {"recent": {
                "accessionNumber": ["a", "b", "c"],
                "form": ["10-Q", "10-K", "8-K"],
                "filingDate": ["2024-02-02", "2023-11-03", "1994-01-26"]
            }}
        }"#;
        let doc = SubmissionsDocument::parse_json(json).unwrap();
        assert_eq!(doc.company_id.as_str(), "0000320193");
        assert_eq!(doc.fiscal_year_end, Some(MonthDay::new(9, 26).unwrap()));
        assert_eq!(doc.first_filing_date, NaiveDate::from_ymd_opt(1994, 1, 26));

        let company = doc.to_company();
        assert_eq!(company.ticker.as_deref(), Some("AAPL"));
        assert_eq!(company.first_disclosure_date, doc.first_filing_date);
    }

    #[test]
    fn test_malformed_fiscal_year_end_is_absent() {
        let json = r#"{"cik": "0000000042", "fiscalYearEnd": "1399"}"#;
        let doc = SubmissionsDocument::parse_json(json).unwrap();
        assert!(doc.fiscal_year_end.is_none());
        assert!(doc.first_filing_date.is_none());
    }

    #[test]
    fn test_parse_company_tickers() {
        let json = r#"{
            "0": {"cik_str": 320193, "ticker": "aapl", "title": "Apple Inc."},
            "1": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"},
            "2": {"cik_str": 1652044, "ticker": "GOOGL", "title": "Alphabet Inc."},
            "3": {"cik_str": 1652044, "ticker": "GOOG", "title": "Alphabet Inc."}
        }"#;
        let companies = parse_company_tickers(json).unwrap();
        assert_eq!(companies.len(), 3);
        assert_eq!(companies[0].company_id.as_str(), "0000320193");
        assert_eq!(companies[0].ticker.as_deref(), Some("AAPL"));
        // Share classes collapse to one row, alphabetically first ticker kept
        assert_eq!(companies[2].ticker.as_deref(), Some("GOOG"));
    }
}
