//! Table export for derivation runs.
//!
//! Every output table is written with a fixed column order. CSV files always
//! carry a header row, even when the table is empty. Dates are ISO-8601,
//! missing values are empty cells in CSV and `null` in JSON.

use chrono::NaiveDate;
use pitfund_engine::{
    AdjustedShare, CanonicalFact, CompanyFailure, Derivation, DerivationRun,
    QuarterlyMetricRecord, SplitEvent,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// DataFrame construction error.
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" | "prettyjson" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// A flat row of one output table.
pub trait TableRow: Serialize {
    /// File stem of the table.
    const TABLE: &'static str;

    /// Column names, in serialization order.
    const COLUMNS: &'static [&'static str];
}

/// Canonical fact row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFactRow {
    /// Company id
    pub company_id: String,
    /// Metric wire name
    pub metric: String,
    /// Winning tag
    pub tag: String,
    /// Fiscal year
    pub fiscal_year: i32,
    /// Fiscal quarter number
    pub fiscal_quarter: u8,
    /// Fiscal year of the disclosing filing
    pub declared_fiscal_year: i32,
    /// Declared period label
    pub declared_period: String,
    /// Period end
    pub period_end: NaiveDate,
    /// Filing date
    pub filed_date: NaiveDate,
    /// Form type
    pub form_type: String,
    /// Normalized value
    pub value: f64,
}

impl TableRow for CanonicalFactRow {
    const TABLE: &'static str = "canonical_facts";
    const COLUMNS: &'static [&'static str] = &[
        "company_id",
        "metric",
        "tag",
        "fiscal_year",
        "fiscal_quarter",
        "declared_fiscal_year",
        "declared_period",
        "period_end",
        "filed_date",
        "form_type",
        "value",
    ];
}

impl From<&CanonicalFact> for CanonicalFactRow {
    fn from(f: &CanonicalFact) -> Self {
        Self {
            company_id: f.company_id.to_string(),
            metric: f.metric.to_string(),
            tag: f.tag.clone(),
            fiscal_year: f.fiscal_year,
            fiscal_quarter: f.fiscal_quarter.number(),
            declared_fiscal_year: f.declared_fiscal_year,
            declared_period: f.declared_period.to_string(),
            period_end: f.period_end,
            filed_date: f.filed_date,
            form_type: f.form_type.clone(),
            value: f.value,
        }
    }
}

/// Quarterly metric row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyRow {
    /// Company id
    pub company_id: String,
    /// Metric wire name
    pub metric: String,
    /// Fiscal year
    pub fiscal_year: i32,
    /// Fiscal quarter number
    pub fiscal_quarter: u8,
    /// Fiscal year of the disclosing filing
    pub declared_fiscal_year: i32,
    /// Period end
    pub period_end: NaiveDate,
    /// Filing date
    pub filed_date: NaiveDate,
    /// Discrete quarter value
    pub q_val: Option<f64>,
    /// Trailing twelve-month value
    pub ttm_val: Option<f64>,
    /// Derivation kind
    pub derivation: String,
    /// Trailing aggregation outcome
    pub ttm_status: String,
    /// Pipe-separated diagnostics
    pub flags: String,
}

impl TableRow for QuarterlyRow {
    const TABLE: &'static str = "quarterly_metrics";
    const COLUMNS: &'static [&'static str] = &[
        "company_id",
        "metric",
        "fiscal_year",
        "fiscal_quarter",
        "declared_fiscal_year",
        "period_end",
        "filed_date",
        "q_val",
        "ttm_val",
        "derivation",
        "ttm_status",
        "flags",
    ];
}

impl From<&QuarterlyMetricRecord> for QuarterlyRow {
    fn from(r: &QuarterlyMetricRecord) -> Self {
        Self {
            company_id: r.company_id.to_string(),
            metric: r.metric.to_string(),
            fiscal_year: r.fiscal_year,
            fiscal_quarter: r.fiscal_quarter.number(),
            declared_fiscal_year: r.declared_fiscal_year,
            period_end: r.period_end,
            filed_date: r.filed_date,
            q_val: r.q_val,
            ttm_val: r.ttm_val,
            derivation: describe(&r.derivation),
            ttm_status: r.ttm_status.as_str().to_string(),
            flags: r.flags.to_string(),
        }
    }
}

/// `reconstructed@2020-05-01`, `missing:restatement_decrease`, or the bare kind.
pub(crate) fn describe(derivation: &Derivation) -> String {
    match derivation {
        Derivation::Reconstructed { prior_filed } => format!("reconstructed@{prior_filed}"),
        Derivation::Missing { reason } => format!("missing:{reason}"),
        other => other.as_str().to_string(),
    }
}

/// Split-adjusted share row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedShareRow {
    /// Company id
    pub company_id: String,
    /// Fiscal year
    pub fiscal_year: i32,
    /// Fiscal quarter number
    pub fiscal_quarter: u8,
    /// Period end
    pub period_end: NaiveDate,
    /// Filing date
    pub filed_date: NaiveDate,
    /// Shares as reported
    pub raw_shares: Option<f64>,
    /// Shares on the latest split basis
    pub adjusted_shares: Option<f64>,
    /// Multiplier applied
    pub factor: f64,
}

impl TableRow for AdjustedShareRow {
    const TABLE: &'static str = "adjusted_shares";
    const COLUMNS: &'static [&'static str] = &[
        "company_id",
        "fiscal_year",
        "fiscal_quarter",
        "period_end",
        "filed_date",
        "raw_shares",
        "adjusted_shares",
        "factor",
    ];
}

impl From<&AdjustedShare> for AdjustedShareRow {
    fn from(s: &AdjustedShare) -> Self {
        Self {
            company_id: s.company_id.to_string(),
            fiscal_year: s.fiscal_year,
            fiscal_quarter: s.fiscal_quarter.number(),
            period_end: s.period_end,
            filed_date: s.filed_date,
            raw_shares: s.raw_shares,
            adjusted_shares: s.adjusted_shares,
            factor: s.factor,
        }
    }
}

/// Split event row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitEventRow {
    /// Company id
    pub company_id: String,
    /// First post-split period end
    pub split_period_end: NaiveDate,
    /// First post-split filing date
    pub split_filed_date: NaiveDate,
    /// Detected ratio
    pub ratio: f64,
    /// Adjacent to another detected split
    pub ambiguous: bool,
}

impl TableRow for SplitEventRow {
    const TABLE: &'static str = "split_events";
    const COLUMNS: &'static [&'static str] = &[
        "company_id",
        "split_period_end",
        "split_filed_date",
        "ratio",
        "ambiguous",
    ];
}

impl From<&SplitEvent> for SplitEventRow {
    fn from(e: &SplitEvent) -> Self {
        Self {
            company_id: e.company_id.to_string(),
            split_period_end: e.split_period_end,
            split_filed_date: e.split_filed_date,
            ratio: e.ratio,
            ambiguous: e.ambiguous,
        }
    }
}

/// Failed company row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRow {
    /// Company id
    pub company_id: String,
    /// Error message
    pub error: String,
}

impl TableRow for FailureRow {
    const TABLE: &'static str = "failures";
    const COLUMNS: &'static [&'static str] = &["company_id", "error"];
}

impl From<&CompanyFailure> for FailureRow {
    fn from(f: &CompanyFailure) -> Self {
        Self {
            company_id: f.company_id.to_string(),
            error: f.error.clone(),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl<R: TableRow> Exporter for Vec<R> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(vec![]);
                wtr.write_record(R::COLUMNS)?;
                for row in self {
                    wtr.serialize(row)?;
                }
                let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
                String::from_utf8(bytes)
                    .map_err(|e| ExportError::InvalidFormat(format!("non UTF-8 CSV output: {e}")))
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// Flat tables of a derivation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunExport {
    /// Canonical facts
    pub canonical_facts: Vec<CanonicalFactRow>,
    /// Quarterly metrics
    pub quarterly: Vec<QuarterlyRow>,
    /// Adjusted share series
    pub adjusted_shares: Vec<AdjustedShareRow>,
    /// Split events
    pub split_events: Vec<SplitEventRow>,
    /// Failed companies
    pub failures: Vec<FailureRow>,
}

impl From<&DerivationRun> for RunExport {
    fn from(run: &DerivationRun) -> Self {
        Self {
            canonical_facts: run.canonical_facts.iter().map(Into::into).collect(),
            quarterly: run.quarterly.iter().map(Into::into).collect(),
            adjusted_shares: run.adjusted_shares.iter().map(Into::into).collect(),
            split_events: run.split_events.iter().map(Into::into).collect(),
            failures: run.failures.iter().map(Into::into).collect(),
        }
    }
}

impl RunExport {
    /// Write every table into `dir` as `<table>.<ext>`, creating `dir` if needed.
    ///
    /// Returns the written paths in table order.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or a table fails
    /// to serialize or write.
    pub fn write_dir(&self, dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>, ExportError> {
        std::fs::create_dir_all(dir)?;
        Ok(vec![
            write_table(&self.canonical_facts, dir, format)?,
            write_table(&self.quarterly, dir, format)?,
            write_table(&self.adjusted_shares, dir, format)?,
            write_table(&self.split_events, dir, format)?,
            write_table(&self.failures, dir, format)?,
        ])
    }
}

#[allow(clippy::ptr_arg)]
fn write_table<R: TableRow>(
    rows: &Vec<R>,
    dir: &Path,
    format: ExportFormat,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(format!("{}.{}", R::TABLE, format.extension()));
    rows.export_to_file(&path, format)?;
    Ok(path)
}
