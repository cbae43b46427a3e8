//! Output record types.

use crate::diagnostics::{Diagnostic, Flags};
use chrono::NaiveDate;
use pitfund_data::{CompanyId, DeclaredPeriod, FiscalQuarter, Metric};
use serde::{Deserialize, Serialize};

/// Canonical key shared by canonical facts and quarterly records.
///
/// Ordering is chronological by fiscal period, then by filing date.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactKey {
    /// Reporting company
    pub company_id: CompanyId,
    /// Metric
    pub metric: Metric,
    /// Assigned fiscal year
    pub fiscal_year: i32,
    /// Assigned fiscal quarter
    pub fiscal_quarter: FiscalQuarter,
    /// Filing date of this version
    pub filed_date: NaiveDate,
}

/// The value of one metric for one fiscal period as known from one filing.
///
/// Restatements are separate versions with a later `filed_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFact {
    /// Reporting company
    pub company_id: CompanyId,
    /// Metric
    pub metric: Metric,
    /// Winning tag
    pub tag: String,
    /// Assigned fiscal year
    pub fiscal_year: i32,
    /// Assigned fiscal quarter
    pub fiscal_quarter: FiscalQuarter,
    /// Fiscal year of the filing that disclosed the value
    pub declared_fiscal_year: i32,
    /// Period label the filing assigned
    pub declared_period: DeclaredPeriod,
    /// End of the described period
    pub period_end: NaiveDate,
    /// Filing date
    pub filed_date: NaiveDate,
    /// Form type
    pub form_type: String,
    /// Normalized value (cumulative for year-to-date metrics)
    pub value: f64,
    /// Diagnostics raised while producing this fact
    pub flags: Flags,
}

impl CanonicalFact {
    /// Canonical key.
    pub fn key(&self) -> FactKey {
        FactKey {
            company_id: self.company_id.clone(),
            metric: self.metric,
            fiscal_year: self.fiscal_year,
            fiscal_quarter: self.fiscal_quarter,
            filed_date: self.filed_date,
        }
    }

    /// Whether this is the originally filed version rather than a comparative
    /// disclosure in a later year's filing.
    pub const fn is_original_filing(&self) -> bool {
        self.declared_fiscal_year == self.fiscal_year
    }
}

/// How a quarterly value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Derivation {
    /// Reported value used as-is (first quarter or non-cumulative metric)
    Direct,
    /// Cumulative value minus the prior quarter's cumulative value
    Reconstructed {
        /// Filing date of the prior-quarter version subtracted
        prior_filed: NaiveDate,
    },
    /// No prior quarter was known at filing time; cumulative value used
    FallbackToCumulative,
    /// No usable value
    Missing {
        /// Why the value is missing
        reason: Diagnostic,
    },
}

impl Derivation {
    /// Snake-case name without payload.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Reconstructed { .. } => "reconstructed",
            Self::FallbackToCumulative => "fallback_to_cumulative",
            Self::Missing { .. } => "missing",
        }
    }
}

/// Outcome of the trailing aggregation for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtmStatus {
    /// Full window summed
    Complete,
    /// Fewer distinct periods known than the window
    InsufficientHistory,
    /// A period in the window has no quarterly value
    MissingComponent,
    /// Window periods are not consecutive quarters
    NonContiguous,
}

impl TtmStatus {
    /// Snake-case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::InsufficientHistory => "insufficient_history",
            Self::MissingComponent => "missing_component",
            Self::NonContiguous => "non_contiguous",
        }
    }
}

/// Discrete quarterly and trailing values for one canonical fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyMetricRecord {
    /// Reporting company
    pub company_id: CompanyId,
    /// Metric
    pub metric: Metric,
    /// Assigned fiscal year
    pub fiscal_year: i32,
    /// Assigned fiscal quarter
    pub fiscal_quarter: FiscalQuarter,
    /// Fiscal year of the disclosing filing
    pub declared_fiscal_year: i32,
    /// End of the described period
    pub period_end: NaiveDate,
    /// Filing date
    pub filed_date: NaiveDate,
    /// Discrete quarterly value
    pub q_val: Option<f64>,
    /// Trailing sum over the window as known at `filed_date`
    pub ttm_val: Option<f64>,
    /// How `q_val` was obtained
    pub derivation: Derivation,
    /// How `ttm_val` was obtained
    pub ttm_status: TtmStatus,
    /// Diagnostics carried from the canonical fact plus derivation diagnostics
    pub flags: Flags,
}

impl QuarterlyMetricRecord {
    /// Canonical key.
    pub fn key(&self) -> FactKey {
        FactKey {
            company_id: self.company_id.clone(),
            metric: self.metric,
            fiscal_year: self.fiscal_year,
            fiscal_quarter: self.fiscal_quarter,
            filed_date: self.filed_date,
        }
    }

    /// Fiscal period of the record.
    pub const fn period(&self) -> (i32, FiscalQuarter) {
        (self.fiscal_year, self.fiscal_quarter)
    }
}
