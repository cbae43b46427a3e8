//! Raw disclosed facts and fiscal period labels.

use crate::catalog::Metric;
use crate::company::CompanyId;
use crate::error::DataError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fiscal period a filing declares a value for.
///
/// Year-to-date metrics reported with `FY` are cumulative over the full
/// fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeclaredPeriod {
    /// First quarter
    Q1,
    /// Second quarter (six months cumulative for YTD metrics)
    Q2,
    /// Third quarter (nine months cumulative for YTD metrics)
    Q3,
    /// Full fiscal year
    FY,
}

impl DeclaredPeriod {
    /// The fiscal quarter this declaration describes. `FY` maps to Q4.
    pub const fn quarter(&self) -> FiscalQuarter {
        match self {
            Self::Q1 => FiscalQuarter::Q1,
            Self::Q2 => FiscalQuarter::Q2,
            Self::Q3 => FiscalQuarter::Q3,
            Self::FY => FiscalQuarter::Q4,
        }
    }

    /// Label used in SEC filings.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::FY => "FY",
        }
    }
}

impl FromStr for DeclaredPeriod {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "Q1" => Ok(Self::Q1),
            "Q2" => Ok(Self::Q2),
            "Q3" => Ok(Self::Q3),
            "FY" => Ok(Self::FY),
            other => Err(DataError::Parse(format!("Unknown fiscal period: {other}"))),
        }
    }
}

impl fmt::Display for DeclaredPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quarter of a fiscal year, serialized as 1-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FiscalQuarter {
    /// First quarter
    Q1 = 1,
    /// Second quarter
    Q2 = 2,
    /// Third quarter
    Q3 = 3,
    /// Fourth quarter
    Q4 = 4,
}

impl FiscalQuarter {
    /// All quarters in fiscal order.
    pub const ALL: [Self; 4] = [Self::Q1, Self::Q2, Self::Q3, Self::Q4];

    /// 1-based quarter number.
    pub const fn number(&self) -> u8 {
        *self as u8
    }

    /// Quarter from a 1-based number.
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Q1),
            2 => Some(Self::Q2),
            3 => Some(Self::Q3),
            4 => Some(Self::Q4),
            _ => None,
        }
    }

    /// The preceding quarter within the same fiscal year.
    pub const fn previous(&self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }
}

impl TryFrom<u8> for FiscalQuarter {
    type Error = DataError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_number(value)
            .ok_or_else(|| DataError::Parse(format!("Invalid fiscal quarter: {value}")))
    }
}

impl From<FiscalQuarter> for u8 {
    fn from(value: FiscalQuarter) -> Self {
        value.number()
    }
}

impl fmt::Display for FiscalQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

/// A single disclosed value as it appeared in one filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFact {
    /// Reporting company
    pub company_id: CompanyId,

    /// Catalog metric the tag was collected for
    pub metric: Metric,

    /// Taxonomy tag (e.g. `NetCashProvidedByUsedInOperatingActivities`)
    pub tag: String,

    /// Taxonomy namespace (e.g. `us-gaap`)
    pub namespace: String,

    /// Unit of measure
    pub unit: String,

    /// End of the period the value describes
    pub period_end: NaiveDate,

    /// Date the filing became public
    pub filed_date: NaiveDate,

    /// Period label the filing assigned
    pub declared_period: DeclaredPeriod,

    /// Fiscal year the filing belongs to, which differs from the period's own
    /// fiscal year for comparative disclosures
    pub declared_fiscal_year: i32,

    /// Form type (10-K, 10-Q, 10-K/A, ...)
    pub form_type: String,

    /// Reported value
    pub value: f64,
}

impl RawFact {
    /// Whether the value was public by `as_of`.
    pub fn is_known_at(&self, as_of: NaiveDate) -> bool {
        self.filed_date <= as_of
    }
}
