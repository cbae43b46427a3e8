//! Company reference types.
//!
//! Companies are identified by their SEC Central Index Key, zero-padded to
//! ten digits, and carry an optional fiscal-year-end month/day.

use crate::error::{DataError, Result};
use chrono::{Datelike, NaiveDate};
use derive_more::{Display, Into};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Cumulative day counts at the start of each month in a non-leap year.
const MONTH_OFFSETS: [u32; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Days in each month of a non-leap year.
const MONTH_LENGTHS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Days in the non-leap reference year.
pub const DAYS_IN_YEAR: u32 = 365;

/// Zero-padded 10-digit CIK identifying a company.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Into, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(String);

impl CompanyId {
    /// Create an identifier from a numeric CIK.
    pub fn from_cik(cik: u64) -> Self {
        Self(format!("{:0>10}", cik))
    }

    /// Parse a CIK such as `320193`, `0000320193` or `CIK0000320193`.
    pub fn parse(raw: &str) -> Result<Self> {
        let digits = raw.trim().trim_start_matches("CIK");
        if digits.is_empty() || digits.len() > 10 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DataError::Parse(format!("Invalid CIK: {raw}")));
        }
        Ok(Self(format!("{:0>10}", digits)))
    }

    /// The padded identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A month/day pair on the non-leap reference calendar.
///
/// Used for fiscal-year-end dates. `02-29` is clamped to `02-28`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// Calendar year end, the default fiscal year end.
    pub const DECEMBER_31: Self = Self { month: 12, day: 31 };

    /// Create a validated month/day.
    pub fn new(month: u32, day: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || day == 0 {
            return Err(DataError::InvalidMonthDay { month, day });
        }
        let day = match (month, day) {
            (2, 29) => 28,
            (m, d) if d > MONTH_LENGTHS[(m - 1) as usize] => {
                return Err(DataError::InvalidMonthDay { month, day });
            }
            (_, d) => d,
        };
        Ok(Self { month, day })
    }

    /// Month/day of a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: if date.month() == 2 { date.day().min(28) } else { date.day() },
        }
    }

    /// Month component (1-12).
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Day component.
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Day of year (1-365) on the non-leap reference calendar.
    pub const fn ordinal(&self) -> u32 {
        MONTH_OFFSETS[(self.month - 1) as usize] + self.day
    }

    /// Shift forward by whole months, wrapping the year and clamping the day
    /// to the target month's length.
    pub const fn plus_months(&self, months: u32) -> Self {
        let month = (self.month - 1 + months) % 12 + 1;
        let len = MONTH_LENGTHS[(month - 1) as usize];
        Self {
            month,
            day: if self.day > len { len } else { self.day },
        }
    }
}

impl FromStr for MonthDay {
    type Err = DataError;

    /// Accepts `MMDD`, `MM-DD` and `--MM-DD`.
    fn from_str(s: &str) -> Result<Self> {
        let digits: String = s.trim().chars().filter(|c| *c != '-').collect();
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DataError::Parse(format!("Invalid month/day: {s}")));
        }
        let month = digits[..2]
            .parse()
            .map_err(|e| DataError::Parse(format!("Invalid month in {s}: {e}")))?;
        let day = digits[2..]
            .parse()
            .map_err(|e| DataError::Parse(format!("Invalid day in {s}: {e}")))?;
        Self::new(month, day)
    }
}

impl TryFrom<String> for MonthDay {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MonthDay> for String {
    fn from(value: MonthDay) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for MonthDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Reference data for one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Padded CIK
    pub company_id: CompanyId,

    /// Trading symbol, when known
    pub ticker: Option<String>,

    /// Registrant name, when known
    pub name: Option<String>,

    /// Fiscal year end, declared or inferred
    pub fiscal_year_end: Option<MonthDay>,

    /// Date of the company's first filing
    pub first_disclosure_date: Option<NaiveDate>,
}

impl Company {
    /// Create a company with no reference data beyond its identifier.
    pub const fn new(company_id: CompanyId) -> Self {
        Self {
            company_id,
            ticker: None,
            name: None,
            fiscal_year_end: None,
            first_disclosure_date: None,
        }
    }

    /// Set the fiscal year end.
    pub fn with_fiscal_year_end(mut self, fye: MonthDay) -> Self {
        self.fiscal_year_end = Some(fye);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("320193", "0000320193")]
    #[case("0000320193", "0000320193")]
    #[case("CIK0000789019", "0000789019")]
    fn test_company_id_parse(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(CompanyId::parse(raw).unwrap().as_str(), expected);
    }

    #[test]
    fn test_company_id_rejects_garbage() {
        assert!(CompanyId::parse("AAPL").is_err());
        assert!(CompanyId::parse("").is_err());
        assert!(CompanyId::parse("123456789012").is_err());
    }

    #[test]
    fn test_company_id_from_cik() {
        assert_eq!(CompanyId::from_cik(320193).to_string(), "0000320193");
    }

    #[rstest]
    #[case("0926", 9, 26)]
    #[case("09-26", 9, 26)]
    #[case("--12-31", 12, 31)]
    #[case("0229", 2, 28)]
    fn test_month_day_parse(#[case] raw: &str, #[case] month: u32, #[case] day: u32) {
        let md: MonthDay = raw.parse().unwrap();
        assert_eq!((md.month(), md.day()), (month, day));
    }

    #[rstest]
    #[case("1301")]
    #[case("0431")]
    #[case("0000")]
    #[case("abc")]
    fn test_month_day_invalid(#[case] raw: &str) {
        assert!(raw.parse::<MonthDay>().is_err());
    }

    #[test]
    fn test_ordinal() {
        assert_eq!(MonthDay::new(1, 1).unwrap().ordinal(), 1);
        assert_eq!(MonthDay::new(3, 1).unwrap().ordinal(), 60);
        assert_eq!(MonthDay::DECEMBER_31.ordinal(), DAYS_IN_YEAR);
    }

    #[test]
    fn test_plus_months_wraps_and_clamps() {
        let fye = MonthDay::new(11, 30).unwrap();
        // Nov 30 + 3 months lands in February and clamps to the 28th
        assert_eq!(fye.plus_months(3), MonthDay::new(2, 28).unwrap());
        assert_eq!(fye.plus_months(6), MonthDay::new(5, 30).unwrap());

        let fye = MonthDay::new(9, 26).unwrap();
        assert_eq!(fye.plus_months(3), MonthDay::new(12, 26).unwrap());
        assert_eq!(fye.plus_months(9), MonthDay::new(6, 26).unwrap());
    }

    #[test]
    fn test_from_date_clamps_leap_day() {
        let leap = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        assert_eq!(MonthDay::from_date(leap), MonthDay::new(2, 28).unwrap());
    }

    #[test]
    fn test_month_day_serde_roundtrip_as_string() {
        let md = MonthDay::new(6, 30).unwrap();
        let json = serde_json::to_string(&md).unwrap();
        assert_eq!(json, "\"06-30\"");
        let back: MonthDay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, md);
    }
}
