//! Fiscal period assignment.
//!
//! A period end is mapped to `(fiscal_year, fiscal_quarter)` from the
//! company's fiscal year end (FYE). Quarter boundaries are anchored at the FYE
//! and at FYE + 3, + 6 and + 9 months, compared by day of year on a non-leap
//! reference calendar. Companies reporting on 52/53-week years end their
//! quarters a few days either side of those anchors, hence the tolerance.
//!
//! ```
//! use chrono::NaiveDate;
//! use pitfund_data::{FiscalCalendar, FiscalQuarter, MonthDay};
//! use pitfund_engine::config::FiscalConfig;
//! use pitfund_engine::fiscal::FiscalPeriodAssigner;
//!
//! let fye = MonthDay::new(9, 26).unwrap();
//! let calendar = FiscalCalendar::declared(fye);
//! let assigner = FiscalPeriodAssigner::new(calendar, FiscalConfig::default());
//!
//! let q4 = assigner.assign(NaiveDate::from_ymd_opt(2019, 9, 28).unwrap());
//! assert_eq!((q4.fiscal_year, q4.fiscal_quarter), (2019, FiscalQuarter::Q4));
//!
//! let q1 = assigner.assign(NaiveDate::from_ymd_opt(2019, 12, 28).unwrap());
//! assert_eq!((q1.fiscal_year, q1.fiscal_quarter), (2020, FiscalQuarter::Q1));
//! ```

use crate::config::FiscalConfig;
use chrono::{Datelike, Days, NaiveDate};
use pitfund_data::company::DAYS_IN_YEAR;
use pitfund_data::{FiscalCalendar, FiscalQuarter, MonthDay};
use serde::{Deserialize, Serialize};

/// Length of a proportional fallback quarter in days.
const FALLBACK_QUARTER_DAYS: u32 = 91;

/// How a quarter was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentConfidence {
    /// Within tolerance of a quarter anchor
    Exact,
    /// No anchor within tolerance; quarter chosen by position in the year
    Proportional,
}

/// Fiscal period of one period end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodAssignment {
    /// Fiscal year
    pub fiscal_year: i32,
    /// Fiscal quarter
    pub fiscal_quarter: FiscalQuarter,
    /// How the quarter was chosen
    pub confidence: AssignmentConfidence,
}

/// Assigns fiscal periods for one company.
#[derive(Debug, Clone, Copy)]
pub struct FiscalPeriodAssigner {
    calendar: FiscalCalendar,
    tolerance_days: u32,
    anchors: [(FiscalQuarter, u32); 4],
}

impl FiscalPeriodAssigner {
    /// Create an assigner for a company's fiscal calendar.
    pub const fn new(calendar: FiscalCalendar, config: FiscalConfig) -> Self {
        let fye = calendar.fiscal_year_end;
        Self {
            calendar,
            tolerance_days: config.tolerance_days,
            anchors: [
                (FiscalQuarter::Q1, fye.plus_months(3).ordinal()),
                (FiscalQuarter::Q2, fye.plus_months(6).ordinal()),
                (FiscalQuarter::Q3, fye.plus_months(9).ordinal()),
                (FiscalQuarter::Q4, fye.ordinal()),
            ],
        }
    }

    /// The calendar in use.
    pub const fn calendar(&self) -> &FiscalCalendar {
        &self.calendar
    }

    /// Assign a period end to its fiscal year and quarter.
    pub fn assign(&self, period_end: NaiveDate) -> PeriodAssignment {
        let (fiscal_quarter, confidence) = self.fiscal_quarter(period_end);
        // Q1-Q3 close before the year's FYE, so only Q4 takes the tolerance
        let fiscal_year = if fiscal_quarter == FiscalQuarter::Q4 {
            self.fiscal_year(period_end)
        } else {
            self.year_ending_on_or_after(period_end)
        };
        PeriodAssignment {
            fiscal_year,
            fiscal_quarter,
            confidence,
        }
    }

    /// Fiscal year: the calendar year of the first FYE anchor `A` with
    /// `period_end <= A + tolerance`.
    pub fn fiscal_year(&self, period_end: NaiveDate) -> i32 {
        let shifted = period_end
            .checked_sub_days(Days::new(u64::from(self.tolerance_days)))
            .unwrap_or(period_end);
        self.year_ending_on_or_after(shifted)
    }

    /// Calendar year of the first FYE anchor on or after `date`.
    fn year_ending_on_or_after(&self, date: NaiveDate) -> i32 {
        let fye = self.calendar.fiscal_year_end;
        if (date.month(), date.day()) <= (fye.month(), fye.day()) {
            date.year()
        } else {
            date.year() + 1
        }
    }

    /// Fiscal quarter by nearest anchor, falling back to 91-day windows after
    /// the FYE when no anchor is within tolerance. Equidistant anchors resolve
    /// to the lower quarter.
    pub fn fiscal_quarter(&self, period_end: NaiveDate) -> (FiscalQuarter, AssignmentConfidence) {
        let day = MonthDay::from_date(period_end).ordinal();

        let mut best = self.anchors[0];
        let mut best_distance = circular_distance(day, best.1);
        for anchor in &self.anchors[1..] {
            let distance = circular_distance(day, anchor.1);
            if distance < best_distance {
                best = *anchor;
                best_distance = distance;
            }
        }
        if best_distance <= self.tolerance_days {
            return (best.0, AssignmentConfidence::Exact);
        }

        let fye_day = self.calendar.fiscal_year_end.ordinal();
        // Days since the day after the FYE, 0-based
        let offset = (day + DAYS_IN_YEAR - fye_day - 1) % DAYS_IN_YEAR;
        let index = (offset / FALLBACK_QUARTER_DAYS).min(3);
        let quarter = FiscalQuarter::ALL[index as usize];
        (quarter, AssignmentConfidence::Proportional)
    }
}

const fn circular_distance(a: u32, b: u32) -> u32 {
    let d = a.abs_diff(b);
    if d > DAYS_IN_YEAR - d { DAYS_IN_YEAR - d } else { d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assigner(month: u32, day: u32) -> FiscalPeriodAssigner {
        FiscalPeriodAssigner::new(
            FiscalCalendar::declared(MonthDay::new(month, day).unwrap()),
            FiscalConfig::default(),
        )
    }

    #[rstest]
    // 52/53-week year ending late September
    #[case((9, 26), date(2019, 9, 28), 2019, FiscalQuarter::Q4)]
    #[case((9, 26), date(2019, 12, 28), 2020, FiscalQuarter::Q1)]
    #[case((9, 26), date(2020, 3, 28), 2020, FiscalQuarter::Q2)]
    #[case((9, 26), date(2020, 6, 27), 2020, FiscalQuarter::Q3)]
    #[case((9, 26), date(2020, 9, 26), 2020, FiscalQuarter::Q4)]
    #[case((9, 26), date(2022, 9, 24), 2022, FiscalQuarter::Q4)]
    #[case((9, 26), date(2023, 10, 1), 2023, FiscalQuarter::Q4)]
    // Calendar year
    #[case((12, 31), date(2020, 3, 31), 2020, FiscalQuarter::Q1)]
    #[case((12, 31), date(2020, 12, 31), 2020, FiscalQuarter::Q4)]
    #[case((12, 31), date(2021, 1, 2), 2020, FiscalQuarter::Q4)]
    // June year end
    #[case((6, 30), date(2020, 9, 30), 2021, FiscalQuarter::Q1)]
    #[case((6, 30), date(2021, 3, 31), 2021, FiscalQuarter::Q3)]
    #[case((6, 30), date(2021, 6, 30), 2021, FiscalQuarter::Q4)]
    // Late January retail year end
    #[case((1, 31), date(2020, 2, 1), 2020, FiscalQuarter::Q4)]
    #[case((1, 31), date(2020, 5, 2), 2021, FiscalQuarter::Q1)]
    fn test_assign_exact(
        #[case] fye: (u32, u32),
        #[case] period_end: NaiveDate,
        #[case] fiscal_year: i32,
        #[case] quarter: FiscalQuarter,
    ) {
        let a = assigner(fye.0, fye.1).assign(period_end);
        assert_eq!(a.fiscal_year, fiscal_year);
        assert_eq!(a.fiscal_quarter, quarter);
        assert_eq!(a.confidence, AssignmentConfidence::Exact);
    }

    #[test]
    fn test_feb_anchor_clamped() {
        // Nov 30 FYE: Q1 anchor is Feb 28, leap-year Feb 29 still matches
        let a = assigner(11, 30).assign(date(2020, 2, 29));
        assert_eq!(a.fiscal_quarter, FiscalQuarter::Q1);
        assert_eq!(a.fiscal_year, 2020);
        assert_eq!(a.confidence, AssignmentConfidence::Exact);
    }

    #[rstest]
    #[case(date(2020, 2, 15), FiscalQuarter::Q1)]
    #[case(date(2020, 5, 15), FiscalQuarter::Q2)]
    #[case(date(2020, 8, 15), FiscalQuarter::Q3)]
    #[case(date(2020, 11, 15), FiscalQuarter::Q4)]
    fn test_proportional_fallback(#[case] period_end: NaiveDate, #[case] quarter: FiscalQuarter) {
        let (q, confidence) = assigner(12, 31).fiscal_quarter(period_end);
        assert_eq!(q, quarter);
        assert_eq!(confidence, AssignmentConfidence::Proportional);
    }

    #[test]
    fn test_fallback_late_in_year_is_q4() {
        let (q, confidence) = assigner(12, 31).fiscal_quarter(date(2020, 12, 20));
        assert_eq!(q, FiscalQuarter::Q4);
        assert_eq!(confidence, AssignmentConfidence::Proportional);
    }

    #[test]
    fn test_zero_tolerance() {
        let assigner = FiscalPeriodAssigner::new(
            FiscalCalendar::declared(MonthDay::DECEMBER_31),
            FiscalConfig { tolerance_days: 0 },
        );
        assert_eq!(
            assigner.fiscal_quarter(date(2020, 3, 31)),
            (FiscalQuarter::Q1, AssignmentConfidence::Exact)
        );
        assert_eq!(
            assigner.fiscal_quarter(date(2020, 3, 30)).1,
            AssignmentConfidence::Proportional
        );
        assert_eq!(assigner.fiscal_year(date(2021, 1, 1)), 2021);
    }

    #[rstest]
    // 45 days from both the Q4 (12-31) and Q1 (03-31) anchors
    #[case(date(2021, 2, 14), 2021, FiscalQuarter::Q1)]
    #[case(date(2021, 1, 20), 2020, FiscalQuarter::Q4)]
    #[case(date(2021, 11, 20), 2021, FiscalQuarter::Q4)]
    fn test_equidistant_anchors_take_lower_quarter(
        #[case] period_end: NaiveDate,
        #[case] fiscal_year: i32,
        #[case] quarter: FiscalQuarter,
    ) {
        let assigner = FiscalPeriodAssigner::new(
            FiscalCalendar::declared(MonthDay::DECEMBER_31),
            FiscalConfig { tolerance_days: 45 },
        );
        let a = assigner.assign(period_end);
        assert_eq!((a.fiscal_year, a.fiscal_quarter), (fiscal_year, quarter));
        assert_eq!(a.confidence, AssignmentConfidence::Exact);
    }

    #[test]
    fn test_circular_distance() {
        assert_eq!(circular_distance(1, 365), 1);
        assert_eq!(circular_distance(10, 20), 10);
        assert_eq!(circular_distance(20, 10), 10);
    }
}
