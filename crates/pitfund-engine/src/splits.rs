//! Share split detection and retroactive adjustment.
//!
//! Splits are detected on the originally filed share-count series: one row per
//! fiscal period, taken from the filing that first reported it. A jump in the
//! period-over-period ratio beyond the configured thresholds marks a split at
//! that period. Earlier rows are rescaled only if they were also filed before
//! the split filing; rows filed afterwards already carry the filer's own
//! retroactive restatement.

use crate::config::SplitConfig;
use crate::record::QuarterlyMetricRecord;
use chrono::NaiveDate;
use pitfund_data::{CompanyId, FiscalQuarter, Metric};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A detected share split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitEvent {
    /// Company
    pub company_id: CompanyId,
    /// Period end of the first post-split row
    pub split_period_end: NaiveDate,
    /// Filing date of the first post-split row
    pub split_filed_date: NaiveDate,
    /// Post-split shares over pre-split shares
    pub ratio: f64,
    /// Another split was detected in an adjacent period
    pub ambiguous: bool,
}

/// One row of the adjusted share series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedShare {
    /// Company
    pub company_id: CompanyId,
    /// Fiscal year
    pub fiscal_year: i32,
    /// Fiscal quarter
    pub fiscal_quarter: FiscalQuarter,
    /// Period end
    pub period_end: NaiveDate,
    /// Filing date of the original report
    pub filed_date: NaiveDate,
    /// Share count as reported
    pub raw_shares: Option<f64>,
    /// Share count on the latest split basis
    pub adjusted_shares: Option<f64>,
    /// Cumulative multiplier applied
    pub factor: f64,
}

/// Detected splits of one company, applied on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitSchedule {
    events: Vec<SplitEvent>,
}

impl SplitSchedule {
    /// Detected splits, oldest first.
    pub fn events(&self) -> &[SplitEvent] {
        &self.events
    }

    /// Consume into the detected splits.
    pub fn into_events(self) -> Vec<SplitEvent> {
        self.events
    }

    /// Whether no split was detected.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether any split was detected next to another.
    pub fn is_ambiguous(&self) -> bool {
        self.events.iter().any(|e| e.ambiguous)
    }

    /// Multiplier for a share count reported for `period_end` in a filing
    /// dated `filed_date`.
    pub fn factor_for(&self, period_end: NaiveDate, filed_date: NaiveDate) -> f64 {
        self.events
            .iter()
            .rev()
            .filter(|e| period_end < e.split_period_end && filed_date < e.split_filed_date)
            .map(|e| e.ratio)
            .product()
    }

    /// Adjust a reported share count.
    pub fn adjust(&self, shares: f64, period_end: NaiveDate, filed_date: NaiveDate) -> f64 {
        shares * self.factor_for(period_end, filed_date)
    }
}

/// Split detection and adjustment output for one company.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitAdjustment {
    /// Detected splits
    pub schedule: SplitSchedule,
    /// Originally filed series with adjusted values
    pub shares: Vec<AdjustedShare>,
}

/// Detects splits and rescales pre-split share counts.
#[derive(Debug, Clone, Copy)]
pub struct SplitAdjuster {
    config: SplitConfig,
}

impl SplitAdjuster {
    /// Create an adjuster.
    pub const fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// Whether a period-over-period ratio indicates a split.
    pub fn is_split(&self, ratio: f64) -> bool {
        ratio > self.config.upper_ratio || ratio < self.config.lower_ratio
    }

    /// Adjust a company's share series.
    ///
    /// `records` may contain any metric; only originally filed share records
    /// are used.
    pub fn adjust(&self, records: &[QuarterlyMetricRecord]) -> SplitAdjustment {
        let series = original_series(records);
        if series.len() < 2 {
            return SplitAdjustment {
                schedule: SplitSchedule::default(),
                shares: series.into_iter().map(|r| adjusted_row(r, 1.0)).collect(),
            };
        }

        let schedule = self.detect(&series);
        let shares = series
            .into_iter()
            .map(|r| {
                let factor = schedule.factor_for(r.period_end, r.filed_date);
                adjusted_row(r, factor)
            })
            .collect();

        SplitAdjustment { schedule, shares }
    }

    /// Ratios between consecutive rows with a positive count. Rows without a
    /// value do not break the chain; the next valued row compares against
    /// the last valued one.
    fn detect(&self, series: &[&QuarterlyMetricRecord]) -> SplitSchedule {
        // (series index, event)
        let mut found: Vec<(usize, SplitEvent)> = Vec::new();
        let mut previous: Option<f64> = None;

        for (i, row) in series.iter().enumerate() {
            let Some(value) = row.q_val.filter(|v| *v > 0.0) else {
                continue;
            };
            if let Some(prior) = previous {
                let ratio = value / prior;
                if self.is_split(ratio) {
                    found.push((
                        i,
                        SplitEvent {
                            company_id: row.company_id.clone(),
                            split_period_end: row.period_end,
                            split_filed_date: row.filed_date,
                            ratio,
                            ambiguous: false,
                        },
                    ));
                }
            }
            previous = Some(value);
        }

        // A neighbour only counts once it has been filed
        let known_neighbour = |k: usize, j: usize| {
            found[k].0.abs_diff(found[j].0) == 1
                && found[j].1.split_filed_date <= found[k].1.split_filed_date
        };
        let adjacent: Vec<bool> = (0..found.len())
            .map(|k| {
                let before = k > 0 && known_neighbour(k, k - 1);
                let after = k + 1 < found.len() && known_neighbour(k, k + 1);
                before || after
            })
            .collect();

        let events = found
            .into_iter()
            .zip(adjacent)
            .map(|((_, mut event), ambiguous)| {
                event.ambiguous = ambiguous;
                if ambiguous {
                    debug!(
                        company = %event.company_id,
                        period_end = %event.split_period_end,
                        ratio = event.ratio,
                        "adjacent split candidates"
                    );
                }
                event
            })
            .collect();

        SplitSchedule { events }
    }
}

/// Earliest originally filed share record per fiscal period, chronological.
fn original_series(records: &[QuarterlyMetricRecord]) -> Vec<&QuarterlyMetricRecord> {
    let mut by_period: BTreeMap<(i32, FiscalQuarter), &QuarterlyMetricRecord> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| r.metric == Metric::Shares && r.declared_fiscal_year == r.fiscal_year)
    {
        by_period
            .entry(record.period())
            .and_modify(|kept| {
                if record.filed_date < kept.filed_date {
                    *kept = record;
                }
            })
            .or_insert(record);
    }
    let mut series: Vec<_> = by_period.into_values().collect();
    series.sort_by_key(|r| (r.period_end, r.filed_date));
    series
}

fn adjusted_row(record: &QuarterlyMetricRecord, factor: f64) -> AdjustedShare {
    AdjustedShare {
        company_id: record.company_id.clone(),
        fiscal_year: record.fiscal_year,
        fiscal_quarter: record.fiscal_quarter,
        period_end: record.period_end,
        filed_date: record.filed_date,
        raw_shares: record.q_val,
        adjusted_shares: record.q_val.map(|v| v * factor),
        factor,
    }
}
