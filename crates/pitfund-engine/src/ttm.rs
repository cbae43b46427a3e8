//! Trailing-twelve-month aggregation under point-in-time visibility.

use crate::config::TtmConfig;
use crate::diagnostics::Diagnostic;
use crate::record::{QuarterlyMetricRecord, TtmStatus};
use chrono::NaiveDate;
use pitfund_data::FiscalQuarter;
use std::collections::BTreeMap;

/// Every filed version of every fiscal period of one company/metric series.
#[derive(Debug, Clone, Default)]
pub struct VersionIndex {
    periods: BTreeMap<(i32, FiscalQuarter), Vec<(NaiveDate, Option<f64>)>>,
}

impl VersionIndex {
    /// Index quarterly records of a single company and metric.
    pub fn build(records: &[QuarterlyMetricRecord]) -> Self {
        let mut periods: BTreeMap<_, Vec<(NaiveDate, Option<f64>)>> = BTreeMap::new();
        for record in records {
            periods
                .entry(record.period())
                .or_default()
                .push((record.filed_date, record.q_val));
        }
        for versions in periods.values_mut() {
            versions.sort_by_key(|(filed, _)| *filed);
        }
        Self { periods }
    }

    /// Latest version of a period filed on or before `as_of`.
    pub fn value_as_of(
        &self,
        period: (i32, FiscalQuarter),
        as_of: NaiveDate,
    ) -> Option<(NaiveDate, Option<f64>)> {
        let versions = self.periods.get(&period)?;
        let n = versions.partition_point(|(filed, _)| *filed <= as_of);
        n.checked_sub(1).map(|i| versions[i])
    }

    /// The most recent `count` periods with a version visible at `as_of`,
    /// newest first, each at its latest visible version.
    pub fn visible_window(
        &self,
        as_of: NaiveDate,
        count: usize,
    ) -> Vec<((i32, FiscalQuarter), Option<f64>)> {
        self.periods
            .keys()
            .rev()
            .filter_map(|period| {
                self.value_as_of(*period, as_of)
                    .map(|(_, value)| (*period, value))
            })
            .take(count)
            .collect()
    }

    /// Number of indexed periods.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Computes `ttm_val` and `ttm_status` for a series.
#[derive(Debug, Clone, Copy)]
pub struct TtmAggregator {
    config: TtmConfig,
}

impl TtmAggregator {
    /// Create an aggregator.
    pub const fn new(config: TtmConfig) -> Self {
        Self { config }
    }

    /// Fill trailing values for records of one company and metric in place.
    ///
    /// Each record's window is taken as of its own `filed_date`, so values
    /// filed later never contribute.
    pub fn aggregate(&self, records: &mut [QuarterlyMetricRecord]) {
        let index = VersionIndex::build(records);
        for record in records.iter_mut() {
            let (ttm_val, status) = self.window_sum(&index, record.filed_date);
            record.ttm_val = ttm_val;
            record.ttm_status = status;
            if status == TtmStatus::InsufficientHistory {
                record.flags.insert(Diagnostic::InsufficientHistory);
            }
        }
    }

    /// Trailing sum as of a date.
    pub fn window_sum(&self, index: &VersionIndex, as_of: NaiveDate) -> (Option<f64>, TtmStatus) {
        let window = index.visible_window(as_of, self.config.window);
        if window.len() < self.config.window {
            return (None, TtmStatus::InsufficientHistory);
        }
        if self.config.require_contiguous && !is_contiguous(&window) {
            return (None, TtmStatus::NonContiguous);
        }
        let mut sum = 0.0;
        for (_, value) in &window {
            match value {
                Some(v) => sum += v,
                None => return (None, TtmStatus::MissingComponent),
            }
        }
        (Some(sum), TtmStatus::Complete)
    }
}

/// Newest-first periods with no gaps between them.
fn is_contiguous(window: &[((i32, FiscalQuarter), Option<f64>)]) -> bool {
    let ordinal = |(fy, q): (i32, FiscalQuarter)| i64::from(fy) * 4 + i64::from(q.number());
    window
        .windows(2)
        .all(|pair| ordinal(pair[0].0) - ordinal(pair[1].0) == 1)
}
