//! Year-to-date to discrete quarter conversion.
//!
//! Cash-flow statements are filed cumulatively: the Q2 filing reports six
//! months, Q3 nine, the annual filing twelve. A discrete quarter is the
//! cumulative value minus the prior quarter's cumulative value, where the
//! prior is the latest version of that quarter filed strictly before the
//! current record. Later restatements of the prior quarter never leak into
//! an earlier-filed reconstruction.

use crate::diagnostics::Diagnostic;
use crate::record::{CanonicalFact, Derivation, QuarterlyMetricRecord, TtmStatus};
use chrono::NaiveDate;
use pitfund_data::{FiscalQuarter, MetricSpec};
use std::collections::HashMap;
use tracing::warn;

/// Converts one company/metric series of canonical facts to quarterly records.
#[derive(Debug, Clone, Copy)]
pub struct YtdConverter<'a> {
    spec: &'a MetricSpec,
}

impl<'a> YtdConverter<'a> {
    /// Create a converter for a metric.
    pub const fn new(spec: &'a MetricSpec) -> Self {
        Self { spec }
    }

    /// Convert canonical facts of a single company and metric.
    ///
    /// Output records are in the same order as `facts`. `ttm_val` is left
    /// unset.
    pub fn convert(&self, facts: &[CanonicalFact]) -> Vec<QuarterlyMetricRecord> {
        // (fiscal_year, quarter) -> versions sorted by filed date
        let mut versions: HashMap<(i32, FiscalQuarter), Vec<(NaiveDate, f64)>> = HashMap::new();
        if self.spec.is_ytd {
            for fact in facts {
                versions
                    .entry((fact.fiscal_year, fact.fiscal_quarter))
                    .or_default()
                    .push((fact.filed_date, fact.value));
            }
            for list in versions.values_mut() {
                list.sort_by_key(|(filed, _)| *filed);
            }
        }

        facts
            .iter()
            .map(|fact| {
                let (q_val, derivation) = self.derive(fact, &versions);
                let mut flags = fact.flags.clone();
                if let Derivation::Missing { reason } = derivation {
                    flags.insert(reason);
                }
                QuarterlyMetricRecord {
                    company_id: fact.company_id.clone(),
                    metric: fact.metric,
                    fiscal_year: fact.fiscal_year,
                    fiscal_quarter: fact.fiscal_quarter,
                    declared_fiscal_year: fact.declared_fiscal_year,
                    period_end: fact.period_end,
                    filed_date: fact.filed_date,
                    q_val,
                    ttm_val: None,
                    derivation,
                    ttm_status: TtmStatus::InsufficientHistory,
                    flags,
                }
            })
            .collect()
    }

    fn derive(
        &self,
        fact: &CanonicalFact,
        versions: &HashMap<(i32, FiscalQuarter), Vec<(NaiveDate, f64)>>,
    ) -> (Option<f64>, Derivation) {
        let value = if self.spec.magnitude_only { fact.value.abs() } else { fact.value };
        if !self.spec.is_ytd {
            return (Some(value), Derivation::Direct);
        }
        let Some(prior_quarter) = fact.fiscal_quarter.previous() else {
            return (Some(value), Derivation::Direct);
        };

        let prior = versions
            .get(&(fact.fiscal_year, prior_quarter))
            .and_then(|list| {
                let n = list.partition_point(|(filed, _)| *filed < fact.filed_date);
                n.checked_sub(1).map(|i| list[i])
            });

        let Some((prior_filed, prior_value)) = prior else {
            return (Some(value), Derivation::FallbackToCumulative);
        };
        let prior_value = if self.spec.magnitude_only { prior_value.abs() } else { prior_value };
        let q_val = value - prior_value;

        if self.spec.magnitude_only && q_val < 0.0 {
            warn!(
                company = %fact.company_id,
                metric = %fact.metric,
                fiscal_year = fact.fiscal_year,
                fiscal_quarter = %fact.fiscal_quarter,
                filed = %fact.filed_date,
                q_val,
                "negative quarter for magnitude-only metric, treating as missing"
            );
            return (
                None,
                Derivation::Missing {
                    reason: Diagnostic::RestatementDecrease,
                },
            );
        }
        (Some(q_val), Derivation::Reconstructed { prior_filed })
    }
}
