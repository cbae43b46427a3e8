//! Tag and comparative-disclosure deduplication.
//!
//! A filing routinely reports the same period more than once: under several
//! synonymous tags, and as a comparative column for a prior period. Facts are
//! first assigned their own fiscal period; those whose declared period does not
//! match it are comparatives and are dropped. The remaining candidates for each
//! `(company, metric, fiscal_year, fiscal_quarter, filed_date)` compete by tag
//! priority, then by the most recent period end.

use crate::diagnostics::{Diagnostic, Flags};
use crate::error::Result;
use crate::fiscal::{AssignmentConfidence, FiscalPeriodAssigner, PeriodAssignment};
use crate::record::{CanonicalFact, FactKey};
use pitfund_data::{MetricCatalog, RawFact, ValueNormalizer};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Result of deduplicating one company's facts.
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// One fact per canonical key, in key order
    pub facts: Vec<CanonicalFact>,
    /// Facts dropped as comparative disclosures
    pub excluded_comparatives: usize,
    /// Keys that had more than one candidate
    pub collisions: usize,
}

#[derive(Debug)]
struct Candidate<'f> {
    fact: &'f RawFact,
    priority: usize,
    assignment: PeriodAssignment,
}

impl Candidate<'_> {
    /// Lower tag priority first, then later period end, then form type and
    /// larger value so the choice never depends on input order.
    fn preference(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.fact.period_end.cmp(&self.fact.period_end))
            .then_with(|| self.fact.form_type.cmp(&other.fact.form_type))
            .then_with(|| other.fact.value.total_cmp(&self.fact.value))
    }
}

/// Collapses raw facts to canonical facts.
#[derive(Debug, Clone, Copy)]
pub struct TagDeduplicator<'a> {
    catalog: &'a MetricCatalog,
    normalizer: ValueNormalizer,
}

impl<'a> TagDeduplicator<'a> {
    /// Create a deduplicator over a catalog.
    pub const fn new(catalog: &'a MetricCatalog, normalizer: ValueNormalizer) -> Self {
        Self {
            catalog,
            normalizer,
        }
    }

    /// Deduplicate one company's facts.
    ///
    /// # Errors
    ///
    /// Returns an error if a fact's tag is not listed for its metric.
    pub fn deduplicate(
        &self,
        assigner: &FiscalPeriodAssigner,
        facts: &[RawFact],
    ) -> Result<DedupOutcome> {
        let mut groups: BTreeMap<FactKey, Vec<Candidate<'_>>> = BTreeMap::new();
        let mut outcome = DedupOutcome::default();

        for fact in facts {
            let priority = self.catalog.priority(fact.metric, &fact.tag)?;
            let assignment = assigner.assign(fact.period_end);
            if fact.declared_period.quarter() != assignment.fiscal_quarter {
                outcome.excluded_comparatives += 1;
                continue;
            }
            let key = FactKey {
                company_id: fact.company_id.clone(),
                metric: fact.metric,
                fiscal_year: assignment.fiscal_year,
                fiscal_quarter: assignment.fiscal_quarter,
                filed_date: fact.filed_date,
            };
            groups.entry(key).or_default().push(Candidate {
                fact,
                priority,
                assignment,
            });
        }

        let calendar_defaulted = assigner.calendar().is_defaulted();
        for (key, candidates) in groups {
            let Some(winner) = candidates.iter().min_by(|a, b| a.preference(b)) else {
                continue;
            };

            let mut flags = Flags::default();
            if calendar_defaulted {
                flags.insert(Diagnostic::MissingFiscalCalendar);
            }
            if winner.assignment.confidence == AssignmentConfidence::Proportional {
                flags.insert(Diagnostic::AmbiguousPeriodAssignment);
            }
            if candidates.len() > 1 {
                flags.insert(Diagnostic::DuplicateKeyCollision);
                outcome.collisions += 1;
            }

            let fact = winner.fact;
            let value = match self.catalog.spec(fact.metric) {
                Some(spec) => self.normalizer.apply(spec, fact.value),
                None => fact.value,
            };
            outcome.facts.push(CanonicalFact {
                company_id: key.company_id,
                metric: key.metric,
                tag: fact.tag.clone(),
                fiscal_year: key.fiscal_year,
                fiscal_quarter: key.fiscal_quarter,
                declared_fiscal_year: fact.declared_fiscal_year,
                declared_period: fact.declared_period,
                period_end: fact.period_end,
                filed_date: fact.filed_date,
                form_type: fact.form_type.clone(),
                value,
                flags,
            });
        }

        Ok(outcome)
    }
}
