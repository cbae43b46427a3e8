//! Per-company derivation pipeline.
//!
//! Period assignment, deduplication, quarterly conversion, trailing
//! aggregation and split adjustment run strictly in sequence over one
//! company's fully materialized fact set. The pipeline holds no state between
//! companies and performs no I/O.

use crate::config::EngineConfig;
use crate::dedup::TagDeduplicator;
use crate::diagnostics::{Diagnostic, DiagnosticCounts};
use crate::error::{EngineError, Result};
use crate::fiscal::FiscalPeriodAssigner;
use crate::record::{CanonicalFact, QuarterlyMetricRecord};
use crate::splits::{AdjustedShare, SplitAdjuster, SplitEvent};
use crate::ttm::TtmAggregator;
use crate::ytd::YtdConverter;
use pitfund_data::{CompanyId, FiscalCalendar, Metric, MetricCatalog, RawFact};
use std::collections::BTreeMap;
use tracing::debug;

/// One company's input.
#[derive(Debug, Clone)]
pub struct CompanyInput {
    /// Company
    pub company_id: CompanyId,
    /// Fiscal calendar resolved from the registry
    pub calendar: FiscalCalendar,
    /// Every raw fact of the company
    pub facts: Vec<RawFact>,
}

/// Everything derived for one company.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyOutput {
    /// Company
    pub company_id: CompanyId,
    /// Calendar used for period assignment
    pub calendar: FiscalCalendar,
    /// Deduplicated facts, in key order
    pub canonical_facts: Vec<CanonicalFact>,
    /// Quarterly records, in key order
    pub quarterly: Vec<QuarterlyMetricRecord>,
    /// Originally filed share series with split adjustment
    pub adjusted_shares: Vec<AdjustedShare>,
    /// Detected splits
    pub split_events: Vec<SplitEvent>,
    /// Raw facts dropped as comparative disclosures
    pub excluded_comparatives: usize,
    /// Diagnostic counts over the quarterly records
    pub diagnostics: DiagnosticCounts,
}

/// Runs the derivation steps for one company at a time.
#[derive(Debug, Clone, Copy)]
pub struct CompanyPipeline<'a> {
    catalog: &'a MetricCatalog,
    config: &'a EngineConfig,
}

impl<'a> CompanyPipeline<'a> {
    /// Create a pipeline over a catalog and configuration.
    pub const fn new(catalog: &'a MetricCatalog, config: &'a EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Derive every output table for one company.
    ///
    /// # Errors
    ///
    /// Returns an error if a fact belongs to another company, was filed
    /// before its period ended, has a non-finite value, or uses a metric or
    /// tag missing from the catalog.
    pub fn process(&self, input: &CompanyInput) -> Result<CompanyOutput> {
        debug!(company = %input.company_id, facts = input.facts.len(), "processing company");
        self.validate(input)?;

        let assigner = FiscalPeriodAssigner::new(input.calendar, self.config.fiscal);
        let dedup = TagDeduplicator::new(self.catalog, self.config.normalizer)
            .deduplicate(&assigner, &input.facts)?;

        let mut by_metric: BTreeMap<Metric, Vec<CanonicalFact>> = BTreeMap::new();
        for fact in &dedup.facts {
            by_metric.entry(fact.metric).or_default().push(fact.clone());
        }

        let aggregator = TtmAggregator::new(self.config.ttm);
        let mut quarterly = Vec::with_capacity(dedup.facts.len());
        for (metric, facts) in &by_metric {
            let spec = self.catalog.spec(*metric).ok_or_else(|| missing_metric(input, *metric))?;
            let mut records = YtdConverter::new(spec).convert(facts);
            aggregator.aggregate(&mut records);
            quarterly.extend(records);
        }
        quarterly.sort_by(|a, b| a.key().cmp(&b.key()));

        let adjustment = SplitAdjuster::new(self.config.split).adjust(&quarterly);
        if adjustment.schedule.is_ambiguous() {
            for event in adjustment.schedule.events().iter().filter(|e| e.ambiguous) {
                for record in quarterly.iter_mut().filter(|r| {
                    r.metric == Metric::Shares
                        && r.period_end == event.split_period_end
                        && r.filed_date == event.split_filed_date
                }) {
                    record.flags.insert(Diagnostic::SplitAmbiguity);
                }
            }
        }

        let mut diagnostics = DiagnosticCounts::default();
        for record in &quarterly {
            diagnostics.record_flags(&record.flags);
        }

        debug!(
            company = %input.company_id,
            canonical = dedup.facts.len(),
            comparatives = dedup.excluded_comparatives,
            collisions = dedup.collisions,
            splits = adjustment.schedule.events().len(),
            "company done"
        );

        Ok(CompanyOutput {
            company_id: input.company_id.clone(),
            calendar: input.calendar,
            canonical_facts: dedup.facts,
            quarterly,
            adjusted_shares: adjustment.shares,
            split_events: adjustment.schedule.into_events(),
            excluded_comparatives: dedup.excluded_comparatives,
            diagnostics,
        })
    }

    fn validate(&self, input: &CompanyInput) -> Result<()> {
        for fact in &input.facts {
            let reason = if fact.company_id != input.company_id {
                Some(format!("fact belongs to {}", fact.company_id))
            } else if fact.filed_date < fact.period_end {
                Some(format!(
                    "{} {} filed {} before period end {}",
                    fact.metric, fact.tag, fact.filed_date, fact.period_end
                ))
            } else if !fact.value.is_finite() {
                Some(format!("{} {} has non-finite value", fact.metric, fact.tag))
            } else if self.catalog.spec(fact.metric).is_none() {
                return Err(missing_metric(input, fact.metric));
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(EngineError::InvalidFact {
                    company_id: input.company_id.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }
}

fn missing_metric(input: &CompanyInput, metric: Metric) -> EngineError {
    EngineError::InvalidFact {
        company_id: input.company_id.clone(),
        reason: format!("metric {metric} is not in the catalog"),
    }
}

/// Derive one company with a catalog and configuration.
pub fn process_company(
    input: &CompanyInput,
    catalog: &MetricCatalog,
    config: &EngineConfig,
) -> Result<CompanyOutput> {
    CompanyPipeline::new(catalog, config).process(input)
}
