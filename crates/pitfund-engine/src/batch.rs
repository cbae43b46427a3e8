//! Parallel derivation across companies.
//!
//! Each company is one task on the rayon pool. A company whose pipeline fails
//! is recorded and skipped; it never affects other companies. Output tables
//! are concatenated and sorted by key, so the result is independent of task
//! completion order.

use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCounts};
use crate::error::{EngineError, Result};
use crate::pipeline::{CompanyInput, CompanyOutput, CompanyPipeline};
use crate::record::{CanonicalFact, QuarterlyMetricRecord};
use crate::splits::{AdjustedShare, SplitEvent};
use chrono::NaiveDate;
use pitfund_data::{
    CalendarSource, CompanyId, CompanyRegistry, Metric, MetricCatalog, MonthDay, RawFact,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// Per-company progress callback, invoked from worker threads.
pub type ProgressCallback = Box<dyn Fn(&CompanyId) + Send + Sync>;

/// Summary of one successfully processed company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyReport {
    /// Company
    pub company_id: CompanyId,
    /// Fiscal year end used
    pub fiscal_year_end: MonthDay,
    /// Provenance of the fiscal year end
    pub calendar_source: CalendarSource,
    /// Raw facts received
    pub raw_facts: usize,
    /// Canonical facts produced
    pub canonical_facts: usize,
    /// Raw facts dropped as comparatives
    pub excluded_comparatives: usize,
    /// Quarterly records produced
    pub quarterly_records: usize,
    /// Splits detected
    pub split_events: usize,
    /// Diagnostic counts
    pub diagnostics: DiagnosticCounts,
}

/// A company that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyFailure {
    /// Company
    pub company_id: CompanyId,
    /// Error message
    pub error: String,
}

/// All output tables of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivationRun {
    /// Canonical facts sorted by key
    pub canonical_facts: Vec<CanonicalFact>,
    /// Quarterly records sorted by key
    pub quarterly: Vec<QuarterlyMetricRecord>,
    /// Adjusted share series sorted by company and period end
    pub adjusted_shares: Vec<AdjustedShare>,
    /// Split events sorted by company and split period end
    pub split_events: Vec<SplitEvent>,
    /// Successful companies in id order
    pub companies: Vec<CompanyReport>,
    /// Failed companies in id order
    pub failures: Vec<CompanyFailure>,
}

impl DerivationRun {
    /// Diagnostic counts summed over companies, failures included.
    pub fn diagnostics(&self) -> DiagnosticCounts {
        let mut total = DiagnosticCounts::default();
        for company in &self.companies {
            total.merge(&company.diagnostics);
        }
        for _ in &self.failures {
            total.record(Diagnostic::CompanyProcessingFailure);
        }
        total
    }

    /// Latest version of every quarterly record filed on or before `as_of`.
    ///
    /// This is the table a consumer would have seen on that date.
    pub fn pit_view(&self, as_of: NaiveDate) -> Vec<&QuarterlyMetricRecord> {
        let mut latest: BTreeMap<(&CompanyId, Metric, i32, u8), &QuarterlyMetricRecord> =
            BTreeMap::new();
        for record in self.quarterly.iter().filter(|r| r.filed_date <= as_of) {
            // Records are key-sorted, so later inserts are later filings
            latest.insert(
                (
                    &record.company_id,
                    record.metric,
                    record.fiscal_year,
                    record.fiscal_quarter.number(),
                ),
                record,
            );
        }
        latest.into_values().collect()
    }

    fn absorb(&mut self, output: CompanyOutput, raw_facts: usize) {
        self.companies.push(CompanyReport {
            company_id: output.company_id,
            fiscal_year_end: output.calendar.fiscal_year_end,
            calendar_source: output.calendar.source,
            raw_facts,
            canonical_facts: output.canonical_facts.len(),
            excluded_comparatives: output.excluded_comparatives,
            quarterly_records: output.quarterly.len(),
            split_events: output.split_events.len(),
            diagnostics: output.diagnostics,
        });
        self.canonical_facts.extend(output.canonical_facts);
        self.quarterly.extend(output.quarterly);
        self.adjusted_shares.extend(output.adjusted_shares);
        self.split_events.extend(output.split_events);
    }

    fn sort(&mut self) {
        self.canonical_facts.sort_by(|a, b| a.key().cmp(&b.key()));
        self.quarterly.sort_by(|a, b| a.key().cmp(&b.key()));
        self.adjusted_shares
            .sort_by(|a, b| (&a.company_id, a.period_end).cmp(&(&b.company_id, b.period_end)));
        self.split_events.sort_by(|a, b| {
            (&a.company_id, a.split_period_end).cmp(&(&b.company_id, b.split_period_end))
        });
        self.companies.sort_by(|a, b| a.company_id.cmp(&b.company_id));
        self.failures.sort_by(|a, b| a.company_id.cmp(&b.company_id));
    }
}

/// Runs the company pipeline over many companies in parallel.
pub struct BatchRunner {
    catalog: MetricCatalog,
    config: EngineConfig,
    progress: Option<ProgressCallback>,
}

impl fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchRunner")
            .field("catalog", &self.catalog)
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl BatchRunner {
    /// Create a runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is out of range.
    pub fn new(catalog: MetricCatalog, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            config,
            progress: None,
        })
    }

    /// Call `callback` once per finished company.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Catalog in use.
    pub const fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    /// Configuration in use.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Split raw facts into per-company inputs, ordered by company id.
    pub fn group(&self, registry: &CompanyRegistry, facts: Vec<RawFact>) -> Vec<CompanyInput> {
        let mut by_company: BTreeMap<CompanyId, Vec<RawFact>> = BTreeMap::new();
        for fact in facts {
            by_company.entry(fact.company_id.clone()).or_default().push(fact);
        }
        by_company
            .into_iter()
            .map(|(company_id, facts)| CompanyInput {
                calendar: registry.fiscal_calendar(&company_id),
                company_id,
                facts,
            })
            .collect()
    }

    /// Derive every table for every company.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyInput`] if there are no facts at all.
    /// Per-company errors are recorded in [`DerivationRun::failures`].
    pub fn run(&self, registry: &CompanyRegistry, facts: Vec<RawFact>) -> Result<DerivationRun> {
        if facts.is_empty() {
            return Err(EngineError::EmptyInput);
        }
        let inputs = self.group(registry, facts);
        self.run_inputs(inputs)
    }

    /// Derive every table from prepared per-company inputs.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyInput`] if every input has no facts.
    pub fn run_inputs(&self, inputs: Vec<CompanyInput>) -> Result<DerivationRun> {
        if inputs.iter().all(|input| input.facts.is_empty()) {
            return Err(EngineError::EmptyInput);
        }
        let pipeline = CompanyPipeline::new(&self.catalog, &self.config);

        let results: Vec<(CompanyId, usize, Result<CompanyOutput>)> = inputs
            .into_par_iter()
            .map(|input| {
                let result = pipeline.process(&input);
                if let Some(progress) = &self.progress {
                    progress(&input.company_id);
                }
                (input.company_id, input.facts.len(), result)
            })
            .collect();

        let mut run = DerivationRun::default();
        for (company_id, raw_facts, result) in results {
            match result {
                Ok(output) => run.absorb(output, raw_facts),
                Err(e) => {
                    warn!(company = %company_id, error = %e, "company failed, skipping");
                    run.failures.push(CompanyFailure {
                        company_id,
                        error: e.to_string(),
                    });
                }
            }
        }
        run.sort();

        info!(
            companies = run.companies.len(),
            failures = run.failures.len(),
            canonical_facts = run.canonical_facts.len(),
            quarterly_records = run.quarterly.len(),
            split_events = run.split_events.len(),
            "derivation complete"
        );
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitfund_data::DeclaredPeriod;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fact(cik: u64, tag: &str, filed: NaiveDate) -> RawFact {
        RawFact {
            company_id: CompanyId::from_cik(cik),
            metric: Metric::Cfo,
            tag: tag.to_string(),
            namespace: "us-gaap".to_string(),
            unit: "USD".to_string(),
            period_end: date(2020, 3, 31),
            filed_date: filed,
            declared_period: DeclaredPeriod::Q1,
            declared_fiscal_year: 2020,
            form_type: "10-Q".to_string(),
            value: 10.0,
        }
    }

    const TAG: &str = "NetCashProvidedByUsedInOperatingActivities";

    fn runner() -> BatchRunner {
        BatchRunner::new(MetricCatalog::default(), EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_input_fails_run() {
        let err = runner().run(&CompanyRegistry::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyInput));
    }

    #[test]
    fn test_failure_is_isolated() {
        let facts = vec![
            fact(1, TAG, date(2020, 5, 1)),
            fact(2, "NotACashFlowTag", date(2020, 5, 1)),
            fact(3, TAG, date(2020, 5, 2)),
        ];
        let run = runner().run(&CompanyRegistry::new(), facts).unwrap();

        assert_eq!(run.companies.len(), 2);
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].company_id, CompanyId::from_cik(2));
        assert_eq!(run.quarterly.len(), 2);
        assert_eq!(run.diagnostics().get(Diagnostic::CompanyProcessingFailure), 1);
        // No registry entry for any company
        assert_eq!(run.diagnostics().get(Diagnostic::MissingFiscalCalendar), 2);
    }

    #[test]
    fn test_progress_called_per_company() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let runner = runner().with_progress(Box::new(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        }));
        let facts = (1..=5).map(|cik| fact(cik, TAG, date(2020, 5, 1))).collect();

        runner.run(&CompanyRegistry::new(), facts).unwrap();
        assert_eq!(seen.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_pit_view_keeps_latest_visible_version() {
        let facts = vec![fact(1, TAG, date(2020, 5, 1)), {
            let mut restated = fact(1, TAG, date(2020, 8, 1));
            restated.value = 12.0;
            restated
        }];
        let run = runner().run(&CompanyRegistry::new(), facts).unwrap();

        assert!(run.pit_view(date(2020, 4, 30)).is_empty());
        let early = run.pit_view(date(2020, 6, 1));
        assert_eq!(early.len(), 1);
        assert_eq!(early[0].q_val, Some(10.0));
        let late = run.pit_view(date(2020, 9, 1));
        assert_eq!(late[0].q_val, Some(12.0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.ttm.window = 0;
        assert!(BatchRunner::new(MetricCatalog::default(), config).is_err());
    }
}
