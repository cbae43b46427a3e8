//! Run summary for terminal and markdown reporting.

use pitfund_data::CalendarSource;
use pitfund_engine::{DerivationRun, Diagnostic, DiagnosticCounts, TtmStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row counts of each output table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    /// Raw facts received across successful companies
    pub raw_facts: usize,
    /// Canonical facts
    pub canonical_facts: usize,
    /// Raw facts dropped as comparatives
    pub excluded_comparatives: usize,
    /// Quarterly records
    pub quarterly: usize,
    /// Adjusted share rows
    pub adjusted_shares: usize,
    /// Split events
    pub split_events: usize,
}

/// Quarterly records by trailing status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtmCounts {
    /// Full window present
    pub complete: usize,
    /// Window has a missing quarter
    pub missing_component: usize,
    /// Window spans a gap
    pub non_contiguous: usize,
    /// Not enough periods visible
    pub insufficient_history: usize,
}

impl TtmCounts {
    /// Share of records with a complete window.
    pub fn complete_ratio(&self) -> f64 {
        let total = self.complete
            + self.missing_component
            + self.non_contiguous
            + self.insufficient_history;
        if total == 0 { 0.0 } else { self.complete as f64 / total as f64 }
    }
}

/// Summary of a derivation run.
///
/// Aggregates table sizes, trailing-window coverage, calendar provenance, and
/// diagnostic counts across companies, including one
/// `company_processing_failure` per failed company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Companies processed successfully
    pub companies: usize,
    /// Companies skipped after an error
    pub failures: usize,
    /// Companies with a declared fiscal year end
    pub declared_calendars: usize,
    /// Companies with an inferred fiscal year end
    pub inferred_calendars: usize,
    /// Companies defaulted to December 31
    pub defaulted_calendars: usize,
    /// Output table sizes
    pub tables: TableCounts,
    /// Trailing-window status breakdown
    pub ttm: TtmCounts,
    /// Diagnostic totals
    pub diagnostics: DiagnosticCounts,
}

impl RunSummary {
    /// Summarize a run.
    pub fn from_run(run: &DerivationRun) -> Self {
        let mut tables = TableCounts {
            quarterly: run.quarterly.len(),
            canonical_facts: run.canonical_facts.len(),
            adjusted_shares: run.adjusted_shares.len(),
            split_events: run.split_events.len(),
            ..TableCounts::default()
        };
        let (mut declared, mut inferred, mut defaulted) = (0, 0, 0);
        for company in &run.companies {
            tables.raw_facts += company.raw_facts;
            tables.excluded_comparatives += company.excluded_comparatives;
            match company.calendar_source {
                CalendarSource::Declared => declared += 1,
                CalendarSource::Inferred => inferred += 1,
                CalendarSource::Defaulted => defaulted += 1,
            }
        }

        let mut ttm = TtmCounts::default();
        for record in &run.quarterly {
            match record.ttm_status {
                TtmStatus::Complete => ttm.complete += 1,
                TtmStatus::MissingComponent => ttm.missing_component += 1,
                TtmStatus::NonContiguous => ttm.non_contiguous += 1,
                TtmStatus::InsufficientHistory => ttm.insufficient_history += 1,
            }
        }

        Self {
            companies: run.companies.len(),
            failures: run.failures.len(),
            declared_calendars: declared,
            inferred_calendars: inferred,
            defaulted_calendars: defaulted,
            tables,
            ttm,
            diagnostics: run.diagnostics(),
        }
    }

    /// Diagnostic count for one kind.
    pub fn diagnostic(&self, diagnostic: Diagnostic) -> usize {
        self.diagnostics.get(diagnostic)
    }

    /// Format as an ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nDerivation Summary\n");
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str("\nCompanies:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!("  Processed:                {}\n", self.companies));
        output.push_str(&format!("  Failed:                   {}\n", self.failures));
        output.push_str(&format!(
            "  Fiscal year end:          {} declared, {} inferred, {} defaulted\n",
            self.declared_calendars, self.inferred_calendars, self.defaulted_calendars
        ));

        output.push_str("\nTables:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!("  Raw facts:                {}\n", self.tables.raw_facts));
        output.push_str(&format!(
            "  Excluded comparatives:    {}\n",
            self.tables.excluded_comparatives
        ));
        output.push_str(&format!(
            "  Canonical facts:          {}\n",
            self.tables.canonical_facts
        ));
        output.push_str(&format!("  Quarterly records:        {}\n", self.tables.quarterly));
        output.push_str(&format!(
            "  Adjusted shares:          {}\n",
            self.tables.adjusted_shares
        ));
        output.push_str(&format!("  Split events:             {}\n", self.tables.split_events));

        output.push_str("\nTrailing Twelve Months:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "  Complete:                 {} ({:.1}%)\n",
            self.ttm.complete,
            self.ttm.complete_ratio() * 100.0
        ));
        output.push_str(&format!(
            "  Missing component:        {}\n",
            self.ttm.missing_component
        ));
        output.push_str(&format!("  Non-contiguous:           {}\n", self.ttm.non_contiguous));
        output.push_str(&format!(
            "  Insufficient history:     {}\n",
            self.ttm.insufficient_history
        ));

        if self.diagnostics.total() > 0 {
            output.push_str("\nDiagnostics:\n");
            output.push_str(&"-".repeat(80));
            output.push('\n');
            for (diagnostic, count) in self.diagnostics.iter() {
                output.push_str(&format!("  {:<34}{}\n", diagnostic.as_str(), count));
            }
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');

        output
    }

    /// Format as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Derivation Summary\n\n");
        output.push_str(&format!(
            "**Companies:** {} processed, {} failed\n\n",
            self.companies, self.failures
        ));

        output.push_str("## Fiscal Calendars\n\n");
        output.push_str(&format!("- **Declared:** {}\n", self.declared_calendars));
        output.push_str(&format!("- **Inferred:** {}\n", self.inferred_calendars));
        output.push_str(&format!("- **Defaulted:** {}\n\n", self.defaulted_calendars));

        output.push_str("## Tables\n\n");
        output.push_str("| Table | Rows |\n");
        output.push_str("|-------|------|\n");
        for (name, rows) in [
            ("raw_facts", self.tables.raw_facts),
            ("excluded_comparatives", self.tables.excluded_comparatives),
            ("canonical_facts", self.tables.canonical_facts),
            ("quarterly_metrics", self.tables.quarterly),
            ("adjusted_shares", self.tables.adjusted_shares),
            ("split_events", self.tables.split_events),
        ] {
            output.push_str(&format!("| {} | {} |\n", name, rows));
        }
        output.push('\n');

        output.push_str("## Trailing Twelve Months\n\n");
        output.push_str("| Status | Records |\n");
        output.push_str("|--------|---------|\n");
        output.push_str(&format!("| complete | {} |\n", self.ttm.complete));
        output.push_str(&format!("| missing_component | {} |\n", self.ttm.missing_component));
        output.push_str(&format!("| non_contiguous | {} |\n", self.ttm.non_contiguous));
        output.push_str(&format!(
            "| insufficient_history | {} |\n",
            self.ttm.insufficient_history
        ));

        if self.diagnostics.total() > 0 {
            output.push_str("\n## Diagnostics\n\n");
            output.push_str("| Diagnostic | Count |\n");
            output.push_str("|------------|-------|\n");
            for (diagnostic, count) in self.diagnostics.iter() {
                output.push_str(&format!("| {} | {} |\n", diagnostic, count));
            }
        }

        output
    }
}

impl From<&DerivationRun> for RunSummary {
    fn from(run: &DerivationRun) -> Self {
        Self::from_run(run)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} companies ({} failed): {} quarterly records, {} split events, {} diagnostics",
            self.companies,
            self.failures,
            self.tables.quarterly,
            self.tables.split_events,
            self.diagnostics.total()
        )
    }
}
