//! Non-fatal conditions raised while deriving a company's series.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A recoverable condition attached to an output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnostic {
    /// No declared or inferable fiscal year end; December 31 assumed
    MissingFiscalCalendar,
    /// Period end outside tolerance of every quarter anchor
    AmbiguousPeriodAssignment,
    /// Reconstructed quarter negative for a magnitude-only metric
    RestatementDecrease,
    /// Fewer qualifying periods than the trailing window
    InsufficientHistory,
    /// More than one candidate fact for a canonical key
    DuplicateKeyCollision,
    /// Share splits detected in adjacent periods
    SplitAmbiguity,
    /// Company skipped after a structural error
    CompanyProcessingFailure,
}

impl Diagnostic {
    /// Snake-case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingFiscalCalendar => "missing_fiscal_calendar",
            Self::AmbiguousPeriodAssignment => "ambiguous_period_assignment",
            Self::RestatementDecrease => "restatement_decrease",
            Self::InsufficientHistory => "insufficient_history",
            Self::DuplicateKeyCollision => "duplicate_key_collision",
            Self::SplitAmbiguity => "split_ambiguity",
            Self::CompanyProcessingFailure => "company_processing_failure",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of diagnostics on one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flags(Vec<Diagnostic>);

impl Flags {
    /// Add a diagnostic if not already present.
    pub fn insert(&mut self, diagnostic: Diagnostic) {
        if let Err(pos) = self.0.binary_search(&diagnostic) {
            self.0.insert(pos, diagnostic);
        }
    }

    /// Whether the diagnostic is present.
    pub fn contains(&self, diagnostic: Diagnostic) -> bool {
        self.0.binary_search(&diagnostic).is_ok()
    }

    /// Whether no diagnostic is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Diagnostics in order.
    pub fn iter(&self) -> impl Iterator<Item = Diagnostic> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for Flags {
    /// Pipe-separated, e.g. `ambiguous_period_assignment|duplicate_key_collision`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(d.as_str())?;
        }
        Ok(())
    }
}

/// Per-kind occurrence counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticCounts(BTreeMap<Diagnostic, usize>);

impl DiagnosticCounts {
    /// Record one occurrence.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        *self.0.entry(diagnostic).or_default() += 1;
    }

    /// Record every flag on a record.
    pub fn record_flags(&mut self, flags: &Flags) {
        for d in flags.iter() {
            self.record(d);
        }
    }

    /// Occurrences of one kind.
    pub fn get(&self, diagnostic: Diagnostic) -> usize {
        self.0.get(&diagnostic).copied().unwrap_or(0)
    }

    /// Add another set of counts.
    pub fn merge(&mut self, other: &Self) {
        for (d, n) in &other.0 {
            *self.0.entry(*d).or_default() += n;
        }
    }

    /// Non-zero counts in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (Diagnostic, usize)> + '_ {
        self.0.iter().map(|(d, n)| (*d, *n))
    }

    /// Total across kinds.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }
}
