//! Loading a downloaded SEC directory from disk.
//!
//! Expected layout:
//!
//! ```text
//! <root>/company_tickers.json          optional ticker to CIK map
//! <root>/submissions/CIK##########.json
//! <root>/companyfacts/CIK##########.json
//! ```
//!
//! Unreadable or malformed per-company documents are logged and skipped so
//! one bad download does not stop the run.

use crate::error::{PitfundError, Result};
use pitfund_data::edgar::{
    CompanyFactsDocument, NormalizeReport, SubmissionsDocument, normalize, parse_company_tickers,
};
use pitfund_data::{CompanyRegistry, MetricCatalog, RawFact};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const TICKERS_FILE: &str = "company_tickers.json";
const SUBMISSIONS_DIR: &str = "submissions";
const COMPANYFACTS_DIR: &str = "companyfacts";

/// A per-company document that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    /// File that failed
    pub path: PathBuf,
    /// Why it was skipped
    pub error: String,
}

/// Registry and raw facts read from a SEC directory.
#[derive(Debug, Clone, Default)]
pub struct LoadedUniverse {
    /// Companies with declared or inferred fiscal year ends
    pub registry: CompanyRegistry,
    /// Raw facts for the catalog's tags
    pub facts: Vec<RawFact>,
    /// Items kept and dropped while normalizing
    pub report: NormalizeReport,
    /// Companyfacts documents read
    pub documents: usize,
    /// Companies whose fiscal year end was inferred from their facts
    pub inferred_calendars: usize,
    /// Documents that could not be read or parsed
    pub skipped: Vec<SkippedDocument>,
}

/// A bronze SEC directory on disk.
#[derive(Debug, Clone)]
pub struct SecDirectory {
    root: PathBuf,
}

impl SecDirectory {
    /// Directory rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read tickers, submissions and company facts, then infer missing
    /// fiscal year ends from the facts.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a directory or if
    /// `company_tickers.json` exists but cannot be parsed.
    pub fn load(&self, catalog: &MetricCatalog) -> Result<LoadedUniverse> {
        if !self.root.is_dir() {
            return Err(PitfundError::Directory {
                path: self.root.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }

        let mut universe = LoadedUniverse::default();

        let tickers = self.root.join(TICKERS_FILE);
        if tickers.is_file() {
            let json = std::fs::read_to_string(&tickers).map_err(|source| {
                PitfundError::Directory {
                    path: tickers.clone(),
                    source,
                }
            })?;
            for company in parse_company_tickers(&json)? {
                universe.registry.upsert(company);
            }
            debug!(companies = universe.registry.len(), "loaded company tickers");
        }

        for path in self.documents(SUBMISSIONS_DIR)? {
            match SubmissionsDocument::from_file(&path) {
                Ok(doc) => universe.registry.upsert(doc.to_company()),
                Err(e) => universe.skip(path, e.to_string()),
            }
        }

        for path in self.documents(COMPANYFACTS_DIR)? {
            match CompanyFactsDocument::from_file(&path) {
                Ok(doc) => {
                    let (facts, report) = normalize(&doc, catalog);
                    debug!(
                        company = %doc.company_id,
                        kept = report.kept,
                        dropped = report.dropped(),
                        "normalized company facts"
                    );
                    universe.report += report;
                    universe.documents += 1;
                    universe.facts.extend(facts);
                }
                Err(e) => universe.skip(path, e.to_string()),
            }
        }

        universe.inferred_calendars = universe.registry.infer_fiscal_year_ends(&universe.facts);

        info!(
            companies = universe.registry.len(),
            documents = universe.documents,
            facts = universe.facts.len(),
            dropped = universe.report.dropped(),
            inferred_calendars = universe.inferred_calendars,
            skipped = universe.skipped.len(),
            "loaded SEC directory"
        );
        Ok(universe)
    }

    /// `CIK*.json` files under a subdirectory, sorted by name. A missing
    /// subdirectory has no documents.
    fn documents(&self, subdir: &str) -> Result<Vec<PathBuf>> {
        let dir = self.root.join(subdir);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let io_error = |source| PitfundError::Directory {
            path: dir.clone(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            let path = entry.path();
            if is_company_document(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl LoadedUniverse {
    fn skip(&mut self, path: PathBuf, error: String) {
        warn!(path = %path.display(), error = %error, "skipping SEC document");
        self.skipped.push(SkippedDocument { path, error });
    }
}

fn is_company_document(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.starts_with("CIK") && name.ends_with(".json") && path.is_file()
}
