//! Fact normalization from SEC `companyfacts` documents.
//!
//! The SEC publishes every XBRL fact a company has filed at
//! `https://data.sec.gov/api/xbrl/companyfacts/CIK{cik_padded}.json`. The
//! document nests facts by taxonomy, tag and unit. [`normalize`] flattens the
//! tags listed in a [`MetricCatalog`] into [`RawFact`] rows, dropping items
//! that cannot be placed in time.
//!
//! # Example
//!
//! ```
//! use pitfund_data::catalog::MetricCatalog;
//! use pitfund_data::edgar::companyfacts::{CompanyFactsDocument, normalize};
//!
//! let json = r#"{
//!     "cik": 320193,
//!     "entityName": "Apple Inc.",
//!     "facts": {"us-gaap": {"NetCashProvidedByUsedInOperatingActivities": {
//!         "units": {"USD": [
//!             {"end": "2019-12-28", "val": 30516000000, "fy": 2020, "fp": "Q1",
//!              "form": "10-Q", "filed": "2020-01-29"}
//!         ]}
//!     }}}
//! }"#;
//!
//! let doc = CompanyFactsDocument::parse_json(json).unwrap();
//! let (facts, report) = normalize(&doc, &MetricCatalog::default());
//! assert_eq!(facts.len(), 1);
//! assert_eq!(report.kept, 1);
//! ```

use crate::catalog::{Metric, MetricCatalog};
use crate::company::CompanyId;
use crate::error::{DataError, Result};
use crate::fact::{DeclaredPeriod, RawFact};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A parsed `companyfacts` document.
#[derive(Debug, Clone)]
pub struct CompanyFactsDocument {
    /// Padded CIK of the filer
    pub company_id: CompanyId,

    /// Registrant name
    pub entity_name: Option<String>,

    facts: HashMap<String, HashMap<String, ConceptData>>,
}

/// Counts of items kept and dropped while normalizing one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    /// Items emitted as raw facts
    pub kept: usize,
    /// Items lacking filed date, fiscal year, fiscal period or form
    pub missing_fields: usize,
    /// Items whose dates did not parse
    pub bad_dates: usize,
    /// Items with a fiscal year of zero or less, or an unrecognized fiscal period
    pub bad_period: usize,
    /// Items with a non-finite value
    pub bad_value: usize,
    /// Items filed before the end of the period they describe
    pub filed_before_period_end: usize,
}

impl NormalizeReport {
    /// Total items dropped.
    pub const fn dropped(&self) -> usize {
        self.missing_fields
            + self.bad_dates
            + self.bad_period
            + self.bad_value
            + self.filed_before_period_end
    }
}

impl std::ops::AddAssign for NormalizeReport {
    fn add_assign(&mut self, rhs: Self) {
        self.kept += rhs.kept;
        self.missing_fields += rhs.missing_fields;
        self.bad_dates += rhs.bad_dates;
        self.bad_period += rhs.bad_period;
        self.bad_value += rhs.bad_value;
        self.filed_before_period_end += rhs.filed_before_period_end;
    }
}

impl CompanyFactsDocument {
    /// Parse a `companyfacts` JSON document.
    pub fn parse_json(json: &str) -> Result<Self> {
        let response: SecCompanyFacts = serde_json::from_str(json)
            .map_err(|e| DataError::Parse(format!("Failed to parse companyfacts JSON: {}", e)))?;

        Ok(Self {
            company_id: response.cik.into_company_id()?,
            entity_name: response.entity_name,
            facts: response.facts,
        })
    }

    /// Read and parse a `companyfacts` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse_json(&std::fs::read_to_string(path)?)
    }

    /// Number of tags present under a taxonomy.
    pub fn tag_count(&self, namespace: &str) -> usize {
        self.facts.get(namespace).map_or(0, HashMap::len)
    }
}

/// Flatten the catalog's tags in `doc` into raw facts.
///
/// Facts are emitted in catalog order (metric, then tag priority), then in
/// document order. Dropped items are counted in the returned report.
pub fn normalize(
    doc: &CompanyFactsDocument,
    catalog: &MetricCatalog,
) -> (Vec<RawFact>, NormalizeReport) {
    let mut facts = Vec::new();
    let mut report = NormalizeReport::default();

    for spec in catalog.specs() {
        let Some(taxonomy) = doc.facts.get(&spec.namespace) else {
            continue;
        };
        for tag in &spec.tags {
            let Some(items) = taxonomy.get(tag).and_then(|c| c.units.get(&spec.unit)) else {
                continue;
            };
            for item in items {
                match item.to_raw_fact(doc, spec.metric, tag, &spec.namespace, &spec.unit) {
                    Ok(fact) => {
                        report.kept += 1;
                        facts.push(fact);
                    }
                    Err(reason) => reason.count(&mut report),
                }
            }
        }
    }

    (facts, report)
}

#[derive(Debug, Clone, Copy)]
enum DropReason {
    MissingFields,
    BadDate,
    BadPeriod,
    BadValue,
    FiledBeforePeriodEnd,
}

impl DropReason {
    const fn count(self, report: &mut NormalizeReport) {
        match self {
            Self::MissingFields => report.missing_fields += 1,
            Self::BadDate => report.bad_dates += 1,
            Self::BadPeriod => report.bad_period += 1,
            Self::BadValue => report.bad_value += 1,
            Self::FiledBeforePeriodEnd => report.filed_before_period_end += 1,
        }
    }
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, DropReason> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| DropReason::BadDate)
}

// SEC API JSON structure
// Based on: https://www.sec.gov/edgar/sec-api-documentation

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecCompanyFacts {
    cik: CikField,
    #[serde(default)]
    entity_name: Option<String>,
    #[serde(default)]
    facts: HashMap<String, HashMap<String, ConceptData>>,
}

/// The SEC serves `cik` as a number; hand-built files often quote it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CikField {
    Number(u64),
    Text(String),
}

impl CikField {
    fn into_company_id(self) -> Result<CompanyId> {
        match self {
            Self::Number(n) => Ok(CompanyId::from_cik(n)),
            Self::Text(s) => CompanyId::parse(&s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ConceptData {
    #[serde(default)]
    units: HashMap<String, Vec<FactData>>,
}

#[derive(Debug, Clone, Deserialize)]
struct FactData {
    #[serde(default)]
    end: Option<String>,
    val: f64,
    #[serde(default)]
    fy: Option<i32>,
    #[serde(default)]
    fp: Option<String>,
    #[serde(default)]
    form: Option<String>,
    #[serde(default)]
    filed: Option<String>,
}

impl FactData {
    fn to_raw_fact(
        &self,
        doc: &CompanyFactsDocument,
        metric: Metric,
        tag: &str,
        namespace: &str,
        unit: &str,
    ) -> std::result::Result<RawFact, DropReason> {
        let (Some(end), Some(filed), Some(fy), Some(fp), Some(form)) =
            (&self.end, &self.filed, self.fy, &self.fp, &self.form)
        else {
            return Err(DropReason::MissingFields);
        };
        if fp.trim().is_empty() || form.trim().is_empty() {
            return Err(DropReason::MissingFields);
        }

        let period_end = parse_date(end)?;
        let filed_date = parse_date(filed)?;
        if fy <= 0 {
            return Err(DropReason::BadPeriod);
        }
        let declared_period: DeclaredPeriod = fp.parse().map_err(|_| DropReason::BadPeriod)?;
        if !self.val.is_finite() {
            return Err(DropReason::BadValue);
        }
        if filed_date < period_end {
            return Err(DropReason::FiledBeforePeriodEnd);
        }

        Ok(RawFact {
            company_id: doc.company_id.clone(),
            metric,
            tag: tag.to_string(),
            namespace: namespace.to_string(),
            unit: unit.to_string(),
            period_end,
            filed_date,
            declared_period,
            declared_fiscal_year: fy,
            form_type: form.clone(),
            value: self.val,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "cik": 320193,
        "entityName": "Apple Inc.",
        "facts": {
            "dei": {
                "EntityCommonStockSharesOutstanding": {
                    "units": {"shares": [{"end": "2020-01-17", "val": 4375480000, "fy": 2020, "fp": "Q1", "form": "10-Q", "filed": "2020-01-29"}]}
                }
            },
            "us-gaap": {
                "PaymentsToAcquirePropertyPlantAndEquipment": {
                    "label": "Payments to Acquire PP&E",
                    "units": {"USD": [
                        {"start": "2019-09-29", "end": "2019-12-28", "val": 2107000000, "accn": "0000320193-20-000010", "fy": 2020, "fp": "Q1", "form": "10-Q", "filed": "2020-01-29", "frame": "CY2019Q4"},
                        {"end": "2019-12-28", "val": 1.0, "fy": 0, "fp": "Q1", "form": "10-Q", "filed": "2020-01-29"},
                        {"end": "2019-12-28", "val": 1.0, "fy": 2020, "fp": "", "form": "10-Q", "filed": "2020-01-29"},
                        {"end": "2019-12-28", "val": 1.0, "fy": 2020, "fp": "Q1", "form": "10-Q"},
                        {"end": "2019-13-45", "val": 1.0, "fy": 2020, "fp": "Q1", "form": "10-Q", "filed": "2020-01-29"},
                        {"end": "2020-03-28", "val": 1.0, "fy": 2020, "fp": "Q2", "form": "10-Q", "filed": "2020-01-29"},
                        {"end": "2019-12-28", "val": 1.0, "fy": 2020, "fp": "H1", "form": "10-Q", "filed": "2020-01-29"}
                    ]}
                },
                "CapitalExpenditures": {
                    "units": {"EUR": [{"end": "2019-12-28", "val": 5.0, "fy": 2020, "fp": "Q1", "form": "10-Q", "filed": "2020-01-29"}]}
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_numeric_cik() {
        let doc = CompanyFactsDocument::parse_json(SAMPLE).unwrap();
        assert_eq!(doc.company_id.as_str(), "0000320193");
        assert_eq!(doc.entity_name.as_deref(), Some("Apple Inc."));
        assert_eq!(doc.tag_count("us-gaap"), 2);
        assert_eq!(doc.tag_count("ifrs-full"), 0);
    }

    #[test]
    fn test_normalize_filters_and_counts() {
        let doc = CompanyFactsDocument::parse_json(SAMPLE).unwrap();
        let (facts, report) = normalize(&doc, &MetricCatalog::default());

        assert_eq!(facts.len(), 1);
        let fact = &facts[0];
        assert_eq!(fact.metric, Metric::Capex);
        assert_eq!(fact.tag, "PaymentsToAcquirePropertyPlantAndEquipment");
        assert_eq!(fact.declared_period, DeclaredPeriod::Q1);
        assert_eq!(fact.declared_fiscal_year, 2020);
        assert_eq!(fact.value, 2_107_000_000.0);

        assert_eq!(report.kept, 1);
        assert_eq!(report.bad_period, 2); // fy = 0 and fp = H1
        assert_eq!(report.missing_fields, 2); // empty fp and no filed date
        assert_eq!(report.bad_dates, 1);
        assert_eq!(report.filed_before_period_end, 1);
        assert_eq!(report.dropped(), 6);
    }

    #[test]
    fn test_unit_mismatch_is_ignored() {
        // CapitalExpenditures is only reported in EUR, which the catalog does not collect
        let doc = CompanyFactsDocument::parse_json(SAMPLE).unwrap();
        let (facts, _) = normalize(&doc, &MetricCatalog::default());
        assert!(facts.iter().all(|f| f.tag != "CapitalExpenditures"));
    }

    #[test]
    fn test_parse_quoted_cik() {
        let doc = CompanyFactsDocument::parse_json(r#"{"cik": "789019", "facts": {}}"#).unwrap();
        assert_eq!(doc.company_id.as_str(), "0000789019");
        assert!(doc.entity_name.is_none());
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(
            CompanyFactsDocument::parse_json("{not json"),
            Err(DataError::Parse(_))
        ));
    }
}
