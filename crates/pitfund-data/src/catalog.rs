//! Metric catalog.
//!
//! The catalog maps each tracked metric to an ordered list of taxonomy tags.
//! Position in the list is the tag's priority: when several tags report the
//! same period in the same filing, the lowest index wins. The catalog is
//! validated once when it is built, and lookups of tags it does not list are
//! rejected.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Metrics tracked by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Cash flow from operations
    #[serde(rename = "CFO")]
    Cfo,
    /// Capital expenditures
    #[serde(rename = "CAPEX")]
    Capex,
    /// Diluted share count
    #[serde(rename = "SHARES")]
    Shares,
}

impl Metric {
    /// Wire name of the metric.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cfo => "CFO",
            Self::Capex => "CAPEX",
            Self::Shares => "SHARES",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CFO" => Ok(Self::Cfo),
            "CAPEX" => Ok(Self::Capex),
            "SHARES" => Ok(Self::Shares),
            other => Err(DataError::Parse(format!("Unknown metric: {other}"))),
        }
    }
}

/// How one metric is collected and interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Metric being described
    pub metric: Metric,

    /// Taxonomy namespace the tags live in
    pub namespace: String,

    /// Candidate tags, highest priority first
    pub tags: Vec<String>,

    /// Unit the values must be reported in
    pub unit: String,

    /// Whether filings report the metric cumulatively from fiscal year start
    #[serde(default)]
    pub is_ytd: bool,

    /// Whether only the magnitude is meaningful (sign is dropped)
    #[serde(default)]
    pub magnitude_only: bool,

    /// Whether small values are assumed to be reported in millions
    #[serde(default)]
    pub normalize_scale: bool,
}

impl MetricSpec {
    fn new(metric: Metric, tags: &[&str], unit: &str) -> Self {
        Self {
            metric,
            namespace: "us-gaap".to_string(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            unit: unit.to_string(),
            is_ytd: false,
            magnitude_only: false,
            normalize_scale: false,
        }
    }
}

/// Validated set of metric specifications with a precomputed priority index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MetricSpec>", into = "Vec<MetricSpec>")]
pub struct MetricCatalog {
    specs: BTreeMap<Metric, MetricSpec>,
    priorities: HashMap<Metric, HashMap<String, usize>>,
}

impl MetricCatalog {
    /// Build a catalog, rejecting duplicate metrics, empty tag lists and
    /// tags listed twice for one metric.
    pub fn new(specs: Vec<MetricSpec>) -> Result<Self> {
        let mut by_metric = BTreeMap::new();
        let mut priorities = HashMap::new();

        for spec in specs {
            if spec.tags.is_empty() {
                return Err(DataError::InvalidCatalog(format!(
                    "{} has no tags",
                    spec.metric
                )));
            }
            let mut seen = HashSet::new();
            let mut index = HashMap::with_capacity(spec.tags.len());
            for (priority, tag) in spec.tags.iter().enumerate() {
                if tag.trim().is_empty() || !seen.insert(tag.as_str()) {
                    return Err(DataError::InvalidCatalog(format!(
                        "{} lists tag '{}' more than once or empty",
                        spec.metric, tag
                    )));
                }
                index.insert(tag.clone(), priority);
            }
            if by_metric.contains_key(&spec.metric) {
                return Err(DataError::InvalidCatalog(format!(
                    "{} is specified more than once",
                    spec.metric
                )));
            }
            priorities.insert(spec.metric, index);
            by_metric.insert(spec.metric, spec);
        }

        Ok(Self {
            specs: by_metric,
            priorities,
        })
    }

    /// Load a catalog from a JSON array of metric specifications.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a catalog from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Specification for a metric, if tracked.
    pub fn spec(&self, metric: Metric) -> Option<&MetricSpec> {
        self.specs.get(&metric)
    }

    /// All specifications in metric order.
    pub fn specs(&self) -> impl Iterator<Item = &MetricSpec> {
        self.specs.values()
    }

    /// Priority index of `tag` for `metric` (0 is highest).
    pub fn priority(&self, metric: Metric, tag: &str) -> Result<usize> {
        self.priorities
            .get(&metric)
            .and_then(|index| index.get(tag))
            .copied()
            .ok_or_else(|| DataError::UnknownTag {
                metric: metric.to_string(),
                tag: tag.to_string(),
            })
    }

    /// Number of tracked metrics.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether no metric is tracked.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for MetricCatalog {
    /// CFO, CAPEX and diluted shares from the us-gaap taxonomy.
    fn default() -> Self {
        let cfo = MetricSpec {
            is_ytd: true,
            ..MetricSpec::new(
                Metric::Cfo,
                &[
                    "NetCashProvidedByUsedInOperatingActivities",
                    "NetCashProvidedByUsedInOperatingActivitiesContinuingOperations",
                ],
                "USD",
            )
        };
        let capex = MetricSpec {
            is_ytd: true,
            magnitude_only: true,
            ..MetricSpec::new(
                Metric::Capex,
                &[
                    "PaymentsToAcquirePropertyPlantAndEquipment",
                    "CapitalExpenditures",
                ],
                "USD",
            )
        };
        let shares = MetricSpec {
            normalize_scale: true,
            ..MetricSpec::new(
                Metric::Shares,
                &[
                    "WeightedAverageNumberOfDilutedSharesOutstanding",
                    "WeightedAverageNumberOfSharesOutstandingDiluted",
                    "CommonStockSharesOutstanding",
                    "WeightedAverageNumberOfSharesOutstandingBasic",
                ],
                "shares",
            )
        };

        let mut specs = BTreeMap::new();
        let mut priorities = HashMap::new();
        for spec in [cfo, capex, shares] {
            priorities.insert(
                spec.metric,
                spec.tags
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (t.clone(), i))
                    .collect(),
            );
            specs.insert(spec.metric, spec);
        }
        Self { specs, priorities }
    }
}

impl TryFrom<Vec<MetricSpec>> for MetricCatalog {
    type Error = DataError;

    fn try_from(specs: Vec<MetricSpec>) -> Result<Self> {
        Self::new(specs)
    }
}

impl From<MetricCatalog> for Vec<MetricSpec> {
    fn from(catalog: MetricCatalog) -> Self {
        catalog.specs.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_catalog_contents() {
        let catalog = MetricCatalog::default();
        assert_eq!(catalog.len(), 3);

        let cfo = catalog.spec(Metric::Cfo).unwrap();
        assert!(cfo.is_ytd);
        assert!(!cfo.magnitude_only);
        assert_eq!(cfo.unit, "USD");

        let capex = catalog.spec(Metric::Capex).unwrap();
        assert!(capex.is_ytd && capex.magnitude_only);

        let shares = catalog.spec(Metric::Shares).unwrap();
        assert!(!shares.is_ytd);
        assert!(shares.normalize_scale);
        assert_eq!(shares.unit, "shares");
    }

    #[rstest]
    #[case(Metric::Cfo, "NetCashProvidedByUsedInOperatingActivities", 0)]
    #[case(Metric::Cfo, "NetCashProvidedByUsedInOperatingActivitiesContinuingOperations", 1)]
    #[case(Metric::Capex, "CapitalExpenditures", 1)]
    #[case(Metric::Shares, "WeightedAverageNumberOfSharesOutstandingBasic", 3)]
    fn test_priority(#[case] metric: Metric, #[case] tag: &str, #[case] expected: usize) {
        assert_eq!(MetricCatalog::default().priority(metric, tag).unwrap(), expected);
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = MetricCatalog::default()
            .priority(Metric::Cfo, "CapitalExpenditures")
            .unwrap_err();
        assert!(matches!(err, DataError::UnknownTag { .. }));
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let spec = MetricSpec::new(Metric::Cfo, &["A", "B", "A"], "USD");
        assert!(matches!(
            MetricCatalog::new(vec![spec]),
            Err(DataError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_duplicate_metric_rejected() {
        let a = MetricSpec::new(Metric::Cfo, &["A"], "USD");
        let b = MetricSpec::new(Metric::Cfo, &["B"], "USD");
        assert!(MetricCatalog::new(vec![a, b]).is_err());
    }

    #[test]
    fn test_empty_tags_rejected() {
        let spec = MetricSpec::new(Metric::Shares, &[], "shares");
        assert!(MetricCatalog::new(vec![spec]).is_err());
    }

    #[test]
    fn test_json_roundtrip_matches_default() {
        let catalog = MetricCatalog::default();
        let json = serde_json::to_string(&catalog).unwrap();
        let back = MetricCatalog::from_json(&json).unwrap();
        assert_eq!(back, catalog);
    }

    #[test]
    fn test_json_validation_applies_on_load() {
        let json = r#"[
            {"metric": "CFO", "namespace": "us-gaap", "tags": ["X", "X"], "unit": "USD"}
        ]"#;
        assert!(MetricCatalog::from_json(json).is_err());
    }

    #[test]
    fn test_json_defaults_for_flags() {
        let json = r#"[
            {"metric": "CAPEX", "namespace": "us-gaap", "tags": ["CapitalExpenditures"], "unit": "USD", "is_ytd": true}
        ]"#;
        let catalog = MetricCatalog::from_json(json).unwrap();
        let spec = catalog.spec(Metric::Capex).unwrap();
        assert!(spec.is_ytd);
        assert!(!spec.magnitude_only);
        assert!(catalog.spec(Metric::Cfo).is_none());
    }
}
