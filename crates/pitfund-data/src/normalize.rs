//! Value normalization applied before derivation.

use crate::catalog::MetricSpec;
use serde::{Deserialize, Serialize};

/// Normalizes reported values according to their metric specification.
///
/// Magnitude-only metrics lose their sign. Metrics flagged for scale
/// normalization are assumed to be reported in millions when their absolute
/// value falls below `scale_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueNormalizer {
    /// Absolute values below this are rescaled (default: 1,000,000)
    pub scale_threshold: f64,

    /// Multiplier applied to rescaled values (default: 1,000,000)
    pub scale_factor: f64,
}

impl Default for ValueNormalizer {
    fn default() -> Self {
        Self {
            scale_threshold: 1_000_000.0,
            scale_factor: 1_000_000.0,
        }
    }
}

impl ValueNormalizer {
    /// Normalize one value.
    pub fn apply(&self, spec: &MetricSpec, value: f64) -> f64 {
        let value = if spec.magnitude_only { value.abs() } else { value };
        if spec.normalize_scale && value.abs() < self.scale_threshold {
            value * self.scale_factor
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Metric, MetricCatalog};
    use rstest::rstest;

    #[rstest]
    #[case(Metric::Capex, -250.0, 250.0)]
    #[case(Metric::Cfo, -250.0, -250.0)]
    #[case(Metric::Shares, 15_943.4, 15_943_400_000.0)]
    #[case(Metric::Shares, 15_943_400_000.0, 15_943_400_000.0)]
    fn test_apply(#[case] metric: Metric, #[case] raw: f64, #[case] expected: f64) {
        let catalog = MetricCatalog::default();
        let spec = catalog.spec(metric).unwrap();
        let normalized = ValueNormalizer::default().apply(spec, raw);
        assert!((normalized - expected).abs() < 1e-3);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let catalog = MetricCatalog::default();
        let spec = catalog.spec(Metric::Shares).unwrap();
        assert_eq!(ValueNormalizer::default().apply(spec, 1_000_000.0), 1_000_000.0);
    }
}
