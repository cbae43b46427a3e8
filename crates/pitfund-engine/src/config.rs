//! Engine tunables.
//!
//! Every section has a `Default` matching the reference behavior and
//! deserializes with missing fields falling back to those defaults, so a
//! partial JSON document such as `{"split": {"upper_ratio": 3.0}}` is valid.

use crate::error::{EngineError, Result};
use pitfund_data::ValueNormalizer;
use serde::{Deserialize, Serialize};

/// Fiscal period assignment settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiscalConfig {
    /// Days a period end may sit from a quarter anchor and still match it (default: 7)
    pub tolerance_days: u32,
}

impl Default for FiscalConfig {
    fn default() -> Self {
        Self { tolerance_days: 7 }
    }
}

/// Share split detection thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Period-over-period ratio above which a forward split is assumed (default: 2.0)
    pub upper_ratio: f64,

    /// Period-over-period ratio below which a reverse split is assumed (default: 0.5)
    pub lower_ratio: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            upper_ratio: 2.0,
            lower_ratio: 0.5,
        }
    }
}

/// Trailing aggregation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtmConfig {
    /// Number of quarters summed (default: 4)
    pub window: usize,

    /// Require the summed quarters to be consecutive (default: false)
    pub require_contiguous: bool,
}

impl Default for TtmConfig {
    fn default() -> Self {
        Self {
            window: 4,
            require_contiguous: false,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fiscal period assignment
    pub fiscal: FiscalConfig,
    /// Split detection
    pub split: SplitConfig,
    /// Trailing aggregation
    pub ttm: TtmConfig,
    /// Value normalization
    pub normalizer: ValueNormalizer,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every tunable is in range.
    pub fn validate(&self) -> Result<()> {
        // Half the spacing between quarter anchors
        if self.fiscal.tolerance_days > 45 {
            return Err(EngineError::InvalidConfig(format!(
                "fiscal.tolerance_days must be at most 45, got {}",
                self.fiscal.tolerance_days
            )));
        }
        let SplitConfig {
            upper_ratio,
            lower_ratio,
        } = self.split;
        if !(lower_ratio > 0.0 && lower_ratio < 1.0 && upper_ratio > 1.0 && upper_ratio.is_finite())
        {
            return Err(EngineError::InvalidConfig(format!(
                "split ratios need 0 < lower < 1 < upper, got {lower_ratio} and {upper_ratio}"
            )));
        }
        if self.ttm.window == 0 {
            return Err(EngineError::InvalidConfig(
                "ttm.window must be at least 1".to_string(),
            ));
        }
        if !(self.normalizer.scale_threshold >= 0.0 && self.normalizer.scale_factor > 0.0) {
            return Err(EngineError::InvalidConfig(
                "normalizer threshold must be non-negative and factor positive".to_string(),
            ));
        }
        Ok(())
    }
}
