//! Combined pipeline configuration.
//!
//! A single JSON document carries the engine tunables and the metric catalog:
//!
//! ```json
//! {
//!   "engine": {"fiscal": {"tolerance_days": 10}},
//!   "catalog": [
//!     {"metric": "CFO", "namespace": "us-gaap", "unit": "USD", "is_ytd": true,
//!      "tags": ["NetCashProvidedByUsedInOperatingActivities"]}
//!   ]
//! }
//! ```
//!
//! Either section may be omitted and falls back to its default.

use crate::error::{PitfundError, Result};
use pitfund_data::MetricCatalog;
use pitfund_engine::{BatchRunner, EngineConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine settings and metric catalog for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Engine tunables
    pub engine: EngineConfig,
    /// Metric catalog
    pub catalog: MetricCatalog,
}

impl PipelineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PitfundError::Config(e.to_string()))?;
        config.engine.validate()?;
        if config.catalog.is_empty() {
            return Err(PitfundError::Config("catalog lists no metrics".to_string()));
        }
        Ok(config)
    }

    /// Read and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| PitfundError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Pretty JSON of the effective configuration.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PitfundError::Config(e.to_string()))
    }

    /// Batch runner for this configuration.
    pub fn runner(&self) -> Result<BatchRunner> {
        Ok(BatchRunner::new(self.catalog.clone(), self.engine)?)
    }
}
