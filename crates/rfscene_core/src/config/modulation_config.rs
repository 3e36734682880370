//! Modulation selection options

use super::check_range;
use crate::error::{Result, ScenarioError};
use crate::models::SchemeId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum ModulationStrategy {
    Adaptive,
    #[default]
    Random,
    Fixed,
}

/// Link-margin thresholds steering adaptive selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct QualityThresholds {
    /// Below this margin only low-order schemes are eligible, dB (default: 6)
    pub low_margin_db: f64,
    /// At or above this margin only high-order schemes are eligible, dB (default: 15)
    pub high_margin_db: f64,
    /// Range the per-transmitter margin proxy is drawn from, dB (default: [0, 25])
    pub margin_range_db: [f64; 2],
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self { low_margin_db: 6.0, high_margin_db: 15.0, margin_range_db: [0.0, 25.0] }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModulationSelectionConfig {
    /// (default: Random)
    pub strategy: ModulationStrategy,
    /// Required when the strategy is Fixed.
    pub fixed_scheme: Option<SchemeId>,
    /// Candidate schemes; empty means every scheme the factory declares.
    pub preferred_schemes: Vec<SchemeId>,
    pub quality_thresholds: QualityThresholds,
}

impl ModulationSelectionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.strategy == ModulationStrategy::Fixed && self.fixed_scheme.is_none() {
            return Err(ScenarioError::config(
                "ModulationSelection.FixedScheme",
                "required when Strategy is Fixed",
            ));
        }
        let q = &self.quality_thresholds;
        check_range("ModulationSelection.QualityThresholds.MarginRangeDb", q.margin_range_db)?;
        if !q.low_margin_db.is_finite() || !q.high_margin_db.is_finite() {
            return Err(ScenarioError::config(
                "ModulationSelection.QualityThresholds",
                "thresholds must be finite",
            ));
        }
        if q.low_margin_db > q.high_margin_db {
            return Err(ScenarioError::config(
                "ModulationSelection.QualityThresholds",
                format!(
                    "LowMarginDb ({}) exceeds HighMarginDb ({})",
                    q.low_margin_db, q.high_margin_db
                ),
            ));
        }
        Ok(())
    }
}
