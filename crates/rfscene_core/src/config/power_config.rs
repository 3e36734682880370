//! Power control options

use super::{check_positive, check_range};
use crate::error::{Result, ScenarioError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum PowerStrategy {
    #[default]
    FixedPower,
    LinkBudget,
    Adaptive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct PowerControlConfig {
    /// (default: FixedPower)
    pub strategy: PowerStrategy,
    /// dBm (default: 20)
    pub default_power: f64,
    /// dBm (default: [0, 30])
    pub power_range: [f64; 2],
    /// dBm (default: 30)
    pub max_power: f64,
    /// Margin above receiver sensitivity targeted by LinkBudget, dB (default: 10)
    pub target_margin_db: f64,
    /// RF frequency the baseband plan is referenced to for path loss, Hz (default: 2.4e9)
    pub reference_frequency: f64,
}

impl Default for PowerControlConfig {
    fn default() -> Self {
        Self {
            strategy: PowerStrategy::FixedPower,
            default_power: 20.0,
            power_range: [0.0, 30.0],
            max_power: 30.0,
            target_margin_db: 10.0,
            reference_frequency: 2.4e9,
        }
    }
}

impl PowerControlConfig {
    pub fn validate(&self) -> Result<()> {
        check_range("PowerControl.PowerRange", self.power_range)?;
        check_positive("PowerControl.ReferenceFrequency", self.reference_frequency)?;
        if !self.max_power.is_finite() || self.max_power < self.power_range[0] {
            return Err(ScenarioError::config(
                "PowerControl.MaxPower",
                format!("{} is below PowerRange minimum {}", self.max_power, self.power_range[0]),
            ));
        }
        if !self.default_power.is_finite() || self.default_power > self.max_power {
            return Err(ScenarioError::config(
                "PowerControl.DefaultPower",
                format!("{} exceeds MaxPower {}", self.default_power, self.max_power),
            ));
        }
        if !self.target_margin_db.is_finite() {
            return Err(ScenarioError::config("PowerControl.TargetMarginDb", "must be finite"));
        }
        Ok(())
    }

    /// Upper clamp for every strategy except FixedPower.
    pub fn ceiling(&self) -> f64 {
        self.power_range[1].min(self.max_power)
    }
}
