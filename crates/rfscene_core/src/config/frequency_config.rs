//! Frequency allocation options

use super::{check_fraction, check_non_negative};
use crate::error::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum AllocationStrategy {
    #[default]
    ReceiverCentric,
    Optimized,
    Random,
}

/// Which receivers a transmitter is planned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum ReceiverAssociation {
    /// Every receiver observes every transmitter; one plan over the common window.
    #[default]
    AllReceivers,
    /// Each transmitter is served by its nearest receiver only.
    Nearest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct FrequencyAllocationConfig {
    /// (default: ReceiverCentric)
    pub strategy: AllocationStrategy,
    /// Minimum gap between adjacent band edges, Hz (default: 0)
    pub min_separation: f64,
    /// Tolerated overlap as a fraction of the narrower bandwidth (default: 0)
    pub max_overlap: f64,
    /// Spectrum reserved at each edge of a receiver window, Hz (default: 0)
    pub guard_bands: f64,
    /// Random strategy re-draws before accepting a violating draw (default: 100)
    pub max_retries: u32,
    /// Optimized strategy: number of multi-start trials (default: 32)
    pub optimizer_trials: u32,
    /// Optimized strategy: hill-climbing moves per trial (default: 64)
    pub optimizer_moves: u32,
    /// (default: AllReceivers)
    pub association: ReceiverAssociation,
}

impl Default for FrequencyAllocationConfig {
    fn default() -> Self {
        Self {
            strategy: AllocationStrategy::ReceiverCentric,
            min_separation: 0.0,
            max_overlap: 0.0,
            guard_bands: 0.0,
            max_retries: 100,
            optimizer_trials: 32,
            optimizer_moves: 64,
            association: ReceiverAssociation::AllReceivers,
        }
    }
}

impl FrequencyAllocationConfig {
    pub fn validate(&self) -> Result<()> {
        check_non_negative("FrequencyAllocation.MinSeparation", self.min_separation)?;
        check_fraction("FrequencyAllocation.MaxOverlap", self.max_overlap)?;
        check_non_negative("FrequencyAllocation.GuardBands", self.guard_bands)?;
        if self.max_retries == 0 {
            return Err(crate::error::ScenarioError::config(
                "FrequencyAllocation.MaxRetries",
                "must be at least 1",
            ));
        }
        if self.optimizer_trials == 0 {
            return Err(crate::error::ScenarioError::config(
                "FrequencyAllocation.OptimizerTrials",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
