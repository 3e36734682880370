//! Transmission pattern options

use super::{check_positive, check_range};
use crate::error::{Result, ScenarioError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum PatternType {
    Continuous,
    Burst,
    Scheduled,
}

impl PatternType {
    /// Order of the entries in `TypeDistribution`.
    pub const ALL: [PatternType; 3] =
        [PatternType::Continuous, PatternType::Burst, PatternType::Scheduled];
}

/// How Scheduled transmitters pick their slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum SlotCoordination {
    /// Round-robin inside each shared plan; slots never collide.
    #[default]
    #[serde(rename = "TDMA")]
    Tdma,
    /// Uncoordinated uniform slot draw.
    Random,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct BurstConfig {
    /// Seconds (default: [0.001, 0.005])
    pub duration_range: [f64; 2],
    /// Seconds (default: [0.01, 0.05])
    pub period_range: [f64; 2],
    /// Fraction of the period spent on (default: [0.2, 0.8])
    pub duty_cycle_range: [f64; 2],
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            duration_range: [0.001, 0.005],
            period_range: [0.01, 0.05],
            duty_cycle_range: [0.2, 0.8],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct ScheduledConfig {
    /// Seconds (default: 0.001)
    pub time_slot_duration: f64,
    /// Seconds; `FrameLength / TimeSlotDuration` slots (default: 0.004)
    pub frame_length: f64,
    /// (default: TDMA)
    pub coordination_strategy: SlotCoordination,
}

impl Default for ScheduledConfig {
    fn default() -> Self {
        Self {
            time_slot_duration: 0.001,
            frame_length: 0.004,
            coordination_strategy: SlotCoordination::Tdma,
        }
    }
}

impl ScheduledConfig {
    pub fn num_slots(&self) -> u32 {
        ((self.frame_length / self.time_slot_duration).round() as u32).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct TransmissionPatternConfig {
    /// Forces one pattern type for every transmitter when set.
    pub default_type: Option<PatternType>,
    /// Probabilities for [Continuous, Burst, Scheduled] (default: uniform)
    pub type_distribution: [f64; 3],
    /// Simulated duration of one frame, seconds (default: 0.001)
    pub frame_duration: f64,
    pub burst: BurstConfig,
    pub scheduled: ScheduledConfig,
}

impl Default for TransmissionPatternConfig {
    fn default() -> Self {
        Self {
            default_type: None,
            type_distribution: [1.0 / 3.0; 3],
            frame_duration: 0.001,
            burst: BurstConfig::default(),
            scheduled: ScheduledConfig::default(),
        }
    }
}

impl TransmissionPatternConfig {
    pub fn validate(&self) -> Result<()> {
        let dist = &self.type_distribution;
        if dist.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(ScenarioError::config(
                "TransmissionPattern.TypeDistribution",
                "probabilities must be finite and non-negative",
            ));
        }
        let total: f64 = dist.iter().sum();
        if self.default_type.is_none() && (total - 1.0).abs() > 1e-6 {
            return Err(ScenarioError::config(
                "TransmissionPattern.TypeDistribution",
                format!("probabilities sum to {total}, expected 1"),
            ));
        }
        check_positive("TransmissionPattern.FrameDuration", self.frame_duration)?;

        check_range("TransmissionPattern.Burst.DurationRange", self.burst.duration_range)?;
        check_range("TransmissionPattern.Burst.PeriodRange", self.burst.period_range)?;
        check_range("TransmissionPattern.Burst.DutyCycleRange", self.burst.duty_cycle_range)?;
        if self.burst.period_range[0] <= 0.0 {
            return Err(ScenarioError::config(
                "TransmissionPattern.Burst.PeriodRange",
                "periods must be positive",
            ));
        }
        let [duty_lo, duty_hi] = self.burst.duty_cycle_range;
        if duty_lo < 0.0 || duty_hi > 1.0 {
            return Err(ScenarioError::config(
                "TransmissionPattern.Burst.DutyCycleRange",
                "duty cycles must lie within [0, 1]",
            ));
        }

        check_positive(
            "TransmissionPattern.Scheduled.TimeSlotDuration",
            self.scheduled.time_slot_duration,
        )?;
        check_positive("TransmissionPattern.Scheduled.FrameLength", self.scheduled.frame_length)?;
        Ok(())
    }
}
