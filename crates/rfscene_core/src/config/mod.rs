//! # Scenario Configuration
//!
//! Every recognized option, grouped the way the external configuration
//! surface groups them. Optional fields resolve to their defaults once, at
//! deserialization time; `validate` is the only place ranges are checked.
//!
//! ```rust
//! use rfscene_core::config::ScenarioConfig;
//!
//! let config = ScenarioConfig::default();
//! let dense = ScenarioConfig::dense_spectrum();
//! assert!(config.validate().is_ok() && dense.validate().is_ok());
//! ```

mod factory_config;
mod frequency_config;
mod interference_config;
mod modulation_config;
mod pattern_config;
mod power_config;

pub use factory_config::{
    FactoryConfig, ModulationFamilySpec, ReceiverTypeSpec, TransmitterTypeSpec,
    DEFAULT_DEVICE_TYPE,
};
pub use frequency_config::{AllocationStrategy, FrequencyAllocationConfig, ReceiverAssociation};
pub use interference_config::{InterferenceCoordination, InterferenceManagementConfig};
pub use modulation_config::{ModulationSelectionConfig, ModulationStrategy, QualityThresholds};
pub use pattern_config::{
    BurstConfig, PatternType, ScheduledConfig, SlotCoordination, TransmissionPatternConfig,
};
pub use power_config::{PowerControlConfig, PowerStrategy};

use crate::error::{Result, ScenarioError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct HistoryConfig {
    /// Keep at most this many frames, evicting the oldest (default: unbounded)
    pub capacity: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct ScenarioConfig {
    /// PRNG seed for the whole scenario (default: 0)
    pub seed: u64,
    /// Frames run by the JSON API and CLI drivers (default: 10)
    pub num_frames_per_scenario: u32,
    pub frequency_allocation: FrequencyAllocationConfig,
    pub modulation_selection: ModulationSelectionConfig,
    pub transmission_pattern: TransmissionPatternConfig,
    pub power_control: PowerControlConfig,
    pub interference_management: InterferenceManagementConfig,
    pub history: HistoryConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_frames_per_scenario: 10,
            frequency_allocation: FrequencyAllocationConfig::default(),
            modulation_selection: ModulationSelectionConfig::default(),
            transmission_pattern: TransmissionPatternConfig::default(),
            power_control: PowerControlConfig::default(),
            interference_management: InterferenceManagementConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Crowded band: optimized placement, guard band, 20% overlap tolerated.
    pub fn dense_spectrum() -> Self {
        let mut cfg = Self::default();
        cfg.frequency_allocation.strategy = AllocationStrategy::Optimized;
        cfg.frequency_allocation.min_separation = 25e3;
        cfg.frequency_allocation.max_overlap = 0.2;
        cfg.modulation_selection.strategy = ModulationStrategy::Adaptive;
        cfg.power_control.strategy = PowerStrategy::LinkBudget;
        cfg
    }

    /// Every transmitter on for every frame, fixed power.
    pub fn always_on() -> Self {
        let mut cfg = Self::default();
        cfg.transmission_pattern.default_type = Some(PatternType::Continuous);
        cfg
    }

    /// Scheduled slot coordination in effect after interference settings.
    pub fn slot_coordination(&self) -> SlotCoordination {
        match self.interference_management.coordination_strategy {
            InterferenceCoordination::None => SlotCoordination::Random,
            InterferenceCoordination::Tdma => {
                self.transmission_pattern.scheduled.coordination_strategy
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.frequency_allocation.validate()?;
        self.modulation_selection.validate()?;
        self.transmission_pattern.validate()?;
        self.power_control.validate()?;
        if !self.interference_management.interference_threshold.is_finite() {
            return Err(ScenarioError::config(
                "InterferenceManagement.InterferenceThreshold",
                "must be finite",
            ));
        }
        if self.history.capacity == Some(0) {
            return Err(ScenarioError::config("History.Capacity", "must be at least 1"));
        }
        Ok(())
    }

    /// Cross-checks options that name factory entries.
    pub fn validate_against(&self, factory: &FactoryConfig) -> Result<()> {
        self.validate()?;
        factory.validate()?;
        let selection = &self.modulation_selection;
        if let Some(scheme) = &selection.fixed_scheme {
            if !factory.declares(scheme) {
                return Err(ScenarioError::config(
                    "ModulationSelection.FixedScheme",
                    format!("{scheme} is not declared by the factory"),
                ));
            }
        }
        if !selection.preferred_schemes.is_empty()
            && !selection.preferred_schemes.iter().any(|scheme| factory.declares(scheme))
        {
            return Err(ScenarioError::config(
                "ModulationSelection.PreferredSchemes",
                "none of the preferred schemes is declared by the factory",
            ));
        }
        Ok(())
    }
}

pub(crate) fn check_range(field: &str, range: [f64; 2]) -> Result<()> {
    if !range[0].is_finite() || !range[1].is_finite() {
        return Err(ScenarioError::config(field, "bounds must be finite"));
    }
    if range[0] > range[1] {
        return Err(ScenarioError::config(
            field,
            format!("lower bound {} exceeds upper bound {}", range[0], range[1]),
        ));
    }
    Ok(())
}

pub(crate) fn check_positive(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ScenarioError::config(field, format!("must be positive, got {value}")));
    }
    Ok(())
}

pub(crate) fn check_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ScenarioError::config(field, format!("must be non-negative, got {value}")));
    }
    Ok(())
}

pub(crate) fn check_fraction(field: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ScenarioError::config(field, format!("must lie within [0, 1], got {value}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModulationFamily, SchemeId};

    #[test]
    fn test_default_config() {
        let cfg = ScenarioConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.frequency_allocation.strategy, AllocationStrategy::ReceiverCentric);
        assert_eq!(cfg.power_control.strategy, PowerStrategy::FixedPower);
        assert!(cfg.interference_management.enable_collision_avoidance);
        assert_eq!(cfg.slot_coordination(), SlotCoordination::Tdma);
    }

    #[test]
    fn test_presets_differ_from_default() {
        let default = ScenarioConfig::default();
        let dense = ScenarioConfig::dense_spectrum();
        assert!(dense.frequency_allocation.max_overlap > default.frequency_allocation.max_overlap);
        assert_eq!(dense.frequency_allocation.strategy, AllocationStrategy::Optimized);
        assert_eq!(
            ScenarioConfig::always_on().transmission_pattern.default_type,
            Some(PatternType::Continuous)
        );
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{
            "Seed": 7,
            "FrequencyAllocation": { "Strategy": "Random", "MinSeparation": 1e5 },
            "TransmissionPattern": { "Scheduled": { "CoordinationStrategy": "TDMA" } }
        }"#;
        let cfg: ScenarioConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.frequency_allocation.strategy, AllocationStrategy::Random);
        assert_eq!(cfg.frequency_allocation.max_retries, 100);
        assert_eq!(cfg.power_control, PowerControlConfig::default());
    }

    #[test]
    fn test_invalid_max_overlap_is_configuration_error() {
        let mut cfg = ScenarioConfig::default();
        cfg.frequency_allocation.max_overlap = 1.5;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("FrequencyAllocation.MaxOverlap"));
    }

    #[test]
    fn test_fixed_scheme_must_be_declared() {
        let mut cfg = ScenarioConfig::default();
        cfg.modulation_selection.strategy = ModulationStrategy::Fixed;
        assert!(cfg.validate().is_err());

        cfg.modulation_selection.fixed_scheme = Some(SchemeId::new(ModulationFamily::Qam, 32));
        assert!(cfg.validate().is_ok());
        assert!(cfg.validate_against(&FactoryConfig::default()).is_err());

        cfg.modulation_selection.fixed_scheme = Some(SchemeId::new(ModulationFamily::Qam, 64));
        assert!(cfg.validate_against(&FactoryConfig::default()).is_ok());
    }

    #[test]
    fn test_interference_none_disables_slot_coordination() {
        let mut cfg = ScenarioConfig::default();
        cfg.interference_management.coordination_strategy = InterferenceCoordination::None;
        assert_eq!(cfg.slot_coordination(), SlotCoordination::Random);
    }

    #[test]
    fn test_power_ceiling_respects_max_power() {
        let mut cfg = PowerControlConfig::default();
        cfg.max_power = 23.0;
        cfg.default_power = 20.0;
        assert_eq!(cfg.ceiling(), 23.0);
        assert!(cfg.validate().is_ok());
        cfg.default_power = 25.0;
        assert!(cfg.validate().is_err());
    }
}
