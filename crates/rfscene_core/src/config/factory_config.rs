//! Factory catalog: the modulation, transmitter and receiver implementations
//! a scenario may draw from, with their parameter ranges.

use super::{check_positive, check_range};
use crate::error::{Result, ScenarioError};
use crate::models::{ModulationFamily, SchemeId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter ranges of one modulation family. Which fields matter depends on
/// the family's bandwidth model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModulationFamilySpec {
    /// Constellation orders; `[1]` for analog families.
    pub orders: Vec<u32>,
    /// Bd
    pub symbol_rate_range: [f64; 2],
    pub rolloff_range: [f64; 2],
    /// FSK tone spacing as a multiple of the symbol rate.
    pub modulation_index: f64,
    /// OFDM, Hz
    pub subcarrier_spacing: f64,
    /// OFDM used subcarriers
    pub num_subcarriers: u32,
    /// Analog message bandwidth, Hz
    pub message_bandwidth_range: [f64; 2],
    /// FM peak deviation, Hz
    pub frequency_deviation: f64,
}

impl Default for ModulationFamilySpec {
    fn default() -> Self {
        Self {
            orders: vec![2],
            symbol_rate_range: [50e3, 250e3],
            rolloff_range: [0.2, 0.5],
            modulation_index: 1.0,
            subcarrier_spacing: 15e3,
            num_subcarriers: 24,
            message_bandwidth_range: [3e3, 15e3],
            frequency_deviation: 25e3,
        }
    }
}

impl ModulationFamilySpec {
    pub fn with_orders(orders: &[u32]) -> Self {
        Self { orders: orders.to_vec(), ..Self::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct TransmitterTypeSpec {
    /// Hardware power cap applied on top of `PowerControl.MaxPower`, dBm.
    pub max_power: Option<f64>,
}

/// Ranges a receiver implementation draws its radio parameters from. Absent
/// ranges fall back to the documented defaults with a warning.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct ReceiverTypeSpec {
    /// Hz
    pub sample_rate_range: Option<[f64; 2]>,
    /// dBm
    pub sensitivity_range: Option<[f64; 2]>,
    /// dB
    pub noise_figure_range: Option<[f64; 2]>,
    pub num_antennas: Option<u32>,
}

pub const DEFAULT_DEVICE_TYPE: &str = "Default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct FactoryConfig {
    pub modulation: BTreeMap<ModulationFamily, ModulationFamilySpec>,
    pub transmitter: BTreeMap<String, TransmitterTypeSpec>,
    pub receiver: BTreeMap<String, ReceiverTypeSpec>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        let mut modulation = BTreeMap::new();
        modulation.insert(ModulationFamily::Psk, ModulationFamilySpec::with_orders(&[2, 4, 8]));
        modulation.insert(ModulationFamily::Qam, ModulationFamilySpec::with_orders(&[16, 64, 256]));
        modulation.insert(ModulationFamily::Ask, ModulationFamilySpec::with_orders(&[2, 4, 8]));
        modulation.insert(
            ModulationFamily::Fsk,
            ModulationFamilySpec {
                orders: vec![2, 4],
                symbol_rate_range: [10e3, 50e3],
                ..ModulationFamilySpec::default()
            },
        );
        modulation.insert(
            ModulationFamily::Msk,
            ModulationFamilySpec {
                orders: vec![2],
                symbol_rate_range: [20e3, 100e3],
                ..ModulationFamilySpec::default()
            },
        );
        modulation.insert(ModulationFamily::Ofdm, ModulationFamilySpec::with_orders(&[4, 16, 64]));
        modulation.insert(ModulationFamily::AmDsb, ModulationFamilySpec::with_orders(&[1]));
        modulation.insert(ModulationFamily::Fm, ModulationFamilySpec::with_orders(&[1]));

        let mut transmitter = BTreeMap::new();
        transmitter.insert(DEFAULT_DEVICE_TYPE.to_string(), TransmitterTypeSpec::default());

        let mut receiver = BTreeMap::new();
        receiver.insert(
            DEFAULT_DEVICE_TYPE.to_string(),
            ReceiverTypeSpec {
                sample_rate_range: Some([1e6, 20e6]),
                sensitivity_range: Some([-110.0, -90.0]),
                noise_figure_range: Some([3.0, 9.0]),
                num_antennas: None,
            },
        );

        Self { modulation, transmitter, receiver }
    }
}

impl FactoryConfig {
    /// Every scheme the catalog declares, family order then declared order.
    pub fn schemes(&self) -> Vec<SchemeId> {
        self.modulation
            .iter()
            .flat_map(|(family, spec)| spec.orders.iter().map(|order| SchemeId::new(*family, *order)))
            .collect()
    }

    pub fn declares(&self, scheme: &SchemeId) -> bool {
        self.modulation.get(&scheme.family).is_some_and(|spec| spec.orders.contains(&scheme.order))
    }

    pub fn validate(&self) -> Result<()> {
        if self.schemes().is_empty() {
            return Err(ScenarioError::config(
                "Factory.Modulation",
                "at least one modulation scheme must be declared",
            ));
        }
        for (family, spec) in &self.modulation {
            let field = format!("Factory.Modulation.{}", family.label());
            if spec.orders.iter().any(|order| *order == 0) {
                return Err(ScenarioError::config(field, "orders must be positive"));
            }
            check_range(&format!("{field}.SymbolRateRange"), spec.symbol_rate_range)?;
            check_positive(&format!("{field}.SymbolRateRange"), spec.symbol_rate_range[0])?;
            check_range(&format!("{field}.RolloffRange"), spec.rolloff_range)?;
            if spec.rolloff_range[0] < 0.0 || spec.rolloff_range[1] > 1.0 {
                return Err(ScenarioError::config(
                    format!("{field}.RolloffRange"),
                    "rolloff must lie within [0, 1]",
                ));
            }
            check_range(&format!("{field}.MessageBandwidthRange"), spec.message_bandwidth_range)?;
            check_positive(
                &format!("{field}.MessageBandwidthRange"),
                spec.message_bandwidth_range[0],
            )?;
            check_positive(&format!("{field}.SubcarrierSpacing"), spec.subcarrier_spacing)?;
            check_positive(&format!("{field}.ModulationIndex"), spec.modulation_index)?;
            if spec.num_subcarriers == 0 {
                return Err(ScenarioError::config(
                    format!("{field}.NumSubcarriers"),
                    "must be at least 1",
                ));
            }
            if !spec.frequency_deviation.is_finite() || spec.frequency_deviation < 0.0 {
                return Err(ScenarioError::config(
                    format!("{field}.FrequencyDeviation"),
                    "must be finite and non-negative",
                ));
            }
        }
        for (name, spec) in &self.receiver {
            let field = format!("Factory.Receiver.{name}");
            if let Some(range) = spec.sample_rate_range {
                check_range(&format!("{field}.SampleRateRange"), range)?;
                check_positive(&format!("{field}.SampleRateRange"), range[0])?;
            }
            if let Some(range) = spec.sensitivity_range {
                check_range(&format!("{field}.SensitivityRange"), range)?;
            }
            if let Some(range) = spec.noise_figure_range {
                check_range(&format!("{field}.NoiseFigureRange"), range)?;
            }
            if spec.num_antennas == Some(0) {
                return Err(ScenarioError::config(
                    format!("{field}.NumAntennas"),
                    "must be at least 1",
                ));
            }
        }
        Ok(())
    }
}
