//! Per-frame output structures consumed by the waveform, RF-chain and
//! channel stages.

use super::entity::{ObservableRange, Site};
use super::layout::GlobalLayout;
use super::scheme::SchemeId;
use crate::config::{ModulationStrategy, PowerStrategy, SlotCoordination};
use serde::{Deserialize, Serialize};

/// Scenario-fixed spectral placement of one transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FrequencyAllocation {
    pub center_frequency: f64,
    pub bandwidth: f64,
}

impl FrequencyAllocation {
    pub fn low_edge(&self) -> f64 {
        self.center_frequency - self.bandwidth / 2.0
    }

    pub fn high_edge(&self) -> f64 {
        self.center_frequency + self.bandwidth / 2.0
    }
}

/// Scenario-fixed modulation choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModulationConfig {
    pub scheme: SchemeId,
    pub selection: ModulationStrategy,
    /// Symbol rate in Bd; the subcarrier spacing for multicarrier schemes and
    /// the message bandwidth for analog ones.
    pub symbol_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolloff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_subcarriers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_deviation: Option<f64>,
    pub bits_per_symbol: f64,
    /// Minimum bandwidth the scheme occupies, Hz.
    pub required_bandwidth: f64,
    /// Link-margin proxy used by adaptive selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_margin_db: Option<f64>,
}

/// Scenario-fixed transmit power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PowerConfig {
    pub strategy: PowerStrategy,
    pub transmit_power_dbm: f64,
    pub antenna_gain_db: f64,
}

/// Temporal pattern parameters, drawn once at scenario init.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "PatternType", rename_all_fields = "PascalCase")]
pub enum PatternParams {
    Continuous,
    Burst {
        /// Nominal length of one transmission, seconds.
        duration: f64,
        period: f64,
        duty_cycle: f64,
        on_frames: u32,
        period_frames: u32,
        phase_offset: u32,
    },
    Scheduled {
        slot_index: u32,
        num_slots: u32,
        coordination: SlotCoordination,
    },
}

impl PatternParams {
    pub fn type_name(&self) -> &'static str {
        match self {
            PatternParams::Continuous => "Continuous",
            PatternParams::Burst { .. } => "Burst",
            PatternParams::Scheduled { .. } => "Scheduled",
        }
    }
}

/// The only frame-mutable entity: pattern plus this frame's activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransmissionState {
    pub pattern: PatternParams,
    pub active: bool,
    /// Burst phase or current slot for the frame; 0 for continuous.
    pub phase: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TxConfig {
    pub id: String,
    pub carrier_frequency: f64,
    #[serde(rename = "BandWidth")]
    pub bandwidth: f64,
    pub sample_rate: f64,
    pub transmit_power: f64,
    pub modulation_config: ModulationConfig,
    pub power_config: PowerConfig,
    pub transmission_state: TransmissionState,
    pub site_config: Site,
    pub parent_transmitter_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impairment_model_type: Option<String>,
    /// Receivers whose window this transmitter was planned into.
    pub receiver_ids: Vec<String>,
}

impl TxConfig {
    pub fn frequency_allocation(&self) -> FrequencyAllocation {
        FrequencyAllocation { center_frequency: self.carrier_frequency, bandwidth: self.bandwidth }
    }

    /// Bit-exact comparison of every scenario-fixed field.
    pub fn same_fixed_fields(&self, other: &TxConfig) -> bool {
        self.id == other.id
            && self.carrier_frequency.to_bits() == other.carrier_frequency.to_bits()
            && self.bandwidth.to_bits() == other.bandwidth.to_bits()
            && self.sample_rate.to_bits() == other.sample_rate.to_bits()
            && self.transmit_power.to_bits() == other.transmit_power.to_bits()
            && self.modulation_config == other.modulation_config
            && self.power_config == other.power_config
            && self.transmission_state.pattern == other.transmission_state.pattern
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RxConfig {
    pub id: String,
    pub sample_rate: f64,
    pub sensitivity: f64,
    pub noise_figure: f64,
    pub observable_range: ObservableRange,
    pub num_antennas: u32,
    pub site_config: Site,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub defaulted_fields: Vec<String>,
}

/// Everything the subsystem produces for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FrameOutput {
    pub frame_id: u32,
    pub tx_configs: Vec<TxConfig>,
    pub rx_configs: Vec<RxConfig>,
    pub layout: GlobalLayout,
}

impl FrameOutput {
    pub fn tx(&self, id: &str) -> Option<&TxConfig> {
        self.tx_configs.iter().find(|tx| tx.id == id)
    }

    pub fn active_ids(&self) -> Vec<&str> {
        self.tx_configs
            .iter()
            .filter(|tx| tx.transmission_state.active)
            .map(|tx| tx.id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_params_tagging() {
        let params = PatternParams::Scheduled {
            slot_index: 2,
            num_slots: 4,
            coordination: SlotCoordination::Tdma,
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["PatternType"], "Scheduled");
        assert_eq!(value["SlotIndex"], 2);
        assert_eq!(value["Coordination"], "TDMA");
    }

    #[test]
    fn test_allocation_edges() {
        let alloc = FrequencyAllocation { center_frequency: 300e3, bandwidth: 200e3 };
        assert_eq!(alloc.low_edge(), 200e3);
        assert_eq!(alloc.high_edge(), 400e3);
    }
}
