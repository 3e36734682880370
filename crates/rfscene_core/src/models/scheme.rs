use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Modulation families the factory can declare.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum ModulationFamily {
    #[serde(rename = "PSK")]
    Psk,
    #[serde(rename = "QAM")]
    Qam,
    #[serde(rename = "ASK")]
    Ask,
    #[serde(rename = "FSK")]
    Fsk,
    #[serde(rename = "MSK")]
    Msk,
    #[serde(rename = "OFDM")]
    Ofdm,
    #[serde(rename = "AM-DSB")]
    AmDsb,
    #[serde(rename = "FM")]
    Fm,
}

/// How a family's occupied bandwidth is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandwidthModel {
    /// `(1 + rolloff) * symbol_rate`
    RaisedCosine,
    /// `(order - 1) * h * symbol_rate + 2 * symbol_rate`
    FrequencyShift,
    /// `1.5 * symbol_rate`
    MinimumShift,
    /// `subcarrier_spacing * used_subcarriers`
    Multicarrier,
    /// `2 * message_bandwidth`
    DoubleSideband,
    /// Carson: `2 * (deviation + message_bandwidth)`
    Carson,
}

impl ModulationFamily {
    pub fn bandwidth_model(self) -> BandwidthModel {
        match self {
            ModulationFamily::Psk | ModulationFamily::Qam | ModulationFamily::Ask => {
                BandwidthModel::RaisedCosine
            }
            ModulationFamily::Fsk => BandwidthModel::FrequencyShift,
            ModulationFamily::Msk => BandwidthModel::MinimumShift,
            ModulationFamily::Ofdm => BandwidthModel::Multicarrier,
            ModulationFamily::AmDsb => BandwidthModel::DoubleSideband,
            ModulationFamily::Fm => BandwidthModel::Carson,
        }
    }

    pub fn is_analog(self) -> bool {
        matches!(self, ModulationFamily::AmDsb | ModulationFamily::Fm)
    }

    pub fn label(self) -> &'static str {
        match self {
            ModulationFamily::Psk => "PSK",
            ModulationFamily::Qam => "QAM",
            ModulationFamily::Ask => "ASK",
            ModulationFamily::Fsk => "FSK",
            ModulationFamily::Msk => "MSK",
            ModulationFamily::Ofdm => "OFDM",
            ModulationFamily::AmDsb => "AM-DSB",
            ModulationFamily::Fm => "FM",
        }
    }
}

/// A concrete scheme: family plus constellation order (1 for analog).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "PascalCase")]
pub struct SchemeId {
    pub family: ModulationFamily,
    pub order: u32,
}

impl SchemeId {
    pub fn new(family: ModulationFamily, order: u32) -> Self {
        Self { family, order }
    }

    /// Information bits per symbol; 0 for analog schemes.
    pub fn bits_per_symbol(&self) -> f64 {
        if self.family.is_analog() || self.order < 2 {
            0.0
        } else {
            (self.order as f64).log2()
        }
    }
}

impl fmt::Display for SchemeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.family.is_analog() {
            write!(f, "{}", self.family.label())
        } else {
            write!(f, "{}{}", self.order, self.family.label())
        }
    }
}
