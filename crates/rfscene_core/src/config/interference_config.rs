//! Interference management options

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum InterferenceCoordination {
    #[default]
    #[serde(rename = "TDMA")]
    Tdma,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct InterferenceManagementConfig {
    /// When false, spectral overlap is explicitly allowed and never flagged (default: true)
    pub enable_collision_avoidance: bool,
    /// Carried to the layout for downstream interference checks, dBm (default: -90)
    pub interference_threshold: f64,
    /// `None` turns off slot coordination for Scheduled transmitters (default: TDMA)
    pub coordination_strategy: InterferenceCoordination,
}

impl Default for InterferenceManagementConfig {
    fn default() -> Self {
        Self {
            enable_collision_avoidance: true,
            interference_threshold: -90.0,
            coordination_strategy: InterferenceCoordination::Tdma,
        }
    }
}
