//! Physical-environment entities as handed over by the environment generator,
//! and the transmitter / receiver views derived from them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Type discriminator of an environment entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum EntityType {
    #[serde(alias = "Tx")]
    Transmitter,
    #[serde(alias = "Rx")]
    Receiver,
    /// Anything else the environment produced (buildings, vehicles, ...).
    #[serde(other)]
    Other,
}

/// Placement of an entity in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Site {
    /// Position in meters, scene-local cartesian frame.
    #[serde(default)]
    pub position: [f64; 3],
    #[serde(default)]
    pub num_antennas: Option<u32>,
}

impl Site {
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self { position: [x, y, z], num_antennas: None }
    }

    pub fn with_antennas(mut self, num_antennas: u32) -> Self {
        self.num_antennas = Some(num_antennas);
        self
    }

    pub fn distance_to(&self, other: &Site) -> f64 {
        self.position
            .iter()
            .zip(other.position.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

/// Generic entity produced by the environment collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct EnvironmentEntity {
    pub id: String,
    #[serde(rename = "Type")]
    pub entity_type: EntityType,
    #[serde(default = "default_site")]
    pub site: Site,
    /// Factory implementation name (transmitter or receiver type).
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub impairment_model_type: Option<String>,
    /// Receiver-only overrides; drawn from the factory ranges when absent.
    #[serde(default)]
    pub sample_rate: Option<f64>,
    #[serde(default)]
    pub sensitivity: Option<f64>,
    #[serde(default)]
    pub noise_figure: Option<f64>,
}

fn default_site() -> Site {
    Site::at(0.0, 0.0, 0.0)
}

impl EnvironmentEntity {
    pub fn transmitter(id: impl Into<String>, site: Site) -> Self {
        Self::new(id, EntityType::Transmitter, site)
    }

    pub fn receiver(id: impl Into<String>, site: Site) -> Self {
        Self::new(id, EntityType::Receiver, site)
    }

    fn new(id: impl Into<String>, entity_type: EntityType, site: Site) -> Self {
        Self {
            id: id.into(),
            entity_type,
            site,
            device_type: None,
            impairment_model_type: None,
            sample_rate: None,
            sensitivity: None,
            noise_figure: None,
        }
    }

    pub fn with_device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }
}

/// Transmitter view of an entity. Immutable for the scenario's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransmitterEntity {
    pub id: String,
    pub site: Site,
    pub num_antennas: u32,
    pub transmitter_type: String,
    pub impairment_model_type: Option<String>,
}

/// Receiver as classified, before its radio parameters are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverDescriptor {
    pub id: String,
    pub site: Site,
    pub receiver_type: String,
    pub sample_rate: Option<f64>,
    pub sensitivity: Option<f64>,
    pub noise_figure: Option<f64>,
}

/// Span of frequencies a receiver senses: `[low, high)` in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ObservableRange {
    pub low: f64,
    pub high: f64,
}

impl ObservableRange {
    /// `[0, sample_rate)`; the convention is fixed crate-wide.
    pub fn from_sample_rate(sample_rate: f64) -> Self {
        Self { low: 0.0, high: sample_rate }
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Whether the band `[center - bw/2, center + bw/2]` lies inside the range.
    pub fn contains_band(&self, center: f64, bandwidth: f64, tolerance: f64) -> bool {
        center - bandwidth / 2.0 >= self.low - tolerance
            && center + bandwidth / 2.0 <= self.high + tolerance
    }

    /// Common part of two ranges; collapses to an empty range when disjoint.
    pub fn intersect(&self, other: &ObservableRange) -> ObservableRange {
        let low = self.low.max(other.low);
        let high = self.high.min(other.high).max(low);
        ObservableRange { low, high }
    }
}

/// Receiver with every radio parameter resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiverEntity {
    pub id: String,
    pub site: Site,
    pub receiver_type: String,
    pub num_antennas: u32,
    pub sample_rate: f64,
    pub sensitivity: f64,
    pub noise_figure: f64,
    pub observable_range: ObservableRange,
    /// Fields that fell back to a documented default.
    pub defaulted_fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_aliases() {
        let tx: EntityType = serde_json::from_str("\"Tx\"").unwrap();
        let rx: EntityType = serde_json::from_str("\"Receiver\"").unwrap();
        let other: EntityType = serde_json::from_str("\"Building\"").unwrap();
        assert_eq!(tx, EntityType::Transmitter);
        assert_eq!(rx, EntityType::Receiver);
        assert_eq!(other, EntityType::Other);
    }

    #[test]
    fn test_observable_range_containment() {
        let range = ObservableRange::from_sample_rate(1e6);
        assert!(range.contains_band(500e3, 200e3, 0.0));
        assert!(range.contains_band(900e3, 200e3, 0.0));
        assert!(!range.contains_band(950e3, 200e3, 0.0));
        assert!(!range.contains_band(50e3, 200e3, 0.0));
    }

    #[test]
    fn test_intersect_disjoint_is_empty() {
        let a = ObservableRange { low: 0.0, high: 1e6 };
        let b = ObservableRange { low: 2e6, high: 3e6 };
        assert_eq!(a.intersect(&b).width(), 0.0);
        assert_eq!(a.intersect(&ObservableRange::from_sample_rate(5e5)).width(), 5e5);
    }

    #[test]
    fn test_site_distance() {
        let a = Site::at(0.0, 0.0, 0.0);
        let b = Site::at(3.0, 4.0, 0.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
    }
}
