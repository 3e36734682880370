//! PowerController: scenario-fixed transmit power per transmitter.
//!
//! Deterministic; consumes no randomness.

use crate::config::{FactoryConfig, PowerControlConfig, PowerStrategy};
use crate::models::{PowerConfig, TransmitterEntity};
use tracing::debug;

/// Free-space path loss constant for distance in m and frequency in Hz.
const FSPL_CONSTANT_DB: f64 = -147.55;
/// Path loss is never evaluated closer than this.
const MIN_DISTANCE_M: f64 = 1.0;

/// Link geometry seen from one transmitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerContext {
    /// Distance to the nearest serving receiver; `None` when unserved.
    pub distance_m: Option<f64>,
    /// Smallest and largest serving distance over the scenario.
    pub distance_span_m: (f64, f64),
    pub receiver_sensitivity_dbm: f64,
    pub receiver_gain_db: f64,
    /// Baseband center of the transmitter's band, Hz.
    pub center_frequency: f64,
}

pub fn free_space_path_loss_db(distance_m: f64, frequency_hz: f64) -> f64 {
    20.0 * distance_m.max(MIN_DISTANCE_M).log10() + 20.0 * frequency_hz.log10() + FSPL_CONSTANT_DB
}

/// Array gain of `n` antennas, dB.
pub fn array_gain_db(num_antennas: u32) -> f64 {
    10.0 * (num_antennas.max(1) as f64).log10()
}

pub struct PowerController<'a> {
    config: &'a PowerControlConfig,
    factory: &'a FactoryConfig,
}

impl<'a> PowerController<'a> {
    pub fn new(config: &'a PowerControlConfig, factory: &'a FactoryConfig) -> Self {
        Self { config, factory }
    }

    pub fn assign(&self, tx: &TransmitterEntity, ctx: &PowerContext) -> PowerConfig {
        let antenna_gain_db = array_gain_db(tx.num_antennas);
        let hardware_cap = self.hardware_cap(tx);
        let ceiling = self.config.ceiling().min(hardware_cap);
        let floor = self.config.power_range[0].min(ceiling);

        let transmit_power_dbm = match (self.config.strategy, ctx.distance_m) {
            (PowerStrategy::FixedPower, _) => self.config.default_power.min(hardware_cap),
            (PowerStrategy::LinkBudget, Some(distance)) => {
                let rf = self.config.reference_frequency + ctx.center_frequency;
                let wanted = ctx.receiver_sensitivity_dbm
                    + self.config.target_margin_db
                    + free_space_path_loss_db(distance, rf)
                    - antenna_gain_db
                    - ctx.receiver_gain_db;
                wanted.clamp(floor, ceiling)
            }
            (PowerStrategy::LinkBudget, None) => self.config.default_power.clamp(floor, ceiling),
            (PowerStrategy::Adaptive, distance) => {
                let (near, far) = ctx.distance_span_m;
                let quality = match distance {
                    Some(d) if far - near > f64::EPSILON => ((d - near) / (far - near)).clamp(0.0, 1.0),
                    _ => 0.5,
                };
                let span = self.config.power_range[1] - self.config.power_range[0];
                (self.config.power_range[0] + quality * span - antenna_gain_db).clamp(floor, ceiling)
            }
        };

        debug!(
            id = %tx.id,
            strategy = ?self.config.strategy,
            transmit_power_dbm,
            "power assigned"
        );
        PowerConfig { strategy: self.config.strategy, transmit_power_dbm, antenna_gain_db }
    }

    fn hardware_cap(&self, tx: &TransmitterEntity) -> f64 {
        self.factory
            .transmitter
            .get(&tx.transmitter_type)
            .and_then(|spec| spec.max_power)
            .unwrap_or(f64::INFINITY)
    }
}
