//! ReceiverConfigurator: resolves each receiver's sample rate, sensitivity,
//! noise figure and observable window.
//!
//! Draw order on the receivers stream, per receiver in input order:
//! sample rate, sensitivity, noise figure; each only when it is drawn from a
//! factory range (entity overrides and defaults consume nothing).

use super::rng::draw_in;
use crate::config::{FactoryConfig, ReceiverTypeSpec};
use crate::models::{ObservableRange, ReceiverDescriptor, ReceiverEntity, RxConfig};
use rand::Rng;
use tracing::warn;

pub const DEFAULT_SAMPLE_RATE: f64 = 20e6;
pub const DEFAULT_SENSITIVITY_DBM: f64 = -100.0;
pub const DEFAULT_NOISE_FIGURE_DB: f64 = 6.0;
pub const DEFAULT_NUM_ANTENNAS: u32 = 1;

/// Sample rates are drawn on a 1 kHz grid.
const SAMPLE_RATE_GRID_HZ: f64 = 1e3;

pub struct ReceiverConfigurator<'a> {
    factory: &'a FactoryConfig,
}

impl<'a> ReceiverConfigurator<'a> {
    pub fn new(factory: &'a FactoryConfig) -> Self {
        Self { factory }
    }

    pub fn configure<R: Rng + ?Sized>(
        &self,
        receiver: &ReceiverDescriptor,
        rng: &mut R,
    ) -> ReceiverEntity {
        let empty = ReceiverTypeSpec::default();
        let spec = self.factory.receiver.get(&receiver.receiver_type).unwrap_or_else(|| {
            warn!(
                id = %receiver.id,
                receiver_type = %receiver.receiver_type,
                "receiver type not declared by the factory, using defaults"
            );
            &empty
        });
        let mut defaulted = Vec::new();

        let explicit_rate = validated(
            &receiver.id,
            receiver.sample_rate,
            "SampleRate",
            |rate| rate.is_finite() && rate > 0.0,
            &mut defaulted,
        );
        let sample_rate = match (explicit_rate, spec.sample_rate_range) {
            (Some(rate), _) => rate,
            (None, Some(range)) => {
                let drawn = draw_in(rng, range);
                ((drawn / SAMPLE_RATE_GRID_HZ).round() * SAMPLE_RATE_GRID_HZ).clamp(range[0], range[1])
            }
            (None, None) => {
                mark_defaulted(&mut defaulted, "SampleRate");
                DEFAULT_SAMPLE_RATE
            }
        };
        let explicit_sensitivity = validated(
            &receiver.id,
            receiver.sensitivity,
            "Sensitivity",
            f64::is_finite,
            &mut defaulted,
        );
        let explicit_noise_figure = validated(
            &receiver.id,
            receiver.noise_figure,
            "NoiseFigure",
            f64::is_finite,
            &mut defaulted,
        );
        let sensitivity = resolve(
            explicit_sensitivity,
            spec.sensitivity_range,
            DEFAULT_SENSITIVITY_DBM,
            "Sensitivity",
            &mut defaulted,
            rng,
        );
        let noise_figure = resolve(
            explicit_noise_figure,
            spec.noise_figure_range,
            DEFAULT_NOISE_FIGURE_DB,
            "NoiseFigure",
            &mut defaulted,
            rng,
        );
        let num_antennas = match receiver.site.num_antennas.or(spec.num_antennas) {
            Some(n) if n > 0 => n,
            _ => {
                defaulted.push("NumAntennas".to_string());
                DEFAULT_NUM_ANTENNAS
            }
        };

        if !defaulted.is_empty() {
            warn!(id = %receiver.id, fields = ?defaulted, "receiver fields defaulted");
        }

        ReceiverEntity {
            id: receiver.id.clone(),
            site: receiver.site.clone(),
            receiver_type: receiver.receiver_type.clone(),
            num_antennas,
            sample_rate,
            sensitivity,
            noise_figure,
            observable_range: ObservableRange::from_sample_rate(sample_rate),
            defaulted_fields: defaulted,
        }
    }

    pub fn configure_all<R: Rng + ?Sized>(
        &self,
        receivers: &[ReceiverDescriptor],
        rng: &mut R,
    ) -> Vec<ReceiverEntity> {
        receivers.iter().map(|rx| self.configure(rx, rng)).collect()
    }
}

/// Drops an entity override that fails `valid`, recording the field as
/// defaulted.
fn validated(
    id: &str,
    explicit: Option<f64>,
    field: &str,
    valid: impl Fn(f64) -> bool,
    defaulted: &mut Vec<String>,
) -> Option<f64> {
    match explicit {
        Some(value) if valid(value) => Some(value),
        Some(value) => {
            warn!(id = %id, field, value, "invalid receiver value ignored");
            mark_defaulted(defaulted, field);
            None
        }
        None => None,
    }
}

fn mark_defaulted(defaulted: &mut Vec<String>, field: &str) {
    if !defaulted.iter().any(|f| f == field) {
        defaulted.push(field.to_string());
    }
}

fn resolve<R: Rng + ?Sized>(
    explicit: Option<f64>,
    range: Option<[f64; 2]>,
    default: f64,
    field: &str,
    defaulted: &mut Vec<String>,
    rng: &mut R,
) -> f64 {
    match (explicit, range) {
        (Some(value), _) => value,
        (None, Some(range)) => draw_in(rng, range),
        (None, None) => {
            mark_defaulted(defaulted, field);
            default
        }
    }
}

impl ReceiverEntity {
    pub fn to_rx_config(&self) -> RxConfig {
        RxConfig {
            id: self.id.clone(),
            sample_rate: self.sample_rate,
            sensitivity: self.sensitivity,
            noise_figure: self.noise_figure,
            observable_range: self.observable_range,
            num_antennas: self.num_antennas,
            site_config: self.site.clone(),
            defaulted_fields: self.defaulted_fields.clone(),
        }
    }
}
