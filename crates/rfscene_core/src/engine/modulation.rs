//! ModulationSelector: picks a scheme per transmitter and derives the minimum
//! bandwidth it occupies.
//!
//! Draw order on the modulation stream, per transmitter in input order:
//! margin proxy (Adaptive only), candidate index (Random / Adaptive), then the
//! family parameters: symbol rate and rolloff for raised-cosine families,
//! symbol rate for FSK/MSK, message bandwidth for analog families, nothing
//! for OFDM.

use super::rng::draw_in;
use crate::config::{FactoryConfig, ModulationFamilySpec, ModulationSelectionConfig, ModulationStrategy};
use crate::models::{BandwidthModel, ModulationConfig, ModulationFamily, SchemeId, TransmitterEntity};
use rand::Rng;
use tracing::{debug, warn};

const FALLBACK_SCHEME: SchemeId = SchemeId { family: ModulationFamily::Psk, order: 2 };

pub struct ModulationSelector<'a> {
    config: &'a ModulationSelectionConfig,
    factory: &'a FactoryConfig,
    candidates: Vec<SchemeId>,
}

impl<'a> ModulationSelector<'a> {
    pub fn new(config: &'a ModulationSelectionConfig, factory: &'a FactoryConfig) -> Self {
        let mut candidates: Vec<SchemeId> = config
            .preferred_schemes
            .iter()
            .filter(|scheme| {
                let declared = factory.declares(scheme);
                if !declared {
                    warn!(scheme = %scheme, "preferred scheme not declared by the factory, skipped");
                }
                declared
            })
            .copied()
            .collect();
        if candidates.is_empty() {
            candidates = factory.schemes();
        }
        Self { config, factory, candidates }
    }

    pub fn candidates(&self) -> &[SchemeId] {
        &self.candidates
    }

    pub fn select<R: Rng + ?Sized>(&self, tx: &TransmitterEntity, rng: &mut R) -> ModulationConfig {
        let (scheme, margin) = match self.config.strategy {
            ModulationStrategy::Fixed => {
                let scheme = self.config.fixed_scheme.unwrap_or_else(|| {
                    warn!(id = %tx.id, "fixed strategy without a scheme, using the first candidate");
                    self.candidates.first().copied().unwrap_or(FALLBACK_SCHEME)
                });
                (scheme, None)
            }
            ModulationStrategy::Random => (pick(&self.candidates, rng), None),
            ModulationStrategy::Adaptive => {
                let thresholds = &self.config.quality_thresholds;
                let margin = draw_in(rng, thresholds.margin_range_db)
                    + 10.0 * (tx.num_antennas.max(1) as f64).log10();
                let eligible = self.adaptive_candidates(margin);
                (pick(&eligible, rng), Some(margin))
            }
        };

        let fallback_spec = ModulationFamilySpec::default();
        let spec = self.factory.modulation.get(&scheme.family).unwrap_or(&fallback_spec);
        let modulation = build_config(scheme, spec, self.config.strategy, margin, rng);
        debug!(
            id = %tx.id,
            scheme = %modulation.scheme,
            required_bandwidth = modulation.required_bandwidth,
            "modulation selected"
        );
        modulation
    }

    /// Lower half of the candidates by bits/symbol under a poor margin, upper
    /// half under a good one, everything in between.
    fn adaptive_candidates(&self, margin_db: f64) -> Vec<SchemeId> {
        let thresholds = &self.config.quality_thresholds;
        let mut ranked = self.candidates.clone();
        ranked.sort_by(|a, b| a.bits_per_symbol().total_cmp(&b.bits_per_symbol()));
        let half = ranked.len().div_ceil(2);
        if margin_db < thresholds.low_margin_db {
            ranked.truncate(half);
            ranked
        } else if margin_db >= thresholds.high_margin_db {
            ranked.split_off(ranked.len() - half)
        } else {
            self.candidates.clone()
        }
    }
}

fn pick<R: Rng + ?Sized>(candidates: &[SchemeId], rng: &mut R) -> SchemeId {
    if candidates.is_empty() {
        return FALLBACK_SCHEME;
    }
    candidates[rng.gen_range(0..candidates.len())]
}

fn build_config<R: Rng + ?Sized>(
    scheme: SchemeId,
    spec: &ModulationFamilySpec,
    selection: ModulationStrategy,
    quality_margin_db: Option<f64>,
    rng: &mut R,
) -> ModulationConfig {
    let mut config = ModulationConfig {
        scheme,
        selection,
        symbol_rate: 0.0,
        rolloff: None,
        num_subcarriers: None,
        frequency_deviation: None,
        bits_per_symbol: scheme.bits_per_symbol(),
        required_bandwidth: 0.0,
        quality_margin_db,
    };

    match scheme.family.bandwidth_model() {
        BandwidthModel::RaisedCosine => {
            config.symbol_rate = draw_in(rng, spec.symbol_rate_range);
            let rolloff = draw_in(rng, spec.rolloff_range);
            config.rolloff = Some(rolloff);
            config.required_bandwidth = (1.0 + rolloff) * config.symbol_rate;
        }
        BandwidthModel::FrequencyShift => {
            config.symbol_rate = draw_in(rng, spec.symbol_rate_range);
            let tones = scheme.order.max(2) as f64;
            config.frequency_deviation = Some(spec.modulation_index * config.symbol_rate / 2.0);
            config.required_bandwidth = (tones - 1.0) * spec.modulation_index * config.symbol_rate
                + 2.0 * config.symbol_rate;
        }
        BandwidthModel::MinimumShift => {
            config.symbol_rate = draw_in(rng, spec.symbol_rate_range);
            config.required_bandwidth = 1.5 * config.symbol_rate;
        }
        BandwidthModel::Multicarrier => {
            config.symbol_rate = spec.subcarrier_spacing;
            config.num_subcarriers = Some(spec.num_subcarriers);
            config.required_bandwidth = spec.subcarrier_spacing * spec.num_subcarriers as f64;
        }
        BandwidthModel::DoubleSideband => {
            config.symbol_rate = draw_in(rng, spec.message_bandwidth_range);
            config.required_bandwidth = 2.0 * config.symbol_rate;
        }
        BandwidthModel::Carson => {
            config.symbol_rate = draw_in(rng, spec.message_bandwidth_range);
            config.frequency_deviation = Some(spec.frequency_deviation);
            config.required_bandwidth = 2.0 * (spec.frequency_deviation + config.symbol_rate);
        }
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{QualityThresholds, DEFAULT_DEVICE_TYPE};
    use crate::engine::rng::{stream_rng, RngStream};
    use crate::models::Site;
    use std::collections::BTreeMap;

    fn tx(num_antennas: u32) -> TransmitterEntity {
        TransmitterEntity {
            id: "tx".into(),
            site: Site::at(0.0, 0.0, 0.0),
            num_antennas,
            transmitter_type: DEFAULT_DEVICE_TYPE.into(),
            impairment_model_type: None,
        }
    }

    fn single_family(family: ModulationFamily, spec: ModulationFamilySpec) -> FactoryConfig {
        let mut modulation = BTreeMap::new();
        modulation.insert(family, spec);
        FactoryConfig { modulation, ..FactoryConfig::default() }
    }

    #[test]
    fn test_raised_cosine_bandwidth() {
        let factory = single_family(
            ModulationFamily::Qam,
            ModulationFamilySpec {
                orders: vec![16],
                symbol_rate_range: [100e3, 100e3],
                rolloff_range: [0.25, 0.25],
                ..ModulationFamilySpec::default()
            },
        );
        let config = ModulationSelectionConfig::default();
        let mut rng = stream_rng(0, RngStream::Modulation);
        let m = ModulationSelector::new(&config, &factory).select(&tx(1), &mut rng);
        assert_eq!(m.scheme, SchemeId::new(ModulationFamily::Qam, 16));
        assert!((m.required_bandwidth - 125e3).abs() < 1e-6);
        assert_eq!(m.bits_per_symbol, 4.0);
    }

    #[test]
    fn test_multicarrier_bandwidth() {
        let factory = single_family(
            ModulationFamily::Ofdm,
            ModulationFamilySpec {
                orders: vec![16],
                subcarrier_spacing: 15e3,
                num_subcarriers: 12,
                ..ModulationFamilySpec::default()
            },
        );
        let config = ModulationSelectionConfig::default();
        let mut rng = stream_rng(0, RngStream::Modulation);
        let m = ModulationSelector::new(&config, &factory).select(&tx(1), &mut rng);
        assert_eq!(m.required_bandwidth, 180e3);
        assert_eq!(m.num_subcarriers, Some(12));
    }

    #[test]
    fn test_fsk_and_fm_bandwidth() {
        let fsk = single_family(
            ModulationFamily::Fsk,
            ModulationFamilySpec {
                orders: vec![4],
                symbol_rate_range: [10e3, 10e3],
                modulation_index: 1.0,
                ..ModulationFamilySpec::default()
            },
        );
        let config = ModulationSelectionConfig::default();
        let mut rng = stream_rng(0, RngStream::Modulation);
        let m = ModulationSelector::new(&config, &fsk).select(&tx(1), &mut rng);
        assert!((m.required_bandwidth - 50e3).abs() < 1e-6);

        let fm = single_family(
            ModulationFamily::Fm,
            ModulationFamilySpec {
                orders: vec![1],
                message_bandwidth_range: [5e3, 5e3],
                frequency_deviation: 20e3,
                ..ModulationFamilySpec::default()
            },
        );
        let m = ModulationSelector::new(&config, &fm).select(&tx(1), &mut rng);
        assert!((m.required_bandwidth - 50e3).abs() < 1e-6);
        assert_eq!(m.bits_per_symbol, 0.0);
    }

    #[test]
    fn test_fixed_strategy() {
        let factory = FactoryConfig::default();
        let config = ModulationSelectionConfig {
            strategy: ModulationStrategy::Fixed,
            fixed_scheme: Some(SchemeId::new(ModulationFamily::Psk, 4)),
            ..ModulationSelectionConfig::default()
        };
        let selector = ModulationSelector::new(&config, &factory);
        let mut rng = stream_rng(3, RngStream::Modulation);
        for _ in 0..10 {
            assert_eq!(
                selector.select(&tx(1), &mut rng).scheme,
                SchemeId::new(ModulationFamily::Psk, 4)
            );
        }
    }

    #[test]
    fn test_random_draws_only_preferred() {
        let factory = FactoryConfig::default();
        let preferred = vec![
            SchemeId::new(ModulationFamily::Psk, 2),
            SchemeId::new(ModulationFamily::Qam, 64),
            SchemeId::new(ModulationFamily::Qam, 32),
        ];
        let config = ModulationSelectionConfig {
            preferred_schemes: preferred.clone(),
            ..ModulationSelectionConfig::default()
        };
        let selector = ModulationSelector::new(&config, &factory);
        assert_eq!(selector.candidates().len(), 2);
        let mut rng = stream_rng(11, RngStream::Modulation);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            let scheme = selector.select(&tx(1), &mut rng).scheme;
            assert!(preferred[..2].contains(&scheme));
            seen.insert(scheme);
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_adaptive_favors_high_order_on_good_margin() {
        let factory = FactoryConfig::default();
        let preferred = vec![
            SchemeId::new(ModulationFamily::Psk, 2),
            SchemeId::new(ModulationFamily::Psk, 4),
            SchemeId::new(ModulationFamily::Qam, 16),
            SchemeId::new(ModulationFamily::Qam, 256),
        ];
        let strong = ModulationSelectionConfig {
            strategy: ModulationStrategy::Adaptive,
            preferred_schemes: preferred.clone(),
            quality_thresholds: QualityThresholds {
                low_margin_db: 5.0,
                high_margin_db: 10.0,
                margin_range_db: [20.0, 30.0],
            },
            ..ModulationSelectionConfig::default()
        };
        let mut rng = stream_rng(5, RngStream::Modulation);
        let selector = ModulationSelector::new(&strong, &factory);
        for _ in 0..50 {
            let m = selector.select(&tx(1), &mut rng);
            assert!(m.bits_per_symbol >= 4.0, "got {}", m.scheme);
            assert!(m.quality_margin_db.is_some_and(|q| q >= 20.0));
        }

        let weak = ModulationSelectionConfig {
            quality_thresholds: QualityThresholds {
                low_margin_db: 5.0,
                high_margin_db: 10.0,
                margin_range_db: [0.0, 1.0],
            },
            ..strong
        };
        let selector = ModulationSelector::new(&weak, &factory);
        for _ in 0..50 {
            assert!(selector.select(&tx(1), &mut rng).bits_per_symbol <= 2.0);
        }
    }

    #[test]
    fn test_same_stream_same_choices() {
        let factory = FactoryConfig::default();
        let config = ModulationSelectionConfig::default();
        let selector = ModulationSelector::new(&config, &factory);
        let mut a = stream_rng(77, RngStream::Modulation);
        let mut b = stream_rng(77, RngStream::Modulation);
        for _ in 0..20 {
            assert_eq!(selector.select(&tx(2), &mut a), selector.select(&tx(2), &mut b));
        }
    }
}
