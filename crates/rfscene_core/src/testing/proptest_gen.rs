//! Property-based test generators for scenarios
//!
//! Small scenes (a handful of transmitters and receivers) with randomized
//! geometry, sample rates and allocation options.

use crate::config::{AllocationStrategy, PatternType, ReceiverAssociation, ScenarioConfig};
use crate::models::{EnvironmentEntity, Site};
use proptest::prelude::*;

pub fn site_strategy() -> impl Strategy<Value = Site> {
    (-500.0f64..=500.0, -500.0f64..=500.0, 0.0f64..=30.0, prop::option::of(1u32..=4))
        .prop_map(|(x, y, z, antennas)| Site { position: [x, y, z], num_antennas: antennas })
}

pub fn allocation_strategy() -> impl Strategy<Value = AllocationStrategy> {
    prop_oneof![
        Just(AllocationStrategy::ReceiverCentric),
        Just(AllocationStrategy::Optimized),
        Just(AllocationStrategy::Random),
    ]
}

pub fn association_strategy() -> impl Strategy<Value = ReceiverAssociation> {
    prop_oneof![Just(ReceiverAssociation::AllReceivers), Just(ReceiverAssociation::Nearest)]
}

/// Receiver sample rates on a 100 kHz grid between 500 kHz and 4 MHz.
pub fn sample_rate_strategy() -> impl Strategy<Value = f64> {
    (5u32..=40).prop_map(|steps| steps as f64 * 100e3)
}

pub fn entities_strategy() -> impl Strategy<Value = Vec<EnvironmentEntity>> {
    (
        prop::collection::vec(site_strategy(), 1..=6),
        prop::collection::vec((site_strategy(), sample_rate_strategy()), 1..=3),
    )
        .prop_map(|(tx_sites, rx_sites)| {
            let mut entities: Vec<EnvironmentEntity> = tx_sites
                .into_iter()
                .enumerate()
                .map(|(i, site)| EnvironmentEntity::transmitter(format!("tx{i}"), site))
                .collect();
            entities.extend(rx_sites.into_iter().enumerate().map(|(i, (site, rate))| {
                EnvironmentEntity::receiver(format!("rx{i}"), site).with_sample_rate(rate)
            }));
            entities
        })
}

pub fn config_strategy() -> impl Strategy<Value = ScenarioConfig> {
    (
        any::<u64>(),
        allocation_strategy(),
        association_strategy(),
        0.0f64..=50e3,
        prop_oneof![Just(0.0f64), 0.0f64..=0.5],
        0.0f64..=20e3,
        any::<bool>(),
    )
        .prop_map(
            |(seed, strategy, association, min_separation, max_overlap, guard_bands, avoid)| {
                let mut cfg = ScenarioConfig::default().with_seed(seed);
                cfg.frequency_allocation.strategy = strategy;
                cfg.frequency_allocation.association = association;
                cfg.frequency_allocation.min_separation = min_separation;
                cfg.frequency_allocation.max_overlap = max_overlap;
                cfg.frequency_allocation.guard_bands = guard_bands;
                cfg.frequency_allocation.optimizer_trials = 4;
                cfg.frequency_allocation.optimizer_moves = 16;
                cfg.interference_management.enable_collision_avoidance = avoid;
                cfg
            },
        )
}

pub fn forced_pattern_config(pattern_type: PatternType) -> impl Strategy<Value = ScenarioConfig> {
    config_strategy().prop_map(move |mut cfg| {
        cfg.transmission_pattern.default_type = Some(pattern_type);
        cfg
    })
}
