//! Scenario-level property tests.

pub mod proptest_gen;

use crate::config::{FactoryConfig, PatternType, ScenarioConfig};
use crate::engine::ScenarioOrchestrator;
use crate::models::{EnvironmentEntity, FrameOutput, PatternParams};
use proptest::prelude::*;
use proptest_gen::{config_strategy, entities_strategy, forced_pattern_config};

const TOLERANCE_HZ: f64 = 1e-6;

fn run(config: &ScenarioConfig, entities: &[EnvironmentEntity], frames: u32) -> (Vec<FrameOutput>, ScenarioOrchestrator) {
    let factory = FactoryConfig::default();
    let mut orchestrator = ScenarioOrchestrator::new(config.clone()).unwrap();
    let outputs = (1..=frames).map(|f| orchestrator.step(f, entities, &factory).unwrap()).collect();
    (outputs, orchestrator)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_bands_stay_inside_their_plan_window(
        config in config_strategy(),
        entities in entities_strategy(),
    ) {
        let (frames, _) = run(&config, &entities, 1);
        let frame = &frames[0];
        for tx in &frame.tx_configs {
            let plan = frame.layout.plan_of(&tx.id);
            prop_assert!(plan.is_some(), "{} has no plan", tx.id);
            if let Some(plan) = plan {
                prop_assert!(
                    plan.window.contains_band(tx.carrier_frequency, tx.bandwidth, TOLERANCE_HZ),
                    "{} at {} ({} Hz) outside {:?}", tx.id, tx.carrier_frequency, tx.bandwidth, plan.window
                );
            }
        }
    }

    #[test]
    fn test_overlap_above_bound_is_always_flagged(
        config in config_strategy(),
        entities in entities_strategy(),
    ) {
        prop_assume!(config.interference_management.enable_collision_avoidance);
        let (frames, _) = run(&config, &entities, 1);
        let layout = &frames[0].layout;
        let max_overlap = config.frequency_allocation.max_overlap;
        for (i, a) in layout.entries.iter().enumerate() {
            for b in &layout.entries[i + 1..] {
                let overlap = layout.overlap_hz(&a.tx_id, &b.tx_id).unwrap_or(0.0);
                if overlap > max_overlap * a.bandwidth.min(b.bandwidth) + TOLERANCE_HZ {
                    prop_assert!(
                        layout.is_flagged_infeasible(&a.tx_id) && layout.is_flagged_infeasible(&b.tx_id),
                        "{} and {} overlap by {} Hz unflagged", a.tx_id, b.tx_id, overlap
                    );
                }
            }
        }
    }

    #[test]
    fn test_same_inputs_same_frames(
        config in config_strategy(),
        entities in entities_strategy(),
    ) {
        let (a, _) = run(&config, &entities, 5);
        let (b, _) = run(&config, &entities, 5);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn test_scenario_fixed_fields_never_change(
        config in config_strategy(),
        entities in entities_strategy(),
    ) {
        let (_, orchestrator) = run(&config, &entities, 12);
        prop_assert!(orchestrator.history().verify_scenario_invariance().is_empty());
    }

    #[test]
    fn test_burst_activity_matches_duty_cycle(
        config in forced_pattern_config(PatternType::Burst),
        entities in entities_strategy(),
    ) {
        let frames = 120u32;
        let (_, orchestrator) = run(&config, &entities, frames);
        let history = orchestrator.history();
        let Some(latest) = history.latest() else {
            return Err(TestCaseError::fail("no frames recorded"));
        };
        for tx in &latest.tx_configs {
            let PatternParams::Burst { on_frames, period_frames, .. } = tx.transmission_state.pattern else {
                return Err(TestCaseError::fail("expected burst pattern"));
            };
            let active = history.activity_series(&tx.id).iter().filter(|(_, on)| *on).count() as u32;
            let full_periods = frames / period_frames;
            let started_periods = frames.div_ceil(period_frames);
            prop_assert!(active >= full_periods * on_frames);
            prop_assert!(active <= started_periods * on_frames);
        }
    }

    #[test]
    fn test_tdma_never_activates_transmitters_sharing_spectrum(
        config in forced_pattern_config(PatternType::Scheduled),
        entities in entities_strategy(),
    ) {
        let (frames, _) = run(&config, &entities, 16);
        for frame in &frames {
            let layout = &frame.layout;
            let active = frame.active_ids();
            for (i, a) in active.iter().enumerate() {
                for b in &active[i + 1..] {
                    let overlap = layout.overlap_hz(a, b).unwrap_or(0.0);
                    prop_assert!(overlap <= TOLERANCE_HZ, "frame {}: {} and {} overlap", frame.frame_id, a, b);
                    let same_plan = layout.plan_of(a).is_some() && layout.plan_of(a) == layout.plan_of(b);
                    prop_assert!(!same_plan, "frame {}: {} and {} share a plan", frame.frame_id, a, b);
                }
            }
        }
    }

    #[test]
    fn test_continuous_transmitters_are_always_active(
        config in forced_pattern_config(PatternType::Continuous),
        entities in entities_strategy(),
    ) {
        let (frames, _) = run(&config, &entities, 8);
        for frame in &frames {
            prop_assert_eq!(frame.active_ids().len(), frame.tx_configs.len());
        }
    }
}
