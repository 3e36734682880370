//! ScenarioOrchestrator: owns the scenario-fixed allocation and drives the
//! per-frame pipeline.
//!
//! The first `step` of a scenario classifies the entities and runs the
//! receiver, modulation, frequency, power and pattern stages in that order,
//! each on its own PRNG stream. Every later `step` only re-evaluates
//! transmission activity for the frame and records the output.

use super::classifier::EntityClassifier;
use super::frequency::FrequencyAllocator;
use super::history::{AllocationHistory, RecordOutcome};
use super::modulation::ModulationSelector;
use super::power::{array_gain_db, PowerContext, PowerController};
use super::receiver::ReceiverConfigurator;
use super::rng::{stream_rng, RngStream};
use super::scheduler::TransmissionScheduler;
use crate::config::{FactoryConfig, ScenarioConfig};
use crate::error::Result;
use crate::models::{
    EnvironmentEntity, FrameOutput, GlobalLayout, ReceiverEntity, RxConfig, TransmitterEntity,
    TxConfig,
};
use tracing::{debug, info, info_span, warn, Dispatch};

/// Everything fixed for the lifetime of one scenario.
#[derive(Debug, Clone)]
struct ScenarioState {
    population: Vec<String>,
    transmitters: Vec<TransmitterEntity>,
    receivers: Vec<ReceiverEntity>,
    /// Frame-independent part of each transmitter's output.
    tx_templates: Vec<TxConfig>,
    rx_configs: Vec<RxConfig>,
    layout: GlobalLayout,
}

pub struct ScenarioOrchestrator {
    config: ScenarioConfig,
    state: Option<ScenarioState>,
    history: AllocationHistory,
    dispatch: Option<Dispatch>,
}

impl ScenarioOrchestrator {
    /// Rejects an invalid configuration up front. Factory cross-checks run
    /// at the first `step`, when the factory is known.
    pub fn new(config: ScenarioConfig) -> Result<Self> {
        config.validate()?;
        let history = AllocationHistory::new(config.history.capacity);
        Ok(Self { config, state: None, history, dispatch: None })
    }

    /// Routes this orchestrator's log events to `dispatch` instead of the
    /// global subscriber.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn history(&self) -> &AllocationHistory {
        &self.history
    }

    pub fn layout(&self) -> Option<&GlobalLayout> {
        self.state.as_ref().map(|s| &s.layout)
    }

    pub fn receivers(&self) -> Option<&[ReceiverEntity]> {
        self.state.as_ref().map(|s| s.receivers.as_slice())
    }

    pub fn transmitters(&self) -> Option<&[TransmitterEntity]> {
        self.state.as_ref().map(|s| s.transmitters.as_slice())
    }

    /// Scenario-fixed transmitter configurations; activity fields reflect
    /// frame 0.
    pub fn scenario_fixed(&self) -> Option<&[TxConfig]> {
        self.state.as_ref().map(|s| s.tx_templates.as_slice())
    }

    /// Produces the output for `frame_id`, initializing the scenario on the
    /// first call. Only configuration errors are returned.
    pub fn step(
        &mut self,
        frame_id: u32,
        entities: &[EnvironmentEntity],
        factory: &FactoryConfig,
    ) -> Result<FrameOutput> {
        match self.dispatch.clone() {
            Some(dispatch) => tracing::dispatcher::with_default(&dispatch, || {
                self.step_inner(frame_id, entities, factory)
            }),
            None => self.step_inner(frame_id, entities, factory),
        }
    }

    /// Discards every scenario-owned value; the next `step` starts a new
    /// scenario, with `seed` when given.
    pub fn reset(&mut self, seed: Option<u64>) {
        if let Some(seed) = seed {
            self.config.seed = seed;
        }
        self.state = None;
        self.history.clear();
        info!(seed = self.config.seed, "scenario reset");
    }

    fn step_inner(
        &mut self,
        frame_id: u32,
        entities: &[EnvironmentEntity],
        factory: &FactoryConfig,
    ) -> Result<FrameOutput> {
        let span = info_span!("scenario_step", frame_id);
        let _enter = span.enter();

        let state = match self.state.take() {
            Some(state) => {
                let population = EntityClassifier::classify(entities).population();
                if population != state.population {
                    warn!(
                        expected = state.population.len(),
                        got = population.len(),
                        "entity population changed mid-scenario, keeping the initial allocation"
                    );
                }
                state
            }
            None => initialize(&self.config, entities, factory)?,
        };

        let tx_configs = state
            .tx_templates
            .iter()
            .map(|template| {
                let mut tx = template.clone();
                tx.transmission_state =
                    TransmissionScheduler::state_at(&template.transmission_state.pattern, frame_id);
                tx
            })
            .collect();
        let output = FrameOutput {
            frame_id,
            tx_configs,
            rx_configs: state.rx_configs.clone(),
            layout: state.layout.clone(),
        };
        self.state = Some(state);

        match self.history.record(output.clone()) {
            Ok(RecordOutcome::Appended) => {}
            Ok(RecordOutcome::Refreshed) => debug!("frame re-stepped, activity refreshed"),
            Err(err) => warn!(%err, "frame not recorded"),
        }
        debug!(active = output.active_ids().len(), "frame produced");
        Ok(output)
    }
}

fn initialize(
    config: &ScenarioConfig,
    entities: &[EnvironmentEntity],
    factory: &FactoryConfig,
) -> Result<ScenarioState> {
    config.validate_against(factory)?;
    let seed = config.seed;
    let classified = EntityClassifier::classify(entities);
    let population = classified.population();
    let transmitters = classified.transmitters;

    let receivers = ReceiverConfigurator::new(factory)
        .configure_all(&classified.receivers, &mut stream_rng(seed, RngStream::Receivers));

    let selector = ModulationSelector::new(&config.modulation_selection, factory);
    let mut modulation_rng = stream_rng(seed, RngStream::Modulation);
    let modulations: Vec<_> =
        transmitters.iter().map(|tx| selector.select(tx, &mut modulation_rng)).collect();
    let required: Vec<f64> = modulations.iter().map(|m| m.required_bandwidth).collect();

    let plan = FrequencyAllocator::new(config).allocate(
        &transmitters,
        &required,
        &receivers,
        &mut stream_rng(seed, RngStream::Frequency),
    );

    let distances: Vec<Option<f64>> = transmitters
        .iter()
        .zip(plan.assignments.iter())
        .map(|(tx, a)| a.serving_receiver.map(|idx| tx.site.distance_to(&receivers[idx].site)))
        .collect();
    let distance_span_m = distances.iter().flatten().fold(None, |span, &d| match span {
        None => Some((d, d)),
        Some((lo, hi)) => Some((f64::min(lo, d), f64::max(hi, d))),
    });
    let power = PowerController::new(&config.power_control, factory);

    let group_of = plan.layout.coordination_groups();
    let patterns = TransmissionScheduler::new(config)
        .draw_patterns(&group_of, &mut stream_rng(seed, RngStream::Pattern));

    let mut tx_templates = Vec::with_capacity(transmitters.len());
    for (idx, tx) in transmitters.iter().enumerate() {
        let assignment = &plan.assignments[idx];
        let serving = assignment.serving_receiver.map(|i| &receivers[i]);
        let ctx = PowerContext {
            distance_m: distances[idx],
            distance_span_m: distance_span_m.unwrap_or((0.0, 0.0)),
            receiver_sensitivity_dbm: serving.map_or(0.0, |rx| rx.sensitivity),
            receiver_gain_db: serving.map_or(0.0, |rx| array_gain_db(rx.num_antennas)),
            center_frequency: assignment.center_frequency,
        };
        let power_config = power.assign(tx, &ctx);
        tx_templates.push(TxConfig {
            id: tx.id.clone(),
            carrier_frequency: assignment.center_frequency,
            bandwidth: assignment.bandwidth,
            sample_rate: assignment.sample_rate,
            transmit_power: power_config.transmit_power_dbm,
            modulation_config: modulations[idx].clone(),
            power_config,
            transmission_state: TransmissionScheduler::state_at(&patterns[idx], 0),
            site_config: tx.site.clone(),
            parent_transmitter_type: tx.transmitter_type.clone(),
            impairment_model_type: tx.impairment_model_type.clone(),
            receiver_ids: assignment.receiver_ids.clone(),
        });
    }

    let rx_configs = receivers.iter().map(ReceiverEntity::to_rx_config).collect();
    info!(
        seed,
        transmitters = transmitters.len(),
        receivers = receivers.len(),
        ignored = classified.ignored,
        degraded = plan.layout.is_degraded(),
        "scenario initialized"
    );

    Ok(ScenarioState {
        population,
        transmitters,
        receivers,
        tx_templates,
        rx_configs,
        layout: plan.layout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModulationFamilySpec, ModulationStrategy};
    use crate::models::{ModulationFamily, SchemeId, Site};
    use std::collections::BTreeMap;

    fn qam_factory() -> FactoryConfig {
        let mut modulation = BTreeMap::new();
        modulation.insert(
            ModulationFamily::Qam,
            ModulationFamilySpec {
                orders: vec![16],
                symbol_rate_range: [160e3, 160e3],
                rolloff_range: [0.25, 0.25],
                ..ModulationFamilySpec::default()
            },
        );
        FactoryConfig { modulation, ..FactoryConfig::default() }
    }

    fn three_tx_one_rx() -> Vec<EnvironmentEntity> {
        vec![
            EnvironmentEntity::transmitter("tx1", Site::at(10.0, 0.0, 0.0)),
            EnvironmentEntity::transmitter("tx2", Site::at(0.0, 20.0, 0.0)),
            EnvironmentEntity::transmitter("tx3", Site::at(-30.0, 0.0, 0.0)),
            EnvironmentEntity::receiver("rx1", Site::at(0.0, 0.0, 0.0)).with_sample_rate(1e6),
        ]
    }

    fn separated_config() -> ScenarioConfig {
        let mut cfg = ScenarioConfig::always_on().with_seed(17);
        cfg.frequency_allocation.min_separation = 100e3;
        cfg
    }

    #[test]
    fn test_three_transmitters_single_receiver() {
        let factory = qam_factory();
        let entities = three_tx_one_rx();
        let mut orchestrator = ScenarioOrchestrator::new(separated_config()).unwrap();
        assert!(!orchestrator.is_initialized());

        for frame_id in 1..=10 {
            let out = orchestrator.step(frame_id, &entities, &factory).unwrap();
            assert_eq!(out.tx_configs.len(), 3);
            assert_eq!(out.rx_configs.len(), 1);
            assert_eq!(out.active_ids().len(), 3);

            let mut centers: Vec<f64> = out.tx_configs.iter().map(|t| t.carrier_frequency).collect();
            centers.sort_by(f64::total_cmp);
            for pair in centers.windows(2) {
                assert!(pair[1] - pair[0] >= 300e3 - 1e-6);
            }
            for tx in &out.tx_configs {
                assert!((tx.bandwidth - 200e3).abs() < 1e-6);
                assert!(tx.carrier_frequency - 100e3 >= 0.0);
                assert!(tx.carrier_frequency + 100e3 <= 1e6);
                assert_eq!(tx.sample_rate, 1e6);
            }
        }
        assert!(orchestrator.is_initialized());
        assert_eq!(orchestrator.history().len(), 10);
        assert!(orchestrator.history().verify_scenario_invariance().is_empty());
        assert_eq!(orchestrator.history().duty_cycle("tx2"), Some(1.0));
    }

    #[test]
    fn test_same_seed_same_frames() {
        let factory = FactoryConfig::default();
        let entities = three_tx_one_rx();
        let config = ScenarioConfig::dense_spectrum().with_seed(99);
        let mut a = ScenarioOrchestrator::new(config.clone()).unwrap();
        let mut b = ScenarioOrchestrator::new(config).unwrap();
        for frame_id in 1..=20 {
            assert_eq!(
                a.step(frame_id, &entities, &factory).unwrap(),
                b.step(frame_id, &entities, &factory).unwrap()
            );
        }
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut cfg = ScenarioConfig::default();
        cfg.power_control.power_range = [30.0, 0.0];
        assert!(ScenarioOrchestrator::new(cfg).is_err());
    }

    #[test]
    fn test_undeclared_fixed_scheme_fails_first_step() {
        let mut cfg = ScenarioConfig::default();
        cfg.modulation_selection.strategy = ModulationStrategy::Fixed;
        cfg.modulation_selection.fixed_scheme = Some(SchemeId::new(ModulationFamily::Psk, 4));
        let mut orchestrator = ScenarioOrchestrator::new(cfg).unwrap();
        let err = orchestrator.step(1, &three_tx_one_rx(), &qam_factory()).unwrap_err();
        assert!(err.is_configuration());
        assert!(!orchestrator.is_initialized());
    }

    #[test]
    fn test_out_of_order_frame_still_returns_output() {
        let factory = FactoryConfig::default();
        let entities = three_tx_one_rx();
        let mut orchestrator = ScenarioOrchestrator::new(ScenarioConfig::default()).unwrap();
        orchestrator.step(5, &entities, &factory).unwrap();
        let late = orchestrator.step(3, &entities, &factory).unwrap();
        assert_eq!(late.frame_id, 3);
        assert_eq!(orchestrator.history().frame_ids(), vec![5]);
    }

    #[test]
    fn test_population_change_keeps_scenario() {
        let factory = FactoryConfig::default();
        let mut entities = three_tx_one_rx();
        let mut orchestrator = ScenarioOrchestrator::new(ScenarioConfig::default()).unwrap();
        let first = orchestrator.step(1, &entities, &factory).unwrap();
        entities.push(EnvironmentEntity::transmitter("late", Site::at(1.0, 1.0, 0.0)));
        let second = orchestrator.step(2, &entities, &factory).unwrap();
        assert_eq!(second.tx_configs.len(), first.tx_configs.len());
        assert!(second.tx("late").is_none());
    }

    #[test]
    fn test_reset_starts_a_new_scenario() {
        let factory = FactoryConfig::default();
        let entities = three_tx_one_rx();
        let mut orchestrator = ScenarioOrchestrator::new(ScenarioConfig::default()).unwrap();
        orchestrator.step(1, &entities, &factory).unwrap();
        orchestrator.reset(Some(1234));
        assert!(!orchestrator.is_initialized());
        assert!(orchestrator.history().is_empty());
        assert_eq!(orchestrator.seed(), 1234);

        let fresh = orchestrator.step(1, &entities, &factory).unwrap();
        let mut replay = ScenarioOrchestrator::new(ScenarioConfig::default().with_seed(1234)).unwrap();
        assert_eq!(fresh, replay.step(1, &entities, &factory).unwrap());
    }

    #[test]
    fn test_runs_under_injected_dispatch() {
        let factory = FactoryConfig::default();
        let mut orchestrator = ScenarioOrchestrator::new(ScenarioConfig::default())
            .unwrap()
            .with_dispatch(Dispatch::none());
        let out = orchestrator.step(1, &three_tx_one_rx(), &factory).unwrap();
        assert_eq!(out.tx_configs.len(), 3);
        assert!(orchestrator.scenario_fixed().is_some());
    }

    #[test]
    fn test_tdma_separates_overlapping_transmitters_of_different_plans() {
        let mut cfg = ScenarioConfig::default().with_seed(1);
        cfg.frequency_allocation.association = crate::config::ReceiverAssociation::Nearest;
        cfg.transmission_pattern.default_type = Some(crate::config::PatternType::Scheduled);
        let entities = vec![
            EnvironmentEntity::transmitter("a", Site::at(1.0, 0.0, 0.0)),
            EnvironmentEntity::transmitter("b", Site::at(99.0, 0.0, 0.0)),
            EnvironmentEntity::receiver("r1", Site::at(0.0, 0.0, 0.0)).with_sample_rate(1e6),
            EnvironmentEntity::receiver("r2", Site::at(100.0, 0.0, 0.0)).with_sample_rate(1e6),
        ];
        let factory = FactoryConfig::default();
        let mut orchestrator = ScenarioOrchestrator::new(cfg).unwrap();
        for frame_id in 1..=16 {
            let out = orchestrator.step(frame_id, &entities, &factory).unwrap();
            assert_eq!(out.layout.plans.len(), 2);
            assert!(out.layout.overlap_hz("a", "b").unwrap() > 0.0);
            assert!(out.active_ids().len() <= 1, "frame {frame_id}: {:?}", out.active_ids());
        }
        let layout = orchestrator.layout().unwrap();
        assert!(layout.is_flagged_infeasible("a") && layout.is_flagged_infeasible("b"));
        assert_eq!(orchestrator.history().duty_cycle("a"), Some(0.25));
        assert_eq!(orchestrator.history().duty_cycle("b"), Some(0.25));
    }

    #[test]
    fn test_no_receivers_degrades_instead_of_failing() {
        let factory = FactoryConfig::default();
        let entities = vec![EnvironmentEntity::transmitter("solo", Site::at(0.0, 0.0, 0.0))];
        let mut orchestrator = ScenarioOrchestrator::new(ScenarioConfig::default()).unwrap();
        let out = orchestrator.step(1, &entities, &factory).unwrap();
        assert!(out.layout.is_flagged_infeasible("solo"));
        assert!(out.rx_configs.is_empty());
    }
}
