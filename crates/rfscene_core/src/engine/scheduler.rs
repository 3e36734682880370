//! TransmissionScheduler: draws each transmitter's temporal pattern once per
//! scenario and evaluates its activity for any frame.
//!
//! Draw order on the pattern stream, per transmitter in input order: type
//! (unless `DefaultType` forces one); Burst then draws duration, period, duty
//! cycle and phase offset; Scheduled draws its slot only under Random
//! coordination. TDMA slots are assigned afterwards, round-robin inside each
//! coordination group (shared plan or overlapping bands), and consume nothing.

use super::rng::draw_in;
use crate::config::{PatternType, ScenarioConfig, SlotCoordination, TransmissionPatternConfig};
use crate::models::{PatternParams, TransmissionState};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub struct TransmissionScheduler<'a> {
    config: &'a TransmissionPatternConfig,
    coordination: SlotCoordination,
}

impl<'a> TransmissionScheduler<'a> {
    pub fn new(config: &'a ScenarioConfig) -> Self {
        Self { config: &config.transmission_pattern, coordination: config.slot_coordination() }
    }

    /// `group_of[i]` is transmitter `i`'s coordination group (see
    /// [`crate::models::GlobalLayout::coordination_groups`]); TDMA keeps
    /// slots disjoint inside a group.
    pub fn draw_patterns<R: Rng + ?Sized>(&self, group_of: &[usize], rng: &mut R) -> Vec<PatternParams> {
        let weights = match WeightedIndex::new(self.config.type_distribution) {
            Ok(weights) => Some(weights),
            Err(err) => {
                if self.config.default_type.is_none() {
                    warn!(%err, "unusable type distribution, every transmitter is Continuous");
                }
                None
            }
        };
        let base_slots = self.config.scheduled.num_slots();

        let mut patterns: Vec<PatternParams> = group_of
            .iter()
            .map(|_| {
                let pattern_type = match (self.config.default_type, &weights) {
                    (Some(forced), _) => forced,
                    (None, Some(weights)) => PatternType::ALL[weights.sample(rng)],
                    (None, None) => PatternType::Continuous,
                };
                match pattern_type {
                    PatternType::Continuous => PatternParams::Continuous,
                    PatternType::Burst => self.draw_burst(rng),
                    PatternType::Scheduled => {
                        let slot_index = match self.coordination {
                            SlotCoordination::Random => rng.gen_range(0..base_slots),
                            SlotCoordination::Tdma => 0,
                        };
                        PatternParams::Scheduled {
                            slot_index,
                            num_slots: base_slots,
                            coordination: self.coordination,
                        }
                    }
                }
            })
            .collect();

        if self.coordination == SlotCoordination::Tdma {
            assign_tdma_slots(&mut patterns, group_of, base_slots);
        }
        patterns
    }

    fn draw_burst<R: Rng + ?Sized>(&self, rng: &mut R) -> PatternParams {
        let burst = &self.config.burst;
        let frame = self.config.frame_duration;
        let duration = draw_in(rng, burst.duration_range);
        let period = draw_in(rng, burst.period_range);
        let duty_cycle = draw_in(rng, burst.duty_cycle_range);
        let period_frames = ((period / frame).round() as u32).max(1);
        let on_frames = ((duty_cycle * period / frame).round() as u32).min(period_frames);
        let phase_offset = rng.gen_range(0..period_frames);
        PatternParams::Burst { duration, period, duty_cycle, on_frames, period_frames, phase_offset }
    }

    /// Activity of a pattern at `frame_id`. Pure.
    pub fn state_at(pattern: &PatternParams, frame_id: u32) -> TransmissionState {
        let (active, phase) = match pattern {
            PatternParams::Continuous => (true, 0),
            PatternParams::Burst { on_frames, period_frames, phase_offset, .. } => {
                let period = (*period_frames).max(1) as u64;
                let phase = ((frame_id as u64 + *phase_offset as u64) % period) as u32;
                (phase < *on_frames, phase)
            }
            PatternParams::Scheduled { slot_index, num_slots, .. } => {
                let slot = frame_id % (*num_slots).max(1);
                (slot == *slot_index, slot)
            }
        };
        TransmissionState { pattern: pattern.clone(), active, phase }
    }
}

fn assign_tdma_slots(patterns: &mut [PatternParams], group_of: &[usize], base_slots: u32) {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, pattern) in patterns.iter().enumerate() {
        if matches!(pattern, PatternParams::Scheduled { .. }) {
            groups.entry(group_of[idx]).or_default().push(idx);
        }
    }
    for (group, members) in groups {
        let count = members.len() as u32;
        let slots = base_slots.max(count);
        if slots > base_slots {
            info!(group, scheduled = count, slots, "more scheduled transmitters than slots, frame grown");
        }
        for (k, idx) in members.into_iter().enumerate() {
            patterns[idx] = PatternParams::Scheduled {
                slot_index: k as u32 % slots,
                num_slots: slots,
                coordination: SlotCoordination::Tdma,
            };
        }
    }
}
