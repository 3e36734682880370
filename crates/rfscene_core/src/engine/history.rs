//! AllocationHistory: per-frame outputs keyed by frame id.

use crate::error::HistoryError;
use crate::models::FrameOutput;
use std::collections::BTreeMap;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Appended,
    /// The frame id was already stored; only transmission states changed.
    Refreshed,
}

#[derive(Debug, Clone, Default)]
pub struct AllocationHistory {
    frames: BTreeMap<u32, FrameOutput>,
    capacity: Option<usize>,
}

impl AllocationHistory {
    pub fn new(capacity: Option<usize>) -> Self {
        Self { frames: BTreeMap::new(), capacity }
    }

    /// Appends a newer frame, refreshes an existing one, rejects an older
    /// unseen one. Eviction drops the oldest frame once `capacity` is hit.
    pub fn record(&mut self, output: FrameOutput) -> Result<RecordOutcome, HistoryError> {
        let frame_id = output.frame_id;
        if let Some(existing) = self.frames.get_mut(&frame_id) {
            for tx in &mut existing.tx_configs {
                if let Some(fresh) = output.tx(&tx.id) {
                    tx.transmission_state = fresh.transmission_state.clone();
                }
            }
            trace!(frame_id, "history entry refreshed");
            return Ok(RecordOutcome::Refreshed);
        }
        if let Some(last) = self.latest_id() {
            if frame_id < last {
                return Err(HistoryError::OutOfOrder { frame_id, last });
            }
        }

        self.frames.insert(frame_id, output);
        if let Some(capacity) = self.capacity {
            while self.frames.len() > capacity {
                if let Some((evicted, _)) = self.frames.pop_first() {
                    debug!(evicted, "history capacity reached, oldest frame evicted");
                }
            }
        }
        Ok(RecordOutcome::Appended)
    }

    pub fn get(&self, frame_id: u32) -> Option<&FrameOutput> {
        self.frames.get(&frame_id)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame_ids(&self) -> Vec<u32> {
        self.frames.keys().copied().collect()
    }

    fn latest_id(&self) -> Option<u32> {
        self.frames.keys().next_back().copied()
    }

    pub fn latest(&self) -> Option<&FrameOutput> {
        self.frames.values().next_back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameOutput> {
        self.frames.values()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// `(frame_id, active)` for every stored frame that carries `tx_id`.
    pub fn activity_series(&self, tx_id: &str) -> Vec<(u32, bool)> {
        self.frames
            .values()
            .filter_map(|frame| frame.tx(tx_id).map(|tx| (frame.frame_id, tx.transmission_state.active)))
            .collect()
    }

    /// Fraction of stored frames in which `tx_id` was active.
    pub fn duty_cycle(&self, tx_id: &str) -> Option<f64> {
        let series = self.activity_series(tx_id);
        if series.is_empty() {
            return None;
        }
        let active = series.iter().filter(|(_, on)| *on).count();
        Some(active as f64 / series.len() as f64)
    }

    /// Frame ids whose scenario-fixed content differs from the oldest stored
    /// frame. Empty when the scenario stayed invariant.
    pub fn verify_scenario_invariance(&self) -> Vec<u32> {
        let Some(reference) = self.frames.values().next() else {
            return Vec::new();
        };
        self.frames
            .values()
            .skip(1)
            .filter(|frame| {
                frame.tx_configs.len() != reference.tx_configs.len()
                    || frame.rx_configs != reference.rx_configs
                    || frame.layout != reference.layout
                    || frame
                        .tx_configs
                        .iter()
                        .any(|tx| reference.tx(&tx.id).map_or(true, |r| !r.same_fixed_fields(tx)))
            })
            .map(|frame| frame.frame_id)
            .collect()
    }
}
