//! FrequencyAllocator: places every transmitter's band inside the observable
//! window of the receivers that serve it.
//!
//! Transmitters are grouped into plans by [`ReceiverAssociation`]; each plan
//! is placed by the configured [`PlacementStrategy`] and then audited the
//! same way whatever the strategy. Once every plan is placed, pairs from
//! different plans that one receiver observes together get the same audit.
//! Constraints that cannot be met never fail the scenario: the layout
//! carries an [`AllocationIssue`] instead.

pub mod optimized;
pub mod random;
pub mod receiver_centric;
pub mod spectrum;

use crate::config::{
    AllocationStrategy, FrequencyAllocationConfig, InterferenceManagementConfig,
    ReceiverAssociation, ScenarioConfig,
};
use crate::models::{
    AllocationIssue, GlobalLayout, IssueKind, LayoutEntry, ObservableRange, ReceiverEntity,
    ReceiverPlan, TransmitterEntity, OVERLAP_TOLERANCE_HZ,
};
use rand::RngCore;
use std::collections::BTreeSet;
use spectrum::{clamp_center, edge_gap, overlap_fraction, overlap_hz};
use tracing::{debug, info, warn};

pub use optimized::Optimized;
pub use random::RandomPlacement;
pub use receiver_centric::ReceiverCentric;

/// One plan's placement problem. `window` already excludes the guard bands.
#[derive(Debug, Clone)]
pub struct PlacementRequest<'a> {
    pub window: ObservableRange,
    pub bandwidths: &'a [f64],
    pub min_separation: f64,
    pub max_overlap: f64,
    pub collision_avoidance: bool,
    pub max_retries: u32,
    pub optimizer_trials: u32,
    pub optimizer_moves: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Centers indexed like the request's bandwidths.
    pub centers: Vec<f64>,
    /// Request indices accepted without meeting the constraints.
    pub exhausted: Vec<usize>,
}

pub trait PlacementStrategy {
    fn name(&self) -> &'static str;
    fn place(&self, request: &PlacementRequest, rng: &mut dyn RngCore) -> Placement;
}

pub fn strategy_for(strategy: AllocationStrategy) -> Box<dyn PlacementStrategy> {
    match strategy {
        AllocationStrategy::ReceiverCentric => Box::new(ReceiverCentric),
        AllocationStrategy::Optimized => Box::new(Optimized),
        AllocationStrategy::Random => Box::new(RandomPlacement),
    }
}

/// Where one transmitter ended up, plus what the power stage needs to know
/// about the receivers serving it.
#[derive(Debug, Clone, PartialEq)]
pub struct TxAssignment {
    pub center_frequency: f64,
    pub bandwidth: f64,
    pub sample_rate: f64,
    pub receiver_ids: Vec<String>,
    /// Index of the nearest serving receiver in the allocator's input.
    pub serving_receiver: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyPlan {
    pub layout: GlobalLayout,
    /// Indexed like the transmitters passed to `allocate`.
    pub assignments: Vec<TxAssignment>,
}

struct PlanGroup {
    receivers: Vec<usize>,
    window: ObservableRange,
    transmitters: Vec<usize>,
}

pub struct FrequencyAllocator<'a> {
    config: &'a FrequencyAllocationConfig,
    interference: &'a InterferenceManagementConfig,
}

impl<'a> FrequencyAllocator<'a> {
    pub fn new(config: &'a ScenarioConfig) -> Self {
        Self {
            config: &config.frequency_allocation,
            interference: &config.interference_management,
        }
    }

    /// `required` holds each transmitter's minimum bandwidth, same order as
    /// `transmitters`.
    pub fn allocate<R: RngCore>(
        &self,
        transmitters: &[TransmitterEntity],
        required: &[f64],
        receivers: &[ReceiverEntity],
        rng: &mut R,
    ) -> FrequencyPlan {
        let mut layout =
            GlobalLayout::new(self.config.strategy, self.interference.interference_threshold);
        let mut assignments: Vec<Option<TxAssignment>> = vec![None; transmitters.len()];

        if receivers.is_empty() {
            for (idx, tx) in transmitters.iter().enumerate() {
                let bandwidth = required.get(idx).copied().unwrap_or(0.0);
                warn!(id = %tx.id, "no receiver observes this transmitter");
                layout.issues.push(AllocationIssue {
                    kind: IssueKind::AllocationInfeasible,
                    receiver_ids: Vec::new(),
                    tx_ids: vec![tx.id.clone()],
                    detail: "no receiver observes this transmitter".to_string(),
                });
                assignments[idx] = Some(TxAssignment {
                    center_frequency: bandwidth / 2.0,
                    bandwidth,
                    sample_rate: bandwidth,
                    receiver_ids: Vec::new(),
                    serving_receiver: None,
                });
            }
        } else {
            let strategy = strategy_for(self.config.strategy);
            for group in self.groups(transmitters, receivers) {
                self.place_group(
                    &group,
                    transmitters,
                    required,
                    receivers,
                    strategy.as_ref(),
                    &mut layout,
                    &mut assignments,
                    rng,
                );
            }
        }

        let assignments: Vec<TxAssignment> = assignments.into_iter().flatten().collect();
        layout.entries = transmitters
            .iter()
            .zip(assignments.iter())
            .map(|(tx, a)| LayoutEntry {
                tx_id: tx.id.clone(),
                center_frequency: a.center_frequency,
                bandwidth: a.bandwidth,
            })
            .collect();
        if self.interference.enable_collision_avoidance && layout.plans.len() > 1 {
            self.audit_across_plans(receivers, &mut layout);
        }

        info!(
            strategy = ?self.config.strategy,
            transmitters = transmitters.len(),
            plans = layout.plans.len(),
            issues = layout.issues.len(),
            "frequency allocation complete"
        );
        FrequencyPlan { layout, assignments }
    }

    fn groups(&self, transmitters: &[TransmitterEntity], receivers: &[ReceiverEntity]) -> Vec<PlanGroup> {
        match self.config.association {
            ReceiverAssociation::AllReceivers => {
                let window = receivers
                    .iter()
                    .skip(1)
                    .fold(receivers[0].observable_range, |acc, rx| acc.intersect(&rx.observable_range));
                vec![PlanGroup {
                    receivers: (0..receivers.len()).collect(),
                    window,
                    transmitters: (0..transmitters.len()).collect(),
                }]
            }
            ReceiverAssociation::Nearest => {
                let mut groups: Vec<PlanGroup> = receivers
                    .iter()
                    .enumerate()
                    .map(|(idx, rx)| PlanGroup {
                        receivers: vec![idx],
                        window: rx.observable_range,
                        transmitters: Vec::new(),
                    })
                    .collect();
                for (tx_idx, tx) in transmitters.iter().enumerate() {
                    if let Some(rx_idx) = nearest(tx, receivers, 0..receivers.len()) {
                        groups[rx_idx].transmitters.push(tx_idx);
                    }
                }
                groups.retain(|g| !g.transmitters.is_empty());
                groups
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn place_group<R: RngCore>(
        &self,
        group: &PlanGroup,
        transmitters: &[TransmitterEntity],
        required: &[f64],
        receivers: &[ReceiverEntity],
        strategy: &dyn PlacementStrategy,
        layout: &mut GlobalLayout,
        assignments: &mut [Option<TxAssignment>],
        rng: &mut R,
    ) {
        let receiver_ids: Vec<String> =
            group.receivers.iter().map(|&i| receivers[i].id.clone()).collect();
        let tx_ids: Vec<String> =
            group.transmitters.iter().map(|&i| transmitters[i].id.clone()).collect();
        let sample_rate = group
            .receivers
            .iter()
            .map(|&i| receivers[i].sample_rate)
            .fold(f64::INFINITY, f64::min);

        let guard = self.config.guard_bands;
        let window = if group.window.width() - 2.0 * guard > 0.0 {
            ObservableRange { low: group.window.low + guard, high: group.window.high - guard }
        } else {
            if guard > 0.0 {
                warn!(receivers = ?receiver_ids, guard, "guard bands leave no usable spectrum");
                layout.issues.push(AllocationIssue {
                    kind: IssueKind::PlacementDegraded,
                    receiver_ids: receiver_ids.clone(),
                    tx_ids: tx_ids.clone(),
                    detail: format!("guard bands of {guard} Hz leave no usable spectrum"),
                });
            }
            group.window
        };

        let mut bandwidths = Vec::with_capacity(group.transmitters.len());
        for &tx_idx in &group.transmitters {
            let wanted = required.get(tx_idx).copied().unwrap_or(0.0);
            if wanted > window.width() {
                let id = &transmitters[tx_idx].id;
                warn!(id = %id, wanted, available = window.width(), "bandwidth clamped to window");
                layout.issues.push(AllocationIssue {
                    kind: IssueKind::AllocationInfeasible,
                    receiver_ids: receiver_ids.clone(),
                    tx_ids: vec![id.clone()],
                    detail: format!(
                        "required bandwidth {wanted} Hz exceeds usable window {} Hz",
                        window.width()
                    ),
                });
                bandwidths.push(window.width());
            } else {
                bandwidths.push(wanted);
            }
        }

        let total: f64 = bandwidths.iter().sum();
        let needed = total
            + bandwidths.len().saturating_sub(1) as f64 * self.config.min_separation;
        if self.interference.enable_collision_avoidance
            && self.config.max_overlap == 0.0
            && needed > window.width() + OVERLAP_TOLERANCE_HZ
        {
            warn!(receivers = ?receiver_ids, needed, available = window.width(), "plan oversubscribed");
            layout.issues.push(AllocationIssue {
                kind: IssueKind::AllocationInfeasible,
                receiver_ids: receiver_ids.clone(),
                tx_ids: tx_ids.clone(),
                detail: format!(
                    "bandwidth plus separation needs {needed} Hz, window holds {} Hz",
                    window.width()
                ),
            });
        }

        let request = PlacementRequest {
            window,
            bandwidths: &bandwidths,
            min_separation: self.config.min_separation,
            max_overlap: self.config.max_overlap,
            collision_avoidance: self.interference.enable_collision_avoidance,
            max_retries: self.config.max_retries,
            optimizer_trials: self.config.optimizer_trials,
            optimizer_moves: self.config.optimizer_moves,
        };
        let placement = strategy.place(&request, rng);
        debug!(strategy = strategy.name(), receivers = ?receiver_ids, "plan placed");

        for &pos in &placement.exhausted {
            layout.issues.push(AllocationIssue {
                kind: IssueKind::PlacementDegraded,
                receiver_ids: receiver_ids.clone(),
                tx_ids: vec![tx_ids[pos].clone()],
                detail: format!(
                    "no draw met the spacing constraints in {} retries",
                    self.config.max_retries
                ),
            });
        }

        let centers: Vec<f64> = placement
            .centers
            .iter()
            .zip(bandwidths.iter())
            .map(|(&c, &b)| clamp_center(&window, b, c))
            .collect();

        if self.interference.enable_collision_avoidance {
            self.audit(&tx_ids, &receiver_ids, &centers, &bandwidths, layout);
        }

        for (pos, &tx_idx) in group.transmitters.iter().enumerate() {
            assignments[tx_idx] = Some(TxAssignment {
                center_frequency: centers[pos],
                bandwidth: bandwidths[pos],
                sample_rate,
                receiver_ids: receiver_ids.clone(),
                serving_receiver: nearest(
                    &transmitters[tx_idx],
                    receivers,
                    group.receivers.iter().copied(),
                ),
            });
        }
        layout.plans.push(ReceiverPlan { receiver_ids, window: group.window, tx_ids });
    }

    /// Pairwise check shared by all strategies.
    fn audit(
        &self,
        tx_ids: &[String],
        receiver_ids: &[String],
        centers: &[f64],
        bandwidths: &[f64],
        layout: &mut GlobalLayout,
    ) {
        for i in 0..centers.len() {
            for j in i + 1..centers.len() {
                let pair = [tx_ids[i].as_str(), tx_ids[j].as_str()];
                let bands = [(centers[i], bandwidths[i]), (centers[j], bandwidths[j])];
                if let Some(issue) = self.pair_issue(pair, receiver_ids, bands) {
                    layout.issues.push(issue);
                }
            }
        }
    }

    /// Audits transmitters of different plans whose bands a receiver
    /// observes together. Each pair is reported once, against the first
    /// such receiver in input order.
    fn audit_across_plans(&self, receivers: &[ReceiverEntity], layout: &mut GlobalLayout) {
        let plan_index: Vec<Option<usize>> = layout
            .entries
            .iter()
            .map(|e| layout.plans.iter().position(|p| p.tx_ids.contains(&e.tx_id)))
            .collect();
        let mut checked = BTreeSet::new();
        let mut found = Vec::new();
        for rx in receivers {
            let window = rx.observable_range;
            let observed: Vec<usize> = layout
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| {
                    let (lo, hi) = e.edges();
                    hi.min(window.high) - lo.max(window.low) > OVERLAP_TOLERANCE_HZ
                })
                .map(|(i, _)| i)
                .collect();
            let receiver_ids = [rx.id.clone()];
            for (k, &i) in observed.iter().enumerate() {
                for &j in &observed[k + 1..] {
                    if plan_index[i] == plan_index[j] || !checked.insert((i, j)) {
                        continue;
                    }
                    let (a, b) = (&layout.entries[i], &layout.entries[j]);
                    let pair = [a.tx_id.as_str(), b.tx_id.as_str()];
                    let bands = [(a.center_frequency, a.bandwidth), (b.center_frequency, b.bandwidth)];
                    if let Some(issue) = self.pair_issue(pair, &receiver_ids, bands) {
                        found.push(issue);
                    }
                }
            }
        }
        if !found.is_empty() {
            debug!(issues = found.len(), "cross-plan audit recorded issues");
        }
        layout.issues.extend(found);
    }

    fn pair_issue(
        &self,
        pair: [&str; 2],
        receiver_ids: &[String],
        [(ci, bi), (cj, bj)]: [(f64, f64); 2],
    ) -> Option<AllocationIssue> {
        let max_overlap = self.config.max_overlap;
        let min_separation = self.config.min_separation;
        let overlap = overlap_hz(ci, bi, cj, bj);
        let tx_ids = vec![pair[0].to_string(), pair[1].to_string()];
        let (kind, detail) = if overlap > max_overlap * bi.min(bj) + OVERLAP_TOLERANCE_HZ {
            let fraction = overlap_fraction(ci, bi, cj, bj);
            warn!(pair = ?tx_ids, fraction, max_overlap, "overlap above bound");
            (
                IssueKind::AllocationInfeasible,
                format!("overlap fraction {fraction:.3} exceeds {max_overlap}"),
            )
        } else if overlap > OVERLAP_TOLERANCE_HZ {
            (IssueKind::OverlapRelaxed, format!("{overlap:.1} Hz overlap within bound"))
        } else {
            let gap = edge_gap(ci, bi, cj, bj);
            if gap >= min_separation - OVERLAP_TOLERANCE_HZ {
                return None;
            }
            (
                IssueKind::PlacementDegraded,
                format!("gap {gap:.1} Hz below minimum separation {min_separation}"),
            )
        };
        Some(AllocationIssue { kind, receiver_ids: receiver_ids.to_vec(), tx_ids, detail })
    }
}

/// Nearest receiver among `candidates`; ties keep the earliest.
fn nearest(
    tx: &TransmitterEntity,
    receivers: &[ReceiverEntity],
    candidates: impl Iterator<Item = usize>,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for idx in candidates {
        let d = tx.site.distance_to(&receivers[idx].site);
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((idx, d));
        }
    }
    best.map(|(idx, _)| idx)
}
