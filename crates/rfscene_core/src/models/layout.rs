//! Scenario-wide spectrum layout and the record of degraded allocations.

use super::entity::ObservableRange;
use crate::config::AllocationStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Overlap below this many Hz is treated as touching, not overlapping.
pub const OVERLAP_TOLERANCE_HZ: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    /// Constraints could not be met; bandwidth clamped or overlap above the bound.
    AllocationInfeasible,
    /// Partial overlap was permitted, within `MaxOverlap`.
    OverlapRelaxed,
    /// Placement accepted without the requested guard band.
    PlacementDegraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AllocationIssue {
    pub kind: IssueKind,
    pub receiver_ids: Vec<String>,
    pub tx_ids: Vec<String>,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LayoutEntry {
    pub tx_id: String,
    pub center_frequency: f64,
    pub bandwidth: f64,
}

impl LayoutEntry {
    pub fn edges(&self) -> (f64, f64) {
        (self.center_frequency - self.bandwidth / 2.0, self.center_frequency + self.bandwidth / 2.0)
    }
}

/// One frequency plan: shared by every receiver (and every antenna of those
/// receivers) listed in `receiver_ids`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiverPlan {
    pub receiver_ids: Vec<String>,
    pub window: ObservableRange,
    pub tx_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalLayout {
    pub allocation_strategy: AllocationStrategy,
    pub entries: Vec<LayoutEntry>,
    pub plans: Vec<ReceiverPlan>,
    pub issues: Vec<AllocationIssue>,
    pub interference_threshold_dbm: f64,
}

impl GlobalLayout {
    pub fn new(allocation_strategy: AllocationStrategy, interference_threshold_dbm: f64) -> Self {
        Self {
            allocation_strategy,
            entries: Vec::new(),
            plans: Vec::new(),
            issues: Vec::new(),
            interference_threshold_dbm,
        }
    }

    pub fn entry(&self, tx_id: &str) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| e.tx_id == tx_id)
    }

    /// Spectral overlap of two transmitters in Hz; `None` if either is unknown.
    pub fn overlap_hz(&self, a: &str, b: &str) -> Option<f64> {
        let (a_lo, a_hi) = self.entry(a)?.edges();
        let (b_lo, b_hi) = self.entry(b)?.edges();
        Some((a_hi.min(b_hi) - a_lo.max(b_lo)).max(0.0))
    }

    /// Overlap relative to the narrower of the two bandwidths.
    pub fn overlap_fraction(&self, a: &str, b: &str) -> Option<f64> {
        let overlap = self.overlap_hz(a, b)?;
        let narrower = self.entry(a)?.bandwidth.min(self.entry(b)?.bandwidth);
        if narrower <= 0.0 {
            return Some(0.0);
        }
        Some(overlap / narrower)
    }

    /// Worst pairwise overlap fraction among transmitters sharing a plan.
    pub fn max_overlap_fraction(&self) -> f64 {
        let mut worst: f64 = 0.0;
        for plan in &self.plans {
            for (i, a) in plan.tx_ids.iter().enumerate() {
                for b in &plan.tx_ids[i + 1..] {
                    if let Some(frac) = self.overlap_fraction(a, b) {
                        worst = worst.max(frac);
                    }
                }
            }
        }
        worst
    }

    pub fn is_degraded(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn issues_of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &AllocationIssue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    /// Whether an `AllocationInfeasible` record names this transmitter.
    pub fn is_flagged_infeasible(&self, tx_id: &str) -> bool {
        self.issues_of_kind(IssueKind::AllocationInfeasible)
            .any(|issue| issue.tx_ids.iter().any(|id| id == tx_id))
    }

    pub fn plan_of(&self, tx_id: &str) -> Option<&ReceiverPlan> {
        self.plans.iter().find(|plan| plan.tx_ids.iter().any(|id| id == tx_id))
    }

    /// Group label per entry (entry order). Two transmitters share a group
    /// when they share a plan or their bands overlap, directly or through a
    /// chain of such links. Labels are the smallest entry index in the group.
    pub fn coordination_groups(&self) -> Vec<usize> {
        let mut parent: Vec<usize> = (0..self.entries.len()).collect();
        let index: BTreeMap<&str, usize> =
            self.entries.iter().enumerate().map(|(i, e)| (e.tx_id.as_str(), i)).collect();

        for plan in &self.plans {
            let mut members = plan.tx_ids.iter().filter_map(|id| index.get(id.as_str()).copied());
            if let Some(first) = members.next() {
                for other in members {
                    union(&mut parent, first, other);
                }
            }
        }
        for (i, a) in self.entries.iter().enumerate() {
            let (a_lo, a_hi) = a.edges();
            for (j, b) in self.entries.iter().enumerate().skip(i + 1) {
                let (b_lo, b_hi) = b.edges();
                if a_hi.min(b_hi) - a_lo.max(b_lo) > OVERLAP_TOLERANCE_HZ {
                    union(&mut parent, i, j);
                }
            }
        }
        (0..parent.len()).map(|i| find(&mut parent, i)).collect()
    }
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Keeps the smaller root so labels are stable.
fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}
