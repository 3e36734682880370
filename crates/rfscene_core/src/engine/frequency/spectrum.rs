//! Interval arithmetic over baseband placements and the score used to rank
//! candidate layouts.

use crate::models::{ObservableRange, OVERLAP_TOLERANCE_HZ};
use std::cmp::Ordering;

/// Overlap of two bands in Hz, zero when disjoint or touching.
pub fn overlap_hz(a_center: f64, a_bw: f64, b_center: f64, b_bw: f64) -> f64 {
    let lo = (a_center - a_bw / 2.0).max(b_center - b_bw / 2.0);
    let hi = (a_center + a_bw / 2.0).min(b_center + b_bw / 2.0);
    (hi - lo).max(0.0)
}

/// Overlap relative to the narrower band.
pub fn overlap_fraction(a_center: f64, a_bw: f64, b_center: f64, b_bw: f64) -> f64 {
    let narrower = a_bw.min(b_bw);
    if narrower <= 0.0 {
        return 0.0;
    }
    overlap_hz(a_center, a_bw, b_center, b_bw) / narrower
}

/// Distance between the facing edges; negative when the bands overlap.
pub fn edge_gap(a_center: f64, a_bw: f64, b_center: f64, b_bw: f64) -> f64 {
    let lo = (a_center - a_bw / 2.0).max(b_center - b_bw / 2.0);
    let hi = (a_center + a_bw / 2.0).min(b_center + b_bw / 2.0);
    lo - hi
}

/// Center range that keeps a band of `bandwidth` inside `window`.
pub fn center_bounds(window: &ObservableRange, bandwidth: f64) -> (f64, f64) {
    let lo = window.low + bandwidth / 2.0;
    let hi = window.high - bandwidth / 2.0;
    if hi < lo {
        let mid = (window.low + window.high) / 2.0;
        (mid, mid)
    } else {
        (lo, hi)
    }
}

pub fn clamp_center(window: &ObservableRange, bandwidth: f64, center: f64) -> f64 {
    let (lo, hi) = center_bounds(window, bandwidth);
    center.clamp(lo, hi)
}

/// Lexicographic quality of a layout: least total overlap first, then the
/// widest narrowest gap between spectrally adjacent bands, then the widest
/// mean spacing of centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementScore {
    pub total_overlap_hz: f64,
    pub min_adjacent_gap_hz: f64,
    pub mean_center_distance_hz: f64,
}

impl PlacementScore {
    pub fn of(centers: &[f64], bandwidths: &[f64]) -> Self {
        let n = centers.len();
        let mut total_overlap_hz = 0.0;
        let mut distance_sum = 0.0;
        let mut pairs = 0usize;
        for i in 0..n {
            for j in i + 1..n {
                total_overlap_hz += overlap_hz(centers[i], bandwidths[i], centers[j], bandwidths[j]);
                distance_sum += (centers[i] - centers[j]).abs();
                pairs += 1;
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| centers[a].total_cmp(&centers[b]));
        let min_adjacent_gap_hz = order
            .windows(2)
            .map(|w| edge_gap(centers[w[0]], bandwidths[w[0]], centers[w[1]], bandwidths[w[1]]))
            .fold(f64::INFINITY, f64::min);

        Self {
            total_overlap_hz,
            min_adjacent_gap_hz,
            mean_center_distance_hz: if pairs == 0 { 0.0 } else { distance_sum / pairs as f64 },
        }
    }

    /// `Ordering::Greater` when `self` is the better layout.
    pub fn compare(&self, other: &PlacementScore) -> Ordering {
        let tol = OVERLAP_TOLERANCE_HZ;
        if (self.total_overlap_hz - other.total_overlap_hz).abs() > tol {
            return other.total_overlap_hz.total_cmp(&self.total_overlap_hz);
        }
        if (self.min_adjacent_gap_hz - other.min_adjacent_gap_hz).abs() > tol {
            return self.min_adjacent_gap_hz.total_cmp(&other.min_adjacent_gap_hz);
        }
        if (self.mean_center_distance_hz - other.mean_center_distance_hz).abs() > tol {
            return self.mean_center_distance_hz.total_cmp(&other.mean_center_distance_hz);
        }
        Ordering::Equal
    }

    pub fn beats(&self, other: &PlacementScore) -> bool {
        self.compare(other) == Ordering::Greater
    }
}
