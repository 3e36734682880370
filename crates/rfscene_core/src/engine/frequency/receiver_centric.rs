//! Deterministic packing inside a receiver window.
//!
//! Transmitters are laid out low to high, widest first (ties keep request
//! order). When everything fits with `MinSeparation`, the leftover spectrum
//! is spread evenly over the `n + 1` gaps. When it does not, bands are packed
//! edge to edge with a uniform reduced gap, or, past that, with overlap
//! shared between adjacent pairs in proportion to the narrower bandwidth.

use super::{Placement, PlacementRequest, PlacementStrategy};
use crate::models::ObservableRange;
use rand::RngCore;

pub struct ReceiverCentric;

impl PlacementStrategy for ReceiverCentric {
    fn name(&self) -> &'static str {
        "ReceiverCentric"
    }

    fn place(&self, request: &PlacementRequest, _rng: &mut dyn RngCore) -> Placement {
        let order = spectral_order(request.bandwidths);
        Placement {
            centers: pack(&request.window, request.bandwidths, &order, request.min_separation),
            exhausted: Vec::new(),
        }
    }
}

/// Indices sorted by descending bandwidth, stable on ties.
pub(super) fn spectral_order(bandwidths: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..bandwidths.len()).collect();
    order.sort_by(|&a, &b| bandwidths[b].total_cmp(&bandwidths[a]));
    order
}

/// Packs `order` low to high; returns centers indexed like `bandwidths`.
pub(super) fn pack(
    window: &ObservableRange,
    bandwidths: &[f64],
    order: &[usize],
    min_separation: f64,
) -> Vec<f64> {
    let n = order.len();
    let width = window.width();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        let mut centers = vec![0.0; bandwidths.len()];
        centers[order[0]] = (window.low + window.high) / 2.0;
        return centers;
    }

    let total: f64 = order.iter().map(|&i| bandwidths[i]).sum();
    let needed = total + (n - 1) as f64 * min_separation;

    if needed <= width {
        let share = (width - needed) / (n + 1) as f64;
        let gaps = vec![min_separation + share; n - 1];
        return place_with_gaps(window, bandwidths, order, share, &gaps);
    }

    if total <= width {
        let gap = (width - total) / (n - 1) as f64;
        return place_with_gaps(window, bandwidths, order, 0.0, &vec![gap; n - 1]);
    }

    let deficit = total - width;
    let narrower: Vec<f64> =
        order.windows(2).map(|w| bandwidths[w[0]].min(bandwidths[w[1]])).collect();
    let narrower_sum: f64 = narrower.iter().sum();
    let gaps: Vec<f64> = narrower
        .iter()
        .map(|&m| {
            if narrower_sum > 0.0 {
                -(deficit * m / narrower_sum).min(m)
            } else {
                0.0
            }
        })
        .collect();
    place_with_gaps(window, bandwidths, order, 0.0, &gaps)
}

/// Walks `order` from `window.low + leading`, advancing by each bandwidth
/// plus the gap that follows it. Negative gaps overlap neighbours.
pub(super) fn place_with_gaps(
    window: &ObservableRange,
    bandwidths: &[f64],
    order: &[usize],
    leading: f64,
    gaps: &[f64],
) -> Vec<f64> {
    let mut centers = vec![0.0; bandwidths.len()];
    let mut edge = window.low + leading;
    for (pos, &idx) in order.iter().enumerate() {
        centers[idx] = edge + bandwidths[idx] / 2.0;
        edge += bandwidths[idx] + gaps.get(pos).copied().unwrap_or(0.0);
    }
    centers
}
