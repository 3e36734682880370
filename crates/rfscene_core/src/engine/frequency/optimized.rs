//! Multi-start search over placements.
//!
//! Trial 0 starts from the receiver-centric packing; every other trial packs
//! a random permutation, splitting the leftover spectrum with a symmetric
//! Dirichlet draw. Each trial then runs `OptimizerMoves` relocation moves,
//! keeping a move only when it improves the [`PlacementScore`]. The best
//! trial wins; ties keep the earliest, so the result is never worse than the
//! receiver-centric packing.
//!
//! Stream consumption per trial `t >= 1`: permutation shuffle, then `n + 1`
//! Dirichlet weights when the bands fit. Per move: transmitter index, then
//! one uniform for its new center.

use super::receiver_centric::{pack, place_with_gaps, spectral_order};
use super::spectrum::{center_bounds, PlacementScore};
use super::{Placement, PlacementRequest, PlacementStrategy};
use crate::engine::rng::draw_in;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use rand_distr::{Dirichlet, Distribution};
use tracing::trace;

const DIRICHLET_ALPHA: f64 = 1.0;

pub struct Optimized;

impl PlacementStrategy for Optimized {
    fn name(&self) -> &'static str {
        "Optimized"
    }

    fn place(&self, request: &PlacementRequest, rng: &mut dyn RngCore) -> Placement {
        let n = request.bandwidths.len();
        if n == 0 {
            return Placement { centers: Vec::new(), exhausted: Vec::new() };
        }

        let mut best: Option<(Vec<f64>, PlacementScore)> = None;
        for trial in 0..request.optimizer_trials.max(1) {
            let start = if trial == 0 {
                pack(
                    &request.window,
                    request.bandwidths,
                    &spectral_order(request.bandwidths),
                    request.min_separation,
                )
            } else {
                random_start(request, rng)
            };
            let (centers, score) = hill_climb(request, start, rng);
            trace!(trial, overlap_hz = score.total_overlap_hz, "optimizer trial done");
            let better = match &best {
                Some((_, incumbent)) => score.beats(incumbent),
                None => true,
            };
            if better {
                best = Some((centers, score));
            }
        }

        Placement {
            centers: best.map(|(centers, _)| centers).unwrap_or_default(),
            exhausted: Vec::new(),
        }
    }
}

fn random_start(request: &PlacementRequest, rng: &mut dyn RngCore) -> Vec<f64> {
    let bandwidths = request.bandwidths;
    let n = bandwidths.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let total: f64 = bandwidths.iter().sum();
    let slack = request.window.width() - total - (n - 1) as f64 * request.min_separation;
    if slack < 0.0 {
        return pack(&request.window, bandwidths, &order, request.min_separation);
    }

    let weights = match Dirichlet::new_with_size(DIRICHLET_ALPHA, n + 1) {
        Ok(dist) => dist.sample(rng),
        Err(_) => vec![1.0 / (n + 1) as f64; n + 1],
    };
    let gaps: Vec<f64> =
        weights[1..n].iter().map(|w| request.min_separation + w * slack).collect();
    place_with_gaps(&request.window, bandwidths, &order, weights[0] * slack, &gaps)
}

fn hill_climb(
    request: &PlacementRequest,
    mut centers: Vec<f64>,
    rng: &mut dyn RngCore,
) -> (Vec<f64>, PlacementScore) {
    let bandwidths = request.bandwidths;
    let mut score = PlacementScore::of(&centers, bandwidths);
    for _ in 0..request.optimizer_moves {
        let idx = rng.gen_range(0..centers.len());
        let (lo, hi) = center_bounds(&request.window, bandwidths[idx]);
        let previous = centers[idx];
        centers[idx] = draw_in(rng, [lo, hi]);
        let candidate = PlacementScore::of(&centers, bandwidths);
        if candidate.beats(&score) {
            score = candidate;
        } else {
            centers[idx] = previous;
        }
    }
    (centers, score)
}
