//! Uniform random placement with bounded retries.
//!
//! Transmitters are placed in request order. Each draw is one uniform center
//! inside the window; it is accepted when it keeps `MinSeparation` from every
//! band already placed (or, with `MaxOverlap > 0`, stays within the overlap
//! bound). After `MaxRetries` failed draws the last one is kept and the
//! transmitter is reported as exhausted. Without collision avoidance every
//! transmitter takes its first draw.

use super::spectrum::{center_bounds, edge_gap, overlap_hz};
use super::{Placement, PlacementRequest, PlacementStrategy};
use crate::engine::rng::draw_in;
use crate::models::OVERLAP_TOLERANCE_HZ;
use rand::RngCore;

pub struct RandomPlacement;

impl PlacementStrategy for RandomPlacement {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn place(&self, request: &PlacementRequest, rng: &mut dyn RngCore) -> Placement {
        let bandwidths = request.bandwidths;
        let mut centers: Vec<f64> = Vec::with_capacity(bandwidths.len());
        let mut exhausted = Vec::new();

        for (idx, &bandwidth) in bandwidths.iter().enumerate() {
            let (lo, hi) = center_bounds(&request.window, bandwidth);
            let attempts = if request.collision_avoidance { request.max_retries.max(1) } else { 1 };
            let mut center = lo;
            let mut accepted = !request.collision_avoidance;
            for _ in 0..attempts {
                center = draw_in(rng, [lo, hi]);
                if !request.collision_avoidance || acceptable(request, &centers, center, bandwidth) {
                    accepted = true;
                    break;
                }
            }
            if !accepted {
                exhausted.push(idx);
            }
            centers.push(center);
        }

        Placement { centers, exhausted }
    }
}

fn acceptable(request: &PlacementRequest, placed: &[f64], center: f64, bandwidth: f64) -> bool {
    placed.iter().zip(request.bandwidths.iter()).all(|(&other, &other_bw)| {
        if request.max_overlap > 0.0 {
            overlap_hz(center, bandwidth, other, other_bw)
                <= request.max_overlap * bandwidth.min(other_bw) + OVERLAP_TOLERANCE_HZ
        } else {
            edge_gap(center, bandwidth, other, other_bw) >= request.min_separation - OVERLAP_TOLERANCE_HZ
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rng::{stream_rng, RngStream};
    use crate::models::ObservableRange;

    fn request(bandwidths: &[f64], min_separation: f64, max_retries: u32) -> PlacementRequest<'_> {
        PlacementRequest {
            window: ObservableRange::from_sample_rate(1e6),
            bandwidths,
            min_separation,
            max_overlap: 0.0,
            collision_avoidance: true,
            max_retries,
            optimizer_trials: 1,
            optimizer_moves: 0,
        }
    }

    #[test]
    fn test_accepted_draws_respect_overlap_bound_in_hz() {
        let bws = [400e3, 400e3];
        let mut checked = 0;
        for seed in 0..20 {
            let mut req = request(&bws, 0.0, 200);
            req.max_overlap = 0.25;
            let placement = RandomPlacement.place(&req, &mut stream_rng(seed, RngStream::Frequency));
            if placement.exhausted.is_empty() {
                let overlap = overlap_hz(placement.centers[0], 400e3, placement.centers[1], 400e3);
                assert!(overlap <= 100e3 + 1e-6, "seed {seed}: {overlap} Hz");
                checked += 1;
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_sparse_band_honors_separation() {
        let bws = [50e3, 50e3, 50e3];
        let req = request(&bws, 20e3, 1000);
        for seed in 0..20 {
            let placement = RandomPlacement.place(&req, &mut stream_rng(seed, RngStream::Frequency));
            assert!(placement.exhausted.is_empty());
            let c = &placement.centers;
            for i in 0..3 {
                assert!(req.window.contains_band(c[i], bws[i], 1e-6));
                for j in i + 1..3 {
                    assert!(edge_gap(c[i], bws[i], c[j], bws[j]) >= 20e3 - 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_impossible_separation_reports_exhaustion() {
        let bws = [600e3, 600e3];
        let req = request(&bws, 0.0, 5);
        let placement = RandomPlacement.place(&req, &mut stream_rng(2, RngStream::Frequency));
        assert_eq!(placement.exhausted, vec![1]);
        assert_eq!(placement.centers.len(), 2);
    }

    #[test]
    fn test_without_collision_avoidance_single_draw() {
        let bws = [600e3, 600e3];
        let mut req = request(&bws, 0.0, 5);
        req.collision_avoidance = false;
        let placement = RandomPlacement.place(&req, &mut stream_rng(2, RngStream::Frequency));
        assert!(placement.exhausted.is_empty());
    }
}
