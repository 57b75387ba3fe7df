//! Geographic remaining-distance estimate for A*.
//!
//! The estimate relaxes every speed and occupancy constraint down to plain
//! geometry: straight-line distance to the nearest target of the current
//! destination requirement, plus the precomputed mandatory distance across
//! the requirements still ahead.  A straight line never exceeds any track
//! path, so the estimate is admissible for the route-length cost metric.

use rp_core::{GeoPoint, RouteId};
use rp_infra::RailNetwork;

use crate::pathfinder::RouteLocation;

/// Estimates the distance still to travel before the last requirement.
pub struct RemainingDistanceEstimator {
    /// Geographic positions of each requirement's acceptable targets.
    target_points: Vec<Vec<GeoPoint>>,
    /// `remaining_after[i]`: minimal mandatory distance from requirement
    /// `i`'s targets through all later requirements.
    remaining_after: Vec<f64>,
}

impl RemainingDistanceEstimator {
    /// Precompute target geometry for the ordered destination requirements.
    ///
    /// # Panics
    ///
    /// Panics if `steps` is empty, any requirement has no targets, or a
    /// target offset does not exist on its route.
    pub fn new(network: &RailNetwork, steps: &[Vec<RouteLocation>]) -> Self {
        assert!(!steps.is_empty(), "at least one destination requirement is needed");
        let target_points: Vec<Vec<GeoPoint>> = steps
            .iter()
            .map(|step| {
                assert!(!step.is_empty(), "a requirement needs at least one target");
                step.iter()
                    .map(|loc| network.geo_point(loc.route, loc.offset))
                    .collect()
            })
            .collect();

        // Suffix sums of the minimal hop between consecutive requirements.
        let mut remaining_after = vec![0.0; steps.len()];
        for i in (0..steps.len() - 1).rev() {
            remaining_after[i] =
                remaining_after[i + 1] + min_distance(&target_points[i], &target_points[i + 1]);
        }

        Self { target_points, remaining_after }
    }

    /// Lower bound on the distance from `(route, offset)` to the final
    /// requirement, given that requirements before `next_step` are done.
    pub fn estimate(
        &self,
        network: &RailNetwork,
        route: RouteId,
        offset: f64,
        next_step: usize,
    ) -> f64 {
        let here = network.geo_point(route, offset);
        let to_step = self.target_points[next_step]
            .iter()
            .map(|target| here.distance_m(*target))
            .fold(f64::INFINITY, f64::min);
        to_step + self.remaining_after[next_step]
    }

    /// Number of destination requirements.
    pub fn step_count(&self) -> usize {
        self.target_points.len()
    }
}

/// Minimum pairwise geographic distance between two target sets.
fn min_distance(a: &[GeoPoint], b: &[GeoPoint]) -> f64 {
    let mut res = f64::INFINITY;
    for p in a {
        for q in b {
            res = res.min(p.distance_m(*q));
        }
    }
    res
}
