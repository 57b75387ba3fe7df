//! Scenario and property tests for the capacity search.

use std::collections::BTreeMap;

use rp_core::{GeoPoint, PlanningConfig, RouteId};
use rp_envelope::TimeInterpolate;
use rp_infra::{RailNetwork, RailNetworkBuilder, TrackRange};
use rp_physics::{
    CurvePoint, EffortCurve, EnergySource, EnergyStorage, Gamma, ModeEffortCurves, RollingStock,
};

use crate::observer::{NoopObserver, SearchObserver};
use crate::occupancy::OccupancyMap;
use crate::pathfinder::{RouteLocation, find_path};

/// Metres per degree of latitude under the crate's haversine radius.
const M_PER_DEG: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

/// 20 m/s diesel stock, 1 m/s² comfort cap, γ = 0.5: round numbers for
/// hand-checked trajectories (0→20 m/s in 200 m, 400 m braking).
fn test_stock() -> RollingStock {
    let curve = EffortCurve::new(vec![
        CurvePoint { speed: 0.0, max_effort: 200_000.0 },
        CurvePoint { speed: 80.0, max_effort: 150_000.0 },
    ])
    .unwrap();
    let mut modes = BTreeMap::new();
    modes.insert(
        "diesel".to_string(),
        ModeEffortCurves { is_electric: false, default_curve: curve, curves: vec![] },
    );
    RollingStock {
        name: "test".to_string(),
        a: 2_500.0,
        b: 25.0,
        c: 0.5,
        length: 100.0,
        mass: 80_000.0,
        inertia_coefficient: 1.05,
        max_speed: 20.0,
        comfort_acceleration: 1.0,
        startup_acceleration: 1.0,
        startup_time: 0.0,
        gamma: Gamma::Const(0.5),
        modes,
        default_mode: "diesel".to_string(),
        energy_sources: vec![EnergySource::PowerPack {
            max_output_power: 8_000_000.0,
            efficiency: 1.0,
            storage: EnergyStorage::full(1e15),
        }],
    }
}

/// A straight line of track split into two sequential routes
/// R1 = `[0, r1_len]` and R2 = `[r1_len, r1_len + r2_len]`, with the track
/// length equal to its geographic length so route lengths never undercut
/// the heuristic.
fn two_route_line(r1_len: f64, r2_len: f64) -> (RailNetwork, RouteId, RouteId) {
    let total = r1_len + r2_len;
    let mut b = RailNetworkBuilder::new();
    let t = b.add_track(
        total,
        vec![GeoPoint::new(45.0, 5.0), GeoPoint::new(45.0 + total / M_PER_DEG, 5.0)],
    );
    let r1 = b.add_route(vec![TrackRange::new(t, 0.0, r1_len)]).unwrap();
    let r2 = b.add_route(vec![TrackRange::new(t, r1_len, total)]).unwrap();
    b.connect(r1, r2);
    (b.build(), r1, r2)
}

fn config() -> PlanningConfig {
    PlanningConfig::new(0.0, 24.0 * 3_600.0)
}

#[cfg(test)]
mod occupancy {
    use super::*;

    #[test]
    fn blocks_merge_on_insert() {
        let mut occ = OccupancyMap::new();
        let r = RouteId(0);
        occ.add(r, 100.0, 200.0);
        occ.add(r, 150.0, 250.0); // overlaps
        occ.add(r, 250.0, 300.0); // touches
        occ.add(r, 500.0, 600.0); // separate
        let blocks = occ.blocks(r);
        assert_eq!(blocks.len(), 2);
        assert_eq!((blocks[0].time_start, blocks[0].time_end), (100.0, 300.0));
        assert_eq!((blocks[1].time_start, blocks[1].time_end), (500.0, 600.0));
    }

    #[test]
    fn is_free_treats_bounds_as_exclusive() {
        let mut occ = OccupancyMap::new();
        let r = RouteId(0);
        occ.add(r, 100.0, 200.0);
        assert!(occ.is_free(r, 0.0, 100.0)); // ends as the block starts
        assert!(occ.is_free(r, 200.0, 300.0)); // starts as the block ends
        assert!(!occ.is_free(r, 150.0, 160.0));
        assert!(!occ.is_free(r, 50.0, 250.0));
    }

    #[test]
    fn free_windows_complement_reservations() {
        let mut occ = OccupancyMap::new();
        let r = RouteId(0);
        occ.add(r, 100.0, 200.0);
        occ.add(r, 400.0, 500.0);
        let windows = occ.free_windows(r, 0.0);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0], (0.0, 100.0));
        assert_eq!(windows[1], (200.0, 400.0));
        assert_eq!(windows[2].0, 500.0);
        assert!(windows[2].1.is_infinite());

        // Starting inside a block skips to its end.
        let windows = occ.free_windows(r, 150.0);
        assert_eq!(windows[0], (200.0, 400.0));
    }

    #[test]
    fn unknown_route_is_always_free() {
        let occ = OccupancyMap::new();
        assert!(occ.is_free(RouteId(7), 0.0, 1e9));
        assert_eq!(occ.free_windows(RouteId(7), 10.0), vec![(10.0, f64::INFINITY)]);
    }
}

#[cfg(test)]
mod scenarios {
    use super::*;

    /// R1 (2000 m, free) → R2 (500 m, occupied during [100, 200]).  The
    /// unconstrained run reaches R2 at t = 110 — inside the reservation —
    /// so the entry must wait for the window to clear.
    #[test]
    fn entry_is_delayed_past_the_reservation() {
        let (net, r1, r2) = two_route_line(2_000.0, 500.0);
        let stock = test_stock();
        let mut occ = OccupancyMap::new();
        occ.add(r2, 100.0, 200.0);

        let result = find_path(
            &net,
            &stock,
            &config(),
            &[RouteLocation::new(r1, 0.0)],
            &[vec![RouteLocation::new(r2, 500.0)]],
            &occ,
            &mut NoopObserver,
        )
        .expect("a delayed path must exist");

        assert_eq!(result.route_ranges.len(), 2);
        assert_eq!(result.route_ranges[0].route, r1);
        assert_eq!(result.route_ranges[1].route, r2);
        assert!((result.length() - 2_500.0).abs() < 1e-6);

        // 200 m acceleration (20 s) + 1800 m at 20 m/s (90 s) = 110 s on R1,
        // so the wait is 90 s and the whole trajectory shifts behind it.
        assert!((result.departure_time - 90.0).abs() < 0.5, "got {}", result.departure_time);
        let entry_clock = result.departure_time + result.envelope.interpolate_total_time(2_000.0);
        assert!(entry_clock >= 200.0 - 1e-6, "entered R2 at {entry_clock}");
    }

    /// With no reservations at all, the same trip departs immediately.
    #[test]
    fn free_network_needs_no_delay() {
        let (net, r1, r2) = two_route_line(2_000.0, 500.0);
        let stock = test_stock();

        let result = find_path(
            &net,
            &stock,
            &config(),
            &[RouteLocation::new(r1, 0.0)],
            &[vec![RouteLocation::new(r2, 500.0)]],
            &OccupancyMap::new(),
            &mut NoopObserver,
        )
        .expect("an unconstrained path must exist");
        assert_eq!(result.departure_time, 0.0);
    }

    /// R2 reserved for the whole planning window: a saturated network is a
    /// `None`, not an error.
    #[test]
    fn saturated_network_returns_none() {
        let (net, r1, r2) = two_route_line(2_000.0, 500.0);
        let stock = test_stock();
        let mut occ = OccupancyMap::new();
        occ.add(r2, 0.0, 1e9);

        let result = find_path(
            &net,
            &stock,
            &config(),
            &[RouteLocation::new(r1, 0.0)],
            &[vec![RouteLocation::new(r2, 500.0)]],
            &occ,
            &mut NoopObserver,
        );
        assert!(result.is_none());
    }

    /// A free gap too short for the traversal is pruned; the entry falls
    /// through to the next viable window.
    #[test]
    fn too_short_windows_are_skipped() {
        let (net, r1, r2) = two_route_line(2_000.0, 500.0);
        let stock = test_stock();
        let mut occ = OccupancyMap::new();
        // R2 takes 25 s at line speed; the [300, 310] gap cannot fit it.
        occ.add(r2, 0.0, 300.0);
        occ.add(r2, 310.0, 320.0);

        let result = find_path(
            &net,
            &stock,
            &config(),
            &[RouteLocation::new(r1, 0.0)],
            &[vec![RouteLocation::new(r2, 500.0)]],
            &occ,
            &mut NoopObserver,
        )
        .expect("the post-320 window fits");
        let entry_clock = result.departure_time + result.envelope.interpolate_total_time(2_000.0);
        assert!((entry_clock - 320.0).abs() < 1e-6, "entered R2 at {entry_clock}");
    }

    /// No traversed route range may overlap that route's reservations.
    #[test]
    fn result_respects_all_reservations() {
        let (net, r1, r2) = two_route_line(2_000.0, 500.0);
        let stock = test_stock();
        let mut occ = OccupancyMap::new();
        occ.add(r1, 500.0, 600.0); // after the train has cleared R1's start
        occ.add(r2, 100.0, 200.0);

        let result = find_path(
            &net,
            &stock,
            &config(),
            &[RouteLocation::new(r1, 0.0)],
            &[vec![RouteLocation::new(r2, 500.0)]],
            &occ,
            &mut NoopObserver,
        );
        // R1 is blocked during [500, 600] but the train occupies it during
        // [departure, departure + 110]; depending on the wait the search
        // may or may not find a slot — if it does, nothing may overlap.
        if let Some(result) = result {
            let mut boundary = 0.0;
            for range in &result.route_ranges {
                let t_in = result.departure_time
                    + result.envelope.interpolate_total_time(boundary);
                boundary += range.length();
                let t_out = result.departure_time
                    + result.envelope.interpolate_total_time(boundary);
                assert!(
                    occ.is_free(range.route, t_in, t_out),
                    "{} occupied during [{t_in}, {t_out}]",
                    range.route
                );
            }
        }
    }

    /// The stitched result is continuous and position-monotonic end to end,
    /// even across a route transition into a stricter speed limit.
    #[test]
    fn final_envelope_is_continuous_across_limit_drop() {
        let total = 2_500.0;
        let mut b = RailNetworkBuilder::new();
        let t = b.add_track(
            total,
            vec![GeoPoint::new(45.0, 5.0), GeoPoint::new(45.0 + total / M_PER_DEG, 5.0)],
        );
        let r1 = b.add_route(vec![TrackRange::new(t, 0.0, 2_000.0)]).unwrap();
        let r2 = b.add_route(vec![TrackRange::new(t, 2_000.0, total)]).unwrap();
        // R2 is a 10 m/s zone: the transition needs a braking patch.
        b.set_speed_limit(r2, 0.0, 500.0, 10.0);
        b.connect(r1, r2);
        let net = b.build();
        let stock = test_stock();

        let result = find_path(
            &net,
            &stock,
            &config(),
            &[RouteLocation::new(r1, 0.0)],
            &[vec![RouteLocation::new(r2, 500.0)]],
            &OccupancyMap::new(),
            &mut NoopObserver,
        )
        .expect("path must exist");

        let env = &result.envelope;
        assert!(env.is_continuous());
        assert!(env.end_speed() < 1e-6);
        // Just past the boundary the profile obeys the 10 m/s zone.
        assert!(env.interpolate_speed(2_010.0) <= 10.0 + 1e-6);

        let mut last = 0.0;
        for i in 0..=250 {
            let pos = env.end_pos() * i as f64 / 250.0;
            let t = env.interpolate_total_time(pos);
            assert!(t >= last - 1e-9, "time decreased at {pos}");
            last = t;
        }
    }

    /// Intermediate destination requirements are visited in order and
    /// reported as waypoints.
    #[test]
    fn intermediate_requirements_become_waypoints() {
        let (net, r1, r2) = two_route_line(2_000.0, 500.0);
        let stock = test_stock();

        let result = find_path(
            &net,
            &stock,
            &config(),
            &[RouteLocation::new(r1, 0.0)],
            &[
                vec![RouteLocation::new(r1, 1_500.0)],
                vec![RouteLocation::new(r2, 500.0)],
            ],
            &OccupancyMap::new(),
            &mut NoopObserver,
        )
        .expect("path must exist");

        assert_eq!(result.waypoints.len(), 3);
        assert_eq!(result.waypoints[0], RouteLocation::new(r1, 0.0));
        assert_eq!(result.waypoints[1], RouteLocation::new(r1, 1_500.0));
        assert_eq!(result.waypoints[2], RouteLocation::new(r2, 500.0));
    }

    /// A path starting mid-route only traverses the remaining span.
    #[test]
    fn start_offset_shortens_the_first_range() {
        let (net, r1, r2) = two_route_line(2_000.0, 500.0);
        let stock = test_stock();

        let result = find_path(
            &net,
            &stock,
            &config(),
            &[RouteLocation::new(r1, 500.0)],
            &[vec![RouteLocation::new(r2, 500.0)]],
            &OccupancyMap::new(),
            &mut NoopObserver,
        )
        .expect("path must exist");
        assert_eq!(result.route_ranges[0].begin, 500.0);
        assert!((result.length() - 2_000.0).abs() < 1e-6);
        assert_eq!(result.envelope.end_pos(), result.length());
    }

    struct CancelAfter {
        left: u64,
    }

    impl SearchObserver for CancelAfter {
        fn on_expand(&mut self, _route: RouteId, _entry_time: f64, _cost: f64) {
            self.left = self.left.saturating_sub(1);
        }
        fn is_cancelled(&self) -> bool {
            self.left == 0
        }
    }

    #[test]
    fn cancellation_is_polled_between_expansions() {
        let (net, r1, r2) = two_route_line(2_000.0, 500.0);
        let stock = test_stock();

        let result = find_path(
            &net,
            &stock,
            &config(),
            &[RouteLocation::new(r1, 0.0)],
            &[vec![RouteLocation::new(r2, 500.0)]],
            &OccupancyMap::new(),
            &mut CancelAfter { left: 1 },
        );
        assert!(result.is_none());
    }
}

#[cfg(test)]
mod heuristic {
    use super::*;
    use crate::heuristic::RemainingDistanceEstimator;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    /// Build a random chain-with-branches network whose track lengths equal
    /// their geographic lengths, and return the brute-force route-distance
    /// from every `(route, offset)` to a target for comparison.
    fn random_network(rng: &mut SmallRng) -> (RailNetwork, Vec<RouteId>, RouteLocation) {
        let n_routes = rng.gen_range(3..8);
        let mut b = RailNetworkBuilder::new();
        let mut routes = Vec::new();
        let mut cursor = GeoPoint::new(45.0, 5.0);
        for _ in 0..n_routes {
            // A dogleg of 500–3000 m in a random direction.
            let d_lat = rng.gen_range(-0.02..0.02);
            let d_lon = rng.gen_range(-0.02..0.02);
            let next = GeoPoint::new(cursor.lat + d_lat, cursor.lon + d_lon);
            let length = cursor.distance_m(next).max(100.0);
            let t = b.add_track(length, vec![cursor, next]);
            let r = b.add_route(vec![TrackRange::new(t, 0.0, length)]).unwrap();
            if let Some(&prev) = routes.last() {
                b.connect(prev, r);
            }
            routes.push(r);
            cursor = next;
        }
        let net = b.build();
        let last = *routes.last().unwrap();
        let target = RouteLocation::new(last, net.route_length(last) / 2.0);
        (net, routes, target)
    }

    /// Distance along the chain from `(route, offset)` to the target.
    fn brute_force_distance(
        net: &RailNetwork,
        routes: &[RouteId],
        from: RouteLocation,
        target: RouteLocation,
    ) -> f64 {
        let from_idx = routes.iter().position(|&r| r == from.route).unwrap();
        let target_idx = routes.iter().position(|&r| r == target.route).unwrap();
        assert!(from_idx <= target_idx);
        let mut dist = -from.offset + target.offset;
        for &r in &routes[from_idx..target_idx] {
            dist += net.route_length(r);
        }
        dist
    }

    /// The geographic estimate never exceeds the true remaining network
    /// distance, on sampled random networks and query points.
    #[test]
    fn estimate_never_overestimates() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..30 {
            let (net, routes, target) = random_network(&mut rng);
            let estimator = RemainingDistanceEstimator::new(&net, &[vec![target]]);

            for (idx, &route) in routes.iter().enumerate() {
                // Query points on every route before the target's route.
                if idx > routes.iter().position(|&r| r == target.route).unwrap() {
                    continue;
                }
                for _ in 0..5 {
                    let max_off = if route == target.route {
                        target.offset
                    } else {
                        net.route_length(route)
                    };
                    let offset = rng.gen_range(0.0..max_off.max(1e-3));
                    let estimate = estimator.estimate(&net, route, offset, 0);
                    let truth = brute_force_distance(
                        &net,
                        &routes,
                        RouteLocation::new(route, offset),
                        target,
                    );
                    assert!(
                        estimate <= truth + 1e-3,
                        "estimate {estimate} exceeds true distance {truth}"
                    );
                }
            }
        }
    }

    /// The estimate is exact when the track is straight and the query sits
    /// on the target's route.
    #[test]
    fn estimate_is_tight_on_a_straight_line() {
        let (net, _, r2) = two_route_line(2_000.0, 500.0);
        let estimator =
            RemainingDistanceEstimator::new(&net, &[vec![RouteLocation::new(r2, 500.0)]]);
        let estimate = estimator.estimate(&net, r2, 100.0, 0);
        assert!((estimate - 400.0).abs() < 1.0, "got {estimate}");
    }
}
