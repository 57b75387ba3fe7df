//! Best-first search over the lazy edge graph.
//!
//! # Discipline
//!
//! Standard A*: the frontier orders states by `cost + heuristic`, where the
//! cost is the *distance* travelled (route lengths, not time — time depends
//! on waits, which would break admissibility) and the heuristic is the
//! geographic [`RemainingDistanceEstimator`].  Ties break on lower
//! cumulative cost, then on state generation order, so identical inputs
//! always reproduce the same path.
//!
//! Search state lives in an arena of step records indexed by generation
//! order; predecessor links are indices, never references, so pruned states
//! are simply never touched again.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rp_core::{PlanningConfig, RouteId};
use rp_infra::RailNetwork;
use rp_physics::RollingStock;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::graph::{EdgeIdx, SearchGraph};
use crate::heuristic::RemainingDistanceEstimator;
use crate::observer::SearchObserver;
use crate::occupancy::OccupancyMap;
use crate::result::{StdcmResult, assemble};

/// A location on the network: a route and an offset from its start.
///
/// Used for start/end waypoint alternatives and for the waypoints of a
/// finished path.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteLocation {
    pub route: RouteId,
    pub offset: f64,
}

impl RouteLocation {
    pub fn new(route: RouteId, offset: f64) -> Self {
        Self { route, offset }
    }
}

/// One record of the search arena: a traversal of `edge` with
/// `n_reached` destination requirements already satisfied.
pub(crate) struct SearchStep {
    pub(crate) edge: EdgeIdx,
    pub(crate) n_reached: usize,
    /// Distance from the search start to this edge's entry point.
    pub(crate) cost: f64,
    pub(crate) prev: Option<usize>,
    /// Set when this record marks a requirement target reached on `edge`.
    pub(crate) waypoint: Option<f64>,
}

/// Frontier entry; ordered so the `Reverse`-wrapped heap pops the lowest
/// estimated total first.
struct QueueEntry {
    estimated: f64,
    cost: f64,
    step: usize,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.estimated
            .total_cmp(&other.estimated)
            .then(self.cost.total_cmp(&other.cost))
            .then(self.step.cmp(&other.step))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

/// Find a path from any of `start_locations` through the ordered
/// destination requirements in `steps`, avoiding every reservation in
/// `occupancy`.
///
/// Returns `None` when the network has no capacity for the request (or the
/// observer cancelled the search) — a normal outcome, not an error.
///
/// # Panics
///
/// Panics on malformed input: an invalid `config`, an empty requirement
/// list, or a location that does not exist on the network.
pub fn find_path<O: SearchObserver>(
    network: &RailNetwork,
    stock: &RollingStock,
    config: &PlanningConfig,
    start_locations: &[RouteLocation],
    steps: &[Vec<RouteLocation>],
    occupancy: &OccupancyMap,
    observer: &mut O,
) -> Option<StdcmResult> {
    config.validate().expect("invalid planning config");
    assert!(!start_locations.is_empty(), "at least one start location is needed");

    let mut graph = SearchGraph::new(network, stock, occupancy, config);
    let estimator = RemainingDistanceEstimator::new(network, steps);

    let mut search_steps: Vec<SearchStep> = Vec::new();
    let mut frontier: BinaryHeap<Reverse<QueueEntry>> = BinaryHeap::new();
    // Closed set over `(route, entry time, entry offset, entry speed,
    // requirements reached)` — the full identity of a state on the
    // continuous-time graph.
    let mut visited: FxHashSet<(u32, u64, u64, u64, usize)> = FxHashSet::default();

    // Seed the frontier with every feasible entry at a start location.
    let max_delay = config.max_departure_delay;
    for loc in start_locations {
        for edge_idx in graph.make_edges(loc.route, config.start_time, 0.0, loc.offset, max_delay) {
            let est = estimator.estimate(network, loc.route, loc.offset, 0);
            search_steps.push(SearchStep {
                edge: edge_idx,
                n_reached: 0,
                cost: 0.0,
                prev: None,
                waypoint: None,
            });
            frontier.push(Reverse(QueueEntry {
                estimated: est,
                cost: 0.0,
                step: search_steps.len() - 1,
            }));
        }
    }

    while let Some(Reverse(entry)) = frontier.pop() {
        let step_idx = entry.step;
        let (edge_idx, n_reached, cost) = {
            let s = &search_steps[step_idx];
            (s.edge, s.n_reached, s.cost)
        };
        let (route, entry_offset, entry_time, entry_speed, arrival, end_speed, length) = {
            let e = graph.edge(edge_idx);
            (
                e.route,
                e.entry_offset,
                e.entry_time,
                e.entry_speed,
                e.arrival_time(),
                e.end_speed(),
                e.length(),
            )
        };

        let key = (
            route.0,
            entry_time.to_bits(),
            entry_offset.to_bits(),
            entry_speed.to_bits(),
            n_reached,
        );
        if !visited.insert(key) {
            continue;
        }

        observer.on_expand(route, entry_time, cost);
        if observer.is_cancelled() {
            debug!("search cancelled after {} expansions", graph.edge_count());
            return None;
        }

        // A requirement target on this edge?  Take the nearest one ahead of
        // the entry point.
        let target_offset = steps[n_reached]
            .iter()
            .filter(|loc| loc.route == route && loc.offset >= entry_offset - 1e-9)
            .map(|loc| loc.offset)
            .fold(f64::INFINITY, f64::min);
        if target_offset.is_finite() {
            if n_reached + 1 == estimator.step_count() {
                debug!(
                    expansions = graph.edge_count(),
                    "destination reached at {route} offset {target_offset}"
                );
                return Some(assemble(
                    network,
                    stock,
                    config,
                    &graph,
                    &search_steps,
                    step_idx,
                    target_offset,
                ));
            }
            // Intermediate requirement: record it and keep searching from
            // the same edge with the next requirement active.
            let est = estimator.estimate(network, route, target_offset, n_reached + 1);
            search_steps.push(SearchStep {
                edge: edge_idx,
                n_reached: n_reached + 1,
                cost,
                prev: Some(step_idx),
                waypoint: Some(target_offset),
            });
            frontier.push(Reverse(QueueEntry {
                estimated: cost + est,
                cost,
                step: search_steps.len() - 1,
            }));
        }

        // Expand: every feasible entry into every successor route.
        let cost_at_exit = cost + length;
        for &succ in network.successors(route) {
            for new_edge in graph.make_edges(succ, arrival, end_speed, 0.0, max_delay) {
                let est = estimator.estimate(network, succ, 0.0, n_reached);
                search_steps.push(SearchStep {
                    edge: new_edge,
                    n_reached,
                    cost: cost_at_exit,
                    prev: Some(step_idx),
                    waypoint: None,
                });
                frontier.push(Reverse(QueueEntry {
                    estimated: cost_at_exit + est,
                    cost: cost_at_exit,
                    step: search_steps.len() - 1,
                }));
            }
        }
    }

    debug!(expansions = graph.edge_count(), "open set exhausted, no path");
    None
}
