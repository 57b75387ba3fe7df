//! Assembly of the final plan from a finished search.

use rp_core::{PlanningConfig, RouteId};
use rp_envelope::{Envelope, EnvelopePart, POSITION_EPSILON};
use rp_infra::{RailNetwork, TrackRange};
use rp_physics::pipeline::max_speed_envelope;
use rp_physics::{Comfort, EnvelopeSimContext, PhysicsPath, RollingStock};

use crate::graph::SearchGraph;
use crate::pathfinder::{RouteLocation, SearchStep};

/// A traversed slice of a route.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteRange {
    pub route: RouteId,
    pub begin: f64,
    pub end: f64,
}

impl RouteRange {
    #[inline]
    pub fn length(&self) -> f64 {
        self.end - self.begin
    }
}

/// The outcome of a successful capacity search.
#[derive(Clone, Debug)]
pub struct StdcmResult {
    /// The traversed route slices, in order.
    pub route_ranges: Vec<RouteRange>,
    /// Start location, every intermediate requirement hit, and the final
    /// destination.
    pub waypoints: Vec<RouteLocation>,
    /// Track-range decomposition of the whole path.
    pub track_ranges: Vec<TrackRange>,
    /// The continuous, stop-terminated speed profile over `[0, path
    /// length]`.  Times are relative to `departure_time`.
    pub envelope: Envelope,
    /// Grade/electrification description of the whole path.
    pub physics_path: PhysicsPath,
    /// Actual departure: the requested start time plus every wait inserted
    /// along the path.
    pub departure_time: f64,
}

impl StdcmResult {
    /// Total path length, metres.
    pub fn length(&self) -> f64 {
        self.route_ranges.iter().map(RouteRange::length).sum()
    }
}

/// Build the result bundle from the winning chain of search steps.
///
/// Edge envelopes are sliced to their traversed spans, shifted end to end,
/// and re-run through the braking pass: a route transition into a stricter
/// speed limit leaves a downward speed jump at the boundary, and the final
/// stop is missing entirely — both are exactly what the braking overlay
/// repairs.  The patched envelope must come out continuous; anything else
/// is a bug in the pipeline, not a property of the input.
pub(crate) fn assemble(
    network: &RailNetwork,
    stock: &RollingStock,
    config: &PlanningConfig,
    graph: &SearchGraph<'_>,
    search_steps: &[SearchStep],
    final_step: usize,
    final_offset: f64,
) -> StdcmResult {
    // Walk the predecessor chain back to the start.
    let mut chain: Vec<&SearchStep> = Vec::new();
    let mut cursor = Some(final_step);
    while let Some(idx) = cursor {
        chain.push(&search_steps[idx]);
        cursor = search_steps[idx].prev;
    }
    chain.reverse();

    // Collapse waypoint-continuation records into one traversal per edge.
    let mut edges = Vec::new();
    let mut waypoints = Vec::new();
    for step in &chain {
        if edges.last() != Some(&step.edge) {
            edges.push(step.edge);
        }
        if let Some(offset) = step.waypoint {
            waypoints.push(RouteLocation::new(graph.edge(step.edge).route, offset));
        }
    }

    let first = graph.edge(edges[0]);
    waypoints.insert(0, RouteLocation::new(first.route, first.entry_offset));
    let last_route = graph.edge(*edges.last().unwrap()).route;
    waypoints.push(RouteLocation::new(last_route, final_offset));

    // Route ranges, track ranges, and the stitched envelope in one pass.
    let mut route_ranges = Vec::with_capacity(edges.len());
    let mut track_ranges = Vec::new();
    let mut parts: Vec<EnvelopePart> = Vec::new();
    let mut offset = 0.0;
    let mut departure_time = config.start_time;

    for (i, &edge_idx) in edges.iter().enumerate() {
        let edge = graph.edge(edge_idx);
        let is_last = i == edges.len() - 1;
        let range_end = if is_last {
            final_offset
        } else {
            network.route_length(edge.route)
        };
        route_ranges.push(RouteRange { route: edge.route, begin: edge.entry_offset, end: range_end });
        track_ranges.extend(network.track_ranges_between(edge.route, edge.entry_offset, range_end));
        departure_time += edge.added_delay;

        let local_end = range_end - edge.entry_offset;
        if local_end > POSITION_EPSILON {
            let sliced = edge.envelope.slice(0.0, local_end);
            parts.extend(sliced.parts().iter().map(|p| p.copy_and_shift(offset)));
            offset += local_end;
        }
    }

    let stitched = Envelope::make(parts);
    let path_length = offset;

    // Physics description of the whole selected path.
    let (grade, electrified) = network.physics_profiles(&track_ranges);
    let physics_path = PhysicsPath::new(path_length, grade, electrified);

    // Patch transition discontinuities and brake into the final stop.
    let ctx = EnvelopeSimContext::new(stock, &physics_path, config.time_step, Comfort::Standard);
    let envelope = max_speed_envelope(&ctx, &[path_length], &stitched);
    debug_assert!(envelope.is_continuous(), "stitched envelope still discontinuous");

    StdcmResult {
        route_ranges,
        waypoints,
        track_ranges,
        envelope,
        physics_path,
        departure_time,
    }
}
