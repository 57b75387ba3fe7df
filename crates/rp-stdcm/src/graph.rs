//! The lazy search graph: edges keyed by `(route, entry time)`.
//!
//! # Design
//!
//! The graph is conceptually infinite — any route can be entered at any
//! instant of continuous time — so edges are generated on demand and stored
//! in an arena `Vec` indexed by generation order.  Predecessor/successor
//! relationships live in the pathfinder's step records, never as references
//! between edges, so nothing here can form a cycle.  Edges that end up off
//! the best-known path are simply never referenced again.

use rp_core::{PlanningConfig, RouteId};
use rp_envelope::{Envelope, POSITION_EPSILON, TimeInterpolate};
use rp_infra::RailNetwork;
use rp_physics::pipeline::route_envelope;
use rp_physics::{Comfort, EnvelopeSimContext, PhysicsPath, RollingStock};
use tracing::debug;

use crate::occupancy::OccupancyMap;

/// Arena index of a [`SearchEdge`], in generation order.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct EdgeIdx(pub u32);

impl EdgeIdx {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for EdgeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EdgeIdx({})", self.0)
    }
}

/// One "enter `route` at `entry_time` and traverse it" candidate.
///
/// The envelope is computed over the traversed span `[entry_offset,
/// route length]`, re-based to 0; distinct entry times into the same route
/// are distinct edges.
#[derive(Clone, Debug)]
pub struct SearchEdge {
    pub route: RouteId,
    /// Route-relative offset at which the traversal starts (non-zero only
    /// for the first edge of a path).
    pub entry_offset: f64,
    /// Absolute entry time, seconds.
    pub entry_time: f64,
    pub entry_speed: f64,
    /// Wait inserted before this entry to clear a reservation.
    pub added_delay: f64,
    /// Speed profile over the traversed span, 0-based.
    pub envelope: Envelope,
}

impl SearchEdge {
    /// Traversed length, metres.
    #[inline]
    pub fn length(&self) -> f64 {
        self.envelope.end_pos()
    }

    /// Traversal duration, seconds.
    #[inline]
    pub fn total_time(&self) -> f64 {
        self.envelope.total_time()
    }

    /// Absolute time at which the traversal ends.
    #[inline]
    pub fn arrival_time(&self) -> f64 {
        self.entry_time + self.total_time()
    }

    /// Speed at the end of the traversal, m/s.
    #[inline]
    pub fn end_speed(&self) -> f64 {
        self.envelope.end_speed()
    }
}

/// Generates and owns the edges of one search.
///
/// All inputs are read-only shared views; every mutable by-product of edge
/// generation (the arena, drained per-envelope energy state) is local to
/// this value, so independent searches never interfere.
pub struct SearchGraph<'a> {
    pub network: &'a RailNetwork,
    pub stock: &'a RollingStock,
    pub occupancy: &'a OccupancyMap,
    pub config: &'a PlanningConfig,
    pub comfort: Comfort,
    edges: Vec<SearchEdge>,
}

impl<'a> SearchGraph<'a> {
    pub fn new(
        network: &'a RailNetwork,
        stock: &'a RollingStock,
        occupancy: &'a OccupancyMap,
        config: &'a PlanningConfig,
    ) -> Self {
        Self {
            network,
            stock,
            occupancy,
            config,
            comfort: Comfort::Standard,
            edges: Vec::new(),
        }
    }

    #[inline]
    pub fn edge(&self, idx: EdgeIdx) -> &SearchEdge {
        &self.edges[idx.index()]
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Enumerate the feasible entries into `route` for a train arriving at
    /// its start at `predecessor_arrival` with `entry_speed`.
    ///
    /// The candidate entry instants are the intersection of
    /// `[predecessor_arrival, predecessor_arrival + max_delay]` (clipped to
    /// the planning window) with the complement of the route's
    /// reservations; an entry only survives if the whole traversal fits
    /// inside its free window.  Returns zero, one, or several edges — one
    /// per distinct wait-then-go strategy.
    pub fn make_edges(
        &mut self,
        route: RouteId,
        predecessor_arrival: f64,
        entry_speed: f64,
        entry_offset: f64,
        max_delay: f64,
    ) -> Vec<EdgeIdx> {
        let route_length = self.network.route_length(route);
        let span = route_length - entry_offset;
        if span <= POSITION_EPSILON {
            return Vec::new();
        }

        // Physics first: the traversal profile is the same for every entry
        // time, so one envelope serves all candidate windows.
        let envelope = match self.traversal_envelope(route, entry_offset, span, entry_speed) {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(%route, %err, "no traversal envelope");
                return Vec::new();
            }
        };
        let total_time = envelope.total_time();

        let latest_entry = (predecessor_arrival + max_delay).min(self.config.end_time);
        let mut res = Vec::new();
        for (window_start, window_end) in self.occupancy.free_windows(route, predecessor_arrival) {
            if window_start > latest_entry {
                break;
            }
            let entry_time = window_start.max(predecessor_arrival);
            // The whole traversal must clear the window.
            if entry_time + total_time > window_end {
                continue;
            }
            let idx = EdgeIdx(self.edges.len() as u32);
            self.edges.push(SearchEdge {
                route,
                entry_offset,
                entry_time,
                entry_speed,
                added_delay: entry_time - predecessor_arrival,
                envelope: envelope.clone(),
            });
            res.push(idx);
        }
        res
    }

    /// Compute the speed profile over `[entry_offset, entry_offset + span]`
    /// of `route`, re-based to 0.
    fn traversal_envelope(
        &self,
        route: RouteId,
        entry_offset: f64,
        span: f64,
        entry_speed: f64,
    ) -> Result<Envelope, rp_physics::PhysicsError> {
        let ranges = self
            .network
            .track_ranges_between(route, entry_offset, entry_offset + span);
        let (grade, electrified) = self.network.physics_profiles(&ranges);
        let path = PhysicsPath::new(span, grade, electrified);
        let limits = self
            .network
            .speed_limits(route)
            .slice_shifted(entry_offset, entry_offset + span, 0.0);

        let mut ctx =
            EnvelopeSimContext::new(self.stock, &path, self.config.time_step, self.comfort);
        route_envelope(&mut ctx, &limits, entry_speed, &[])
    }
}
