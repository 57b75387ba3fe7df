//! Rail network representation and builder.
//!
//! # Data layout
//!
//! Route successors use **Compressed Sparse Row (CSR)** format: given a
//! `RouteId r`, the routes reachable from its exit occupy the slice
//!
//! ```text
//! route_succ[ route_succ_start[r] .. route_succ_start[r+1] ]
//! ```
//!
//! Iteration over a route's successors is therefore a contiguous memory
//! scan — ideal for the search's expansion loop.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over sampled route geometry maps `(lat, lon)` to
//! the nearest `(RouteId, offset)` pair.  Used to snap geographic waypoint
//! requests onto the network before a search.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use rp_core::{GeoPoint, RangeProfile, RouteId, TrackId};

use crate::error::{InfraError, InfraResult};

/// Sampling interval for the spatial index, metres.
const SNAP_SAMPLE_SPACING: f64 = 100.0;

// ── TrackRange ────────────────────────────────────────────────────────────────

/// A directed slice of a track: the portion `[begin, end]` traversed from
/// `begin` to `end`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackRange {
    pub track: TrackId,
    pub begin: f64,
    pub end: f64,
}

impl TrackRange {
    pub fn new(track: TrackId, begin: f64, end: f64) -> Self {
        Self { track, begin, end }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.end - self.begin
    }
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// Entry stored in the spatial index: a sampled `(lat, lon)` point with the
/// route location it came from.
#[derive(Clone)]
struct LocationEntry {
    point: [f64; 2], // [lat, lon]
    route: RouteId,
    offset: f64,
}

impl RTreeObject for LocationEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for LocationEntry {
    /// Squared Euclidean distance in lat/lon space.  Sufficient for
    /// nearest-sample queries at network scale.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── RailNetwork ───────────────────────────────────────────────────────────────

/// Read-only view of the rail network consumed by planning.
///
/// Do not construct directly; use [`RailNetworkBuilder`].  Sharing a built
/// network across concurrent searches is safe: it holds no interior
/// mutability.
pub struct RailNetwork {
    // ── Track data, indexed by TrackId ────────────────────────────────────
    track_length: Vec<f64>,
    /// Geometry polyline of each track, ≥ 2 points.
    track_geometry: Vec<Vec<GeoPoint>>,
    track_grade: Vec<RangeProfile<f64>>,
    track_electrified: Vec<RangeProfile<bool>>,

    // ── Route data, indexed by RouteId ────────────────────────────────────
    route_length: Vec<f64>,
    route_ranges: Vec<Vec<TrackRange>>,
    route_speed_limits: Vec<RangeProfile<f64>>,

    // ── CSR successor adjacency ───────────────────────────────────────────
    /// CSR row pointer.  Successors of route `r` are at
    /// `route_succ[route_succ_start[r] .. route_succ_start[r+1]]`.
    /// Length = `route_count + 1`.
    route_succ_start: Vec<u32>,
    route_succ: Vec<RouteId>,

    // ── Spatial index ─────────────────────────────────────────────────────
    spatial_idx: RTree<LocationEntry>,
}

impl RailNetwork {
    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn route_count(&self) -> usize {
        self.route_length.len()
    }

    pub fn track_count(&self) -> usize {
        self.track_length.len()
    }

    // ── Route queries ─────────────────────────────────────────────────────

    #[inline]
    pub fn route_length(&self, route: RouteId) -> f64 {
        self.route_length[route.index()]
    }

    /// The ordered track-range decomposition of a route.
    pub fn track_ranges(&self, route: RouteId) -> &[TrackRange] {
        &self.route_ranges[route.index()]
    }

    /// Speed limits along the route, keyed by route-relative position.
    pub fn speed_limits(&self, route: RouteId) -> &RangeProfile<f64> {
        &self.route_speed_limits[route.index()]
    }

    /// Routes reachable from `route`'s exit.  Contiguous slice, no
    /// allocation.
    #[inline]
    pub fn successors(&self, route: RouteId) -> &[RouteId] {
        let start = self.route_succ_start[route.index()] as usize;
        let end = self.route_succ_start[route.index() + 1] as usize;
        &self.route_succ[start..end]
    }

    /// The track ranges covering `[begin, end]` of the route, clipped to the
    /// window.
    ///
    /// # Panics
    ///
    /// Panics if the window exceeds the route's length.
    pub fn track_ranges_between(&self, route: RouteId, begin: f64, end: f64) -> Vec<TrackRange> {
        assert!(begin <= end, "inverted range on {route}");
        assert!(
            end <= self.route_length(route) + 1e-6,
            "range end {end} beyond {route} (length {})",
            self.route_length(route)
        );
        let mut res = Vec::new();
        let mut cursor = 0.0;
        for range in self.track_ranges(route) {
            let range_end = cursor + range.length();
            if range_end > begin && cursor < end {
                let clip_begin = range.begin + (begin - cursor).max(0.0);
                let clip_end = range.begin + (end - cursor).min(range.length());
                if clip_end - clip_begin > 1e-9 {
                    res.push(TrackRange::new(range.track, clip_begin, clip_end));
                }
            }
            cursor = range_end;
        }
        res
    }

    // ── Geometry ──────────────────────────────────────────────────────────

    /// Geographic position of `(route, offset)`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is not covered by any of the route's track
    /// ranges — the location does not exist on the network, which is a
    /// caller bug.
    pub fn geo_point(&self, route: RouteId, offset: f64) -> GeoPoint {
        let mut remaining = offset;
        for range in self.track_ranges(route) {
            if remaining <= range.length() + 1e-6 {
                let track_offset = range.begin + remaining.clamp(0.0, range.length());
                let normalized = track_offset / self.track_length[range.track.index()];
                return interpolate_polyline(&self.track_geometry[range.track.index()], normalized);
            }
            remaining -= range.length();
        }
        panic!("offset {offset} not found on {route}");
    }

    /// Concatenate the grade and electrification profiles under the given
    /// track ranges into path-relative profiles.
    pub fn physics_profiles(
        &self,
        ranges: &[TrackRange],
    ) -> (RangeProfile<f64>, RangeProfile<bool>) {
        let mut grade = RangeProfile::new();
        let mut electrified = RangeProfile::new();
        let mut cursor = 0.0;
        for range in ranges {
            let track = range.track.index();
            let g = self.track_grade[track].slice_shifted(range.begin, range.end, cursor);
            for r in g.ranges() {
                grade.insert(r.begin, r.end, r.value);
            }
            let e = self.track_electrified[track].slice_shifted(range.begin, range.end, cursor);
            for r in e.ranges() {
                electrified.insert(r.begin, r.end, r.value);
            }
            cursor += range.length();
        }
        (grade, electrified)
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Snap a geographic point to the nearest sampled route location.
    ///
    /// Resolution is bounded by the sampling spacing (100 m).  Returns
    /// `None` only for an empty network.
    pub fn nearest_location(&self, pos: GeoPoint) -> Option<(RouteId, f64)> {
        self.spatial_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|e| (e.route, e.offset))
    }
}

/// Interpolate a polyline at normalized arc-length `t ∈ [0, 1]`.
fn interpolate_polyline(points: &[GeoPoint], t: f64) -> GeoPoint {
    debug_assert!(points.len() >= 2, "track geometry needs at least two points");
    let total: f64 = points.windows(2).map(|w| w[0].distance_m(w[1])).sum();
    if total <= 0.0 {
        return points[0];
    }
    let mut target = t.clamp(0.0, 1.0) * total;
    for w in points.windows(2) {
        let seg = w[0].distance_m(w[1]);
        if target <= seg {
            return w[0].lerp(w[1], if seg > 0.0 { target / seg } else { 0.0 });
        }
        target -= seg;
    }
    *points.last().unwrap()
}

// ── RailNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RailNetwork`] incrementally, then call
/// [`build`](Self::build).
///
/// Tracks, routes, and connections may be added in any order (a connection
/// may reference a route added later).  `build()` sorts connections,
/// constructs the CSR arrays, and bulk-loads the R-tree.
///
/// # Example
///
/// ```
/// use rp_core::GeoPoint;
/// use rp_infra::{RailNetworkBuilder, TrackRange};
///
/// let mut b = RailNetworkBuilder::new();
/// let t = b.add_track(2_000.0, vec![
///     GeoPoint::new(48.85, 2.35),
///     GeoPoint::new(48.87, 2.35),
/// ]);
/// let r1 = b.add_route(vec![TrackRange::new(t, 0.0, 1_200.0)]).unwrap();
/// let r2 = b.add_route(vec![TrackRange::new(t, 1_200.0, 2_000.0)]).unwrap();
/// b.connect(r1, r2);
/// let net = b.build();
/// assert_eq!(net.successors(r1), &[r2]);
/// ```
pub struct RailNetworkBuilder {
    track_length: Vec<f64>,
    track_geometry: Vec<Vec<GeoPoint>>,
    track_grade: Vec<RangeProfile<f64>>,
    track_electrified: Vec<RangeProfile<bool>>,
    routes: Vec<Vec<TrackRange>>,
    route_speed_limits: Vec<RangeProfile<f64>>,
    links: Vec<(RouteId, RouteId)>,
}

impl RailNetworkBuilder {
    pub fn new() -> Self {
        Self {
            track_length: Vec::new(),
            track_geometry: Vec::new(),
            track_grade: Vec::new(),
            track_electrified: Vec::new(),
            routes: Vec::new(),
            route_speed_limits: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Add a track with its geometry polyline and return its `TrackId`
    /// (sequential from 0).
    ///
    /// # Panics
    ///
    /// Panics if `length <= 0` or the polyline has fewer than two points.
    pub fn add_track(&mut self, length: f64, geometry: Vec<GeoPoint>) -> TrackId {
        assert!(length > 0.0, "track length must be positive");
        assert!(geometry.len() >= 2, "track geometry needs at least two points");
        let id = TrackId(self.track_length.len() as u32);
        self.track_length.push(length);
        self.track_geometry.push(geometry);
        self.track_grade.push(RangeProfile::new());
        self.track_electrified.push(RangeProfile::new());
        id
    }

    /// Declare a grade range on a track, in m/km (positive uphill).
    pub fn set_grade(&mut self, track: TrackId, begin: f64, end: f64, grade: f64) {
        self.track_grade[track.index()].insert(begin, end, grade);
    }

    /// Declare a track span as electrified.
    pub fn set_electrified(&mut self, track: TrackId, begin: f64, end: f64) {
        self.track_electrified[track.index()].insert(begin, end, true);
    }

    /// Add a route as an ordered sequence of track ranges.
    pub fn add_route(&mut self, ranges: Vec<TrackRange>) -> InfraResult<RouteId> {
        if ranges.is_empty() {
            return Err(InfraError::EmptyRoute);
        }
        for range in &ranges {
            let length = *self
                .track_length
                .get(range.track.index())
                .ok_or(InfraError::TrackNotFound(range.track))?;
            if range.begin < 0.0 || range.end > length + 1e-6 || range.length() <= 0.0 {
                return Err(InfraError::RangeOutOfTrack {
                    track: range.track,
                    begin: range.begin,
                    end: range.end,
                    length,
                });
            }
        }
        let id = RouteId(self.routes.len() as u32);
        self.routes.push(ranges);
        self.route_speed_limits.push(RangeProfile::new());
        Ok(id)
    }

    /// Declare a speed limit over `[begin, end]` of a route, in m/s.
    pub fn set_speed_limit(&mut self, route: RouteId, begin: f64, end: f64, limit: f64) {
        self.route_speed_limits[route.index()].insert(begin, end, limit);
    }

    /// Declare that `to` is reachable from `from`'s exit.
    pub fn connect(&mut self, from: RouteId, to: RouteId) {
        self.links.push((from, to));
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Consume the builder and produce a [`RailNetwork`].
    ///
    /// # Panics
    ///
    /// Panics if a connection references an unknown route.
    pub fn build(self) -> RailNetwork {
        let route_count = self.routes.len();
        let route_length: Vec<f64> = self
            .routes
            .iter()
            .map(|ranges| ranges.iter().map(TrackRange::length).sum())
            .collect();

        // Build the CSR successor arrays from the sorted link list.
        let mut links = self.links;
        for &(from, to) in &links {
            assert!(from.index() < route_count, "connection from unknown {from}");
            assert!(to.index() < route_count, "connection to unknown {to}");
        }
        links.sort_unstable_by_key(|&(from, to)| (from.0, to.0));
        links.dedup();

        let route_succ: Vec<RouteId> = links.iter().map(|&(_, to)| to).collect();
        let mut route_succ_start = vec![0u32; route_count + 1];
        for &(from, _) in &links {
            route_succ_start[from.index() + 1] += 1;
        }
        for i in 1..=route_count {
            route_succ_start[i] += route_succ_start[i - 1];
        }
        debug_assert_eq!(route_succ_start[route_count] as usize, route_succ.len());

        let network = RailNetwork {
            track_length: self.track_length,
            track_geometry: self.track_geometry,
            track_grade: self.track_grade,
            track_electrified: self.track_electrified,
            route_length,
            route_ranges: self.routes,
            route_speed_limits: self.route_speed_limits,
            route_succ_start,
            route_succ,
            spatial_idx: RTree::new(),
        };

        // Sample route geometry for the snapping index, then bulk-load.
        let mut entries = Vec::new();
        for r in 0..route_count {
            let route = RouteId(r as u32);
            let length = network.route_length(route);
            let mut offset = 0.0;
            while offset < length {
                let point = network.geo_point(route, offset);
                entries.push(LocationEntry { point: [point.lat, point.lon], route, offset });
                offset += SNAP_SAMPLE_SPACING;
            }
            let point = network.geo_point(route, length);
            entries.push(LocationEntry { point: [point.lat, point.lon], route, offset: length });
        }

        RailNetwork { spatial_idx: RTree::bulk_load(entries), ..network }
    }
}

impl Default for RailNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
