//! Per-route reserved time intervals.

use rp_core::RouteId;
use rustc_hash::FxHashMap;

/// A time interval during which a route is unavailable to the planned
/// train, in seconds.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccupancyBlock {
    pub time_start: f64,
    pub time_end: f64,
}

impl OccupancyBlock {
    pub fn new(time_start: f64, time_end: f64) -> Self {
        assert!(time_start < time_end, "empty occupancy block");
        Self { time_start, time_end }
    }
}

/// A multi-valued mapping from route to its reserved blocks.
///
/// Blocks are kept sorted and merged on insert, so the free-window
/// complement is a single linear walk.
#[derive(Clone, Debug, Default)]
pub struct OccupancyMap {
    blocks: FxHashMap<RouteId, Vec<OccupancyBlock>>,
}

impl OccupancyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `[time_start, time_end)` on `route`.  Overlapping or touching
    /// blocks are merged.
    pub fn add(&mut self, route: RouteId, time_start: f64, time_end: f64) {
        let block = OccupancyBlock::new(time_start, time_end);
        let blocks = self.blocks.entry(route).or_default();

        let idx = blocks.partition_point(|b| b.time_start < block.time_start);
        blocks.insert(idx, block);

        // Re-merge around the insertion point.
        let mut merged: Vec<OccupancyBlock> = Vec::with_capacity(blocks.len());
        for b in blocks.drain(..) {
            match merged.last_mut() {
                Some(last) if b.time_start <= last.time_end => {
                    last.time_end = last.time_end.max(b.time_end);
                }
                _ => merged.push(b),
            }
        }
        *blocks = merged;
    }

    /// The sorted, merged blocks of `route`.
    pub fn blocks(&self, route: RouteId) -> &[OccupancyBlock] {
        self.blocks.get(&route).map_or(&[], Vec::as_slice)
    }

    /// `true` if `[begin, end)` does not intersect any reservation on
    /// `route`.
    pub fn is_free(&self, route: RouteId, begin: f64, end: f64) -> bool {
        self.blocks(route)
            .iter()
            .all(|b| end <= b.time_start || begin >= b.time_end)
    }

    /// The complement of the route's reservations, starting from `from`:
    /// every maximal free window `(start, end)` with `end > from`, in
    /// order.  The final window is `(last_end, +∞)`.
    pub fn free_windows(&self, route: RouteId, from: f64) -> Vec<(f64, f64)> {
        let mut res = Vec::new();
        let mut cursor = f64::NEG_INFINITY;
        for b in self.blocks(route) {
            if b.time_start > cursor && b.time_start > from {
                res.push((cursor.max(from), b.time_start));
            }
            cursor = cursor.max(b.time_end);
        }
        res.push((cursor.max(from), f64::INFINITY));
        res
    }
}
