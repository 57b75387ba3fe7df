//! Interval-tagged profiles over a one-dimensional axis.
//!
//! # Design
//!
//! `RangeProfile<T>` is a sorted, merge-on-insert list of
//! `(begin, end, value)` ranges — deliberately *not* a balanced-tree range
//! map.  Profiles in this workspace (grade, electrification, speed limits)
//! hold a handful of ranges each, are built once, and are then queried on hot
//! paths; a sorted `Vec` with `partition_point` lookups keeps the contract
//! simple and testable.
//!
//! Ranges are half-open `[begin, end)`: a position exactly on a shared
//! boundary belongs to the later range.

/// One tagged range of a profile.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProfileRange<T> {
    pub begin: f64,
    pub end: f64,
    pub value: T,
}

/// A sorted, non-overlapping list of tagged ranges.
///
/// Positions not covered by any range are "gaps"; queries report them as
/// `None` and callers substitute a domain default (0 ‰ grade, not
/// electrified, no speed restriction).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeProfile<T> {
    ranges: Vec<ProfileRange<T>>,
}

impl<T: Clone + PartialEq> RangeProfile<T> {
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Build a profile from `(begin, end, value)` triples, in any order.
    pub fn from_ranges(ranges: impl IntoIterator<Item = (f64, f64, T)>) -> Self {
        let mut res = Self::new();
        for (begin, end, value) in ranges {
            res.insert(begin, end, value);
        }
        res
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Read-only slice of all ranges, sorted by `begin`.
    pub fn ranges(&self) -> &[ProfileRange<T>] {
        &self.ranges
    }

    /// Insert a range, keeping the list sorted.
    ///
    /// Ranges that touch an existing neighbour (`end == neighbour.begin`)
    /// with an equal value are merged into it.
    ///
    /// # Panics
    ///
    /// Panics if `begin >= end`, or if the new range overlaps an existing
    /// one — profiles describe a single-valued function of position, so an
    /// overlap is a caller bug.
    pub fn insert(&mut self, begin: f64, end: f64, value: T) {
        assert!(begin < end, "empty or inverted range [{begin}, {end})");

        // First range starting at or after `begin`.
        let idx = self.ranges.partition_point(|r| r.begin < begin);
        if idx > 0 {
            let prev = &self.ranges[idx - 1];
            assert!(prev.end <= begin, "range [{begin}, {end}) overlaps predecessor");
        }
        if idx < self.ranges.len() {
            let next = &self.ranges[idx];
            assert!(end <= next.begin, "range [{begin}, {end}) overlaps successor");
        }

        // Merge with touching, equal-valued neighbours instead of inserting.
        let merges_prev = idx > 0
            && self.ranges[idx - 1].end == begin
            && self.ranges[idx - 1].value == value;
        let merges_next = idx < self.ranges.len()
            && self.ranges[idx].begin == end
            && self.ranges[idx].value == value;

        match (merges_prev, merges_next) {
            (true, true) => {
                self.ranges[idx - 1].end = self.ranges[idx].end;
                self.ranges.remove(idx);
            }
            (true, false) => self.ranges[idx - 1].end = end,
            (false, true) => self.ranges[idx].begin = begin,
            (false, false) => {
                self.ranges.insert(idx, ProfileRange { begin, end, value });
            }
        }
    }

    /// The value at `pos`, or `None` if `pos` falls in a gap.
    ///
    /// A position exactly on a shared boundary belongs to the later range.
    pub fn value_at(&self, pos: f64) -> Option<&T> {
        // Last range with begin <= pos.
        let idx = self.ranges.partition_point(|r| r.begin <= pos);
        if idx == 0 {
            return None;
        }
        let range = &self.ranges[idx - 1];
        (pos < range.end).then_some(&range.value)
    }

    /// Decompose `[begin, end)` into contiguous segments, each either covered
    /// by one range (`Some(value)`) or a gap (`None`).  The returned segments
    /// cover the query window exactly, in order.
    pub fn segments(&self, begin: f64, end: f64) -> Vec<(f64, f64, Option<&T>)> {
        debug_assert!(begin <= end, "inverted query window");
        let mut res = Vec::new();
        let mut cursor = begin;
        for range in &self.ranges {
            if range.end <= cursor {
                continue;
            }
            if range.begin >= end {
                break;
            }
            if range.begin > cursor {
                res.push((cursor, range.begin, None));
                cursor = range.begin;
            }
            let seg_end = range.end.min(end);
            res.push((cursor, seg_end, Some(&range.value)));
            cursor = seg_end;
        }
        if cursor < end {
            res.push((cursor, end, None));
        }
        res
    }

    /// Extract `[begin, end)` as a new profile re-based so that `begin` maps
    /// to `offset`.  Ranges partially inside the window are clipped.
    ///
    /// Used to lay track-local profiles end to end along a path.
    pub fn slice_shifted(&self, begin: f64, end: f64, offset: f64) -> RangeProfile<T> {
        let mut res = RangeProfile::new();
        for (seg_begin, seg_end, value) in self.segments(begin, end) {
            if let Some(value) = value {
                res.insert(seg_begin - begin + offset, seg_end - begin + offset, value.clone());
            }
        }
        res
    }
}

impl RangeProfile<f64> {
    /// Length-weighted mean over `[begin, end)`, substituting `default` in
    /// gaps.  Returns `default` for an empty window.
    ///
    /// Used to average the grade under the full train length.
    pub fn mean_weighted(&self, begin: f64, end: f64, default: f64) -> f64 {
        if end <= begin {
            return default;
        }
        let mut acc = 0.0;
        for (seg_begin, seg_end, value) in self.segments(begin, end) {
            acc += (seg_end - seg_begin) * value.copied().unwrap_or(default);
        }
        acc / (end - begin)
    }
}
