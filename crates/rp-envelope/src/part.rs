//! One contiguous, position-monotonic segment of a trajectory.

use crate::{POSITION_EPSILON, SPEED_EPSILON};

/// A speed-over-position curve sampled at strictly increasing positions.
///
/// Step times are derived once at construction under the
/// constant-acceleration assumption and cached as cumulative times, so time
/// interpolation is a binary search plus one partial-step solve.
///
/// Positions are absolute within the owning envelope's frame.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvelopePart {
    positions: Vec<f64>,
    speeds: Vec<f64>,
    /// Time from the part's begin position to each sample.  Same length as
    /// `positions`; first entry is 0.
    cumulative_times: Vec<f64>,
}

impl EnvelopePart {
    /// Build a part from parallel position/speed samples.
    ///
    /// # Panics
    ///
    /// Panics if there are fewer than two samples, the arrays differ in
    /// length, positions are not strictly increasing, any speed is negative,
    /// or a step has zero speed at both ends (which would take infinite
    /// time to traverse).
    pub fn new(positions: Vec<f64>, speeds: Vec<f64>) -> Self {
        assert!(positions.len() >= 2, "an envelope part needs at least two samples");
        assert_eq!(positions.len(), speeds.len(), "positions/speeds length mismatch");
        for w in positions.windows(2) {
            assert!(w[1] > w[0], "positions must be strictly increasing");
        }
        for &v in &speeds {
            assert!(v >= 0.0, "speeds must be non-negative");
        }

        let mut cumulative_times = Vec::with_capacity(positions.len());
        cumulative_times.push(0.0);
        let mut time = 0.0;
        for i in 0..positions.len() - 1 {
            let dx = positions[i + 1] - positions[i];
            let v_sum = speeds[i] + speeds[i + 1];
            assert!(v_sum > 0.0, "zero-speed step of non-zero length at {}", positions[i]);
            time += 2.0 * dx / v_sum;
            cumulative_times.push(time);
        }

        Self { positions, speeds, cumulative_times }
    }

    /// A constant-speed part from `begin` to `end`.
    ///
    /// # Panics
    ///
    /// Panics if `speed <= 0` or `end <= begin`.
    pub fn flat(begin: f64, end: f64, speed: f64) -> Self {
        assert!(speed > 0.0, "a flat part needs a positive speed");
        Self::new(vec![begin, end], vec![speed, speed])
    }

    // ── Bounds ────────────────────────────────────────────────────────────

    #[inline]
    pub fn begin_pos(&self) -> f64 {
        self.positions[0]
    }

    #[inline]
    pub fn end_pos(&self) -> f64 {
        *self.positions.last().unwrap()
    }

    #[inline]
    pub fn begin_speed(&self) -> f64 {
        self.speeds[0]
    }

    #[inline]
    pub fn end_speed(&self) -> f64 {
        *self.speeds.last().unwrap()
    }

    /// Time to traverse the whole part, in seconds.
    #[inline]
    pub fn total_time(&self) -> f64 {
        *self.cumulative_times.last().unwrap()
    }

    pub fn max_speed(&self) -> f64 {
        self.speeds.iter().copied().fold(0.0, f64::max)
    }

    /// Raw samples, for point iteration: `(position, speed, time_from_begin)`.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        (0..self.positions.len())
            .map(|i| (self.positions[i], self.speeds[i], self.cumulative_times[i]))
    }

    // ── Interpolation ─────────────────────────────────────────────────────

    /// Index of the step containing `pos`; `pos == end_pos` maps onto the
    /// last step.
    fn step_at(&self, pos: f64) -> usize {
        debug_assert!(self.contains(pos), "position {pos} outside part");
        let idx = self.positions.partition_point(|&p| p <= pos);
        idx.clamp(1, self.positions.len() - 1) - 1
    }

    /// `true` if `pos` lies within `[begin_pos, end_pos]` (closed on both
    /// ends; interpolation at the exact end is allowed).
    #[inline]
    pub fn contains(&self, pos: f64) -> bool {
        pos >= self.begin_pos() - POSITION_EPSILON && pos <= self.end_pos() + POSITION_EPSILON
    }

    /// Speed at `pos`, with v² interpolated linearly in position
    /// (constant acceleration over each step).
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `pos` is outside the part.
    pub fn interpolate_speed(&self, pos: f64) -> f64 {
        let i = self.step_at(pos);
        let (x0, x1) = (self.positions[i], self.positions[i + 1]);
        let (v0, v1) = (self.speeds[i], self.speeds[i + 1]);
        let t = ((pos - x0) / (x1 - x0)).clamp(0.0, 1.0);
        (v0 * v0 + (v1 * v1 - v0 * v0) * t).max(0.0).sqrt()
    }

    /// Time from the part's begin position to `pos`, in seconds.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `pos` is outside the part.
    pub fn interpolate_time(&self, pos: f64) -> f64 {
        let i = self.step_at(pos);
        let (x0, x1) = (self.positions[i], self.positions[i + 1]);
        let (v0, v1) = (self.speeds[i], self.speeds[i + 1]);
        let dx = pos - x0;
        if dx <= 0.0 {
            return self.cumulative_times[i];
        }

        let acceleration = (v1 * v1 - v0 * v0) / (2.0 * (x1 - x0));
        let partial = if acceleration.abs() < 1e-12 {
            dx / v0
        } else {
            let v = self.interpolate_speed(pos);
            (v - v0) / acceleration
        };
        self.cumulative_times[i] + partial
    }

    // ── Derivation ────────────────────────────────────────────────────────

    /// The sub-part covering `[begin, end] ∩ [begin_pos, end_pos]`, with
    /// boundary samples interpolated.  Returns `None` if the intersection is
    /// empty or degenerate.  The source part is left untouched.
    pub fn slice(&self, begin: f64, end: f64) -> Option<EnvelopePart> {
        let begin = begin.max(self.begin_pos());
        let end = end.min(self.end_pos());
        if end - begin < POSITION_EPSILON {
            return None;
        }

        let mut positions = vec![begin];
        let mut speeds = vec![self.interpolate_speed(begin)];
        for i in 0..self.positions.len() {
            let p = self.positions[i];
            if p > begin + POSITION_EPSILON && p < end - POSITION_EPSILON {
                positions.push(p);
                speeds.push(self.speeds[i]);
            }
        }
        positions.push(end);
        speeds.push(self.interpolate_speed(end));
        Some(EnvelopePart::new(positions, speeds))
    }

    /// A copy of this part translated by `offset` along the position axis.
    /// Speeds and step times are unchanged.
    pub fn copy_and_shift(&self, offset: f64) -> EnvelopePart {
        EnvelopePart {
            positions: self.positions.iter().map(|p| p + offset).collect(),
            speeds: self.speeds.clone(),
            cumulative_times: self.cumulative_times.clone(),
        }
    }

    /// `true` if this part's end joins `next`'s begin in both position and
    /// speed.
    pub fn joins(&self, next: &EnvelopePart) -> bool {
        (next.begin_pos() - self.end_pos()).abs() <= POSITION_EPSILON
            && (next.begin_speed() - self.end_speed()).abs() <= SPEED_EPSILON
    }
}
