//! An ordered, contiguous sequence of envelope parts.

use crate::part::EnvelopePart;
use crate::trajectory::{EnvelopePoint, TimeInterpolate};
use crate::{POSITION_EPSILON, SPEED_EPSILON};

/// A complete speed-over-position trajectory.
///
/// Parts are non-overlapping and contiguous in position.  The `continuous`
/// flag records whether every part's end speed equals the next part's start
/// speed; a discontinuous envelope is a legal intermediate (route-transition
/// stitching produces one) but the final result of a plan must be
/// continuous.
///
/// Immutable once built.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Envelope {
    parts: Vec<EnvelopePart>,
    /// Time from the envelope's begin position to each part's begin.
    part_start_times: Vec<f64>,
    continuous: bool,
}

impl Envelope {
    /// Assemble an envelope from parts already ordered by position.
    ///
    /// # Panics
    ///
    /// Panics if `parts` is empty or consecutive parts leave a gap or
    /// overlap in position.
    pub fn make(parts: Vec<EnvelopePart>) -> Self {
        assert!(!parts.is_empty(), "an envelope needs at least one part");

        let mut continuous = true;
        let mut part_start_times = Vec::with_capacity(parts.len());
        let mut time = 0.0;
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                let prev = &parts[i - 1];
                assert!(
                    (part.begin_pos() - prev.end_pos()).abs() <= POSITION_EPSILON,
                    "parts leave a gap or overlap at position {}",
                    prev.end_pos()
                );
                if (part.begin_speed() - prev.end_speed()).abs() > SPEED_EPSILON {
                    continuous = false;
                }
            }
            part_start_times.push(time);
            time += part.total_time();
        }

        Self { parts, part_start_times, continuous }
    }

    // ── Bounds & flags ────────────────────────────────────────────────────

    #[inline]
    pub fn begin_pos(&self) -> f64 {
        self.parts[0].begin_pos()
    }

    #[inline]
    pub fn end_pos(&self) -> f64 {
        self.parts.last().unwrap().end_pos()
    }

    #[inline]
    pub fn begin_speed(&self) -> f64 {
        self.parts[0].begin_speed()
    }

    #[inline]
    pub fn end_speed(&self) -> f64 {
        self.parts.last().unwrap().end_speed()
    }

    /// `true` if every part boundary matches in speed.
    #[inline]
    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn parts(&self) -> &[EnvelopePart] {
        &self.parts
    }

    pub fn max_speed(&self) -> f64 {
        self.parts.iter().map(EnvelopePart::max_speed).fold(0.0, f64::max)
    }

    // ── Interpolation ─────────────────────────────────────────────────────

    /// The part containing `pos`.  A position on a shared boundary resolves
    /// to the earlier part (whose closed end contains it).
    fn part_at(&self, pos: f64) -> usize {
        let idx = self.parts.partition_point(|p| p.begin_pos() <= pos);
        idx.clamp(1, self.parts.len()) - 1
    }

    /// Speed at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is outside `[begin_pos, end_pos]`.
    pub fn interpolate_speed(&self, pos: f64) -> f64 {
        self.assert_in_range(pos);
        self.parts[self.part_at(pos)].interpolate_speed(pos)
    }

    #[inline]
    fn assert_in_range(&self, pos: f64) {
        assert!(
            pos >= self.begin_pos() - POSITION_EPSILON
                && pos <= self.end_pos() + POSITION_EPSILON,
            "position {pos} outside envelope [{}, {}]",
            self.begin_pos(),
            self.end_pos()
        );
    }

    // ── Derivation ────────────────────────────────────────────────────────

    /// The sub-envelope covering `[begin, end]`, with boundary samples
    /// interpolated.  Continuity of the retained interior boundaries is
    /// preserved; shared part data is never mutated.
    ///
    /// # Panics
    ///
    /// Panics if the intersection with the envelope's span is empty.
    pub fn slice(&self, begin: f64, end: f64) -> Envelope {
        let parts: Vec<EnvelopePart> = self
            .parts
            .iter()
            .filter_map(|p| p.slice(begin, end))
            .collect();
        Envelope::make(parts)
    }

    /// A copy of this envelope translated by `offset` along the position
    /// axis.
    pub fn copy_and_shift(&self, offset: f64) -> Envelope {
        Envelope {
            parts: self.parts.iter().map(|p| p.copy_and_shift(offset)).collect(),
            part_start_times: self.part_start_times.clone(),
            continuous: self.continuous,
        }
    }
}

impl TimeInterpolate for Envelope {
    /// Time from the envelope's begin position to `pos`, in seconds.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is outside `[begin_pos, end_pos]` — interpolating
    /// outside the envelope is a precondition violation, not a recoverable
    /// error.  Use [`TimeInterpolate::interpolate_total_time_clamp`] when the
    /// caller cannot guarantee the range.
    fn interpolate_total_time(&self, pos: f64) -> f64 {
        self.assert_in_range(pos);
        let i = self.part_at(pos);
        self.part_start_times[i] + self.parts[i].interpolate_time(pos)
    }

    fn interpolate_total_time_clamp(&self, pos: f64) -> f64 {
        self.interpolate_total_time(pos.clamp(self.begin_pos(), self.end_pos()))
    }

    fn begin_pos(&self) -> f64 {
        self.parts[0].begin_pos()
    }

    fn end_pos(&self) -> f64 {
        self.parts.last().unwrap().end_pos()
    }

    fn total_time(&self) -> f64 {
        self.part_start_times.last().unwrap() + self.parts.last().unwrap().total_time()
    }

    fn iterate_points(&self) -> Vec<EnvelopePoint> {
        let mut res: Vec<EnvelopePoint> = Vec::new();
        for (i, part) in self.parts.iter().enumerate() {
            let t0 = self.part_start_times[i];
            for (position, speed, time) in part.points() {
                // Drop the duplicated sample at a continuous part boundary.
                if let Some(last) = res.last() {
                    if (last.position - position).abs() <= POSITION_EPSILON
                        && (last.speed - speed).abs() <= SPEED_EPSILON
                    {
                        continue;
                    }
                }
                res.push(EnvelopePoint { time: t0 + time, speed, position });
            }
        }
        res
    }
}
