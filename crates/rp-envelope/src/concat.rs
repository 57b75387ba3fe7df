//! Copy-free concatenation of trajectories.
//!
//! Concatenation owns only offset bookkeeping: each sub-trajectory stays in
//! its own 0-based frame and is located inside the concatenation by a
//! `(start_offset, start_time)` pair.  Nothing is deep-copied or re-sampled.

use crate::trajectory::{EnvelopePoint, TimeInterpolate, Trajectory};

/// A sub-trajectory anchored inside a concatenation.
///
/// `start_offset` and `start_time` strictly increase along the owning
/// sequence; the sub-trajectory itself is defined locally starting at 0.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocatedEnvelope {
    pub trajectory: Trajectory,
    pub start_offset: f64,
    pub start_time: f64,
}

/// An ordered sequence of located trajectories.
///
/// Total length and total time are the sums over the sequence.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvelopeConcat {
    envelopes: Vec<LocatedEnvelope>,
    end_pos: f64,
}

impl EnvelopeConcat {
    /// Concatenate trajectories, accumulating offsets and times.
    ///
    /// # Panics
    ///
    /// Panics if `envelopes` is empty or any sub-trajectory does not start
    /// at position 0 in its own frame.
    pub fn from(envelopes: impl IntoIterator<Item = Trajectory>) -> Self {
        let mut located = Vec::new();
        let mut offset = 0.0;
        let mut time = 0.0;
        for trajectory in envelopes {
            assert!(
                trajectory.begin_pos() == 0.0,
                "concatenated trajectories must start at position 0"
            );
            let length = trajectory.end_pos();
            let duration = trajectory.total_time();
            located.push(LocatedEnvelope { trajectory, start_offset: offset, start_time: time });
            offset += length;
            time += duration;
        }
        Self::from_located(located)
    }

    /// Build from pre-located sub-trajectories.  Avoids redundant
    /// re-initialization when elements are appended to one growing list.
    ///
    /// # Panics
    ///
    /// Panics if `envelopes` is empty.
    pub fn from_located(envelopes: Vec<LocatedEnvelope>) -> Self {
        let last = envelopes.last().expect("cannot concatenate zero trajectories");
        debug_assert!(
            envelopes.windows(2).all(|w| w[0].start_offset < w[1].start_offset
                && w[0].start_time <= w[1].start_time),
            "located envelopes must be ordered by offset and time"
        );
        let end_pos = last.start_offset + last.trajectory.end_pos();
        Self { envelopes, end_pos }
    }

    pub fn sub_count(&self) -> usize {
        self.envelopes.len()
    }

    /// The located sub-trajectory whose span contains `position`, found by
    /// binary search.
    ///
    /// When `position` lands exactly on the boundary shared by two
    /// neighbours, the winner is whichever interval the midpoint-biased
    /// search probes first — this tie-break is pinned by a regression test
    /// rather than being part of the documented contract.
    fn find_envelope_at(&self, position: f64) -> Option<&LocatedEnvelope> {
        if position < 0.0 {
            return None;
        }
        let mut lower = 0; // included
        let mut upper = self.envelopes.len(); // excluded
        while lower < upper {
            let i = (lower + upper) / 2;
            let located = &self.envelopes[i];
            if position < located.start_offset {
                upper = i;
            } else if position > located.start_offset + located.trajectory.end_pos() {
                lower = i + 1;
            } else {
                return Some(located);
            }
        }
        None
    }
}

impl TimeInterpolate for EnvelopeConcat {
    fn interpolate_total_time(&self, position: f64) -> f64 {
        let located = self
            .find_envelope_at(position)
            .unwrap_or_else(|| panic!("position {position} outside concatenation [0, {}]", self.end_pos));
        // Clamp at the sub-trajectory level to absorb float error on the
        // shifted position.
        located.start_time
            + located
                .trajectory
                .interpolate_total_time_clamp(position - located.start_offset)
    }

    fn interpolate_total_time_clamp(&self, position: f64) -> f64 {
        self.interpolate_total_time(position.clamp(0.0, self.end_pos))
    }

    fn begin_pos(&self) -> f64 {
        0.0
    }

    fn end_pos(&self) -> f64 {
        self.end_pos
    }

    fn total_time(&self) -> f64 {
        let last = self.envelopes.last().unwrap();
        last.start_time + last.trajectory.total_time()
    }

    fn iterate_points(&self) -> Vec<EnvelopePoint> {
        self.envelopes
            .iter()
            .flat_map(|located| {
                located.trajectory.iterate_points().into_iter().map(|p| EnvelopePoint {
                    time: p.time + located.start_time,
                    speed: p.speed,
                    position: p.position + located.start_offset,
                })
            })
            .collect()
    }
}
