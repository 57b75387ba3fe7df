//! The trajectory capability interface and its closed set of variants.
//!
//! # Design
//!
//! Callers that consume a trajectory only ever need two capabilities:
//! interpolate time at a position, and iterate the sampled points.  The
//! concrete representations — a plain [`Envelope`], a copy-free
//! [`EnvelopeConcat`], a stop-duration [`EnvelopeStopWrapper`] — form a
//! small closed set, so they are modeled as tagged variants behind one
//! trait rather than an open-ended inheritance surface.

use crate::concat::EnvelopeConcat;
use crate::envelope::Envelope;
use crate::stops::EnvelopeStopWrapper;

/// One sampled point of a trajectory.
///
/// Along any traversal, both `position` and `time` are non-decreasing.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvelopePoint {
    /// Seconds from the start of the trajectory.
    pub time: f64,
    /// Speed in m/s.
    pub speed: f64,
    /// Metres from the start of the trajectory.
    pub position: f64,
}

/// The capability interface shared by every trajectory variant.
pub trait TimeInterpolate {
    /// Time required to reach `position`, in seconds.
    ///
    /// # Panics
    ///
    /// Panics if `position` lies outside `[begin_pos, end_pos]`: asking for
    /// a time outside the trajectory is a caller bug, not a recoverable
    /// condition.
    fn interpolate_total_time(&self, position: f64) -> f64;

    /// Like [`interpolate_total_time`](Self::interpolate_total_time), but
    /// clamps `position` into `[begin_pos, end_pos]` first.  Never panics.
    fn interpolate_total_time_clamp(&self, position: f64) -> f64;

    /// Start position of the trajectory (0 for all concatenations).
    fn begin_pos(&self) -> f64;

    /// End position of the trajectory.
    fn end_pos(&self) -> f64;

    /// Total traversal time, in seconds.
    fn total_time(&self) -> f64;

    /// All sampled points, shifted into the trajectory's own frame, in
    /// traversal order.  Positions and times are non-decreasing.
    fn iterate_points(&self) -> Vec<EnvelopePoint>;
}

/// A trajectory value: the closed set of concrete representations.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Trajectory {
    /// A single built envelope.
    Plain(Envelope),
    /// A sequence of located sub-envelopes, joined without deep copies.
    Concat(EnvelopeConcat),
    /// A trajectory with stop durations spliced into its time axis.
    WithStops(EnvelopeStopWrapper),
}

impl Trajectory {
    fn inner(&self) -> &dyn TimeInterpolate {
        match self {
            Trajectory::Plain(e) => e,
            Trajectory::Concat(c) => c,
            Trajectory::WithStops(s) => s,
        }
    }
}

impl TimeInterpolate for Trajectory {
    fn interpolate_total_time(&self, position: f64) -> f64 {
        self.inner().interpolate_total_time(position)
    }

    fn interpolate_total_time_clamp(&self, position: f64) -> f64 {
        self.inner().interpolate_total_time_clamp(position)
    }

    fn begin_pos(&self) -> f64 {
        self.inner().begin_pos()
    }

    fn end_pos(&self) -> f64 {
        self.inner().end_pos()
    }

    fn total_time(&self) -> f64 {
        self.inner().total_time()
    }

    fn iterate_points(&self) -> Vec<EnvelopePoint> {
        self.inner().iterate_points()
    }
}

impl From<Envelope> for Trajectory {
    fn from(envelope: Envelope) -> Self {
        Trajectory::Plain(envelope)
    }
}

impl From<EnvelopeConcat> for Trajectory {
    fn from(concat: EnvelopeConcat) -> Self {
        Trajectory::Concat(concat)
    }
}

impl From<EnvelopeStopWrapper> for Trajectory {
    fn from(wrapper: EnvelopeStopWrapper) -> Self {
        Trajectory::WithStops(wrapper)
    }
}
