//! Stop-duration wrapper over a trajectory.

use crate::trajectory::{EnvelopePoint, TimeInterpolate, Trajectory};

/// A scheduled stop on the trajectory's position axis.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainStop {
    /// Metres from the start of the trajectory.
    pub position: f64,
    /// Dwell duration, in seconds.
    pub duration: f64,
}

/// Wraps a trajectory and splices stop durations into its time axis.
///
/// The position axis is unchanged; every interpolated time past a stop is
/// shifted by the accumulated dwell durations.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvelopeStopWrapper {
    envelope: Box<Trajectory>,
    stops: Vec<TrainStop>,
}

impl EnvelopeStopWrapper {
    /// Wrap `envelope` with `stops`.
    ///
    /// # Panics
    ///
    /// Panics if stops are not sorted by position or any dwell duration is
    /// negative.
    pub fn new(envelope: Trajectory, stops: Vec<TrainStop>) -> Self {
        assert!(
            stops.windows(2).all(|w| w[0].position <= w[1].position),
            "stops must be sorted by position"
        );
        assert!(stops.iter().all(|s| s.duration >= 0.0), "negative stop duration");
        Self { envelope: Box::new(envelope), stops }
    }

    pub fn stops(&self) -> &[TrainStop] {
        &self.stops
    }
}

impl TimeInterpolate for EnvelopeStopWrapper {
    fn interpolate_total_time(&self, position: f64) -> f64 {
        let stop_time: f64 = self
            .stops
            .iter()
            .take_while(|stop| stop.position <= position)
            .map(|stop| stop.duration)
            .sum();
        stop_time + self.envelope.interpolate_total_time(position)
    }

    fn interpolate_total_time_clamp(&self, position: f64) -> f64 {
        self.interpolate_total_time(position.clamp(self.envelope.begin_pos(), self.envelope.end_pos()))
    }

    fn begin_pos(&self) -> f64 {
        self.envelope.begin_pos()
    }

    fn end_pos(&self) -> f64 {
        self.envelope.end_pos()
    }

    fn total_time(&self) -> f64 {
        self.envelope.total_time() + self.stops.iter().map(|s| s.duration).sum::<f64>()
    }

    /// All points with times shifted by the dwell durations passed so far.
    fn iterate_points(&self) -> Vec<EnvelopePoint> {
        let mut res = Vec::new();
        let mut elapsed_stop_time = 0.0;
        let mut stop_idx = 0;
        for point in self.envelope.iterate_points() {
            res.push(EnvelopePoint { time: point.time + elapsed_stop_time, ..point });
            if stop_idx < self.stops.len() && point.position >= self.stops[stop_idx].position {
                elapsed_stop_time += self.stops[stop_idx].duration;
                stop_idx += 1;
            }
        }
        res
    }
}
