//! Physical description of a path: grade and electrification by position.

use rp_core::RangeProfile;

/// Grade and electrification profiles over a path of the given length.
///
/// Positions are metres from the path start.  Grade is in metres per
/// kilometre, positive uphill; positions not covered by a grade range are
/// level, positions not covered by an electrification range are not
/// electrified.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhysicsPath {
    pub length: f64,
    pub grade: RangeProfile<f64>,
    pub electrified: RangeProfile<bool>,
}

impl PhysicsPath {
    pub fn new(length: f64, grade: RangeProfile<f64>, electrified: RangeProfile<bool>) -> Self {
        assert!(length > 0.0, "a physics path needs a positive length");
        Self { length, grade, electrified }
    }

    /// A level, unelectrified path — the common test fixture.
    pub fn flat(length: f64) -> Self {
        Self::new(length, RangeProfile::new(), RangeProfile::new())
    }

    /// Mean grade under a train spanning `[head - train_length, head]`,
    /// clipped to the path, in m/km.
    pub fn average_grade(&self, head: f64, train_length: f64) -> f64 {
        let begin = (head - train_length).max(0.0);
        let end = head.clamp(0.0, self.length);
        if end - begin < 1e-9 {
            return self.grade.value_at(end.min(self.length - 1e-9).max(0.0)).copied().unwrap_or(0.0);
        }
        self.grade.mean_weighted(begin, end, 0.0)
    }

    /// `true` if the track under `pos` is electrified.
    #[inline]
    pub fn is_electrified(&self, pos: f64) -> bool {
        self.electrified.value_at(pos).copied().unwrap_or(false)
    }
}
