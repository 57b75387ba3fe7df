//! `rp-envelope` — continuous speed-over-position trajectories.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                |
//! |----------------|---------------------------------------------------------|
//! | [`part`]       | `EnvelopePart` — one monotonic-in-position segment      |
//! | [`envelope`]   | `Envelope` — contiguous part sequence, time lookup      |
//! | [`concat`]     | `LocatedEnvelope`, `EnvelopeConcat` — copy-free joins   |
//! | [`stops`]      | `TrainStop`, `EnvelopeStopWrapper`                      |
//! | [`trajectory`] | `TimeInterpolate` trait, `Trajectory` tagged variants   |
//!
//! # Model
//!
//! An envelope maps track position to speed; time follows by integrating
//! 1/v over position.  Between two samples the speed is assumed to change
//! under constant acceleration, so v² is linear in position and each step's
//! duration is `2·Δx / (v₀ + v₁)`.
//!
//! All positions are metres from the start of the owning frame, speeds are
//! m/s, times are seconds.  Envelopes are immutable once built; slicing and
//! shifting produce new values and never mutate shared data.
//!
//! # Contract style
//!
//! Malformed construction input (unsorted positions, gaps between parts) and
//! out-of-range interpolation are caller bugs: they panic rather than return
//! errors.  The `*_clamp` interpolation variants never panic.

pub mod concat;
pub mod envelope;
pub mod part;
pub mod stops;
pub mod trajectory;

#[cfg(test)]
mod tests;

/// Tolerance below which two positions are considered the same point.
pub const POSITION_EPSILON: f64 = 1e-6;

/// Tolerance below which two speeds are considered equal, used by the
/// `continuous` invariant check at part boundaries.
pub const SPEED_EPSILON: f64 = 1e-6;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use concat::{EnvelopeConcat, LocatedEnvelope};
pub use envelope::Envelope;
pub use part::EnvelopePart;
pub use stops::{EnvelopeStopWrapper, TrainStop};
pub use trajectory::{EnvelopePoint, TimeInterpolate, Trajectory};
