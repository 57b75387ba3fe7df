//! Physics crate error type.

use thiserror::Error;

/// Errors raised while validating rolling stock descriptions.
///
/// Runtime physics never errors: energy deficits reduce delivered force, and
/// infeasible profiles surface as envelopes the search rejects.
#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("effort curve has no points")]
    EmptyEffortCurve,

    #[error("effort curve speeds must be strictly increasing (at {speed} m/s)")]
    UnsortedEffortCurve { speed: f64 },

    #[error("effort curve force must be non-negative (at {speed} m/s)")]
    NegativeEffort { speed: f64 },

    #[error("rolling stock has no traction mode named {0:?}")]
    UnknownMode(String),

    #[error("invalid rolling stock: {0}")]
    InvalidStock(String),

    /// The train cannot make forward progress (e.g. exhausted energy
    /// sources on a climb).  Callers treat the affected candidate as
    /// infeasible; this is not a caller bug.
    #[error("train stalls at position {0}")]
    Stalled(f64),
}

/// Shorthand result type for `rp-physics`.
pub type PhysicsResult<T> = Result<T, PhysicsError>;
