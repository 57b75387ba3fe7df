//! Infrastructure crate error type.

use rp_core::{RouteId, TrackId};
use thiserror::Error;

/// Errors raised while assembling a network description.
///
/// These are *data* errors a caller can fix and retry.  Querying a built
/// network with an impossible position (an offset no track range covers) is
/// a caller bug and panics instead.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("track {0} not found")]
    TrackNotFound(TrackId),

    #[error("route {0} not found")]
    RouteNotFound(RouteId),

    #[error("route has no track ranges")]
    EmptyRoute,

    #[error("track range [{begin}, {end}] exceeds track {track} (length {length})")]
    RangeOutOfTrack { track: TrackId, begin: f64, end: f64, length: f64 },
}

/// Shorthand result type for `rp-infra`.
pub type InfraResult<T> = Result<T, InfraError>;
