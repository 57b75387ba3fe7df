//! `rp-infra` — the read-only infrastructure view the planning core consumes.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`network`] | `RailNetwork` (routes, tracks, CSR successors, R-tree),    |
//! |             | `RailNetworkBuilder`, `TrackRange`                         |
//! | [`error`]   | `InfraError`, `InfraResult<T>`                             |
//!
//! Topology construction (detectors, switches, interlocking) belongs to an
//! external collaborator; this crate only models what the search and the
//! physics pipeline read: route lengths, the track-range decomposition of
//! each route, per-track geometry for the geographic heuristic, and
//! grade/electrification/speed-limit profiles.

pub mod error;
pub mod network;


pub use error::{InfraError, InfraResult};
pub use network::{RailNetwork, RailNetworkBuilder, TrackRange};
