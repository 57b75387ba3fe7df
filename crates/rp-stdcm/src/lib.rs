//! `rp-stdcm` — inserting one more train into an already-reserved network.
//!
//! Short-term capacity management: given the network, a rolling stock, and
//! every other train's reserved occupancy windows, find a route to a
//! destination whose physics-computed trajectory avoids all reservations,
//! waiting where needed.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`occupancy`] | `OccupancyBlock`, `OccupancyMap`, free-window complement |
//! | [`graph`]     | `SearchGraph` — lazy `(route, entry time)` edge arena    |
//! | [`heuristic`] | Geographic remaining-distance estimator                  |
//! | [`pathfinder`]| A* over the lazy graph, `find_path` entry point          |
//! | [`observer`]  | `SearchObserver` progress/cancellation hooks             |
//! | [`result`]    | `StdcmResult` assembly and continuity patching           |
//!
//! # Outcomes
//!
//! A saturated network is a *normal* outcome: [`pathfinder::find_path`]
//! returns `None` and the caller decides whether to relax constraints or
//! report "no capacity".  Panics are reserved for malformed inputs
//! (locations that do not exist on the network).

pub mod graph;
pub mod heuristic;
pub mod observer;
pub mod occupancy;
pub mod pathfinder;
pub mod result;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use graph::{EdgeIdx, SearchEdge, SearchGraph};
pub use heuristic::RemainingDistanceEstimator;
pub use observer::{NoopObserver, SearchObserver};
pub use occupancy::{OccupancyBlock, OccupancyMap};
pub use pathfinder::{RouteLocation, find_path};
pub use result::{RouteRange, StdcmResult};
