//! `rp-core` — foundational types for the `railplan` workspace.
//!
//! This crate is a dependency of every other `rp-*` crate.  It intentionally
//! has no `rp-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                             |
//! |-------------|------------------------------------------------------|
//! | [`ids`]     | `RouteId`, `TrackId`                                 |
//! | [`geo`]     | `GeoPoint`, haversine distance, interpolation        |
//! | [`ranges`]  | `RangeProfile<T>` — interval-tagged profiles         |
//! | [`config`]  | `PlanningConfig`                                     |
//! | [`error`]   | `CoreError`, `CoreResult`                            |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                    |
//! |---------|-----------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.       |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod ranges;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::PlanningConfig;
pub use error::{CoreError, CoreResult};
pub use geo::GeoPoint;
pub use ids::{RouteId, TrackId};
pub use ranges::RangeProfile;
