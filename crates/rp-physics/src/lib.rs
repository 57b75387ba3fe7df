//! `rp-physics` — rolling stock physics and envelope construction.
//!
//! # Crate layout
//!
//! | Module           | Contents                                               |
//! |------------------|--------------------------------------------------------|
//! | [`rolling_stock`]| `RollingStock`, effort curves, braking policy          |
//! | [`energy`]       | `EnergySource` variants and storage bookkeeping        |
//! | [`path`]         | `PhysicsPath` — grade/electrification over position    |
//! | [`integrator`]   | Force balance and RK4 integration steps                |
//! | [`pipeline`]     | `mrsp` → `max_speed_envelope` → `max_effort_envelope`  |
//! | [`error`]        | `PhysicsError`, `PhysicsResult<T>`                     |
//!
//! # Pipeline
//!
//! Envelope construction is staged.  The *most restrictive speed profile*
//! (`mrsp`) intersects the track's speed limits with the stock's maximum
//! speed.  `max_speed_envelope` then overlays backward braking curves onto
//! every speed decrease and stop so the profile is reachable under the
//! stock's braking policy.  Finally `max_effort_envelope` integrates forward
//! from the entry speed under traction and power limits.  Each stage only
//! consumes the previous stage's output and explicit context — there is no
//! global simulation state.

pub mod energy;
pub mod error;
pub mod integrator;
pub mod path;
pub mod pipeline;
pub mod rolling_stock;


/// Standard gravity, m/s².
pub const GRAVITY: f64 = 9.81;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use energy::{EnergySource, EnergyStorage};
pub use error::{PhysicsError, PhysicsResult};
pub use integrator::{Action, EnvelopeSimContext, IntegrationStep};
pub use path::PhysicsPath;
pub use rolling_stock::{
    Comfort, ConditionalEffortCurve, CurvePoint, EffortCurve, EffortCurveConditions, Gamma,
    ModeEffortCurves, RollingStock,
};
