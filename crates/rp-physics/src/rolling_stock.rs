//! The immutable characteristics of a specific train.

use std::collections::BTreeMap;

use crate::energy::EnergySource;
use crate::error::{PhysicsError, PhysicsResult};

// ── Effort curves ─────────────────────────────────────────────────────────────

/// One sample of a tractive-effort curve: the maximum force the stock can
/// develop at a given speed.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurvePoint {
    /// Speed in m/s.
    pub speed: f64,
    /// Maximum tractive force at that speed, in newtons.
    pub max_effort: f64,
}

/// A tractive-effort lookup table, sorted ascending by speed.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffortCurve {
    points: Vec<CurvePoint>,
}

impl EffortCurve {
    /// Validate and build a curve.
    pub fn new(points: Vec<CurvePoint>) -> PhysicsResult<Self> {
        if points.is_empty() {
            return Err(PhysicsError::EmptyEffortCurve);
        }
        for w in points.windows(2) {
            if w[1].speed <= w[0].speed {
                return Err(PhysicsError::UnsortedEffortCurve { speed: w[1].speed });
            }
        }
        if let Some(p) = points.iter().find(|p| p.max_effort < 0.0) {
            return Err(PhysicsError::NegativeEffort { speed: p.speed });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Maximum effort at `speed`: piecewise-linear between samples, flat
    /// extrapolation outside the sampled range.
    pub fn interpolate(&self, speed: f64) -> f64 {
        let speed = speed.abs();
        let first = &self.points[0];
        if speed <= first.speed {
            return first.max_effort;
        }
        let last = self.points.last().unwrap();
        if speed >= last.speed {
            return last.max_effort;
        }

        // First sample strictly above `speed`; the bracketing pair is
        // (idx - 1, idx).
        let idx = self.points.partition_point(|p| p.speed <= speed);
        let (lo, hi) = (&self.points[idx - 1], &self.points[idx]);
        let t = (speed - lo.speed) / (hi.speed - lo.speed);
        lo.max_effort + (hi.max_effort - lo.max_effort) * t
    }
}

/// Conditions under which a tractive-effort curve applies.  A `None` field
/// matches anything.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffortCurveConditions {
    pub comfort: Option<Comfort>,
    pub electrical_profile: Option<String>,
}

impl EffortCurveConditions {
    fn matches(&self, comfort: Comfort, electrical_profile: Option<&str>) -> bool {
        (self.comfort.is_none() || self.comfort == Some(comfort))
            && (self.electrical_profile.is_none()
                || self.electrical_profile.as_deref() == electrical_profile)
    }
}

/// An effort curve guarded by match conditions.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionalEffortCurve {
    pub conditions: EffortCurveConditions,
    pub curve: EffortCurve,
}

/// The effort curves of one traction mode (e.g. "25kV", "diesel").
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeEffortCurves {
    pub is_electric: bool,
    /// Used when no conditional curve matches.
    pub default_curve: EffortCurve,
    pub curves: Vec<ConditionalEffortCurve>,
}

/// On-board comfort setting; heating and air conditioning draw power and get
/// dedicated (slightly derated) effort curves.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Comfort {
    Standard,
    Heating,
    AirConditioning,
}

// ── Braking policy ────────────────────────────────────────────────────────────

/// The stock's deceleration input.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gamma {
    /// A constant total deceleration, already accounting for resistances.
    Const(f64),
    /// The maximum braking capability; resistances and grade still apply on
    /// top of the brake force.
    MaxBraking(f64),
}

impl Gamma {
    /// The deceleration value in m/s², whatever the policy.
    #[inline]
    pub fn value(self) -> f64 {
        match self {
            Gamma::Const(g) | Gamma::MaxBraking(g) => g,
        }
    }
}

// ── RollingStock ──────────────────────────────────────────────────────────────

/// The immutable physical description of a train.
///
/// Constructed once per planning request and shared read-only; all mutable
/// state (energy storage levels) lives in cloned per-computation copies.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollingStock {
    pub name: String,

    /// Davis equation coefficients: resistance = a + b·|v| + c·v².
    /// Units: N, N/(m/s), N/(m/s)².
    pub a: f64,
    pub b: f64,
    pub c: f64,

    /// Train length in metres.
    pub length: f64,
    /// Total mass in kilograms.
    pub mass: f64,
    /// Accounts for rotating masses; inertia = mass × inertia_coefficient.
    pub inertia_coefficient: f64,
    /// Self-imposed maximum speed, m/s.
    pub max_speed: f64,

    /// Acceleration ceiling in regular operation, m/s².
    pub comfort_acceleration: f64,
    /// Acceleration ceiling while starting up, m/s².
    pub startup_acceleration: f64,
    /// Duration of the startup phase from standstill, seconds.
    pub startup_time: f64,

    /// Braking policy.
    pub gamma: Gamma,

    /// Traction modes keyed by name.  A `BTreeMap` keeps mode resolution
    /// deterministic.
    pub modes: BTreeMap<String, ModeEffortCurves>,
    /// Mode used when the requested one is unknown.
    pub default_mode: String,

    /// Energy sources in draining-priority order.
    pub energy_sources: Vec<EnergySource>,
}

impl RollingStock {
    /// Inertia (kg), accounting for rotating masses.
    #[inline]
    pub fn inertia(&self) -> f64 {
        self.mass * self.inertia_coefficient
    }

    /// Rolling and aerodynamic resistance at `speed`, in newtons.  Always
    /// opposes the movement direction; depends only on |v| (Davis equation).
    #[inline]
    pub fn rolling_resistance(&self, speed: f64) -> f64 {
        let speed = speed.abs();
        self.a + self.b * speed + self.c * speed * speed
    }

    /// d/dv of [`rolling_resistance`](Self::rolling_resistance).
    #[inline]
    pub fn rolling_resistance_deriv(&self, speed: f64) -> f64 {
        let speed = speed.abs();
        self.b + 2.0 * self.c * speed
    }

    /// Maximum braking force at any speed, in newtons.
    #[inline]
    pub fn max_braking_force(&self, _speed: f64) -> f64 {
        self.gamma.value() * self.inertia()
    }

    /// Acceleration ceiling `elapsed` seconds into the trip.
    #[inline]
    pub fn accel_cap(&self, elapsed: f64) -> f64 {
        if elapsed < self.startup_time {
            self.startup_acceleration.min(self.comfort_acceleration)
        } else {
            self.comfort_acceleration
        }
    }

    /// The effort curve that matches best: the requested mode's first
    /// conditional curve whose conditions accept `(comfort, profile)`, else
    /// that mode's default curve.  An unknown or absent mode falls back to
    /// `default_mode`.
    ///
    /// # Panics
    ///
    /// Panics if `default_mode` is not a key of `modes` — the stock
    /// description is malformed.
    pub fn find_effort_curve(
        &self,
        mode: Option<&str>,
        electrical_profile: Option<&str>,
        comfort: Comfort,
    ) -> &EffortCurve {
        let mode_curves = mode
            .and_then(|m| self.modes.get(m))
            .unwrap_or_else(|| {
                self.modes
                    .get(&self.default_mode)
                    .expect("rolling stock default_mode missing from modes")
            });
        mode_curves
            .curves
            .iter()
            .find(|c| c.conditions.matches(comfort, electrical_profile))
            .map(|c| &c.curve)
            .unwrap_or(&mode_curves.default_curve)
    }

    /// The effort curve for the given electrification state: the first
    /// matching electric mode under catenary, the first thermal mode
    /// otherwise, falling back to `default_mode`.
    pub fn curve_for(&self, electrified: bool, comfort: Comfort) -> &EffortCurve {
        let mode = self
            .modes
            .iter()
            .find(|(_, m)| m.is_electric == electrified)
            .map(|(name, _)| name.as_str());
        self.find_effort_curve(mode, None, comfort)
    }

    /// Summed power available from all energy sources, in watts.
    pub fn max_traction_power(&self, speed: f64, electrified: bool) -> f64 {
        self.energy_sources
            .iter()
            .map(|s| s.max_output_power(speed, electrified))
            .sum()
    }

    /// Maximum tractive force at `speed` under `curve`, bounded by the
    /// available traction power when moving (force = power / speed).
    pub fn max_effort(&self, speed: f64, curve: &EffortCurve, electrified: bool) -> f64 {
        let force = curve.interpolate(speed);
        if speed <= 0.0 {
            return force;
        }
        force.min(self.max_traction_power(speed, electrified) / speed)
    }

    /// Check the invariants the physics pipeline relies on.
    pub fn validate(&self) -> PhysicsResult<()> {
        if self.mass <= 0.0 || self.inertia_coefficient <= 0.0 {
            return Err(PhysicsError::InvalidStock(format!(
                "mass and inertia coefficient must be positive ({}, {})",
                self.mass, self.inertia_coefficient
            )));
        }
        if self.a < 0.0 || self.b < 0.0 || self.c < 0.0 {
            return Err(PhysicsError::InvalidStock(
                "Davis coefficients must be non-negative".into(),
            ));
        }
        if self.max_speed <= 0.0 {
            return Err(PhysicsError::InvalidStock("max_speed must be positive".into()));
        }
        if self.gamma.value() <= 0.0 {
            return Err(PhysicsError::InvalidStock("deceleration must be positive".into()));
        }
        if !self.modes.contains_key(&self.default_mode) {
            return Err(PhysicsError::UnknownMode(self.default_mode.clone()));
        }
        Ok(())
    }
}
