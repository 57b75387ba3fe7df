//! Numerical integration of train motion.
//!
//! All state is passed explicitly: the integrator reads the rolling stock,
//! the path, and the per-computation energy state through
//! [`EnvelopeSimContext`] and returns plain [`IntegrationStep`] values.
//! Speeds are magnitudes (≥ 0); the traversal direction only affects the
//! sign of position deltas and the sense in which speed evolves.

use crate::GRAVITY;
use crate::energy::{EnergySource, update_storages};
use crate::path::PhysicsPath;
use crate::rolling_stock::{Comfort, Gamma, RollingStock};

/// Everything an envelope computation needs, bundled once.
///
/// The context clones the stock's energy sources so that draining them while
/// integrating never touches the shared, read-only `RollingStock`.
pub struct EnvelopeSimContext<'a> {
    pub stock: &'a RollingStock,
    pub path: &'a PhysicsPath,
    /// Integration time step, seconds.
    pub time_step: f64,
    pub comfort: Comfort,
    energy: Vec<EnergySource>,
}

impl<'a> EnvelopeSimContext<'a> {
    /// # Panics
    ///
    /// Panics if `time_step <= 0`.
    pub fn new(stock: &'a RollingStock, path: &'a PhysicsPath, time_step: f64, comfort: Comfort) -> Self {
        assert!(time_step > 0.0, "integration time step must be positive");
        Self {
            stock,
            path,
            time_step,
            comfort,
            energy: stock.energy_sources.clone(),
        }
    }

    /// Current per-computation energy state.
    pub fn energy_sources(&self) -> &[EnergySource] {
        &self.energy
    }

    /// Gravity component along the track under the train, in newtons.
    /// Negative uphill (it opposes forward motion).
    pub fn weight_force(&self, pos: f64) -> f64 {
        // Grade is m/km; the curve radius correction is folded into the
        // profile upstream.
        let grade = self.path.average_grade(pos, self.stock.length);
        let angle = (grade / 1000.0).atan();
        -self.stock.mass * GRAVITY * angle.sin()
    }

    /// Power currently available from the (possibly drained) sources, watts.
    fn available_power(&self, speed: f64, electrified: bool) -> f64 {
        self.energy
            .iter()
            .map(|s| s.max_output_power(speed, electrified))
            .sum()
    }

    /// Maximum tractive force at `(pos, speed)`: the matching effort curve,
    /// bounded by available power when moving.
    pub fn max_effort_at(&self, pos: f64, speed: f64) -> f64 {
        let electrified = self.path.is_electrified(pos);
        let curve = self.stock.curve_for(electrified, self.comfort);
        let force = curve.interpolate(speed);
        if speed <= 0.0 {
            return force;
        }
        force.min(self.available_power(speed, electrified) / speed)
    }

    /// Account one step's traction energy against the context's sources.
    pub fn drain(&mut self, pos: f64, traction_force: f64, speed: f64, time_delta: f64) {
        let electrified = self.path.is_electrified(pos);
        update_storages(&mut self.energy, traction_force, speed, time_delta, electrified);
    }
}

// ── Actions & steps ───────────────────────────────────────────────────────────

/// What the train is doing over an integration step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Full available traction, subject to the acceleration cap.
    Accelerate,
    /// No traction, no brake; resistance and grade only.
    Coast,
    /// Braking per the stock's [`Gamma`] policy.
    Brake,
}

/// The outcome of one integration step.
#[derive(Copy, Clone, Debug)]
pub struct IntegrationStep {
    /// Elapsed time, seconds.  Always ≥ 0.
    pub time_delta: f64,
    /// Signed position change; negative when integrating backward.
    pub position_delta: f64,
    /// Speed magnitude at the end of the step, ≥ 0.
    pub end_speed: f64,
    /// Mean acceleration applied over the step (forward frame).
    pub acceleration: f64,
    /// Mean traction force applied over the step, newtons.
    pub traction_force: f64,
}

/// Acceleration and traction force at one evaluation point.
///
/// `accel_cap` bounds the acceleration while accelerating (comfort/startup
/// ceiling); pass `f64::INFINITY` when no cap applies.
pub fn compute_acceleration(
    ctx: &EnvelopeSimContext<'_>,
    pos: f64,
    speed: f64,
    action: Action,
    accel_cap: f64,
) -> (f64, f64) {
    let inertia = ctx.stock.inertia();
    let resistance = ctx.stock.rolling_resistance(speed);
    debug_assert!(resistance >= 0.0);
    let weight = ctx.weight_force(pos);

    // Constant-deceleration braking subsumes every other force.
    if action == Action::Brake {
        if let Gamma::Const(gamma) = ctx.stock.gamma {
            return (-gamma, 0.0);
        }
    }

    let (traction, brake) = match action {
        Action::Accelerate => (ctx.max_effort_at(pos, speed), 0.0),
        Action::Coast => (0.0, 0.0),
        Action::Brake => (0.0, ctx.stock.max_braking_force(speed)),
    };
    let opposing = resistance + brake;

    if speed == 0.0 {
        // A stopped train only moves if the driving forces beat the
        // opposing ones; otherwise resistance holds it in place.
        let driving = traction + weight;
        if driving.abs() <= opposing {
            return (0.0, traction);
        }
        let acceleration = (driving - opposing.copysign(driving)) / inertia;
        return cap_acceleration(acceleration, traction, accel_cap, weight, resistance, inertia);
    }

    // Moving forward: resistance and brake oppose the motion.
    let acceleration = (traction + weight - opposing) / inertia;
    match action {
        Action::Accelerate => {
            cap_acceleration(acceleration, traction, accel_cap, weight, resistance, inertia)
        }
        _ => (acceleration, traction),
    }
}

/// Clamp an accelerating step to `accel_cap`, recomputing the traction force
/// actually applied so energy accounting stays consistent.
fn cap_acceleration(
    acceleration: f64,
    traction: f64,
    accel_cap: f64,
    weight: f64,
    resistance: f64,
    inertia: f64,
) -> (f64, f64) {
    if acceleration <= accel_cap {
        return (acceleration, traction);
    }
    let traction = (accel_cap * inertia - weight + resistance).max(0.0);
    (accel_cap, traction)
}

/// Integrate one forward step with RK4 (1-2-2-1 weighting), truncated at
/// zero speed and at `max_distance`.
pub fn step(
    ctx: &EnvelopeSimContext<'_>,
    pos: f64,
    speed: f64,
    action: Action,
    accel_cap: f64,
    max_distance: f64,
) -> IntegrationStep {
    let h = ctx.time_step;
    let half = h / 2.0;

    let eval = |offset: f64, v: f64| {
        compute_acceleration(ctx, pos + offset, v.max(0.0), action, accel_cap)
    };

    let (a1, f1) = eval(0.0, speed);
    let v1 = (speed + a1 * half).max(0.0);
    let d1 = v1 * half + 0.5 * a1 * half * half;

    let (a2, f2) = eval(d1, v1);
    let v2 = (speed + a2 * half).max(0.0);
    let d2 = v2 * half + 0.5 * a2 * half * half;

    let (a3, f3) = eval(d2, v2);
    let v3 = (speed + a3 * h).max(0.0);
    let d3 = v3 * h + 0.5 * a3 * h * h;

    let (a4, f4) = eval(d3, v3);

    let acceleration = (a1 + 2.0 * a2 + 2.0 * a3 + a4) / 6.0;
    let traction = (f1 + 2.0 * f2 + 2.0 * f3 + f4) / 6.0;

    step_from_acceleration(ctx, speed, acceleration, traction, max_distance, 1.0)
}

/// Integrate one backward step (toward lower positions), evaluating the
/// forces once at the current point.  Used for braking-curve construction,
/// where the deceleration varies slowly along the curve.
pub fn step_back(
    ctx: &EnvelopeSimContext<'_>,
    pos: f64,
    speed: f64,
    action: Action,
    max_distance: f64,
) -> IntegrationStep {
    let (acceleration, traction) =
        compute_acceleration(ctx, pos, speed, action, f64::INFINITY);
    step_from_acceleration(ctx, speed, acceleration, traction, max_distance, -1.0)
}

/// Turn a mean acceleration into a bounded step.
///
/// `direction` is +1 when traversing forward and −1 when integrating
/// backward; `max_distance` is the positive distance bound along the
/// traversal.  The step is truncated exactly where the speed reaches zero
/// or the distance bound is hit.
fn step_from_acceleration(
    ctx: &EnvelopeSimContext<'_>,
    speed: f64,
    acceleration: f64,
    traction_force: f64,
    max_distance: f64,
    direction: f64,
) -> IntegrationStep {
    debug_assert!(max_distance >= 0.0);
    // Speed slope along the traversal: braking backward *raises* the speed.
    let slope = direction * acceleration;

    let mut time_delta = ctx.time_step;
    let mut end_speed = speed + slope * time_delta;

    // Truncate where the speed crosses zero.
    if speed > 0.0 && end_speed < 1e-10 {
        time_delta = speed / -slope;
        end_speed = 0.0;
    }
    end_speed = end_speed.max(0.0);

    let mut distance = speed * time_delta + 0.5 * slope * time_delta * time_delta;
    distance = distance.max(0.0);

    if distance > max_distance {
        // Solve ½·slope·t² + v₀·t = max_distance for the exact time.
        time_delta = if slope.abs() < 1e-12 {
            max_distance / speed
        } else {
            (-speed + (speed * speed + 2.0 * slope * max_distance).sqrt()) / slope
        };
        distance = max_distance;
        end_speed = (speed + slope * time_delta).max(0.0);
    }

    IntegrationStep {
        time_delta,
        position_delta: direction * distance,
        end_speed,
        acceleration,
        traction_force,
    }
}
