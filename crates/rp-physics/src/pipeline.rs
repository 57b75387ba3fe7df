//! Staged envelope construction.
//!
//! 1. [`mrsp`] — the most restrictive speed profile: track speed limits
//!    intersected with the stock's maximum speed, as flat envelope parts.
//! 2. [`max_speed_envelope`] — overlays backward braking curves onto every
//!    speed decrease and stop, so the profile respects the braking policy.
//! 3. [`max_effort_envelope`] — integrates forward from the entry speed
//!    under traction, power, and acceleration limits.
//!
//! `max_speed_envelope` is also the continuity patch applied to stitched
//! route-transition envelopes: a stitched profile whose next section starts
//! slower than the previous one ends is exactly a "speed decrease" in the
//! sense of stage 2.

use rp_core::RangeProfile;
use rp_envelope::{Envelope, EnvelopePart, POSITION_EPSILON, SPEED_EPSILON};
use tracing::trace;

use crate::error::{PhysicsError, PhysicsResult};
use crate::integrator::{Action, EnvelopeSimContext, IntegrationStep, step, step_back};

/// Bisection iterations when pinning a curve/ceiling intersection.
const INTERSECT_ITERS: u32 = 50;

// ── Stage 1: most restrictive speed profile ───────────────────────────────────

/// Build the speed ceiling over the whole path from the route's speed-limit
/// profile and the stock's maximum speed.  Gaps in the profile default to
/// the stock limit.
///
/// # Panics
///
/// Panics if any limit is non-positive: a zero speed limit cannot be part
/// of a traversable profile.
pub fn mrsp(ctx: &EnvelopeSimContext<'_>, speed_limits: &RangeProfile<f64>) -> Envelope {
    let length = ctx.path.length;
    let stock_max = ctx.stock.max_speed;
    let parts: Vec<EnvelopePart> = speed_limits
        .segments(0.0, length)
        .into_iter()
        .map(|(begin, end, limit)| {
            let v = limit.copied().unwrap_or(f64::INFINITY).min(stock_max);
            assert!(v > 0.0, "non-positive speed limit at {begin}");
            EnvelopePart::flat(begin, end, v)
        })
        .collect();
    Envelope::make(parts)
}

// ── Stage 2: braking-constrained profile ──────────────────────────────────────

/// Overlay braking curves onto `ceiling` so that every speed decrease and
/// every stop position is reachable under the stock's braking policy.
///
/// The input may be discontinuous (a stitched profile); the output is
/// continuous wherever a braking curve was inserted.
pub fn max_speed_envelope(
    ctx: &EnvelopeSimContext<'_>,
    stops: &[f64],
    ceiling: &Envelope,
) -> Envelope {
    // Braking targets: every downward speed discontinuity, plus each stop.
    let mut targets: Vec<(f64, f64)> = Vec::new();
    let parts = ceiling.parts();
    for pair in parts.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.begin_speed() < prev.end_speed() - SPEED_EPSILON {
            targets.push((next.begin_pos(), next.begin_speed()));
        }
    }
    for &stop in stops {
        targets.push((stop, 0.0));
    }
    targets.sort_by(|a, b| a.0.total_cmp(&b.0));
    trace!(targets = targets.len(), "computing braking curves");

    let braking_parts: Vec<EnvelopePart> = targets
        .into_iter()
        .filter_map(|(pos, speed)| backward_braking_part(ctx, ceiling, pos, speed))
        .collect();

    overlay(ceiling, braking_parts)
}

/// Integrate a braking curve backward from `(target_pos, target_speed)`
/// until it meets `ceiling` (or the ceiling's begin position).  Returns
/// `None` when the target already sits on or above the ceiling.
fn backward_braking_part(
    ctx: &EnvelopeSimContext<'_>,
    ceiling: &Envelope,
    target_pos: f64,
    target_speed: f64,
) -> Option<EnvelopePart> {
    let begin_limit = ceiling.begin_pos();
    // The ceiling just before the target; at a discontinuity the earlier
    // (faster) side is what the curve must duck under.
    let approach = (target_pos - POSITION_EPSILON).max(begin_limit);
    if target_speed >= ceiling.interpolate_speed(approach) - SPEED_EPSILON {
        return None;
    }

    let mut positions = vec![target_pos];
    let mut speeds = vec![target_speed];
    let mut x = target_pos;
    let mut v = target_speed;

    while x > begin_limit + POSITION_EPSILON {
        let st = step_back(ctx, x, v, Action::Brake, x - begin_limit);
        let new_x = x + st.position_delta;
        let new_v = st.end_speed;
        if new_v <= v + 1e-12 {
            break; // deceleration vanished; give up rather than loop
        }

        let limit = ceiling.interpolate_speed(new_x.max(begin_limit));
        if new_v >= limit - SPEED_EPSILON {
            let (ix, iv) = intersect_backward(ceiling, x, v, &st);
            if ix < x - POSITION_EPSILON {
                positions.push(ix);
                speeds.push(iv);
            }
            break;
        }

        positions.push(new_x);
        speeds.push(new_v);
        x = new_x;
        v = new_v;
    }

    if positions.len() < 2 {
        return None;
    }
    positions.reverse();
    speeds.reverse();
    Some(EnvelopePart::new(positions, speeds))
}

/// Pin the position where a backward braking step crosses the ceiling.
/// Returns the crossing position and the ceiling speed there, so the joined
/// envelope is exactly continuous.
fn intersect_backward(ceiling: &Envelope, x: f64, v: f64, st: &IntegrationStep) -> (f64, f64) {
    // Backward motion within the step: v(τ) = v + s·τ, x(τ) = x − (v·τ + ½s·τ²).
    let s = -st.acceleration;
    let begin = ceiling.begin_pos();
    let eval = |tau: f64| {
        let pos = (x - (v * tau + 0.5 * s * tau * tau)).max(begin);
        let speed = v + s * tau;
        (pos, speed)
    };

    let (mut lo, mut hi) = (0.0, st.time_delta);
    for _ in 0..INTERSECT_ITERS {
        let mid = (lo + hi) / 2.0;
        let (pos, speed) = eval(mid);
        if speed >= ceiling.interpolate_speed(pos) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    let (pos, _) = eval(hi);
    (pos, ceiling.interpolate_speed(pos))
}

/// Splice braking parts under the ceiling: ceiling slices fill the space
/// between braking curves, and overlapping braking curves are truncated at
/// the previous curve's end.
fn overlay(ceiling: &Envelope, mut braking_parts: Vec<EnvelopePart>) -> Envelope {
    braking_parts.sort_by(|a, b| a.begin_pos().total_cmp(&b.begin_pos()));

    let mut parts: Vec<EnvelopePart> = Vec::new();
    let mut cursor = ceiling.begin_pos();
    for part in braking_parts {
        if part.begin_pos() > cursor + POSITION_EPSILON {
            parts.extend(ceiling.slice(cursor, part.begin_pos()).parts().iter().cloned());
            cursor = part.begin_pos();
        }
        let part = if part.begin_pos() < cursor - POSITION_EPSILON {
            match part.slice(cursor, part.end_pos()) {
                Some(p) => p,
                None => continue,
            }
        } else {
            part
        };
        cursor = part.end_pos();
        parts.push(part);
    }
    if cursor < ceiling.end_pos() - POSITION_EPSILON {
        parts.extend(ceiling.slice(cursor, ceiling.end_pos()).parts().iter().cloned());
    }
    Envelope::make(parts)
}

// ── Stage 3: traction-limited profile ─────────────────────────────────────────

/// Integrate forward from `initial_speed` under traction, power, and
/// acceleration limits, following `max_speed_env` once reached.
///
/// An entry speed above the ceiling is clamped onto it: the resulting
/// boundary discontinuity belongs to the *caller's* frame and is patched by
/// the stitched-envelope braking pass.
///
/// Draining the context's energy sources happens step by step, so an
/// exhausted reservoir lowers the achievable acceleration further along the
/// path.  Returns [`PhysicsError::Stalled`] if the train cannot make
/// forward progress (e.g. all power gone on a climb).
pub fn max_effort_envelope(
    ctx: &mut EnvelopeSimContext<'_>,
    initial_speed: f64,
    max_speed_env: &Envelope,
) -> PhysicsResult<Envelope> {
    let begin = max_speed_env.begin_pos();
    let end = max_speed_env.end_pos();
    let ceiling_at_start = max_speed_env.interpolate_speed(begin);

    let mut x = begin;
    let mut v = initial_speed.min(ceiling_at_start);
    let mut elapsed = 0.0;
    let mut parts: Vec<EnvelopePart> = Vec::new();

    if v < ceiling_at_start - SPEED_EPSILON {
        let mut positions = vec![x];
        let mut speeds = vec![v];

        while x < end - POSITION_EPSILON {
            let cap = ctx.stock.accel_cap(elapsed);
            let st = step(ctx, x, v, Action::Accelerate, cap, end - x);
            if st.position_delta <= POSITION_EPSILON && st.end_speed <= v + 1e-12 {
                return Err(PhysicsError::Stalled(x));
            }
            let new_x = x + st.position_delta;
            let new_v = st.end_speed;
            ctx.drain(x, st.traction_force, v, st.time_delta);
            elapsed += st.time_delta;

            let limit = max_speed_env.interpolate_speed(new_x.min(end));
            if new_v >= limit - SPEED_EPSILON {
                let (ix, iv) = intersect_forward(max_speed_env, x, v, &st);
                if ix > x + POSITION_EPSILON {
                    positions.push(ix);
                    speeds.push(iv);
                }
                x = ix;
                break;
            }

            positions.push(new_x);
            speeds.push(new_v);
            x = new_x;
            v = new_v;
        }

        if positions.len() >= 2 {
            parts.push(EnvelopePart::new(positions, speeds));
        }
    }

    // Past the acceleration phase: ride the ceiling to the end.
    if x < end - POSITION_EPSILON {
        parts.extend(max_speed_env.slice(x, end).parts().iter().cloned());
    }

    let envelope = Envelope::make(parts);
    debug_assert!(envelope.is_continuous(), "max-effort envelope must be continuous");
    Ok(envelope)
}

/// Pin the position where a forward acceleration step crosses the ceiling.
fn intersect_forward(ceiling: &Envelope, x: f64, v: f64, st: &IntegrationStep) -> (f64, f64) {
    let a = st.acceleration;
    let end = ceiling.end_pos();
    let eval = |tau: f64| {
        let pos = (x + v * tau + 0.5 * a * tau * tau).min(end);
        let speed = v + a * tau;
        (pos, speed)
    };

    let (mut lo, mut hi) = (0.0, st.time_delta);
    for _ in 0..INTERSECT_ITERS {
        let mid = (lo + hi) / 2.0;
        let (pos, speed) = eval(mid);
        if speed >= ceiling.interpolate_speed(pos) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    let (pos, _) = eval(hi);
    (pos, ceiling.interpolate_speed(pos))
}

// ── Convenience ───────────────────────────────────────────────────────────────

/// Run the full pipeline over the context's path: ceiling, braking pass,
/// then forward integration from `initial_speed`, stopping at `stops`.
pub fn route_envelope(
    ctx: &mut EnvelopeSimContext<'_>,
    speed_limits: &RangeProfile<f64>,
    initial_speed: f64,
    stops: &[f64],
) -> PhysicsResult<Envelope> {
    let ceiling = mrsp(ctx, speed_limits);
    let braked = max_speed_envelope(ctx, stops, &ceiling);
    max_effort_envelope(ctx, initial_speed, &braked)
}
