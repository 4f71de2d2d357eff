//! Wake decay - advances client-only wake samples once per server tick

use tracing::trace;

use crate::util::time::tick_delta;
use crate::util::vector::{add, mul, Vec2};

use super::registry::{EntityRegistry, WakeCurve};

/// Ticks over which a wake sample fades from full to transparent
pub const WAKE_FADE_TICKS: f64 = 200.0;

/// Opacity of a wake sample with `ttl` ticks left, in [0, 1]
pub fn wake_fade(ttl: u32) -> f64 {
    (f64::from(ttl) / WAKE_FADE_TICKS).clamp(0.0, 1.0)
}

/// Age one curve by a tick. Expired samples are dropped before anything
/// moves, so a sample with `ttl == 0` never gets an extra step.
pub fn step_curve(curve: &mut WakeCurve, dt: f64) {
    curve.segments.retain_mut(|segment| {
        if segment.ttl == 0 {
            return false;
        }
        segment.ttl -= 1;
        segment.pos = add(segment.pos, mul(segment.v, Vec2::splat(dt)));
        true
    });
}

/// Advance every wake curve by one tick and drop the ones left empty.
/// Returns the number of curves removed.
pub fn step(registry: &mut EntityRegistry) -> usize {
    let dt = tick_delta();
    let mut emptied = Vec::new();

    for (key, curve) in registry.wake_curves_mut() {
        step_curve(curve, dt);
        if curve.segments.is_empty() {
            emptied.push(key);
        }
    }

    for key in &emptied {
        registry.remove(*key);
        trace!(?key, "Wake curve fully decayed");
    }

    emptied.len()
}
