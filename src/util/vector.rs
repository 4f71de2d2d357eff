//! 2D vector helpers on top of glam
//!
//! World coordinates are meters in `f64`; the wire carries `[x, y]` pairs
//! which glam's serde support reads directly into `DVec2`.

pub use glam::DVec2 as Vec2;

/// Component-wise sum
pub fn add(a: Vec2, b: Vec2) -> Vec2 {
    a + b
}

/// Element-wise product (not a dot product)
pub fn mul(a: Vec2, b: Vec2) -> Vec2 {
    a * b
}

/// Unit vector in the direction of `v`, or zero for a zero-length input
pub fn normalize(v: Vec2) -> Vec2 {
    v.normalize_or_zero()
}

/// Rotate `v` counter-clockwise by `theta` radians
pub fn rotate(v: Vec2, theta: f64) -> Vec2 {
    Vec2::from_angle(theta).rotate(v)
}

/// Largest multiple of `step` that is `<= value`
pub fn floor_to_multiple(value: f64, step: f64) -> f64 {
    (value / step).floor() * step
}
