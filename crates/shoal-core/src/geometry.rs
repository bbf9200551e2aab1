//! Plane geometry helpers shared by navigation, rigging and drawing.
//!
//! All functions are pure and return new values. Angles are radians unless a
//! name says otherwise.

use glam::DVec2;
use thiserror::Error;

/// A point or direction on the tank surface, in world pixels.
pub type Vec2 = DVec2;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("cannot compute the unit vector of a zero-length vector")]
    ZeroLength,
    #[error("vector has non-finite components: ({x}, {y})")]
    NonFinite { x: f64, y: f64 },
}

pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

pub fn lerp_vec2(from: Vec2, to: Vec2, t: f64) -> Vec2 {
    Vec2::new(lerp(from.x, to.x, t), lerp(from.y, to.y, t))
}

/// Frame-rate independent exponential approach of `current` toward `target`.
///
/// `decay` is the rate per second and `dt` the elapsed time in seconds.
pub fn smooth_interpolate(current: f64, target: f64, decay: f64, dt: f64) -> f64 {
    target + (current - target) * (-decay * dt).exp()
}

pub fn smooth_interpolate_vec2(current: Vec2, target: Vec2, decay: f64, dt: f64) -> Vec2 {
    Vec2::new(
        smooth_interpolate(current.x, target.x, decay, dt),
        smooth_interpolate(current.y, target.y, decay, dt),
    )
}

/// Rotate `point` by `angle` radians around `center`.
pub fn rotate_around(point: Vec2, center: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    let offset = point - center;
    Vec2::new(
        offset.x * cos - offset.y * sin + center.x,
        offset.x * sin + offset.y * cos + center.y,
    )
}

/// The left-hand perpendicular `(-y, x)`.
pub fn perpendicular(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

pub fn distance(a: Vec2, b: Vec2) -> f64 {
    a.distance(b)
}

/// Heading in radians of the travel direction from `from` toward `to`.
///
/// Uses the same convention as a rotation whose move direction is
/// `(cos, sin)`, so `bearing(p, p + (cos a, sin a)) == a`.
pub fn bearing(from: Vec2, to: Vec2) -> f64 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}

/// Normalize `v`. Zero-length and non-finite input is a caller bug and is
/// reported instead of producing NaNs.
pub fn unit_vec2(v: Vec2) -> Result<Vec2, GeometryError> {
    if !v.is_finite() {
        return Err(GeometryError::NonFinite { x: v.x, y: v.y });
    }
    let length = v.length();
    if length == 0.0 {
        return Err(GeometryError::ZeroLength);
    }
    Ok(v / length)
}
