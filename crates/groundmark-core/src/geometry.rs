use nalgebra::{Point2, Vector2};

/// Vectors shorter than this are treated as degenerate.
pub const NORMALIZE_EPS: f32 = 1e-6;

/// 2D cross product (z component of the 3D cross product).
#[inline]
pub fn cross(a: &Vector2<f32>, b: &Vector2<f32>) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Unit vector, or `None` for near-zero input.
#[inline]
pub fn normalize_or_none(v: Vector2<f32>) -> Option<Vector2<f32>> {
    let n = v.norm();
    if n > NORMALIZE_EPS {
        Some(v / n)
    } else {
        None
    }
}

#[inline]
pub fn dist_sqr(a: &Point2<i32>, b: &Point2<i32>) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

/// Wrap an angle to `(-pi, pi]`.
pub fn wrap_angle(a: f64) -> f64 {
    use std::f64::consts::PI;
    let mut r = a % (2.0 * PI);
    if r <= -PI {
        r += 2.0 * PI;
    } else if r > PI {
        r -= 2.0 * PI;
    }
    r
}
