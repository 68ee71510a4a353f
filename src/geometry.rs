//! Integer pixel geometry used by the posture overlay.

use nalgebra::Vector2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x as f64, self.y as f64)
    }
}

/// Angle in degrees at `vertex` between the rays towards `p1` and `p3`.
///
/// Returns `None` when either ray has zero length, since the angle is undefined.
pub fn angle(p1: Point, vertex: Point, p3: Point) -> Option<f64> {
    let a = p1.to_vector() - vertex.to_vector();
    let b = p3.to_vector() - vertex.to_vector();

    // Single square root so collinear integer rays hit cos = -1 exactly
    let norms = (a.norm_squared() * b.norm_squared()).sqrt();
    if norms == 0.0 {
        return None;
    }

    let cos_angle = (a.dot(&b) / norms).clamp(-1.0, 1.0);
    Some(cos_angle.acos().to_degrees())
}

/// Floor of the integer mean, matching floor division for negative sums.
pub fn floor_mean(a: i32, b: i32) -> i32 {
    (a as i64 + b as i64).div_euclid(2) as i32
}

/// Point halfway down from a shoulder to its hip, kept on the shoulder's column.
pub fn vertical_midpoint(shoulder: Point, hip: Point) -> Point {
    Point::new(shoulder.x, floor_mean(shoulder.y, hip.y))
}

pub fn pixel_distance(a: Point, b: Point) -> f64 {
    (a.to_vector() - b.to_vector()).norm()
}

/// Uncalibrated conversion: assumes a fixed camera distance.
pub fn distance_cm(a: Point, b: Point, pixels_per_cm: f64) -> f64 {
    pixel_distance(a, b) / pixels_per_cm
}
