//! 2D geometry helpers shared by the boundary strategies

use super::types::Point2D;
use nalgebra::Vector2;

/// Euclidean distance between two points
pub fn distance(a: &Point2D, b: &Point2D) -> f64 {
    (a - b).norm()
}

/// Distance of a point from the vehicle origin
pub fn norm(p: &Point2D) -> f64 {
    p.coords.norm()
}

/// Unsigned angle between two vectors in radians.
///
/// Returns NaN when either vector has zero length; callers must guard.
pub fn angle_between(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    let magnitudes = a.norm() * b.norm();
    if magnitudes == 0.0 {
        return f64::NAN;
    }
    (a.dot(b) / magnitudes).clamp(-1.0, 1.0).acos()
}

/// Intersect the ray `y = slope * x` with a circle of `radius` around `center`.
///
/// Returns the intersection closer to the origin (smaller x root) when the
/// line crosses the circle at two points, `None` otherwise.
pub fn line_circle_intersection(slope: f64, center: &Point2D, radius: f64) -> Option<Point2D> {
    let a = 1.0 + slope * slope;
    let b = -2.0 * (center.x + slope * center.y);
    let c = center.x * center.x + center.y * center.y - radius * radius;
    let discriminant = b * b - 4.0 * a * c;

    if discriminant <= 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let x = ((-b + root) / (2.0 * a)).min((-b - root) / (2.0 * a));
    Some(Point2D::new(x, slope * x))
}
