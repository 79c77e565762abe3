use crate::error::PlaneError;

use super::{Point3, Tolerance, Vector3, SMALL_FASTF};

/// Plane in Hessian normal form: `normal . p == dist` for points on the plane.
///
/// `normal` is unit length and points to the outward side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneEquation {
    pub normal: Vector3,
    pub dist: f64,
}

impl PlaneEquation {
    /// Builds a plane from a (not necessarily unit) normal and a point on it.
    ///
    /// # Errors
    ///
    /// Returns [`PlaneError::Degenerate`] if the normal is zero-length.
    pub fn from_normal(point: &Point3, normal: &Vector3) -> Result<Self, PlaneError> {
        let len = normal.norm();
        if len < SMALL_FASTF {
            return Err(PlaneError::Degenerate);
        }
        let normal = normal / len;
        Ok(Self {
            normal,
            dist: normal.dot(&point.coords),
        })
    }

    /// Plane through three points, oriented by the right-hand rule `a -> b -> c`.
    ///
    /// # Errors
    ///
    /// Returns [`PlaneError::Degenerate`] if any two points coincide or the
    /// three are collinear within `tol`.
    pub fn from_points(
        a: &Point3,
        b: &Point3,
        c: &Point3,
        tol: &Tolerance,
    ) -> Result<Self, PlaneError> {
        if tol.points_equal(a, b) || tol.points_equal(b, c) || tol.points_equal(a, c) {
            return Err(PlaneError::Degenerate);
        }
        if tol.points_collinear(a, b, c) {
            return Err(PlaneError::Degenerate);
        }
        let normal = (b - a).cross(&(c - a));
        Self::from_normal(a, &normal)
    }

    /// Signed distance from `p` to the plane, positive on the normal side.
    #[must_use]
    pub fn distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.dist
    }

    /// The same plane facing the other way.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            normal: -self.normal,
            dist: -self.dist,
        }
    }

    /// Returns `true` if the planes coincide within tolerance, facing the same way.
    #[must_use]
    pub fn coincides(&self, other: &Self, tol: &Tolerance) -> bool {
        (self.dist - other.dist).abs() <= tol.dist && self.normal.dot(&other.normal) >= tol.para
    }
}

/// Newell's method normal of a closed polygon. Not normalized; its length is
/// twice the polygon's area, so a zero result means the polygon has no area.
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Vector3 {
    let mut n = Vector3::zeros();
    let count = points.len();
    for i in 0..count {
        let cur = &points[i];
        let next = &points[(i + 1) % count];
        n.x += (cur.y - next.y) * (cur.z + next.z);
        n.y += (cur.z - next.z) * (cur.x + next.x);
        n.z += (cur.x - next.x) * (cur.y + next.y);
    }
    n
}
