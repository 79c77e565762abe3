use super::{Point3, Vector3};

/// Caller-supplied tolerances for every "is this the same" decision.
///
/// `dist` is an absolute distance, `dist_sq` its cached square. `perp` is the
/// largest dot product of unit vectors still treated as perpendicular and
/// `para` the smallest treated as parallel (`1 - perp`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub dist: f64,
    pub dist_sq: f64,
    pub perp: f64,
    pub para: f64,
}

impl Tolerance {
    /// Builds a tolerance record from a distance and a perpendicularity bound.
    #[must_use]
    pub fn new(dist: f64, perp: f64) -> Self {
        Self {
            dist,
            dist_sq: dist * dist,
            perp,
            para: 1.0 - perp,
        }
    }

    /// Returns `true` if the two points are within `dist` of each other.
    #[must_use]
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm_squared() < self.dist_sq
    }

    /// Returns `true` if `value` is zero within `dist`.
    #[must_use]
    pub fn near_zero(&self, value: f64) -> bool {
        value.abs() < self.dist
    }

    /// Returns `true` if `c` lies within `dist` of the line through `a` and `b`.
    ///
    /// Coincident `a` and `b` make any `c` collinear.
    #[must_use]
    pub fn points_collinear(&self, a: &Point3, b: &Point3, c: &Point3) -> bool {
        let ab = b - a;
        let len_sq = ab.norm_squared();
        if len_sq < self.dist_sq {
            return true;
        }
        let ac = c - a;
        let t = ac.dot(&ab) / len_sq;
        let foot = a + ab * t;
        (c - foot).norm_squared() < self.dist_sq
    }

    /// Returns `true` if the unit vectors are parallel or antiparallel.
    #[must_use]
    pub fn unit_vectors_parallel(&self, a: &Vector3, b: &Vector3) -> bool {
        a.dot(b).abs() >= self.para
    }
}
