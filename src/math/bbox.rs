use super::{Point3, Tolerance};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb {
    /// A box holding exactly one point.
    #[must_use]
    pub fn from_point(p: &Point3) -> Self {
        Self { min: *p, max: *p }
    }

    /// The tightest box around `points`, or `None` if there are none.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bb = Self::from_point(first);
        for p in iter {
            bb.extend(p);
        }
        Some(bb)
    }

    /// Grows the box to include `p`.
    pub fn extend(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// The union of two boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Returns `true` unless the boxes are separated by more than `tol.dist`
    /// along some axis.
    #[must_use]
    pub fn overlaps(&self, other: &Self, tol: &Tolerance) -> bool {
        (0..3).all(|i| {
            self.min[i] <= other.max[i] + tol.dist && other.min[i] <= self.max[i] + tol.dist
        })
    }
}
