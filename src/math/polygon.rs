use super::{Point3, Tolerance, Vector3};

/// Where a point sits relative to a closed polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClass {
    Inside,
    On,
    Outside,
}

/// Classifies `point` against a planar polygon with normal `normal`.
///
/// The polygon is projected along the dominant axis of `normal` and tested
/// with a winding number; points within `tol.dist` of any side are `On`.
#[must_use]
pub fn point_in_polygon(
    point: &Point3,
    polygon: &[Point3],
    normal: &Vector3,
    tol: &Tolerance,
) -> PointClass {
    if point_on_boundary(point, polygon, tol) {
        return PointClass::On;
    }
    if polygon.len() < 3 {
        return PointClass::Outside;
    }

    let (u, v) = projection_axes(normal);
    let uvs: Vec<(f64, f64)> = polygon.iter().map(|q| (q[u], q[v])).collect();
    if winding_number_2d(point[u], point[v], &uvs) == 0 {
        PointClass::Outside
    } else {
        PointClass::Inside
    }
}

/// Returns `true` if `point` lies within `tol.dist` of a side of the closed
/// polygon. One- and two-point polygons are treated as a point and a
/// doubled-back segment.
#[must_use]
pub fn point_on_boundary(point: &Point3, polygon: &[Point3], tol: &Tolerance) -> bool {
    let n = polygon.len();
    (0..n).any(|i| dist_sq_to_segment(point, &polygon[i], &polygon[(i + 1) % n]) < tol.dist_sq)
}

/// The two coordinate axes spanning the plane least foreshortened by `normal`.
fn projection_axes(normal: &Vector3) -> (usize, usize) {
    let a = normal.abs();
    if a.z >= a.x && a.z >= a.y {
        (0, 1)
    } else if a.y >= a.x {
        (2, 0)
    } else {
        (1, 2)
    }
}

fn dist_sq_to_segment(p: &Point3, a: &Point3, b: &Point3) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (p - a).norm_squared();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm_squared()
}

/// Winding number of `(px, py)` around `verts`; zero means outside.
fn winding_number_2d(px: f64, py: f64, verts: &[(f64, f64)]) -> i32 {
    let n = verts.len();
    let mut winding = 0i32;
    for i in 0..n {
        let (x0, y0) = verts[i];
        let (x1, y1) = verts[(i + 1) % n];
        let side = (x1 - x0) * (py - y0) - (y1 - y0) * (px - x0);
        if y0 <= py {
            if y1 > py && side > 0.0 {
                winding += 1;
            }
        } else if y1 <= py && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}
