use tracing::{debug, instrument, warn};

use crate::diag::DebugFlags;
use crate::error::{PlaneError, Result};
use crate::math::{newell_normal, PlaneEquation, Point3, Tolerance};
use crate::topology::{FaceUseId, LoopContent, Model};

/// Computes the plane of a face from its first loop and attaches it.
///
/// The plane goes through the first three distinct, non-collinear vertices
/// of the loop and faces the way the loop winds as seen from `fu`. Every
/// vertex of every loop of the face must then lie within `tol.dist` of it.
/// On any failure the face keeps whatever geometry it had before.
///
/// # Errors
///
/// Returns a [`PlaneError`] naming the failed step.
#[instrument(skip(model, tol))]
pub fn compute_face_plane(model: &mut Model, fu: FaceUseId, tol: &Tolerance) -> Result<PlaneEquation> {
    let plane = match plane_of_first_loop(model, fu, tol) {
        Ok(plane) => plane,
        Err(err) => {
            warn!(?fu, %err, "no plane for face");
            return Err(err.into());
        }
    };

    let off = count_off_plane(model, fu, &plane, tol)?;
    if off > 0 {
        warn!(?fu, off, "vertices off the computed plane");
        return Err(PlaneError::VertexOffPlane { count: off }.into());
    }

    model.set_face_plane(fu, plane)?;
    if model.debug_flags().contains(DebugFlags::BASIC) {
        debug!(?fu, normal = ?plane.normal, dist = plane.dist, "computed face plane");
    }
    Ok(plane)
}

fn plane_of_first_loop(
    model: &Model,
    fu: FaceUseId,
    tol: &Tolerance,
) -> std::result::Result<PlaneEquation, PlaneError> {
    let lu = model
        .faceuse(fu)
        .ok()
        .and_then(|data| data.loopuses.first().copied())
        .ok_or(PlaneError::NotEdgeLoop)?;
    match model.loopuse(lu).map(|l| l.content) {
        Ok(LoopContent::Edges(_)) => {}
        _ => return Err(PlaneError::NotEdgeLoop),
    }
    let points = model.loop_points(lu).map_err(|_| PlaneError::NoDistinctPoints)?;
    if points.len() < 3 {
        return Err(PlaneError::TooFewEdges);
    }

    let (a, b, c) = pick_three(&points, tol).ok_or(PlaneError::NoDistinctPoints)?;
    let plane = PlaneEquation::from_points(&a, &b, &c, tol)?;

    // A reflex corner at the start would turn the plane inside out.
    if newell_normal(&points).dot(&plane.normal) < 0.0 {
        Ok(plane.reversed())
    } else {
        Ok(plane)
    }
}

fn pick_three(points: &[Point3], tol: &Tolerance) -> Option<(Point3, Point3, Point3)> {
    let a = points[0];
    let bi = points.iter().position(|p| !tol.points_equal(&a, p))?;
    let b = points[bi];
    let c = points[bi + 1..].iter().find(|p| {
        !tol.points_equal(&a, p) && !tol.points_equal(&b, p) && !tol.points_collinear(&a, &b, p)
    })?;
    Some((a, b, *c))
}

fn count_off_plane(
    model: &Model,
    fu: FaceUseId,
    plane: &PlaneEquation,
    tol: &Tolerance,
) -> Result<usize> {
    let mut off = 0;
    for &lu in &model.faceuse(fu)?.loopuses {
        for p in model.loop_points(lu)? {
            if plane.distance(&p).abs() > tol.dist {
                off += 1;
            }
        }
    }
    Ok(off)
}

/// Number of vertices of the face's loops farther than `tol.dist` from its
/// plane. A face without a plane counts every vertex.
///
/// # Errors
///
/// Returns an error if a vertex has no point.
pub fn count_vertices_off_plane(model: &Model, fu: FaceUseId, tol: &Tolerance) -> Result<usize> {
    match model.faceuse_plane(fu)? {
        Some(plane) => count_off_plane(model, fu, &plane, tol),
        None => {
            let mut total = 0;
            for &lu in &model.faceuse(fu)?.loopuses {
                total += model.loop_vertices(lu)?.len();
            }
            Ok(total)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{GeometryError, TopolisError};
    use crate::euler::make_region;
    use crate::operations::make_face_with_vertices;
    use crate::topology::VertexId;
    use approx::assert_relative_eq;

    fn tol() -> Tolerance {
        Tolerance::new(0.005, 1e-6)
    }

    fn face_through(model: &mut Model, points: &[(f64, f64, f64)]) -> FaceUseId {
        let (_, s) = make_region(model).unwrap();
        let mut verts: Vec<Option<VertexId>> = points
            .iter()
            .map(|&(x, y, z)| Some(model.add_vertex(Some(Point3::new(x, y, z)))))
            .collect();
        make_face_with_vertices(model, s, &mut verts).unwrap()
    }

    fn plane_error(err: TopolisError) -> PlaneError {
        match err {
            TopolisError::Geometry(GeometryError::Plane(e)) => e,
            other => panic!("expected a plane error, got {other}"),
        }
    }

    #[test]
    fn unit_square_lies_in_xy_plane() {
        let mut model = Model::new();
        let fu = face_through(
            &mut model,
            &[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.0), (0.0, 1.0, 0.0)],
        );
        let plane = compute_face_plane(&mut model, fu, &tol()).unwrap();
        assert_relative_eq!(plane.normal, crate::math::Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(plane.dist, 0.0, epsilon = 1e-12);

        let mate = model.faceuse(fu).unwrap().mate;
        let seen = model.faceuse_plane(mate).unwrap().unwrap();
        assert_relative_eq!(seen.normal, -crate::math::Vector3::z(), epsilon = 1e-12);
        assert_eq!(count_vertices_off_plane(&model, fu, &tol()).unwrap(), 0);
    }

    #[test]
    fn reflex_start_still_faces_outward() {
        let mut model = Model::new();
        // L-shape whose second vertex is the inner corner.
        let fu = face_through(
            &mut model,
            &[
                (1.0, 2.0, 0.0),
                (1.0, 1.0, 0.0),
                (0.0, 1.0, 0.0),
                (0.0, 0.0, 0.0),
                (2.0, 0.0, 0.0),
                (2.0, 2.0, 0.0),
            ],
        );
        let plane = compute_face_plane(&mut model, fu, &tol()).unwrap();
        assert!(plane.normal.z > 0.0);
    }

    #[test]
    fn collinear_vertices_leave_face_bare() {
        let mut model = Model::new();
        let fu = face_through(&mut model, &[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (2.0, 0.0, 0.0)]);
        let err = compute_face_plane(&mut model, fu, &tol()).unwrap_err();
        assert_eq!(plane_error(err), PlaneError::NoDistinctPoints);
        assert!(model.faceuse_plane(fu).unwrap().is_none());
    }

    #[test]
    fn warped_quad_is_rejected() {
        let mut model = Model::new();
        let fu = face_through(
            &mut model,
            &[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.5), (0.0, 1.0, 0.0)],
        );
        let err = compute_face_plane(&mut model, fu, &tol()).unwrap_err();
        assert_eq!(plane_error(err), PlaneError::VertexOffPlane { count: 1 });
        assert!(model.faceuse_plane(fu).unwrap().is_none());
    }
}
