use crate::error::Result;
use crate::math::{
    newell_normal, point_in_polygon, point_on_boundary, Point3, PointClass, Tolerance, Vector3,
    SMALL_FASTF,
};
use crate::topology::{LoopUseId, Model, Orientation};

use super::{LoopClass, LoopClassifier};

/// Loop-against-loop classification for straight-edged loops lying in one
/// plane.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarLoopClassifier;

impl LoopClassifier for PlanarLoopClassifier {
    fn classify(
        &self,
        model: &Model,
        a: LoopUseId,
        b: LoopUseId,
        tol: &Tolerance,
    ) -> Result<LoopClass> {
        let pa = model.loop_points(a)?;
        let pb = model.loop_points(b)?;
        if pa.is_empty() || pb.is_empty() {
            return Ok(LoopClass::Outside);
        }

        let na = oriented_normal(model, a, &pa)?;
        let nb = oriented_normal(model, b, &pb)?;

        if pa.iter().all(|p| point_on_boundary(p, &pb, tol))
            && pb.iter().all(|p| point_on_boundary(p, &pa, tol))
        {
            return Ok(if na.dot(&nb) < 0.0 {
                LoopClass::OnAnti
            } else {
                LoopClass::OnShared
            });
        }

        let normal = if nb.norm() >= SMALL_FASTF { nb } else { na };
        if normal.norm() < SMALL_FASTF {
            return Ok(LoopClass::Outside);
        }

        let mut strictly_inside = false;
        for p in &pa {
            match point_in_polygon(p, &pb, &normal, tol) {
                PointClass::Outside => return Ok(LoopClass::Outside),
                PointClass::Inside => strictly_inside = true,
                PointClass::On => {}
            }
        }
        if !strictly_inside {
            // Every vertex touches b; let the edge midpoints decide.
            let n = pa.len();
            for i in 0..n {
                let mid = Point3::from((pa[i].coords + pa[(i + 1) % n].coords) * 0.5);
                match point_in_polygon(&mid, &pb, &normal, tol) {
                    PointClass::Outside => return Ok(LoopClass::Outside),
                    PointClass::Inside => strictly_inside = true,
                    PointClass::On => {}
                }
            }
        }
        Ok(if strictly_inside {
            LoopClass::Inside
        } else {
            LoopClass::Outside
        })
    }
}

/// Winding normal of a loop with holes turned around, so an outer boundary
/// and a hole tracing the same points read as the same sense.
fn oriented_normal(model: &Model, lu: LoopUseId, points: &[Point3]) -> Result<Vector3> {
    let n = newell_normal(points);
    Ok(match model.loopuse(lu)?.orientation {
        Orientation::Opposite => -n,
        _ => n,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::euler::make_region;
    use crate::operations::{add_loop_to_face, make_face_with_vertices};
    use crate::topology::VertexId;

    fn tol() -> Tolerance {
        Tolerance::new(0.005, 1e-6)
    }

    fn verts(model: &mut Model, pts: &[(f64, f64)]) -> Vec<Option<VertexId>> {
        pts.iter()
            .map(|&(x, y)| Some(model.add_vertex(Some(Point3::new(x, y, 0.0)))))
            .collect()
    }

    fn square(x0: f64, y0: f64, size: f64) -> Vec<(f64, f64)> {
        vec![(x0, y0), (x0 + size, y0), (x0 + size, y0 + size), (x0, y0 + size)]
    }

    #[test]
    fn nested_and_disjoint_loops() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let mut big = verts(&mut model, &square(0.0, 0.0, 4.0));
        let fu = make_face_with_vertices(&mut model, s, &mut big).unwrap();
        let outer = model.faceuse(fu).unwrap().loopuses[0];
        let mut small = verts(&mut model, &square(1.0, 1.0, 1.0));
        let inner = add_loop_to_face(&mut model, fu, &mut small, Orientation::Same).unwrap();
        let mut far = verts(&mut model, &square(10.0, 10.0, 1.0));
        let away = add_loop_to_face(&mut model, fu, &mut far, Orientation::Same).unwrap();

        let c = PlanarLoopClassifier;
        assert_eq!(c.classify(&model, inner, outer, &tol()).unwrap(), LoopClass::Inside);
        assert_eq!(c.classify(&model, outer, inner, &tol()).unwrap(), LoopClass::Outside);
        assert_eq!(c.classify(&model, away, outer, &tol()).unwrap(), LoopClass::Outside);
    }

    #[test]
    fn coincident_loops_report_direction() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let mut a = verts(&mut model, &square(0.0, 0.0, 1.0));
        let shared = a.clone();
        let fu = make_face_with_vertices(&mut model, s, &mut a).unwrap();
        let first = model.faceuse(fu).unwrap().loopuses[0];

        let mut same_way = shared.clone();
        let twin = add_loop_to_face(&mut model, fu, &mut same_way, Orientation::Same).unwrap();
        let mut reversed: Vec<_> = shared.iter().rev().copied().collect();
        let anti = add_loop_to_face(&mut model, fu, &mut reversed, Orientation::Same).unwrap();
        let mut hole_way: Vec<_> = shared.into_iter().rev().collect();
        let hole = add_loop_to_face(&mut model, fu, &mut hole_way, Orientation::Opposite).unwrap();

        let c = PlanarLoopClassifier;
        assert_eq!(c.classify(&model, twin, first, &tol()).unwrap(), LoopClass::OnShared);
        assert_eq!(c.classify(&model, anti, first, &tol()).unwrap(), LoopClass::OnAnti);
        assert!(c.classify(&model, anti, first, &tol()).unwrap().is_on());
        // A hole traced backwards over an outer boundary cancels it.
        assert_eq!(c.classify(&model, hole, first, &tol()).unwrap(), LoopClass::OnShared);
    }
}
