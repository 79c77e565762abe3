use tracing::{debug, trace};

use crate::diag::DebugFlags;
use crate::error::{Result, TopologyError};
use crate::math::{newell_normal, SMALL_FASTF};
use crate::topology::{LoopContent, LoopUseId, LoopUseParent, Model, Orientation};

/// Tags a loopuse and its mate with `orientation`.
///
/// # Errors
///
/// Returns an error if the loopuse or its mate does not exist.
pub fn set_loop_orientation(model: &mut Model, lu: LoopUseId, orientation: Orientation) -> Result<()> {
    let mate = model.loopuse(lu)?.mate;
    model.loopuse_mut(lu)?.orientation = orientation;
    model.loopuse_mut(mate)?.orientation = orientation;
    Ok(())
}

/// Re-derives a face loop's orientation from its geometry.
///
/// The loop is looked at from the `Same` side of its face: winding with the
/// face normal makes it an outer boundary (`Same`), winding against it a
/// hole (`Opposite`). Self-loops and boolean markers keep their tag, as do
/// loops with no area or faces with no plane.
///
/// # Errors
///
/// Returns [`TopologyError::WrongParent`] for a wire loop and
/// [`TopologyError::OrientationClash`] if the face has no `Same` use.
pub fn reorient_loop(model: &mut Model, lu: LoopUseId) -> Result<()> {
    let data = model.loopuse(lu)?;
    if data.orientation == Orientation::BoolPlace || !matches!(data.content, LoopContent::Edges(_)) {
        return Ok(());
    }
    let LoopUseParent::FaceUse(fu) = data.parent else {
        return Err(TopologyError::WrongParent("wire loops have no orientation".into()).into());
    };

    let (fu, lu) = match model.faceuse(fu)?.orientation {
        Orientation::Same => (fu, lu),
        Orientation::Opposite => (model.faceuse(fu)?.mate, model.loopuse(lu)?.mate),
        other => {
            return Err(TopologyError::OrientationClash(format!(
                "face of loop has a {other:?} use"
            ))
            .into())
        }
    };
    let Some(plane) = model.faceuse_plane(fu)? else {
        return Ok(());
    };
    let normal = newell_normal(&model.loop_points(lu)?);
    if normal.norm() < SMALL_FASTF {
        trace!(?lu, "loop has no area, orientation kept");
        return Ok(());
    }

    let geometric = if normal.dot(&plane.normal) < 0.0 {
        Orientation::Opposite
    } else {
        Orientation::Same
    };
    let current = model.loopuse(lu)?.orientation;
    if current != geometric {
        if model.debug_flags().contains(DebugFlags::BASIC) {
            debug!(?lu, from = ?current, to = ?geometric, "reoriented loop");
        }
        set_loop_orientation(model, lu, geometric)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::compute_face_plane;
    use crate::euler::make_region;
    use crate::math::{Point3, Tolerance};
    use crate::operations::{add_loop_to_face, make_face_with_vertices};
    use crate::topology::VertexId;

    fn verts(model: &mut Model, pts: &[(f64, f64)]) -> Vec<Option<VertexId>> {
        pts.iter()
            .map(|&(x, y)| Some(model.add_vertex(Some(Point3::new(x, y, 0.0)))))
            .collect()
    }

    #[test]
    fn hole_is_found_from_its_winding() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let mut outer = verts(&mut model, &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let fu = make_face_with_vertices(&mut model, s, &mut outer).unwrap();
        compute_face_plane(&mut model, fu, &Tolerance::new(0.005, 1e-6)).unwrap();

        let mut hole = verts(&mut model, &[(1.0, 1.0), (1.0, 3.0), (3.0, 3.0), (3.0, 1.0)]);
        let lu = add_loop_to_face(&mut model, fu, &mut hole, Orientation::Same).unwrap();
        reorient_loop(&mut model, lu).unwrap();
        assert_eq!(model.loopuse(lu).unwrap().orientation, Orientation::Opposite);
        let mate = model.loopuse(lu).unwrap().mate;
        assert_eq!(model.loopuse(mate).unwrap().orientation, Orientation::Opposite);

        // Asking through the mate gives the same answer.
        set_loop_orientation(&mut model, mate, Orientation::Unspecified).unwrap();
        reorient_loop(&mut model, mate).unwrap();
        assert_eq!(model.loopuse(lu).unwrap().orientation, Orientation::Opposite);
        model.verify().unwrap();
    }
}
