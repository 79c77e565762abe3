use tracing::{debug, instrument};

use crate::classify::set_loop_orientation;
use crate::error::{OperationError, Result};
use crate::euler::{make_edge_on_vertexuse, make_face, make_loop, split_edgeuse};
use crate::topology::{
    EdgeUseId, FaceSurface, FaceUseId, LoopContent, LoopUseId, LoopUseParent, Model, ShellId,
    TranslationTable, VertexId,
};

/// The copy of `v` recorded in `table`, made (with the same point) on first
/// sight.
fn copy_vertex(model: &mut Model, table: &mut TranslationTable, v: VertexId) -> Result<VertexId> {
    let data = model.vertex(v)?;
    if let Some(copy) = table.vertex(data.index) {
        return Ok(copy);
    }
    let (index, point) = (data.index, data.point);
    let copy = model.add_vertex(point);
    table.insert_vertex(index, copy);
    Ok(copy)
}

/// Copies loopuse `lu` under `parent`.
///
/// Vertices are looked up in `table` first so that loops copied with the
/// same table share vertices the way the originals do. Each new edgeuse is
/// recorded against its original, and picks up the original's edge
/// geometry.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] if `lu` has no content.
#[instrument(skip(model, table))]
pub fn duplicate_loop(
    model: &mut Model,
    lu: LoopUseId,
    parent: LoopUseParent,
    table: &mut TranslationTable,
) -> Result<LoopUseId> {
    let data = model.loopuse(lu)?;
    let orientation = data.orientation;
    match data.content {
        LoopContent::Vertex(vu) => {
            let old_v = model.vertexuse(vu)?.vertex;
            let v = copy_vertex(model, table, old_v)?;
            make_loop(model, parent, Some(v), orientation)
        }
        LoopContent::Edges(_) => {
            let old_eus = model.loop_edgeuses(lu)?;
            let start = model.eu_start_vertex(old_eus[0])?;
            let v0 = copy_vertex(model, table, start)?;
            let new_lu = make_loop(model, parent, Some(v0), orientation)?;
            let LoopContent::Vertex(vu) = model.loopuse(new_lu)?.content else {
                return Err(OperationError::Failed("new loop is not a self-loop".into()).into());
            };
            let mut last = make_edge_on_vertexuse(model, vu)?;
            let mut pairs: Vec<(EdgeUseId, EdgeUseId)> = vec![(old_eus[0], last)];
            for &old in &old_eus[1..] {
                let start = model.eu_start_vertex(old)?;
                let v = copy_vertex(model, table, start)?;
                last = split_edgeuse(model, Some(v), last, false)?;
                pairs.push((old, last));
            }

            for (old, new) in pairs {
                let index = model.edgeuse(old)?.index;
                table.insert_edgeuse(index, new);
                if let Some(g) = model.edgeuse(old)?.geom {
                    model.use_edge_geometry(new, g)?;
                }
            }
            Ok(new_lu)
        }
        LoopContent::Empty => {
            Err(OperationError::InvalidInput("cannot copy an empty loop".into()).into())
        }
    }
}

/// Copies a face into `shell`: every loop, the use orientations and the
/// face geometry. Returns the copy's use matching `fu`.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] if the face has no loops.
#[instrument(skip(model))]
pub fn duplicate_face(model: &mut Model, fu: FaceUseId, shell: ShellId) -> Result<FaceUseId> {
    let mut table = TranslationTable::with_capacity(model.max_index() * 2);
    let loops = model.faceuse(fu)?.loopuses.clone();
    let Some((&first, rest)) = loops.split_first() else {
        return Err(OperationError::InvalidInput("face has no loops".into()).into());
    };

    let first_orientation = model.loopuse(first)?.orientation;
    let new_lu = duplicate_loop(model, first, LoopUseParent::Shell(shell), &mut table)?;
    let new_fu = make_face(model, new_lu)?;
    set_loop_orientation(model, new_lu, first_orientation)?;
    for &lu in rest {
        duplicate_loop(model, lu, LoopUseParent::FaceUse(new_fu), &mut table)?;
    }

    let data = model.faceuse(fu)?;
    let (orientation, mate_orientation) = (data.orientation, model.faceuse(data.mate)?.orientation);
    let new_mate = model.faceuse(new_fu)?.mate;
    model.faceuse_mut(new_fu)?.orientation = orientation;
    model.faceuse_mut(new_mate)?.orientation = mate_orientation;

    let face = model.face(model.faceuse(fu)?.face)?;
    let flip = face.flip;
    if let Some(g) = face.geom {
        match model.face_geom(g)?.surface.clone() {
            FaceSurface::Plane(_) => {
                if let Some(plane) = model.faceuse_plane(fu)? {
                    model.set_face_plane(new_fu, plane)?;
                }
            }
            FaceSurface::Snurb(surface) => {
                model.set_face_surface(new_fu, surface)?;
                let new_face = model.faceuse(new_fu)?.face;
                model.face_mut(new_face)?.flip = flip;
            }
        }
    }
    let new_face = model.faceuse(new_fu)?.face;
    model.rebound_face(new_face)?;
    debug!(?fu, ?new_fu, loops = loops.len(), "duplicated face");
    Ok(new_fu)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::compute_face_plane;
    use crate::euler::{make_region, make_shell};
    use crate::math::{Point3, Tolerance};
    use crate::operations::{add_loop_to_face, make_face_with_vertices};
    use crate::topology::Orientation;
    use approx::assert_relative_eq;

    fn square(model: &mut Model, x0: f64, y0: f64, size: f64) -> Vec<Option<VertexId>> {
        [(x0, y0), (x0 + size, y0), (x0 + size, y0 + size), (x0, y0 + size)]
            .iter()
            .map(|&(x, y)| Some(model.add_vertex(Some(Point3::new(x, y, 0.0)))))
            .collect()
    }

    #[test]
    fn copy_of_face_with_hole_matches_original() {
        let mut model = Model::new();
        let (r, s) = make_region(&mut model).unwrap();
        let mut outer = square(&mut model, 0.0, 0.0, 4.0);
        let fu = make_face_with_vertices(&mut model, s, &mut outer).unwrap();
        let mut hole = square(&mut model, 1.0, 1.0, 1.0);
        hole.reverse();
        add_loop_to_face(&mut model, fu, &mut hole, Orientation::Opposite).unwrap();
        let plane = compute_face_plane(&mut model, fu, &Tolerance::new(0.005, 1e-6)).unwrap();

        let target = make_shell(&mut model, r).unwrap();
        let copy = duplicate_face(&mut model, fu, target).unwrap();

        let loops = model.faceuse(copy).unwrap().loopuses.clone();
        assert_eq!(loops.len(), 2);
        assert_eq!(model.loopuse(loops[0]).unwrap().orientation, Orientation::Same);
        assert_eq!(model.loopuse(loops[1]).unwrap().orientation, Orientation::Opposite);
        let original_points = model.loop_points(model.faceuse(fu).unwrap().loopuses[0]).unwrap();
        assert_eq!(model.loop_points(loops[0]).unwrap(), original_points);

        let copied = model.faceuse_plane(copy).unwrap().unwrap();
        assert_relative_eq!(copied.normal, plane.normal, epsilon = 1e-12);
        assert_eq!(model.vertex_count(), 16);
        model.verify().unwrap();
    }

    #[test]
    fn shared_vertices_are_copied_once() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let mut verts = square(&mut model, 0.0, 0.0, 1.0);
        let fu = make_face_with_vertices(&mut model, s, &mut verts).unwrap();
        let lu = model.faceuse(fu).unwrap().loopuses[0];

        let mut table = TranslationTable::default();
        let copy = duplicate_loop(&mut model, lu, LoopUseParent::FaceUse(fu), &mut table).unwrap();
        let again = duplicate_loop(&mut model, lu, LoopUseParent::FaceUse(fu), &mut table).unwrap();
        assert_eq!(
            model.loop_vertices(copy).unwrap(),
            model.loop_vertices(again).unwrap()
        );
        assert_eq!(model.vertex_count(), 8);
        let first = model.loop_edgeuses(lu).unwrap()[0];
        let index = model.edgeuse(first).unwrap().index;
        let mapped = table.edgeuse(index).unwrap();
        assert_eq!(model.loopuse_of_edgeuse(mapped).unwrap(), Some(again));
    }
}
