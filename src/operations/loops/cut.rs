use tracing::{debug, instrument, trace, warn};

use crate::classify::set_loop_orientation;
use crate::diag::DebugFlags;
use crate::error::{OperationError, Result};
use crate::euler::{make_empty_loop, new_edgeuse_pair};
use crate::radial::join_edgeuses;
use crate::topology::{
    EdgeUseId, EdgeUseParent, LoopContent, LoopUseId, Model, Orientation, VertexUseId,
    VertexUseParent,
};

/// The edgeuse and loopuse a vertexuse starts, if it sits in a loop ring.
fn ring_position(model: &Model, vu: VertexUseId) -> Result<Option<(EdgeUseId, LoopUseId)>> {
    let VertexUseParent::EdgeUse(eu) = model.vertexuse(vu)?.parent else {
        return Ok(None);
    };
    Ok(model.loopuse_of_edgeuse(eu)?.map(|lu| (eu, lu)))
}

fn dump_cut(model: &Model, old: LoopUseId, new_lu: LoopUseId) -> Result<()> {
    if model.debug_flags().contains(DebugFlags::CUTLOOP) {
        trace!(
            old = ?model.loop_vertices(old)?,
            new = ?model.loop_vertices(new_lu)?,
            "loops after cut"
        );
    }
    Ok(())
}

/// Cuts a loop in two along a new edge between two of its vertices.
///
/// The edges from `vu2` up to `vu1` move into a new loop closed by an edge
/// from `vu1`'s vertex to `vu2`'s; the old loop is closed by a use of the
/// same new edge running the other way. `vu1` stays in the old loop. If
/// both uses sit on one vertex, the loop is split there instead.
///
/// Both loops come out `Unspecified`; callers reorient them.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] if the vertexuses are not in
/// the same loop.
#[instrument(skip(model))]
pub fn cut_loop(model: &mut Model, vu1: VertexUseId, vu2: VertexUseId) -> Result<LoopUseId> {
    let (Some((eu1, old)), Some((eu2, lu2))) = (ring_position(model, vu1)?, ring_position(model, vu2)?)
    else {
        return Err(OperationError::InvalidInput("vertexuses are not in loops".into()).into());
    };
    if old != lu2 {
        return Err(OperationError::InvalidInput("vertexuses are in different loops".into()).into());
    }
    let v1 = model.vertexuse(vu1)?.vertex;
    let v2 = model.vertexuse(vu2)?.vertex;
    if v1 == v2 {
        return split_loop_at_vertexuse(model, old, vu2);
    }

    let parent = model.loopuse(old)?.parent;
    let new_lu = make_empty_loop(model, parent, Orientation::Unspecified)?;
    set_loop_orientation(model, old, Orientation::Unspecified)?;

    let mut eu = eu2;
    while eu != eu1 {
        let next = model.edgeuse(eu)?.next;
        model.ring_move_pair(eu, new_lu)?;
        eu = next;
    }

    let new_mate = model.loopuse(new_lu)?.mate;
    let (cap, cap_mate) = new_edgeuse_pair(
        model,
        EdgeUseParent::LoopUse(new_lu),
        v1,
        EdgeUseParent::LoopUse(new_mate),
        v2,
    )?;
    model.ring_append_pair(new_lu, cap, cap_mate)?;

    let old_mate = model.loopuse(old)?.mate;
    let (close, close_mate) = new_edgeuse_pair(
        model,
        EdgeUseParent::LoopUse(old),
        v2,
        EdgeUseParent::LoopUse(old_mate),
        v1,
    )?;
    let eu1_mate = model.edgeuse(eu1)?.mate;
    model.ring_insert_before(eu1, close)?;
    model.ring_insert_after(eu1_mate, close_mate)?;

    join_edgeuses(model, cap, close)?;
    dump_cut(model, old, new_lu)?;
    debug!(?old, ?new_lu, "cut loop");
    Ok(new_lu)
}

/// Splits a loop at a vertex it visits more than once.
///
/// The edges from `vu` up to the next visit of its vertex move into a new
/// loop under the same parent. Both loops come out `Unspecified`.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] if `vu` is not in `lu` or its
/// vertex appears only once there. Nothing is changed in that case.
#[instrument(skip(model))]
pub fn split_loop_at_vertexuse(
    model: &mut Model,
    lu: LoopUseId,
    vu: VertexUseId,
) -> Result<LoopUseId> {
    let Some((mut eu, owner)) = ring_position(model, vu)? else {
        return Err(OperationError::InvalidInput("vertexuse is not in a loop".into()).into());
    };
    if owner != lu {
        return Err(OperationError::InvalidInput("vertexuse is in another loop".into()).into());
    }
    if model.find_repeated_vertex_in_loop(vu)?.is_none() {
        return Err(OperationError::InvalidInput(
            "vertex appears only once in the loop".into(),
        )
        .into());
    }
    let split_v = model.vertexuse(vu)?.vertex;

    let parent = model.loopuse(lu)?.parent;
    set_loop_orientation(model, lu, Orientation::Unspecified)?;
    let new_lu = make_empty_loop(model, parent, Orientation::Unspecified)?;

    let limit = model.loop_edge_count(lu)?;
    let mut moved = 0;
    loop {
        let next = model.edgeuse(eu)?.next;
        model.ring_move_pair(eu, new_lu)?;
        moved += 1;
        eu = next;
        if model.eu_start_vertex(eu)? == split_v {
            break;
        }
        if moved >= limit {
            return Err(OperationError::Failed("split did not meet its vertex again".into()).into());
        }
    }
    trace!(?lu, ?new_lu, moved, "split loop at vertex");
    dump_cut(model, lu, new_lu)?;
    Ok(new_lu)
}

/// Splits a loop at every vertex it touches more than once, until no
/// vertex repeats. Returns the number of loops split off.
///
/// Vertices on a crack (an edge run out and straight back) are split last,
/// so a crack is not peeled off as a loop of its own while other splits
/// remain.
///
/// # Errors
///
/// Returns an error if a split breaks a structural rule.
#[instrument(skip(model))]
pub fn split_touching_loops(model: &mut Model, lu: LoopUseId) -> Result<usize> {
    let mut count = 0;
    'top: loop {
        if !matches!(model.loopuse(lu)?.content, LoopContent::Edges(_)) {
            return Ok(count);
        }

        let mut crack_vu: Option<VertexUseId> = None;
        for eu in model.loop_edgeuses(lu)? {
            let vu = model.edgeuse(eu)?.vertexuse;
            if model.find_repeated_vertex_in_loop(vu)?.is_none() {
                continue;
            }

            let v = model.vertexuse(vu)?.vertex;
            let mut on_crack = false;
            for &other in &model.vertex(v)?.uses {
                let Some((other_eu, other_lu)) = ring_position(model, other)? else {
                    continue;
                };
                if other_lu == lu && model.edgeuse_in_crack(other_eu)? {
                    crack_vu = Some(other);
                    on_crack = true;
                    break;
                }
            }
            if on_crack {
                continue;
            }

            count += split_and_recurse(model, lu, vu)?;
            continue 'top;
        }

        match crack_vu {
            Some(vu) => {
                count += split_and_recurse(model, lu, vu)?;
            }
            None => return Ok(count),
        }
    }
}

fn split_and_recurse(model: &mut Model, lu: LoopUseId, vu: VertexUseId) -> Result<usize> {
    let new_lu = split_loop_at_vertexuse(model, lu, vu)?;
    model.rebound_loop(new_lu)?;
    if model.is_crack_loop(new_lu)? {
        warn!(?new_lu, "split left a two-edge crack loop");
    }
    Ok(1 + split_touching_loops(model, new_lu)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::{compute_face_plane, reorient_loop};
    use crate::euler::make_region;
    use crate::math::{Point3, Tolerance};
    use crate::operations::make_face_with_vertices;
    use crate::topology::{FaceUseId, VertexId};

    fn tol() -> Tolerance {
        Tolerance::new(0.005, 1e-6)
    }

    fn vertex(model: &mut Model, x: f64, y: f64) -> Option<VertexId> {
        Some(model.add_vertex(Some(Point3::new(x, y, 0.0))))
    }

    fn vu_at(model: &Model, lu: LoopUseId, v: VertexId) -> VertexUseId {
        model
            .loop_edgeuses(lu)
            .unwrap()
            .into_iter()
            .map(|eu| model.edgeuse(eu).unwrap().vertexuse)
            .find(|&vu| model.vertexuse(vu).unwrap().vertex == v)
            .unwrap()
    }

    fn face(model: &mut Model, verts: &mut [Option<VertexId>]) -> (FaceUseId, LoopUseId) {
        let (_, s) = make_region(model).unwrap();
        let fu = make_face_with_vertices(model, s, verts).unwrap();
        compute_face_plane(model, fu, &tol()).unwrap();
        let lu = model.faceuse(fu).unwrap().loopuses[0];
        (fu, lu)
    }

    #[test]
    fn square_cut_along_diagonal() {
        let mut model = Model::new();
        let mut v = [
            vertex(&mut model, 0.0, 0.0),
            vertex(&mut model, 1.0, 0.0),
            vertex(&mut model, 1.0, 1.0),
            vertex(&mut model, 0.0, 1.0),
        ];
        let (fu, lu) = face(&mut model, &mut v);
        let a = vu_at(&model, lu, v[0].unwrap());
        let c = vu_at(&model, lu, v[2].unwrap());

        let new_lu = cut_loop(&mut model, a, c).unwrap();
        assert_eq!(model.loop_vertices(lu).unwrap(), vec![v[0].unwrap(), v[1].unwrap(), v[2].unwrap()]);
        assert_eq!(model.loop_vertices(new_lu).unwrap(), vec![v[2].unwrap(), v[3].unwrap(), v[0].unwrap()]);
        assert_eq!(model.loopuse(lu).unwrap().orientation, Orientation::Unspecified);
        assert_eq!(model.edge_count(), 5);
        assert_eq!(model.faceuse(fu).unwrap().loopuses.len(), 2);

        reorient_loop(&mut model, lu).unwrap();
        reorient_loop(&mut model, new_lu).unwrap();
        assert_eq!(model.loopuse(new_lu).unwrap().orientation, Orientation::Same);
        model.verify().unwrap();
    }

    #[test]
    fn split_at_vertex_needs_a_repeat() {
        let mut model = Model::new();
        let mut v = [
            vertex(&mut model, 0.0, 0.0),
            vertex(&mut model, 1.0, 0.0),
            vertex(&mut model, 0.0, 1.0),
        ];
        let (_, lu) = face(&mut model, &mut v);
        let a = vu_at(&model, lu, v[0].unwrap());
        assert!(split_loop_at_vertexuse(&mut model, lu, a).is_err());
        assert_eq!(model.loopuse(lu).unwrap().orientation, Orientation::Same);
        model.verify().unwrap();
    }

    #[test]
    fn figure_eight_splits_without_cracks() {
        let mut model = Model::new();
        let a = vertex(&mut model, 0.0, 0.0);
        let c = vertex(&mut model, 2.0, 0.0);
        let b = vertex(&mut model, 1.0, 1.0);
        let d = vertex(&mut model, 2.0, 2.0);
        let e = vertex(&mut model, 0.0, 2.0);
        let (_, s) = make_region(&mut model).unwrap();
        let fu = make_face_with_vertices(&mut model, s, &mut [a, c, b, c, d, b, e]).unwrap();
        let lu = model.faceuse(fu).unwrap().loopuses[0];

        let split = split_touching_loops(&mut model, lu).unwrap();
        assert!(split >= 1);
        let loops = model.faceuse(fu).unwrap().loopuses.clone();
        let mut sizes: Vec<usize> = loops
            .iter()
            .map(|&l| model.loop_edge_count(l).unwrap())
            .collect();
        sizes.sort_unstable();
        assert!(sizes.iter().all(|&n| n > 2), "crack loop left behind: {sizes:?}");
        assert_eq!(sizes.iter().sum::<usize>(), 7);
        for &l in &loops {
            let verts = model.loop_vertices(l).unwrap();
            let mut unique = verts.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), verts.len());
        }
        model.verify().unwrap();
    }
}
