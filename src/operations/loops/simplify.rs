use tracing::{debug, instrument, trace};

use crate::classify::reorient_loop;
use crate::error::{OperationError, Result};
use crate::euler::{kill_edgeuse, kill_faceuse, kill_loopuse};
use crate::topology::{
    EdgeUseId, FaceUseId, LoopContent, LoopUseId, LoopUseParent, Model, Orientation, ShellId,
};

/// Joins loop `lu` with the loop on the other side of `eu`, removing the
/// edge they share.
///
/// The edgeuses of the other loop are spliced in behind `eu` (their mates
/// ahead of `eu`'s mate), the other loop is killed and then `eu` itself.
/// A face loop is reoriented afterwards.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] unless `eu` is in `lu`, its
/// edge has exactly two use pairs, the other use sits in a different loop
/// under the same parent, and the orientations agree (or an `Opposite`
/// loop is being absorbed into a `Same` one).
#[instrument(skip(model))]
pub fn join_loop(model: &mut Model, lu: LoopUseId, eu: EdgeUseId) -> Result<()> {
    let lu2 = check_joinable(model, lu, eu)?;
    let eu_r = model.edgeuse(eu)?.radial;
    let eu_mate = model.edgeuse(eu)?.mate;

    let mut guard = model.loop_edge_count(lu2)?;
    loop {
        let next = model.edgeuse(eu_r)?.next;
        if next == eu_r {
            break;
        }
        let next_mate = model.edgeuse(next)?.mate;
        model.ring_unlink(next)?;
        model.ring_unlink(next_mate)?;
        model.ring_insert_before(eu, next)?;
        model.ring_insert_after(eu_mate, next_mate)?;
        guard = guard.checked_sub(1).ok_or_else(|| {
            OperationError::Failed("edgeuse ring did not shrink while joining loops".into())
        })?;
    }

    kill_loopuse(model, lu2)?;
    if kill_edgeuse(model, eu)? {
        return Err(OperationError::Failed("joined loop vanished".into()).into());
    }
    if matches!(model.loopuse(lu)?.parent, LoopUseParent::FaceUse(_)) {
        reorient_loop(model, lu)?;
    }
    trace!(?lu, ?lu2, "joined loops across shared edge");
    Ok(())
}

/// The loop across `eu` that [`join_loop`] would absorb into `lu`.
fn check_joinable(model: &Model, lu: LoopUseId, eu: EdgeUseId) -> Result<LoopUseId> {
    let data = model.edgeuse(eu)?;
    if model.loopuse_of_edgeuse(eu)? != Some(lu) {
        return Err(OperationError::InvalidInput("edgeuse is not in the loopuse".into()).into());
    }
    let Some(lu2) = model.loopuse_of_edgeuse(data.radial)? else {
        return Err(OperationError::InvalidInput("radial edgeuse is not in a loop".into()).into());
    };
    if lu2 == lu {
        return Err(OperationError::InvalidInput("cannot join a loop to itself".into()).into());
    }
    let (l1, l2) = (model.loopuse(lu)?, model.loopuse(lu2)?);
    if l1.parent != l2.parent {
        return Err(OperationError::InvalidInput("loopuses do not share a parent".into()).into());
    }
    let compatible = l1.orientation == l2.orientation
        || (l1.orientation == Orientation::Same && l2.orientation == Orientation::Opposite);
    if !compatible {
        return Err(OperationError::InvalidInput(format!(
            "cannot join a {:?} loop into a {:?} loop",
            l2.orientation, l1.orientation
        ))
        .into());
    }
    if model.radial_pairs(eu)?.len() != 2 {
        return Err(OperationError::InvalidInput(
            "shared edge has uses outside the two loops".into(),
        )
        .into());
    }
    Ok(lu2)
}

/// Repeatedly joins `lu` with neighbouring loops of the same parent across
/// edges used by nothing else. Returns the number of loops absorbed.
///
/// # Errors
///
/// Returns an error if a join breaks a structural rule.
#[instrument(skip(model))]
pub fn simplify_loop(model: &mut Model, lu: LoopUseId) -> Result<usize> {
    let mut joined = 0;
    'scan: loop {
        if !model.has_loopuse(lu) {
            break;
        }
        for eu in model.loop_edgeuses(lu)? {
            if check_joinable(model, lu, eu).is_ok() {
                join_loop(model, lu, eu)?;
                joined += 1;
                continue 'scan;
            }
        }
        break;
    }
    if joined > 0 {
        debug!(?lu, joined, "simplified loop");
    }
    Ok(joined)
}

/// Removes dead-end "snake" edges: an edge run out and straight back whose
/// tip vertex is used by nothing else.
///
/// Returns `true` if the loop lost all of its edges and should be killed.
///
/// # Errors
///
/// Returns an error if the ring is broken.
#[instrument(skip(model))]
pub fn kill_snakes(model: &mut Model, lu: LoopUseId) -> Result<bool> {
    let mut killed = 0;
    'scan: loop {
        if !matches!(model.loopuse(lu)?.content, LoopContent::Edges(_)) {
            break;
        }
        for eu in model.loop_edgeuses(lu)? {
            let data = model.edgeuse(eu)?;
            let eu_r = data.radial;
            if data.next != eu_r
                || model.loopuse_of_edgeuse(eu_r)? != Some(lu)
                || model.radial_pairs(eu)?.len() != 2
            {
                continue;
            }

            let tip = model.eu_end_vertex(eu)?;
            let mate_vu = model.edgeuse(data.mate)?.vertexuse;
            let r_vu = model.edgeuse(eu_r)?.vertexuse;
            let mut lonely = true;
            for &vu in &model.vertex(tip)?.uses {
                if vu != mate_vu && vu != r_vu {
                    lonely = false;
                    break;
                }
            }
            if !lonely {
                continue;
            }

            kill_edgeuse(model, eu_r)?;
            killed += 1;
            if kill_edgeuse(model, eu)? {
                debug!(?lu, killed, "snake swallowed whole loop");
                return Ok(true);
            }
            continue 'scan;
        }
        break;
    }
    if killed > 0 {
        debug!(?lu, killed, "killed snakes");
    }
    Ok(model.loopuse(lu)?.content == LoopContent::Empty)
}

/// Simplifies each loop of a face, then strips snakes and kills any loop
/// they consume. Returns `true` if the face is left without loops.
///
/// # Errors
///
/// Returns an error if the faceuse does not exist.
#[instrument(skip(model))]
pub fn simplify_face(model: &mut Model, fu: FaceUseId) -> Result<bool> {
    for lu in model.faceuse(fu)?.loopuses.clone() {
        if model.has_loopuse(lu) {
            simplify_loop(model, lu)?;
        }
    }
    for lu in model.faceuse(fu)?.loopuses.clone() {
        if model.has_loopuse(lu) && kill_snakes(model, lu)? {
            kill_loopuse(model, lu)?;
        }
    }
    Ok(model.faceuse(fu)?.loopuses.is_empty())
}

/// Simplifies every face of a shell, killing faces that end up empty.
/// Returns `true` if the shell is left empty.
///
/// # Errors
///
/// Returns an error if the shell does not exist.
#[instrument(skip(model))]
pub fn simplify_shell(model: &mut Model, shell: ShellId) -> Result<bool> {
    for fu in model.shell(shell)?.faceuses.clone() {
        if !model.has_faceuse(fu) || model.faceuse(fu)?.orientation != Orientation::Same {
            continue;
        }
        if simplify_face(model, fu)? {
            kill_faceuse(model, fu)?;
        }
    }
    Ok(model.shell(shell)?.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::compute_face_plane;
    use crate::euler::make_region;
    use crate::math::{Point3, Tolerance};
    use crate::operations::{join_faces, make_face_from_vertices, make_face_with_vertices};
    use crate::topology::VertexId;

    fn tol() -> Tolerance {
        Tolerance::new(0.005, 1e-6)
    }

    fn vertex(model: &mut Model, x: f64, y: f64) -> Option<VertexId> {
        Some(model.add_vertex(Some(Point3::new(x, y, 0.0))))
    }

    /// Two triangles sharing the diagonal of the unit square, joined into
    /// one face with two loops.
    fn split_square(model: &mut Model) -> (ShellId, FaceUseId) {
        let (_, s) = make_region(model).unwrap();
        let a = vertex(model, 0.0, 0.0);
        let b = vertex(model, 1.0, 0.0);
        let c = vertex(model, 1.0, 1.0);
        let d = vertex(model, 0.0, 1.0);
        let fa = make_face_from_vertices(model, s, &mut [a, b, c]).unwrap();
        compute_face_plane(model, fa, &tol()).unwrap();
        let fb = make_face_from_vertices(model, s, &mut [a, c, d]).unwrap();
        compute_face_plane(model, fb, &tol()).unwrap();
        join_faces(model, fa, fb).unwrap();
        (s, fa)
    }

    #[test]
    fn loops_across_a_private_edge_become_one() {
        let mut model = Model::new();
        let (_, fu) = split_square(&mut model);
        let lu = model.faceuse(fu).unwrap().loopuses[0];

        assert_eq!(simplify_loop(&mut model, lu).unwrap(), 1);
        assert_eq!(model.faceuse(fu).unwrap().loopuses, vec![lu]);
        assert_eq!(model.loop_edge_count(lu).unwrap(), 4);
        assert_eq!(model.edge_count(), 4);
        assert_eq!(model.loopuse(lu).unwrap().orientation, Orientation::Same);
        model.verify().unwrap();

        assert_eq!(simplify_loop(&mut model, lu).unwrap(), 0);
    }

    #[test]
    fn join_loop_rejects_foreign_edgeuse() {
        let mut model = Model::new();
        let (_, fu) = split_square(&mut model);
        let loops = model.faceuse(fu).unwrap().loopuses.clone();
        let foreign = model.loop_edgeuses(loops[1]).unwrap()[0];
        assert!(join_loop(&mut model, loops[0], foreign).is_err());
        model.verify().unwrap();
    }

    #[test]
    fn snake_tail_is_removed() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let a = vertex(&mut model, 0.0, 0.0);
        let b = vertex(&mut model, 2.0, 0.0);
        let c = vertex(&mut model, 2.0, 2.0);
        let tip = vertex(&mut model, 1.0, 1.0);
        // a -> b -> c -> tip -> c -> back to a along the diagonal.
        let fu = make_face_with_vertices(&mut model, s, &mut [a, b, c, tip, c]).unwrap();
        let lu = model.faceuse(fu).unwrap().loopuses[0];
        let eus = model.loop_edgeuses(lu).unwrap();
        crate::radial::join_edgeuses(&mut model, eus[2], eus[3]).unwrap();

        assert!(!kill_snakes(&mut model, lu).unwrap());
        assert_eq!(model.loop_edge_count(lu).unwrap(), 3);
        assert!(!model.has_vertex(tip.unwrap()));
        model.verify().unwrap();
    }

    #[test]
    fn crack_face_simplifies_away() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let a = vertex(&mut model, 0.0, 0.0);
        let b = vertex(&mut model, 1.0, 0.0);
        let fu = make_face_with_vertices(&mut model, s, &mut [a, b]).unwrap();
        let lu = model.faceuse(fu).unwrap().loopuses[0];
        let eus = model.loop_edgeuses(lu).unwrap();
        crate::radial::join_edgeuses(&mut model, eus[0], eus[1]).unwrap();

        assert!(simplify_shell(&mut model, s).unwrap());
        assert_eq!(model.face_count(), 0);
    }
}
