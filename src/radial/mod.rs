//! Radial fans and orientation parity.
//!
//! Every edge keeps a circular fan of its uses. Walking `mate` then `radial`
//! from any use visits each use exactly once before returning. Around an
//! edge, uses from faceuses of one shell must face a neighbour of the same
//! orientation: `Same` toward `Same`, `Opposite` toward `Opposite`.

use tracing::{debug, instrument, trace};

use crate::diag::DebugFlags;
use crate::error::{Result, TopologyError};
use crate::topology::{
    EdgeData, EdgeId, EdgeUseId, FaceUseId, LoopContent, Model, Orientation, ShellId,
};

/// Detach `eu` and its mate from a shared fan onto a new private edge.
///
/// The rest of the fan closes up around the gap. Returns the edge the pair
/// ends up on, which is the old edge when the pair was already alone.
///
/// # Errors
///
/// Returns an error if `eu` does not exist.
#[instrument(skip(model))]
pub fn unglue_edge(model: &mut Model, eu: EdgeUseId) -> Result<EdgeId> {
    let data = model.edgeuse(eu)?;
    let (mate, old_edge, r1) = (data.mate, data.edge, data.radial);
    if r1 == mate {
        return Ok(old_edge);
    }
    let r2 = model.edgeuse(mate)?.radial;

    model.edgeuse_mut(r1)?.radial = r2;
    model.edgeuse_mut(r2)?.radial = r1;
    let e = model.edge_mut(old_edge)?;
    if e.edgeuse == eu || e.edgeuse == mate {
        e.edgeuse = r1;
    }

    let index = model.next_index();
    let new_edge = model.edges.insert(EdgeData { index, edgeuse: eu });
    for (a, b) in [(eu, mate), (mate, eu)] {
        let d = model.edgeuse_mut(a)?;
        d.radial = b;
        d.edge = new_edge;
    }
    trace!(?eu, ?new_edge, "unglued edgeuse pair");
    Ok(new_edge)
}

/// Make the lone pair of `src` share the edge of `dst`.
///
/// The vertices must match in either direction. The pair is inserted into
/// the fan directly ahead of `dst` (walk order: `src.mate`, `src`, `dst`),
/// its old edge is removed, and it takes up `dst`'s geometry when `dst` has
/// some. A shared `src` is unglued first.
///
/// # Errors
///
/// Returns [`TopologyError::InvalidTopology`] if the vertices differ.
#[instrument(skip(model))]
pub fn join_edgeuses(model: &mut Model, dst: EdgeUseId, src: EdgeUseId) -> Result<()> {
    let dst_mate = model.edgeuse(dst)?.mate;
    if dst == src || dst_mate == src {
        return Ok(());
    }
    let (d0, d1) = (model.eu_start_vertex(dst)?, model.eu_end_vertex(dst)?);
    let (s0, s1) = (model.eu_start_vertex(src)?, model.eu_end_vertex(src)?);
    if !((d0 == s1 && d1 == s0) || (d0 == s0 && d1 == s1)) {
        return Err(TopologyError::InvalidTopology(
            "edgeuses do not share vertices, cannot share edge".into(),
        )
        .into());
    }
    if model.edgeuse(src)?.radial != model.edgeuse(src)?.mate {
        unglue_edge(model, src)?;
    }
    if model.edgeuse(src)?.edge == model.edgeuse(dst)?.edge {
        return Ok(());
    }

    let src_mate = model.edgeuse(src)?.mate;
    let old_edge = model.edgeuse(src)?.edge;
    let edge = model.edgeuse(dst)?.edge;
    let dst_radial = model.edgeuse(dst)?.radial;

    model.edgeuse_mut(src)?.radial = dst;
    model.edgeuse_mut(src_mate)?.radial = dst_radial;
    model.edgeuse_mut(dst_radial)?.radial = src_mate;
    model.edgeuse_mut(dst)?.radial = src;
    model.edgeuse_mut(src)?.edge = edge;
    model.edgeuse_mut(src_mate)?.edge = edge;
    model.edges.remove(old_edge);

    if let Some(g) = model.edgeuse(dst)?.geom {
        model.use_edge_geometry(src, g)?;
    } else if let Some(g) = model.edgeuse(src)?.geom {
        model.use_edge_geometry(dst, g)?;
    }
    trace!(?dst, ?src, "joined edgeuses");
    Ok(())
}

/// Move every use of `src`'s edge onto `dst`'s edge, then restore parity
/// for the faces involved. Returns the number of use pairs moved.
///
/// # Errors
///
/// Returns an error if the two edges do not join the same vertices.
#[instrument(skip(model))]
pub fn radial_join(model: &mut Model, dst: EdgeUseId, src: EdgeUseId) -> Result<usize> {
    if model.edgeuse(dst)?.edge == model.edgeuse(src)?.edge {
        return Ok(0);
    }
    let pairs = model.radial_pairs(src)?;
    let mut faces = Vec::new();
    for &p in &pairs {
        join_edgeuses(model, dst, p)?;
        if let Some(fu) = model.faceuse_of_edgeuse(p)? {
            faces.push(fu);
        }
    }
    if let Some(fu) = model.faceuse_of_edgeuse(dst)? {
        faces.push(fu);
    }
    for fu in faces {
        if model.has_faceuse(fu) {
            fix_radial_parity(model, fu)?;
        }
    }
    debug!(?dst, moved = pairs.len(), "radially joined edges");
    Ok(pairs.len())
}

/// Number of `mate`/`radial` steps needed to walk back to `eu`.
///
/// # Errors
///
/// Returns [`TopologyError::RadialBroken`] if the walk does not close.
pub fn radial_cycle_len(model: &Model, eu: EdgeUseId) -> Result<usize> {
    Ok(2 * model.radial_pairs(eu)?.len())
}

/// The first use found walking from `eu.radial` that sits in a faceuse of
/// `shell` on a face other than `eu`'s, stopping when the walk reaches
/// `eu`'s own pair.
fn facing_use_in_shell(model: &Model, eu: EdgeUseId, shell: ShellId) -> Result<Option<EdgeUseId>> {
    let data = model.edgeuse(eu)?;
    let mate = data.mate;
    let own_face = match model.faceuse_of_edgeuse(eu)? {
        Some(fu) => Some(model.faceuse(fu)?.face),
        None => None,
    };
    let mut cur = data.radial;
    let mut steps = 0;
    while cur != eu && cur != mate {
        if let Some(fu) = model.faceuse_of_edgeuse(cur)? {
            let fdata = model.faceuse(fu)?;
            if fdata.shell == shell && Some(fdata.face) != own_face {
                return Ok(Some(cur));
            }
        }
        let cur_mate = model.edgeuse(cur)?.mate;
        cur = model.edgeuse(cur_mate)?.radial;
        steps += 1;
        if steps > model.edgeuses.len() {
            return Err(TopologyError::RadialBroken("radial walk does not close".into()).into());
        }
    }
    Ok(None)
}

/// Restore radial parity along every edge of a face.
///
/// Works from the `Same` use of the face. Wherever the nearest radial
/// neighbour from the same shell belongs to an `Opposite` faceuse, the
/// edgeuse and its mate trade places in the fan. Returns the number of
/// edges changed.
///
/// Only meaningful once every face of a batch is in place; running it
/// between moves reads half-updated neighbours.
///
/// # Errors
///
/// Returns [`TopologyError::OrientationClash`] if the face has no `Same` use.
#[instrument(skip(model))]
pub fn fix_radial_parity(model: &mut Model, fu: FaceUseId) -> Result<usize> {
    let data = model.faceuse(fu)?;
    let fu = match data.orientation {
        Orientation::Same => fu,
        Orientation::Opposite => data.mate,
        other => {
            return Err(TopologyError::OrientationClash(format!(
                "faceuse orientation {other:?} has no parity"
            ))
            .into())
        }
    };
    let shell = model.faceuse(fu)?.shell;
    let verbose = model.debug_flags().contains(DebugFlags::RADIAL);

    let mut count = 0;
    for lu in model.faceuse(fu)?.loopuses.clone() {
        if !matches!(model.loopuse(lu)?.content, LoopContent::Edges(_)) {
            continue;
        }
        for eu in model.loop_edgeuses(lu)? {
            let mate = model.edgeuse(eu)?.mate;
            let before = model.edgeuse(eu)?.radial;
            let after = model.edgeuse(mate)?.radial;
            if before == mate {
                continue;
            }
            let Some(facing) = facing_use_in_shell(model, eu, shell)? else {
                continue;
            };
            let Some(facing_fu) = model.faceuse_of_edgeuse(facing)? else {
                continue;
            };
            if model.faceuse(facing_fu)?.orientation == Orientation::Same {
                continue;
            }

            model.edgeuse_mut(before)?.radial = mate;
            model.edgeuse_mut(mate)?.radial = before;
            model.edgeuse_mut(after)?.radial = eu;
            model.edgeuse_mut(eu)?.radial = after;
            count += 1;
            if verbose {
                debug!(?eu, ?before, ?after, "swapped pair in radial fan");
            }
        }
    }
    if count > 0 {
        debug!(?fu, count, "fixed radial parity");
    }
    Ok(count)
}

/// Run [`fix_radial_parity`] over every face of a shell.
///
/// # Errors
///
/// Returns an error if a face has no `Same` use.
#[instrument(skip(model))]
pub fn harmonize_shell_radials(model: &mut Model, shell: ShellId) -> Result<usize> {
    let mut seen = model.visited_set();
    let mut total = 0;
    for fu in model.shell(shell)?.faceuses.clone() {
        if !model.has_faceuse(fu) {
            continue;
        }
        let face = model.faceuse(fu)?.face;
        if seen.test_and_set(model.face(face)?.index) {
            continue;
        }
        total += fix_radial_parity(model, fu)?;
    }
    Ok(total)
}

/// Check radial parity at one edgeuse.
///
/// # Errors
///
/// Returns [`TopologyError::RadialBroken`] if the nearest same-shell
/// neighbour has the other orientation.
pub fn check_radial_parity(model: &Model, eu: EdgeUseId) -> Result<()> {
    let Some(fu) = model.faceuse_of_edgeuse(eu)? else {
        return Ok(());
    };
    let data = model.faceuse(fu)?;
    if !matches!(data.orientation, Orientation::Same | Orientation::Opposite) {
        return Ok(());
    }
    let Some(facing) = facing_use_in_shell(model, eu, data.shell)? else {
        return Ok(());
    };
    let Some(facing_fu) = model.faceuse_of_edgeuse(facing)? else {
        return Ok(());
    };
    if model.faceuse(facing_fu)?.orientation != data.orientation {
        return Err(TopologyError::RadialBroken(format!(
            "{:?} use faces a {:?} use",
            data.orientation,
            model.faceuse(facing_fu)?.orientation
        ))
        .into());
    }
    Ok(())
}

/// Swap the orientations of a face's two uses.
///
/// The face's `flip` toggles so each use keeps seeing the plane that
/// matches its loops.
///
/// # Errors
///
/// Returns [`TopologyError::OrientationClash`] if the uses are not a
/// `Same`/`Opposite` pair.
pub fn reverse_face(model: &mut Model, fu: FaceUseId) -> Result<()> {
    let data = model.faceuse(fu)?;
    let (mate, face, orientation) = (data.mate, data.face, data.orientation);
    let mate_orientation = model.faceuse(mate)?.orientation;
    if !matches!(orientation, Orientation::Same | Orientation::Opposite)
        || mate_orientation != orientation.flipped()
    {
        return Err(TopologyError::OrientationClash(
            "faceuse and mate do not have opposite orientations".into(),
        )
        .into());
    }
    model.faceuse_mut(fu)?.orientation = mate_orientation;
    model.faceuse_mut(mate)?.orientation = orientation;
    let f = model.face_mut(face)?;
    f.flip = !f.flip;
    trace!(?fu, "reversed face");
    Ok(())
}

/// Turn a shell inside out by reversing each of its faces once.
///
/// # Errors
///
/// Returns an error if a face's uses are not a `Same`/`Opposite` pair.
#[instrument(skip(model))]
pub fn invert_shell(model: &mut Model, shell: ShellId) -> Result<()> {
    let mut seen = model.visited_set();
    for fu in model.shell(shell)?.faceuses.clone() {
        let face = model.faceuse(fu)?.face;
        if seen.test_and_set(model.face(face)?.index) {
            continue;
        }
        reverse_face(model, fu)?;
    }
    debug!(?shell, "inverted shell");
    Ok(())
}
