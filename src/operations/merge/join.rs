use tracing::{debug, instrument, trace};

use crate::error::{OperationError, Result, TopologyError};
use crate::euler::{kill_faceuse, kill_region, kill_shell, kill_vertexuse, make_loop};
use crate::radial::harmonize_shell_radials;
use crate::topology::{
    EdgeUseId, EdgeUseParent, FaceUseId, LoopUseId, LoopUseParent, Model, Orientation, RegionId,
    ShellId, VertexUseId, VertexUseParent,
};

/// Moves every loop of `src`'s face into `dst`'s face and kills the emptied
/// faceuse pair.
///
/// Loops of `src` go to whichever use of `dst` has the same orientation,
/// and their mates to the other. The surviving face keeps `dst`'s geometry.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] if the uses belong to one face
/// or to different shells.
#[instrument(skip(model))]
pub fn join_faces(model: &mut Model, dst: FaceUseId, src: FaceUseId) -> Result<()> {
    let d = model.faceuse(dst)?;
    let s = model.faceuse(src)?;
    if d.face == s.face {
        return Err(OperationError::InvalidInput("cannot join a face to itself".into()).into());
    }
    if d.shell != s.shell {
        return Err(OperationError::InvalidInput("faces are in different shells".into()).into());
    }
    let (dst_mate, src_mate) = (d.mate, s.mate);
    let (to_same, to_mate) = if d.orientation == s.orientation {
        (dst, dst_mate)
    } else {
        (dst_mate, dst)
    };

    for (from, to) in [(src, to_same), (src_mate, to_mate)] {
        let moved = std::mem::take(&mut model.faceuse_mut(from)?.loopuses);
        for &lu in &moved {
            model.loopuse_mut(lu)?.parent = LoopUseParent::FaceUse(to);
        }
        model.faceuse_mut(to)?.loopuses.extend(moved);
    }
    kill_faceuse(model, src)?;

    let face = model.faceuse(dst)?.face;
    model.rebound_face(face)?;
    debug!(?dst, ?src, "joined faces");
    Ok(())
}

/// Moves every shell of `src` into `dst` and kills `src`.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] if the regions are the same.
#[instrument(skip(model))]
pub fn merge_regions(model: &mut Model, dst: RegionId, src: RegionId) -> Result<()> {
    if dst == src {
        return Err(OperationError::InvalidInput("cannot merge a region into itself".into()).into());
    }
    model.region(dst)?;
    let shells = std::mem::take(&mut model.region_mut(src)?.shells);
    for &s in &shells {
        model.shell_mut(s)?.region = dst;
    }
    model.region_mut(dst)?.shells.extend(shells);
    kill_region(model, src)?;
    model.rebound_region(dst)?;
    debug!(?dst, ?src, "merged regions");
    Ok(())
}

/// Moves a face (both uses) from shell `src` to shell `dst`.
///
/// # Errors
///
/// Returns [`TopologyError::WrongShell`] if `fu` is not in `src`.
pub fn move_faceuse_between_shells(
    model: &mut Model,
    dst: ShellId,
    src: ShellId,
    fu: FaceUseId,
) -> Result<()> {
    model.shell(dst)?;
    let data = model.faceuse(fu)?;
    if data.shell != src {
        return Err(TopologyError::WrongShell("faceuse is not in the source shell".into()).into());
    }
    let (same, opposite) = match data.orientation {
        Orientation::Same => (fu, data.mate),
        _ => (data.mate, fu),
    };
    drop_lone_vertexuse(model, dst)?;
    model.shell_mut(src)?.faceuses.retain(|&f| f != same && f != opposite);
    for f in [same, opposite] {
        model.faceuse_mut(f)?.shell = dst;
    }
    model.shell_mut(dst)?.faceuses.extend([same, opposite]);
    trace!(?fu, ?src, ?dst, "moved faceuse");
    Ok(())
}

/// Moves a wire loop (both uses) from shell `src` to shell `dst`.
///
/// # Errors
///
/// Returns [`TopologyError::WrongShell`] if `lu` is not a wire loop of `src`.
pub fn move_loopuse_between_shells(
    model: &mut Model,
    dst: ShellId,
    src: ShellId,
    lu: LoopUseId,
) -> Result<()> {
    model.shell(dst)?;
    let data = model.loopuse(lu)?;
    let mate = data.mate;
    if data.parent != LoopUseParent::Shell(src)
        || model.loopuse(mate)?.parent != LoopUseParent::Shell(src)
    {
        return Err(
            TopologyError::WrongShell("loopuse is not a wire loop of the source shell".into()).into(),
        );
    }
    drop_lone_vertexuse(model, dst)?;
    model.shell_mut(src)?.wire_loopuses.retain(|&l| l != lu && l != mate);
    for l in [lu, mate] {
        model.loopuse_mut(l)?.parent = LoopUseParent::Shell(dst);
    }
    model.shell_mut(dst)?.wire_loopuses.extend([lu, mate]);
    trace!(?lu, ?src, ?dst, "moved wire loop");
    Ok(())
}

/// Moves a wire edge (both uses) from shell `src` to shell `dst`.
///
/// # Errors
///
/// Returns [`TopologyError::WrongShell`] if `eu` is not a wire edge of `src`.
pub fn move_edgeuse_between_shells(
    model: &mut Model,
    dst: ShellId,
    src: ShellId,
    eu: EdgeUseId,
) -> Result<()> {
    model.shell(dst)?;
    let mate = model.edgeuse(eu)?.mate;
    if model.edgeuse(eu)?.parent != EdgeUseParent::Shell(src)
        || model.edgeuse(mate)?.parent != EdgeUseParent::Shell(src)
    {
        return Err(
            TopologyError::WrongShell("edgeuse is not a wire edge of the source shell".into()).into(),
        );
    }
    drop_lone_vertexuse(model, dst)?;
    model.shell_mut(src)?.wire_edgeuses.retain(|&e| e != eu && e != mate);
    for e in [eu, mate] {
        model.edgeuse_mut(e)?.parent = EdgeUseParent::Shell(dst);
    }
    model.shell_mut(dst)?.wire_edgeuses.extend([eu, mate]);
    trace!(?eu, ?src, ?dst, "moved wire edge");
    Ok(())
}

/// A shell holding anything else cannot keep a lone vertexuse.
fn drop_lone_vertexuse(model: &mut Model, shell: ShellId) -> Result<()> {
    if let Some(vu) = model.shell(shell)?.vertexuse {
        kill_vertexuse(model, vu)?;
        trace!(?shell, ?vu, "dropped lone vertexuse");
    }
    Ok(())
}

/// Moves the lone vertex of shell `src` into `dst` as a self-loop.
///
/// # Errors
///
/// Returns [`TopologyError::WrongShell`] if `vu` is not `src`'s lone vertex.
pub fn move_vertexuse_between_shells(
    model: &mut Model,
    dst: ShellId,
    src: ShellId,
    vu: VertexUseId,
) -> Result<()> {
    if model.vertexuse(vu)?.parent != VertexUseParent::Shell(src) {
        return Err(
            TopologyError::WrongShell("vertexuse is not the source shell's lone vertex".into())
                .into(),
        );
    }
    let v = model.vertexuse(vu)?.vertex;
    make_loop(model, LoopUseParent::Shell(dst), Some(v), Orientation::Same)?;
    kill_vertexuse(model, vu)?;
    trace!(?vu, ?src, ?dst, "moved lone vertex");
    Ok(())
}

/// Moves everything in shell `src` into `dst` and kills `src`.
///
/// A face of `src` whose geometry is already used by a face of `dst` is
/// joined into that face instead of being moved alongside it. Radial parity
/// of `dst` is restored once everything is in place.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] if the shells are the same.
#[instrument(skip(model))]
pub fn join_shells(model: &mut Model, dst: ShellId, src: ShellId) -> Result<()> {
    if dst == src {
        return Err(OperationError::InvalidInput("cannot join a shell to itself".into()).into());
    }
    model.shell(dst)?;

    let mut joined = 0;
    let mut moved = 0;
    for fu in model.shell(src)?.faceuses.clone() {
        if !model.has_faceuse(fu) || model.faceuse(fu)?.orientation != Orientation::Same {
            continue;
        }
        let face = model.faceuse(fu)?.face;
        let partner = match model.face(face)?.geom {
            Some(g) => model.find_faceuse_with_geometry(dst, g)?,
            None => None,
        };
        match partner {
            Some(other) => {
                let other_same = match model.faceuse(other)?.orientation {
                    Orientation::Same => other,
                    _ => model.faceuse(other)?.mate,
                };
                move_faceuse_between_shells(model, dst, src, fu)?;
                join_faces(model, other_same, fu)?;
                joined += 1;
            }
            None => {
                move_faceuse_between_shells(model, dst, src, fu)?;
                moved += 1;
            }
        }
    }

    while let Some(&lu) = model.shell(src)?.wire_loopuses.first() {
        move_loopuse_between_shells(model, dst, src, lu)?;
    }
    while let Some(&eu) = model.shell(src)?.wire_edgeuses.first() {
        move_edgeuse_between_shells(model, dst, src, eu)?;
    }
    if let Some(vu) = model.shell(src)?.vertexuse {
        move_vertexuse_between_shells(model, dst, src, vu)?;
    }

    kill_shell(model, src)?;
    harmonize_shell_radials(model, dst)?;
    debug!(?dst, ?src, joined, moved, "joined shells");
    model.verify_if_enabled()?;
    Ok(())
}
