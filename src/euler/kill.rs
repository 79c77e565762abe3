use tracing::{debug, instrument, trace};

use crate::error::{Result, TopologyError};
use crate::topology::{
    EdgeUseId, EdgeUseParent, FaceUseId, LoopContent, LoopUseId, LoopUseParent, Model, RegionId,
    ShellId, VertexId, VertexUseId, VertexUseParent,
};

/// Kill a lone or self-loop vertexuse.
///
/// Returns `true` if the parent (shell or loopuse) is now empty. The vertex
/// goes away with its last use.
///
/// # Errors
///
/// Returns [`TopologyError::WrongParent`] for a vertexuse owned by an
/// edgeuse; those die with their edgeuse.
#[instrument(skip(model))]
pub fn kill_vertexuse(model: &mut Model, vu: VertexUseId) -> Result<bool> {
    let empty = match model.vertexuse(vu)?.parent {
        VertexUseParent::Shell(s) => {
            model.shell_mut(s)?.vertexuse = None;
            model.free_vertexuse(vu)?;
            model.shell(s)?.is_empty()
        }
        VertexUseParent::LoopUse(lu) => {
            model.loopuse_mut(lu)?.content = LoopContent::Empty;
            model.free_vertexuse(vu)?;
            true
        }
        VertexUseParent::EdgeUse(_) => {
            return Err(TopologyError::WrongParent(
                "edgeuse vertexuses are killed with their edgeuse".into(),
            )
            .into())
        }
    };
    trace!(?vu, empty, "killed vertexuse");
    Ok(empty)
}

/// Kill an edgeuse and its mate.
///
/// The pair is taken out of its radial fan, the edge is removed once no
/// other uses remain, and the vertexuses go with it. Returns `true` if the
/// parent (loopuse or shell) is now empty.
///
/// Killing one edge of a loop leaves a gap; callers that do this keep the
/// ring closed by killing or rerouting the neighbours.
///
/// # Errors
///
/// Returns an error if the mate lives under a different kind of parent.
#[instrument(skip(model))]
pub fn kill_edgeuse(model: &mut Model, eu: EdgeUseId) -> Result<bool> {
    let data = model.edgeuse(eu)?;
    let (mate, edge, parent, r1) = (data.mate, data.edge, data.parent, data.radial);
    let mate_data = model.edgeuse(mate)?;
    let r2 = mate_data.radial;
    let same_kind = matches!(
        (parent, mate_data.parent),
        (EdgeUseParent::Shell(_), EdgeUseParent::Shell(_))
            | (EdgeUseParent::LoopUse(_), EdgeUseParent::LoopUse(_))
    );
    if !same_kind {
        return Err(TopologyError::MateMismatch("edgeuse mate has another parent kind".into()).into());
    }

    if r1 == mate {
        model.edges.remove(edge);
    } else {
        model.edgeuse_mut(r1)?.radial = r2;
        model.edgeuse_mut(r2)?.radial = r1;
        let e = model.edge_mut(edge)?;
        if e.edgeuse == eu || e.edgeuse == mate {
            e.edgeuse = r1;
        }
    }

    model.detach_edge_geom(eu)?;
    model.detach_edge_geom(mate)?;

    let empty = match parent {
        EdgeUseParent::LoopUse(lu) => {
            model.ring_unlink(eu)?;
            model.ring_unlink(mate)?;
            model.loopuse(lu)?.content == LoopContent::Empty
        }
        EdgeUseParent::Shell(s) => {
            let shell = model.shell_mut(s)?;
            shell.wire_edgeuses.retain(|&x| x != eu && x != mate);
            shell.is_empty()
        }
    };

    for x in [eu, mate] {
        let vu = model.edgeuse(x)?.vertexuse;
        model.free_vertexuse(vu)?;
        model.edgeuses.remove(x);
    }
    trace!(?eu, empty, "killed edgeuse");
    Ok(empty)
}

/// Kill a loopuse, its mate and everything in them.
///
/// Returns `true` if the parent faceuse (or shell, for a wire loop) is now
/// empty.
///
/// # Errors
///
/// Returns an error if the loopuse does not exist.
#[instrument(skip(model))]
pub fn kill_loopuse(model: &mut Model, lu: LoopUseId) -> Result<bool> {
    let lumate = model.loopuse(lu)?.mate;
    loop {
        match model.loopuse(lu)?.content {
            LoopContent::Edges(first) => {
                kill_edgeuse(model, first)?;
            }
            LoopContent::Vertex(vu) => {
                model.free_vertexuse(vu)?;
                model.loopuse_mut(lu)?.content = LoopContent::Empty;
            }
            LoopContent::Empty => break,
        }
    }
    if let LoopContent::Vertex(vu) = model.loopuse(lumate)?.content {
        model.free_vertexuse(vu)?;
    }

    let lp = model.loopuse(lu)?.lp;
    let empty = match model.loopuse(lu)?.parent {
        LoopUseParent::FaceUse(fu) => {
            let mate_fu = model.faceuse(fu)?.mate;
            model.faceuse_mut(mate_fu)?.loopuses.retain(|&l| l != lumate);
            let data = model.faceuse_mut(fu)?;
            data.loopuses.retain(|&l| l != lu);
            data.loopuses.is_empty()
        }
        LoopUseParent::Shell(s) => {
            let shell = model.shell_mut(s)?;
            shell.wire_loopuses.retain(|&l| l != lu && l != lumate);
            shell.is_empty()
        }
    };
    model.loopuses.remove(lu);
    model.loopuses.remove(lumate);
    model.loops.remove(lp);
    debug!(?lu, empty, "killed loopuse");
    Ok(empty)
}

/// Kill a faceuse, its mate, the face and all of their loops.
///
/// Returns `true` if the shell is now empty.
///
/// # Errors
///
/// Returns an error if the faceuse does not exist.
#[instrument(skip(model))]
pub fn kill_faceuse(model: &mut Model, fu: FaceUseId) -> Result<bool> {
    let data = model.faceuse(fu)?;
    let (mate, face, shell) = (data.mate, data.face, data.shell);
    while let Some(&lu) = model.faceuse(fu)?.loopuses.first() {
        kill_loopuse(model, lu)?;
    }
    model.release_face_geometry(face)?;
    model.faces.remove(face);
    model.faceuses.remove(fu);
    model.faceuses.remove(mate);
    let s = model.shell_mut(shell)?;
    s.faceuses.retain(|&f| f != fu && f != mate);
    let empty = s.is_empty();
    debug!(?fu, empty, "killed faceuse");
    Ok(empty)
}

/// Kill a shell and everything in it. Returns `true` if its region is now
/// empty.
///
/// # Errors
///
/// Returns an error if the shell does not exist.
#[instrument(skip(model))]
pub fn kill_shell(model: &mut Model, shell: ShellId) -> Result<bool> {
    while let Some(&fu) = model.shell(shell)?.faceuses.first() {
        kill_faceuse(model, fu)?;
    }
    while let Some(&lu) = model.shell(shell)?.wire_loopuses.first() {
        kill_loopuse(model, lu)?;
    }
    while let Some(&eu) = model.shell(shell)?.wire_edgeuses.first() {
        kill_edgeuse(model, eu)?;
    }
    if let Some(vu) = model.shell(shell)?.vertexuse {
        kill_vertexuse(model, vu)?;
    }
    let region = model.shell(shell)?.region;
    model.shells.remove(shell);
    let r = model.region_mut(region)?;
    r.shells.retain(|&s| s != shell);
    let empty = r.shells.is_empty();
    debug!(?shell, empty, "killed shell");
    Ok(empty)
}

/// Kill a region and all of its shells. Returns `true` if the model has no
/// regions left.
///
/// # Errors
///
/// Returns an error if the region does not exist.
#[instrument(skip(model))]
pub fn kill_region(model: &mut Model, region: RegionId) -> Result<bool> {
    while let Some(&s) = model.region(region)?.shells.first() {
        kill_shell(model, s)?;
    }
    model.regions.remove(region);
    debug!(?region, "killed region");
    Ok(model.regions.is_empty())
}

/// Moves a vertexuse onto another vertex. The old vertex is removed once
/// its last use has left.
///
/// # Errors
///
/// Returns an error if the vertexuse or either vertex does not exist.
pub fn move_vertexuse(model: &mut Model, vu: VertexUseId, v: VertexId) -> Result<()> {
    let old = model.vertexuse(vu)?.vertex;
    if old == v {
        return Ok(());
    }
    model.vertex_mut(v)?.uses.push(vu);
    model.vertexuse_mut(vu)?.vertex = v;
    let data = model.vertex_mut(old)?;
    data.uses.retain(|&u| u != vu);
    if data.uses.is_empty() {
        model.vertices.remove(old);
    }
    trace!(?vu, ?old, ?v, "moved vertexuse");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::euler::{make_edge, make_face, make_loop, make_region};
    use crate::operations::make_face_with_vertices;
    use crate::topology::Orientation;

    #[test]
    fn killing_wire_edge_empties_shell() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let eu = make_edge(&mut model, None, None, s).unwrap();
        assert!(kill_edgeuse(&mut model, eu).unwrap());
        assert_eq!(model.vertex_count(), 0);
        assert_eq!(model.edge_count(), 0);
    }

    #[test]
    fn killing_self_loop_vertexuse_reports_empty_loop() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let lu = make_loop(&mut model, LoopUseParent::Shell(s), None, Orientation::Same).unwrap();
        let LoopContent::Vertex(vu) = model.loopuse(lu).unwrap().content else {
            panic!("expected self-loop");
        };
        assert!(kill_vertexuse(&mut model, vu).unwrap());
        assert!(kill_loopuse(&mut model, lu).unwrap());
        assert_eq!(model.vertex_count(), 0);
    }

    #[test]
    fn killing_the_only_face_cascades_to_shell_and_region() {
        let mut model = Model::new();
        let (r, s) = make_region(&mut model).unwrap();
        let mut verts = [None, None, None];
        let fu = make_face_with_vertices(&mut model, s, &mut verts).unwrap();
        assert!(kill_faceuse(&mut model, fu).unwrap());
        assert_eq!(model.vertex_count(), 0);
        assert_eq!(model.edge_count(), 0);
        assert_eq!(model.face_count(), 0);
        assert!(kill_shell(&mut model, s).unwrap());
        assert!(kill_region(&mut model, r).unwrap());
    }

    #[test]
    fn killing_one_loop_keeps_face_alive() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let mut verts = [None, None, None];
        let fu = make_face_with_vertices(&mut model, s, &mut verts).unwrap();
        let extra = make_loop(&mut model, LoopUseParent::FaceUse(fu), None, Orientation::Opposite)
            .unwrap();
        assert!(!kill_loopuse(&mut model, extra).unwrap());
        assert_eq!(model.faceuse(fu).unwrap().loopuses.len(), 1);
        model.verify().unwrap();
    }

    #[test]
    fn edgeuse_vertexuse_cannot_be_killed_alone() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let eu = make_edge(&mut model, None, None, s).unwrap();
        let vu = model.edgeuse(eu).unwrap().vertexuse;
        assert!(kill_vertexuse(&mut model, vu).is_err());
    }

    #[test]
    fn moving_last_use_drops_old_vertex() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let lu = make_loop(&mut model, LoopUseParent::Shell(s), None, Orientation::Same).unwrap();
        let fu = make_face(&mut model, lu).unwrap();
        let LoopContent::Vertex(vu) = model.loopuse(lu).unwrap().content else {
            panic!("expected self-loop");
        };
        let old = model.vertexuse(vu).unwrap().vertex;
        let mate_lu = model.loopuse(lu).unwrap().mate;
        let LoopContent::Vertex(mate_vu) = model.loopuse(mate_lu).unwrap().content else {
            panic!("expected self-loop");
        };
        let target = model.add_vertex(None);
        move_vertexuse(&mut model, vu, target).unwrap();
        assert!(model.has_vertex(old));
        move_vertexuse(&mut model, mate_vu, target).unwrap();
        assert!(!model.has_vertex(old));
        assert_eq!(model.vertex(target).unwrap().uses.len(), 2);
        assert!(model.has_faceuse(fu));
    }
}
