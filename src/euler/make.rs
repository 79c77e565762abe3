use tracing::{debug, instrument, trace};

use crate::error::{Result, TopologyError};
use crate::topology::{
    EdgeData, EdgeId, EdgeUseData, EdgeUseId, EdgeUseParent, FaceData, FaceUseData, FaceUseId,
    LoopContent, LoopData, LoopUseData, LoopUseId, LoopUseParent, Model, Orientation,
    RegionData, RegionId, ShellData, ShellId, VertexId, VertexUseId, VertexUseParent,
};

/// Make region, shell and vertex: the seed of a new solid.
///
/// The shell starts out holding a single lone vertex with no point.
#[instrument(skip(model))]
pub fn make_region(model: &mut Model) -> Result<(RegionId, ShellId)> {
    let index = model.next_index();
    let region = model.regions.insert(RegionData {
        index,
        shells: Vec::new(),
        bbox: None,
    });
    let shell = make_shell(model, region)?;
    debug!(?region, ?shell, "made region");
    Ok((region, shell))
}

/// Make shell and vertex inside an existing region.
///
/// # Errors
///
/// Returns an error if the region does not exist.
#[instrument(skip(model))]
pub fn make_shell(model: &mut Model, region: RegionId) -> Result<ShellId> {
    model.region(region)?;
    let index = model.next_index();
    let shell = model.shells.insert(ShellData {
        index,
        region,
        faceuses: Vec::new(),
        wire_loopuses: Vec::new(),
        wire_edgeuses: Vec::new(),
        vertexuse: None,
        bbox: None,
    });
    let v = model.add_vertex(None);
    let vu = model.new_vertexuse(v, VertexUseParent::Shell(shell))?;
    model.shell_mut(shell)?.vertexuse = Some(vu);
    model.region_mut(region)?.shells.push(shell);
    debug!(?shell, ?v, "made shell");
    Ok(shell)
}

/// Make a self-loop on `vertex` (or a fresh vertex), returning one of the
/// new loopuse pair.
///
/// Under a faceuse the pair is split between the faceuse and its mate.
/// Under a shell both go on the wire-loop list; a lone vertexuse already in
/// the shell is absorbed when it sits on the requested vertex (or none was
/// requested) and discarded otherwise. Both uses get `orientation`.
///
/// # Errors
///
/// Returns an error if the parent or vertex does not exist.
#[instrument(skip(model))]
pub fn make_loop(
    model: &mut Model,
    parent: LoopUseParent,
    vertex: Option<VertexId>,
    orientation: Orientation,
) -> Result<LoopUseId> {
    let (parent1, parent2) = match parent {
        LoopUseParent::Shell(s) => {
            model.shell(s)?;
            (parent, parent)
        }
        LoopUseParent::FaceUse(fu) => (parent, LoopUseParent::FaceUse(model.faceuse(fu)?.mate)),
    };

    let (lu1, lu2) = new_loopuse_pair(model, parent1, parent2, orientation);

    let mut reuse: Option<VertexUseId> = None;
    let mut vertex = vertex;
    if let LoopUseParent::Shell(s) = parent {
        if let Some(lone) = model.shell(s)?.vertexuse {
            let lone_v = model.vertexuse(lone)?.vertex;
            if vertex.is_none() || vertex == Some(lone_v) {
                vertex = Some(lone_v);
                reuse = Some(lone);
            }
        }
    }
    let v = match vertex {
        Some(v) => {
            model.vertex(v)?;
            v
        }
        None => model.add_vertex(None),
    };

    let vu1 = match reuse {
        Some(vu) => {
            model.vertexuse_mut(vu)?.parent = VertexUseParent::LoopUse(lu1);
            vu
        }
        None => model.new_vertexuse(v, VertexUseParent::LoopUse(lu1))?,
    };
    let vu2 = model.new_vertexuse(v, VertexUseParent::LoopUse(lu2))?;
    model.loopuse_mut(lu1)?.content = LoopContent::Vertex(vu1);
    model.loopuse_mut(lu2)?.content = LoopContent::Vertex(vu2);

    match parent {
        LoopUseParent::Shell(s) => {
            let lone = model.shell_mut(s)?.vertexuse.take();
            if let Some(lone) = lone.filter(|&vu| Some(vu) != reuse) {
                model.free_vertexuse(lone)?;
            }
            model.shell_mut(s)?.wire_loopuses.extend([lu1, lu2]);
        }
        LoopUseParent::FaceUse(fu) => {
            model.faceuse_mut(fu)?.loopuses.push(lu1);
            let mate = model.faceuse(fu)?.mate;
            model.faceuse_mut(mate)?.loopuses.push(lu2);
        }
    }

    debug!(?lu1, ?v, "made loop");
    Ok(lu1)
}

/// Makes a loopuse pair with no content yet and files it under `parent`.
/// Callers fill the ring before handing the model back.
pub(crate) fn make_empty_loop(
    model: &mut Model,
    parent: LoopUseParent,
    orientation: Orientation,
) -> Result<LoopUseId> {
    let (lu1, lu2) = match parent {
        LoopUseParent::Shell(s) => {
            model.shell(s)?;
            let pair = new_loopuse_pair(model, parent, parent, orientation);
            model.shell_mut(s)?.wire_loopuses.extend([pair.0, pair.1]);
            pair
        }
        LoopUseParent::FaceUse(fu) => {
            let mate = model.faceuse(fu)?.mate;
            let pair = new_loopuse_pair(model, parent, LoopUseParent::FaceUse(mate), orientation);
            model.faceuse_mut(fu)?.loopuses.push(pair.0);
            model.faceuse_mut(mate)?.loopuses.push(pair.1);
            pair
        }
    };
    trace!(?lu1, ?lu2, "made empty loop");
    Ok(lu1)
}

/// Allocates a loop and its two uses with empty content.
pub(crate) fn new_loopuse_pair(
    model: &mut Model,
    parent1: LoopUseParent,
    parent2: LoopUseParent,
    orientation: Orientation,
) -> (LoopUseId, LoopUseId) {
    let index = model.next_index();
    let lp = model.loops.insert(LoopData {
        index,
        loopuse: LoopUseId::default(),
        bbox: None,
    });
    let mut make = |parent| {
        let index = model.next_index();
        model.loopuses.insert(LoopUseData {
            index,
            parent,
            lp,
            mate: LoopUseId::default(),
            orientation,
            content: LoopContent::Empty,
        })
    };
    let lu1 = make(parent1);
    let lu2 = make(parent2);
    model.loopuses[lu1].mate = lu2;
    model.loopuses[lu2].mate = lu1;
    model.loops[lp].loopuse = lu1;
    (lu1, lu2)
}

/// Make face: wraps a wire loopuse pair in a new face and faceuse pair.
///
/// The faceuse holding `lu` is `Same`, its mate `Opposite`; the loop
/// becomes an outer boundary (`Same`) in both.
///
/// # Errors
///
/// Returns [`TopologyError::WrongParent`] if `lu` is not a wire loop.
#[instrument(skip(model))]
pub fn make_face(model: &mut Model, lu: LoopUseId) -> Result<FaceUseId> {
    let LoopUseParent::Shell(shell) = model.loopuse(lu)?.parent else {
        return Err(TopologyError::WrongParent("make_face needs a wire loop".into()).into());
    };
    let lumate = model.loopuse(lu)?.mate;
    if model.loopuse(lumate)?.parent != LoopUseParent::Shell(shell) {
        return Err(TopologyError::MateMismatch("loopuse mate is in another shell".into()).into());
    }

    let index = model.next_index();
    let face = model.faces.insert(FaceData {
        index,
        faceuse: FaceUseId::default(),
        geom: None,
        flip: false,
        bbox: None,
    });
    let index = model.next_index();
    let fu1 = model.faceuses.insert(FaceUseData {
        index,
        shell,
        face,
        mate: FaceUseId::default(),
        orientation: Orientation::Same,
        loopuses: vec![lu],
    });
    let index = model.next_index();
    let fu2 = model.faceuses.insert(FaceUseData {
        index,
        shell,
        face,
        mate: fu1,
        orientation: Orientation::Opposite,
        loopuses: vec![lumate],
    });
    model.faceuse_mut(fu1)?.mate = fu2;
    model.face_mut(face)?.faceuse = fu1;

    let s = model.shell_mut(shell)?;
    s.wire_loopuses.retain(|&l| l != lu && l != lumate);
    s.faceuses.extend([fu1, fu2]);

    for (l, fu) in [(lu, fu1), (lumate, fu2)] {
        let data = model.loopuse_mut(l)?;
        data.parent = LoopUseParent::FaceUse(fu);
        data.orientation = Orientation::Same;
    }

    debug!(?fu1, ?face, "made face");
    Ok(fu1)
}

/// Allocates an edge with two mated uses starting at `v1` and `v2`.
///
/// The uses are radial to each other and self-linked; callers splice them
/// into rings or lists.
pub(crate) fn new_edgeuse_pair(
    model: &mut Model,
    parent1: EdgeUseParent,
    v1: VertexId,
    parent2: EdgeUseParent,
    v2: VertexId,
) -> Result<(EdgeUseId, EdgeUseId)> {
    let index = model.next_index();
    let edge = model.edges.insert(EdgeData {
        index,
        edgeuse: EdgeUseId::default(),
    });
    let eu1 = insert_edgeuse(model, parent1, edge);
    let eu2 = insert_edgeuse(model, parent2, edge);
    let vu1 = model.new_vertexuse(v1, VertexUseParent::EdgeUse(eu1))?;
    let vu2 = model.new_vertexuse(v2, VertexUseParent::EdgeUse(eu2))?;
    link_pair(model, edge, eu1, eu2)?;
    model.edgeuse_mut(eu1)?.vertexuse = vu1;
    model.edgeuse_mut(eu2)?.vertexuse = vu2;
    Ok((eu1, eu2))
}

fn insert_edgeuse(model: &mut Model, parent: EdgeUseParent, edge: EdgeId) -> EdgeUseId {
    let index = model.next_index();
    model.edgeuses.insert_with_key(|eu| EdgeUseData {
        index,
        parent,
        edge,
        mate: eu,
        radial: eu,
        next: eu,
        prev: eu,
        vertexuse: VertexUseId::default(),
        geom: None,
    })
}

fn link_pair(model: &mut Model, edge: EdgeId, eu1: EdgeUseId, eu2: EdgeUseId) -> Result<()> {
    for (a, b) in [(eu1, eu2), (eu2, eu1)] {
        let data = model.edgeuse_mut(a)?;
        data.mate = b;
        data.radial = b;
    }
    model.edge_mut(edge)?.edgeuse = eu1;
    Ok(())
}

/// Make a wire edge between two vertices, either of which may be fresh.
///
/// Returns the use running from `v1` to `v2`. A lone vertexuse in the shell
/// is consumed: its vertex stands in for a missing `v1` (or `v2`).
///
/// # Errors
///
/// Returns an error if the shell or a given vertex does not exist.
#[instrument(skip(model))]
pub fn make_edge(
    model: &mut Model,
    v1: Option<VertexId>,
    v2: Option<VertexId>,
    shell: ShellId,
) -> Result<EdgeUseId> {
    let lone = model.shell(shell)?.vertexuse;
    let (mut v1, mut v2) = (v1, v2);
    if let Some(lone) = lone {
        let lone_v = model.vertexuse(lone)?.vertex;
        if v1.is_none() {
            v1 = Some(lone_v);
        } else if v2.is_none() {
            v2 = Some(lone_v);
        }
    }
    let v1 = match v1 {
        Some(v) => v,
        None => model.add_vertex(None),
    };
    let v2 = match v2 {
        Some(v) => v,
        None => model.add_vertex(None),
    };

    let parent = EdgeUseParent::Shell(shell);
    let (eu1, eu2) = new_edgeuse_pair(model, parent, v1, parent, v2)?;
    if let Some(lone) = lone {
        model.shell_mut(shell)?.vertexuse = None;
        model.free_vertexuse(lone)?;
    }
    model.shell_mut(shell)?.wire_edgeuses.extend([eu1, eu2]);
    debug!(?eu1, ?v1, ?v2, "made wire edge");
    Ok(eu1)
}

/// Turns the vertexuse of a self-loop into a zero-length edge on it.
///
/// Both the loopuse and its mate change from a single vertex to a one-edge
/// ring whose edge starts and ends at that vertex.
///
/// # Errors
///
/// Returns [`TopologyError::WrongParent`] if `vu` is not a self-loop's vertex.
#[instrument(skip(model))]
pub fn make_edge_on_vertexuse(model: &mut Model, vu: VertexUseId) -> Result<EdgeUseId> {
    let VertexUseParent::LoopUse(lu1) = model.vertexuse(vu)?.parent else {
        return Err(TopologyError::WrongParent("vertexuse is not a self-loop".into()).into());
    };
    let lu2 = model.loopuse(lu1)?.mate;
    let LoopContent::Vertex(vu2) = model.loopuse(lu2)?.content else {
        return Err(TopologyError::MateMismatch("loopuse mate is not a self-loop".into()).into());
    };

    let index = model.next_index();
    let edge = model.edges.insert(EdgeData {
        index,
        edgeuse: EdgeUseId::default(),
    });
    let eu1 = insert_edgeuse(model, EdgeUseParent::LoopUse(lu1), edge);
    let eu2 = insert_edgeuse(model, EdgeUseParent::LoopUse(lu2), edge);
    link_pair(model, edge, eu1, eu2)?;
    for (eu, v_use, lu) in [(eu1, vu, lu1), (eu2, vu2, lu2)] {
        model.edgeuse_mut(eu)?.vertexuse = v_use;
        model.vertexuse_mut(v_use)?.parent = VertexUseParent::EdgeUse(eu);
        model.loopuse_mut(lu)?.content = LoopContent::Edges(eu);
    }
    debug!(?eu1, "promoted vertexuse to edge");
    Ok(eu1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn region_starts_with_lone_vertex() {
        let mut model = Model::new();
        let (r, s) = make_region(&mut model).unwrap();
        assert_eq!(model.region(r).unwrap().shells, vec![s]);
        assert!(model.shell(s).unwrap().vertexuse.is_some());
        assert_eq!(model.vertex_count(), 1);
        model.verify().unwrap();
    }

    #[test]
    fn loop_absorbs_lone_vertex() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let lone = model.shell(s).unwrap().vertexuse.unwrap();
        let lone_v = model.vertexuse(lone).unwrap().vertex;

        let lu = make_loop(&mut model, LoopUseParent::Shell(s), None, Orientation::Same).unwrap();

        assert!(model.shell(s).unwrap().vertexuse.is_none());
        assert_eq!(model.loop_vertices(lu).unwrap(), vec![lone_v]);
        assert_eq!(model.vertex_count(), 1);
        model.verify().unwrap();
    }

    #[test]
    fn loop_on_other_vertex_discards_lone_vertex() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let v = model.add_vertex(None);
        make_loop(&mut model, LoopUseParent::Shell(s), Some(v), Orientation::Same).unwrap();
        assert_eq!(model.vertex_count(), 1);
        assert!(model.has_vertex(v));
        model.verify().unwrap();
    }

    #[test]
    fn face_wraps_wire_loop() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let lu = make_loop(&mut model, LoopUseParent::Shell(s), None, Orientation::Opposite).unwrap();
        let fu = make_face(&mut model, lu).unwrap();

        let data = model.faceuse(fu).unwrap();
        assert_eq!(data.orientation, Orientation::Same);
        assert_eq!(model.faceuse(data.mate).unwrap().orientation, Orientation::Opposite);
        assert_eq!(model.loopuse(lu).unwrap().orientation, Orientation::Same);
        assert!(model.shell(s).unwrap().wire_loopuses.is_empty());
        assert_eq!(model.shell(s).unwrap().faceuses.len(), 2);
        model.verify().unwrap();
    }

    #[test]
    fn face_rejects_loop_already_in_face() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let lu = make_loop(&mut model, LoopUseParent::Shell(s), None, Orientation::Same).unwrap();
        make_face(&mut model, lu).unwrap();
        assert!(make_face(&mut model, lu).is_err());
    }

    #[test]
    fn wire_edge_uses_lone_vertex() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let eu = make_edge(&mut model, None, None, s).unwrap();
        assert!(model.shell(s).unwrap().vertexuse.is_none());
        assert_eq!(model.shell(s).unwrap().wire_edgeuses.len(), 2);
        assert_eq!(model.vertex_count(), 2);
        assert_ne!(model.eu_start_vertex(eu).unwrap(), model.eu_end_vertex(eu).unwrap());
        model.verify().unwrap();
    }

    #[test]
    fn promoted_vertexuse_is_zero_length_edge() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let lu = make_loop(&mut model, LoopUseParent::Shell(s), None, Orientation::Same).unwrap();
        let LoopContent::Vertex(vu) = model.loopuse(lu).unwrap().content else {
            panic!("expected self-loop");
        };
        let eu = make_edge_on_vertexuse(&mut model, vu).unwrap();
        assert_eq!(model.loop_edge_count(lu).unwrap(), 1);
        assert_eq!(model.eu_start_vertex(eu).unwrap(), model.eu_end_vertex(eu).unwrap());
        model.verify().unwrap();
    }
}
