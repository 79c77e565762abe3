use tracing::{debug, instrument, trace};

use crate::error::{OperationError, Result};
use crate::euler::{make_edge_on_vertexuse, make_face, make_loop, split_edgeuse};
use crate::radial::{fix_radial_parity, join_edgeuses, radial_join};
use crate::topology::{
    EdgeId, EdgeUseId, FaceId, FaceUseId, LoopContent, LoopUseId, LoopUseParent, Model,
    Orientation, ShellId, VertexId, VertexUseParent,
};

/// Builds a face whose single loop visits `verts` in order.
///
/// Missing entries get fresh vertices, written back into `verts` so the
/// caller can reuse them for neighbouring faces. Every edge is new; see
/// [`make_face_from_vertices`] for a variant that shares existing edges.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] for an empty vertex list.
#[instrument(skip(model, verts), fields(n = verts.len()))]
pub fn make_face_with_vertices(
    model: &mut Model,
    shell: ShellId,
    verts: &mut [Option<VertexId>],
) -> Result<FaceUseId> {
    let lu = fill_loop(model, LoopUseParent::Shell(shell), verts, Orientation::Same)?;
    let fu = make_face(model, lu)?;
    debug!(?fu, edges = verts.len(), "made face from vertices");
    Ok(fu)
}

/// Like [`make_face_with_vertices`], but each side whose vertices are
/// already joined by a dangling edge in the shell takes up that edge.
/// Radial parity of the new face is fixed afterwards.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] for an empty vertex list.
#[instrument(skip(model, verts), fields(n = verts.len()))]
pub fn make_face_from_vertices(
    model: &mut Model,
    shell: ShellId,
    verts: &mut [Option<VertexId>],
) -> Result<FaceUseId> {
    let fu = make_face_with_vertices(model, shell, verts)?;
    let lu = model.faceuse(fu)?.loopuses[0];
    let eus = model.loop_edgeuses(lu)?;
    let mut own: Vec<EdgeId> = Vec::with_capacity(eus.len());
    for &eu in &eus {
        own.push(model.edgeuse(eu)?.edge);
    }

    let mut shared = 0;
    for eu in eus {
        let (a, b) = (model.eu_start_vertex(eu)?, model.eu_end_vertex(eu)?);
        if a == b {
            continue;
        }
        if let Some(found) = find_dangling_edge(model, shell, a, b, &own)? {
            join_edgeuses(model, found, eu)?;
            shared += 1;
        }
    }
    if shared > 0 {
        fix_radial_parity(model, fu)?;
        trace!(?fu, shared, "face took up existing edges");
    }
    Ok(fu)
}

/// An edgeuse in `shell` from `a` to `b` whose edge is used by exactly one
/// use pair and is not one of `skip`.
fn find_dangling_edge(
    model: &Model,
    shell: ShellId,
    a: VertexId,
    b: VertexId,
    skip: &[EdgeId],
) -> Result<Option<EdgeUseId>> {
    for &vu in &model.vertex(a)?.uses {
        let VertexUseParent::EdgeUse(eu) = model.vertexuse(vu)?.parent else {
            continue;
        };
        if skip.contains(&model.edgeuse(eu)?.edge)
            || model.eu_end_vertex(eu)? != b
            || model.shell_of_edgeuse(eu)? != shell
        {
            continue;
        }
        if model.radial_pairs(eu)?.len() == 1 {
            return Ok(Some(eu));
        }
    }
    Ok(None)
}

/// Adds a loop visiting `verts` to an existing face, tagged `orientation`.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] for an empty vertex list.
#[instrument(skip(model, verts), fields(n = verts.len()))]
pub fn add_loop_to_face(
    model: &mut Model,
    fu: FaceUseId,
    verts: &mut [Option<VertexId>],
    orientation: Orientation,
) -> Result<LoopUseId> {
    fill_loop(model, LoopUseParent::FaceUse(fu), verts, orientation)
}

/// Makes a loop under `parent` running through `verts`, first vertex first.
fn fill_loop(
    model: &mut Model,
    parent: LoopUseParent,
    verts: &mut [Option<VertexId>],
    orientation: Orientation,
) -> Result<LoopUseId> {
    let Some(&first_v) = verts.first() else {
        return Err(OperationError::InvalidInput("no vertices given for loop".into()).into());
    };
    let lu = make_loop(model, parent, first_v, orientation)?;
    let LoopContent::Vertex(vu) = model.loopuse(lu)?.content else {
        return Err(OperationError::Failed("new loop is not a self-loop".into()).into());
    };
    verts[0] = Some(model.vertexuse(vu)?.vertex);
    if verts.len() == 1 {
        return Ok(lu);
    }

    let first = make_edge_on_vertexuse(model, vu)?;
    // Split the closing edge from the back, so each new edge lands right
    // after the first one.
    for i in (1..verts.len()).rev() {
        let eu = split_edgeuse(model, verts[i], first, false)?;
        verts[i] = Some(model.eu_start_vertex(eu)?);
    }
    Ok(lu)
}

/// Shares edges between the listed faces wherever two of them run between
/// the same pair of vertices. Returns the number of edges joined.
///
/// # Errors
///
/// Returns an error if a faceuse does not exist or a fan is broken.
#[instrument(skip(model, faceuses), fields(n = faceuses.len()))]
pub fn glue_faces(model: &mut Model, faceuses: &[FaceUseId]) -> Result<usize> {
    let mut faces: Vec<FaceId> = Vec::with_capacity(faceuses.len());
    for &fu in faceuses {
        faces.push(model.faceuse(fu)?.face);
    }

    let mut joined = 0;
    for &fu in faceuses {
        for lu in model.faceuse(fu)?.loopuses.clone() {
            for eu in model.loop_edgeuses(lu)? {
                let (a, b) = (model.eu_start_vertex(eu)?, model.eu_end_vertex(eu)?);
                if a == b {
                    continue;
                }
                let edge = model.edgeuse(eu)?.edge;
                if let Some(other) = find_edge_in_faces(model, a, b, edge, &faces)? {
                    radial_join(model, eu, other)?;
                    joined += 1;
                }
            }
        }
    }
    debug!(joined, "glued faces");
    Ok(joined)
}

fn find_edge_in_faces(
    model: &Model,
    a: VertexId,
    b: VertexId,
    exclude: EdgeId,
    faces: &[FaceId],
) -> Result<Option<EdgeUseId>> {
    for &vu in &model.vertex(a)?.uses {
        let VertexUseParent::EdgeUse(eu) = model.vertexuse(vu)?.parent else {
            continue;
        };
        if model.edgeuse(eu)?.edge == exclude || model.eu_end_vertex(eu)? != b {
            continue;
        }
        if let Some(fu) = model.faceuse_of_edgeuse(eu)? {
            if faces.contains(&model.faceuse(fu)?.face) {
                return Ok(Some(eu));
            }
        }
    }
    Ok(None)
}
