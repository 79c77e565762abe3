use tracing::{debug, instrument, trace, warn};

use crate::error::{OperationError, Result, TopologyError, UnbreakError};
use crate::radial::{join_edgeuses, radial_join, unglue_edge};
use crate::topology::{
    EdgeUseId, EdgeUseParent, Model, Orientation, ShellId, VertexId, VertexUseParent,
};

use super::kill::{kill_edgeuse, move_vertexuse};
use super::make::new_edgeuse_pair;

/// Split the edge used by `eu` at a vertex, affecting only this use pair.
///
/// If the edge is shared, `eu` and its mate are first unglued onto a private
/// edge. Afterwards `eu` runs from its old start to `v` and the returned
/// edgeuse, placed right after it, runs from `v` to the old end. With
/// `share_geometry` both halves keep the edge's curve; otherwise only the
/// half that keeps the original edge does.
///
/// # Errors
///
/// Returns an error if `eu` or `v` does not exist.
#[instrument(skip(model))]
pub fn split_edgeuse(
    model: &mut Model,
    v: Option<VertexId>,
    eu: EdgeUseId,
    share_geometry: bool,
) -> Result<EdgeUseId> {
    let old_mate = model.edgeuse(eu)?.mate;
    if model.edgeuse(eu)?.radial != old_mate {
        unglue_edge(model, eu)?;
    }
    let v = match v {
        Some(v) => {
            model.vertex(v)?;
            v
        }
        None => model.add_vertex(None),
    };

    let parent = model.edgeuse(eu)?.parent;
    let mate_parent = model.edgeuse(old_mate)?.parent;
    let (eu1, eu2) = new_edgeuse_pair(model, parent, v, mate_parent, v)?;
    match parent {
        EdgeUseParent::LoopUse(_) => {
            model.ring_insert_after(eu, eu1)?;
            model.ring_insert_after(old_mate, eu2)?;
        }
        EdgeUseParent::Shell(s) => {
            model.shell_mut(s)?.wire_edgeuses.extend([eu1, eu2]);
        }
    }

    // `eu` keeps the old edge together with `eu2`; `eu1` takes `old_mate`
    // onto the new one.
    let old_edge = model.edgeuse(eu)?.edge;
    let new_edge = model.edgeuse(eu1)?.edge;
    for (a, b, edge) in [
        (eu, eu2, old_edge),
        (eu2, eu, old_edge),
        (eu1, old_mate, new_edge),
        (old_mate, eu1, new_edge),
    ] {
        let data = model.edgeuse_mut(a)?;
        data.mate = b;
        data.radial = b;
        data.edge = edge;
    }
    model.edge_mut(old_edge)?.edgeuse = eu;
    model.edge_mut(new_edge)?.edgeuse = eu1;

    if let Some(g) = model.edgeuse(eu)?.geom {
        if share_geometry {
            model.attach_edge_geom(eu1, g)?;
            model.attach_edge_geom(eu2, g)?;
        } else {
            model.attach_edge_geom(eu2, g)?;
            model.detach_edge_geom(old_mate)?;
        }
    }

    trace!(?eu, ?eu1, ?v, "split edgeuse");
    Ok(eu1)
}

/// Split every use of the edge of `eu` at one vertex.
///
/// The fan is rebuilt as two edges, before and after the vertex, with the
/// radial order of the uses unchanged. Returns the use in `eu`'s loop that
/// runs from the new vertex to `eu`'s old end.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] if `v` is already an end of the
/// edge.
#[instrument(skip(model))]
pub fn split_edge(
    model: &mut Model,
    v: Option<VertexId>,
    eu: EdgeUseId,
    share_geometry: bool,
) -> Result<EdgeUseId> {
    let va = model.eu_start_vertex(eu)?;
    let vb = model.eu_end_vertex(eu)?;
    if v == Some(va) || v == Some(vb) {
        return Err(OperationError::InvalidInput("split vertex is an end of the edge".into()).into());
    }
    let pairs = model.radial_pairs(eu)?;

    let mut v = v;
    let mut a_pieces = Vec::with_capacity(pairs.len());
    let mut b_pieces = Vec::with_capacity(pairs.len());
    let mut result = None;
    for x in pairs {
        let n = split_edgeuse(model, v, x, share_geometry)?;
        v = Some(model.eu_start_vertex(n)?);
        if model.eu_start_vertex(x)? == va {
            a_pieces.push(x);
            b_pieces.push(n);
            if x == eu {
                result = Some(n);
            }
        } else {
            a_pieces.push(n);
            b_pieces.push(x);
        }
    }

    // Rejoin in reverse so each piece is inserted ahead of its successor,
    // reproducing the original walk order.
    for pieces in [&a_pieces, &b_pieces] {
        for k in (0..pieces.len().saturating_sub(1)).rev() {
            let src = model.edgeuse(pieces[k])?.mate;
            join_edgeuses(model, pieces[k + 1], src)?;
        }
    }

    debug!(?eu, ?v, "split edge everywhere");
    result.ok_or_else(|| TopologyError::RadialBroken("split lost the starting use".into()).into())
}

/// [`split_edge`] with geometry shared by both halves.
///
/// # Errors
///
/// Returns an error if the split fails.
pub fn break_edge(model: &mut Model, v: Option<VertexId>, eu: EdgeUseId) -> Result<EdgeUseId> {
    split_edge(model, v, eu, true)
}

/// [`break_edge`], then fuse each half with any other edge in the model that
/// already runs between the same two vertices.
///
/// # Errors
///
/// Returns an error if the break or a join fails.
#[instrument(skip(model))]
pub fn break_edge_and_join(
    model: &mut Model,
    v: Option<VertexId>,
    eu: EdgeUseId,
) -> Result<EdgeUseId> {
    let new_eu = break_edge(model, v, eu)?;
    for piece in [eu, new_eu] {
        loop {
            let a = model.eu_start_vertex(piece)?;
            let b = model.eu_end_vertex(piece)?;
            let edge = model.edgeuse(piece)?.edge;
            let Some(other) = model.find_other_edge_between(a, b, edge)? else {
                break;
            };
            trace!(?piece, ?other, "fusing duplicate edge");
            radial_join(model, piece, other)?;
        }
    }
    Ok(new_eu)
}

/// Break two edges at one shared new vertex, returning that vertex.
///
/// # Errors
///
/// Returns an error if either break fails.
pub fn break_two_edges(model: &mut Model, eu1: EdgeUseId, eu2: EdgeUseId) -> Result<VertexId> {
    let n = break_edge(model, None, eu1)?;
    let v = model.eu_start_vertex(n)?;
    break_edge(model, Some(v), eu2)?;
    Ok(v)
}

/// Insert a zero-length edge right before `eu`, at `eu`'s start vertex.
///
/// # Errors
///
/// Returns [`TopologyError::WrongParent`] if `eu` is a wire edge.
#[instrument(skip(model))]
pub fn insert_zero_length_edge(model: &mut Model, eu: EdgeUseId) -> Result<EdgeUseId> {
    let data = model.edgeuse(eu)?;
    let (parent, mate) = (data.parent, data.mate);
    if !matches!(parent, EdgeUseParent::LoopUse(_)) {
        return Err(TopologyError::WrongParent("cannot insert into a wire edge".into()).into());
    }
    let mate_parent = model.edgeuse(mate)?.parent;
    let v = model.eu_start_vertex(eu)?;
    let (n1, n2) = new_edgeuse_pair(model, parent, v, mate_parent, v)?;
    model.ring_insert_before(eu, n1)?;
    model.ring_insert_after(mate, n2)?;
    trace!(?eu, ?n1, "inserted zero-length edge");
    Ok(n1)
}

/// The edgeuse that continues `x` through its end vertex.
fn successor_through(model: &Model, x: EdgeUseId) -> Result<Option<EdgeUseId>> {
    let data = model.edgeuse(x)?;
    match data.parent {
        EdgeUseParent::LoopUse(_) => Ok(Some(data.next)),
        EdgeUseParent::Shell(s) => {
            let mate = data.mate;
            let vb = model.eu_end_vertex(x)?;
            for &vu in &model.vertex(vb)?.uses {
                let VertexUseParent::EdgeUse(y) = model.vertexuse(vu)?.parent else {
                    continue;
                };
                if y != mate && model.edgeuse(y)?.parent == EdgeUseParent::Shell(s) {
                    return Ok(Some(y));
                }
            }
            Ok(None)
        }
    }
}

/// Checks the unbreak preconditions and lists `(first half, second half)`
/// per use pair. With `only_shell` set, uses outside that shell are ignored.
fn unbreak_plan(
    model: &Model,
    eu1: EdgeUseId,
    only_shell: Option<ShellId>,
) -> Result<(VertexId, Vec<(EdgeUseId, EdgeUseId)>)> {
    let data = model.edgeuse(eu1)?;
    let eg = data.geom.ok_or(OperationError::Unbreak(UnbreakError::NoGeometry))?;
    if only_shell.is_some() && model.edgeuse(data.mate)?.geom != Some(eg) {
        return Err(OperationError::Unbreak(UnbreakError::MateGeometryUnshared).into());
    }
    if model.edge_geom(eg)?.users.len() < 4 {
        return Err(OperationError::Unbreak(UnbreakError::TooFewGeometryUses).into());
    }
    let fail = |e: UnbreakError| Err(OperationError::Unbreak(e).into());

    let va = model.eu_start_vertex(eu1)?;
    let vb = model.eu_end_vertex(eu1)?;
    let Some(eu2) = successor_through(model, eu1)? else {
        return fail(UnbreakError::NotSuccessor);
    };
    if model.edgeuse(eu2)?.geom != Some(eg) {
        return fail(UnbreakError::GeometryMismatch);
    }
    let vc = model.eu_end_vertex(eu2)?;
    if va == vc {
        return fail(UnbreakError::ClosedLoop);
    }

    let mut edge_uses_at_vb = 0;
    for &vu in &model.vertex(vb)?.uses {
        if let Some(s) = only_shell {
            if model.shell_of_vertexuse(vu)? != s {
                continue;
            }
        }
        match model.vertexuse(vu)?.parent {
            VertexUseParent::EdgeUse(y) => {
                if model.edgeuse(y)?.geom != Some(eg) {
                    return fail(UnbreakError::VertexOnOtherGeometry);
                }
                edge_uses_at_vb += 1;
            }
            VertexUseParent::LoopUse(lu) => {
                if model.loopuse(lu)?.orientation != Orientation::BoolPlace {
                    return fail(UnbreakError::VertexUsedOffEdge);
                }
            }
            VertexUseParent::Shell(_) => return fail(UnbreakError::VertexUsedOffEdge),
        }
    }

    let fan1 = model.radial_pairs(eu1)?;
    if only_shell.is_none() && fan1.len() != model.radial_pairs(eu2)?.len() {
        return fail(UnbreakError::RadialCountMismatch);
    }
    let edge2 = model.edgeuse(eu2)?.edge;
    let mut plan = Vec::with_capacity(fan1.len());
    for p in fan1 {
        let x = if model.eu_end_vertex(p)? == vb {
            p
        } else {
            model.edgeuse(p)?.mate
        };
        if let Some(s) = only_shell {
            if model.shell_of_edgeuse(x)? != s {
                continue;
            }
        }
        let Some(y) = successor_through(model, x)? else {
            return fail(UnbreakError::NotSuccessor);
        };
        let y_data = model.edgeuse(y)?;
        if y_data.edge != edge2 {
            return fail(UnbreakError::NotSuccessor);
        }
        if y_data.geom != Some(eg) {
            return fail(UnbreakError::RadialGeometryMismatch);
        }
        plan.push((x, y));
    }
    if edge_uses_at_vb != 2 * plan.len() {
        return fail(UnbreakError::VertexUseCount);
    }
    Ok((vc, plan))
}

fn apply_unbreak(model: &mut Model, vc: VertexId, plan: &[(EdgeUseId, EdgeUseId)]) -> Result<()> {
    for &(x, y) in plan {
        let mate = model.edgeuse(x)?.mate;
        let vu = model.edgeuse(mate)?.vertexuse;
        move_vertexuse(model, vu, vc)?;
        kill_edgeuse(model, y)?;
    }
    Ok(())
}

/// Undo a break: merge `eu1` and the edge following it into one edge.
///
/// Both halves must lie on the same shared edge geometry, and the middle
/// vertex may only be used by those halves (and boolean marker loops). On
/// any failed precondition an [`UnbreakError`] is returned and nothing
/// changes. On success `eu1` runs from its start to the far end of the
/// second half.
///
/// # Errors
///
/// Returns [`OperationError::Unbreak`] when a precondition fails.
#[instrument(skip(model))]
pub fn unbreak_edge(model: &mut Model, eu1: EdgeUseId) -> Result<EdgeUseId> {
    let (vc, plan) = match unbreak_plan(model, eu1, None) {
        Ok(p) => p,
        Err(err) => {
            warn!(%err, "edge not unbroken");
            return Err(err);
        }
    };
    apply_unbreak(model, vc, &plan)?;
    debug!(?eu1, pairs = plan.len(), "unbroke edge");
    Ok(eu1)
}

/// Unbreak that only looks at uses inside `eu1`'s own shell.
///
/// This is an escape hatch for export-time simplification. Uses of the
/// middle vertex or of the edge in other shells are ignored, so the result
/// can be illegal topology: an edge whose uses disagree about their end
/// points, or a vertex still referenced from another shell. Run it only on
/// models that are about to be written out and discarded.
///
/// # Errors
///
/// Returns [`OperationError::Unbreak`] when a precondition fails.
#[instrument(skip(model))]
pub fn unbreak_shell_edge_unsafe(model: &mut Model, eu1: EdgeUseId) -> Result<EdgeUseId> {
    let shell = model.shell_of_edgeuse(eu1)?;
    let (vc, plan) = unbreak_plan(model, eu1, Some(shell))?;
    apply_unbreak(model, vc, &plan)?;
    debug!(?eu1, pairs = plan.len(), "unsafely unbroke shell edge");
    Ok(eu1)
}
