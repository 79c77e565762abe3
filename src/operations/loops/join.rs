use tracing::{debug, instrument, trace};

use crate::classify::reorient_loop;
use crate::error::{OperationError, Result, TopologyError};
use crate::euler::{insert_zero_length_edge, kill_loopuse, make_edge_on_vertexuse, split_edgeuse};
use crate::radial::join_edgeuses;
use crate::topology::{
    EdgeUseId, LoopContent, LoopUseId, LoopUseParent, Model, VertexId, VertexUseId,
    VertexUseParent,
};

fn edge_position(model: &Model, vu: VertexUseId) -> Result<(EdgeUseId, LoopUseId)> {
    let VertexUseParent::EdgeUse(eu) = model.vertexuse(vu)?.parent else {
        return Err(OperationError::InvalidInput("vertexuse is not on an edge".into()).into());
    };
    let Some(lu) = model.loopuse_of_edgeuse(eu)? else {
        return Err(OperationError::InvalidInput("vertexuse is on a wire edge".into()).into());
    };
    Ok((eu, lu))
}

fn self_loop_of(model: &Model, vu: VertexUseId) -> Result<LoopUseId> {
    match model.vertexuse(vu)?.parent {
        VertexUseParent::LoopUse(lu) => Ok(lu),
        _ => Err(OperationError::InvalidInput("vertexuse is not a self-loop".into()).into()),
    }
}

/// Runs an out-and-back edge from the start of `eu` to `v` just before
/// `eu`, both halves on one edge. Returns the half coming back from `v`.
fn jaunt_to(model: &mut Model, eu: EdgeUseId, v: VertexId) -> Result<EdgeUseId> {
    let first = insert_zero_length_edge(model, eu)?;
    jaunt_from(model, first, v)
}

/// Splits the zero-length edgeuse `first` at `v` and shares one edge
/// between the two halves.
fn jaunt_from(model: &mut Model, first: EdgeUseId, v: VertexId) -> Result<EdgeUseId> {
    let second = split_edgeuse(model, Some(v), first, false)?;
    let first = model.edgeuse(second)?.prev;
    join_edgeuses(model, second, first)?;
    Ok(second)
}

/// Checks that `lu`'s ring and its mate's ring close with matching
/// back links and that `eu` is on the ring.
fn check_closed_ring(model: &Model, lu: LoopUseId, eu: EdgeUseId) -> Result<()> {
    let ring = model.loop_edgeuses(lu)?;
    let mate_ring = model.loop_edgeuses(model.loopuse(lu)?.mate)?;
    if ring.len() != mate_ring.len() || !ring.contains(&eu) {
        return Err(TopologyError::LoopNotClosed("loop and mate rings disagree".into()).into());
    }
    for r in [&ring, &mate_ring] {
        for (i, &e) in r.iter().enumerate() {
            if model.edgeuse(r[(i + 1) % r.len()])?.prev != e {
                return Err(TopologyError::LoopNotClosed("ring back link is broken".into()).into());
            }
        }
    }
    Ok(())
}

fn reorient_if_in_face(model: &mut Model, lu: LoopUseId) -> Result<()> {
    if model.has_loopuse(lu) && matches!(model.loopuse(lu)?.parent, LoopUseParent::FaceUse(_)) {
        reorient_loop(model, lu)?;
    }
    Ok(())
}

/// Joins the loops of `vu1` and `vu2` into one at those vertexuses.
///
/// If the two sit on different vertices an out-and-back edge between them
/// is run first. The whole of `vu2`'s loop is then spliced into `vu1`'s
/// loop at the shared vertex and the emptied loop is killed. Returns the
/// vertexuse where the second loop now begins.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] if either vertexuse is not on
/// a loop edge, both are in the same loop, or the loops have different
/// parents. Returns [`TopologyError::LoopNotClosed`] if the second loop's
/// ring is broken. The model is unchanged on every error.
#[instrument(skip(model))]
pub fn join_two_loops(model: &mut Model, vu1: VertexUseId, vu2: VertexUseId) -> Result<VertexUseId> {
    let (eu1, lu1) = edge_position(model, vu1)?;
    let (eu2, lu2) = edge_position(model, vu2)?;
    let (l1, l2) = (model.loopuse(lu1)?, model.loopuse(lu2)?);
    if lu1 == lu2 || l1.lp == l2.lp {
        return Err(OperationError::InvalidInput("cannot join a loop to itself".into()).into());
    }
    if l1.parent != l2.parent {
        return Err(OperationError::InvalidInput("loops have different parents".into()).into());
    }
    check_closed_ring(model, lu2, eu2)?;

    let v1 = model.vertexuse(vu1)?.vertex;
    let v2 = model.vertexuse(vu2)?.vertex;
    let second = if v1 == v2 { eu1 } else { jaunt_to(model, eu1, v2)? };
    let second_mate = model.edgeuse(second)?.mate;

    let last = model.edgeuse(eu2)?.prev;
    loop {
        let e = model.edgeuse(last)?.next;
        let e_mate = model.edgeuse(e)?.mate;
        model.ring_unlink(e)?;
        model.ring_unlink(e_mate)?;
        model.ring_insert_before(second, e)?;
        model.ring_insert_after(second_mate, e_mate)?;
        if e == last {
            break;
        }
    }
    debug_assert!(model.loopuse(lu2).is_ok_and(|l| l.content == LoopContent::Empty));
    kill_loopuse(model, lu2)?;
    reorient_if_in_face(model, lu1)?;
    debug!(?lu1, ?lu2, "joined two loops");
    Ok(model.edgeuse(second)?.vertexuse)
}

/// Joins a self-loop into an edge loop with an out-and-back edge from
/// `vu1` (on an edge) to `vu2` (the self-loop's vertexuse). The self-loop
/// is killed. Returns the vertexuse at the far end of the new edge.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] if the vertexuses are of the
/// wrong kind or share a vertex.
#[instrument(skip(model))]
pub fn join_singular_vertex_loop(
    model: &mut Model,
    vu1: VertexUseId,
    vu2: VertexUseId,
) -> Result<VertexUseId> {
    let (eu1, lu1) = edge_position(model, vu1)?;
    let lu2 = self_loop_of(model, vu2)?;
    let v2 = model.vertexuse(vu2)?.vertex;
    if model.vertexuse(vu1)?.vertex == v2 {
        return Err(OperationError::InvalidInput("both vertexuses are on one vertex".into()).into());
    }

    let second = jaunt_to(model, eu1, v2)?;
    kill_loopuse(model, lu2)?;
    trace!(?lu1, ?lu2, "joined self-loop into loop");
    Ok(model.edgeuse(second)?.vertexuse)
}

/// Joins two self-loops into one two-edge loop running from `vu1`'s
/// vertex to `vu2`'s and back. `vu2`'s loop is killed. Returns the
/// vertexuse at `vu2`'s vertex.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] if either vertexuse is not a
/// self-loop or they share a vertex.
#[instrument(skip(model))]
pub fn join_two_singular_vertex_loops(
    model: &mut Model,
    vu1: VertexUseId,
    vu2: VertexUseId,
) -> Result<VertexUseId> {
    self_loop_of(model, vu1)?;
    let lu2 = self_loop_of(model, vu2)?;
    let v2 = model.vertexuse(vu2)?.vertex;
    if model.vertexuse(vu1)?.vertex == v2 {
        return Err(OperationError::InvalidInput("both vertexuses are on one vertex".into()).into());
    }

    let first = make_edge_on_vertexuse(model, vu1)?;
    let second = jaunt_from(model, first, v2)?;
    kill_loopuse(model, lu2)?;
    Ok(model.edgeuse(second)?.vertexuse)
}

/// Joins `lu` with every other loop of its face that touches it at a
/// vertex. Returns the number of loops absorbed; a wire loop is left
/// alone.
///
/// # Errors
///
/// Returns an error if a join breaks a structural rule.
#[instrument(skip(model))]
pub fn join_touching_loops(model: &mut Model, lu: LoopUseId) -> Result<usize> {
    let LoopUseParent::FaceUse(fu) = model.loopuse(lu)?.parent else {
        return Ok(0);
    };

    let mut count = 0;
    'top: loop {
        if !matches!(model.loopuse(lu)?.content, LoopContent::Edges(_)) {
            break;
        }
        for eu in model.loop_edgeuses(lu)? {
            let vu = model.edgeuse(eu)?.vertexuse;
            let v = model.vertexuse(vu)?.vertex;
            let mut touching = None;
            for &tvu in &model.vertex(v)?.uses {
                if tvu == vu {
                    continue;
                }
                let VertexUseParent::EdgeUse(teu) = model.vertexuse(tvu)?.parent else {
                    continue;
                };
                let Some(tlu) = model.loopuse_of_edgeuse(teu)? else {
                    continue;
                };
                if tlu != lu && model.loopuse(tlu)?.parent == LoopUseParent::FaceUse(fu) {
                    touching = Some(tvu);
                    break;
                }
            }
            if let Some(tvu) = touching {
                join_two_loops(model, vu, tvu)?;
                count += 1;
                continue 'top;
            }
        }
        break;
    }
    Ok(count)
}
