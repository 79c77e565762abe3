use crate::math::{Point3, Vector3, Vector4};

use super::loops::LoopUseId;
use super::shell::ShellId;
use super::vertex::VertexUseId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the model.
    pub struct EdgeId;
}

slotmap::new_key_type! {
    /// Unique identifier for one directed use of an edge.
    pub struct EdgeUseId;
}

slotmap::new_key_type! {
    /// Unique identifier for edge geometry shared by several edgeuses.
    pub struct EdgeGeomId;
}

/// A non-uniform rational B-spline curve, carried opaquely.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbCurve {
    pub order: usize,
    pub knots: Vec<f64>,
    pub ctl_points: Vec<Vector4>,
}

/// The geometric curve carried by an edge.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeCurve {
    /// Infinite line through `point` along `direction`.
    LineSegment { point: Point3, direction: Vector3 },
    Curve(NurbCurve),
}

/// Edge geometry with the edgeuses bound to it.
#[derive(Debug, Clone)]
pub struct EdgeGeomData {
    pub curve: EdgeCurve,
    pub users: Vec<EdgeUseId>,
}

/// Data associated with an edge. Direction lives on the uses.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub index: usize,
    /// Any one use of the edge.
    pub edgeuse: EdgeUseId,
}

/// What owns an edgeuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeUseParent {
    /// A wire edge.
    Shell(ShellId),
    LoopUse(LoopUseId),
}

/// A directed traversal of an edge.
///
/// `next`/`prev` link the edgeuses of one loopuse into a ring; a wire
/// edgeuse links to itself.
#[derive(Debug, Clone)]
pub struct EdgeUseData {
    pub index: usize,
    pub parent: EdgeUseParent,
    pub edge: EdgeId,
    /// The antiparallel use in the mate context.
    pub mate: EdgeUseId,
    /// The next use around the edge in a different context.
    pub radial: EdgeUseId,
    pub next: EdgeUseId,
    pub prev: EdgeUseId,
    /// Start vertex of this traversal.
    pub vertexuse: VertexUseId,
    pub geom: Option<EdgeGeomId>,
}
