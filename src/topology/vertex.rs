use crate::math::Point3;

use super::edge::EdgeUseId;
use super::loops::LoopUseId;
use super::shell::ShellId;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the model.
    pub struct VertexId;
}

slotmap::new_key_type! {
    /// Unique identifier for one use of a vertex.
    pub struct VertexUseId;
}

/// Data associated with a vertex.
///
/// The vertex is the only element shared across contexts: every edgeuse,
/// self-loop or lone point touching it holds a vertexuse listed here.
#[derive(Debug, Clone)]
pub struct VertexData {
    pub index: usize,
    pub point: Option<Point3>,
    pub uses: Vec<VertexUseId>,
}

/// What owns a vertexuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexUseParent {
    /// A lone point.
    Shell(ShellId),
    /// A self-loop.
    LoopUse(LoopUseId),
    EdgeUse(EdgeUseId),
}

/// Binding of a vertex to one use context.
#[derive(Debug, Clone)]
pub struct VertexUseData {
    pub index: usize,
    pub vertex: VertexId,
    pub parent: VertexUseParent,
}
