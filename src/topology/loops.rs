use crate::math::Aabb;

use super::edge::EdgeUseId;
use super::face::FaceUseId;
use super::orientation::Orientation;
use super::shell::ShellId;
use super::vertex::VertexUseId;

slotmap::new_key_type! {
    /// Unique identifier for a loop in the model.
    pub struct LoopId;
}

slotmap::new_key_type! {
    /// Unique identifier for one use of a loop.
    pub struct LoopUseId;
}

/// Data associated with a loop. The loop itself only records its bounds;
/// all structure lives on its two uses.
#[derive(Debug, Clone)]
pub struct LoopData {
    pub index: usize,
    pub loopuse: LoopUseId,
    pub bbox: Option<Aabb>,
}

/// What owns a loopuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopUseParent {
    Shell(ShellId),
    FaceUse(FaceUseId),
}

/// What a loopuse holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopContent {
    /// Transient state while a loop is being filled or drained.
    Empty,
    /// A self-loop on a single vertex.
    Vertex(VertexUseId),
    /// A ring of edgeuses; the handle is the first one.
    Edges(EdgeUseId),
}

/// One use of a loop, inside a faceuse or directly in a shell.
#[derive(Debug, Clone)]
pub struct LoopUseData {
    pub index: usize,
    pub parent: LoopUseParent,
    pub lp: LoopId,
    pub mate: LoopUseId,
    pub orientation: Orientation,
    pub content: LoopContent,
}
