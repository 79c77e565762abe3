use crate::math::Aabb;

use super::edge::EdgeUseId;
use super::face::FaceUseId;
use super::loops::LoopUseId;
use super::region::RegionId;
use super::vertex::VertexUseId;

slotmap::new_key_type! {
    /// Unique identifier for a shell in the model.
    pub struct ShellId;
}

/// Data associated with a shell.
///
/// A shell owns faceuses, wire loopuses, wire edgeuses and at most one lone
/// vertexuse. A shell holding none of these is invalid and must be killed.
#[derive(Debug, Clone)]
pub struct ShellData {
    pub index: usize,
    /// The region that owns this shell.
    pub region: RegionId,
    /// Both uses of every face in the shell.
    pub faceuses: Vec<FaceUseId>,
    /// Loopuses not belonging to any face.
    pub wire_loopuses: Vec<LoopUseId>,
    /// Edgeuses not belonging to any loop.
    pub wire_edgeuses: Vec<EdgeUseId>,
    /// A single isolated point.
    pub vertexuse: Option<VertexUseId>,
    pub bbox: Option<Aabb>,
}

impl ShellData {
    /// Returns `true` if the shell holds nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faceuses.is_empty()
            && self.wire_loopuses.is_empty()
            && self.wire_edgeuses.is_empty()
            && self.vertexuse.is_none()
    }
}
