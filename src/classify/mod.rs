//! Geometric decisions made on behalf of the topology operators.

mod orient;
mod planar;
mod plane;

pub use orient::{reorient_loop, set_loop_orientation};
pub use planar::PlanarLoopClassifier;
pub use plane::{compute_face_plane, count_vertices_off_plane};

use crate::error::Result;
use crate::math::Tolerance;
use crate::topology::{LoopUseId, Model};

/// Where loop `a` lies relative to loop `b` of the same face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopClass {
    Outside,
    Inside,
    /// Same boundary, running the same way.
    OnShared,
    /// Same boundary, running the other way.
    OnAnti,
}

impl LoopClass {
    /// Returns `true` for either of the coincident classes.
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::OnShared | Self::OnAnti)
    }
}

/// Classifies one loop against another.
///
/// The redundancy pass only needs this one question answered, so curved
/// faces can plug in their own implementation.
pub trait LoopClassifier {
    /// # Errors
    ///
    /// Returns an error if either loop lacks the geometry needed to decide.
    fn classify(&self, model: &Model, a: LoopUseId, b: LoopUseId, tol: &Tolerance)
        -> Result<LoopClass>;
}
