use crate::math::Aabb;

use super::shell::ShellId;

slotmap::new_key_type! {
    /// Unique identifier for a region in the model.
    pub struct RegionId;
}

/// One independently bounded solid component.
#[derive(Debug, Clone)]
pub struct RegionData {
    pub index: usize,
    /// Shells owned by this region.
    pub shells: Vec<ShellId>,
    pub bbox: Option<Aabb>,
}
