//! Fusing faces, shells and regions.

mod coplanar;
mod join;

pub use coplanar::CoplanarFaceMerge;
pub use join::{
    join_faces, join_shells, merge_regions, move_edgeuse_between_shells,
    move_faceuse_between_shells, move_loopuse_between_shells, move_vertexuse_between_shells,
};
