//! Loop surgery: cutting, splitting, joining and simplifying loops.
//!
//! Splits leave both loops `Unspecified`; callers that work a whole face
//! reorient afterwards. Joins inside a face reorient on their own.

mod cut;
mod join;
mod simplify;
mod touching;

pub use cut::{cut_loop, split_loop_at_vertexuse, split_touching_loops};
pub use join::{
    join_singular_vertex_loop, join_touching_loops, join_two_loops, join_two_singular_vertex_loops,
};
pub use simplify::{join_loop, kill_snakes, simplify_face, simplify_loop, simplify_shell};
pub use touching::{kill_accordions, split_loop_at_touching_jaunt, touching_jaunts};
