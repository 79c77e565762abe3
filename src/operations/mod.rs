//! Composite edits built from the Euler operators and the classifier.

pub mod cleanup;
pub mod construct;
pub mod loops;
pub mod merge;

pub use cleanup::{
    sanitize_loops, shell_join_touching_loops, shell_split_touching_loops, RemoveRedundancies,
};
pub use construct::{
    add_loop_to_face, duplicate_face, duplicate_loop, glue_faces, make_face_from_vertices,
    make_face_with_vertices,
};
pub use loops::{
    cut_loop, join_loop, join_singular_vertex_loop, join_touching_loops, join_two_loops,
    join_two_singular_vertex_loops, kill_accordions, kill_snakes, simplify_face, simplify_loop,
    simplify_shell, split_loop_at_touching_jaunt, split_loop_at_vertexuse, split_touching_loops,
    touching_jaunts,
};
pub use merge::{
    join_faces, join_shells, merge_regions, move_edgeuse_between_shells,
    move_faceuse_between_shells, move_loopuse_between_shells, move_vertexuse_between_shells,
    CoplanarFaceMerge,
};
