mod kill;
mod make;
mod ring;
mod split;

pub use kill::{
    kill_edgeuse, kill_faceuse, kill_loopuse, kill_region, kill_shell, kill_vertexuse,
    move_vertexuse,
};
pub use make::{make_edge, make_edge_on_vertexuse, make_face, make_loop, make_region, make_shell};
pub(crate) use make::{make_empty_loop, new_edgeuse_pair, new_loopuse_pair};
pub use split::{
    break_edge, break_edge_and_join, break_two_edges, insert_zero_length_edge, split_edge,
    split_edgeuse, unbreak_edge, unbreak_shell_edge_unsafe,
};
