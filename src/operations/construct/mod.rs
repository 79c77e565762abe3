//! Building faces and loops from vertex lists, and copying them.

mod duplicate;
mod make_face;

pub use duplicate::{duplicate_face, duplicate_loop};
pub use make_face::{add_loop_to_face, glue_faces, make_face_from_vertices, make_face_with_vertices};
