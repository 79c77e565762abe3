//! Whole-shell tidying passes run between boolean stages.

mod redundancy;
mod shell;

pub use redundancy::RemoveRedundancies;
pub use shell::{sanitize_loops, shell_join_touching_loops, shell_split_touching_loops};
