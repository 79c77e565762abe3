pub mod classify;
pub mod diag;
pub mod error;
pub mod euler;
pub mod math;
pub mod operations;
pub mod radial;
pub mod topology;

pub use diag::DebugFlags;
pub use error::{OrAbort, Result, TopolisError};
pub use math::Tolerance;
pub use topology::Model;
