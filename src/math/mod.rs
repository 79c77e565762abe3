pub mod bbox;
pub mod plane;
pub mod polygon;
pub mod tolerance;

pub use bbox::Aabb;
pub use plane::{newell_normal, PlaneEquation};
pub use polygon::{point_in_polygon, point_on_boundary, PointClass};
pub use tolerance::Tolerance;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Homogeneous 4-vector, used for rational control points.
pub type Vector4 = nalgebra::Vector4<f64>;

/// Threshold below which a floating-point quantity counts as zero
/// independent of any caller tolerance.
pub const SMALL_FASTF: f64 = 1.0e-77;
