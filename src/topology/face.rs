use crate::math::{Aabb, PlaneEquation, Vector4};

use super::loops::LoopUseId;
use super::orientation::Orientation;
use super::shell::ShellId;

slotmap::new_key_type! {
    /// Unique identifier for a face in the model.
    pub struct FaceId;
}

slotmap::new_key_type! {
    /// Unique identifier for one use of a face inside a shell.
    pub struct FaceUseId;
}

slotmap::new_key_type! {
    /// Unique identifier for face geometry, which several faces may share.
    pub struct FaceGeomId;
}

/// A non-uniform rational B-spline surface, carried opaquely.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbSurface {
    /// Order in u and v.
    pub order: [usize; 2],
    pub u_knots: Vec<f64>,
    pub v_knots: Vec<f64>,
    /// Control mesh size, rows by columns.
    pub mesh_size: [usize; 2],
    /// Homogeneous control points, row-major.
    pub ctl_points: Vec<Vector4>,
}

/// The geometric surface carried by a face.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceSurface {
    Plane(PlaneEquation),
    Snurb(NurbSurface),
}

/// Shared face geometry with the list of faces that reference it.
#[derive(Debug, Clone)]
pub struct FaceGeomData {
    pub surface: FaceSurface,
    pub faces: Vec<FaceId>,
}

/// Data associated with a face.
#[derive(Debug, Clone)]
pub struct FaceData {
    pub index: usize,
    /// One of the two uses; the other is its mate.
    pub faceuse: FaceUseId,
    pub geom: Option<FaceGeomId>,
    /// If `true`, the stored surface's sense is reversed relative to the
    /// `Same` faceuse.
    pub flip: bool,
    pub bbox: Option<Aabb>,
}

/// One use of a face inside a shell.
#[derive(Debug, Clone)]
pub struct FaceUseData {
    pub index: usize,
    pub shell: ShellId,
    pub face: FaceId,
    pub mate: FaceUseId,
    pub orientation: Orientation,
    pub loopuses: Vec<LoopUseId>,
}
