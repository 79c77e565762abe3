pub mod edge;
pub mod face;
pub mod geom;
pub mod loops;
pub mod orientation;
pub mod query;
pub mod region;
pub mod shell;
pub mod verify;
pub mod vertex;
pub mod visit;

pub use edge::{
    EdgeCurve, EdgeData, EdgeGeomData, EdgeGeomId, EdgeId, EdgeUseData, EdgeUseId, EdgeUseParent,
    NurbCurve,
};
pub use face::{
    FaceData, FaceGeomData, FaceGeomId, FaceId, FaceSurface, FaceUseData, FaceUseId, NurbSurface,
};
pub use loops::{LoopContent, LoopData, LoopId, LoopUseData, LoopUseId, LoopUseParent};
pub use orientation::Orientation;
pub use region::{RegionData, RegionId};
pub use shell::{ShellData, ShellId};
pub use vertex::{VertexData, VertexId, VertexUseData, VertexUseId, VertexUseParent};
pub use visit::{TranslationTable, VisitedSet};

use crate::diag::DebugFlags;
use crate::error::TopologyError;
use crate::math::Point3;
use slotmap::SlotMap;

/// Central arena that owns every topology element of one model.
///
/// Elements reference each other through typed slotmap keys. Every element
/// also carries an `index` drawn from a model-wide counter; indices are
/// never reused, so [`VisitedSet`]s and [`TranslationTable`]s sized from
/// [`Model::max_index`] stay valid while the model grows.
#[derive(Debug, Default)]
pub struct Model {
    pub(crate) regions: SlotMap<RegionId, RegionData>,
    pub(crate) shells: SlotMap<ShellId, ShellData>,
    pub(crate) faces: SlotMap<FaceId, FaceData>,
    pub(crate) faceuses: SlotMap<FaceUseId, FaceUseData>,
    pub(crate) face_geoms: SlotMap<FaceGeomId, FaceGeomData>,
    pub(crate) loops: SlotMap<LoopId, LoopData>,
    pub(crate) loopuses: SlotMap<LoopUseId, LoopUseData>,
    pub(crate) edges: SlotMap<EdgeId, EdgeData>,
    pub(crate) edgeuses: SlotMap<EdgeUseId, EdgeUseData>,
    pub(crate) edge_geoms: SlotMap<EdgeGeomId, EdgeGeomData>,
    pub(crate) vertices: SlotMap<VertexId, VertexData>,
    pub(crate) vertexuses: SlotMap<VertexUseId, VertexUseData>,
    max_index: usize,
    debug: DebugFlags,
}

macro_rules! accessors {
    ($($field:ident, $get:ident, $get_mut:ident, $has:ident, $id:ty, $data:ty, $name:literal;)*) => {
        $(
            #[doc = concat!("Returns the ", $name, " data, or an error if not found.")]
            ///
            /// # Errors
            ///
            /// Returns an error if the entity is not found in the model.
            pub fn $get(&self, id: $id) -> Result<&$data, TopologyError> {
                self.$field
                    .get(id)
                    .ok_or_else(|| TopologyError::EntityNotFound($name.into()))
            }

            #[doc = concat!("Returns mutable ", $name, " data, or an error if not found.")]
            ///
            /// # Errors
            ///
            /// Returns an error if the entity is not found in the model.
            pub fn $get_mut(&mut self, id: $id) -> Result<&mut $data, TopologyError> {
                self.$field
                    .get_mut(id)
                    .ok_or_else(|| TopologyError::EntityNotFound($name.into()))
            }

            #[doc = concat!("Returns `true` if the ", $name, " is still alive.")]
            #[must_use]
            pub fn $has(&self, id: $id) -> bool {
                self.$field.contains_key(id)
            }
        )*
    };
}

impl Model {
    /// Creates a new, empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty model with diagnostics switched on.
    #[must_use]
    pub fn with_diagnostics(debug: DebugFlags) -> Self {
        Self {
            debug,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn debug_flags(&self) -> DebugFlags {
        self.debug
    }

    pub fn set_debug_flags(&mut self, debug: DebugFlags) {
        self.debug = debug;
    }

    /// One past the largest index issued so far.
    #[must_use]
    pub fn max_index(&self) -> usize {
        self.max_index
    }

    /// A visited-set sized for every element currently in the model.
    #[must_use]
    pub fn visited_set(&self) -> VisitedSet {
        VisitedSet::with_capacity(self.max_index)
    }

    pub(crate) fn next_index(&mut self) -> usize {
        let index = self.max_index;
        self.max_index += 1;
        index
    }

    accessors! {
        regions, region, region_mut, has_region, RegionId, RegionData, "region";
        shells, shell, shell_mut, has_shell, ShellId, ShellData, "shell";
        faces, face, face_mut, has_face, FaceId, FaceData, "face";
        faceuses, faceuse, faceuse_mut, has_faceuse, FaceUseId, FaceUseData, "faceuse";
        face_geoms, face_geom, face_geom_mut, has_face_geom, FaceGeomId, FaceGeomData, "face geometry";
        loops, loop_data, loop_data_mut, has_loop, LoopId, LoopData, "loop";
        loopuses, loopuse, loopuse_mut, has_loopuse, LoopUseId, LoopUseData, "loopuse";
        edges, edge, edge_mut, has_edge, EdgeId, EdgeData, "edge";
        edgeuses, edgeuse, edgeuse_mut, has_edgeuse, EdgeUseId, EdgeUseData, "edgeuse";
        edge_geoms, edge_geom, edge_geom_mut, has_edge_geom, EdgeGeomId, EdgeGeomData, "edge geometry";
        vertices, vertex, vertex_mut, has_vertex, VertexId, VertexData, "vertex";
        vertexuses, vertexuse, vertexuse_mut, has_vertexuse, VertexUseId, VertexUseData, "vertexuse";
    }

    // --- Iteration ---

    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.keys()
    }

    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.keys()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.keys()
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    // --- Vertex allocation ---

    /// Allocates a vertex with no uses.
    ///
    /// A vertex without uses is collected by the next kill that touches it,
    /// so callers attach it to a use straight away.
    pub fn add_vertex(&mut self, point: Option<Point3>) -> VertexId {
        let index = self.next_index();
        self.vertices.insert(VertexData {
            index,
            point,
            uses: Vec::new(),
        })
    }

    pub(crate) fn new_vertexuse(
        &mut self,
        vertex: VertexId,
        parent: VertexUseParent,
    ) -> Result<VertexUseId, TopologyError> {
        let index = self.next_index();
        let vu = self.vertexuses.insert(VertexUseData {
            index,
            vertex,
            parent,
        });
        self.vertex_mut(vertex)?.uses.push(vu);
        Ok(vu)
    }

    /// Removes a vertexuse, and its vertex once no uses remain.
    ///
    /// The parent is not touched; that is the caller's job.
    pub(crate) fn free_vertexuse(&mut self, vu: VertexUseId) -> Result<(), TopologyError> {
        let vertex = self.vertexuse(vu)?.vertex;
        self.vertexuses.remove(vu);
        let data = self.vertex_mut(vertex)?;
        data.uses.retain(|&u| u != vu);
        if data.uses.is_empty() {
            self.vertices.remove(vertex);
        }
        Ok(())
    }
}
