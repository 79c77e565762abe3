//! Geometry attachment and bounding boxes.

use crate::error::{Result, TopologyError};
use crate::math::{Aabb, PlaneEquation, Point3};

use super::{
    EdgeCurve, EdgeGeomData, EdgeGeomId, EdgeUseId, FaceGeomData, FaceGeomId, FaceId,
    FaceSurface, FaceUseId, LoopUseId, Model, NurbSurface, Orientation,
    RegionId, ShellId, VertexId,
};

impl Model {
    /// Sets or replaces the point of a vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex does not exist.
    pub fn set_vertex_point(&mut self, v: VertexId, point: Point3) -> Result<()> {
        self.vertex_mut(v)?.point = Some(point);
        Ok(())
    }

    /// Gives the face of `fu` a plane, expressed as seen from `fu`.
    ///
    /// The plane is stored relative to the `Same` use with `flip` cleared.
    /// A face that shares its geometry with other faces is detached onto a
    /// private copy first.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::OrientationClash`] if `fu` is neither `Same`
    /// nor `Opposite`.
    pub fn set_face_plane(&mut self, fu: FaceUseId, plane: PlaneEquation) -> Result<()> {
        let data = self.faceuse(fu)?;
        let stored = match data.orientation {
            Orientation::Same => plane,
            Orientation::Opposite => plane.reversed(),
            other => {
                return Err(TopologyError::OrientationClash(format!(
                    "cannot place a plane on a {other:?} faceuse"
                ))
                .into())
            }
        };
        let face = data.face;
        self.set_face_surface_raw(face, FaceSurface::Plane(stored))?;
        self.rebound_face(face)?;
        Ok(())
    }

    /// Gives the face of `fu` a NURBS surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the faceuse does not exist.
    pub fn set_face_surface(&mut self, fu: FaceUseId, surface: NurbSurface) -> Result<()> {
        let face = self.faceuse(fu)?.face;
        self.set_face_surface_raw(face, FaceSurface::Snurb(surface))?;
        self.rebound_face(face)?;
        Ok(())
    }

    fn set_face_surface_raw(&mut self, face: FaceId, surface: FaceSurface) -> Result<()> {
        if let Some(g) = self.face(face)?.geom {
            if self.face_geom(g)?.faces == [face] {
                self.face_geom_mut(g)?.surface = surface;
                self.face_mut(face)?.flip = false;
                return Ok(());
            }
            self.release_face_geometry(face)?;
        }
        let g = self.face_geoms.insert(FaceGeomData {
            surface,
            faces: vec![face],
        });
        let data = self.face_mut(face)?;
        data.geom = Some(g);
        data.flip = false;
        Ok(())
    }

    /// Makes `face` share `geom`, keeping the sense the geometry already has.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or geometry does not exist.
    pub fn use_face_geometry(&mut self, face: FaceId, geom: FaceGeomId) -> Result<()> {
        if self.face(face)?.geom == Some(geom) {
            return Ok(());
        }
        self.release_face_geometry(face)?;
        self.face_geom_mut(geom)?.faces.push(face);
        let data = self.face_mut(face)?;
        data.geom = Some(geom);
        data.flip = false;
        Ok(())
    }

    /// Drops the face's reference to its geometry, freeing it when unused.
    pub(crate) fn release_face_geometry(&mut self, face: FaceId) -> Result<()> {
        let Some(g) = self.face_mut(face)?.geom.take() else {
            return Ok(());
        };
        let geom = self.face_geom_mut(g)?;
        geom.faces.retain(|&f| f != face);
        if geom.faces.is_empty() {
            self.face_geoms.remove(g);
        }
        Ok(())
    }

    /// The plane of the face as seen from `fu`, if the face is planar.
    ///
    /// # Errors
    ///
    /// Returns an error if the faceuse or its face does not exist.
    pub fn faceuse_plane(&self, fu: FaceUseId) -> Result<Option<PlaneEquation>> {
        let data = self.faceuse(fu)?;
        let face = self.face(data.face)?;
        let Some(g) = face.geom else {
            return Ok(None);
        };
        let FaceSurface::Plane(plane) = self.face_geom(g)?.surface else {
            return Ok(None);
        };
        let reverse = (data.orientation != Orientation::Same) ^ face.flip;
        Ok(Some(if reverse { plane.reversed() } else { plane }))
    }

    /// Builds line geometry for the edge of `eu` from its end points.
    ///
    /// # Errors
    ///
    /// Returns an error if an end point is missing or the two coincide.
    pub fn make_edge_geometry(&mut self, eu: EdgeUseId) -> Result<EdgeGeomId> {
        let a = self.vertex_point(self.eu_start_vertex(eu)?)?;
        let b = self.vertex_point(self.eu_end_vertex(eu)?)?;
        let direction = b - a;
        if direction.norm_squared() == 0.0 {
            return Err(crate::error::GeometryError::Degenerate(
                "zero-length edge has no line".into(),
            )
            .into());
        }
        let g = self.edge_geoms.insert(EdgeGeomData {
            curve: EdgeCurve::LineSegment { point: a, direction },
            users: Vec::new(),
        });
        self.use_edge_geometry(eu, g)?;
        Ok(g)
    }

    /// Binds `eu` and its mate to `geom`, releasing what they held before.
    ///
    /// # Errors
    ///
    /// Returns an error if an element does not exist.
    pub fn use_edge_geometry(&mut self, eu: EdgeUseId, geom: EdgeGeomId) -> Result<()> {
        let mate = self.edgeuse(eu)?.mate;
        self.attach_edge_geom(eu, geom)?;
        self.attach_edge_geom(mate, geom)
    }

    pub(crate) fn attach_edge_geom(&mut self, eu: EdgeUseId, geom: EdgeGeomId) -> Result<()> {
        if self.edgeuse(eu)?.geom == Some(geom) {
            return Ok(());
        }
        self.detach_edge_geom(eu)?;
        self.edge_geom_mut(geom)?.users.push(eu);
        self.edgeuse_mut(eu)?.geom = Some(geom);
        Ok(())
    }

    pub(crate) fn detach_edge_geom(&mut self, eu: EdgeUseId) -> Result<()> {
        let Some(g) = self.edgeuse_mut(eu)?.geom.take() else {
            return Ok(());
        };
        let geom = self.edge_geom_mut(g)?;
        geom.users.retain(|&u| u != eu);
        if geom.users.is_empty() {
            self.edge_geoms.remove(g);
        }
        Ok(())
    }

    // --- Bounding boxes ---

    /// Recomputes the bounding box of the loop of `lu`.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop's ring is broken.
    pub fn rebound_loop(&mut self, lu: LoopUseId) -> Result<Option<Aabb>> {
        let points: Vec<Point3> = self
            .loop_vertices(lu)?
            .into_iter()
            .filter_map(|v| self.vertices.get(v).and_then(|d| d.point))
            .collect();
        let bbox = Aabb::from_points(&points);
        let lp = self.loopuse(lu)?.lp;
        self.loop_data_mut(lp)?.bbox = bbox;
        Ok(bbox)
    }

    /// Recomputes the bounding box of a face from its loops.
    ///
    /// # Errors
    ///
    /// Returns an error if an element does not exist.
    pub fn rebound_face(&mut self, face: FaceId) -> Result<Option<Aabb>> {
        let fu = self.face(face)?.faceuse;
        let loops = self.faceuse(fu)?.loopuses.clone();
        let mut bbox: Option<Aabb> = None;
        for lu in loops {
            bbox = union(bbox, self.rebound_loop(lu)?);
        }
        self.face_mut(face)?.bbox = bbox;
        Ok(bbox)
    }

    /// Recomputes the bounding box of a shell from everything it holds.
    ///
    /// # Errors
    ///
    /// Returns an error if an element does not exist.
    pub fn rebound_shell(&mut self, shell: ShellId) -> Result<Option<Aabb>> {
        let data = self.shell(shell)?.clone();
        let mut bbox: Option<Aabb> = None;
        let mut seen = self.visited_set();
        for fu in data.faceuses {
            let face = self.faceuse(fu)?.face;
            if seen.test_and_set(self.face(face)?.index) {
                continue;
            }
            bbox = union(bbox, self.rebound_face(face)?);
        }
        for lu in data.wire_loopuses {
            bbox = union(bbox, self.rebound_loop(lu)?);
        }
        for eu in data.wire_edgeuses {
            for v in [self.eu_start_vertex(eu)?, self.eu_end_vertex(eu)?] {
                if let Some(p) = self.vertex(v)?.point {
                    bbox = union(bbox, Some(Aabb::from_point(&p)));
                }
            }
        }
        if let Some(vu) = data.vertexuse {
            if let Some(p) = self.vertex(self.vertexuse(vu)?.vertex)?.point {
                bbox = union(bbox, Some(Aabb::from_point(&p)));
            }
        }
        self.shell_mut(shell)?.bbox = bbox;
        Ok(bbox)
    }

    /// Recomputes the bounding box of a region from its shells.
    ///
    /// # Errors
    ///
    /// Returns an error if an element does not exist.
    pub fn rebound_region(&mut self, region: RegionId) -> Result<Option<Aabb>> {
        let shells = self.region(region)?.shells.clone();
        let mut bbox: Option<Aabb> = None;
        for s in shells {
            bbox = union(bbox, self.rebound_shell(s)?);
        }
        self.region_mut(region)?.bbox = bbox;
        Ok(bbox)
    }
}

fn union(a: Option<Aabb>, b: Option<Aabb>) -> Option<Aabb> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(&b)),
        (a, None) => a,
        (None, b) => b,
    }
}
