use tracing::{debug, instrument, trace};

use crate::error::Result;
use crate::math::{PlaneEquation, Tolerance, SMALL_FASTF};
use crate::operations::loops::simplify_loop;
use crate::topology::{FaceUseId, Model, Orientation, ShellId};

use super::join::join_faces;

/// Merges faces of a shell that lie in the same plane and face the same
/// way.
///
/// Faces sharing one plane record with the same flip always merge. Others
/// merge when their boxes touch, their planes agree within tolerance, and
/// each face's vertices lie on the other's plane. With simplification on,
/// edges left running between two loops of the merged face are removed.
#[derive(Debug, Clone, Copy)]
pub struct CoplanarFaceMerge {
    shell: ShellId,
    tol: Tolerance,
    simplify: bool,
}

impl CoplanarFaceMerge {
    /// Creates a merge pass over `shell`, without simplification.
    #[must_use]
    pub fn new(shell: ShellId, tol: Tolerance) -> Self {
        Self {
            shell,
            tol,
            simplify: false,
        }
    }

    /// Whether to simplify the loops of each merged face.
    #[must_use]
    pub fn with_simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    /// Runs the pass. Returns the number of faces merged away.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell does not exist or a merge breaks a
    /// structural rule.
    #[instrument(skip(self, model), fields(shell = ?self.shell))]
    pub fn execute(&self, model: &mut Model) -> Result<usize> {
        let mut faces: Vec<FaceUseId> = Vec::new();
        for fu in model.shell(self.shell)?.faceuses.clone() {
            if model.faceuse(fu)?.orientation == Orientation::Same {
                let face = model.faceuse(fu)?.face;
                model.rebound_face(face)?;
                faces.push(fu);
            }
        }

        let mut merged = 0;
        for i in 0..faces.len() {
            let fu1 = faces[i];
            if !model.has_faceuse(fu1) {
                continue;
            }
            for &fu2 in &faces[i + 1..] {
                if !model.has_faceuse(fu2) || !self.coplanar(model, fu1, fu2)? {
                    continue;
                }
                join_faces(model, fu1, fu2)?;
                merged += 1;
                if self.simplify {
                    for lu in model.faceuse(fu1)?.loopuses.clone() {
                        if model.has_loopuse(lu) {
                            simplify_loop(model, lu)?;
                        }
                    }
                }
            }
        }

        model.rebound_shell(self.shell)?;
        debug!(merged, "merged coplanar faces");
        model.verify_if_enabled()?;
        Ok(merged)
    }

    fn coplanar(&self, model: &Model, fu1: FaceUseId, fu2: FaceUseId) -> Result<bool> {
        let f1 = model.face(model.faceuse(fu1)?.face)?;
        let f2 = model.face(model.faceuse(fu2)?.face)?;
        if f1.geom.is_some() && f1.geom == f2.geom && f1.flip == f2.flip {
            return Ok(true);
        }
        let (Some(b1), Some(b2)) = (f1.bbox, f2.bbox) else {
            return Ok(false);
        };
        if !b1.overlaps(&b2, &self.tol) {
            return Ok(false);
        }
        let (Some(n1), Some(n2)) = (model.faceuse_plane(fu1)?, model.faceuse_plane(fu2)?) else {
            return Ok(false);
        };
        if !self.tol.near_zero(n1.dist - n2.dist) || n1.normal.dot(&n2.normal) < SMALL_FASTF {
            return Ok(false);
        }
        if vertices_off(model, fu2, &n1, &self.tol)? > 0 || vertices_off(model, fu1, &n2, &self.tol)? > 0 {
            trace!(?fu1, ?fu2, "planes agree but vertices stray");
            return Ok(false);
        }
        Ok(true)
    }
}

fn vertices_off(model: &Model, fu: FaceUseId, plane: &PlaneEquation, tol: &Tolerance) -> Result<usize> {
    let mut off = 0;
    for &lu in &model.faceuse(fu)?.loopuses {
        for p in model.loop_points(lu)? {
            if !tol.near_zero(plane.distance(&p)) {
                off += 1;
            }
        }
    }
    Ok(off)
}
