use tracing::{debug, instrument, trace, warn};

use crate::classify::{LoopClass, LoopClassifier, PlanarLoopClassifier};
use crate::error::Result;
use crate::euler::{kill_edgeuse, kill_faceuse, kill_loopuse};
use crate::math::Tolerance;
use crate::topology::{FaceUseId, LoopContent, LoopUseId, Model, Orientation, ShellId};

/// Strips a shell of structure that says nothing new.
///
/// In order:
///
/// 1. wire loops and wire edges already present in a face;
/// 2. wire edges already present in a wire loop;
/// 3. wire self-loops on a vertex used by a face, an edge loop or a wire
///    edge;
/// 4. pairs of coincident loops of opposite orientation with the same
///    number of edges, both of which go (and the face with them if it
///    empties);
/// 5. loops nested in a loop of the same orientation with no loop of the
///    other orientation in between;
/// 6. holes tracing an outer loop of the face.
///
/// The loop comparisons use `C`, planar by default.
#[derive(Debug, Clone)]
pub struct RemoveRedundancies<C = PlanarLoopClassifier> {
    shell: ShellId,
    tol: Tolerance,
    classifier: C,
}

impl RemoveRedundancies {
    /// Creates a pass over `shell` with the planar classifier.
    #[must_use]
    pub fn new(shell: ShellId, tol: Tolerance) -> Self {
        Self {
            shell,
            tol,
            classifier: PlanarLoopClassifier,
        }
    }
}

impl<C: LoopClassifier> RemoveRedundancies<C> {
    /// Swaps in another loop classifier.
    #[must_use]
    pub fn with_classifier<D: LoopClassifier>(self, classifier: D) -> RemoveRedundancies<D> {
        RemoveRedundancies {
            shell: self.shell,
            tol: self.tol,
            classifier,
        }
    }

    /// Runs the pass. Returns the number of elements killed.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell does not exist or the classifier
    /// cannot decide.
    #[instrument(skip(self, model), fields(shell = ?self.shell))]
    pub fn execute(&self, model: &mut Model) -> Result<usize> {
        let mut killed = self.remove_wire_duplicates(model)?;
        if !model.has_shell(self.shell) || model.shell(self.shell)?.is_empty() {
            return Ok(killed);
        }
        if model.shell(self.shell)?.vertexuse.is_some() {
            warn!(shell = ?self.shell, "lone vertex left after removing wires");
        }

        let faces: Vec<FaceUseId> = model
            .shell(self.shell)?
            .faceuses
            .iter()
            .copied()
            .filter(|&fu| model.faceuse(fu).is_ok_and(|f| f.orientation == Orientation::Same))
            .collect();

        for &fu in &faces {
            let (n, shell_empty) = self.cancel_opposite_twins(model, fu)?;
            killed += n;
            if shell_empty {
                debug!(killed, "shell emptied by redundancy removal");
                return Ok(killed);
            }
        }
        for &fu in &faces {
            if model.has_faceuse(fu) {
                killed += self.remove_nested_twins(model, fu)?;
            }
        }
        for &fu in &faces {
            if model.has_faceuse(fu) {
                killed += self.remove_shadow_holes(model, fu)?;
            }
        }
        debug!(killed, "removed redundancies");
        model.verify_if_enabled()?;
        Ok(killed)
    }

    fn remove_wire_duplicates(&self, model: &mut Model) -> Result<usize> {
        let shell = self.shell;
        let mut killed = 0;

        if !model.shell(shell)?.faceuses.is_empty() {
            for lu in model.shell(shell)?.wire_loopuses.clone() {
                if !model.has_loopuse(lu) {
                    continue;
                }
                let lp = model.loopuse(lu)?.lp;
                if model.is_loop_in_facelist(shell, lp)? {
                    kill_loopuse(model, lu)?;
                    killed += 1;
                }
            }
            for eu in model.shell(shell)?.wire_edgeuses.clone() {
                if !model.has_edgeuse(eu) {
                    continue;
                }
                let edge = model.edgeuse(eu)?.edge;
                if model.is_edge_in_facelist(shell, edge)? {
                    kill_edgeuse(model, eu)?;
                    killed += 1;
                }
            }
        }

        for eu in model.shell(shell)?.wire_edgeuses.clone() {
            if !model.has_edgeuse(eu) {
                continue;
            }
            let edge = model.edgeuse(eu)?.edge;
            if model.is_edge_in_looplist(shell, edge)? {
                kill_edgeuse(model, eu)?;
                killed += 1;
            }
        }

        for lu in model.shell(shell)?.wire_loopuses.clone() {
            if !model.has_loopuse(lu) {
                continue;
            }
            let LoopContent::Vertex(vu) = model.loopuse(lu)?.content else {
                continue;
            };
            let v = model.vertexuse(vu)?.vertex;
            if model.is_vertex_in_facelist(shell, v)?
                || model.is_vertex_in_looplist(shell, v, false)?
                || model.is_vertex_in_edgelist(shell, v)?
            {
                kill_loopuse(model, lu)?;
                killed += 1;
            }
        }
        if killed > 0 {
            trace!(killed, "removed wires shadowed by other structure");
        }
        Ok(killed)
    }

    fn classify(&self, model: &Model, a: LoopUseId, b: LoopUseId) -> Result<LoopClass> {
        self.classifier.classify(model, a, b, &self.tol)
    }

    /// Kills coincident loop pairs of opposite orientation. Returns the
    /// count killed and whether the shell is now empty.
    fn cancel_opposite_twins(&self, model: &mut Model, fu: FaceUseId) -> Result<(usize, bool)> {
        let mut killed = 0;
        'scan: loop {
            let loops = model.faceuse(fu)?.loopuses.clone();
            for &lu in &loops {
                if !matches!(model.loopuse(lu)?.content, LoopContent::Edges(_)) {
                    continue;
                }
                let orientation = model.loopuse(lu)?.orientation;
                let count = model.loop_edge_count(lu)?;
                for &lu1 in &loops {
                    if lu1 == lu
                        || !matches!(model.loopuse(lu1)?.content, LoopContent::Edges(_))
                        || model.loopuse(lu1)?.orientation == orientation
                        || model.loop_edge_count(lu1)? != count
                        || self.classify(model, lu, lu1)? != LoopClass::OnShared
                    {
                        continue;
                    }

                    trace!(?lu, ?lu1, "cancelling coincident loops");
                    kill_loopuse(model, lu)?;
                    killed += 2;
                    if kill_loopuse(model, lu1)? {
                        let shell_empty = kill_faceuse(model, fu)?;
                        return Ok((killed, shell_empty));
                    }
                    continue 'scan;
                }
            }
            return Ok((killed, false));
        }
    }

    fn remove_nested_twins(&self, model: &mut Model, fu: FaceUseId) -> Result<usize> {
        let mut killed = 0;
        let loops = model.faceuse(fu)?.loopuses.clone();
        for &lu in &loops {
            if !model.has_loopuse(lu) || !matches!(model.loopuse(lu)?.content, LoopContent::Edges(_)) {
                continue;
            }
            let orientation = model.loopuse(lu)?.orientation;
            for &lu1 in &loops {
                if lu1 == lu
                    || !model.has_loopuse(lu1)
                    || !matches!(model.loopuse(lu1)?.content, LoopContent::Edges(_))
                    || model.loopuse(lu1)?.orientation != orientation
                    || self.classify(model, lu1, lu)? != LoopClass::Inside
                {
                    continue;
                }

                let mut separated = false;
                for &lu2 in &loops {
                    if lu2 == lu
                        || lu2 == lu1
                        || !model.has_loopuse(lu2)
                        || model.loopuse(lu2)?.orientation == orientation
                    {
                        continue;
                    }
                    if self.classify(model, lu2, lu)? == LoopClass::Inside
                        && self.classify(model, lu1, lu2)? == LoopClass::Inside
                    {
                        separated = true;
                        break;
                    }
                }
                if !separated {
                    trace!(?lu1, ?lu, "loop nested in a loop like itself");
                    kill_loopuse(model, lu1)?;
                    killed += 1;
                }
            }
        }
        Ok(killed)
    }

    fn remove_shadow_holes(&self, model: &mut Model, fu: FaceUseId) -> Result<usize> {
        let mut killed = 0;
        let loops = model.faceuse(fu)?.loopuses.clone();
        for &lu in &loops {
            if !model.has_loopuse(lu) || model.loopuse(lu)?.orientation != Orientation::Same {
                continue;
            }
            for &lu1 in &loops {
                if lu1 == lu
                    || !model.has_loopuse(lu1)
                    || model.loopuse(lu1)?.orientation != Orientation::Opposite
                {
                    continue;
                }
                if self.classify(model, lu, lu1)? == LoopClass::OnShared {
                    trace!(?lu1, "hole traces an outer loop");
                    kill_loopuse(model, lu1)?;
                    killed += 1;
                }
            }
        }
        Ok(killed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::euler::{make_edge, make_loop, make_region};
    use crate::math::Point3;
    use crate::operations::{add_loop_to_face, make_face_with_vertices};
    use crate::radial::join_edgeuses;
    use crate::topology::{LoopUseParent, VertexId};

    fn tol() -> Tolerance {
        Tolerance::new(0.005, 1e-6)
    }

    fn square(model: &mut Model, x0: f64, size: f64) -> Vec<Option<VertexId>> {
        [(x0, x0), (x0 + size, x0), (x0 + size, x0 + size), (x0, x0 + size)]
            .iter()
            .map(|&(x, y)| Some(model.add_vertex(Some(Point3::new(x, y, 0.0)))))
            .collect()
    }

    fn face_loops(model: &Model, fu: FaceUseId) -> Vec<LoopUseId> {
        model.faceuse(fu).unwrap().loopuses.clone()
    }

    #[test]
    fn wires_shadowing_a_face_are_removed() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let mut v = square(&mut model, 0.0, 1.0);
        let fu = make_face_with_vertices(&mut model, s, &mut v).unwrap();
        let face_eu = model.loop_edgeuses(face_loops(&model, fu)[0]).unwrap()[0];

        let wire = make_edge(&mut model, v[1], v[0], s).unwrap();
        join_edgeuses(&mut model, face_eu, wire).unwrap();
        make_loop(&mut model, LoopUseParent::Shell(s), v[2], Orientation::Unspecified).unwrap();

        let killed = RemoveRedundancies::new(s, tol()).execute(&mut model).unwrap();
        assert_eq!(killed, 2);
        let shell = model.shell(s).unwrap();
        assert!(shell.wire_edgeuses.is_empty());
        assert!(shell.wire_loopuses.is_empty());
        assert_eq!(model.edge_count(), 4);
        model.verify().unwrap();
    }

    #[test]
    fn coincident_opposite_loops_cancel() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let mut v = square(&mut model, 0.0, 1.0);
        let fu = make_face_with_vertices(&mut model, s, &mut v).unwrap();
        let mut back: Vec<_> = v.iter().rev().copied().collect();
        add_loop_to_face(&mut model, fu, &mut back, Orientation::Opposite).unwrap();

        RemoveRedundancies::new(s, tol()).execute(&mut model).unwrap();
        assert_eq!(model.face_count(), 0);
    }

    #[test]
    fn nested_loop_of_same_orientation_goes() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let mut outer = square(&mut model, 0.0, 4.0);
        let fu = make_face_with_vertices(&mut model, s, &mut outer).unwrap();
        let mut inner = square(&mut model, 1.0, 2.0);
        let inner_lu = add_loop_to_face(&mut model, fu, &mut inner, Orientation::Same).unwrap();

        assert_eq!(RemoveRedundancies::new(s, tol()).execute(&mut model).unwrap(), 1);
        assert!(!model.has_loopuse(inner_lu));
        assert_eq!(face_loops(&model, fu).len(), 1);
        model.verify().unwrap();
    }

    #[test]
    fn island_inside_a_hole_stays() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let mut outer = square(&mut model, 0.0, 6.0);
        let fu = make_face_with_vertices(&mut model, s, &mut outer).unwrap();
        let mut hole = square(&mut model, 1.0, 4.0);
        hole.reverse();
        add_loop_to_face(&mut model, fu, &mut hole, Orientation::Opposite).unwrap();
        let mut island = square(&mut model, 2.0, 2.0);
        add_loop_to_face(&mut model, fu, &mut island, Orientation::Same).unwrap();

        assert_eq!(RemoveRedundancies::new(s, tol()).execute(&mut model).unwrap(), 0);
        assert_eq!(face_loops(&model, fu).len(), 3);
    }

    #[test]
    fn hole_tracing_the_outline_with_extra_vertex_goes() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let mut outer = square(&mut model, 0.0, 2.0);
        let fu = make_face_with_vertices(&mut model, s, &mut outer).unwrap();
        let mid = Some(model.add_vertex(Some(Point3::new(1.0, 0.0, 0.0))));
        let mut hole = vec![outer[0], outer[3], outer[2], outer[1], mid];
        let hole_lu = add_loop_to_face(&mut model, fu, &mut hole, Orientation::Opposite).unwrap();

        assert_eq!(RemoveRedundancies::new(s, tol()).execute(&mut model).unwrap(), 1);
        assert!(!model.has_loopuse(hole_lu));
        assert_eq!(face_loops(&model, fu).len(), 1);
        model.verify().unwrap();
    }
}
