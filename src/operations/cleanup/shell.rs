use tracing::{debug, instrument, warn};

use crate::classify::reorient_loop;
use crate::error::Result;
use crate::euler::{kill_faceuse, kill_loopuse};
use crate::operations::loops::{join_touching_loops, split_loop_at_touching_jaunt, split_touching_loops};
use crate::topology::{FaceUseId, LoopContent, LoopUseId, Model, Orientation, ShellId};

/// One use of every face in the shell.
fn distinct_faces(model: &Model, shell: ShellId) -> Result<Vec<FaceUseId>> {
    let mut seen = model.visited_set();
    let mut faces = Vec::new();
    for &fu in &model.shell(shell)?.faceuses {
        let face = model.faceuse(fu)?.face;
        if !seen.test_and_set(model.face(face)?.index) {
            faces.push(fu);
        }
    }
    Ok(faces)
}

/// One use of every wire loop in the shell.
fn distinct_wire_loops(model: &Model, shell: ShellId) -> Result<Vec<LoopUseId>> {
    let mut seen = model.visited_set();
    let mut loops = Vec::new();
    for &lu in &model.shell(shell)?.wire_loopuses {
        let lp = model.loopuse(lu)?.lp;
        if !seen.test_and_set(model.loop_data(lp)?.index) {
            loops.push(lu);
        }
    }
    Ok(loops)
}

fn reorient_unspecified(model: &mut Model, faces: &[FaceUseId]) -> Result<()> {
    for &fu in faces {
        if !model.has_faceuse(fu) {
            continue;
        }
        for lu in model.faceuse(fu)?.loopuses.clone() {
            if model.loopuse(lu)?.orientation == Orientation::Unspecified {
                reorient_loop(model, lu)?;
            }
        }
    }
    Ok(())
}

/// Splits every self-touching loop of a shell, jaunts first, then
/// reorients the face loops the splits left `Unspecified`. Returns the
/// number of loops split off.
///
/// # Errors
///
/// Returns [`crate::error::OperationError::NoSafeJauntSplit`] if a loop's
/// touching jaunts cannot be split safely.
#[instrument(skip(model))]
pub fn shell_split_touching_loops(model: &mut Model, shell: ShellId) -> Result<usize> {
    let faces = distinct_faces(model, shell)?;
    let mut count = 0;
    for &fu in &faces {
        let mut i = 0;
        while let Some(&lu) = model.faceuse(fu)?.loopuses.get(i) {
            count += split_loop_at_touching_jaunt(model, lu)?;
            count += split_touching_loops(model, lu)?;
            i += 1;
        }
    }
    for lu in distinct_wire_loops(model, shell)? {
        count += split_loop_at_touching_jaunt(model, lu)?;
        count += split_touching_loops(model, lu)?;
    }

    reorient_unspecified(model, &faces)?;
    if count > 0 {
        debug!(?shell, count, "split touching loops");
    }
    model.verify_if_enabled()?;
    Ok(count)
}

/// Joins every face loop of a shell with the loops that touch it, then
/// reorients what is left `Unspecified`. Returns the number of loops
/// absorbed.
///
/// # Errors
///
/// Returns an error if a join breaks a structural rule.
#[instrument(skip(model))]
pub fn shell_join_touching_loops(model: &mut Model, shell: ShellId) -> Result<usize> {
    let faces = distinct_faces(model, shell)?;
    let mut count = 0;
    for &fu in &faces {
        let mut i = 0;
        while let Some(&lu) = model.faceuse(fu)?.loopuses.get(i) {
            count += join_touching_loops(model, lu)?;
            i += 1;
        }
    }
    reorient_unspecified(model, &faces)?;
    if count > 0 {
        debug!(?shell, count, "joined touching loops");
    }
    model.verify_if_enabled()?;
    Ok(count)
}

fn report_unoriented(model: &Model, lu: LoopUseId) -> Result<()> {
    let data = model.loopuse(lu)?;
    if data.orientation == Orientation::Unspecified {
        if let LoopContent::Vertex(vu) = data.content {
            let v = model.vertexuse(vu)?.vertex;
            warn!(?lu, point = ?model.vertex(v)?.point, "unoriented vertex loop");
        }
    }
    Ok(())
}

/// Kills every loop of a shell tagged `orientation`, typically the
/// `BoolPlace` vertex markers left behind by intersection. Faces left
/// without loops are killed too. `Unspecified` self-loops that survive
/// are reported. Returns the number of loops killed.
///
/// # Errors
///
/// Returns an error if the shell does not exist.
#[instrument(skip(model))]
pub fn sanitize_loops(model: &mut Model, shell: ShellId, orientation: Orientation) -> Result<usize> {
    let mut killed = 0;
    for fu in distinct_faces(model, shell)? {
        for lu in model.faceuse(fu)?.loopuses.clone() {
            if model.loopuse(lu)?.orientation == orientation {
                kill_loopuse(model, lu)?;
                killed += 1;
            } else {
                report_unoriented(model, lu)?;
            }
        }
        if model.faceuse(fu)?.loopuses.is_empty() {
            kill_faceuse(model, fu)?;
        }
    }

    for lu in distinct_wire_loops(model, shell)? {
        if model.loopuse(lu)?.orientation == orientation {
            kill_loopuse(model, lu)?;
            killed += 1;
        } else {
            report_unoriented(model, lu)?;
        }
    }
    debug!(?shell, ?orientation, killed, "sanitized loops");
    model.verify_if_enabled()?;
    Ok(killed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::compute_face_plane;
    use crate::euler::{make_loop, make_region};
    use crate::math::{Point3, Tolerance};
    use crate::operations::{add_loop_to_face, make_face_with_vertices};
    use crate::topology::{LoopUseParent, VertexId};

    fn tol() -> Tolerance {
        Tolerance::new(0.005, 1e-6)
    }

    fn vertex(model: &mut Model, x: f64, y: f64) -> Option<VertexId> {
        Some(model.add_vertex(Some(Point3::new(x, y, 0.0))))
    }

    #[test]
    fn split_pieces_are_reoriented() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let a = vertex(&mut model, 0.0, 0.0);
        let b = vertex(&mut model, 4.0, 0.0);
        let c = vertex(&mut model, 4.0, 4.0);
        let d = vertex(&mut model, 0.0, 4.0);
        let t = vertex(&mut model, 2.0, 2.0);
        let fu = make_face_with_vertices(&mut model, s, &mut [a, b, t, b, c, t, d]).unwrap();
        compute_face_plane(&mut model, fu, &tol()).unwrap();

        assert_eq!(shell_split_touching_loops(&mut model, s).unwrap(), 1);
        let loops = model.faceuse(fu).unwrap().loopuses.clone();
        assert_eq!(loops.len(), 2);
        for lu in loops {
            assert_eq!(model.loopuse(lu).unwrap().orientation, Orientation::Same);
        }
        model.verify().unwrap();

        assert_eq!(shell_split_touching_loops(&mut model, s).unwrap(), 0);
    }

    #[test]
    fn touching_hole_is_joined_into_outer_loop() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let mut outer = [
            vertex(&mut model, 0.0, 0.0),
            vertex(&mut model, 4.0, 0.0),
            vertex(&mut model, 4.0, 4.0),
            vertex(&mut model, 0.0, 4.0),
        ];
        let fu = make_face_with_vertices(&mut model, s, &mut outer).unwrap();
        compute_face_plane(&mut model, fu, &tol()).unwrap();
        let mut hole = [outer[0], vertex(&mut model, 1.0, 2.0), vertex(&mut model, 2.0, 1.0)];
        add_loop_to_face(&mut model, fu, &mut hole, Orientation::Opposite).unwrap();

        assert_eq!(shell_join_touching_loops(&mut model, s).unwrap(), 1);
        let loops = model.faceuse(fu).unwrap().loopuses.clone();
        assert_eq!(loops.len(), 1);
        assert_eq!(model.loopuse(loops[0]).unwrap().orientation, Orientation::Same);
        model.verify().unwrap();
    }

    #[test]
    fn marker_loops_are_swept_away() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let mut outer = [
            vertex(&mut model, 0.0, 0.0),
            vertex(&mut model, 1.0, 0.0),
            vertex(&mut model, 0.0, 1.0),
        ];
        let fu = make_face_with_vertices(&mut model, s, &mut outer).unwrap();
        let p = model.add_vertex(Some(Point3::new(0.2, 0.2, 0.0)));
        make_loop(&mut model, LoopUseParent::FaceUse(fu), Some(p), Orientation::BoolPlace).unwrap();
        let q = model.add_vertex(Some(Point3::new(5.0, 5.0, 0.0)));
        make_loop(&mut model, LoopUseParent::Shell(s), Some(q), Orientation::BoolPlace).unwrap();

        assert_eq!(sanitize_loops(&mut model, s, Orientation::BoolPlace).unwrap(), 2);
        assert_eq!(model.faceuse(fu).unwrap().loopuses.len(), 1);
        assert!(model.shell(s).unwrap().wire_loopuses.is_empty());
        assert!(!model.has_vertex(p) && !model.has_vertex(q));
        model.verify().unwrap();
    }
}
