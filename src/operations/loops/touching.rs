use tracing::{debug, instrument, trace, warn};

use crate::error::{OperationError, Result};
use crate::euler::kill_edgeuse;
use crate::topology::{EdgeUseId, LoopContent, LoopUseId, Model, VertexId};

use super::cut::split_loop_at_vertexuse;

/// Edgeuses that start a touching jaunt: an out-and-back `A -> B -> A`
/// whose tip `B` is visited again elsewhere in the same loop.
///
/// A two-edge crack loop has no jaunts.
///
/// # Errors
///
/// Returns an error if the ring is broken.
pub fn touching_jaunts(model: &Model, lu: LoopUseId) -> Result<Vec<EdgeUseId>> {
    let mut jaunts = Vec::new();
    if !matches!(model.loopuse(lu)?.content, LoopContent::Edges(_)) {
        return Ok(jaunts);
    }
    for eu in model.loop_edgeuses(lu)? {
        let eu2 = model.edgeuse(eu)?.next;
        let eu3 = model.edgeuse(eu2)?.next;
        if model.edgeuse(eu)?.vertexuse == model.edgeuse(eu3)?.vertexuse {
            break;
        }
        if model.eu_start_vertex(eu)? != model.eu_start_vertex(eu3)? {
            continue;
        }
        let tip = model.edgeuse(eu2)?.vertexuse;
        if model.find_repeated_vertex_in_loop(tip)?.is_some() {
            jaunts.push(eu);
        }
    }
    Ok(jaunts)
}

/// Removes accordion pleats: an edge that runs straight back to where its
/// predecessor started, with a tip the loop touches nowhere else. Both
/// edges of the pleat go. A pleat whose tip is touched again is a touching
/// jaunt and stays. Loops of two edges or fewer are left alone. Returns
/// the number of edgeuses killed.
///
/// # Errors
///
/// Returns an error if the ring is broken.
#[instrument(skip(model))]
pub fn kill_accordions(model: &mut Model, lu: LoopUseId) -> Result<usize> {
    let mut killed = 0;
    'scan: loop {
        if !matches!(model.loopuse(lu)?.content, LoopContent::Edges(_)) {
            break;
        }
        let eus = model.loop_edgeuses(lu)?;
        if eus.len() <= 2 {
            break;
        }
        for curr in eus {
            let data = model.edgeuse(curr)?;
            let (prev, next) = (data.prev, data.next);
            if curr == prev || model.eu_start_vertex(prev)? != model.eu_start_vertex(next)? {
                continue;
            }
            if model.find_repeated_vertex_in_loop(data.vertexuse)?.is_some() {
                continue;
            }
            kill_edgeuse(model, curr)?;
            killed += 1;
            if prev != next {
                kill_edgeuse(model, prev)?;
                killed += 1;
            }
            trace!(?curr, "killed accordion pleat");
            continue 'scan;
        }
        break;
    }
    Ok(killed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JauntStatus {
    Unknown,
    Split,
    Jaunt,
    TouchingJaunt,
}

/// The jaunts and what is known about them while one split is weighed.
struct JauntTable {
    jaunts: Vec<EdgeUseId>,
    tips: Vec<VertexId>,
    after: Vec<EdgeUseId>,
    status: Vec<JauntStatus>,
}

impl JauntTable {
    fn new(model: &Model, jaunts: Vec<EdgeUseId>) -> Result<Self> {
        let mut tips = Vec::with_capacity(jaunts.len());
        let mut after = Vec::with_capacity(jaunts.len());
        for &eu in &jaunts {
            tips.push(model.eu_end_vertex(eu)?);
            after.push(model.edgeuse(eu)?.next);
        }
        let status = vec![JauntStatus::Unknown; jaunts.len()];
        Ok(Self {
            jaunts,
            tips,
            after,
            status,
        })
    }

    /// Walks one of the two loops a split at jaunt `k` would produce and
    /// updates what becomes of every other jaunt. Without `stop` the walk
    /// ends where a split would close the new loop; with it, the walk
    /// covers what is left of the old loop. Returns where the walk stopped.
    fn predict(
        &mut self,
        model: &Model,
        start: EdgeUseId,
        stop: Option<EdgeUseId>,
        k: usize,
        limit: usize,
    ) -> Result<EdgeUseId> {
        let mut visits = vec![0_usize; self.jaunts.len()];
        let start_v = model.eu_start_vertex(start)?;
        let mut last: Option<EdgeUseId> = None;
        let mut cur = start;
        let mut steps = 0;
        loop {
            let cur_v = model.eu_start_vertex(cur)?;
            for j in 0..self.jaunts.len() {
                if j == k {
                    continue;
                }
                if last == Some(self.jaunts[j]) {
                    self.status[j] = JauntStatus::Jaunt;
                }
                if cur_v == self.tips[j] {
                    visits[j] += 1;
                }
            }
            last = Some(cur);
            cur = model.edgeuse(cur)?.next;
            steps += 1;

            let done = match stop {
                None => model.eu_start_vertex(cur)? == start_v,
                Some(stop) => cur == stop,
            };
            if done {
                break;
            }
            if steps > limit {
                return Err(OperationError::Failed("jaunt prediction ran off the loop".into()).into());
            }
        }

        for (status, &count) in self.status.iter_mut().zip(&visits) {
            if *status == JauntStatus::Jaunt && count > 1 {
                *status = JauntStatus::TouchingJaunt;
            }
        }
        for j in 0..self.jaunts.len() {
            if last == Some(self.jaunts[j]) || start == self.after[j] {
                self.status[j] = JauntStatus::Split;
            }
        }
        Ok(cur)
    }

    fn all_safe(&self) -> bool {
        self.status
            .iter()
            .all(|s| matches!(s, JauntStatus::Split | JauntStatus::TouchingJaunt))
    }
}

/// Splits a loop at the tips of its touching jaunts.
///
/// Accordion pleats are removed first. With several touching jaunts, each
/// candidate split is tried on paper first, and only one that leaves every
/// other jaunt either split or still touching is made; any other choice
/// would later unravel into two-edge cracks. Split loops come out
/// `Unspecified`. Returns the number of loops split off.
///
/// # Errors
///
/// Returns [`OperationError::NoSafeJauntSplit`] when no candidate passes.
#[instrument(skip(model))]
pub fn split_loop_at_touching_jaunt(model: &mut Model, lu: LoopUseId) -> Result<usize> {
    kill_accordions(model, lu)?;

    let mut count = 0;
    'top: loop {
        let jaunts = touching_jaunts(model, lu)?;
        match jaunts.len() {
            0 => break,
            1 => {
                let tip_eu = model.edgeuse(jaunts[0])?.next;
                let vu = model.edgeuse(tip_eu)?.vertexuse;
                let new_lu = split_loop_at_vertexuse(model, lu, vu)?;
                model.rebound_loop(new_lu)?;
                count += 1;
                break;
            }
            n => {
                trace!(?lu, jaunts = n, "weighing jaunt splits");
                let limit = model.loop_edge_count(lu)?;
                let mut table = JauntTable::new(model, jaunts)?;
                for k in 0..table.jaunts.len() {
                    table.status.fill(JauntStatus::Unknown);
                    let start1 = table.after[k];
                    let start2 = table.predict(model, start1, None, k, limit)?;
                    table.predict(model, start2, Some(start1), k, limit)?;
                    if !table.all_safe() {
                        trace!(k, "split would strand a jaunt");
                        continue;
                    }

                    let vu = model.edgeuse(start1)?.vertexuse;
                    let new_lu = split_loop_at_vertexuse(model, lu, vu)?;
                    model.rebound_loop(new_lu)?;
                    count += 1 + split_loop_at_touching_jaunt(model, new_lu)?;
                    continue 'top;
                }
                warn!(?lu, jaunts = n, "no safe place to split touching jaunts");
                return Err(OperationError::NoSafeJauntSplit.into());
            }
        }
    }
    if count > 0 {
        debug!(?lu, count, "split loop at touching jaunts");
    }
    Ok(count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::euler::make_region;
    use crate::math::Point3;
    use crate::operations::make_face_with_vertices;
    use crate::topology::FaceUseId;

    fn vertex(model: &mut Model, x: f64, y: f64) -> Option<VertexId> {
        Some(model.add_vertex(Some(Point3::new(x, y, 0.0))))
    }

    fn face(model: &mut Model, verts: &mut [Option<VertexId>]) -> (FaceUseId, LoopUseId) {
        let (_, s) = make_region(model).unwrap();
        let fu = make_face_with_vertices(model, s, verts).unwrap();
        let lu = model.faceuse(fu).unwrap().loopuses[0];
        (fu, lu)
    }

    fn loop_sizes(model: &Model, fu: FaceUseId) -> Vec<usize> {
        let mut sizes: Vec<usize> = model
            .faceuse(fu)
            .unwrap()
            .loopuses
            .iter()
            .map(|&lu| model.loop_edge_count(lu).unwrap())
            .collect();
        sizes.sort_unstable();
        sizes
    }

    #[test]
    fn accordion_pleat_is_folded_out() {
        let mut model = Model::new();
        let a = vertex(&mut model, 0.0, 0.0);
        let b = vertex(&mut model, 2.0, 0.0);
        let c = vertex(&mut model, 3.0, 1.0);
        let d = vertex(&mut model, 1.0, 2.0);
        let (_, lu) = face(&mut model, &mut [a, b, c, b, d]);

        assert_eq!(kill_accordions(&mut model, lu).unwrap(), 2);
        assert_eq!(model.loop_vertices(lu).unwrap(), vec![a.unwrap(), b.unwrap(), d.unwrap()]);
        assert!(!model.has_vertex(c.unwrap()));
        model.verify().unwrap();
    }

    #[test]
    fn single_touching_jaunt_splits_at_its_tip() {
        let mut model = Model::new();
        let a = vertex(&mut model, 0.0, 0.0);
        let b = vertex(&mut model, 4.0, 0.0);
        let c = vertex(&mut model, 4.0, 4.0);
        let d = vertex(&mut model, 0.0, 4.0);
        let t = vertex(&mut model, 2.0, 2.0);
        let (fu, lu) = face(&mut model, &mut [a, b, t, b, c, t, d]);

        assert_eq!(touching_jaunts(&model, lu).unwrap().len(), 1);
        assert_eq!(split_loop_at_touching_jaunt(&mut model, lu).unwrap(), 1);
        assert_eq!(loop_sizes(&model, fu), vec![3, 4]);
        assert_eq!(
            model.loop_vertices(lu).unwrap(),
            vec![a.unwrap(), b.unwrap(), t.unwrap(), d.unwrap()]
        );
        model.verify().unwrap();
    }

    #[test]
    fn two_jaunts_split_without_cracks() {
        let mut model = Model::new();
        let a = vertex(&mut model, 0.0, 0.0);
        let b = vertex(&mut model, 6.0, 0.0);
        let c = vertex(&mut model, 6.0, 6.0);
        let d = vertex(&mut model, 0.0, 6.0);
        let t = vertex(&mut model, 3.0, 2.0);
        let u = vertex(&mut model, 3.0, 4.0);
        let (fu, lu) = face(&mut model, &mut [a, b, t, b, c, u, c, d, u, t]);

        assert_eq!(touching_jaunts(&model, lu).unwrap().len(), 2);
        assert_eq!(split_loop_at_touching_jaunt(&mut model, lu).unwrap(), 2);
        assert_eq!(loop_sizes(&model, fu), vec![3, 3, 4]);
        for &l in &model.faceuse(fu).unwrap().loopuses {
            assert!(!model.is_crack_loop(l).unwrap());
        }
        model.verify().unwrap();
    }

    #[test]
    fn plain_loop_has_no_jaunts() {
        let mut model = Model::new();
        let a = vertex(&mut model, 0.0, 0.0);
        let b = vertex(&mut model, 1.0, 0.0);
        let c = vertex(&mut model, 0.0, 1.0);
        let (_, lu) = face(&mut model, &mut [a, b, c]);
        assert!(touching_jaunts(&model, lu).unwrap().is_empty());
        assert_eq!(split_loop_at_touching_jaunt(&mut model, lu).unwrap(), 0);
    }
}
