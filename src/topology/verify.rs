//! Whole-model and per-shell structural checks.

use tracing::trace;

use crate::diag::DebugFlags;
use crate::error::{Result, TopologyError};
use crate::radial::check_radial_parity;

use super::{
    EdgeUseId, EdgeUseParent, FaceUseId, LoopContent, LoopUseId, LoopUseParent, Model,
    Orientation, ShellId, VertexUseId, VertexUseParent,
};

fn broken<T>(err: TopologyError) -> Result<T> {
    Err(err.into())
}

impl Model {
    /// Runs [`Model::verify`] when [`DebugFlags::VERIFY`] is set.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub(crate) fn verify_if_enabled(&self) -> Result<()> {
        if self.debug_flags().contains(DebugFlags::VERIFY) {
            trace!("verifying after edit");
            self.verify()?;
        }
        Ok(())
    }

    /// Checks every invariant of the whole model, stopping at the first
    /// violation.
    ///
    /// # Errors
    ///
    /// Returns the [`TopologyError`] describing the first violation found.
    pub fn verify(&self) -> Result<()> {
        for (r, region) in &self.regions {
            for &s in &region.shells {
                if self.shell(s)?.region != r {
                    return broken(TopologyError::WrongParent(
                        "shell does not point back at its region".into(),
                    ));
                }
                self.verify_shell(s)?;
            }
        }
        for (s, shell) in &self.shells {
            if !self.region(shell.region)?.shells.contains(&s) {
                return broken(TopologyError::WrongParent(
                    "region does not list its shell".into(),
                ));
            }
        }
        for (f, face) in &self.faces {
            if self.faceuse(face.faceuse)?.face != f {
                return broken(TopologyError::MateMismatch(
                    "face points at a use of another face".into(),
                ));
            }
            if let Some(g) = face.geom {
                if !self.face_geom(g)?.faces.contains(&f) {
                    return broken(TopologyError::InvalidTopology(
                        "face geometry does not list its face".into(),
                    ));
                }
            }
        }
        for (v, vertex) in &self.vertices {
            if vertex.uses.is_empty() {
                return broken(TopologyError::InvalidTopology("vertex has no uses".into()));
            }
            for &vu in &vertex.uses {
                if self.vertexuse(vu)?.vertex != v {
                    return broken(TopologyError::MateMismatch(
                        "vertex lists a use of another vertex".into(),
                    ));
                }
            }
        }
        for (e, edge) in &self.edges {
            if self.edgeuse(edge.edgeuse)?.edge != e {
                return broken(TopologyError::RadialBroken(
                    "edge points at a use of another edge".into(),
                ));
            }
        }
        trace!(elements = self.max_index(), "model verified");
        Ok(())
    }

    /// Checks the invariants of everything a shell holds.
    ///
    /// Radial fans are followed into other shells, but only the uses found
    /// in `shell` are checked in depth.
    ///
    /// # Errors
    ///
    /// Returns the [`TopologyError`] describing the first violation found.
    pub fn verify_shell(&self, shell: ShellId) -> Result<()> {
        let data = self.shell(shell)?;
        if data.is_empty() {
            return broken(TopologyError::InvalidTopology("shell is empty".into()));
        }
        for &fu in &data.faceuses {
            self.check_faceuse(shell, fu)?;
        }
        for &lu in &data.wire_loopuses {
            if self.loopuse(lu)?.parent != LoopUseParent::Shell(shell) {
                return broken(TopologyError::WrongParent(
                    "wire loopuse is owned elsewhere".into(),
                ));
            }
            self.check_loopuse(lu)?;
        }
        for &eu in &data.wire_edgeuses {
            if self.edgeuse(eu)?.parent != EdgeUseParent::Shell(shell) {
                return broken(TopologyError::WrongParent(
                    "wire edgeuse is owned elsewhere".into(),
                ));
            }
            let mate = self.edgeuse(eu)?.mate;
            if !data.wire_edgeuses.contains(&mate) {
                return broken(TopologyError::WrongShell(
                    "wire edgeuse mate is not in the shell".into(),
                ));
            }
            self.check_edgeuse(eu)?;
        }
        if let Some(vu) = data.vertexuse {
            if !data.faceuses.is_empty()
                || !data.wire_loopuses.is_empty()
                || !data.wire_edgeuses.is_empty()
            {
                return broken(TopologyError::InvalidTopology(
                    "shell with a lone vertex holds other elements".into(),
                ));
            }
            self.check_vertexuse(vu, VertexUseParent::Shell(shell))?;
        }
        Ok(())
    }

    fn check_faceuse(&self, shell: ShellId, fu: FaceUseId) -> Result<()> {
        let data = self.faceuse(fu)?;
        if data.shell != shell {
            return broken(TopologyError::WrongShell("faceuse names another shell".into()));
        }
        let mate = self.faceuse(data.mate)?;
        if mate.mate != fu || data.mate == fu {
            return broken(TopologyError::MateMismatch("faceuse mate is not symmetric".into()));
        }
        if mate.face != data.face || mate.shell != shell {
            return broken(TopologyError::MateMismatch(
                "faceuse mates disagree on face or shell".into(),
            ));
        }
        if !matches!(
            (data.orientation, mate.orientation),
            (Orientation::Same, Orientation::Opposite) | (Orientation::Opposite, Orientation::Same)
        ) {
            return broken(TopologyError::OrientationClash(format!(
                "faceuse mates are {:?} and {:?}",
                data.orientation, mate.orientation
            )));
        }
        if data.loopuses.is_empty() {
            return broken(TopologyError::InvalidTopology("faceuse has no loops".into()));
        }
        for &lu in &data.loopuses {
            let l = self.loopuse(lu)?;
            if l.parent != LoopUseParent::FaceUse(fu) {
                return broken(TopologyError::WrongParent("loopuse is owned elsewhere".into()));
            }
            if self.loopuse(l.mate)?.parent != LoopUseParent::FaceUse(data.mate) {
                return broken(TopologyError::MateMismatch(
                    "loopuse mate is not in the faceuse mate".into(),
                ));
            }
            self.check_loopuse(lu)?;
        }
        Ok(())
    }

    fn check_loopuse(&self, lu: LoopUseId) -> Result<()> {
        let data = self.loopuse(lu)?;
        let mate = self.loopuse(data.mate)?;
        if mate.mate != lu || data.mate == lu || mate.lp != data.lp {
            return broken(TopologyError::MateMismatch("loopuse mate is not symmetric".into()));
        }
        if mate.orientation != data.orientation {
            return broken(TopologyError::OrientationClash(
                "loopuse mates carry different orientations".into(),
            ));
        }
        match (data.content, mate.content) {
            (LoopContent::Vertex(vu), LoopContent::Vertex(mate_vu)) => {
                self.check_vertexuse(vu, VertexUseParent::LoopUse(lu))?;
                if self.vertexuse(vu)?.vertex != self.vertexuse(mate_vu)?.vertex {
                    return broken(TopologyError::MateMismatch(
                        "self-loop mates sit on different vertices".into(),
                    ));
                }
            }
            (LoopContent::Edges(_), LoopContent::Edges(_)) => {
                let eus = self.loop_edgeuses(lu)?;
                for &eu in &eus {
                    let e = self.edgeuse(eu)?;
                    if self.edgeuse(e.next)?.prev != eu {
                        return broken(TopologyError::LoopNotClosed(
                            "edgeuse ring links disagree".into(),
                        ));
                    }
                    if self.eu_end_vertex(eu)? != self.eu_start_vertex(e.next)? {
                        return broken(TopologyError::LoopNotClosed(
                            "edgeuse does not end where the next one starts".into(),
                        ));
                    }
                    if self.edgeuse(e.mate)?.parent != EdgeUseParent::LoopUse(data.mate) {
                        return broken(TopologyError::MateMismatch(
                            "edgeuse mate is not in the loopuse mate".into(),
                        ));
                    }
                    self.check_edgeuse(eu)?;
                }
                if self.loop_edge_count(data.mate)? != eus.len() {
                    return broken(TopologyError::MateMismatch(
                        "loopuse mates have rings of different length".into(),
                    ));
                }
            }
            (LoopContent::Empty, _) | (_, LoopContent::Empty) => {
                return broken(TopologyError::InvalidTopology("loopuse is empty".into()));
            }
            _ => {
                return broken(TopologyError::MateMismatch(
                    "loopuse mates hold different kinds of content".into(),
                ));
            }
        }
        Ok(())
    }

    fn check_edgeuse(&self, eu: EdgeUseId) -> Result<()> {
        let data = self.edgeuse(eu)?;
        let mate = self.edgeuse(data.mate)?;
        if mate.mate != eu || data.mate == eu || mate.edge != data.edge {
            return broken(TopologyError::MateMismatch("edgeuse mate is not symmetric".into()));
        }
        let radial = self.edgeuse(data.radial)?;
        if radial.radial != eu || radial.edge != data.edge {
            return broken(TopologyError::RadialBroken("radial link is not symmetric".into()));
        }
        let pairs = self.radial_pairs(eu)?;
        if 2 * pairs.len() != self.edge_use_count(data.edge) {
            return broken(TopologyError::RadialBroken(
                "radial fan misses uses of its edge".into(),
            ));
        }
        self.check_vertexuse(data.vertexuse, VertexUseParent::EdgeUse(eu))?;
        if let Some(g) = data.geom {
            if !self.edge_geom(g)?.users.contains(&eu) {
                return broken(TopologyError::InvalidTopology(
                    "edge geometry does not list its use".into(),
                ));
            }
        }
        check_radial_parity(self, eu)
    }

    fn check_vertexuse(&self, vu: VertexUseId, parent: VertexUseParent) -> Result<()> {
        let data = self.vertexuse(vu)?;
        if data.parent != parent {
            return broken(TopologyError::WrongParent("vertexuse is owned elsewhere".into()));
        }
        if !self.vertex(data.vertex)?.uses.contains(&vu) {
            return broken(TopologyError::MateMismatch(
                "vertex does not list its use".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::euler::{make_edge, make_loop, make_region};

    #[test]
    fn fresh_model_verifies() {
        let mut model = Model::new();
        make_region(&mut model).unwrap();
        model.verify().unwrap();
    }

    #[test]
    fn broken_ring_is_reported() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let eu = make_edge(&mut model, None, None, s).unwrap();
        let mate = model.edgeuse(eu).unwrap().mate;
        model.edgeuse_mut(mate).unwrap().mate = mate;
        assert!(model.verify_shell(s).is_err());
    }

    #[test]
    fn loopuse_orientation_mismatch_is_reported() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let lu = make_loop(&mut model, LoopUseParent::Shell(s), None, Orientation::Same).unwrap();
        let mate = model.loopuse(lu).unwrap().mate;
        model.loopuse_mut(mate).unwrap().orientation = Orientation::Opposite;
        let err = model.verify().unwrap_err();
        assert!(matches!(
            err,
            crate::TopolisError::Topology(TopologyError::OrientationClash(_))
        ));
    }

    #[test]
    fn empty_shell_is_invalid() {
        let mut model = Model::new();
        let (_, s) = make_region(&mut model).unwrap();
        let vu = model.shell(s).unwrap().vertexuse.unwrap();
        crate::euler::kill_vertexuse(&mut model, vu).unwrap();
        assert!(model.verify().is_err());
    }
}
