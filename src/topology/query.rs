//! Read-only traversal and search over the use graph.

use crate::error::{GeometryError, Result, TopologyError};
use crate::math::Point3;

use super::{
    EdgeId, EdgeUseId, EdgeUseParent, FaceGeomId, FaceUseId, LoopContent, LoopId, LoopUseId,
    LoopUseParent, Model, ShellId, VertexId, VertexUseId, VertexUseParent,
};

/// Where a vertexuse sits, resolved through its parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseContext {
    /// Inside a loop of a face.
    Face(FaceUseId),
    /// Inside a loop that belongs straight to a shell.
    WireLoop(LoopUseId),
    /// On a wire edge.
    WireEdge(EdgeUseId),
    /// The shell's lone point.
    Lone(ShellId),
}

impl Model {
    /// The edgeuses of a loopuse in ring order, starting at its first one.
    /// Self-loops and empty loops yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring is broken.
    pub fn loop_edgeuses(&self, lu: LoopUseId) -> Result<Vec<EdgeUseId>> {
        let LoopContent::Edges(first) = self.loopuse(lu)?.content else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        let mut eu = first;
        loop {
            let data = self.edgeuse(eu)?;
            if data.parent != EdgeUseParent::LoopUse(lu) {
                return Err(TopologyError::WrongParent("edgeuse ring leaves its loopuse".into()).into());
            }
            out.push(eu);
            eu = data.next;
            if eu == first {
                return Ok(out);
            }
            if out.len() > self.edgeuses.len() {
                return Err(TopologyError::LoopNotClosed("edgeuse ring does not cycle".into()).into());
            }
        }
    }

    /// Number of edgeuses in a loopuse; zero for self-loops.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring is broken.
    pub fn loop_edge_count(&self, lu: LoopUseId) -> Result<usize> {
        Ok(self.loop_edgeuses(lu)?.len())
    }

    /// Returns `true` if the loopuse is a self-loop on one vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the loopuse does not exist.
    pub fn is_vertex_loop(&self, lu: LoopUseId) -> Result<bool> {
        Ok(matches!(self.loopuse(lu)?.content, LoopContent::Vertex(_)))
    }

    /// Start vertices of the loop's edgeuses, or the single vertex of a self-loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring is broken.
    pub fn loop_vertices(&self, lu: LoopUseId) -> Result<Vec<VertexId>> {
        match self.loopuse(lu)?.content {
            LoopContent::Empty => Ok(Vec::new()),
            LoopContent::Vertex(vu) => Ok(vec![self.vertexuse(vu)?.vertex]),
            LoopContent::Edges(_) => self
                .loop_edgeuses(lu)?
                .into_iter()
                .map(|eu| self.eu_start_vertex(eu))
                .collect(),
        }
    }

    /// Points of [`Model::loop_vertices`].
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Missing`] if any vertex has no point.
    pub fn loop_points(&self, lu: LoopUseId) -> Result<Vec<Point3>> {
        self.loop_vertices(lu)?
            .into_iter()
            .map(|v| self.vertex_point(v))
            .collect()
    }

    /// The point of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Missing`] if the vertex has no point.
    pub fn vertex_point(&self, v: VertexId) -> Result<Point3> {
        self.vertex(v)?
            .point
            .ok_or_else(|| GeometryError::Missing("vertex has no point".into()).into())
    }

    /// Start vertex of an edgeuse.
    ///
    /// # Errors
    ///
    /// Returns an error if the edgeuse or its vertexuse does not exist.
    pub fn eu_start_vertex(&self, eu: EdgeUseId) -> Result<VertexId> {
        let vu = self.edgeuse(eu)?.vertexuse;
        Ok(self.vertexuse(vu)?.vertex)
    }

    /// End vertex of an edgeuse, which is where its mate starts.
    ///
    /// # Errors
    ///
    /// Returns an error if the edgeuse or its mate does not exist.
    pub fn eu_end_vertex(&self, eu: EdgeUseId) -> Result<VertexId> {
        self.eu_start_vertex(self.edgeuse(eu)?.mate)
    }

    /// The loopuse owning an edgeuse, if it is not a wire edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edgeuse does not exist.
    pub fn loopuse_of_edgeuse(&self, eu: EdgeUseId) -> Result<Option<LoopUseId>> {
        Ok(match self.edgeuse(eu)?.parent {
            EdgeUseParent::LoopUse(lu) => Some(lu),
            EdgeUseParent::Shell(_) => None,
        })
    }

    /// The faceuse owning a loopuse, if it is not a wire loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the loopuse does not exist.
    pub fn faceuse_of_loopuse(&self, lu: LoopUseId) -> Result<Option<FaceUseId>> {
        Ok(match self.loopuse(lu)?.parent {
            LoopUseParent::FaceUse(fu) => Some(fu),
            LoopUseParent::Shell(_) => None,
        })
    }

    /// The faceuse an edgeuse belongs to, through its loop.
    ///
    /// # Errors
    ///
    /// Returns an error if an element on the way does not exist.
    pub fn faceuse_of_edgeuse(&self, eu: EdgeUseId) -> Result<Option<FaceUseId>> {
        match self.loopuse_of_edgeuse(eu)? {
            Some(lu) => self.faceuse_of_loopuse(lu),
            None => Ok(None),
        }
    }

    /// # Errors
    ///
    /// Returns an error if an element on the way does not exist.
    pub fn shell_of_loopuse(&self, lu: LoopUseId) -> Result<ShellId> {
        Ok(match self.loopuse(lu)?.parent {
            LoopUseParent::Shell(s) => s,
            LoopUseParent::FaceUse(fu) => self.faceuse(fu)?.shell,
        })
    }

    /// # Errors
    ///
    /// Returns an error if an element on the way does not exist.
    pub fn shell_of_edgeuse(&self, eu: EdgeUseId) -> Result<ShellId> {
        match self.edgeuse(eu)?.parent {
            EdgeUseParent::Shell(s) => Ok(s),
            EdgeUseParent::LoopUse(lu) => self.shell_of_loopuse(lu),
        }
    }

    /// # Errors
    ///
    /// Returns an error if an element on the way does not exist.
    pub fn shell_of_vertexuse(&self, vu: VertexUseId) -> Result<ShellId> {
        match self.vertexuse(vu)?.parent {
            VertexUseParent::Shell(s) => Ok(s),
            VertexUseParent::LoopUse(lu) => self.shell_of_loopuse(lu),
            VertexUseParent::EdgeUse(eu) => self.shell_of_edgeuse(eu),
        }
    }

    /// Resolves what kind of structure a vertexuse is part of.
    ///
    /// # Errors
    ///
    /// Returns an error if an element on the way does not exist.
    pub fn vertexuse_context(&self, vu: VertexUseId) -> Result<UseContext> {
        let lu = match self.vertexuse(vu)?.parent {
            VertexUseParent::Shell(s) => return Ok(UseContext::Lone(s)),
            VertexUseParent::LoopUse(lu) => lu,
            VertexUseParent::EdgeUse(eu) => match self.edgeuse(eu)?.parent {
                EdgeUseParent::Shell(_) => return Ok(UseContext::WireEdge(eu)),
                EdgeUseParent::LoopUse(lu) => lu,
            },
        };
        Ok(match self.loopuse(lu)?.parent {
            LoopUseParent::FaceUse(fu) => UseContext::Face(fu),
            LoopUseParent::Shell(_) => UseContext::WireLoop(lu),
        })
    }

    /// One edgeuse per use pair around the edge, walking `mate` then
    /// `radial` from `eu`. The first entry is `eu` itself.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::RadialBroken`] if the walk does not return
    /// to `eu`.
    pub fn radial_pairs(&self, eu: EdgeUseId) -> Result<Vec<EdgeUseId>> {
        let mut out = Vec::new();
        let mut cur = eu;
        loop {
            out.push(cur);
            let mate = self.edgeuse(cur)?.mate;
            cur = self.edgeuse(mate)?.radial;
            if cur == eu {
                return Ok(out);
            }
            if out.len() > self.edgeuses.len() {
                return Err(TopologyError::RadialBroken("radial walk does not close".into()).into());
            }
        }
    }

    /// Number of edgeuses referencing `edge`, counted by scanning the arena.
    #[must_use]
    pub fn edge_use_count(&self, edge: EdgeId) -> usize {
        self.edgeuses.values().filter(|eu| eu.edge == edge).count()
    }

    /// An edgeuse in `shell` running from `a` to `b`, if there is one.
    ///
    /// Every edge between the two vertices has a use starting at `a`, so
    /// this finds edges in either direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex or one of its uses does not exist.
    pub fn find_edge_between(
        &self,
        shell: ShellId,
        a: VertexId,
        b: VertexId,
    ) -> Result<Option<EdgeUseId>> {
        for &vu in &self.vertex(a)?.uses {
            let VertexUseParent::EdgeUse(eu) = self.vertexuse(vu)?.parent else {
                continue;
            };
            if self.eu_end_vertex(eu)? == b && self.shell_of_edgeuse(eu)? == shell {
                return Ok(Some(eu));
            }
        }
        Ok(None)
    }

    /// Like [`Model::find_edge_between`], but over the whole model and
    /// skipping `exclude`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex or one of its uses does not exist.
    pub fn find_other_edge_between(
        &self,
        a: VertexId,
        b: VertexId,
        exclude: EdgeId,
    ) -> Result<Option<EdgeUseId>> {
        for &vu in &self.vertex(a)?.uses {
            let VertexUseParent::EdgeUse(eu) = self.vertexuse(vu)?.parent else {
                continue;
            };
            if self.edgeuse(eu)?.edge != exclude && self.eu_end_vertex(eu)? == b {
                return Ok(Some(eu));
            }
        }
        Ok(None)
    }

    /// Another vertexuse of the same vertex inside the same loopuse.
    ///
    /// # Errors
    ///
    /// Returns an error if `vu` is not the start of an edgeuse in a loop.
    pub fn find_repeated_vertex_in_loop(&self, vu: VertexUseId) -> Result<Option<VertexUseId>> {
        let data = self.vertexuse(vu)?;
        let VertexUseParent::EdgeUse(eu) = data.parent else {
            return Err(TopologyError::WrongParent("vertexuse is not on an edgeuse".into()).into());
        };
        let Some(lu) = self.loopuse_of_edgeuse(eu)? else {
            return Err(TopologyError::WrongParent("edgeuse is a wire edge".into()).into());
        };
        for &other in &self.vertex(data.vertex)?.uses {
            if other == vu {
                continue;
            }
            if let VertexUseParent::EdgeUse(other_eu) = self.vertexuse(other)?.parent {
                if self.edgeuse(other_eu)?.parent == EdgeUseParent::LoopUse(lu) {
                    return Ok(Some(other));
                }
            }
        }
        Ok(None)
    }

    /// A faceuse in `shell` whose face uses geometry `geom`.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell or one of its faces does not exist.
    pub fn find_faceuse_with_geometry(
        &self,
        shell: ShellId,
        geom: FaceGeomId,
    ) -> Result<Option<FaceUseId>> {
        for &fu in &self.shell(shell)?.faceuses {
            let face = self.faceuse(fu)?.face;
            if self.face(face)?.geom == Some(geom) {
                return Ok(Some(fu));
            }
        }
        Ok(None)
    }

    /// Returns `true` if the vertex is used by a face loop of `shell`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex or one of its uses does not exist.
    pub fn is_vertex_in_facelist(&self, shell: ShellId, v: VertexId) -> Result<bool> {
        self.vertex_used_by(shell, v, |ctx| matches!(ctx, UseContext::Face(_)))
    }

    /// Returns `true` if the vertex is used by a wire loop of `shell`.
    /// Self-loops only count when `singletons` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex or one of its uses does not exist.
    pub fn is_vertex_in_looplist(&self, shell: ShellId, v: VertexId, singletons: bool) -> Result<bool> {
        for &vu in &self.vertex(v)?.uses {
            if self.shell_of_vertexuse(vu)? != shell {
                continue;
            }
            if let UseContext::WireLoop(_) = self.vertexuse_context(vu)? {
                if singletons || matches!(self.vertexuse(vu)?.parent, VertexUseParent::EdgeUse(_)) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Returns `true` if the vertex is used by a wire edge of `shell`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex or one of its uses does not exist.
    pub fn is_vertex_in_edgelist(&self, shell: ShellId, v: VertexId) -> Result<bool> {
        self.vertex_used_by(shell, v, |ctx| matches!(ctx, UseContext::WireEdge(_)))
    }

    fn vertex_used_by(
        &self,
        shell: ShellId,
        v: VertexId,
        accept: impl Fn(UseContext) -> bool,
    ) -> Result<bool> {
        for &vu in &self.vertex(v)?.uses {
            if self.shell_of_vertexuse(vu)? == shell && accept(self.vertexuse_context(vu)?) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns `true` if some face loop of `shell` uses `edge`.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge's fan is broken.
    pub fn is_edge_in_facelist(&self, shell: ShellId, edge: EdgeId) -> Result<bool> {
        self.edge_used_by(shell, edge, |model, eu| {
            Ok(model.faceuse_of_edgeuse(eu)?.is_some())
        })
    }

    /// Returns `true` if some wire loop of `shell` uses `edge`.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge's fan is broken.
    pub fn is_edge_in_looplist(&self, shell: ShellId, edge: EdgeId) -> Result<bool> {
        self.edge_used_by(shell, edge, |model, eu| {
            Ok(match model.loopuse_of_edgeuse(eu)? {
                Some(lu) => model.faceuse_of_loopuse(lu)?.is_none(),
                None => false,
            })
        })
    }

    fn edge_used_by(
        &self,
        shell: ShellId,
        edge: EdgeId,
        accept: impl Fn(&Self, EdgeUseId) -> Result<bool>,
    ) -> Result<bool> {
        let start = self.edge(edge)?.edgeuse;
        for pair in self.radial_pairs(start)? {
            let mate = self.edgeuse(pair)?.mate;
            for eu in [pair, mate] {
                if self.shell_of_edgeuse(eu)? == shell && accept(self, eu)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Returns `true` if some face of `shell` has a use of loop `lp`.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell or one of its faces does not exist.
    pub fn is_loop_in_facelist(&self, shell: ShellId, lp: LoopId) -> Result<bool> {
        for &fu in &self.shell(shell)?.faceuses {
            for &lu in &self.faceuse(fu)?.loopuses {
                if self.loopuse(lu)?.lp == lp {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Returns `true` if another edgeuse of the same loop runs back over
    /// `eu`, from its end to its start.
    ///
    /// # Errors
    ///
    /// Returns an error if `eu` is not in a loop or the ring is broken.
    pub fn edgeuse_in_crack(&self, eu: EdgeUseId) -> Result<bool> {
        let Some(lu) = self.loopuse_of_edgeuse(eu)? else {
            return Err(TopologyError::WrongParent("edgeuse is a wire edge".into()).into());
        };
        let start = self.eu_start_vertex(eu)?;
        let end = self.eu_end_vertex(eu)?;
        for other in self.loop_edgeuses(lu)? {
            if other != eu
                && self.eu_start_vertex(other)? == end
                && self.eu_end_vertex(other)? == start
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns `true` if the loopuse is a two-edge crack: `A -> B -> A`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring is broken.
    pub fn is_crack_loop(&self, lu: LoopUseId) -> Result<bool> {
        let eus = self.loop_edgeuses(lu)?;
        if eus.len() != 2 {
            return Ok(false);
        }
        Ok(self.eu_start_vertex(eus[0])? == self.eu_end_vertex(eus[1])?
            && self.eu_end_vertex(eus[0])? == self.eu_start_vertex(eus[1])?)
    }
}
