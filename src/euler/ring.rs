//! Splicing edgeuses in and out of loop rings.
//!
//! An edgeuse ring is intrusive: `next`/`prev` live on the edgeuses and the
//! loopuse only remembers its first element. Rings of a loopuse and its mate
//! always run in opposite order, so an edgeuse placed between `a` and
//! `a.next` has its mate placed between `a.next.mate` and `a.mate`.

use crate::error::{Result, TopologyError};
use crate::topology::{EdgeUseId, EdgeUseParent, LoopContent, LoopUseId, Model};

impl Model {
    /// Makes `eu` the only member of the empty loopuse `lu`.
    pub(crate) fn ring_start(&mut self, lu: LoopUseId, eu: EdgeUseId) -> Result<()> {
        let data = self.loopuse_mut(lu)?;
        if data.content != LoopContent::Empty {
            return Err(TopologyError::InvalidTopology("loopuse is not empty".into()).into());
        }
        data.content = LoopContent::Edges(eu);
        let e = self.edgeuse_mut(eu)?;
        e.parent = EdgeUseParent::LoopUse(lu);
        e.next = eu;
        e.prev = eu;
        Ok(())
    }

    /// Links `eu` into `anchor`'s ring directly after it.
    pub(crate) fn ring_insert_after(&mut self, anchor: EdgeUseId, eu: EdgeUseId) -> Result<()> {
        let a = self.edgeuse(anchor)?;
        let (parent, next) = (a.parent, a.next);
        {
            let e = self.edgeuse_mut(eu)?;
            e.parent = parent;
            e.prev = anchor;
            e.next = next;
        }
        self.edgeuse_mut(anchor)?.next = eu;
        self.edgeuse_mut(next)?.prev = eu;
        Ok(())
    }

    /// Links `eu` into `anchor`'s ring directly before it.
    pub(crate) fn ring_insert_before(&mut self, anchor: EdgeUseId, eu: EdgeUseId) -> Result<()> {
        let prev = self.edgeuse(anchor)?.prev;
        self.ring_insert_after(prev, eu)
    }

    /// Removes `eu` from its ring, leaving it self-linked.
    ///
    /// The owning loopuse's first pointer moves on if it pointed at `eu`;
    /// removing the last member leaves the loopuse `Empty`.
    pub(crate) fn ring_unlink(&mut self, eu: EdgeUseId) -> Result<()> {
        let data = self.edgeuse(eu)?;
        let (parent, next, prev) = (data.parent, data.next, data.prev);
        if let EdgeUseParent::LoopUse(lu) = parent {
            let l = self.loopuse_mut(lu)?;
            if l.content == LoopContent::Edges(eu) {
                l.content = if next == eu {
                    LoopContent::Empty
                } else {
                    LoopContent::Edges(next)
                };
            }
        }
        if next != eu {
            self.edgeuse_mut(prev)?.next = next;
            self.edgeuse_mut(next)?.prev = prev;
        }
        let e = self.edgeuse_mut(eu)?;
        e.next = eu;
        e.prev = eu;
        Ok(())
    }

    /// Places the pair `eu`/`mate` after `anchor`, mirrored in the mate loop.
    pub(crate) fn ring_insert_pair_after(
        &mut self,
        anchor: EdgeUseId,
        eu: EdgeUseId,
        mate: EdgeUseId,
    ) -> Result<()> {
        let anchor_mate = self.edgeuse(anchor)?.mate;
        self.ring_insert_after(anchor, eu)?;
        self.ring_insert_before(anchor_mate, mate)
    }

    /// Appends the pair `eu`/`mate` at the tail of `lu`, mirrored in its mate.
    pub(crate) fn ring_append_pair(
        &mut self,
        lu: LoopUseId,
        eu: EdgeUseId,
        mate: EdgeUseId,
    ) -> Result<()> {
        match self.loopuse(lu)?.content {
            LoopContent::Edges(first) => {
                let last = self.edgeuse(first)?.prev;
                self.ring_insert_pair_after(last, eu, mate)
            }
            LoopContent::Empty => {
                let lumate = self.loopuse(lu)?.mate;
                self.ring_start(lu, eu)?;
                self.ring_start(lumate, mate)
            }
            LoopContent::Vertex(_) => Err(TopologyError::InvalidTopology(
                "cannot append edges to a self-loop".into(),
            )
            .into()),
        }
    }

    /// Moves the pair of `eu` out of its loops and appends it to `lu`.
    pub(crate) fn ring_move_pair(&mut self, eu: EdgeUseId, lu: LoopUseId) -> Result<()> {
        let mate = self.edgeuse(eu)?.mate;
        self.ring_unlink(eu)?;
        self.ring_unlink(mate)?;
        self.ring_append_pair(lu, eu, mate)
    }
}
