use super::edge::EdgeUseId;
use super::vertex::VertexId;

/// One bit per model index, for "seen this already" checks during walks.
///
/// Sized from [`super::Model::max_index`] and grows on demand, so indices
/// allocated after creation are still accepted.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    bits: Vec<u64>,
}

impl VisitedSet {
    /// A set able to hold indices below `capacity` without reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: vec![0; capacity.div_ceil(64)],
        }
    }

    #[must_use]
    pub fn test(&self, index: usize) -> bool {
        self.bits
            .get(index / 64)
            .is_some_and(|word| word & (1 << (index % 64)) != 0)
    }

    pub fn set(&mut self, index: usize) {
        let word = index / 64;
        if word >= self.bits.len() {
            self.bits.resize(word + 1, 0);
        }
        self.bits[word] |= 1 << (index % 64);
    }

    /// Marks `index` and reports whether it was already marked.
    pub fn test_and_set(&mut self, index: usize) -> bool {
        let was = self.test(index);
        self.set(index);
        was
    }
}

/// Maps original elements to their duplicates, keyed by model index.
///
/// Used while copying faces and loops so that a vertex referenced several
/// times is duplicated exactly once.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    vertices: Vec<Option<VertexId>>,
    edgeuses: Vec<Option<EdgeUseId>>,
}

impl TranslationTable {
    /// A table pre-sized for indices below `capacity`.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: vec![None; capacity],
            edgeuses: vec![None; capacity],
        }
    }

    #[must_use]
    pub fn vertex(&self, index: usize) -> Option<VertexId> {
        self.vertices.get(index).copied().flatten()
    }

    pub fn insert_vertex(&mut self, index: usize, copy: VertexId) {
        if index >= self.vertices.len() {
            self.vertices.resize(index + 1, None);
        }
        self.vertices[index] = Some(copy);
    }

    #[must_use]
    pub fn edgeuse(&self, index: usize) -> Option<EdgeUseId> {
        self.edgeuses.get(index).copied().flatten()
    }

    pub fn insert_edgeuse(&mut self, index: usize, copy: EdgeUseId) {
        if index >= self.edgeuses.len() {
            self.edgeuses.resize(index + 1, None);
        }
        self.edgeuses[index] = Some(copy);
    }
}
