use thiserror::Error;

/// Top-level error type for the topolis kernel.
#[derive(Debug, Error)]
pub enum TopolisError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl From<PlaneError> for TopolisError {
    fn from(err: PlaneError) -> Self {
        Self::Geometry(GeometryError::Plane(err))
    }
}

/// Structural invariant violations.
///
/// These are caller or programmer errors: a mate that does not point back,
/// an orientation clash, an element handed to the wrong shell. They are
/// returned rather than aborting so embedding code can trap them; see
/// [`OrAbort`] for the abort-at-the-boundary behaviour.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("mate mismatch: {0}")]
    MateMismatch(String),

    #[error("orientation clash: {0}")]
    OrientationClash(String),

    #[error("element belongs to a different shell: {0}")]
    WrongShell(String),

    #[error("unexpected parent: {0}")]
    WrongParent(String),

    #[error("radial fan broken: {0}")]
    RadialBroken(String),

    #[error("loop is not closed: {0}")]
    LoopNotClosed(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Failures while deriving a face plane from its boundary.
///
/// Each variant maps to a distinct negative code through [`PlaneError::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaneError {
    #[error("first loop of the face is not an edge loop")]
    NotEdgeLoop,

    #[error("loop has fewer than three usable edges")]
    TooFewEdges,

    #[error("no three distinct non-collinear points on the loop")]
    NoDistinctPoints,

    #[error("plane built from the loop is degenerate")]
    Degenerate,

    #[error("{count} vertices lie off the computed plane")]
    VertexOffPlane { count: usize },
}

impl PlaneError {
    /// Negative status code for callers that want the classic integer form.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::NotEdgeLoop => -1,
            Self::TooFewEdges => -2,
            Self::NoDistinctPoints => -3,
            Self::Degenerate => -4,
            Self::VertexOffPlane { .. } => -5,
        }
    }
}

/// Recoverable geometric failures. The graph is left untouched.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error(transparent)]
    Plane(#[from] PlaneError),

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("missing geometry: {0}")]
    Missing(String),
}

/// Reasons an edge could not be unbroken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnbreakError {
    #[error("edge has no geometry")]
    NoGeometry,

    #[error("edge geometry is not shared by both halves")]
    TooFewGeometryUses,

    #[error("successor edge uses different geometry")]
    GeometryMismatch,

    #[error("middle vertex is used outside of edges")]
    VertexUsedOffEdge,

    #[error("middle vertex is used by an edge on other geometry")]
    VertexOnOtherGeometry,

    #[error("radial fans of the two halves differ in size")]
    RadialCountMismatch,

    #[error("a use of the first half is not followed by the second half")]
    NotSuccessor,

    #[error("second half is not bound to the same geometry radially")]
    RadialGeometryMismatch,

    #[error("middle vertex has an unexpected number of uses")]
    VertexUseCount,

    #[error("both outer vertices are the same")]
    ClosedLoop,

    #[error("mate does not share the edge geometry")]
    MateGeometryUnshared,
}

impl UnbreakError {
    /// Negative status code, `-1` through `-10`.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::NoGeometry => -1,
            Self::TooFewGeometryUses => -2,
            Self::GeometryMismatch => -3,
            Self::VertexUsedOffEdge => -4,
            Self::VertexOnOtherGeometry => -5,
            Self::RadialCountMismatch => -6,
            Self::NotSuccessor => -7,
            Self::RadialGeometryMismatch => -8,
            Self::VertexUseCount | Self::ClosedLoop => -9,
            Self::MateGeometryUnshared => -10,
        }
    }
}

/// Errors raised by composite editing operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no jaunt split keeps every touching jaunt valid")]
    NoSafeJauntSplit,

    #[error(transparent)]
    Unbreak(#[from] UnbreakError),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`TopolisError`].
pub type Result<T> = std::result::Result<T, TopolisError>;

/// Abort-on-error for top-level callers.
///
/// Internally every invariant check returns a typed error. A caller that
/// wants a process-level abort on a structural violation, the way a batch
/// boolean evaluator usually does, finishes its call chain with
/// `.or_abort()`.
pub trait OrAbort<T> {
    /// Unwraps the value or aborts with a logged diagnostic.
    ///
    /// # Panics
    ///
    /// Panics when the result is an error.
    fn or_abort(self) -> T;
}

impl<T> OrAbort<T> for Result<T> {
    fn or_abort(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(%err, "fatal topology error");
                panic!("topolis: {err}");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn plane_codes_are_distinct_and_negative() {
        let codes = [
            PlaneError::NotEdgeLoop.code(),
            PlaneError::TooFewEdges.code(),
            PlaneError::NoDistinctPoints.code(),
            PlaneError::Degenerate.code(),
            PlaneError::VertexOffPlane { count: 2 }.code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            assert!(*a < 0);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn or_abort_passes_values_through() {
        let ok: Result<u8> = Ok(7);
        assert_eq!(ok.or_abort(), 7);
    }

    #[test]
    #[should_panic(expected = "topolis")]
    fn or_abort_panics_on_error() {
        let err: Result<u8> = Err(TopologyError::InvalidTopology("broken".into()).into());
        err.or_abort();
    }
}
