/// Orientation tag of a faceuse or loopuse.
///
/// For faceuses, `Same` means the use's outward sense matches the face's
/// canonical sense. For loopuses the tag is relative to the parent faceuse:
/// `Same` is an outer boundary, `Opposite` a hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Same,
    Opposite,
    /// Not yet determined, typically right after a loop split.
    Unspecified,
    /// Marker loops placed by a boolean evaluator.
    BoolPlace,
}

impl Orientation {
    /// `Same` for `Opposite` and vice versa; other tags are returned as-is.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Same => Self::Opposite,
            Self::Opposite => Self::Same,
            other => other,
        }
    }
}
