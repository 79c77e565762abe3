use std::ops::{BitOr, BitOrAssign};

/// Debug switches carried by a [`crate::topology::Model`].
///
/// Trace output itself goes through `tracing`; these flags only decide
/// whether the more expensive diagnostics run at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DebugFlags(u32);

impl DebugFlags {
    pub const NONE: Self = Self(0);
    /// Per-operation summaries.
    pub const BASIC: Self = Self(1);
    /// Step-by-step loop cutting, splitting and joining.
    pub const CUTLOOP: Self = Self(1 << 1);
    /// Full model verification after each composite operation.
    pub const VERIFY: Self = Self(1 << 2);
    /// Radial fan dumps while fixing parity.
    pub const RADIAL: Self = Self(1 << 3);

    /// Raw bit value.
    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl BitOr for DebugFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DebugFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_flags_contain_each_part() {
        let flags = DebugFlags::BASIC | DebugFlags::VERIFY;
        assert!(flags.contains(DebugFlags::BASIC));
        assert!(flags.contains(DebugFlags::VERIFY));
        assert!(!flags.contains(DebugFlags::RADIAL));
    }

    #[test]
    fn none_contains_nothing() {
        assert!(!DebugFlags::NONE.contains(DebugFlags::NONE));
        assert_eq!(DebugFlags::default().bits(), 0);
    }
}
