//! Produced-type handle.
//!
//! `Idx` is the canonical representation of a produced type: a 32-bit index
//! into the unified [`Pool`](crate::Pool). Unions and intersections are
//! interned in canonical form, so structural equality of canonical types is
//! index equality.

use std::fmt;

/// A 32-bit index into the type pool.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Idx(u32);

impl Idx {
    /// The bottom type `Nothing` (pre-interned, subtype of everything).
    pub const NOTHING: Self = Self(0);

    /// The unknown/error sentinel (pre-interned, silently satisfies
    /// assignability so one upstream error never cascades).
    pub const UNKNOWN: Self = Self(1);

    /// Number of pre-interned types.
    pub const PRE_INTERNED: u32 = 2;

    /// Sentinel value indicating no type / not yet computed.
    pub const NONE: Self = Self(u32::MAX);

    /// Create an index from a raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// True when this is the `NONE` sentinel.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// True when this is a real pool index.
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Idx::NOTHING => write!(f, "Idx(Nothing)"),
            Idx::UNKNOWN => write!(f, "Idx(Unknown)"),
            Idx::NONE => write!(f, "Idx(NONE)"),
            Idx(raw) => write!(f, "Idx({raw})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels() {
        assert!(Idx::NONE.is_none());
        assert!(Idx::NOTHING.is_some());
        assert_ne!(Idx::NOTHING, Idx::UNKNOWN);
    }
}
