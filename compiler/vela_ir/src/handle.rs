//! Opaque u32 handles shared between the front end and the semantic core.
//!
//! The declaration graph and resolved types live in `vela_types`; the AST
//! refers to them through these indices so the IR crate stays independent
//! of the type model. `NONE` sentinels mark unresolved references; the
//! core maps those to the unknown type instead of dereferencing them.

use std::fmt;

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Sentinel for "no value" / unresolved.
            pub const NONE: Self = Self(u32::MAX);

            /// Create from a raw index.
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw index.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// True when this is the `NONE` sentinel.
            #[inline]
            pub const fn is_none(self) -> bool {
                self.0 == u32::MAX
            }

            /// True when this is a real index.
            #[inline]
            pub const fn is_some(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_none() {
                    write!(f, concat!(stringify!($name), "(NONE)"))
                } else {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                }
            }
        }
    };
}

handle! {
    /// Index of an expression in the [`ExprArena`](crate::ExprArena).
    ExprId
}

handle! {
    /// Index of a statement in the arena.
    StmtId
}

handle! {
    /// Index of a block (statement list) in the arena.
    BlockId
}

handle! {
    /// Resolved declaration handle (index into the semantic `DeclTable`).
    DeclRef
}

handle! {
    /// Resolved type handle (index into the semantic type pool), produced by
    /// the type visitor for explicitly written annotations.
    TypeRef
}
