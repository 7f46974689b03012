//! The unified type pool.
//!
//! Every produced type is interned here and referenced by [`Idx`]. The pool
//! deduplicates structurally, and union/intersection members are stored in
//! canonical sorted order (see the canonicalization routines on `Model`), so
//! equality of canonical types is index equality.
//!
//! Produced types are immutable values: substitution, narrowing, and
//! union/intersection formation intern new entries, never mutate existing
//! ones.

use rustc_hash::FxHashMap;

use crate::{DeclId, Idx};

/// Use-site variance of one type argument.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum SiteVariance {
    /// Use the parameter's declared variance.
    #[default]
    Inherited,
    /// Use-site covariant (`out`).
    Out,
    /// Use-site contravariant (`in`).
    In,
}

/// Interned representation of a produced type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeData {
    /// The bottom type: subtype of every type, no values.
    Nothing,

    /// The contagious error sentinel for unresolved or erroneous input.
    Unknown,

    /// A use of a type declaration with bound type arguments.
    ///
    /// Invariant: `args.len()` equals the declaration's type-parameter count
    /// (defaults already elided) and `variances.len() == args.len()`.
    Nominal {
        decl: DeclId,
        /// Instantiation of the containing type, for nested members.
        qualifying: Option<Idx>,
        args: Box<[Idx]>,
        variances: Box<[SiteVariance]>,
    },

    /// A union of case types.
    ///
    /// Canonical: flattened, deduplicated, sorted by raw index. Redundant
    /// supertypes are kept; exhaustiveness over the case set needs them.
    Union(Box<[Idx]>),

    /// An intersection of satisfied types.
    ///
    /// Canonical: flattened, absorbed (members that are supertypes of other
    /// members removed), sorted; collapses to `Nothing` when two members are
    /// disjoint. Never empty.
    Intersection(Box<[Idx]>),

    /// A tuple: fixed element prefix plus optional homogeneous tail element
    /// type. `[X, Y]` is `elems: [X, Y], tail: None`; `[X, Y, Z*]` carries
    /// `tail: Some(Z)`. At least one of the two parts is non-empty.
    Tuple {
        elems: Box<[Idx]>,
        tail: Option<Idx>,
    },

    /// A structural callable: contravariant in `args` (a tuple type),
    /// covariant in `ret`.
    Callable { ret: Idx, args: Idx },
}

/// The type pool: interned storage for all produced types.
pub struct Pool {
    data: Vec<TypeData>,
    dedup: FxHashMap<TypeData, Idx>,
}

impl Pool {
    /// Create a pool with the sentinels pre-interned.
    pub fn new() -> Self {
        let mut pool = Pool {
            data: Vec::with_capacity(64),
            dedup: FxHashMap::default(),
        };
        let nothing = pool.intern(TypeData::Nothing);
        let unknown = pool.intern(TypeData::Unknown);
        debug_assert_eq!(nothing, Idx::NOTHING);
        debug_assert_eq!(unknown, Idx::UNKNOWN);
        pool
    }

    /// Intern a type, returning its index.
    pub fn intern(&mut self, data: TypeData) -> Idx {
        if let Some(&idx) = self.dedup.get(&data) {
            return idx;
        }
        let idx = Idx::from_raw(u32::try_from(self.data.len()).unwrap_or(u32::MAX));
        self.data.push(data.clone());
        self.dedup.insert(data, idx);
        idx
    }

    /// Look up interned type data.
    pub fn data(&self, idx: Idx) -> &TypeData {
        &self.data[idx.raw() as usize]
    }

    /// Number of interned types.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when only the sentinels are interned.
    pub fn is_empty(&self) -> bool {
        self.data.len() <= Idx::PRE_INTERNED as usize
    }

    /// An instantiation with declared use-site variance on every argument.
    pub fn nominal(&mut self, decl: DeclId, args: &[Idx]) -> Idx {
        self.intern(TypeData::Nominal {
            decl,
            qualifying: None,
            args: args.into(),
            variances: vec![SiteVariance::Inherited; args.len()].into(),
        })
    }

    /// A non-generic instantiation.
    pub fn simple(&mut self, decl: DeclId) -> Idx {
        self.nominal(decl, &[])
    }

    /// An instantiation with explicit use-site variances.
    pub fn nominal_with_variances(
        &mut self,
        decl: DeclId,
        qualifying: Option<Idx>,
        args: &[Idx],
        variances: &[SiteVariance],
    ) -> Idx {
        debug_assert_eq!(args.len(), variances.len());
        self.intern(TypeData::Nominal {
            decl,
            qualifying,
            args: args.into(),
            variances: variances.into(),
        })
    }

    /// A structural callable type.
    pub fn callable(&mut self, ret: Idx, args: Idx) -> Idx {
        self.intern(TypeData::Callable { ret, args })
    }

    /// True for the unknown sentinel.
    #[inline]
    pub fn is_unknown(&self, idx: Idx) -> bool {
        idx == Idx::UNKNOWN
    }

    /// True for the bottom type.
    #[inline]
    pub fn is_nothing(&self, idx: Idx) -> bool {
        idx == Idx::NOTHING
    }

    /// The declaration of a nominal type, if it is one.
    pub fn decl_of(&self, idx: Idx) -> Option<DeclId> {
        match self.data(idx) {
            TypeData::Nominal { decl, .. } => Some(*decl),
            _ => None,
        }
    }

    /// The type arguments of a nominal type (empty for others).
    pub fn args_of(&self, idx: Idx) -> &[Idx] {
        match self.data(idx) {
            TypeData::Nominal { args, .. } => args,
            _ => &[],
        }
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_pre_interned() {
        let pool = Pool::new();
        assert!(matches!(pool.data(Idx::NOTHING), TypeData::Nothing));
        assert!(matches!(pool.data(Idx::UNKNOWN), TypeData::Unknown));
        assert!(pool.is_empty());
    }

    #[test]
    fn interning_deduplicates() {
        let mut pool = Pool::new();
        let d = DeclId::from_raw(0);
        let a = pool.nominal(d, &[Idx::NOTHING]);
        let b = pool.nominal(d, &[Idx::NOTHING]);
        let c = pool.nominal(d, &[Idx::UNKNOWN]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.decl_of(a), Some(d));
        assert_eq!(pool.args_of(a), &[Idx::NOTHING]);
    }
}
