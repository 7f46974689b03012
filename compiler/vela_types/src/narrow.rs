//! Flow-sensitive narrowing.
//!
//! Computes the branch-local type of a tested reference for `is`/`exists`/
//! `nonempty` conditions and their complements, and the positional/entry
//! decompositions destructuring patterns rely on. Narrowed types are fresh
//! produced types; the checker stores them in branch-local scope maps, never
//! on the original node.

use crate::{Idx, Model, TypeData};

/// The outcome of narrowing a tested reference.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Narrowed {
    /// Type inside the branch where the condition holds.
    pub if_true: Idx,
    /// Type inside the complement branch.
    pub if_false: Idx,
    /// The condition can never hold (the positive type collapsed to
    /// `Nothing`): the guarded branch is statically unreachable.
    pub never_holds: bool,
    /// The condition always holds: the test provides no information.
    pub always_holds: bool,
}

impl Model {
    /// Narrow the known type `k` of a tested reference by `is T` (or its
    /// negation).
    pub fn narrow_is(&mut self, t: Idx, k: Idx, negated: bool) -> Narrowed {
        if self.pool.is_unknown(t) || self.pool.is_unknown(k) {
            return Narrowed {
                if_true: Idx::UNKNOWN,
                if_false: Idx::UNKNOWN,
                never_holds: false,
                always_holds: false,
            };
        }
        let positive = if self.is_subtype(k, t) {
            // Already known to satisfy the test: the type is unchanged and
            // the condition is redundant.
            k
        } else {
            self.intersection_of(vec![t, k])
        };
        let negative = self.minus(k, t);
        let (if_true, if_false) = if negated {
            (negative, positive)
        } else {
            (positive, negative)
        };
        Narrowed {
            if_true,
            if_false,
            never_holds: if_true == Idx::NOTHING,
            always_holds: if_false == Idx::NOTHING,
        }
    }

    /// Narrow by `exists` (or `!exists`): remove/retain the null case.
    ///
    /// `exists x` is `x !is Null`, so the non-negated form routes through
    /// the negated `is` computation.
    pub fn narrow_exists(&mut self, k: Idx, negated: bool) -> Narrowed {
        let null = self.null_type();
        self.narrow_is(null, k, !negated)
    }

    /// Narrow by `nonempty` (or `!nonempty`): remove/retain the empty case.
    pub fn narrow_nonempty(&mut self, k: Idx, negated: bool) -> Narrowed {
        let empty = self.empty_type();
        self.narrow_is(empty, k, !negated)
    }

    /// Set difference over the union structure of `k`: the part of `k` not
    /// subsumed by `t`.
    ///
    /// Returns `Nothing` when `k` is entirely subsumed, and `k` unchanged
    /// when the test removes no case (the caller diagnoses that as a
    /// no-information condition). Enumerated types are expanded one level so
    /// `Anything minus Null` is `Object`, not `Anything`.
    pub fn minus(&mut self, k: Idx, t: Idx) -> Idx {
        let k = self.resolve_aliases(k);
        if self.pool.is_unknown(k) || self.pool.is_unknown(t) {
            return Idx::UNKNOWN;
        }
        if self.is_subtype(k, t) {
            return Idx::NOTHING;
        }
        match self.pool.data(k).clone() {
            TypeData::Union(cases) => {
                let remaining: Vec<Idx> = cases
                    .iter()
                    .map(|&c| self.minus(c, t))
                    .filter(|&c| c != Idx::NOTHING)
                    .collect();
                self.union_of(remaining)
            }
            TypeData::Intersection(parts) => {
                // Subtract through each member; keep the intersection shape.
                let narrowed: Vec<Idx> = parts.iter().map(|&p| self.minus(p, t)).collect();
                self.intersection_of(narrowed)
            }
            _ => {
                if let Some(expanded) = self.case_union(k) {
                    if expanded != k {
                        let removed = self.minus(expanded, t);
                        if removed != expanded {
                            return removed;
                        }
                    }
                }
                k
            }
        }
    }

    /// The definite (non-null) form of a type.
    pub fn definite(&mut self, k: Idx) -> Idx {
        let null = self.null_type();
        self.minus(k, null)
    }

    /// Positional element type for destructuring: element `i` of a tuple,
    /// or the element type of a homogeneous sequence.
    pub fn element_type(&mut self, ty: Idx, index: usize) -> Option<Idx> {
        let ty = self.resolve_aliases(ty);
        match self.pool.data(ty).clone() {
            TypeData::Tuple { elems, tail } => elems.get(index).copied().or(tail),
            _ => {
                let seq = self.supertype(ty, self.lang.sequential)?;
                self.pool.args_of(seq).first().copied()
            }
        }
    }

    /// The tail type of a value after stripping a fixed prefix of `n`
    /// elements: `[X, Y, Z]` minus 2 is `[Z]`; a homogeneous sequence keeps
    /// its own type.
    pub fn tail_type(&mut self, ty: Idx, n: usize) -> Option<Idx> {
        let ty = self.resolve_aliases(ty);
        match self.pool.data(ty).clone() {
            TypeData::Tuple { elems, tail } => {
                if n > elems.len() && tail.is_none() {
                    return None;
                }
                let rest: Vec<Idx> = elems.iter().skip(n).copied().collect();
                Some(self.tuple_of(rest, tail))
            }
            _ => {
                let seq = self.supertype(ty, self.lang.sequential)?;
                let elem = self.pool.args_of(seq).first().copied()?;
                Some(self.sequential_of(elem))
            }
        }
    }

    /// Split an entry-typed value into key and item types.
    pub fn entry_parts(&mut self, ty: Idx) -> Option<(Idx, Idx)> {
        let entry = self.supertype(ty, self.lang.entry)?;
        let args = self.pool.args_of(entry);
        match args {
            [k, v] => Some((*k, *v)),
            _ => None,
        }
    }
}
