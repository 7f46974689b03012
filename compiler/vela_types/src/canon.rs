//! Union/intersection canonicalization, alias resolution, denotable forms.
//!
//! Canonical form is what makes interned equality structural equality:
//! members are flattened, deduplicated, and sorted by raw index. Unions keep
//! redundant supertypes (exhaustiveness over the case set needs the full
//! list); intersections absorb them and collapse to `Nothing` on disjoint
//! members.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::{DeclKind, Idx, Model, TypeData};

type Members = SmallVec<[Idx; 4]>;

impl Model {
    /// Construct the canonical union of `members`.
    ///
    /// Flattens nested unions, drops `Nothing`, deduplicates, sorts. An
    /// unknown member makes the whole union unknown (error contagion).
    /// A union of zero members is `Nothing`.
    pub fn union_of(&mut self, members: Vec<Idx>) -> Idx {
        let mut flat = Members::new();
        let mut seen = FxHashSet::default();
        let mut work: Vec<Idx> = members;
        work.reverse();
        while let Some(m) = work.pop() {
            let m = self.resolve_aliases(m);
            match self.pool.data(m) {
                TypeData::Unknown => return Idx::UNKNOWN,
                TypeData::Nothing => {}
                TypeData::Union(cases) => {
                    let cases: Vec<Idx> = cases.to_vec();
                    for c in cases.into_iter().rev() {
                        work.push(c);
                    }
                }
                _ => {
                    if seen.insert(m) {
                        flat.push(m);
                    }
                }
            }
        }
        match flat.len() {
            0 => Idx::NOTHING,
            1 => flat[0],
            _ => {
                flat.sort_unstable_by_key(|i| i.raw());
                self.pool.intern(TypeData::Union(flat.to_vec().into()))
            }
        }
    }

    /// Construct the canonical intersection of `members`.
    ///
    /// Flattens nested intersections, drops the top type, absorbs members
    /// that are supertypes of other members, and collapses to `Nothing` when
    /// any two members are disjoint. An intersection of zero members is the
    /// top type.
    pub fn intersection_of(&mut self, members: Vec<Idx>) -> Idx {
        let mut flat = Members::new();
        let mut seen = FxHashSet::default();
        let mut work: Vec<Idx> = members;
        work.reverse();
        while let Some(m) = work.pop() {
            let m = self.resolve_aliases(m);
            match self.pool.data(m) {
                TypeData::Unknown => return Idx::UNKNOWN,
                TypeData::Nothing => return Idx::NOTHING,
                TypeData::Intersection(parts) => {
                    let parts: Vec<Idx> = parts.to_vec();
                    for p in parts.into_iter().rev() {
                        work.push(p);
                    }
                }
                _ => {
                    if !self.is_top(m) && seen.insert(m) {
                        flat.push(m);
                    }
                }
            }
        }

        // Absorption: drop any member that is a supertype of another.
        let mut kept = Members::new();
        'outer: for i in 0..flat.len() {
            for j in 0..flat.len() {
                if i != j && self.is_subtype(flat[j], flat[i]) && !self.is_subtype(flat[i], flat[j])
                {
                    continue 'outer;
                }
                // Of two structurally equal members only the first survives,
                // but dedup above already guarantees distinctness.
            }
            kept.push(flat[i]);
        }

        // Disjointness: any disjoint pair collapses the whole intersection.
        for i in 0..kept.len() {
            for j in (i + 1)..kept.len() {
                if self.disjoint(kept[i], kept[j]) {
                    return Idx::NOTHING;
                }
            }
        }

        match kept.len() {
            0 => self.anything(),
            1 => kept[0],
            _ => {
                kept.sort_unstable_by_key(|i| i.raw());
                self.pool.intern(TypeData::Intersection(kept.to_vec().into()))
            }
        }
    }

    /// Construct a tuple type; an empty shape is the `Empty` type.
    pub fn tuple_of(&mut self, elems: Vec<Idx>, tail: Option<Idx>) -> Idx {
        if elems.iter().any(|&e| self.pool.is_unknown(e))
            || tail.is_some_and(|t| self.pool.is_unknown(t))
        {
            return Idx::UNKNOWN;
        }
        if elems.is_empty() && tail.is_none() {
            return self.empty_type();
        }
        self.pool.intern(TypeData::Tuple {
            elems: elems.into(),
            tail,
        })
    }

    /// Chase type-alias indirections to the type they denote.
    ///
    /// Substitutes alias type arguments at each step. Alias cycles are
    /// rejected by the declaration-graph builder; the visited set here is a
    /// pure defensive fixed point.
    pub fn resolve_aliases(&mut self, ty: Idx) -> Idx {
        let mut current = ty;
        let mut visited = FxHashSet::default();
        loop {
            let TypeData::Nominal { decl, args, .. } = self.pool.data(current) else {
                return current;
            };
            let decl = *decl;
            let DeclKind::Alias(alias) = &self.decls.get(decl).kind else {
                return current;
            };
            if !visited.insert(decl) {
                return current;
            }
            let aliased = alias.aliased;
            let params = alias.type_params.clone();
            let args: Vec<Idx> = args.to_vec();
            let map: FxHashMap<_, _> = params.into_iter().zip(args).collect();
            current = self.substitute(aliased, &map);
        }
    }

    /// The denotable form of a type, for inferred (non-explicit)
    /// declarations: aliases are resolved all the way down so an inferred
    /// type never exposes an alias or synthetic auxiliary type.
    pub fn denotable(&mut self, ty: Idx) -> Idx {
        let resolved = self.resolve_aliases(ty);
        match self.pool.data(resolved).clone() {
            TypeData::Nothing | TypeData::Unknown => resolved,
            TypeData::Nominal {
                decl,
                qualifying,
                args,
                variances,
            } => {
                let qualifying = qualifying.map(|q| self.denotable(q));
                let args: Vec<Idx> = args.iter().map(|&a| self.denotable(a)).collect();
                self.pool
                    .nominal_with_variances(decl, qualifying, &args, &variances)
            }
            TypeData::Union(cases) => {
                let cases: Vec<Idx> = cases.iter().map(|&c| self.denotable(c)).collect();
                self.union_of(cases)
            }
            TypeData::Intersection(parts) => {
                let parts: Vec<Idx> = parts.iter().map(|&p| self.denotable(p)).collect();
                self.intersection_of(parts)
            }
            TypeData::Tuple { elems, tail } => {
                let elems: Vec<Idx> = elems.iter().map(|&e| self.denotable(e)).collect();
                let tail = tail.map(|t| self.denotable(t));
                self.tuple_of(elems, tail)
            }
            TypeData::Callable { ret, args } => {
                let ret = self.denotable(ret);
                let args = self.denotable(args);
                self.pool.callable(ret, args)
            }
        }
    }

    /// True when no value type can be a subtype of both `a` and `b`.
    ///
    /// Two class instantiations with no subtype relation either way are
    /// disjoint (single inheritance); likewise a class disjoint from every
    /// case of an enumerated type. Everything else is conservatively
    /// considered overlapping.
    pub fn disjoint(&mut self, a: Idx, b: Idx) -> bool {
        let a = self.resolve_aliases(a);
        let b = self.resolve_aliases(b);
        if a == Idx::NOTHING || b == Idx::NOTHING {
            // Nothing has no values; vacuously disjoint from everything.
            return true;
        }
        if self.pool.is_unknown(a) || self.pool.is_unknown(b) {
            return false;
        }
        // Unions: disjoint iff every case is.
        if let TypeData::Union(cs) = self.pool.data(a) {
            let cs: Vec<Idx> = cs.to_vec();
            return cs.into_iter().all(|c| self.disjoint(c, b));
        }
        if let TypeData::Union(cs) = self.pool.data(b) {
            let cs: Vec<Idx> = cs.to_vec();
            return cs.into_iter().all(|c| self.disjoint(a, c));
        }

        let class_of = |model: &Model, t: Idx| -> Option<crate::DeclId> {
            let d = model.pool.decl_of(t)?;
            matches!(model.decls.get(d).kind, DeclKind::Class(_)).then_some(d)
        };
        match (class_of(self, a), class_of(self, b)) {
            // Single inheritance: unrelated class instantiations never share
            // a value.
            (Some(_), Some(_)) => !self.is_subtype(a, b) && !self.is_subtype(b, a),
            // A class against an enumerated type: disjoint when the class
            // overlaps none of the cases.
            (Some(_), None) | (None, Some(_)) => {
                let (class_ty, other) = if class_of(self, a).is_some() {
                    (a, b)
                } else {
                    (b, a)
                };
                if self.is_subtype(class_ty, other) || self.is_subtype(other, class_ty) {
                    return false;
                }
                match self.case_union(other) {
                    Some(cases_ty) if cases_ty != other => self.disjoint(class_ty, cases_ty),
                    _ => false,
                }
            }
            (None, None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::testutil::Fixture;
    use crate::{Idx, TypeData};

    #[test]
    fn union_flattens_dedups_and_sorts() {
        let mut fx = Fixture::new();
        let int = fx.integer_ty();
        let string = fx.string_ty();
        let inner = fx.model.union_of(vec![string, int]);
        let outer = fx.model.union_of(vec![int, inner]);
        let direct = fx.model.union_of(vec![int, string]);
        assert_eq!(outer, direct);
        match fx.model.pool.data(outer) {
            TypeData::Union(members) => assert_eq!(members.len(), 2),
            other => panic!("expected a union, got {other:?}"),
        }
    }

    #[test]
    fn union_keeps_redundant_supertypes() {
        let mut fx = Fixture::new();
        let int = fx.integer_ty();
        let object = fx.object_ty();
        let u = fx.model.union_of(vec![object, int]);
        match fx.model.pool.data(u) {
            TypeData::Union(members) => assert_eq!(members.len(), 2),
            other => panic!("expected a union, got {other:?}"),
        }
    }

    #[test]
    fn empty_union_is_bottom() {
        let mut fx = Fixture::new();
        assert_eq!(fx.model.union_of(Vec::new()), Idx::NOTHING);
    }

    #[test]
    fn singleton_union_is_the_member() {
        let mut fx = Fixture::new();
        let int = fx.integer_ty();
        assert_eq!(fx.model.union_of(vec![int, int]), int);
    }

    #[test]
    fn intersection_absorbs_supertypes() {
        let mut fx = Fixture::new();
        let int = fx.integer_ty();
        let object = fx.object_ty();
        assert_eq!(fx.model.intersection_of(vec![object, int]), int);
    }

    #[test]
    fn disjoint_intersection_collapses_to_nothing() {
        let mut fx = Fixture::new();
        let int = fx.integer_ty();
        let string = fx.string_ty();
        assert_eq!(fx.model.intersection_of(vec![int, string]), Idx::NOTHING);
    }

    #[test]
    fn intersection_drops_the_top_type() {
        let mut fx = Fixture::new();
        let int = fx.integer_ty();
        let anything = fx.model.anything();
        assert_eq!(fx.model.intersection_of(vec![anything, int]), int);
    }

    #[test]
    fn unknown_is_contagious() {
        let mut fx = Fixture::new();
        let int = fx.integer_ty();
        assert_eq!(fx.model.union_of(vec![Idx::UNKNOWN, int]), Idx::UNKNOWN);
        let tuple = fx.model.tuple_of(vec![int, Idx::UNKNOWN], None);
        assert_eq!(tuple, Idx::UNKNOWN);
    }

    #[test]
    fn canonical_forms_are_interned_once() {
        let mut fx = Fixture::new();
        let int = fx.integer_ty();
        let string = fx.string_ty();
        let a = fx.model.union_of(vec![int, string]);
        let b = fx.model.union_of(vec![string, int]);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_tuple_shape_is_the_empty_type() {
        let mut fx = Fixture::new();
        let t = fx.model.tuple_of(Vec::new(), None);
        let empty = fx.model.empty_type();
        assert_eq!(t, empty);
    }

    #[test]
    fn unrelated_classes_are_disjoint() {
        let mut fx = Fixture::new();
        let int = fx.integer_ty();
        let string = fx.string_ty();
        let object = fx.object_ty();
        assert!(fx.model.disjoint(int, string));
        assert!(!fx.model.disjoint(int, object));
    }

    #[test]
    fn class_vs_enumerated_type_expands_cases() {
        let mut fx = Fixture::new();
        let int = fx.integer_ty();
        let null = fx.model.null_type();
        // Anything is enumerated over Object | Null; Integer overlaps the
        // Object case.
        let anything = fx.model.anything();
        assert!(!fx.model.disjoint(int, anything));
        assert!(fx.model.disjoint(int, null));
    }

    #[test]
    fn denotable_expands_aliases_deeply() {
        let mut fx = Fixture::new();
        let int = fx.integer_ty();
        let denoted = fx.model.denotable(int);
        assert_eq!(denoted, int);
    }
}
