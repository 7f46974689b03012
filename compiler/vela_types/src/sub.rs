//! Substitution and subtyping over the declaration graph.
//!
//! `supertype(t, d)` walks the extended/satisfied edges of `t`'s declaration,
//! substituting type arguments at each step, until `d` is reached. Queries
//! are memoized per `(t, d)` pair; an in-progress `None` marker makes cyclic
//! graphs (rejected upstream, guarded here defensively) a fixed point
//! instead of a hang.

use rustc_hash::FxHashMap;

use crate::stack::ensure_sufficient_stack;
use crate::{DeclId, DeclKind, Idx, Model, SiteVariance, TypeData, Variance};

/// How to combine per-slot type arguments of several instantiations of the
/// same declaration into one principal instantiation.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Combine {
    /// Combining the supertypes of union cases.
    Union,
    /// Combining the supertypes of intersection members.
    Intersection,
}

impl Model {
    /// The unique instantiation of `target` that `t` conforms to, if any.
    pub fn supertype(&mut self, t: Idx, target: DeclId) -> Option<Idx> {
        let t = self.resolve_aliases(t);
        let key = (t, target);
        if let Some(&cached) = self.supertype_memo.get(&key) {
            return cached;
        }
        // In-progress marker: a cyclic walk reaching this query again
        // terminates with "no supertype".
        self.supertype_memo.insert(key, None);
        let result = ensure_sufficient_stack(|| self.supertype_uncached(t, target));
        self.supertype_memo.insert(key, result);
        result
    }

    fn supertype_uncached(&mut self, t: Idx, target: DeclId) -> Option<Idx> {
        match self.pool.data(t).clone() {
            TypeData::Nothing | TypeData::Unknown => None,

            // The supertype of a union is combined case-wise (the union of
            // the case supertypes, folded into one principal instantiation),
            // and exists only when every case has one.
            TypeData::Union(cases) => {
                let mut insts = Vec::with_capacity(cases.len());
                for &c in cases.iter() {
                    insts.push(self.supertype(c, target)?);
                }
                self.principal_instantiation(target, &insts, Combine::Union)
            }

            // The supertype of an intersection is the members' supertypes
            // intersected; it exists when any member has one.
            TypeData::Intersection(parts) => {
                let insts: Vec<Idx> = parts
                    .iter()
                    .filter_map(|&p| self.supertype(p, target))
                    .collect();
                if insts.is_empty() {
                    None
                } else {
                    self.principal_instantiation(target, &insts, Combine::Intersection)
                }
            }

            TypeData::Tuple { .. } => {
                let backing = self.tuple_backing(t);
                self.supertype(backing, target)
            }

            TypeData::Callable { .. } => {
                let obj = self.pool.simple(self.lang.object);
                self.supertype(obj, target)
            }

            TypeData::Nominal { decl, .. } => {
                if decl == target {
                    return Some(t);
                }
                match self.decls.get(decl).kind.clone() {
                    DeclKind::TypeParam(p) => {
                        // Indirect conformance through the bounds; an
                        // enumerated parameter also conforms to whatever all
                        // of its cases conform to.
                        let insts: Vec<Idx> = p
                            .bounds
                            .iter()
                            .filter_map(|&b| self.supertype(b, target))
                            .collect();
                        if !insts.is_empty() {
                            return self.principal_instantiation(
                                target,
                                &insts,
                                Combine::Intersection,
                            );
                        }
                        if p.cases.is_empty() {
                            return None;
                        }
                        let mut case_insts = Vec::with_capacity(p.cases.len());
                        for &c in &p.cases {
                            case_insts.push(self.supertype(c, target)?);
                        }
                        self.principal_instantiation(target, &case_insts, Combine::Union)
                    }
                    DeclKind::Class(_) | DeclKind::Interface(_) => {
                        let map = self.substitution_for(t);
                        let edges: Vec<Idx> = match &self.decls.get(decl).kind {
                            DeclKind::Class(c) => {
                                c.extended.iter().chain(c.satisfied.iter()).copied().collect()
                            }
                            DeclKind::Interface(i) => i.satisfied.clone(),
                            _ => Vec::new(),
                        };
                        for edge in edges {
                            let instantiated = self.substitute(edge, &map);
                            if let Some(s) = self.supertype(instantiated, target) {
                                return Some(s);
                            }
                        }
                        None
                    }
                    // Aliases are resolved on entry; term declarations have
                    // no place in the nominal graph.
                    _ => None,
                }
            }
        }
    }

    /// Fold several instantiations of `target` into the principal one:
    /// covariant slots combine with union (or intersection, for
    /// intersection-combining), contravariant slots dually, invariant slots
    /// must agree exactly.
    fn principal_instantiation(
        &mut self,
        target: DeclId,
        insts: &[Idx],
        combine: Combine,
    ) -> Option<Idx> {
        debug_assert!(!insts.is_empty());
        if insts.len() == 1 {
            return Some(insts[0]);
        }
        let params = self.decls.get(target).type_params().to_vec();
        let mut combined_args = Vec::with_capacity(params.len());
        for (slot, &param) in params.iter().enumerate() {
            let slot_args: Vec<Idx> = insts
                .iter()
                .map(|&inst| self.pool.args_of(inst).get(slot).copied().unwrap_or(Idx::UNKNOWN))
                .collect();
            let variance = self.param_variance(param);
            let widen = match (variance, combine) {
                (Variance::Covariant, Combine::Union)
                | (Variance::Contravariant, Combine::Intersection) => true,
                (Variance::Covariant, Combine::Intersection)
                | (Variance::Contravariant, Combine::Union) => false,
                (Variance::Invariant, _) => {
                    if slot_args.windows(2).all(|w| w[0] == w[1]) {
                        combined_args.push(slot_args[0]);
                        continue;
                    }
                    return None;
                }
            };
            let arg = if widen {
                self.union_of(slot_args)
            } else {
                self.intersection_of(slot_args)
            };
            combined_args.push(arg);
        }
        Some(self.pool.nominal(target, &combined_args))
    }

    /// Declared variance of a type parameter.
    pub(crate) fn param_variance(&self, param: DeclId) -> Variance {
        match &self.decls.get(param).kind {
            DeclKind::TypeParam(p) => p.variance,
            _ => Variance::Invariant,
        }
    }

    /// The nominal sequence type a tuple conforms to.
    fn tuple_backing(&mut self, t: Idx) -> Idx {
        let TypeData::Tuple { elems, tail } = self.pool.data(t).clone() else {
            return t;
        };
        let mut members: Vec<Idx> = elems.to_vec();
        if let Some(te) = tail {
            members.push(te);
        }
        let elem_union = self.union_of(members);
        if elems.is_empty() {
            self.sequential_of(elem_union)
        } else {
            self.sequence_of(elem_union)
        }
    }

    /// The substituted union of an enumerated nominal type's case set, or
    /// `None` for non-enumerated types.
    pub(crate) fn case_union(&mut self, t: Idx) -> Option<Idx> {
        let t = self.resolve_aliases(t);
        let decl = self.pool.decl_of(t)?;
        let cases = self.decls.get(decl).case_types().to_vec();
        if cases.is_empty() {
            return None;
        }
        let map = self.substitution_for(t);
        let substituted: Vec<Idx> = cases.into_iter().map(|c| self.substitute(c, &map)).collect();
        Some(self.union_of(substituted))
    }

    /// Collect the type-parameter substitution a use of a declaration
    /// implies, through the whole qualifying chain.
    pub fn substitution_for(&mut self, t: Idx) -> FxHashMap<DeclId, Idx> {
        let mut map = FxHashMap::default();
        let mut cursor = Some(t);
        while let Some(c) = cursor {
            if let TypeData::Nominal {
                decl,
                qualifying,
                args,
                ..
            } = self.pool.data(c).clone()
            {
                let params = self.decls.get(decl).type_params().to_vec();
                for (&p, &a) in params.iter().zip(args.iter()) {
                    map.entry(p).or_insert(a);
                }
                cursor = qualifying;
            } else {
                cursor = None;
            }
        }
        map
    }

    /// Substitute type parameters in `ty` per `map`, interning new types.
    pub fn substitute(&mut self, ty: Idx, map: &FxHashMap<DeclId, Idx>) -> Idx {
        if map.is_empty() {
            return ty;
        }
        ensure_sufficient_stack(|| match self.pool.data(ty).clone() {
            TypeData::Nothing | TypeData::Unknown => ty,
            TypeData::Nominal {
                decl,
                qualifying,
                args,
                variances,
            } => {
                if let Some(&replacement) = map.get(&decl) {
                    return replacement;
                }
                if qualifying.is_none() && args.is_empty() {
                    return ty;
                }
                let qualifying = qualifying.map(|q| self.substitute(q, map));
                let args: Vec<Idx> = args.iter().map(|&a| self.substitute(a, map)).collect();
                self.pool
                    .nominal_with_variances(decl, qualifying, &args, &variances)
            }
            TypeData::Union(cases) => {
                let cases: Vec<Idx> = cases.iter().map(|&c| self.substitute(c, map)).collect();
                self.union_of(cases)
            }
            TypeData::Intersection(parts) => {
                let parts: Vec<Idx> = parts.iter().map(|&p| self.substitute(p, map)).collect();
                self.intersection_of(parts)
            }
            TypeData::Tuple { elems, tail } => {
                let elems: Vec<Idx> = elems.iter().map(|&e| self.substitute(e, map)).collect();
                let tail = tail.map(|t| self.substitute(t, map));
                self.tuple_of(elems, tail)
            }
            TypeData::Callable { ret, args } => {
                let ret = self.substitute(ret, map);
                let args = self.substitute(args, map);
                self.pool.callable(ret, args)
            }
        })
    }

    /// Structural subtype test under declared and use-site variance.
    pub fn is_subtype(&mut self, a: Idx, b: Idx) -> bool {
        let a = self.resolve_aliases(a);
        let b = self.resolve_aliases(b);
        ensure_sufficient_stack(|| self.is_subtype_inner(a, b))
    }

    fn is_subtype_inner(&mut self, a: Idx, b: Idx) -> bool {
        if a == b {
            return true;
        }
        if a == Idx::NOTHING {
            return true;
        }
        if self.pool.is_unknown(a) || self.pool.is_unknown(b) {
            // The unknown sentinel is handled by `assignable`, not here.
            return false;
        }
        if self.is_top(b) {
            return true;
        }
        if b == Idx::NOTHING {
            return false;
        }

        // A union is a subtype when every case is.
        if let TypeData::Union(cases) = self.pool.data(a) {
            let cases: Vec<Idx> = cases.to_vec();
            return cases.into_iter().all(|c| self.is_subtype(c, b));
        }
        // An intersection target requires conformance to every member.
        if let TypeData::Intersection(parts) = self.pool.data(b) {
            let parts: Vec<Idx> = parts.to_vec();
            return parts.into_iter().all(|m| self.is_subtype(a, m));
        }
        // An intersection conforms through any one member; the principal
        // path below also applies when no single member suffices.
        if let TypeData::Intersection(parts) = self.pool.data(a) {
            let parts: Vec<Idx> = parts.to_vec();
            if parts.into_iter().any(|m| self.is_subtype(m, b)) {
                return true;
            }
        }
        // A union target accepts any case; an enumerated type also conforms
        // through its (substituted) case set.
        if let TypeData::Union(cases) = self.pool.data(b) {
            let cases: Vec<Idx> = cases.to_vec();
            if cases.into_iter().any(|c| self.is_subtype(a, c)) {
                return true;
            }
            if let Some(expanded) = self.case_union(a) {
                if expanded != a {
                    return self.is_subtype(expanded, b);
                }
            }
            return false;
        }

        match self.pool.data(b).clone() {
            TypeData::Tuple {
                elems: b_elems,
                tail: b_tail,
            } => match self.pool.data(a).clone() {
                TypeData::Tuple {
                    elems: a_elems,
                    tail: a_tail,
                } => self.tuple_subtype(&a_elems, a_tail, &b_elems, b_tail),
                // A homogeneous sequence only fits a tuple with no required
                // prefix: `Sequential<X>` <: `[T*]` when `X` <: `T`.
                _ if b_elems.is_empty() => match b_tail {
                    Some(bte) => {
                        let seq = self.supertype(a, self.lang.sequential);
                        match seq {
                            Some(s) => {
                                let elem =
                                    self.pool.args_of(s).first().copied().unwrap_or(Idx::UNKNOWN);
                                self.is_subtype(elem, bte)
                            }
                            None => false,
                        }
                    }
                    None => false,
                },
                _ => false,
            },

            TypeData::Callable {
                ret: b_ret,
                args: b_args,
            } => match self.pool.data(a).clone() {
                TypeData::Callable {
                    ret: a_ret,
                    args: a_args,
                } => self.is_subtype(a_ret, b_ret) && self.is_subtype(b_args, a_args),
                _ => false,
            },

            TypeData::Nominal {
                decl: b_decl,
                qualifying: b_qualifying,
                args: b_args,
                variances: b_variances,
            } => {
                // A type parameter conforms through its bounds or case set.
                if let Some(a_decl) = self.pool.decl_of(a) {
                    if let DeclKind::TypeParam(p) = self.decls.get(a_decl).kind.clone() {
                        if p.bounds.iter().any(|&bound| self.is_subtype(bound, b)) {
                            return true;
                        }
                        if !p.cases.is_empty() && p.cases.iter().all(|&c| self.is_subtype(c, b)) {
                            return true;
                        }
                        return false;
                    }
                }
                if matches!(self.decls.get(b_decl).kind, DeclKind::TypeParam(_)) {
                    // Only the parameter itself (and Nothing) conforms to a
                    // bare type parameter; both handled above.
                    return false;
                }
                let Some(sup) = self.supertype(a, b_decl) else {
                    return false;
                };
                let TypeData::Nominal {
                    args: a_args,
                    variances: a_variances,
                    qualifying: a_qualifying,
                    ..
                } = self.pool.data(sup).clone()
                else {
                    return false;
                };
                if let Some(bq) = b_qualifying {
                    match a_qualifying {
                        Some(aq) => {
                            if !self.is_subtype(aq, bq) {
                                return false;
                            }
                        }
                        None => return false,
                    }
                }
                let params = self.decls.get(b_decl).type_params().to_vec();
                for (slot, &param) in params.iter().enumerate() {
                    let (Some(&aa), Some(&ba)) = (a_args.get(slot), b_args.get(slot)) else {
                        return false;
                    };
                    if self.pool.is_unknown(aa) || self.pool.is_unknown(ba) {
                        continue;
                    }
                    let effective = effective_variance(
                        self.param_variance(param),
                        b_variances.get(slot).copied().unwrap_or_default(),
                        a_variances.get(slot).copied().unwrap_or_default(),
                    );
                    let ok = match effective {
                        Variance::Covariant => self.is_subtype(aa, ba),
                        Variance::Contravariant => self.is_subtype(ba, aa),
                        Variance::Invariant => {
                            self.resolve_aliases(aa) == self.resolve_aliases(ba)
                        }
                    };
                    if !ok {
                        return false;
                    }
                }
                true
            }

            _ => false,
        }
    }

    fn tuple_subtype(
        &mut self,
        a_elems: &[Idx],
        a_tail: Option<Idx>,
        b_elems: &[Idx],
        b_tail: Option<Idx>,
    ) -> bool {
        // Every required element of `b` needs a definite counterpart in `a`.
        if a_elems.len() < b_elems.len() {
            return false;
        }
        for (i, &be) in b_elems.iter().enumerate() {
            if !self.is_subtype(a_elems[i], be) {
                return false;
            }
        }
        match b_tail {
            Some(bte) => {
                for &ae in &a_elems[b_elems.len()..] {
                    if !self.is_subtype(ae, bte) {
                        return false;
                    }
                }
                match a_tail {
                    Some(ate) => self.is_subtype(ate, bte),
                    None => true,
                }
            }
            None => a_elems.len() == b_elems.len() && a_tail.is_none(),
        }
    }

    /// Assignability: subtyping plus the tolerance rules.
    ///
    /// `Nothing` is assignable to everything, everything to the top type,
    /// and the unknown sentinel silently satisfies both sides so one
    /// upstream error does not cascade.
    pub fn assignable(&mut self, value: Idx, target: Idx) -> bool {
        if self.pool.is_unknown(value) || self.pool.is_unknown(target) {
            return true;
        }
        if value == Idx::NOTHING {
            return true;
        }
        self.is_subtype(value, target)
    }
}

/// Resolve declared and use-site variance into the variance governing one
/// argument slot. A use-site `out`/`in` overrides the declared variance.
fn effective_variance(declared: Variance, use_b: SiteVariance, use_a: SiteVariance) -> Variance {
    match (use_b, use_a) {
        (SiteVariance::Out, _) | (SiteVariance::Inherited, SiteVariance::Out) => {
            Variance::Covariant
        }
        (SiteVariance::In, _) | (SiteVariance::Inherited, SiteVariance::In) => {
            Variance::Contravariant
        }
        (SiteVariance::Inherited, SiteVariance::Inherited) => declared,
    }
}
