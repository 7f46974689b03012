//! Type-argument inference.
//!
//! Derives omitted generic type arguments from call-site argument types (or,
//! for indirect references, from a target type) by structural unification of
//! formal parameter types against actual types. Partial results for one
//! parameter combine with union for covariant/invariant parameters and with
//! intersection for contravariant ones, the single governing rule for
//! every argument source.
//!
//! Termination on recursively-bounded parameters is guaranteed by the
//! `visited` re-entry set plus a defensive depth bound.

use rustc_hash::FxHashSet;

use crate::stack::ensure_sufficient_stack;
use crate::{DeclId, DeclKind, Idx, Model, SiteVariance, TypeData, Variance};

/// One (formal parameter type, actual argument type) constraint.
#[derive(Copy, Clone, Debug)]
pub struct InferenceSource {
    pub formal: Idx,
    pub actual: Idx,
}

/// Per-parameter inference outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InferredArg {
    /// A type argument was derived.
    Solved(Idx),
    /// An argument was derived but falls outside the parameter's enumerated
    /// case constraint.
    CaseViolation(Idx),
    /// Nothing could be derived from the use site.
    NoInformation,
}

impl InferredArg {
    /// The derived type, substituting unknown on failure.
    pub fn type_or_unknown(&self) -> Idx {
        match self {
            InferredArg::Solved(t) | InferredArg::CaseViolation(t) => *t,
            InferredArg::NoInformation => Idx::UNKNOWN,
        }
    }
}

impl Model {
    /// Infer type arguments for `type_params` from the given sources.
    pub fn infer_type_args(
        &mut self,
        type_params: &[DeclId],
        sources: &[InferenceSource],
        max_depth: u32,
    ) -> Vec<InferredArg> {
        let to_solve: FxHashSet<DeclId> = type_params.iter().copied().collect();
        let mut engine = Inference {
            model: self,
            to_solve,
            max_depth,
        };
        type_params
            .iter()
            .map(|&tp| engine.solve(tp, sources))
            .collect()
    }

    /// True when `param` occurs free anywhere inside `ty`.
    pub(crate) fn occurs(&self, param: DeclId, ty: Idx) -> bool {
        match self.pool.data(ty) {
            TypeData::Nothing | TypeData::Unknown => false,
            TypeData::Nominal {
                decl,
                qualifying,
                args,
                ..
            } => {
                *decl == param
                    || qualifying.is_some_and(|q| self.occurs(param, q))
                    || args.iter().any(|&a| self.occurs(param, a))
            }
            TypeData::Union(members) | TypeData::Intersection(members) => {
                members.iter().any(|&m| self.occurs(param, m))
            }
            TypeData::Tuple { elems, tail } => {
                elems.iter().any(|&e| self.occurs(param, e))
                    || tail.is_some_and(|t| self.occurs(param, t))
            }
            TypeData::Callable { ret, args } => {
                self.occurs(param, *ret) || self.occurs(param, *args)
            }
        }
    }
}

struct Inference<'m> {
    model: &'m mut Model,
    /// All parameters being solved at this use site; a union formal
    /// containing two distinct members of this set is ambiguous.
    to_solve: FxHashSet<DeclId>,
    max_depth: u32,
}

impl Inference<'_> {
    fn solve(&mut self, tp: DeclId, sources: &[InferenceSource]) -> InferredArg {
        let mut acc: Option<Idx> = None;
        for source in sources {
            let mut visited = FxHashSet::default();
            let partial = self.infer_arg(
                tp,
                source.formal,
                source.actual,
                true,
                false,
                &mut visited,
                self.max_depth,
            );
            acc = self.combine(tp, acc, partial);
        }
        let Some(solved) = acc else {
            return InferredArg::NoInformation;
        };
        if self.model.pool.is_unknown(solved) {
            return InferredArg::NoInformation;
        }

        // Tighten by the non-type-parameter upper bounds: improves precision
        // for downstream overload and default-argument resolution.
        let bounds: Vec<Idx> = match &self.model.decls.get(tp).kind {
            DeclKind::TypeParam(p) => p
                .bounds
                .iter()
                .copied()
                .filter(|&b| {
                    self.model
                        .pool
                        .decl_of(b)
                        .is_none_or(|d| !matches!(self.model.decls.get(d).kind, DeclKind::TypeParam(_)))
                })
                .collect(),
            _ => Vec::new(),
        };
        let solved = if bounds.is_empty() {
            solved
        } else {
            let mut members = vec![solved];
            members.extend(bounds);
            self.model.intersection_of(members)
        };

        if self.satisfies_cases(tp, solved) {
            InferredArg::Solved(solved)
        } else {
            InferredArg::CaseViolation(solved)
        }
    }

    /// Validate an enumerated-case constraint: the solved argument must be a
    /// subtype of one permitted case, or, when the argument is itself a
    /// constrained type parameter, each of its cases must satisfy one of the
    /// target cases.
    fn satisfies_cases(&mut self, tp: DeclId, solved: Idx) -> bool {
        let cases = match &self.model.decls.get(tp).kind {
            DeclKind::TypeParam(p) => p.cases.clone(),
            _ => Vec::new(),
        };
        if cases.is_empty() {
            return true;
        }
        if let Some(d) = self.model.pool.decl_of(solved) {
            if let DeclKind::TypeParam(q) = self.model.decls.get(d).kind.clone() {
                if !q.cases.is_empty() {
                    return q.cases.iter().all(|&qc| {
                        cases.iter().any(|&c| self.model.is_subtype(qc, c))
                    });
                }
            }
        }
        cases.iter().any(|&c| self.model.is_subtype(solved, c))
    }

    /// Combine two partial results for a parameter.
    fn combine(&mut self, tp: DeclId, a: Option<Idx>, b: Option<Idx>) -> Option<Idx> {
        match (a, b) {
            (None, x) | (x, None) => x,
            (Some(a), Some(b)) => Some(match self.model.param_variance(tp) {
                Variance::Contravariant => self.model.intersection_of(vec![a, b]),
                _ => self.model.union_of(vec![a, b]),
            }),
        }
    }

    /// The recursive unification step. Returns `None` for "no information".
    #[expect(
        clippy::too_many_arguments,
        reason = "The recursion threads both variance flags plus the termination guards"
    )]
    fn infer_arg(
        &mut self,
        tp: DeclId,
        formal: Idx,
        actual: Idx,
        covariant: bool,
        contravariant: bool,
        visited: &mut FxHashSet<DeclId>,
        depth: u32,
    ) -> Option<Idx> {
        if depth == 0 {
            return None;
        }
        let formal = self.model.resolve_aliases(formal);
        let actual = self.model.resolve_aliases(actual);
        if self.model.pool.is_unknown(formal) {
            return None;
        }
        tracing::trace!(?tp, ?formal, ?actual, covariant, contravariant, "infer_arg");

        ensure_sufficient_stack(|| {
            // The formal type is exactly the parameter being solved.
            if self.model.pool.decl_of(formal) == Some(tp) {
                let declared = self.model.param_variance(tp);
                let forbidden = match declared {
                    Variance::Contravariant => covariant && !contravariant,
                    Variance::Covariant => contravariant && !covariant,
                    Variance::Invariant => false,
                };
                if forbidden {
                    return None;
                }
                if self.model.pool.is_unknown(actual) {
                    return None;
                }
                return Some(self.model.denotable(actual));
            }

            // A different type parameter: extract indirect constraints from
            // its upper bounds, guarding re-entry on recursively-bounded
            // parameters.
            if let Some(fd) = self.model.pool.decl_of(formal) {
                if let DeclKind::TypeParam(p) = self.model.decls.get(fd).kind.clone() {
                    if !visited.insert(fd) {
                        return None;
                    }
                    let mut acc = None;
                    for &bound in &p.bounds {
                        let partial = self.infer_arg(
                            tp,
                            bound,
                            actual,
                            covariant,
                            contravariant,
                            visited,
                            depth - 1,
                        );
                        acc = self.combine(tp, acc, partial);
                    }
                    visited.remove(&fd);
                    return acc;
                }
            }

            match self.model.pool.data(formal).clone() {
                TypeData::Union(members) => {
                    self.infer_from_union_formal(tp, &members, actual, covariant, contravariant, visited, depth)
                }

                TypeData::Intersection(members) => {
                    let mut acc = None;
                    for &m in members.iter() {
                        let partial = self.infer_arg(
                            tp, m, actual, covariant, contravariant, visited, depth - 1,
                        );
                        acc = self.combine(tp, acc, partial);
                    }
                    acc
                }

                _ => {
                    // Distribute over an algebraic actual type.
                    match self.model.pool.data(actual).clone() {
                        TypeData::Union(members) | TypeData::Intersection(members) => {
                            let mut acc = None;
                            for &m in members.iter() {
                                let partial = self.infer_arg(
                                    tp, formal, m, covariant, contravariant, visited, depth - 1,
                                );
                                acc = self.combine(tp, acc, partial);
                            }
                            return acc;
                        }
                        _ => {}
                    }
                    self.infer_from_structure(tp, formal, actual, covariant, contravariant, visited, depth)
                }
            }
        })
    }

    /// Union formal: peel actual-union members already satisfied by a
    /// non-parameter formal member, then recurse on what remains, unless
    /// two distinct unsolved parameters make the union ambiguous.
    #[expect(
        clippy::too_many_arguments,
        reason = "The recursion threads both variance flags plus the termination guards"
    )]
    fn infer_from_union_formal(
        &mut self,
        tp: DeclId,
        members: &[Idx],
        actual: Idx,
        covariant: bool,
        contravariant: bool,
        visited: &mut FxHashSet<DeclId>,
        depth: u32,
    ) -> Option<Idx> {
        let unsolved_params: FxHashSet<DeclId> = members
            .iter()
            .filter_map(|&m| self.model.pool.decl_of(m))
            .filter(|d| self.to_solve.contains(d))
            .collect();
        if unsolved_params.len() >= 2 {
            // Ambiguous: abstain rather than guess an arbitrary split.
            return None;
        }

        let plain_members: Vec<Idx> = members
            .iter()
            .copied()
            .filter(|&m| !self.model.occurs(tp, m))
            .collect();
        let peeled = match self.model.pool.data(actual).clone() {
            TypeData::Union(actual_members) => {
                let remaining: Vec<Idx> = actual_members
                    .iter()
                    .copied()
                    .filter(|&am| {
                        !plain_members
                            .iter()
                            .any(|&fm| self.model.is_subtype(am, fm))
                    })
                    .collect();
                self.model.union_of(remaining)
            }
            _ => actual,
        };

        let mut acc = None;
        for &m in members {
            if !self.model.occurs(tp, m) {
                continue;
            }
            let partial =
                self.infer_arg(tp, m, peeled, covariant, contravariant, visited, depth - 1);
            acc = self.combine(tp, acc, partial);
        }
        acc
    }

    /// Structural decomposition: find the actual type's instantiation of the
    /// formal declaration and recurse slot-wise, flipping the variance
    /// context per declared (and use-site) variance.
    #[expect(
        clippy::too_many_arguments,
        reason = "The recursion threads both variance flags plus the termination guards"
    )]
    fn infer_from_structure(
        &mut self,
        tp: DeclId,
        formal: Idx,
        actual: Idx,
        covariant: bool,
        contravariant: bool,
        visited: &mut FxHashSet<DeclId>,
        depth: u32,
    ) -> Option<Idx> {
        match self.model.pool.data(formal).clone() {
            TypeData::Tuple {
                elems: f_elems,
                tail: f_tail,
            } => {
                let (a_elems, a_tail) = match self.model.pool.data(actual).clone() {
                    TypeData::Tuple { elems, tail } => (elems.to_vec(), tail),
                    _ => {
                        let seq = self.model.supertype(actual, self.model.lang.sequential)?;
                        let elem = self.model.pool.args_of(seq).first().copied()?;
                        (Vec::new(), Some(elem))
                    }
                };
                let mut acc = None;
                for (i, &fe) in f_elems.iter().enumerate() {
                    let ae = a_elems.get(i).copied().or(a_tail);
                    if let Some(ae) = ae {
                        let partial = self
                            .infer_arg(tp, fe, ae, covariant, contravariant, visited, depth - 1);
                        acc = self.combine(tp, acc, partial);
                    }
                }
                if let Some(ft) = f_tail {
                    let mut rest: Vec<Idx> = a_elems.iter().skip(f_elems.len()).copied().collect();
                    if let Some(at) = a_tail {
                        rest.push(at);
                    }
                    if !rest.is_empty() {
                        let rest_union = self.model.union_of(rest);
                        let partial = self.infer_arg(
                            tp, ft, rest_union, covariant, contravariant, visited, depth - 1,
                        );
                        acc = self.combine(tp, acc, partial);
                    }
                }
                acc
            }

            TypeData::Callable {
                ret: f_ret,
                args: f_args,
            } => {
                let TypeData::Callable {
                    ret: a_ret,
                    args: a_args,
                } = self.model.pool.data(actual).clone()
                else {
                    return None;
                };
                let ret_partial = self.infer_arg(
                    tp, f_ret, a_ret, covariant, contravariant, visited, depth - 1,
                );
                // Argument position flips the variance context.
                let args_partial = self.infer_arg(
                    tp, f_args, a_args, contravariant, covariant, visited, depth - 1,
                );
                let acc = self.combine(tp, None, ret_partial);
                self.combine(tp, acc, args_partial)
            }

            TypeData::Nominal {
                decl: f_decl,
                qualifying: f_qualifying,
                args: f_args,
                variances: f_variances,
            } => {
                let sup = self.model.supertype(actual, f_decl)?;
                let TypeData::Nominal {
                    args: a_args,
                    qualifying: a_qualifying,
                    ..
                } = self.model.pool.data(sup).clone()
                else {
                    return None;
                };
                let params = self.model.decls.get(f_decl).type_params().to_vec();
                let mut acc = None;
                for (slot, &param) in params.iter().enumerate() {
                    let (Some(&fa), Some(&aa)) = (f_args.get(slot), a_args.get(slot)) else {
                        continue;
                    };
                    let declared = match f_variances.get(slot) {
                        Some(SiteVariance::Out) => Variance::Covariant,
                        Some(SiteVariance::In) => Variance::Contravariant,
                        _ => self.model.param_variance(param),
                    };
                    let (cov, contra) = match declared {
                        Variance::Covariant => (covariant, contravariant),
                        Variance::Contravariant => (contravariant, covariant),
                        // Invariant slots force a hard equality requirement.
                        Variance::Invariant => (false, false),
                    };
                    let partial =
                        self.infer_arg(tp, fa, aa, cov, contra, visited, depth - 1);
                    acc = self.combine(tp, acc, partial);
                }
                if let (Some(fq), Some(aq)) = (f_qualifying, a_qualifying) {
                    let partial = self
                        .infer_arg(tp, fq, aq, covariant, contravariant, visited, depth - 1);
                    acc = self.combine(tp, acc, partial);
                }
                acc
            }

            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::testutil::Fixture;
    use crate::{DeclKind, Idx, Variance};

    use super::{InferenceSource, InferredArg};

    const DEPTH: u32 = 100;

    #[test]
    fn direct_occurrence_solves_exactly() {
        let mut fx = Fixture::new();
        let holder = fx.class("Holder", None);
        let tp = fx.type_param(holder, "T", Variance::Invariant);
        fx.set_type_params(holder, vec![tp]);
        let formal = fx.simple(tp);
        let int = fx.integer_ty();
        let sources = [InferenceSource {
            formal,
            actual: int,
        }];
        let solved = fx.model.infer_type_args(&[tp], &sources, DEPTH);
        assert_eq!(solved, vec![InferredArg::Solved(int)]);
    }

    #[test]
    fn structural_occurrence_projects_the_argument() {
        let mut fx = Fixture::new();
        let holder = fx.class("Holder", None);
        let tp = fx.type_param(holder, "T", Variance::Invariant);
        fx.set_type_params(holder, vec![tp]);
        let tp_ty = fx.simple(tp);
        let formal = fx.model.sequential_of(tp_ty);
        let int = fx.integer_ty();
        let actual = fx.model.sequence_of(int);
        let sources = [InferenceSource { formal, actual }];
        let solved = fx.model.infer_type_args(&[tp], &sources, DEPTH);
        assert_eq!(solved, vec![InferredArg::Solved(int)]);
    }

    #[test]
    fn multiple_sources_union_for_invariant_parameters() {
        let mut fx = Fixture::new();
        let holder = fx.class("Holder", None);
        let tp = fx.type_param(holder, "T", Variance::Invariant);
        fx.set_type_params(holder, vec![tp]);
        let formal = fx.simple(tp);
        let int = fx.integer_ty();
        let string = fx.string_ty();
        let sources = [
            InferenceSource {
                formal,
                actual: int,
            },
            InferenceSource {
                formal,
                actual: string,
            },
        ];
        let solved = fx.model.infer_type_args(&[tp], &sources, DEPTH);
        let int_or_str = fx.model.union_of(vec![int, string]);
        assert_eq!(solved, vec![InferredArg::Solved(int_or_str)]);
    }

    #[test]
    fn contravariant_parameters_intersect_across_sources() {
        let mut fx = Fixture::new();
        let sink = fx.class("Sink", None);
        let tp = fx.type_param(sink, "T", Variance::Contravariant);
        fx.set_type_params(sink, vec![tp]);
        let tp_ty = fx.simple(tp);
        let sink_of_t = fx.app(sink, &[tp_ty]);
        let int = fx.integer_ty();
        let object = fx.object_ty();
        let sink_int = fx.app(sink, &[int]);
        let sink_obj = fx.app(sink, &[object]);
        let sources = [
            InferenceSource {
                formal: sink_of_t,
                actual: sink_int,
            },
            InferenceSource {
                formal: sink_of_t,
                actual: sink_obj,
            },
        ];
        let solved = fx.model.infer_type_args(&[tp], &sources, DEPTH);
        assert_eq!(solved, vec![InferredArg::Solved(int)]);
    }

    #[test]
    fn union_formal_peels_satisfied_members() {
        let mut fx = Fixture::new();
        let holder = fx.class("Holder", None);
        let tp = fx.type_param(holder, "T", Variance::Invariant);
        fx.set_type_params(holder, vec![tp]);
        let tp_ty = fx.simple(tp);
        let null = fx.model.null_type();
        let formal = fx.model.union_of(vec![tp_ty, null]);
        let int = fx.integer_ty();
        let actual = fx.model.union_of(vec![int, null]);
        let sources = [InferenceSource { formal, actual }];
        let solved = fx.model.infer_type_args(&[tp], &sources, DEPTH);
        assert_eq!(solved, vec![InferredArg::Solved(int)]);
    }

    #[test]
    fn ambiguous_union_formal_abstains() {
        let mut fx = Fixture::new();
        let holder = fx.class("Holder", None);
        let a = fx.type_param(holder, "A", Variance::Invariant);
        let b = fx.type_param(holder, "B", Variance::Invariant);
        fx.set_type_params(holder, vec![a, b]);
        let a_ty = fx.simple(a);
        let b_ty = fx.simple(b);
        let formal = fx.model.union_of(vec![a_ty, b_ty]);
        let int = fx.integer_ty();
        let sources = [InferenceSource {
            formal,
            actual: int,
        }];
        let solved = fx.model.infer_type_args(&[a, b], &sources, DEPTH);
        assert_eq!(
            solved,
            vec![InferredArg::NoInformation, InferredArg::NoInformation]
        );
    }

    #[test]
    fn no_occurrence_means_no_information() {
        let mut fx = Fixture::new();
        let holder = fx.class("Holder", None);
        let tp = fx.type_param(holder, "T", Variance::Invariant);
        fx.set_type_params(holder, vec![tp]);
        let int = fx.integer_ty();
        let string = fx.string_ty();
        let sources = [InferenceSource {
            formal: string,
            actual: int,
        }];
        let solved = fx.model.infer_type_args(&[tp], &sources, DEPTH);
        assert_eq!(solved, vec![InferredArg::NoInformation]);
    }

    #[test]
    fn unknown_actuals_are_ignored() {
        let mut fx = Fixture::new();
        let holder = fx.class("Holder", None);
        let tp = fx.type_param(holder, "T", Variance::Invariant);
        fx.set_type_params(holder, vec![tp]);
        let formal = fx.simple(tp);
        let sources = [InferenceSource {
            formal,
            actual: Idx::UNKNOWN,
        }];
        let solved = fx.model.infer_type_args(&[tp], &sources, DEPTH);
        assert_eq!(solved, vec![InferredArg::NoInformation]);
    }

    #[test]
    fn callable_formals_flip_into_argument_positions() {
        let mut fx = Fixture::new();
        let holder = fx.class("Holder", None);
        let tp = fx.type_param(holder, "T", Variance::Invariant);
        fx.set_type_params(holder, vec![tp]);
        let tp_ty = fx.simple(tp);
        let object = fx.object_ty();
        let f_args = fx.model.tuple_of(vec![tp_ty], None);
        let formal = fx.model.pool.callable(object, f_args);
        let int = fx.integer_ty();
        let a_args = fx.model.tuple_of(vec![int], None);
        let actual = fx.model.pool.callable(object, a_args);
        let sources = [InferenceSource { formal, actual }];
        let solved = fx.model.infer_type_args(&[tp], &sources, DEPTH);
        assert_eq!(solved, vec![InferredArg::Solved(int)]);
    }

    #[test]
    fn enumerated_constraints_reject_outside_cases() {
        let mut fx = Fixture::new();
        let holder = fx.class("Holder", None);
        let tp = fx.type_param(holder, "T", Variance::Invariant);
        fx.set_type_params(holder, vec![tp]);
        let int = fx.integer_ty();
        let float = fx.float_ty();
        if let DeclKind::TypeParam(p) = &mut fx.model.decls.get_mut_internal(tp).kind {
            p.cases = vec![int, float];
        }
        let formal = fx.simple(tp);
        let string = fx.string_ty();
        let sources = [InferenceSource {
            formal,
            actual: string,
        }];
        let solved = fx.model.infer_type_args(&[tp], &sources, DEPTH);
        assert_eq!(solved, vec![InferredArg::CaseViolation(string)]);
    }

    #[test]
    fn depth_bound_terminates_without_an_answer() {
        let mut fx = Fixture::new();
        let holder = fx.class("Holder", None);
        let tp = fx.type_param(holder, "T", Variance::Invariant);
        fx.set_type_params(holder, vec![tp]);
        let formal = fx.simple(tp);
        let int = fx.integer_ty();
        let sources = [InferenceSource {
            formal,
            actual: int,
        }];
        let solved = fx.model.infer_type_args(&[tp], &sources, 0);
        assert_eq!(solved, vec![InferredArg::NoInformation]);
    }
}
