//! Invocation checking.
//!
//! Binds call-site arguments (positional, named, spread, comprehension,
//! sequenced block) to declared parameters, resolves overload sets, infers
//! omitted type arguments from the bound pairs, and produces the call's
//! result type.
//!
//! # Design
//!
//! One binding engine runs in up to three modes over the same argument
//! list: a structural pass with type checks disabled collects
//! (formal, actual) pairs for inference; a silent pass with checks enabled
//! probes overload candidates; the final pass reports diagnostics against
//! the substituted signature. Inference therefore sees unsubstituted
//! parameter types while the user only ever sees substituted ones.

use rustc_hash::FxHashMap;
use vela_ir::{Argument, Comprehension, ExprId, ExprKind, Name, Span};

use crate::check::UnitChecker;
use crate::{
    DeclId, DeclKind, Idx, InferenceSource, InferredArg, Param, ParamList, TypeData,
};

/// A call-site argument with its resolved type.
pub(crate) struct TypedArg {
    kind: ArgKind,
    ty: Idx,
    span: Span,
}

enum ArgKind {
    Positional,
    /// `*expr`; `ty` is the spread iterable's type.
    Spread,
    /// A comprehension; `ty` is the possibly-empty produced sequence.
    Comprehension,
    Named(Name),
    /// An argument block listing `count` elements; `ty` is their union.
    Sequenced { count: usize },
}

struct BindCx<'s> {
    callee: &'s str,
    span: Span,
    /// Push diagnostics for failures.
    report: bool,
    /// Run assignability checks (disabled for the inference pass, where
    /// formal types still contain unsolved parameters).
    check_types: bool,
}

struct BindOutcome {
    ok: bool,
    /// (formal, actual) pairs feeding type-argument inference.
    pairs: Vec<InferenceSource>,
}

enum CallTarget {
    Direct {
        decl: DeclId,
        receiver: Option<Idx>,
        explicit: Vec<Idx>,
    },
    Indirect(Idx),
}

impl UnitChecker<'_> {
    /// Check `callee(args)` and return the result type.
    ///
    /// The expected type is deliberately unused: a call's type arguments
    /// come from its arguments alone; a surrounding expected type only
    /// guides bare function references.
    pub(crate) fn check_invoke(
        &mut self,
        callee: ExprId,
        args: &[Argument],
        span: Span,
        _expected: Option<Idx>,
    ) -> Idx {
        // Resolve the callee shape first so direct calls never force
        // use-site inference on a bare reference.
        let callee_kind = self.arena.expr(callee).kind.clone();
        let target = match callee_kind {
            ExprKind::Ref { target, type_args } => match DeclId::from_ref(target) {
                Some(decl) => CallTarget::Direct {
                    decl,
                    receiver: None,
                    explicit: self.resolve_type_args(&type_args),
                },
                None => self.unresolved_callee(callee, span),
            },
            ExprKind::Member {
                receiver,
                member,
                type_args,
            } => {
                let recv = self.check_expr(receiver, None);
                match DeclId::from_ref(member) {
                    Some(decl) => CallTarget::Direct {
                        decl,
                        receiver: Some(recv),
                        explicit: self.resolve_type_args(&type_args),
                    },
                    None => self.unresolved_callee(callee, span),
                }
            }
            _ => CallTarget::Indirect(self.check_expr(callee, None)),
        };

        let typed_args = self.type_arguments(args);

        match target {
            CallTarget::Direct {
                decl,
                receiver,
                explicit,
            } => self.invoke_direct(decl, receiver, &explicit, &typed_args, callee, span),
            CallTarget::Indirect(ty) => self.invoke_indirect(ty, &typed_args, span),
        }
    }

    fn unresolved_callee(&mut self, callee: ExprId, span: Span) -> CallTarget {
        let d = self.err().internal(span, "unresolved callee reference");
        self.report(d);
        self.record_callee_type(callee, Idx::UNKNOWN);
        CallTarget::Indirect(Idx::UNKNOWN)
    }

    fn resolve_type_args(&self, refs: &[vela_ir::TypeRef]) -> Vec<Idx> {
        refs.iter().filter_map(|&r| self.resolve_type(r)).collect()
    }

    fn record_callee_type(&mut self, callee: ExprId, ty: Idx) {
        self.set_expr_type(callee, ty);
    }

    /// Type every argument expression up front; binding never re-types.
    fn type_arguments(&mut self, args: &[Argument]) -> Vec<TypedArg> {
        args.iter()
            .map(|arg| match arg {
                Argument::Positional(e) => TypedArg {
                    kind: ArgKind::Positional,
                    ty: self.check_expr(*e, None),
                    span: self.arena.expr(*e).span,
                },
                Argument::Spread(e) => TypedArg {
                    kind: ArgKind::Spread,
                    ty: self.check_expr(*e, None),
                    span: self.arena.expr(*e).span,
                },
                Argument::Comprehension(c) => {
                    let span = self.arena.expr(c.body).span;
                    TypedArg {
                        kind: ArgKind::Comprehension,
                        ty: self.check_comprehension(c),
                        span,
                    }
                }
                Argument::Named(name, e) => TypedArg {
                    kind: ArgKind::Named(*name),
                    ty: self.check_expr(*e, None),
                    span: self.arena.expr(*e).span,
                },
                Argument::SequencedBlock(elems) => {
                    let tys: Vec<Idx> = elems.iter().map(|&e| self.check_expr(e, None)).collect();
                    let span = elems
                        .first()
                        .map(|&e| self.arena.expr(e).span)
                        .unwrap_or(Span::DUMMY);
                    TypedArg {
                        kind: ArgKind::Sequenced { count: elems.len() },
                        ty: self.model.union_of(tys),
                        span,
                    }
                }
            })
            .collect()
    }

    /// A comprehension produces a possibly-empty sequence of its body type.
    fn check_comprehension(&mut self, c: &Comprehension) -> Idx {
        let source_ty = self.check_expr(c.source, None);
        let source_span = self.arena.expr(c.source).span;
        let elem = match self.iterable_element(source_ty) {
            Some(elem) => elem,
            None => {
                let d = self.err().spread_not_iterable(source_span, source_ty);
                self.report(d);
                Idx::UNKNOWN
            }
        };
        if let Some(binding) = DeclId::from_ref(c.binding) {
            self.model.decls.set_value_type(binding, elem);
        }
        let narrow = match &c.filter {
            Some(cond) => self.check_condition(cond).if_true,
            None => FxHashMap::default(),
        };
        let body_ty = self.check_in_scope(c.body, narrow);
        self.model.sequential_of(body_ty)
    }

    fn invoke_direct(
        &mut self,
        decl: DeclId,
        receiver: Option<Idx>,
        explicit: &[Idx],
        typed_args: &[TypedArg],
        callee_expr: ExprId,
        span: Span,
    ) -> Idx {
        let decl = match self.resolve_overload(decl, receiver, explicit, typed_args, span) {
            Some(decl) => decl,
            None => {
                self.record_callee_type(callee_expr, Idx::UNKNOWN);
                return Idx::UNKNOWN;
            }
        };

        let tr = self.model.typed_ref(decl, receiver, explicit);
        let callee_name = self.decl_name(decl);
        let Some(sig) = tr.signature else {
            // A value of callable type: bind through its structural type.
            self.record_callee_type(callee_expr, tr.full_type);
            return self.invoke_indirect(tr.full_type, typed_args, span);
        };

        let mut params = sig.params;
        let mut ret = sig.ret;
        if !sig.unsolved.is_empty() {
            let probe = self.bind_args(
                &params,
                typed_args,
                &BindCx {
                    callee: &callee_name,
                    span,
                    report: false,
                    check_types: false,
                },
            );
            let solved = self.model.infer_type_args(
                &sig.unsolved,
                &probe.pairs,
                self.options.max_infer_depth,
            );
            let mut map: FxHashMap<DeclId, Idx> = FxHashMap::default();
            for (&tp, arg) in sig.unsolved.iter().zip(&solved) {
                match arg {
                    InferredArg::NoInformation => {
                        let param = self.decl_name(tp);
                        let d = self.err().cannot_infer(span, &param, &callee_name);
                        self.report(d);
                    }
                    InferredArg::CaseViolation(t) => {
                        let param = self.decl_name(tp);
                        let d = self.err().case_violation(span, &param, *t);
                        self.report(d);
                    }
                    InferredArg::Solved(_) => {}
                }
                map.insert(tp, arg.type_or_unknown());
            }
            params = self.model.substitute_params(&params, &map);
            ret = self.model.substitute(ret, &map);
        }

        let args_tuple = self.model.param_tuple(&params);
        let full = self.model.pool.callable(ret, args_tuple);
        self.record_callee_type(callee_expr, full);

        self.bind_args(
            &params,
            typed_args,
            &BindCx {
                callee: &callee_name,
                span,
                report: true,
                check_types: true,
            },
        );
        ret
    }

    /// Resolve an overload set to one candidate by simulated binding.
    /// Returns `None` (after reporting) when no single candidate matches.
    fn resolve_overload(
        &mut self,
        decl: DeclId,
        receiver: Option<Idx>,
        explicit: &[Idx],
        typed_args: &[TypedArg],
        span: Span,
    ) -> Option<DeclId> {
        let candidates = match &self.model.decls.get(decl).kind {
            DeclKind::Overloaded { candidates } => candidates.clone(),
            _ => return Some(decl),
        };
        let callee_name = self.decl_name(decl);
        if typed_args
            .iter()
            .any(|a| matches!(a.kind, ArgKind::Named(_)))
        {
            // Named arguments cannot disambiguate candidates sharing
            // parameter names.
            let d = self.err().ambiguous_overload(span, &callee_name);
            self.report(d);
            return None;
        }
        let mut chosen = None;
        let mut matched = 0usize;
        for cand in candidates {
            let tr = self.model.typed_ref(cand, receiver, explicit);
            let Some(sig) = tr.signature else { continue };
            let out = self.bind_args(
                &sig.params,
                typed_args,
                &BindCx {
                    callee: &callee_name,
                    span,
                    report: false,
                    check_types: sig.unsolved.is_empty(),
                },
            );
            if out.ok {
                matched += 1;
                chosen = Some(cand);
            }
        }
        match (matched, chosen) {
            (1, Some(c)) => Some(c),
            _ => {
                let d = self.err().ambiguous_overload(span, &callee_name);
                self.report(d);
                None
            }
        }
    }

    /// Invoke a value through its structural callable type.
    fn invoke_indirect(&mut self, ty: Idx, typed_args: &[TypedArg], span: Span) -> Idx {
        if self.model.pool.is_unknown(ty) {
            return Idx::UNKNOWN;
        }
        let resolved = self.model.resolve_aliases(ty);
        let TypeData::Callable { ret, args } = self.model.pool.data(resolved).clone() else {
            let d = self.err().not_invokable(span, ty);
            self.report(d);
            return Idx::UNKNOWN;
        };
        let params = self.callable_params(args);
        self.bind_args(
            &params,
            typed_args,
            &BindCx {
                callee: "callable value",
                span,
                report: true,
                check_types: true,
            },
        );
        ret
    }

    /// A pseudo parameter list over a callable's argument tuple.
    fn callable_params(&mut self, args: Idx) -> ParamList {
        let (elems, tail) = match self.model.pool.data(args).clone() {
            TypeData::Tuple { elems, tail } => (elems.to_vec(), tail),
            _ => (Vec::new(), self.iterable_element(args)),
        };
        let mut params: Vec<Param> = elems
            .into_iter()
            .map(|ty| Param {
                name: Name::EMPTY,
                ty,
                decl: None,
                defaulted: false,
                sequenced: false,
                at_least_one: false,
            })
            .collect();
        if let Some(tail) = tail {
            params.push(Param {
                name: Name::EMPTY,
                ty: tail,
                decl: None,
                defaulted: false,
                sequenced: true,
                at_least_one: false,
            });
        }
        ParamList::new(params)
    }

    /// The binding engine shared by probing, inference, and reporting.
    fn bind_args(
        &mut self,
        params: &ParamList,
        args: &[TypedArg],
        cx: &BindCx<'_>,
    ) -> BindOutcome {
        let ps = &params.params;
        let mut bound = vec![false; ps.len()];
        let mut pairs: Vec<InferenceSource> = Vec::new();
        let mut ok = true;
        // A sequenced parameter's `+` arity is satisfied once any
        // definitely-nonempty argument reaches it.
        let mut variadic_filled = false;
        let mut arity_reported = false;

        for arg in args {
            match &arg.kind {
                ArgKind::Positional => match next_unbound(ps, &bound) {
                    Some(i) if ps[i].sequenced => {
                        let target = ps[i].ty;
                        let name = param_label(self, &ps[i], i);
                        ok &= self.check_assign(cx, arg, target, &name);
                        pairs.push(InferenceSource {
                            formal: target,
                            actual: arg.ty,
                        });
                        variadic_filled = true;
                    }
                    Some(i) => {
                        let target = ps[i].ty;
                        let name = param_label(self, &ps[i], i);
                        ok &= self.check_assign(cx, arg, target, &name);
                        pairs.push(InferenceSource {
                            formal: target,
                            actual: arg.ty,
                        });
                        bound[i] = true;
                    }
                    None => {
                        ok = false;
                        if cx.report && !arity_reported {
                            let d = self.err().too_many_arguments(arg.span, cx.callee, ps.len());
                            self.report(d);
                            arity_reported = true;
                        }
                    }
                },

                ArgKind::Spread | ArgKind::Comprehension => {
                    let is_spread = matches!(arg.kind, ArgKind::Spread);
                    // A statically-empty spread binds zero arguments.
                    let empty = self.model.empty_type();
                    if self.model.is_subtype(arg.ty, empty) {
                        continue;
                    }
                    let Some(elem) = self.iterable_element(arg.ty) else {
                        ok = false;
                        if cx.report {
                            let d = self.err().spread_not_iterable(arg.span, arg.ty);
                            self.report(d);
                        }
                        continue;
                    };
                    match next_unbound(ps, &bound) {
                        Some(i) if ps[i].sequenced => {
                            let target = ps[i].ty;
                            if cx.check_types && !self.model.assignable(elem, target) {
                                ok = false;
                                if cx.report {
                                    let name = param_label(self, &ps[i], i);
                                    let d = self.err().argument_not_assignable(
                                        arg.span, arg.ty, target, &name, cx.callee,
                                    );
                                    self.report(d);
                                }
                            }
                            pairs.push(InferenceSource {
                                formal: target,
                                actual: elem,
                            });
                            if is_spread && self.definitely_nonempty(arg.ty) {
                                variadic_filled = true;
                            }
                        }
                        Some(i) => {
                            // Non-sequenced parameters remain: the spread
                            // must cover them as a whole, against either
                            // the full or the required-only shape.
                            let (full, required) = self.remaining_tuples(ps, &bound, i);
                            if cx.check_types
                                && !self.model.assignable(arg.ty, full)
                                && !self.model.assignable(arg.ty, required)
                            {
                                ok = false;
                                if cx.report {
                                    let d = self.err().not_assignable(arg.span, arg.ty, full);
                                    self.report(d);
                                }
                            }
                            pairs.push(InferenceSource {
                                formal: full,
                                actual: arg.ty,
                            });
                            for b in bound.iter_mut().skip(i) {
                                *b = true;
                            }
                            variadic_filled = true;
                        }
                        None => {
                            ok = false;
                            if cx.report && !arity_reported {
                                let d =
                                    self.err().too_many_arguments(arg.span, cx.callee, ps.len());
                                self.report(d);
                                arity_reported = true;
                            }
                        }
                    }
                }

                ArgKind::Named(name) => {
                    let pos = ps
                        .iter()
                        .position(|p| p.name != Name::EMPTY && p.name == *name);
                    let Some(i) = pos else {
                        ok = false;
                        if cx.report {
                            let label = self.interner.resolve(*name).to_string();
                            let d =
                                self.err().unknown_named_argument(arg.span, &label, cx.callee);
                            self.report(d);
                        }
                        continue;
                    };
                    if bound[i] {
                        ok = false;
                        if cx.report {
                            let label = self.interner.resolve(*name).to_string();
                            let d = self.err().duplicate_argument(arg.span, &label);
                            self.report(d);
                        }
                        continue;
                    }
                    // A named argument supplies a sequenced parameter as a
                    // whole sequence.
                    let target = if ps[i].sequenced {
                        self.model.sequential_of(ps[i].ty)
                    } else {
                        ps[i].ty
                    };
                    let label = param_label(self, &ps[i], i);
                    ok &= self.check_assign(cx, arg, target, &label);
                    pairs.push(InferenceSource {
                        formal: target,
                        actual: arg.ty,
                    });
                    bound[i] = true;
                    if ps[i].sequenced {
                        variadic_filled = true;
                    }
                }

                ArgKind::Sequenced { count } => match next_unbound(ps, &bound) {
                    Some(i) if ps[i].sequenced => {
                        let target = ps[i].ty;
                        let name = param_label(self, &ps[i], i);
                        ok &= self.check_assign(cx, arg, target, &name);
                        pairs.push(InferenceSource {
                            formal: target,
                            actual: arg.ty,
                        });
                        bound[i] = true;
                        if *count > 0 {
                            variadic_filled = true;
                        }
                    }
                    Some(i) => {
                        let value = if *count == 0 {
                            self.model.empty_type()
                        } else {
                            self.model.sequence_of(arg.ty)
                        };
                        let target = ps[i].ty;
                        if cx.check_types && !self.model.assignable(value, target) {
                            ok = false;
                            if cx.report {
                                let name = param_label(self, &ps[i], i);
                                let d = self.err().argument_not_assignable(
                                    arg.span, value, target, &name, cx.callee,
                                );
                                self.report(d);
                            }
                        }
                        pairs.push(InferenceSource {
                            formal: target,
                            actual: value,
                        });
                        bound[i] = true;
                    }
                    None => {
                        ok = false;
                        if cx.report && !arity_reported {
                            let d = self.err().too_many_arguments(arg.span, cx.callee, ps.len());
                            self.report(d);
                            arity_reported = true;
                        }
                    }
                },
            }
        }

        // Unbound parameters must be optional.
        for (i, p) in ps.iter().enumerate() {
            if bound[i] {
                continue;
            }
            let missing = if p.sequenced {
                p.at_least_one && !variadic_filled
            } else {
                !p.optional()
            };
            if missing {
                ok = false;
                if cx.report {
                    let name = param_label(self, p, i);
                    let param_span = p
                        .decl
                        .map(|d| self.model.decls.get(d).span)
                        .unwrap_or(Span::DUMMY);
                    let d = self
                        .err()
                        .missing_argument(cx.span, &name, cx.callee, param_span);
                    self.report(d);
                }
            }
        }

        BindOutcome { ok, pairs }
    }

    fn check_assign(&mut self, cx: &BindCx<'_>, arg: &TypedArg, target: Idx, param: &str) -> bool {
        if !cx.check_types || self.model.assignable(arg.ty, target) {
            return true;
        }
        if cx.report {
            let d = self
                .err()
                .argument_not_assignable(arg.span, arg.ty, target, param, cx.callee);
            self.report(d);
        }
        false
    }

    /// True when a value is statically known to be a nonempty sequence.
    fn definitely_nonempty(&mut self, ty: Idx) -> bool {
        let anything = self.model.anything();
        let nonempty = self.model.sequence_of(anything);
        self.model.is_subtype(ty, nonempty)
    }

    /// The full-shape and required-only tuples over the still-unbound
    /// parameters from `from`, for whole-spread checking.
    fn remaining_tuples(&mut self, ps: &[Param], bound: &[bool], from: usize) -> (Idx, Idx) {
        let mut full_elems = Vec::new();
        let mut required_elems = Vec::new();
        let mut tail = None;
        let mut in_required = true;
        for (i, p) in ps.iter().enumerate().skip(from) {
            if bound[i] {
                continue;
            }
            if p.sequenced {
                tail = Some(p.ty);
                break;
            }
            if p.defaulted {
                in_required = false;
            }
            full_elems.push(p.ty);
            if in_required {
                required_elems.push(p.ty);
            }
        }
        let full = self.model.tuple_of(full_elems, tail);
        let required = self.model.tuple_of(required_elems, None);
        (full, required)
    }
}

/// First parameter not yet bound; the sequenced parameter is returned for
/// every trailing positional once the fixed ones are consumed.
fn next_unbound(ps: &[Param], bound: &[bool]) -> Option<usize> {
    ps.iter().enumerate().position(|(i, _)| !bound[i])
}

fn param_label(checker: &UnitChecker<'_>, p: &Param, index: usize) -> String {
    if p.name == Name::EMPTY {
        format!("#{index}")
    } else {
        checker.interner.resolve(p.name).to_string()
    }
}
