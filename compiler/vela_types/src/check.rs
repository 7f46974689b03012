//! The statement and expression checker.
//!
//! Walks each body bottom-up exactly once, records every expression's
//! resolved type in a side table, and accumulates diagnostics. Narrowed
//! types from `is`/`exists`/`nonempty` conditions live in branch-local
//! scope maps pushed around the guarded blocks; the declaration graph and
//! the AST are never mutated to hold flow-sensitive state.
//!
//! # Design
//!
//! The checker threads one mutable [`Model`] through every query so subtype
//! memoization and pool interning accumulate across the unit. Error
//! recovery is by contagion: a failed expression gets the unknown sentinel,
//! which silently satisfies every later assignability check, so one defect
//! produces one diagnostic.

use rustc_hash::FxHashMap;
use vela_diagnostic::Diagnostic;
use vela_ir::{
    BlockId, CatchClause, Condition, DeclRef, ExprArena, ExprId, ExprKind, Name, Pattern, Span,
    StmtId, StmtKind, StringInterner, TypeRef,
};

use crate::error::ErrorCx;
use crate::{DeclId, DeclKind, Idx, Model, TypeData};

/// Tunable limits for a checking run.
#[derive(Copy, Clone, Debug)]
pub struct CheckOptions {
    /// Recursion bound for type-argument inference.
    pub max_infer_depth: u32,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            max_infer_depth: 100,
        }
    }
}

/// A checkable body: the statements of one function, initializer, or
/// top-level value.
#[derive(Copy, Clone, Debug)]
pub struct Body {
    /// The declaration the body belongs to; its declared return type (when
    /// it is a function) constrains `return` statements.
    pub decl: DeclRef,
    pub block: BlockId,
}

/// One compilation unit handed to [`typecheck`].
pub struct Unit {
    pub model: Model,
    pub arena: ExprArena,
    /// Resolution of written type annotations, indexed by raw `TypeRef`.
    pub type_refs: Vec<Idx>,
    pub bodies: Vec<Body>,
}

impl Unit {
    pub fn new(model: Model) -> Self {
        Unit {
            model,
            arena: ExprArena::new(),
            type_refs: Vec::new(),
            bodies: Vec::new(),
        }
    }

    /// Register a resolved written type and get its handle.
    pub fn add_type(&mut self, ty: Idx) -> TypeRef {
        let r = TypeRef::from_raw(u32::try_from(self.type_refs.len()).unwrap_or(u32::MAX));
        self.type_refs.push(ty);
        r
    }
}

/// The outcome of checking a unit.
pub struct CheckResult {
    /// Resolved type per expression, indexed by raw `ExprId`. `Idx::NONE`
    /// for expressions in unreached bodies.
    pub expr_types: Vec<Idx>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn expr_type(&self, id: ExprId) -> Idx {
        self.expr_types
            .get(id.raw() as usize)
            .copied()
            .unwrap_or(Idx::NONE)
    }
}

/// Check every body of the unit.
#[tracing::instrument(skip_all, fields(bodies = unit.bodies.len()))]
pub fn typecheck(unit: &mut Unit, interner: &StringInterner, options: &CheckOptions) -> CheckResult {
    let Unit {
        model,
        arena,
        type_refs,
        bodies,
    } = unit;
    let mut checker = UnitChecker {
        model,
        arena,
        type_refs,
        interner,
        options,
        expr_types: vec![Idx::NONE; arena.expr_count()],
        diags: Vec::new(),
        scopes: Vec::new(),
        current_return: Idx::NONE,
    };
    for body in bodies.iter() {
        checker.check_body(body);
    }
    CheckResult {
        expr_types: checker.expr_types,
        diagnostics: checker.diags,
    }
}

/// Narrowed types flowing out of a condition, per branch.
#[derive(Default)]
pub(crate) struct CondOut {
    pub(crate) if_true: FxHashMap<DeclId, Idx>,
    pub(crate) if_false: FxHashMap<DeclId, Idx>,
}

pub(crate) struct UnitChecker<'a> {
    pub(crate) model: &'a mut Model,
    pub(crate) arena: &'a ExprArena,
    pub(crate) type_refs: &'a [Idx],
    pub(crate) interner: &'a StringInterner,
    pub(crate) options: &'a CheckOptions,
    pub(crate) expr_types: Vec<Idx>,
    pub(crate) diags: Vec<Diagnostic>,
    /// Branch-local narrowing scopes, innermost last.
    scopes: Vec<FxHashMap<DeclId, Idx>>,
    current_return: Idx,
}

impl UnitChecker<'_> {
    pub(crate) fn err(&self) -> ErrorCx<'_> {
        ErrorCx {
            model: self.model,
            interner: self.interner,
        }
    }

    pub(crate) fn report(&mut self, d: Diagnostic) {
        self.diags.push(d);
    }

    pub(crate) fn decl_name(&self, decl: DeclId) -> String {
        let name = self.model.decls.get(decl).name;
        if name == Name::EMPTY {
            "<anonymous>".to_string()
        } else {
            self.interner.resolve(name).to_string()
        }
    }

    /// Resolve a written-type handle; `None` for elided annotations.
    pub(crate) fn resolve_type(&self, r: TypeRef) -> Option<Idx> {
        if r.is_none() {
            return None;
        }
        self.type_refs.get(r.raw() as usize).copied()
    }

    pub(crate) fn set_expr_type(&mut self, id: ExprId, ty: Idx) {
        let slot = &mut self.expr_types[id.raw() as usize];
        debug_assert!(slot.is_none(), "expression typed twice: {id:?}");
        *slot = ty;
    }

    /// Type an expression inside an extra narrowing scope.
    pub(crate) fn check_in_scope(&mut self, e: ExprId, narrow: FxHashMap<DeclId, Idx>) -> Idx {
        self.scopes.push(narrow);
        let ty = self.check_expr(e, None);
        self.scopes.pop();
        ty
    }

    /// The branch-narrowed type of a value, when a surrounding condition
    /// refined it.
    fn narrowed(&self, decl: DeclId) -> Option<Idx> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&decl).copied())
    }

    fn check_body(&mut self, body: &Body) {
        self.current_return = DeclId::from_ref(body.decl)
            .and_then(|d| match &self.model.decls.get(d).kind {
                DeclKind::Function(f) => Some(f.ret),
                _ => None,
            })
            .unwrap_or(Idx::NONE);
        self.check_block(body.block, FxHashMap::default());
    }

    fn check_block(&mut self, block: BlockId, narrow: FxHashMap<DeclId, Idx>) {
        self.scopes.push(narrow);
        let stmts = self.arena.block(block).stmts.clone();
        for stmt in stmts {
            self.check_stmt(stmt);
        }
        self.scopes.pop();
    }

    fn check_stmt(&mut self, id: StmtId) {
        let stmt = self.arena.stmt(id).clone();
        match stmt.kind {
            StmtKind::Let {
                decl,
                annotation,
                init,
            } => self.check_let(decl, annotation, init, stmt.span),

            StmtKind::Expr(e) => {
                self.check_expr(e, None);
            }

            StmtKind::Return(value) => self.check_return(value, stmt.span),

            StmtKind::If {
                condition,
                then_block,
                else_block,
            } => {
                let out = self.check_condition(&condition);
                self.check_block(then_block, out.if_true);
                if let Some(e) = else_block {
                    self.check_block(e, out.if_false);
                }
            }

            StmtKind::While { condition, body } => {
                let out = self.check_condition(&condition);
                self.check_block(body, out.if_true);
            }

            StmtKind::Destructure { pattern, init } => {
                let ty = self.check_expr(init, None);
                let span = self.arena.expr(init).span;
                self.check_pattern(&pattern, ty, span);
            }

            StmtKind::Try { body, catches } => self.check_try(body, &catches),
        }
    }

    fn check_let(&mut self, decl: DeclRef, annotation: TypeRef, init: ExprId, span: Span) {
        let declared = self.resolve_type(annotation);
        let init_ty = self.check_expr(init, declared);
        let Some(decl) = DeclId::from_ref(decl) else {
            let d = self.err().internal(span, "unresolved declaration in let");
            self.report(d);
            return;
        };
        match declared {
            Some(target) => {
                if !self.model.assignable(init_ty, target) {
                    let d = self.err().not_assignable(span, init_ty, target);
                    self.report(d);
                }
                self.model.decls.set_value_type(decl, target);
            }
            None => {
                // Inferred declarations take the denotable widening of the
                // initializer type.
                let ty = self.model.denotable(init_ty);
                self.model.decls.set_value_type(decl, ty);
            }
        }
    }

    fn check_return(&mut self, value: Option<ExprId>, span: Span) {
        let declared = self.current_return;
        let value_ty = match value {
            Some(e) => {
                let expected = declared.is_some().then_some(declared);
                self.check_expr(e, expected)
            }
            None => self.model.null_type(),
        };
        if declared.is_none() {
            return;
        }
        if !self.model.assignable(value_ty, declared) {
            let d = self.err().return_mismatch(span, value_ty, declared);
            self.report(d);
        }
    }

    fn check_try(&mut self, body: BlockId, catches: &[CatchClause]) {
        self.check_block(body, FxHashMap::default());
        let exception = self.model.pool.simple(self.model.lang.exception);
        let mut handled: Vec<(Idx, Span)> = Vec::new();
        for clause in catches {
            let caught = self.resolve_type(clause.ty).unwrap_or(exception);
            if !self.model.assignable(caught, exception) {
                let d = self.err().not_assignable(clause.span, caught, exception);
                self.report(d);
            } else if let Some(&(_, earlier)) = handled
                .iter()
                .find(|&&(prev, _)| self.model.is_subtype(caught, prev))
            {
                let d = self.err().catch_subsumed(clause.span, caught, earlier);
                self.report(d);
            }
            handled.push((caught, clause.span));
            if let Some(decl) = DeclId::from_ref(clause.decl) {
                self.model.decls.set_value_type(decl, caught);
            }
            self.check_block(clause.body, FxHashMap::default());
        }
    }

    /// Destructure `ty` through `pattern`, typing every bound variable.
    fn check_pattern(&mut self, pattern: &Pattern, ty: Idx, span: Span) {
        match pattern {
            Pattern::Var(decl, annotation) => {
                let Some(decl) = DeclId::from_ref(*decl) else {
                    return;
                };
                match self.resolve_type(*annotation) {
                    Some(target) => {
                        if !self.model.assignable(ty, target) {
                            let d = self.err().not_assignable(span, ty, target);
                            self.report(d);
                        }
                        self.model.decls.set_value_type(decl, target);
                    }
                    None => {
                        let widened = self.model.denotable(ty);
                        self.model.decls.set_value_type(decl, widened);
                    }
                }
            }

            Pattern::Tuple { elements, rest } => {
                for (i, elem_pat) in elements.iter().enumerate() {
                    match self.model.element_type(ty, i) {
                        Some(elem) => self.check_pattern(elem_pat, elem, span),
                        None => {
                            let d = self.err().pattern_mismatch(span, "tuple", ty);
                            self.report(d);
                            return;
                        }
                    }
                }
                if let Some(rest) = rest {
                    let Some(decl) = DeclId::from_ref(*rest) else {
                        return;
                    };
                    match self.model.tail_type(ty, elements.len()) {
                        Some(tail) => self.model.decls.set_value_type(decl, tail),
                        None => {
                            let d = self.err().pattern_mismatch(span, "tuple", ty);
                            self.report(d);
                        }
                    }
                }
            }

            Pattern::Entry { key, value } => match self.model.entry_parts(ty) {
                Some((k, v)) => {
                    self.check_pattern(key, k, span);
                    self.check_pattern(value, v, span);
                }
                None => {
                    let d = self.err().pattern_mismatch(span, "entry", ty);
                    self.report(d);
                }
            },
        }
    }

    /// Analyze a condition, producing per-branch narrowing maps and typing
    /// any inline binding it introduces.
    pub(crate) fn check_condition(&mut self, condition: &Condition) -> CondOut {
        match condition {
            Condition::Is {
                negated,
                binding,
                subject,
                ty,
            } => {
                let subject_ty = self.check_expr(*subject, None);
                let span = self.arena.expr(*subject).span;
                let Some(tested) = self.resolve_type(*ty) else {
                    return CondOut::default();
                };
                let narrowed = self.model.narrow_is(tested, subject_ty, *negated);
                self.finish_condition(narrowed, subject_ty, tested, *subject, *binding, span)
            }

            Condition::Exists {
                negated,
                binding,
                subject,
            } => {
                let subject_ty = self.check_expr(*subject, None);
                let span = self.arena.expr(*subject).span;
                let null = self.model.null_type();
                let narrowed = self.model.narrow_exists(subject_ty, *negated);
                self.finish_condition(narrowed, subject_ty, null, *subject, *binding, span)
            }

            Condition::Nonempty {
                negated,
                binding,
                subject,
            } => {
                let subject_ty = self.check_expr(*subject, None);
                let span = self.arena.expr(*subject).span;
                let empty = self.model.empty_type();
                let narrowed = self.model.narrow_nonempty(subject_ty, *negated);
                self.finish_condition(narrowed, subject_ty, empty, *subject, *binding, span)
            }

            Condition::Bool(e) => {
                let boolean = self.model.pool.simple(self.model.lang.boolean);
                let ty = self.check_expr(*e, Some(boolean));
                if !self.model.assignable(ty, boolean) {
                    let span = self.arena.expr(*e).span;
                    let d = self.err().not_assignable(span, ty, boolean);
                    self.report(d);
                }
                CondOut::default()
            }
        }
    }

    fn finish_condition(
        &mut self,
        narrowed: crate::Narrowed,
        subject_ty: Idx,
        tested: Idx,
        subject: ExprId,
        binding: Option<DeclRef>,
        span: Span,
    ) -> CondOut {
        if narrowed.never_holds {
            let d = self.err().narrow_never_holds(span, subject_ty, tested);
            self.report(d);
        } else if narrowed.always_holds {
            let d = self.err().narrow_always_holds(span, subject_ty, tested);
            self.report(d);
        }
        let mut out = CondOut::default();
        if let Some(decl) = self.subject_decl(subject) {
            out.if_true.insert(decl, narrowed.if_true);
            out.if_false.insert(decl, narrowed.if_false);
        }
        if let Some(binding) = binding.and_then(DeclId::from_ref) {
            self.model.decls.set_value_type(binding, narrowed.if_true);
            out.if_true.insert(binding, narrowed.if_true);
        }
        out
    }

    /// The value declaration a condition subject refers to, when narrowing
    /// can attach to it.
    fn subject_decl(&self, subject: ExprId) -> Option<DeclId> {
        match &self.arena.expr(subject).kind {
            ExprKind::Ref { target, .. } => {
                let decl = DeclId::from_ref(*target)?;
                matches!(self.model.decls.get(decl).kind, DeclKind::Value(_)).then_some(decl)
            }
            _ => None,
        }
    }

    /// Type one expression, record it in the side table, and return it.
    pub(crate) fn check_expr(&mut self, id: ExprId, expected: Option<Idx>) -> Idx {
        let expr = self.arena.expr(id).clone();
        let ty = match expr.kind {
            ExprKind::NullLit => self.model.null_type(),
            ExprKind::BoolLit(_) => self.model.pool.simple(self.model.lang.boolean),
            ExprKind::IntLit(_) => self.model.pool.simple(self.model.lang.integer),
            ExprKind::FloatLit(_) => self.model.pool.simple(self.model.lang.float),
            ExprKind::StrLit(_) => self.model.pool.simple(self.model.lang.string),

            ExprKind::Ref { target, type_args } => {
                self.check_ref(target, &type_args, None, expected, expr.span)
            }

            ExprKind::Member {
                receiver,
                member,
                type_args,
            } => {
                let recv = self.check_expr(receiver, None);
                self.check_ref(member, &type_args, Some(recv), expected, expr.span)
            }

            ExprKind::Invoke { callee, args } => {
                self.check_invoke(callee, &args, expr.span, expected)
            }

            ExprKind::TupleLit { elements, spread } => self.check_tuple_lit(&elements, spread),

            ExprKind::EntryLit { key, value } => {
                let k = self.check_expr(key, None);
                let v = self.check_expr(value, None);
                self.model.entry_of(k, v)
            }
        };
        self.set_expr_type(id, ty);
        ty
    }

    /// Type a base or member reference outside a call position.
    fn check_ref(
        &mut self,
        target: DeclRef,
        type_args: &[TypeRef],
        receiver: Option<Idx>,
        expected: Option<Idx>,
        span: Span,
    ) -> Idx {
        let Some(decl) = DeclId::from_ref(target) else {
            let d = self.err().internal(span, "unresolved reference");
            self.report(d);
            return Idx::UNKNOWN;
        };
        let explicit: Vec<Idx> = type_args
            .iter()
            .filter_map(|&r| self.resolve_type(r))
            .collect();
        let tr = self.model.typed_ref(decl, receiver, &explicit);

        // Narrowing overrides the declared type of a plain value reference.
        if receiver.is_none() && tr.signature.is_none() {
            if let Some(narrowed) = self.narrowed(decl) {
                return narrowed;
            }
        }

        let unsolved = tr
            .signature
            .as_ref()
            .map(|s| s.unsolved.clone())
            .unwrap_or_default();
        if unsolved.is_empty() {
            return tr.full_type;
        }

        // A generic function reference outside a call: type arguments come
        // from the target type, or nowhere.
        let solved = match expected {
            Some(target_ty) => self.infer_from_target(&unsolved, tr.full_type, target_ty),
            None => vec![crate::InferredArg::NoInformation; unsolved.len()],
        };
        let callee = self.decl_name(decl);
        let mut map: FxHashMap<DeclId, Idx> = FxHashMap::default();
        for (&tp, arg) in unsolved.iter().zip(&solved) {
            if matches!(arg, crate::InferredArg::NoInformation) {
                let param = self.decl_name(tp);
                let d = self.err().cannot_infer(span, &param, &callee);
                self.report(d);
            }
            map.insert(tp, arg.type_or_unknown());
        }
        self.model.substitute(tr.full_type, &map)
    }

    fn infer_from_target(
        &mut self,
        unsolved: &[DeclId],
        full_type: Idx,
        target: Idx,
    ) -> Vec<crate::InferredArg> {
        let sources = [crate::InferenceSource {
            formal: full_type,
            actual: target,
        }];
        self.model
            .infer_type_args(unsolved, &sources, self.options.max_infer_depth)
    }

    fn check_tuple_lit(&mut self, elements: &[ExprId], spread: Option<ExprId>) -> Idx {
        let mut elems: Vec<Idx> = elements.iter().map(|&e| self.check_expr(e, None)).collect();
        let mut tail = None;
        if let Some(spread) = spread {
            let spread_ty = self.check_expr(spread, None);
            match self.model.pool.data(spread_ty).clone() {
                // A spread tuple splices its shape into the literal.
                TypeData::Tuple {
                    elems: more,
                    tail: more_tail,
                } => {
                    elems.extend(more.iter().copied());
                    tail = more_tail;
                }
                _ => match self.iterable_element(spread_ty) {
                    Some(elem) => tail = Some(elem),
                    None => {
                        let spread_span = self.arena.expr(spread).span;
                        let d = self.err().spread_not_iterable(spread_span, spread_ty);
                        self.report(d);
                        return Idx::UNKNOWN;
                    }
                },
            }
        }
        self.model.tuple_of(elems, tail)
    }

    /// The element type of an iterable value, unknown-propagating.
    pub(crate) fn iterable_element(&mut self, ty: Idx) -> Option<Idx> {
        if self.model.pool.is_unknown(ty) {
            return Some(Idx::UNKNOWN);
        }
        let sup = self.model.supertype(ty, self.model.lang.iterable)?;
        self.model.pool.args_of(sup).first().copied()
    }
}
