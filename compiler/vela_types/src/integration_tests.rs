//! End-to-end checks over small constructed bodies.
//!
//! Each test builds a declaration graph with the fixture, lowers a handful
//! of statements into the arena by hand, runs [`typecheck`], and asserts on
//! the recorded expression types and diagnostics.

use pretty_assertions::assert_eq;
use vela_diagnostic::ErrorCode;
use vela_ir::{
    Argument, CatchClause, Comprehension, Condition, DeclRef, ExprId, ExprKind, Pattern, Span,
    StmtId, StmtKind, StringInterner, TypeRef,
};

use crate::testutil::Fixture;
use crate::{typecheck, Body, CheckOptions, CheckResult, DeclId, DeclKind, Idx, Unit, Variance};

struct Host {
    interner: StringInterner,
    unit: Unit,
}

impl Host {
    fn new(fx: Fixture) -> Self {
        Host {
            interner: fx.interner,
            unit: Unit::new(fx.model),
        }
    }

    fn expr(&mut self, kind: ExprKind) -> ExprId {
        self.unit.arena.alloc_expr(kind, Span::new(0, 1))
    }

    fn stmt(&mut self, kind: StmtKind) -> StmtId {
        self.unit.arena.alloc_stmt(kind, Span::new(0, 1))
    }

    fn body(&mut self, stmts: Vec<StmtId>) {
        self.body_of(DeclRef::NONE, stmts);
    }

    fn body_of(&mut self, decl: DeclRef, stmts: Vec<StmtId>) {
        let block = self.unit.arena.alloc_block(stmts);
        self.unit.bodies.push(Body { decl, block });
    }

    fn run(&mut self) -> CheckResult {
        typecheck(&mut self.unit, &self.interner, &CheckOptions::default())
    }

    fn ref_to(&mut self, decl: DeclId) -> ExprId {
        self.expr(ExprKind::Ref {
            target: decl.to_ref(),
            type_args: Vec::new(),
        })
    }

    fn int_lit(&mut self, v: i64) -> ExprId {
        self.expr(ExprKind::IntLit(v))
    }

    fn str_lit(&mut self, s: &str) -> ExprId {
        let name = self.interner.intern(s);
        self.expr(ExprKind::StrLit(name))
    }

    fn call(&mut self, callee: DeclId, args: Vec<Argument>) -> ExprId {
        let callee = self.ref_to(callee);
        self.expr(ExprKind::Invoke { callee, args })
    }

    fn expr_stmt(&mut self, e: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(e))
    }
}

fn codes(result: &CheckResult) -> Vec<ErrorCode> {
    result.diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn exists_narrows_the_tested_value_in_the_branch() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let opt_int = fx.model.optional(int);
    let x = fx.value("x", opt_int);
    let y = fx.value("y", Idx::NONE);

    let mut host = Host::new(fx);
    let subject = host.ref_to(x);
    let init = host.ref_to(x);
    let let_stmt = host.stmt(StmtKind::Let {
        decl: y.to_ref(),
        annotation: TypeRef::NONE,
        init,
    });
    let then_block = host.unit.arena.alloc_block(vec![let_stmt]);
    let if_stmt = host.stmt(StmtKind::If {
        condition: Condition::Exists {
            negated: false,
            binding: None,
            subject,
        },
        then_block,
        else_block: None,
    });
    host.body(vec![if_stmt]);

    let result = host.run();
    assert_eq!(result.diagnostics, vec![]);
    assert_eq!(result.expr_type(init), int);
    assert_eq!(host.unit.model.decls.value_type(y), int);
}

#[test]
fn missing_argument_is_reported_once_and_named() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let string = fx.string_ty();
    let a = fx.param("a", int);
    let b = fx.param("b", string);
    let f = fx.function("greet", vec![a, b], string);

    let mut host = Host::new(fx);
    let arg = host.int_lit(1);
    let call = host.call(f, vec![Argument::Positional(arg)]);
    let s = host.expr_stmt(call);
    host.body(vec![s]);

    let result = host.run();
    assert_eq!(codes(&result), vec![ErrorCode::E2003]);
    assert!(result.diagnostics[0].message.contains("`b`"));
    assert_eq!(result.expr_type(call), string);
}

#[test]
fn type_arguments_infer_as_the_union_of_argument_types() {
    let mut fx = Fixture::new();
    let f = fx.function("pick", Vec::new(), Idx::NONE);
    let tp = fx.type_param(f, "T", Variance::Invariant);
    fx.set_type_params(f, vec![tp]);
    let tp_ty = fx.simple(tp);
    let pa = fx.param("a", tp_ty);
    let pb = fx.param("b", tp_ty);
    if let DeclKind::Function(func) = &mut fx.model.decls.get_mut_internal(f).kind {
        func.params = crate::ParamList::new(vec![pa, pb]);
        func.ret = tp_ty;
    }
    let int = fx.integer_ty();
    let string = fx.string_ty();
    let expected = fx.model.union_of(vec![int, string]);

    let mut host = Host::new(fx);
    let a = host.int_lit(1);
    let b = host.str_lit("s");
    let call = host.call(f, vec![Argument::Positional(a), Argument::Positional(b)]);
    let s = host.expr_stmt(call);
    host.body(vec![s]);

    let result = host.run();
    assert_eq!(result.diagnostics, vec![]);
    assert_eq!(result.expr_type(call), expected);
}

#[test]
fn uninferable_type_argument_is_diagnosed() {
    let mut fx = Fixture::new();
    let string = fx.string_ty();
    let f = fx.function("make", Vec::new(), Idx::NONE);
    let tp = fx.type_param(f, "T", Variance::Invariant);
    fx.set_type_params(f, vec![tp]);
    let tp_ty = fx.simple(tp);
    let p = fx.param("tag", string);
    if let DeclKind::Function(func) = &mut fx.model.decls.get_mut_internal(f).kind {
        func.params = crate::ParamList::new(vec![p]);
        func.ret = tp_ty;
    }

    let mut host = Host::new(fx);
    let tag = host.str_lit("s");
    let call = host.call(f, vec![Argument::Positional(tag)]);
    let s = host.expr_stmt(call);
    host.body(vec![s]);

    let result = host.run();
    assert_eq!(codes(&result), vec![ErrorCode::E2002]);
    assert_eq!(result.expr_type(call), Idx::UNKNOWN);
}

#[test]
fn later_catch_clauses_subsumed_by_earlier_ones_warn() {
    let mut fx = Fixture::new();
    let exception = fx.model.lang.exception;
    let exc_ty = fx.simple(exception);
    let myerr = fx.class("ParseError", Some(exc_ty));
    let myerr_ty = fx.simple(myerr);
    let e1 = fx.value("e1", Idx::NONE);
    let e2 = fx.value("e2", Idx::NONE);

    let mut host = Host::new(fx);
    let t_exc = host.unit.add_type(exc_ty);
    let t_myerr = host.unit.add_type(myerr_ty);
    let try_body = host.unit.arena.alloc_block(Vec::new());
    let b1 = host.unit.arena.alloc_block(Vec::new());
    let b2 = host.unit.arena.alloc_block(Vec::new());
    let try_stmt = host.stmt(StmtKind::Try {
        body: try_body,
        catches: vec![
            CatchClause {
                decl: e1.to_ref(),
                ty: t_exc,
                body: b1,
                span: Span::new(2, 3),
            },
            CatchClause {
                decl: e2.to_ref(),
                ty: t_myerr,
                body: b2,
                span: Span::new(4, 5),
            },
        ],
    });
    host.body(vec![try_stmt]);

    let result = host.run();
    assert_eq!(codes(&result), vec![ErrorCode::E2013]);
    assert!(!result.has_errors());
    assert_eq!(host.unit.model.decls.value_type(e2), myerr_ty);
}

#[test]
fn statically_empty_spread_binds_zero_arguments() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let empty = fx.model.empty_type();
    let rest = fx.seq_param("rest", int, false);
    let f = fx.function("sum", vec![rest], int);
    let none = fx.value("none", empty);

    let mut host = Host::new(fx);
    let spread = host.ref_to(none);
    let call = host.call(f, vec![Argument::Spread(spread)]);
    let s = host.expr_stmt(call);
    host.body(vec![s]);

    let result = host.run();
    assert_eq!(result.diagnostics, vec![]);
    assert_eq!(result.expr_type(call), int);
}

#[test]
fn empty_spread_leaves_required_fixed_parameters_unbound() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let empty = fx.model.empty_type();
    let a = fx.param("a", int);
    let f = fx.function("inc", vec![a], int);
    let none = fx.value("none", empty);

    let mut host = Host::new(fx);
    let spread = host.ref_to(none);
    let call = host.call(f, vec![Argument::Spread(spread)]);
    let s = host.expr_stmt(call);
    host.body(vec![s]);

    let result = host.run();
    assert_eq!(codes(&result), vec![ErrorCode::E2003]);
    assert!(result.diagnostics[0].message.contains("`a`"));
}

#[test]
fn else_branches_see_the_complement_of_the_condition() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let null = fx.model.null_type();
    let opt_int = fx.model.optional(int);
    let x = fx.value("x", opt_int);
    let y = fx.value("y", Idx::NONE);

    let mut host = Host::new(fx);
    let subject = host.ref_to(x);
    let init = host.ref_to(x);
    let let_stmt = host.stmt(StmtKind::Let {
        decl: y.to_ref(),
        annotation: TypeRef::NONE,
        init,
    });
    let then_block = host.unit.arena.alloc_block(Vec::new());
    let else_block = host.unit.arena.alloc_block(vec![let_stmt]);
    let if_stmt = host.stmt(StmtKind::If {
        condition: Condition::Exists {
            negated: false,
            binding: None,
            subject,
        },
        then_block,
        else_block: Some(else_block),
    });
    host.body(vec![if_stmt]);

    let result = host.run();
    assert_eq!(result.diagnostics, vec![]);
    assert_eq!(result.expr_type(init), null);
    assert_eq!(host.unit.model.decls.value_type(y), null);
}

#[test]
fn impossible_narrowing_is_an_error() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let string = fx.string_ty();
    let x = fx.value("x", int);

    let mut host = Host::new(fx);
    let t_string = host.unit.add_type(string);
    let subject = host.ref_to(x);
    let then_block = host.unit.arena.alloc_block(Vec::new());
    let if_stmt = host.stmt(StmtKind::If {
        condition: Condition::Is {
            negated: false,
            binding: None,
            subject,
            ty: t_string,
        },
        then_block,
        else_block: None,
    });
    host.body(vec![if_stmt]);

    let result = host.run();
    assert_eq!(codes(&result), vec![ErrorCode::E2008]);
    assert!(result.has_errors());
}

#[test]
fn return_values_must_match_the_declared_type() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let f = fx.function("answer", Vec::new(), int);

    let mut host = Host::new(fx);
    let value = host.str_lit("nope");
    let ret = host.stmt(StmtKind::Return(Some(value)));
    host.body_of(f.to_ref(), vec![ret]);

    let result = host.run();
    assert_eq!(codes(&result), vec![ErrorCode::E2015]);
}

#[test]
fn invoking_a_non_callable_value_fails() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let n = fx.value("n", int);

    let mut host = Host::new(fx);
    let call = host.call(n, Vec::new());
    let s = host.expr_stmt(call);
    host.body(vec![s]);

    let result = host.run();
    assert_eq!(codes(&result), vec![ErrorCode::E2012]);
    assert_eq!(result.expr_type(call), Idx::UNKNOWN);
}

#[test]
fn values_of_callable_type_invoke_indirectly() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let string = fx.string_ty();
    let args = fx.model.tuple_of(vec![string], None);
    let callable = fx.model.pool.callable(int, args);
    let g = fx.value("g", callable);

    let mut host = Host::new(fx);
    let good_arg = host.str_lit("s");
    let good = host.call(g, vec![Argument::Positional(good_arg)]);
    let bad_arg = host.int_lit(1);
    let bad = host.call(g, vec![Argument::Positional(bad_arg)]);
    let s1 = host.expr_stmt(good);
    let s2 = host.expr_stmt(bad);
    host.body(vec![s1, s2]);

    let result = host.run();
    assert_eq!(codes(&result), vec![ErrorCode::E2001]);
    assert_eq!(result.expr_type(good), int);
    assert_eq!(result.expr_type(bad), int);
}

#[test]
fn named_arguments_bind_out_of_order() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let string = fx.string_ty();
    let a = fx.param("a", int);
    let b = fx.param("b", string);
    let f = fx.function("greet", vec![a, b], string);

    let mut host = Host::new(fx);
    let name_a = host.interner.intern("a");
    let name_b = host.interner.intern("b");
    let vb = host.str_lit("s");
    let va = host.int_lit(1);
    let call = host.call(f, vec![Argument::Named(name_b, vb), Argument::Named(name_a, va)]);
    let s = host.expr_stmt(call);
    host.body(vec![s]);

    let result = host.run();
    assert_eq!(result.diagnostics, vec![]);
}

#[test]
fn unknown_argument_names_are_rejected() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let a = fx.param("a", int);
    let f = fx.function("inc", vec![a], int);

    let mut host = Host::new(fx);
    let name_c = host.interner.intern("c");
    let v = host.int_lit(1);
    let call = host.call(f, vec![Argument::Named(name_c, v)]);
    let s = host.expr_stmt(call);
    host.body(vec![s]);

    let result = host.run();
    // One unknown name, and `a` is consequently unbound.
    assert_eq!(codes(&result), vec![ErrorCode::E2006, ErrorCode::E2003]);
}

#[test]
fn nonempty_variadics_require_an_argument() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let xs = fx.seq_param("xs", int, true);
    let f = fx.function("max", vec![xs], int);

    let mut host = Host::new(fx);
    let empty_call = host.call(f, Vec::new());
    let a = host.int_lit(1);
    let b = host.int_lit(2);
    let full_call = host.call(f, vec![Argument::Positional(a), Argument::Positional(b)]);
    let s1 = host.expr_stmt(empty_call);
    let s2 = host.expr_stmt(full_call);
    host.body(vec![s1, s2]);

    let result = host.run();
    assert_eq!(codes(&result), vec![ErrorCode::E2003]);
}

#[test]
fn overloads_resolve_to_the_unique_matching_candidate() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let string = fx.string_ty();
    let boolean = fx.boolean_ty();
    let pa = fx.param("x", int);
    let f1 = fx.function("show", vec![pa], int);
    let pb = fx.param("x", string);
    let f2 = fx.function("show", vec![pb], string);
    let set = fx.model.decls.alloc(crate::Decl {
        name: fx.interner.intern("show"),
        span: Span::DUMMY,
        container: None,
        flags: crate::DeclFlags::SHARED,
        kind: DeclKind::Overloaded {
            candidates: vec![f1, f2],
        },
    });
    let b = fx.value("flag", boolean);

    let mut host = Host::new(fx);
    let sv = host.str_lit("s");
    let good = host.call(set, vec![Argument::Positional(sv)]);
    let bv = host.ref_to(b);
    let bad = host.call(set, vec![Argument::Positional(bv)]);
    let s1 = host.expr_stmt(good);
    let s2 = host.expr_stmt(bad);
    host.body(vec![s1, s2]);

    let result = host.run();
    assert_eq!(codes(&result), vec![ErrorCode::E2007]);
    assert_eq!(result.expr_type(good), string);
    assert_eq!(result.expr_type(bad), Idx::UNKNOWN);
}

#[test]
fn tuple_destructuring_types_each_binding() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let string = fx.string_ty();
    let a = fx.value("a", Idx::NONE);
    let b = fx.value("b", Idx::NONE);

    let mut host = Host::new(fx);
    let e1 = host.int_lit(1);
    let e2 = host.str_lit("s");
    let init = host.expr(ExprKind::TupleLit {
        elements: vec![e1, e2],
        spread: None,
    });
    let destructure = host.stmt(StmtKind::Destructure {
        pattern: Pattern::Tuple {
            elements: vec![
                Pattern::Var(a.to_ref(), TypeRef::NONE),
                Pattern::Var(b.to_ref(), TypeRef::NONE),
            ],
            rest: None,
        },
        init,
    });
    host.body(vec![destructure]);

    let result = host.run();
    assert_eq!(result.diagnostics, vec![]);
    assert_eq!(host.unit.model.decls.value_type(a), int);
    assert_eq!(host.unit.model.decls.value_type(b), string);
}

#[test]
fn entry_destructuring_splits_key_and_item() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let string = fx.string_ty();
    let k = fx.value("k", Idx::NONE);
    let v = fx.value("v", Idx::NONE);

    let mut host = Host::new(fx);
    let key = host.str_lit("k");
    let value = host.int_lit(1);
    let init = host.expr(ExprKind::EntryLit { key, value });
    let destructure = host.stmt(StmtKind::Destructure {
        pattern: Pattern::Entry {
            key: Box::new(Pattern::Var(k.to_ref(), TypeRef::NONE)),
            value: Box::new(Pattern::Var(v.to_ref(), TypeRef::NONE)),
        },
        init,
    });
    host.body(vec![destructure]);

    let result = host.run();
    assert_eq!(result.diagnostics, vec![]);
    assert_eq!(host.unit.model.decls.value_type(k), string);
    assert_eq!(host.unit.model.decls.value_type(v), int);
}

#[test]
fn comprehensions_feed_variadic_parameters() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let seq_int = fx.model.sequential_of(int);
    let xs = fx.seq_param("xs", int, false);
    let f = fx.function("sum", vec![xs], int);
    let source = fx.value("source", seq_int);
    let item = fx.value("item", Idx::NONE);

    let mut host = Host::new(fx);
    let source_ref = host.ref_to(source);
    let body = host.ref_to(item);
    let call = host.call(
        f,
        vec![Argument::Comprehension(Comprehension {
            binding: item.to_ref(),
            source: source_ref,
            filter: None,
            body,
        })],
    );
    let s = host.expr_stmt(call);
    host.body(vec![s]);

    let result = host.run();
    assert_eq!(result.diagnostics, vec![]);
    assert_eq!(result.expr_type(body), int);
}

#[test]
fn annotated_declarations_check_the_initializer() {
    let mut fx = Fixture::new();
    let string = fx.string_ty();
    let x = fx.value("x", Idx::NONE);

    let mut host = Host::new(fx);
    let t_string = host.unit.add_type(string);
    let init = host.int_lit(1);
    let let_stmt = host.stmt(StmtKind::Let {
        decl: x.to_ref(),
        annotation: t_string,
        init,
    });
    host.body(vec![let_stmt]);

    let result = host.run();
    assert_eq!(codes(&result), vec![ErrorCode::E2001]);
    // The declaration keeps its written type for recovery.
    assert_eq!(host.unit.model.decls.value_type(x), string);
}

#[test]
fn one_unknown_produces_one_diagnostic() {
    let mut fx = Fixture::new();
    let int = fx.integer_ty();
    let a = fx.param("a", int);
    let f = fx.function("inc", vec![a], int);
    let n = fx.value("n", int);

    let mut host = Host::new(fx);
    // `n()` is not invokable; the unknown result then flows into `inc`
    // without a second complaint.
    let inner = host.call(n, Vec::new());
    let call = host.call(f, vec![Argument::Positional(inner)]);
    let s = host.expr_stmt(call);
    host.body(vec![s]);

    let result = host.run();
    assert_eq!(codes(&result), vec![ErrorCode::E2012]);
    assert_eq!(result.expr_type(call), int);
}
