//! Diagnostic constructors for the checker.
//!
//! All type rendering funnels through [`Model::display`] so every message
//! prints canonical forms, never the raw pool representation.

use vela_diagnostic::{Diagnostic, ErrorCode, Label};
use vela_ir::{Span, StringInterner};

use crate::{Idx, Model};

pub(crate) struct ErrorCx<'a> {
    pub model: &'a Model,
    pub interner: &'a StringInterner,
}

impl ErrorCx<'_> {
    fn show(&self, ty: Idx) -> String {
        self.model.display(ty, self.interner)
    }

    pub fn not_assignable(&self, span: Span, value: Idx, target: Idx) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2001,
            format!(
                "type `{}` is not assignable to `{}`",
                self.show(value),
                self.show(target)
            ),
        )
    }

    pub fn argument_not_assignable(
        &self,
        span: Span,
        value: Idx,
        target: Idx,
        param: &str,
        callee: &str,
    ) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2001,
            format!(
                "argument of type `{}` is not assignable to parameter `{}` of `{}` (expected `{}`)",
                self.show(value),
                param,
                callee,
                self.show(target)
            ),
        )
    }

    pub fn cannot_infer(&self, span: Span, param: &str, callee: &str) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2002,
            format!("cannot infer type argument `{param}` of `{callee}`"),
        )
    }

    pub fn case_violation(&self, span: Span, param: &str, solved: Idx) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2011,
            format!(
                "inferred type argument `{}` is not one of the enumerated cases of `{param}`",
                self.show(solved)
            ),
        )
    }

    pub fn missing_argument(
        &self,
        span: Span,
        param: &str,
        callee: &str,
        param_span: Span,
    ) -> Diagnostic {
        let d = Diagnostic::error(
            span,
            ErrorCode::E2003,
            format!("missing argument for parameter `{param}` of `{callee}`"),
        );
        if param_span == Span::DUMMY {
            d
        } else {
            d.with_label(Label::new(param_span, format!("`{param}` declared here")))
        }
    }

    pub fn too_many_arguments(&self, span: Span, callee: &str, expected: usize) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2004,
            format!("too many arguments to `{callee}` (at most {expected} accepted)"),
        )
    }

    pub fn spread_not_iterable(&self, span: Span, ty: Idx) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2005,
            format!("spread argument of type `{}` is not iterable", self.show(ty)),
        )
    }

    pub fn unknown_named_argument(&self, span: Span, name: &str, callee: &str) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2006,
            format!("`{callee}` has no parameter named `{name}`"),
        )
    }

    pub fn duplicate_argument(&self, span: Span, name: &str) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2006,
            format!("parameter `{name}` is bound more than once"),
        )
    }

    pub fn ambiguous_overload(&self, span: Span, callee: &str) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2007,
            format!("no single overload of `{callee}` matches these arguments"),
        )
    }

    pub fn narrow_never_holds(&self, span: Span, subject: Idx, tested: Idx) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2008,
            format!(
                "test can never succeed: `{}` is disjoint from `{}`",
                self.show(subject),
                self.show(tested)
            ),
        )
    }

    pub fn narrow_always_holds(&self, span: Span, subject: Idx, tested: Idx) -> Diagnostic {
        Diagnostic::warning(
            span,
            ErrorCode::E2009,
            format!(
                "test always succeeds: `{}` is already a `{}`",
                self.show(subject),
                self.show(tested)
            ),
        )
    }

    pub fn variance_violation(
        &self,
        span: Span,
        param: &str,
        owner: &str,
        position: &str,
    ) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2010,
            format!(
                "type parameter `{param}` of `{owner}` occurs in {position} position"
            ),
        )
    }

    pub fn not_invokable(&self, span: Span, ty: Idx) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2012,
            format!("value of type `{}` is not invokable", self.show(ty)),
        )
    }

    pub fn catch_subsumed(&self, span: Span, ty: Idx, earlier_span: Span) -> Diagnostic {
        Diagnostic::warning(
            span,
            ErrorCode::E2013,
            format!(
                "exceptions of type `{}` are already handled by an earlier clause",
                self.show(ty)
            ),
        )
        .with_label(Label::new(earlier_span, "earlier clause here"))
    }

    pub fn pattern_mismatch(&self, span: Span, pattern: &str, ty: Idx) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2014,
            format!(
                "{pattern} pattern cannot destructure a value of type `{}`",
                self.show(ty)
            ),
        )
    }

    pub fn return_mismatch(&self, span: Span, value: Idx, declared: Idx) -> Diagnostic {
        Diagnostic::error(
            span,
            ErrorCode::E2015,
            format!(
                "returned value of type `{}` does not match the declared return type `{}`",
                self.show(value),
                self.show(declared)
            ),
        )
    }

    pub fn internal(&self, span: Span, detail: &str) -> Diagnostic {
        Diagnostic::error(span, ErrorCode::E9001, format!("internal error: {detail}"))
    }
}
