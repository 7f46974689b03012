//! Declaration-site variance validation.
//!
//! An independent structural walk over every shared declaration's written
//! types: a `out` parameter may only occur in covariant (produced)
//! positions and an `in` parameter only in contravariant (consumed) ones.
//! The walk never consults the subtype relation, so a declaration graph
//! that fails here still supports checking bodies.

use vela_diagnostic::Diagnostic;
use vela_ir::StringInterner;

use crate::error::ErrorCx;
use crate::{DeclId, DeclKind, Idx, Model, SiteVariance, TypeData, Variance};

/// The variance of a position in a written type.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Position {
    Covariant,
    Contravariant,
    Invariant,
}

impl Position {
    fn flip(self) -> Self {
        match self {
            Position::Covariant => Position::Contravariant,
            Position::Contravariant => Position::Covariant,
            Position::Invariant => Position::Invariant,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Position::Covariant => "covariant",
            Position::Contravariant => "contravariant",
            Position::Invariant => "invariant",
        }
    }
}

/// Validate every shared declaration; returns one diagnostic per violating
/// type-parameter occurrence.
pub fn validate_variance(model: &Model, interner: &StringInterner) -> Vec<Diagnostic> {
    let mut walk = Walk {
        model,
        interner,
        diags: Vec::new(),
    };
    for (id, decl) in model.decls.iter() {
        if !decl.is_shared() {
            continue;
        }
        walk.check_decl(id);
    }
    walk.diags
}

struct Walk<'a> {
    model: &'a Model,
    interner: &'a StringInterner,
    diags: Vec<Diagnostic>,
}

impl Walk<'_> {
    fn check_decl(&mut self, id: DeclId) {
        let decl = self.model.decls.get(id);
        match &decl.kind {
            DeclKind::Class(c) => {
                if let Some(ext) = c.extended {
                    self.check(id, ext, Position::Covariant);
                }
                for &s in &c.satisfied {
                    self.check(id, s, Position::Covariant);
                }
                for &case in &c.cases {
                    self.check(id, case, Position::Covariant);
                }
                if let Some(init) = &c.init_params {
                    for p in &init.params {
                        self.check(id, p.ty, Position::Contravariant);
                    }
                }
                self.check_own_params(id, &c.type_params);
            }
            DeclKind::Interface(i) => {
                for &s in &i.satisfied {
                    self.check(id, s, Position::Covariant);
                }
                for &case in &i.cases {
                    self.check(id, case, Position::Covariant);
                }
                self.check_own_params(id, &i.type_params);
            }
            DeclKind::Function(f) => {
                if f.ret.is_some() {
                    self.check(id, f.ret, Position::Covariant);
                }
                for p in &f.params.params {
                    self.check(id, p.ty, Position::Contravariant);
                }
                self.check_own_params(id, &f.type_params);
            }
            DeclKind::Value(v) => {
                if v.ty.is_some() {
                    self.check(id, v.ty, Position::Covariant);
                }
            }
            // Aliases are expanded before use; type parameters and overload
            // sets carry no checked positions of their own.
            DeclKind::Alias(_) | DeclKind::TypeParam(_) | DeclKind::Overloaded { .. } => {}
        }
    }

    /// Upper bounds consume the argument, so they are contravariant
    /// positions of the bounded parameter's owner.
    fn check_own_params(&mut self, owner: DeclId, type_params: &[DeclId]) {
        for &tp in type_params {
            if let DeclKind::TypeParam(p) = &self.model.decls.get(tp).kind {
                for &bound in &p.bounds {
                    self.check(owner, bound, Position::Contravariant);
                }
            }
        }
    }

    fn check(&mut self, owner: DeclId, ty: Idx, position: Position) {
        match self.model.pool.data(ty) {
            TypeData::Nothing | TypeData::Unknown => {}

            TypeData::Nominal {
                decl,
                qualifying,
                args,
                variances,
            } => {
                if let DeclKind::TypeParam(p) = &self.model.decls.get(*decl).kind {
                    // A self-type parameter tracks the concrete subtype and
                    // is exempt by construction.
                    if p.self_type_of.is_none() {
                        let declared = self.model.param_variance(*decl);
                        let violation = match declared {
                            Variance::Covariant => position != Position::Covariant,
                            Variance::Contravariant => position != Position::Contravariant,
                            Variance::Invariant => false,
                        };
                        if violation {
                            self.flag(owner, *decl, position);
                        }
                    }
                    return;
                }
                if let Some(q) = qualifying {
                    self.check(owner, *q, position);
                }
                let slots = self.model.decls.get(*decl).type_params().to_vec();
                for (i, &arg) in args.iter().enumerate() {
                    let declared = match variances.get(i) {
                        Some(SiteVariance::Out) => Variance::Covariant,
                        Some(SiteVariance::In) => Variance::Contravariant,
                        _ => slots
                            .get(i)
                            .map(|&s| self.model.param_variance(s))
                            .unwrap_or(Variance::Invariant),
                    };
                    let inner = match declared {
                        Variance::Covariant => position,
                        Variance::Contravariant => position.flip(),
                        Variance::Invariant => Position::Invariant,
                    };
                    self.check(owner, arg, inner);
                }
            }

            TypeData::Union(members) | TypeData::Intersection(members) => {
                for &m in members.iter() {
                    self.check(owner, m, position);
                }
            }

            TypeData::Tuple { elems, tail } => {
                for &e in elems.iter() {
                    self.check(owner, e, position);
                }
                if let Some(t) = tail {
                    self.check(owner, *t, position);
                }
            }

            TypeData::Callable { ret, args } => {
                self.check(owner, *ret, position);
                self.check(owner, *args, position.flip());
            }
        }
    }

    fn flag(&mut self, owner: DeclId, param: DeclId, position: Position) {
        let cx = ErrorCx {
            model: self.model,
            interner: self.interner,
        };
        let owner_decl = self.model.decls.get(owner);
        let param_name = self.interner.resolve(self.model.decls.get(param).name);
        let owner_name = self.interner.resolve(owner_decl.name);
        self.diags.push(cx.variance_violation(
            owner_decl.span,
            &param_name,
            &owner_name,
            position.label(),
        ));
    }
}
