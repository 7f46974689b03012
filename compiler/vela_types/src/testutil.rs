//! Shared fixtures for the unit tests.

use vela_ir::{Span, StringInterner};

use crate::{
    ClassDecl, Decl, DeclFlags, DeclId, DeclKind, FunctionDecl, Idx, InterfaceDecl, Model, Param,
    ParamList, TypeParamDecl, ValueDecl, Variance,
};

/// A model over the installed language graph plus test declarations.
pub(crate) struct Fixture {
    pub interner: StringInterner,
    pub model: Model,
}

impl Fixture {
    pub fn new() -> Self {
        let interner = StringInterner::new();
        let model = Model::with_lang(&interner);
        Fixture { interner, model }
    }

    pub fn simple(&mut self, decl: DeclId) -> Idx {
        self.model.pool.simple(decl)
    }

    pub fn app(&mut self, decl: DeclId, args: &[Idx]) -> Idx {
        self.model.pool.nominal(decl, args)
    }

    pub fn object_ty(&mut self) -> Idx {
        let d = self.model.lang.object;
        self.simple(d)
    }

    pub fn integer_ty(&mut self) -> Idx {
        let d = self.model.lang.integer;
        self.simple(d)
    }

    pub fn float_ty(&mut self) -> Idx {
        let d = self.model.lang.float;
        self.simple(d)
    }

    pub fn string_ty(&mut self) -> Idx {
        let d = self.model.lang.string;
        self.simple(d)
    }

    pub fn boolean_ty(&mut self) -> Idx {
        let d = self.model.lang.boolean;
        self.simple(d)
    }

    pub fn class(&mut self, name: &str, extended: Option<Idx>) -> DeclId {
        self.class_of(name, extended, Vec::new())
    }

    pub fn class_of(&mut self, name: &str, extended: Option<Idx>, cases: Vec<Idx>) -> DeclId {
        let extended = extended.or_else(|| {
            let object = self.model.lang.object;
            Some(self.simple(object))
        });
        self.model.decls.alloc(Decl {
            name: self.interner.intern(name),
            span: Span::DUMMY,
            container: None,
            flags: DeclFlags::SHARED,
            kind: DeclKind::Class(ClassDecl {
                type_params: Vec::new(),
                extended,
                satisfied: Vec::new(),
                cases,
                init_params: Some(ParamList::default()),
            }),
        })
    }

    pub fn interface(&mut self, name: &str, satisfied: Vec<Idx>) -> DeclId {
        self.model.decls.alloc(Decl {
            name: self.interner.intern(name),
            span: Span::DUMMY,
            container: None,
            flags: DeclFlags::SHARED,
            kind: DeclKind::Interface(InterfaceDecl {
                type_params: Vec::new(),
                satisfied,
                cases: Vec::new(),
            }),
        })
    }

    pub fn type_param(&mut self, owner: DeclId, name: &str, variance: Variance) -> DeclId {
        self.model.decls.alloc(Decl {
            name: self.interner.intern(name),
            span: Span::DUMMY,
            container: Some(owner),
            flags: DeclFlags::default(),
            kind: DeclKind::TypeParam(TypeParamDecl {
                owner,
                variance,
                bounds: Vec::new(),
                cases: Vec::new(),
                default_arg: None,
                self_type_of: None,
            }),
        })
    }

    pub fn set_type_params(&mut self, owner: DeclId, params: Vec<DeclId>) {
        match &mut self.model.decls.get_mut_internal(owner).kind {
            DeclKind::Class(c) => c.type_params = params,
            DeclKind::Interface(i) => i.type_params = params,
            DeclKind::Function(f) => f.type_params = params,
            _ => {}
        }
    }

    /// A shared generic class with one parameter of the given variance.
    pub fn generic_class(&mut self, name: &str, variance: Variance) -> (DeclId, DeclId) {
        let decl = self.class(name, None);
        let tp = self.type_param(decl, "Element", variance);
        self.set_type_params(decl, vec![tp]);
        (decl, tp)
    }

    pub fn function(&mut self, name: &str, params: Vec<Param>, ret: Idx) -> DeclId {
        self.model.decls.alloc(Decl {
            name: self.interner.intern(name),
            span: Span::DUMMY,
            container: None,
            flags: DeclFlags::SHARED,
            kind: DeclKind::Function(FunctionDecl {
                type_params: Vec::new(),
                params: ParamList::new(params),
                ret,
            }),
        })
    }

    pub fn value(&mut self, name: &str, ty: Idx) -> DeclId {
        self.model.decls.alloc(Decl {
            name: self.interner.intern(name),
            span: Span::DUMMY,
            container: None,
            flags: DeclFlags::SHARED,
            kind: DeclKind::Value(ValueDecl { ty }),
        })
    }

    pub fn param(&mut self, name: &str, ty: Idx) -> Param {
        Param {
            name: self.interner.intern(name),
            ty,
            decl: None,
            defaulted: false,
            sequenced: false,
            at_least_one: false,
        }
    }

    pub fn defaulted_param(&mut self, name: &str, ty: Idx) -> Param {
        Param {
            defaulted: true,
            ..self.param(name, ty)
        }
    }

    pub fn seq_param(&mut self, name: &str, elem: Idx, at_least_one: bool) -> Param {
        Param {
            sequenced: true,
            at_least_one,
            ..self.param(name, elem)
        }
    }
}
