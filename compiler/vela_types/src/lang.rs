//! The well-known language declarations.
//!
//! The core needs the roots of the nominal graph (`Anything`, `Object`,
//! `Null`), the sequence hierarchy that spreads, variadics, and `nonempty`
//! narrowing rest on, `Entry` for key-value destructuring, and `Exception`
//! for catch clauses. Upstream builds these once per global graph; the
//! installer below is also what test fixtures use.
//!
//! Shape of the installed graph:
//!
//! ```text
//! Anything of Object | Null
//! ├── Object
//! │   ├── Basic (Boolean, Integer, Float, String, Exception extend it)
//! │   └── (Iterable, Sequential, ... satisfy Object)
//! └── Null
//!
//! Iterable<out T>
//! Sequential<out T> satisfies Iterable<T>, of Empty | Sequence<T>
//! Empty satisfies Sequential<Nothing>
//! Sequence<out T> satisfies Sequential<T>
//! Entry<out K, out V>
//! ```

use vela_ir::{Span, StringInterner};

use crate::{
    ClassDecl, Decl, DeclFlags, DeclId, DeclKind, DeclTable, Idx, InterfaceDecl, Pool,
    TypeParamDecl, Variance,
};

/// Handles to the well-known declarations.
#[derive(Clone, Debug)]
pub struct Lang {
    pub anything: DeclId,
    pub object: DeclId,
    pub null: DeclId,
    pub boolean: DeclId,
    pub integer: DeclId,
    pub float: DeclId,
    pub string: DeclId,
    pub iterable: DeclId,
    pub sequential: DeclId,
    pub sequence: DeclId,
    pub empty: DeclId,
    pub entry: DeclId,
    pub exception: DeclId,
}

impl Lang {
    /// Install the well-known graph into fresh tables.
    pub fn install(decls: &mut DeclTable, pool: &mut Pool, interner: &StringInterner) -> Lang {
        let mut b = Builder {
            decls,
            pool,
            interner,
        };

        // Roots. `Anything` is enumerated over Object | Null, filled below
        // the way the deferred-field pass would.
        let anything = b.class("Anything", None, DeclFlags::SHARED | DeclFlags::ABSTRACT);
        let anything_ty = b.pool.simple(anything);
        let object = b.class("Object", Some(anything_ty), DeclFlags::SHARED | DeclFlags::ABSTRACT);
        let null = b.class("Null", Some(anything_ty), DeclFlags::SHARED);
        let object_ty = b.pool.simple(object);
        let null_ty = b.pool.simple(null);
        b.decls.set_cases(anything, vec![object_ty, null_ty]);

        let boolean = b.class("Boolean", Some(object_ty), DeclFlags::SHARED | DeclFlags::FINAL);
        let integer = b.class("Integer", Some(object_ty), DeclFlags::SHARED | DeclFlags::FINAL);
        let float = b.class("Float", Some(object_ty), DeclFlags::SHARED | DeclFlags::FINAL);
        let string = b.class("String", Some(object_ty), DeclFlags::SHARED | DeclFlags::FINAL);
        let exception = b.class("Exception", Some(object_ty), DeclFlags::SHARED);

        // Iterable<out T>
        let iterable = b.interface("Iterable", vec![object_ty]);
        let iterable_t = b.type_param(iterable, "Element", Variance::Covariant);
        b.set_type_params(iterable, vec![iterable_t]);

        // Sequential<out T> satisfies Iterable<T>, of Empty | Sequence<T>
        let sequential = b.interface("Sequential", vec![]);
        let sequential_t = b.type_param(sequential, "Element", Variance::Covariant);
        b.set_type_params(sequential, vec![sequential_t]);
        let sequential_t_ty = b.pool.simple(sequential_t);
        let iterable_of_t = b.pool.nominal(iterable, &[sequential_t_ty]);
        b.decls.set_satisfied(sequential, vec![iterable_of_t, object_ty]);

        // Empty satisfies Sequential<Nothing>
        let empty = b.interface("Empty", vec![]);
        let sequential_nothing = b.pool.nominal(sequential, &[Idx::NOTHING]);
        b.decls.set_satisfied(empty, vec![sequential_nothing, object_ty]);

        // Sequence<out T> satisfies Sequential<T>
        let sequence = b.interface("Sequence", vec![]);
        let sequence_t = b.type_param(sequence, "Element", Variance::Covariant);
        b.set_type_params(sequence, vec![sequence_t]);
        let sequence_t_ty = b.pool.simple(sequence_t);
        let sequential_of_t = b.pool.nominal(sequential, &[sequence_t_ty]);
        b.decls.set_satisfied(sequence, vec![sequential_of_t, object_ty]);

        // Close the sequential case set: Sequential<T> of Empty | Sequence<T>
        let empty_ty = b.pool.simple(empty);
        let sequence_of_t = b.pool.nominal(sequence, &[sequential_t_ty]);
        b.decls.set_cases(sequential, vec![empty_ty, sequence_of_t]);

        // Entry<out K, out V>
        let entry = b.class("Entry", Some(object_ty), DeclFlags::SHARED | DeclFlags::FINAL);
        let entry_k = b.type_param(entry, "Key", Variance::Covariant);
        let entry_v = b.type_param(entry, "Item", Variance::Covariant);
        b.set_type_params(entry, vec![entry_k, entry_v]);

        Lang {
            anything,
            object,
            null,
            boolean,
            integer,
            float,
            string,
            iterable,
            sequential,
            sequence,
            empty,
            entry,
            exception,
        }
    }
}

struct Builder<'a> {
    decls: &'a mut DeclTable,
    pool: &'a mut Pool,
    interner: &'a StringInterner,
}

impl Builder<'_> {
    fn class(&mut self, name: &str, extended: Option<Idx>, flags: DeclFlags) -> DeclId {
        self.decls.alloc(Decl {
            name: self.interner.intern(name),
            span: Span::DUMMY,
            container: None,
            flags,
            kind: DeclKind::Class(ClassDecl {
                type_params: Vec::new(),
                extended,
                satisfied: Vec::new(),
                cases: Vec::new(),
                init_params: None,
            }),
        })
    }

    fn interface(&mut self, name: &str, satisfied: Vec<Idx>) -> DeclId {
        self.decls.alloc(Decl {
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

    fn type_param(&mut self, owner: DeclId, name: &str, variance: Variance) -> DeclId {
        self.decls.alloc(Decl {
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

    fn set_type_params(&mut self, owner: DeclId, params: Vec<DeclId>) {
        match &mut self.decls.get_mut_internal(owner).kind {
            DeclKind::Class(c) => c.type_params = params,
            DeclKind::Interface(i) => i.type_params = params,
            _ => {}
        }
    }
}
