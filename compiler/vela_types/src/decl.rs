//! The declaration graph.
//!
//! Nodes of the nominal type graph plus the typed declarations (functions,
//! values) the checker assigns types to. Built by the declaration visitor
//! before the core runs; immutable afterwards except for the deferred fields
//! (`extended`, `satisfied`, `cases`) filled by the earlier type visitor and
//! the inferred types the checker writes exactly once.

use bitflags::bitflags;
use vela_ir::{DeclRef, Name, Span};

use crate::Idx;

/// Index of a declaration in the [`DeclTable`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct DeclId(u32);

impl DeclId {
    /// Create from a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        DeclId(raw)
    }

    /// Get the raw index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Convert an AST `DeclRef` handle, `None` for the unresolved sentinel.
    #[inline]
    pub fn from_ref(r: DeclRef) -> Option<Self> {
        r.is_some().then(|| DeclId(r.raw()))
    }

    /// Convert to an AST `DeclRef` handle.
    #[inline]
    pub const fn to_ref(self) -> DeclRef {
        DeclRef::from_raw(self.0)
    }
}

bitflags! {
    /// Declaration modifiers, as attached by the declaration visitor.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct DeclFlags: u16 {
        /// Externally visible.
        const SHARED = 1 << 0;
        /// Declared without an implementation (to be refined).
        const FORMAL = 1 << 1;
        /// Refines an inherited member.
        const ACTUAL = 1 << 2;
        /// Carries a default implementation/argument.
        const DEFAULT = 1 << 3;
        /// Re-assignable value.
        const VARIABLE = 1 << 4;
        /// Cannot be instantiated directly.
        const ABSTRACT = 1 << 5;
        /// Cannot be extended.
        const FINAL = 1 << 6;
        /// Usable as an annotation constructor.
        const ANNOTATION = 1 << 7;
    }
}

/// Declared variance of a type parameter.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Variance {
    /// `out`: may appear only in covariant positions.
    Covariant,
    /// `in`: may appear only in contravariant positions.
    Contravariant,
    /// May appear anywhere; arguments must match exactly.
    Invariant,
}

/// An ordinary generic class.
#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub type_params: Vec<DeclId>,
    /// Declared supertype; deferred, filled before the core runs.
    pub extended: Option<Idx>,
    /// Satisfied interfaces; deferred.
    pub satisfied: Vec<Idx>,
    /// Enumerated case types (`of` clause), empty when open.
    pub cases: Vec<Idx>,
    /// Initializer parameters; `None` for uninstantiable classes.
    pub init_params: Option<ParamList>,
}

/// A generic interface.
#[derive(Clone, Debug)]
pub struct InterfaceDecl {
    pub type_params: Vec<DeclId>,
    pub satisfied: Vec<Idx>,
    pub cases: Vec<Idx>,
}

/// A type parameter declaration.
#[derive(Clone, Debug)]
pub struct TypeParamDecl {
    /// The generic declaration this parameter belongs to.
    pub owner: DeclId,
    pub variance: Variance,
    /// Upper-bound constraint types.
    pub bounds: Vec<Idx>,
    /// Enumerated case constraint (closed set of permitted types).
    pub cases: Vec<Idx>,
    /// Default type argument elided at use sites.
    pub default_arg: Option<Idx>,
    /// When this parameter is the self type of an enclosing declaration,
    /// the declaration it stands for (exempt from variance checking).
    pub self_type_of: Option<DeclId>,
}

/// A type alias.
#[derive(Clone, Debug)]
pub struct AliasDecl {
    pub type_params: Vec<DeclId>,
    pub aliased: Idx,
}

/// A function declaration.
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub type_params: Vec<DeclId>,
    pub params: ParamList,
    /// Declared or inferred return type (`Idx::NONE` until inferred).
    pub ret: Idx,
}

/// A value declaration.
#[derive(Clone, Debug)]
pub struct ValueDecl {
    /// Declared or inferred type (`Idx::NONE` until inferred; set once).
    pub ty: Idx,
}

/// Declaration kinds.
#[derive(Clone, Debug)]
pub enum DeclKind {
    Class(ClassDecl),
    Interface(InterfaceDecl),
    TypeParam(TypeParamDecl),
    Alias(AliasDecl),
    Function(FunctionDecl),
    Value(ValueDecl),
    /// An interop overload set: resolved once per call site to the unique
    /// candidate whose signature matches the argument types.
    Overloaded { candidates: Vec<DeclId> },
}

/// One declared parameter.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: Name,
    /// The parameter type; for a sequenced (variadic) parameter this is the
    /// element type, not the sequence type.
    pub ty: Idx,
    /// The parameter's own value declaration, when one exists.
    pub decl: Option<DeclId>,
    /// Has a default argument; may be left unbound.
    pub defaulted: bool,
    /// Variadic: consumes all remaining positional arguments.
    pub sequenced: bool,
    /// For a sequenced parameter: requires at least one argument (`+`).
    pub at_least_one: bool,
}

impl Param {
    /// True when a call site may leave this parameter unbound.
    pub fn optional(&self) -> bool {
        self.defaulted || (self.sequenced && !self.at_least_one)
    }
}

/// An ordered parameter list.
#[derive(Clone, Debug, Default)]
pub struct ParamList {
    pub params: Vec<Param>,
}

impl ParamList {
    /// Create from a parameter vector.
    pub fn new(params: Vec<Param>) -> Self {
        ParamList { params }
    }
}

/// A declaration-graph node.
#[derive(Clone, Debug)]
pub struct Decl {
    pub name: Name,
    pub span: Span,
    /// Containing declaration (class/interface member, nested value).
    pub container: Option<DeclId>,
    pub flags: DeclFlags,
    pub kind: DeclKind,
}

impl Decl {
    /// Declared type parameters, empty for non-generic declarations.
    pub fn type_params(&self) -> &[DeclId] {
        match &self.kind {
            DeclKind::Class(c) => &c.type_params,
            DeclKind::Interface(i) => &i.type_params,
            DeclKind::Alias(a) => &a.type_params,
            DeclKind::Function(f) => &f.type_params,
            _ => &[],
        }
    }

    /// Enumerated case types, empty for open declarations.
    pub fn case_types(&self) -> &[Idx] {
        match &self.kind {
            DeclKind::Class(c) => &c.cases,
            DeclKind::Interface(i) => &i.cases,
            DeclKind::TypeParam(p) => &p.cases,
            _ => &[],
        }
    }

    /// True for nodes of the nominal type graph.
    pub fn is_type(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::Class(_) | DeclKind::Interface(_) | DeclKind::TypeParam(_) | DeclKind::Alias(_)
        )
    }

    /// True when this declaration is externally visible.
    pub fn is_shared(&self) -> bool {
        self.flags.contains(DeclFlags::SHARED)
    }
}

/// Arena of declarations for a compilation unit (plus the read-only,
/// already-finalized declarations of other modules it refers to).
#[derive(Default)]
pub struct DeclTable {
    decls: Vec<Decl>,
}

impl DeclTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration, returning its id.
    pub fn alloc(&mut self, decl: Decl) -> DeclId {
        let id = DeclId(u32::try_from(self.decls.len()).unwrap_or(u32::MAX));
        self.decls.push(decl);
        id
    }

    /// Look up a declaration.
    pub fn get(&self, id: DeclId) -> &Decl {
        &self.decls[id.0 as usize]
    }

    /// Mutable lookup, for graph construction only.
    pub(crate) fn get_mut_internal(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.0 as usize]
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// True when no declarations exist.
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Iterate over all declarations.
    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (DeclId(i as u32), d))
    }

    // === Deferred-field mutators (used by the earlier phases and, for
    // inferred types, by the checker; each field is written once) ===

    /// Fill a class's deferred extended type.
    pub fn set_extended(&mut self, id: DeclId, extended: Idx) {
        if let DeclKind::Class(c) = &mut self.decls[id.0 as usize].kind {
            c.extended = Some(extended);
        }
    }

    /// Fill a class/interface's deferred satisfied-type list.
    pub fn set_satisfied(&mut self, id: DeclId, satisfied: Vec<Idx>) {
        match &mut self.decls[id.0 as usize].kind {
            DeclKind::Class(c) => c.satisfied = satisfied,
            DeclKind::Interface(i) => i.satisfied = satisfied,
            _ => {}
        }
    }

    /// Fill an enumerated declaration's case-type list.
    pub fn set_cases(&mut self, id: DeclId, cases: Vec<Idx>) {
        match &mut self.decls[id.0 as usize].kind {
            DeclKind::Class(c) => c.cases = cases,
            DeclKind::Interface(i) => i.cases = cases,
            DeclKind::TypeParam(p) => p.cases = cases,
            _ => {}
        }
    }

    /// The resolved type of a value declaration (`Idx::NONE` if not yet set).
    pub fn value_type(&self, id: DeclId) -> Idx {
        match &self.decls[id.0 as usize].kind {
            DeclKind::Value(v) => v.ty,
            _ => Idx::NONE,
        }
    }

    /// Record a value declaration's resolved (explicit or inferred) type.
    ///
    /// A type is set exactly once; re-setting indicates a checker bug.
    pub fn set_value_type(&mut self, id: DeclId, ty: Idx) {
        if let DeclKind::Value(v) = &mut self.decls[id.0 as usize].kind {
            debug_assert!(
                v.ty.is_none() || v.ty == ty,
                "value type set twice for {id:?}"
            );
            v.ty = ty;
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_lookup() {
        let mut table = DeclTable::new();
        let id = table.alloc(Decl {
            name: Name::EMPTY,
            span: Span::DUMMY,
            container: None,
            flags: DeclFlags::SHARED,
            kind: DeclKind::Value(ValueDecl { ty: Idx::NONE }),
        });
        assert_eq!(table.len(), 1);
        assert!(table.get(id).is_shared());
        assert!(!table.get(id).flags.contains(DeclFlags::ANNOTATION));
        assert_eq!(table.value_type(id), Idx::NONE);
    }

    #[test]
    fn value_type_set_once() {
        let mut table = DeclTable::new();
        let id = table.alloc(Decl {
            name: Name::EMPTY,
            span: Span::DUMMY,
            container: None,
            flags: DeclFlags::default(),
            kind: DeclKind::Value(ValueDecl { ty: Idx::NONE }),
        });
        table.set_value_type(id, Idx::NOTHING);
        assert_eq!(table.value_type(id), Idx::NOTHING);
    }

    #[test]
    fn decl_ref_roundtrip() {
        let id = DeclId::from_raw(9);
        assert_eq!(DeclId::from_ref(id.to_ref()), Some(id));
        assert_eq!(DeclId::from_ref(vela_ir::DeclRef::NONE), None);
    }
}
