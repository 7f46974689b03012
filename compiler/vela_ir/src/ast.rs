//! Flat AST handed to the semantic core.
//!
//! Arena-allocated: nodes refer to each other through `ExprId`/`StmtId`/
//! `BlockId` indices, never `Box`. Name resolution and explicit-annotation
//! type resolution have already run; references carry `DeclRef` handles and
//! written types carry `TypeRef` handles (`NONE` when unresolved or absent).
//!
//! The core reads this tree exactly once, bottom-up, and records each node's
//! resolved type in its own side table; nothing here is mutated.

use crate::{BlockId, DeclRef, ExprId, Name, Span, StmtId, TypeRef};

/// An expression node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Expression kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    /// The `null` literal.
    NullLit,
    /// A boolean literal.
    BoolLit(bool),
    /// An integer literal.
    IntLit(i64),
    /// A float literal.
    FloatLit(u64),
    /// A string literal (interned content).
    StrLit(Name),

    /// A base reference to a declaration: `foo` or `foo<T>`.
    ///
    /// `type_args` are explicitly written type arguments; empty means
    /// "infer from the use site".
    Ref {
        target: DeclRef,
        type_args: Vec<TypeRef>,
    },

    /// A qualified reference through a receiver: `receiver.member<T>`.
    Member {
        receiver: ExprId,
        member: DeclRef,
        type_args: Vec<TypeRef>,
    },

    /// An invocation: `callee(args)`.
    Invoke {
        callee: ExprId,
        args: Vec<Argument>,
    },

    /// A tuple literal `[a, b, *rest]`.
    TupleLit {
        elements: Vec<ExprId>,
        spread: Option<ExprId>,
    },

    /// An entry literal `key -> value`.
    EntryLit { key: ExprId, value: ExprId },
}

/// A single call-site argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Argument {
    /// An ordinary positional argument.
    Positional(ExprId),
    /// A trailing `*expr` spread of an iterable.
    Spread(ExprId),
    /// A `for`/`if` comprehension producing a lazy sequence.
    Comprehension(Comprehension),
    /// A `name = expr` named argument.
    Named(Name, ExprId),
    /// An un-named block of listed arguments binding to one
    /// iterable-typed parameter.
    SequencedBlock(Vec<ExprId>),
}

/// A one-clause comprehension: `for (binding in source) if (filter) body`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comprehension {
    /// The iteration variable (a fresh value declaration).
    pub binding: DeclRef,
    /// The iterated expression; must be an `Iterable`.
    pub source: ExprId,
    /// Optional filter condition.
    pub filter: Option<Condition>,
    /// The produced element expression.
    pub body: ExprId,
}

/// A statement node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Statement kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StmtKind {
    /// A value declaration: `T name = init` or `value name = init`.
    ///
    /// `annotation` is `TypeRef::NONE` when the type is to be inferred.
    Let {
        decl: DeclRef,
        annotation: TypeRef,
        init: ExprId,
    },

    /// A bare expression statement.
    Expr(ExprId),

    /// `return` with optional value.
    Return(Option<ExprId>),

    /// `if (condition) { then } else { else }`.
    If {
        condition: Condition,
        then_block: BlockId,
        else_block: Option<BlockId>,
    },

    /// `while (condition) { body }`.
    While { condition: Condition, body: BlockId },

    /// A destructuring declaration: `[a, b, *rest] = init` or
    /// `key -> item = init`.
    Destructure { pattern: Pattern, init: ExprId },

    /// `try { body } catch (E1 e1) { .. } catch (E2 e2) { .. }`.
    Try {
        body: BlockId,
        catches: Vec<CatchClause>,
    },
}

/// One `catch (T name) { .. }` clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatchClause {
    /// The caught-exception value declaration.
    pub decl: DeclRef,
    /// The written exception type (`NONE` = the root exception type).
    pub ty: TypeRef,
    pub body: BlockId,
    pub span: Span,
}

/// A boolean condition guarding a branch.
///
/// The typed conditions (`is`/`exists`/`nonempty`) drive flow-sensitive
/// narrowing; `binding` optionally introduces a fresh inline value carrying
/// the narrowed type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    /// `is T subject` / `!is T subject`.
    Is {
        negated: bool,
        binding: Option<DeclRef>,
        subject: ExprId,
        ty: TypeRef,
    },
    /// `exists subject` / `!exists subject`.
    Exists {
        negated: bool,
        binding: Option<DeclRef>,
        subject: ExprId,
    },
    /// `nonempty subject` / `!nonempty subject`.
    Nonempty {
        negated: bool,
        binding: Option<DeclRef>,
        subject: ExprId,
    },
    /// Any other boolean expression (no narrowing information).
    Bool(ExprId),
}

/// A destructuring pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// A simple variable, optionally annotated.
    Var(DeclRef, TypeRef),
    /// `[p0, p1, *rest]` over a tuple- or sequence-typed value.
    Tuple {
        elements: Vec<Pattern>,
        rest: Option<DeclRef>,
    },
    /// `key -> value` over an entry-typed value.
    Entry {
        key: Box<Pattern>,
        value: Box<Pattern>,
    },
}

/// A block: an ordered list of statements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    pub stmts: Vec<StmtId>,
}

/// Arena owning every expression, statement, and block of a unit.
#[derive(Default)]
pub struct ExprArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    blocks: Vec<Block>,
}

impl ExprArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression.
    pub fn alloc_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId::from_raw(u32::try_from(self.exprs.len()).unwrap_or(u32::MAX));
        self.exprs.push(Expr { kind, span });
        id
    }

    /// Allocate a statement.
    pub fn alloc_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        let id = StmtId::from_raw(u32::try_from(self.stmts.len()).unwrap_or(u32::MAX));
        self.stmts.push(Stmt { kind, span });
        id
    }

    /// Allocate a block.
    pub fn alloc_block(&mut self, stmts: Vec<StmtId>) -> BlockId {
        let id = BlockId::from_raw(u32::try_from(self.blocks.len()).unwrap_or(u32::MAX));
        self.blocks.push(Block { stmts });
        id
    }

    /// Look up an expression.
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.raw() as usize]
    }

    /// Look up a statement.
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.raw() as usize]
    }

    /// Look up a block.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.raw() as usize]
    }

    /// Number of expressions allocated.
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_roundtrip() {
        let mut arena = ExprArena::new();
        let lit = arena.alloc_expr(ExprKind::IntLit(3), Span::new(0, 1));
        let stmt = arena.alloc_stmt(StmtKind::Expr(lit), Span::new(0, 2));
        let block = arena.alloc_block(vec![stmt]);

        assert_eq!(arena.expr(lit).kind, ExprKind::IntLit(3));
        assert_eq!(arena.block(block).stmts, vec![stmt]);
        assert_eq!(arena.expr_count(), 1);
    }
}
