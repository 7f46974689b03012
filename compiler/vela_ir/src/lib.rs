//! Front-end representation for the Vela compiler.
//!
//! This crate holds what the earlier phases (parser, declaration visitor,
//! type visitor, import resolver) hand to the semantic core:
//!
//! - [`Span`], [`Name`], [`StringInterner`]: source locations and
//!   interned identifiers.
//! - Opaque u32 handles ([`ExprId`], [`DeclRef`], [`TypeRef`], ...):
//!   indices into arenas owned elsewhere.
//! - The flat, arena-allocated AST ([`ExprArena`] and its node types).
//!
//! The semantic declaration graph and the type pool live in `vela_types`;
//! the AST refers to them only through handles so this crate has no
//! dependency on the type model.

mod ast;
mod handle;
mod interner;
mod name;
mod span;

pub use ast::{
    Argument, Block, CatchClause, Comprehension, Condition, Expr, ExprArena, ExprKind, Pattern,
    Stmt, StmtKind,
};
pub use handle::{BlockId, DeclRef, ExprId, StmtId, TypeRef};
pub use interner::StringInterner;
pub use name::Name;
pub use span::Span;
