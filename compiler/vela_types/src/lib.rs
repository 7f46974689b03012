//! The semantic core: types, subtyping, inference, and body checking.
//!
//! Everything revolves around one [`Model`] owning the declaration graph
//! and the interned type pool. The algebra (`union_of`, `intersection_of`,
//! `is_subtype`, `supertype`), call-site inference, flow narrowing, and the
//! statement checker are all methods over that model, split across their
//! modules.
//!
//! Entry points:
//! - [`typecheck`] checks every body of a [`Unit`];
//! - [`validate_variance`] validates declaration-site variance on its own;
//! - the `Model` methods serve direct queries (IDE hovers, downstream
//!   lowering).

mod canon;
mod check;
mod decl;
mod error;
mod format;
mod idx;
mod infer;
mod invoke;
mod lang;
mod model;
mod narrow;
mod pool;
mod reference;
mod stack;
mod sub;
mod variance;

#[cfg(test)]
mod testutil;

#[cfg(test)]
mod integration_tests;

pub use check::{Body, CheckOptions, CheckResult, Unit, typecheck};
pub use decl::{
    AliasDecl, ClassDecl, Decl, DeclFlags, DeclId, DeclKind, DeclTable, FunctionDecl,
    InterfaceDecl, Param, ParamList, TypeParamDecl, ValueDecl, Variance,
};
pub use idx::Idx;
pub use infer::{InferenceSource, InferredArg};
pub use lang::Lang;
pub use model::Model;
pub use narrow::Narrowed;
pub use pool::{Pool, SiteVariance, TypeData};
pub use reference::{RefSignature, TypedRef};
pub use variance::validate_variance;
