//! References to typed declarations through a receiver.
//!
//! A `TypedRef` is the "as seen through this instantiation" view of a
//! member or standalone declaration: its type with the receiver's and the
//! reference's own type arguments substituted in. Owned transiently by the
//! checker; never stored on the AST.

use rustc_hash::FxHashMap;

use crate::{DeclId, DeclKind, Idx, Model, Param, ParamList};

/// The substituted signature of a function or class initializer reference.
#[derive(Clone, Debug)]
pub struct RefSignature {
    /// Parameter list with substituted types.
    pub params: ParamList,
    /// Substituted return (or instantiated class) type.
    pub ret: Idx,
    /// Type parameters the reference leaves unsolved (no explicit argument
    /// and nothing from the receiver), to be inferred at the use site.
    pub unsolved: Vec<DeclId>,
}

/// A declaration reference with its receiver-substituted type.
#[derive(Clone, Debug)]
pub struct TypedRef {
    pub decl: DeclId,
    /// The full type of the reference: the value's type, or a structural
    /// callable for functions and class initializers.
    pub full_type: Idx,
    /// Present for invokable references.
    pub signature: Option<RefSignature>,
}

impl Model {
    /// Resolve a reference to `decl`, seen through an optional receiver
    /// type, with optional explicitly-written type arguments.
    pub fn typed_ref(
        &mut self,
        decl: DeclId,
        receiver: Option<Idx>,
        explicit_args: &[Idx],
    ) -> TypedRef {
        let mut map: FxHashMap<DeclId, Idx> = FxHashMap::default();

        // Receiver substitution: the member is seen through the receiver's
        // instantiation of its containing type.
        if let (Some(recv), Some(container)) = (receiver, self.decls.get(decl).container) {
            if self.decls.get(container).is_type() {
                if let Some(sup) = self.supertype(recv, container) {
                    map = self.substitution_for(sup);
                }
            }
        }

        // The reference's own type arguments.
        let type_params = self.decls.get(decl).type_params().to_vec();
        for (&tp, &arg) in type_params.iter().zip(explicit_args.iter()) {
            map.insert(tp, arg);
        }
        // Elided trailing arguments fall back to declared defaults.
        if explicit_args.len() < type_params.len() {
            for &tp in &type_params[explicit_args.len()..] {
                if let DeclKind::TypeParam(p) = &self.decls.get(tp).kind {
                    if let Some(default) = p.default_arg {
                        let substituted = self.substitute(default, &map);
                        map.insert(tp, substituted);
                    }
                }
            }
        }
        let unsolved: Vec<DeclId> = type_params
            .iter()
            .copied()
            .filter(|tp| !map.contains_key(tp))
            .collect();

        match self.decls.get(decl).kind.clone() {
            DeclKind::Value(v) => {
                let declared = if v.ty.is_none() { Idx::UNKNOWN } else { v.ty };
                let full_type = self.substitute(declared, &map);
                TypedRef {
                    decl,
                    full_type,
                    signature: None,
                }
            }
            DeclKind::Function(f) => {
                let params = self.substitute_params(&f.params, &map);
                let ret = if f.ret.is_none() {
                    Idx::UNKNOWN
                } else {
                    self.substitute(f.ret, &map)
                };
                let args_tuple = self.param_tuple(&params);
                let full_type = self.pool.callable(ret, args_tuple);
                TypedRef {
                    decl,
                    full_type,
                    signature: Some(RefSignature {
                        params,
                        ret,
                        unsolved,
                    }),
                }
            }
            DeclKind::Class(c) => {
                let params = c
                    .init_params
                    .as_ref()
                    .map(|p| self.substitute_params(p, &map))
                    .unwrap_or_default();
                let own_args: Vec<Idx> = type_params
                    .iter()
                    .map(|tp| map.get(tp).copied().unwrap_or_else(|| {
                        // Unsolved parameters stand for themselves until the
                        // call site infers them.
                        self.pool.simple(*tp)
                    }))
                    .collect();
                let ret = self.pool.nominal(decl, &own_args);
                let args_tuple = self.param_tuple(&params);
                let full_type = self.pool.callable(ret, args_tuple);
                TypedRef {
                    decl,
                    full_type,
                    signature: Some(RefSignature {
                        params,
                        ret,
                        unsolved,
                    }),
                }
            }
            // Overload sets are resolved per call site by the invocation
            // checker; a bare reference to one has no principal type.
            _ => TypedRef {
                decl,
                full_type: Idx::UNKNOWN,
                signature: None,
            },
        }
    }

    /// Substitute every parameter type in a list.
    pub(crate) fn substitute_params(
        &mut self,
        params: &ParamList,
        map: &FxHashMap<DeclId, Idx>,
    ) -> ParamList {
        let params = params
            .params
            .iter()
            .map(|p| Param {
                ty: self.substitute(p.ty, map),
                ..p.clone()
            })
            .collect();
        ParamList::new(params)
    }

    /// The argument-type tuple of a parameter list, used as the `args` part
    /// of a structural callable. Defaulted parameters do not contribute a
    /// required element; a sequenced parameter becomes the tail.
    pub(crate) fn param_tuple(&mut self, params: &ParamList) -> Idx {
        let mut elems = Vec::new();
        let mut tail = None;
        for p in &params.params {
            if p.sequenced {
                tail = Some(p.ty);
                break;
            }
            if p.defaulted {
                break;
            }
            elems.push(p.ty);
        }
        self.tuple_of(elems, tail)
    }
}
