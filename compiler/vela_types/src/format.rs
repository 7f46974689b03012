//! Type formatting for diagnostics.

use vela_ir::StringInterner;

use crate::{Idx, Model, SiteVariance, TypeData};

impl Model {
    /// Render a type for a diagnostic message.
    pub fn display(&self, ty: Idx, interner: &StringInterner) -> String {
        if ty.is_none() {
            return "<none>".to_string();
        }
        match self.pool.data(ty) {
            TypeData::Nothing => "Nothing".to_string(),
            TypeData::Unknown => "unknown".to_string(),
            TypeData::Nominal {
                decl,
                qualifying,
                args,
                variances,
            } => {
                let mut out = String::new();
                if let Some(q) = qualifying {
                    out.push_str(&self.display(*q, interner));
                    out.push('.');
                }
                out.push_str(&interner.resolve(self.decls.get(*decl).name));
                if !args.is_empty() {
                    out.push('<');
                    for (i, &a) in args.iter().enumerate() {
                        if i > 0 {
                            out.push(',');
                        }
                        match variances.get(i) {
                            Some(SiteVariance::Out) => out.push_str("out "),
                            Some(SiteVariance::In) => out.push_str("in "),
                            _ => {}
                        }
                        out.push_str(&self.display(a, interner));
                    }
                    out.push('>');
                }
                out
            }
            TypeData::Union(cases) => self.display_joined(cases, "|", interner),
            TypeData::Intersection(parts) => self.display_joined(parts, "&", interner),
            TypeData::Tuple { elems, tail } => {
                let mut out = String::from("[");
                for (i, &e) in elems.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.display(e, interner));
                }
                if let Some(t) = tail {
                    if !elems.is_empty() {
                        out.push_str(", ");
                    }
                    out.push_str(&self.display(*t, interner));
                    out.push('*');
                }
                out.push(']');
                out
            }
            TypeData::Callable { ret, args } => {
                format!(
                    "{}({})",
                    self.display(*ret, interner),
                    self.display(*args, interner)
                )
            }
        }
    }

    fn display_joined(&self, members: &[Idx], sep: &str, interner: &StringInterner) -> String {
        let mut out = String::new();
        for (i, &m) in members.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            // Parenthesize nested algebraic members for readability.
            let rendered = self.display(m, interner);
            let nested = matches!(
                self.pool.data(m),
                TypeData::Union(_) | TypeData::Intersection(_)
            );
            if nested {
                out.push('(');
                out.push_str(&rendered);
                out.push(')');
            } else {
                out.push_str(&rendered);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::testutil::Fixture;
    use crate::Idx;

    #[test]
    fn renders_canonical_forms() {
        let mut fx = Fixture::new();
        let int = fx.integer_ty();
        let string = fx.string_ty();
        assert_eq!(fx.model.display(int, &fx.interner), "Integer");
        assert_eq!(fx.model.display(Idx::NOTHING, &fx.interner), "Nothing");
        assert_eq!(fx.model.display(Idx::UNKNOWN, &fx.interner), "unknown");

        let seq = fx.model.sequence_of(int);
        assert_eq!(fx.model.display(seq, &fx.interner), "Sequence<Integer>");

        let tuple = fx.model.tuple_of(vec![int, string], Some(int));
        assert_eq!(
            fx.model.display(tuple, &fx.interner),
            "[Integer, String, Integer*]"
        );

        let args = fx.model.tuple_of(vec![string], None);
        let callable = fx.model.pool.callable(int, args);
        assert_eq!(
            fx.model.display(callable, &fx.interner),
            "Integer([String])"
        );
    }

    #[test]
    fn union_members_keep_canonical_order() {
        let mut fx = Fixture::new();
        let int = fx.integer_ty();
        let string = fx.string_ty();
        let a = fx.model.union_of(vec![string, int]);
        let b = fx.model.union_of(vec![int, string]);
        assert_eq!(
            fx.model.display(a, &fx.interner),
            fx.model.display(b, &fx.interner)
        );
    }
}
