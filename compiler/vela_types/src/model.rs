//! The semantic model of a compilation unit.
//!
//! Bundles the declaration graph, the type pool, and the well-known
//! language declarations, plus the supertype memo shared by every subtype
//! query. All type-algebra operations (`sub`, `canon`, `narrow`, `infer`)
//! are methods on [`Model`], split across their modules.

use rustc_hash::FxHashMap;
use vela_ir::StringInterner;

use crate::{Decl, DeclId, DeclTable, Idx, Lang, Pool, TypeData};

/// The type model: declaration graph + type pool + well-known declarations.
pub struct Model {
    pub decls: DeclTable,
    pub pool: Pool,
    pub lang: Lang,
    /// Memo for `supertype(t, d)` queries; `None` entries double as
    /// in-progress markers, making cyclic graphs a defensive fixed point.
    pub(crate) supertype_memo: FxHashMap<(Idx, DeclId), Option<Idx>>,
}

impl Model {
    /// Create a model over pre-built tables.
    pub fn new(decls: DeclTable, pool: Pool, lang: Lang) -> Self {
        Model {
            decls,
            pool,
            lang,
            supertype_memo: FxHashMap::default(),
        }
    }

    /// Create a fresh model with the well-known language graph installed.
    pub fn with_lang(interner: &StringInterner) -> Self {
        let mut decls = DeclTable::new();
        let mut pool = Pool::new();
        let lang = Lang::install(&mut decls, &mut pool, interner);
        Self::new(decls, pool, lang)
    }

    /// Look up a declaration.
    #[inline]
    pub fn decl(&self, id: DeclId) -> &Decl {
        self.decls.get(id)
    }

    /// Look up interned type data.
    #[inline]
    pub fn data(&self, idx: Idx) -> &TypeData {
        self.pool.data(idx)
    }

    /// The top type `Anything`.
    pub fn anything(&mut self) -> Idx {
        self.pool.simple(self.lang.anything)
    }

    /// True when `idx` is the top type.
    pub fn is_top(&self, idx: Idx) -> bool {
        self.pool.decl_of(idx) == Some(self.lang.anything)
    }

    /// The `Null` type.
    pub fn null_type(&mut self) -> Idx {
        self.pool.simple(self.lang.null)
    }

    /// The `Empty` type.
    pub fn empty_type(&mut self) -> Idx {
        self.pool.simple(self.lang.empty)
    }

    /// `T?`: the union of `ty` with `Null`.
    pub fn optional(&mut self, ty: Idx) -> Idx {
        let null = self.null_type();
        self.union_of(vec![ty, null])
    }

    /// `Iterable<elem>` (possibly empty).
    pub fn iterable_of(&mut self, elem: Idx) -> Idx {
        self.pool.nominal(self.lang.iterable, &[elem])
    }

    /// `Sequential<elem>`: a possibly-empty sequence.
    pub fn sequential_of(&mut self, elem: Idx) -> Idx {
        self.pool.nominal(self.lang.sequential, &[elem])
    }

    /// `Sequence<elem>`: a non-empty sequence.
    pub fn sequence_of(&mut self, elem: Idx) -> Idx {
        self.pool.nominal(self.lang.sequence, &[elem])
    }

    /// `Entry<key, item>`.
    pub fn entry_of(&mut self, key: Idx, item: Idx) -> Idx {
        self.pool.nominal(self.lang.entry, &[key, item])
    }
}
