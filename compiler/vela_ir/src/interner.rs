//! String interner for identifier storage.
//!
//! O(1) interning and lookup behind a single `RwLock`. The semantic core is
//! single-threaded per unit, so one lock is enough; the interner may still be
//! shared read-mostly between units.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

struct InternState {
    /// Map from string content to index.
    map: FxHashMap<Arc<str>, u32>,
    /// Storage for string contents, indexed by `Name`.
    strings: Vec<Arc<str>>,
}

/// String interner.
///
/// Interned strings get a stable [`Name`] index; the same content always
/// yields the same `Name`.
pub struct StringInterner {
    state: RwLock<InternState>,
}

impl StringInterner {
    /// Create a new interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let empty: Arc<str> = Arc::from("");
        let mut map = FxHashMap::default();
        map.insert(Arc::clone(&empty), 0);
        StringInterner {
            state: RwLock::new(InternState {
                map,
                strings: vec![empty],
            }),
        }
    }

    /// Intern a string, returning its `Name`.
    pub fn intern(&self, s: &str) -> Name {
        {
            let state = self.state.read();
            if let Some(&idx) = state.map.get(s) {
                return Name::from_raw(idx);
            }
        }
        let mut state = self.state.write();
        // Re-check: another caller may have interned between the locks.
        if let Some(&idx) = state.map.get(s) {
            return Name::from_raw(idx);
        }
        let idx = u32::try_from(state.strings.len()).unwrap_or(u32::MAX);
        let content: Arc<str> = Arc::from(s);
        state.strings.push(Arc::clone(&content));
        state.map.insert(content, idx);
        Name::from_raw(idx)
    }

    /// Resolve a `Name` back to its string content.
    ///
    /// Returns the empty string for an unknown index.
    pub fn resolve(&self, name: Name) -> Arc<str> {
        let state = self.state.read();
        state
            .strings
            .get(name.raw() as usize)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&state.strings[0]))
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.state.read().strings.len()
    }

    /// True when only the pre-interned empty string is present.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
