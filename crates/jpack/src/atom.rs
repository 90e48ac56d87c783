//! Interned atom storage.
//!
//! [`AtomTable`] maps text to small dense ids and back. Forward lookups go
//! through a `Vec<Arc<str>>` (O(1) index, zero hashing); reverse lookups
//! through a `HashMap<Arc<str>, AtomId>` sharing the same `Arc` - each
//! string is allocated once. The table is insert-only; ids are assigned
//! monotonically starting at 1 and stay stable for the table's lifetime.
//!
//! All atoms of one tree share one table: string values, object keys, and
//! the verbatim lexemes of numbers.

use std::sync::Arc;

use hashbrown::HashMap;

/// Id of an interned atom. Id 0 ([`AtomId::NIL`]) is reserved for "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(u32);

impl AtomId {
    /// The reserved "absent" id.
    pub const NIL: AtomId = AtomId(0);

    /// Reconstruct an id from its raw value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        AtomId(raw)
    }

    /// Get the raw id value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this is the reserved "absent" id.
    #[inline]
    #[must_use]
    pub const fn is_nil(self) -> bool {
        self.0 == 0
    }
}

/// Append-only bidirectional text <-> id table.
#[derive(Clone, Default)]
pub struct AtomTable {
    entries: Vec<Arc<str>>,
    reverse: HashMap<Arc<str>, AtomId>,
}

impl AtomTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the id for `text`, interning it if absent.
    pub fn intern(&mut self, text: &str) -> AtomId {
        if let Some(&id) = self.reverse.get(text) {
            return id;
        }
        let entry: Arc<str> = Arc::from(text);
        let id = AtomId(self.entries.len() as u32 + 1);
        self.entries.push(Arc::clone(&entry));
        self.reverse.insert(entry, id);
        id
    }

    /// Get the id for `text`, or [`AtomId::NIL`] if it was never interned.
    #[must_use]
    pub fn lookup(&self, text: &str) -> AtomId {
        self.reverse.get(text).copied().unwrap_or(AtomId::NIL)
    }

    /// Get the text for a live id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is [`AtomId::NIL`] or was not produced by this table.
    #[inline]
    #[must_use]
    pub fn get(&self, id: AtomId) -> &str {
        &self.entries[(id.0 - 1) as usize]
    }

    /// Number of interned atoms.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no atoms.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for AtomTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomTable")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let mut t = AtomTable::new();
        let a = t.intern("hello");
        let b = t.intern("world");
        let c = t.intern("hello");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_ids_start_at_one() {
        let mut t = AtomTable::new();
        let a = t.intern("x");
        assert_eq!(a.raw(), 1);
        assert!(!a.is_nil());
    }

    #[test]
    fn test_lookup_absent() {
        let mut t = AtomTable::new();
        t.intern("present");
        assert_eq!(t.lookup("present").raw(), 1);
        assert!(t.lookup("absent").is_nil());
    }

    #[test]
    fn test_get_roundtrip() {
        let mut t = AtomTable::new();
        let a = t.intern("3.25e1");
        assert_eq!(t.get(a), "3.25e1");
    }

    #[test]
    fn test_clone_is_verbatim() {
        let mut t = AtomTable::new();
        let a = t.intern("a");
        let b = t.intern("b");
        let cloned = t.clone();
        assert_eq!(cloned.get(a), "a");
        assert_eq!(cloned.get(b), "b");
        assert_eq!(cloned.lookup("b"), b);
        assert_eq!(cloned.len(), 2);
    }

    #[test]
    fn test_empty_string_is_a_valid_atom() {
        let mut t = AtomTable::new();
        let e = t.intern("");
        assert!(!e.is_nil());
        assert_eq!(t.get(e), "");
    }
}
