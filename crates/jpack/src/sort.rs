//! Canonical ordering, equality, and duplicate-key removal.
//!
//! [`JsonTree::sorted`] re-emits a tree in the same pre-order but with
//! every object's pairs ordered by key text, recursively; the output atom
//! table is built fresh, holding only the atoms actually emitted, in
//! emission order. Arrays keep their element order. On the resulting
//! [`SortedTree`], equality is a plain index-wise comparison and duplicate
//! keys sit next to each other, so deduplication is a single pass.

use crate::atom::AtomId;
use crate::node::{Kind, Node};
use crate::tree::{JsonTree, ROOT_NODE};

/// A tree whose objects are recursively key-ordered.
///
/// Produced by [`JsonTree::sorted`]; the only mutation it supports is
/// [`deduplicate`](SortedTree::deduplicate), which preserves the ordering
/// invariant.
#[derive(Clone, Debug)]
pub struct SortedTree {
    tree: JsonTree,
}

impl JsonTree {
    /// Produce a canonically ordered copy of this tree.
    #[must_use]
    pub fn sorted(&self) -> SortedTree {
        let mut out = JsonTree::default();
        if !self.is_empty() {
            emit_sorted(self, ROOT_NODE, &mut out);
            debug_assert_eq!(out.span(ROOT_NODE) as usize, out.len());
        }
        SortedTree { tree: out }
    }
}

/// Re-emit the subtree at `pos` into `out`, sorting object pairs by key.
fn emit_sorted(src: &JsonTree, pos: u32, out: &mut JsonTree) {
    let word = src.nodes[pos as usize];
    match word.kind() {
        Kind::Null | Kind::Bool => {
            out.push(word);
        }
        Kind::Int | Kind::Float | Kind::String => {
            let id = out.atoms.intern(src.atoms.get(AtomId::from_raw(word.operand())));
            out.push(Node::new(word.kind(), id.raw()));
        }
        Kind::Array => {
            let arr = out.push(Node::new(Kind::Array, 0));
            for child in src.sons(pos) {
                emit_sorted(src, child, out);
            }
            out.patch_span(arr);
        }
        Kind::Object => {
            let mut pairs: Vec<(&str, u32)> = src
                .keys(pos)
                .map(|pair| (src.pair_key(pair), pair))
                .collect();
            // Stable, so equal keys keep their original order and the
            // deduplicator retains the first occurrence.
            pairs.sort_by(|a, b| a.0.cmp(b.0));

            let obj = out.push(Node::new(Kind::Object, 0));
            for (key, pair) in pairs {
                let marker = out.push(Node::new(Kind::KeyValue, 0));
                let id = out.atoms.intern(key);
                out.push(Node::new(Kind::String, id.raw()));
                emit_sorted(src, src.pair_value(pair), out);
                out.patch_span(marker);
            }
            out.patch_span(obj);
        }
        Kind::KeyValue => unreachable!("pair markers are emitted by the Object arm"),
    }
}

impl SortedTree {
    /// Read access to the underlying tree.
    #[inline]
    #[must_use]
    pub fn as_tree(&self) -> &JsonTree {
        &self.tree
    }

    /// Unwrap into the underlying tree.
    #[inline]
    #[must_use]
    pub fn into_tree(self) -> JsonTree {
        self.tree
    }

    /// Whether two sorted trees denote the same document. With key order
    /// canonical on both sides, this is an index-wise comparison.
    #[must_use]
    pub fn equal(&self, other: &SortedTree) -> bool {
        self.tree.structural_eq(&other.tree)
    }

    /// Collapse duplicate object keys, keeping the first occurrence of
    /// each run. Recurses into every retained value. The atom table is
    /// left as-is; re-sort to shed atoms that became unreferenced.
    pub fn deduplicate(&mut self) {
        if self.tree.is_empty() {
            return;
        }
        dedup_at(&mut self.tree, ROOT_NODE);
        debug_assert_eq!(self.tree.span(ROOT_NODE) as usize, self.tree.len());
    }
}

impl std::fmt::Display for SortedTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.tree, f)
    }
}

/// Deduplicate within the subtree at `pos`; returns the signed length
/// change, already applied to `pos`'s own operand.
fn dedup_at(tree: &mut JsonTree, pos: u32) -> i64 {
    match tree.kind(pos) {
        Kind::Object => {
            let mut delta = 0i64;
            let mut end = pos + tree.span(pos);
            let mut cur = pos + 1;
            let mut last_key = AtomId::NIL;
            while cur < end {
                let pair_span = tree.span(cur);
                // Keys were interned into one fresh table by the sorter,
                // so equal text means equal id.
                let key = tree.atom_id(cur + 1);
                if key == last_key {
                    tree.nodes
                        .drain(cur as usize..(cur + pair_span) as usize);
                    end -= pair_span;
                    delta -= i64::from(pair_span);
                } else {
                    last_key = key;
                    let inner = dedup_at(tree, cur + 2);
                    apply_delta(tree, cur, inner);
                    end = (i64::from(end) + inner) as u32;
                    delta += inner;
                    cur = (i64::from(cur + pair_span) + inner) as u32;
                }
            }
            apply_delta(tree, pos, delta);
            delta
        }
        Kind::Array => {
            let mut delta = 0i64;
            let mut end = pos + tree.span(pos);
            let mut cur = pos + 1;
            while cur < end {
                let child_span = tree.span(cur);
                let inner = dedup_at(tree, cur);
                end = (i64::from(end) + inner) as u32;
                delta += inner;
                cur = (i64::from(cur + child_span) + inner) as u32;
            }
            apply_delta(tree, pos, delta);
            delta
        }
        _ => 0,
    }
}

fn apply_delta(tree: &mut JsonTree, pos: u32, delta: i64) {
    if delta != 0 {
        let node = tree.nodes[pos as usize];
        let span = (i64::from(node.operand()) + delta) as u32;
        tree.nodes[pos as usize] = node.with_operand(span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::from_json;

    #[test]
    fn test_sorted_orders_keys_recursively() {
        let tree = from_json(r#"{"b":2,"a":1}"#).unwrap();
        assert_eq!(tree.sorted().to_string(), r#"{"a":1,"b":2}"#);

        let tree = from_json(r#"{"z":{"y":1,"x":2},"m":[{"b":1,"a":2}]}"#).unwrap();
        assert_eq!(
            tree.sorted().to_string(),
            r#"{"m":[{"a":2,"b":1}],"z":{"x":2,"y":1}}"#
        );
    }

    #[test]
    fn test_sorted_preserves_array_order() {
        let tree = from_json("[3,1,2]").unwrap();
        assert_eq!(tree.sorted().to_string(), "[3,1,2]");
    }

    #[test]
    fn test_sorted_rebuilds_atom_table_minimal() {
        let mut tree = from_json(r#"{"a":"x","b":"y"}"#).unwrap();
        tree.remove("/a").unwrap();
        // "a" and "x" linger in the table after removal...
        assert_eq!(tree.atoms().len(), 4);
        // ...but sorting interns only what it emits.
        let sorted = tree.sorted();
        assert_eq!(sorted.as_tree().atoms().len(), 2);
    }

    #[test]
    fn test_sorted_is_idempotent() {
        let tree = from_json(r#"{"b":[{"d":1,"c":2}],"a":null}"#).unwrap();
        let once = tree.sorted();
        let twice = once.as_tree().sorted();
        assert!(once.equal(&twice));
        assert_eq!(once.to_string(), twice.to_string());
    }

    #[test]
    fn test_equal_ignores_key_order() {
        let a = from_json(r#"{"a":1,"b":{"x":[1,2],"y":2}}"#).unwrap();
        let b = from_json(r#"{"b":{"y":2,"x":[1,2]},"a":1}"#).unwrap();
        assert!(a.sorted().equal(&b.sorted()));

        let c = from_json(r#"{"a":1,"b":{"x":[2,1],"y":2}}"#).unwrap();
        assert!(!a.sorted().equal(&c.sorted()));
    }

    #[test]
    fn test_equal_distinguishes_lexemes() {
        // Same numeric value, different spelling: not equal.
        let a = from_json("[1.0]").unwrap();
        let b = from_json("[1.00]").unwrap();
        assert!(!a.sorted().equal(&b.sorted()));
    }

    #[test]
    fn test_deduplicate_keeps_first() {
        let tree = from_json(r#"{"a":1,"a":2}"#).unwrap();
        let mut sorted = tree.sorted();
        sorted.deduplicate();
        assert_eq!(sorted.to_string(), r#"{"a":1}"#);
    }

    #[test]
    fn test_deduplicate_recurses() {
        let tree = from_json(r#"{"b":{"k":1,"k":2,"k":3},"a":[{"x":1,"x":2}],"b":0}"#).unwrap();
        let mut sorted = tree.sorted();
        sorted.deduplicate();
        assert_eq!(sorted.to_string(), r#"{"a":[{"x":1}],"b":{"k":1}}"#);
    }

    #[test]
    fn test_deduplicate_without_duplicates_is_noop() {
        let tree = from_json(r#"{"a":1,"b":[true,{"c":2}]}"#).unwrap();
        let mut sorted = tree.sorted();
        let before = sorted.to_string();
        sorted.deduplicate();
        assert_eq!(sorted.to_string(), before);
    }

    #[test]
    fn test_empty_and_atom_trees() {
        let mut tree = from_json("5").unwrap();
        assert_eq!(tree.sorted().to_string(), "5");
        tree.remove("").unwrap();
        let mut sorted = tree.sorted();
        assert!(sorted.as_tree().is_empty());
        sorted.deduplicate();
        assert!(sorted.as_tree().is_empty());
    }
}
