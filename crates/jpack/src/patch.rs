//! Structural patch operations.
//!
//! The six operations (test, replace, remove, add, copy, move) splice the
//! node array in place and repair ancestor spans through `update_parents`,
//! the single place mutation touches a stored operand. Every operation
//! re-resolves its pointer, validates fully before the first write, and
//! invalidates any positions the caller held.
//!
//! Payloads from another tree are spliced with every atom id re-mapped
//! through this tree's table; atom ids never leak across trees.

use crate::atom::{AtomId, AtomTable};
use crate::error::{Error, Result};
use crate::node::{Kind, Node};
use crate::pointer::Target;
use crate::tree::{JsonTree, NIL_NODE, ROOT_NODE};

/// Record of a completed splice: where it happened, how many words the old
/// content occupied, and the signed length change.
struct Graft {
    start: u32,
    removed: u32,
    delta: i64,
}

impl JsonTree {
    /// Compare the subtree a pointer resolves to against `value`.
    ///
    /// Kinds must match; Int/Float/String atoms compare by text, so the
    /// two trees may use different atom tables; containers compare by
    /// span and contents. Object comparison is order-sensitive - sort
    /// both sides first to ignore key order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Path` if the pointer does not resolve to an
    /// existing node.
    ///
    /// # Panics
    ///
    /// Panics if `value` is an empty tree.
    pub fn test(&self, pointer: &str, value: &JsonTree) -> Result<bool> {
        assert!(!value.is_empty(), "test against an empty tree");
        let target = self.resolve_target(pointer)?;
        if target.node == NIL_NODE {
            return Err(Error::Path {
                pointer: pointer.to_string(),
            });
        }
        Ok(self.subtree_eq(target.node, value, ROOT_NODE))
    }

    /// Replace the subtree a pointer resolves to with a copy of `value`.
    /// Replacing the root overwrites the whole document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Path` if the pointer does not resolve to an
    /// existing node.
    ///
    /// # Panics
    ///
    /// Panics if `value` is an empty tree.
    pub fn replace(&mut self, pointer: &str, value: &JsonTree) -> Result<()> {
        assert!(!value.is_empty(), "replace with an empty tree");
        let target = self.resolve_target(pointer)?;
        if target.node == NIL_NODE {
            return Err(Error::Path {
                pointer: pointer.to_string(),
            });
        }
        let payload = self.reintern_payload(value);
        self.splice_replace(&target, payload);
        Ok(())
    }

    /// Remove the subtree a pointer resolves to. Removing an object member
    /// drops its whole key-value pair; removing the root leaves an empty
    /// tree.
    ///
    /// # Errors
    ///
    /// Returns `Error::Path` if the pointer does not resolve to an
    /// existing node.
    pub fn remove(&mut self, pointer: &str) -> Result<()> {
        let target = self.resolve_target(pointer)?;
        if target.node == NIL_NODE {
            return Err(Error::Path {
                pointer: pointer.to_string(),
            });
        }
        self.remove_resolved(&target);
        Ok(())
    }

    /// Add a copy of `value` at a pointer:
    ///
    /// - a missing final object key is created, appended at the end of
    ///   the object;
    /// - `-` on an array appends;
    /// - an existing array index inserts BEFORE that index;
    /// - anything else that exists is replaced.
    ///
    /// On an empty tree, `add("", value)` installs a new root.
    ///
    /// # Errors
    ///
    /// Returns `Error::Path` if an intermediate segment does not resolve
    /// or a final array index is out of range.
    ///
    /// # Panics
    ///
    /// Panics if `value` is an empty tree.
    pub fn add(&mut self, pointer: &str, value: &JsonTree) -> Result<()> {
        assert!(!value.is_empty(), "add an empty tree");
        let target = self.resolve_target(pointer)?;
        let payload = self.reintern_payload(value);
        self.graft_add(&target, payload);
        Ok(())
    }

    /// Copy the subtree at `from` to `pointer` (same `add` placement
    /// rules). Copying a node onto itself is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::Path` if either pointer fails to resolve, or if
    /// `from` is an ancestor of `pointer`.
    pub fn copy(&mut self, from: &str, pointer: &str) -> Result<()> {
        let Some((src, dst)) = self.resolve_copy_pair(from, pointer)? else {
            return Ok(());
        };
        let payload = self.subtree_payload(src.node);
        self.graft_add(&dst, payload);
        Ok(())
    }

    /// Move the subtree at `from` to `pointer`: a copy followed by removal
    /// of the source, executed in one pass. When the copy overwrites the
    /// source (destination replace swallowed it), the move collapses to
    /// that replace. Moving a node onto itself is a no-op.
    ///
    /// # Errors
    ///
    /// As [`copy`](JsonTree::copy).
    pub fn move_value(&mut self, from: &str, pointer: &str) -> Result<()> {
        let Some((src, dst)) = self.resolve_copy_pair(from, pointer)? else {
            return Ok(());
        };
        let payload = self.subtree_payload(src.node);
        let graft = self.graft_add(&dst, payload);

        // Relocate the recorded source positions across the splice.
        let removed_end = graft.start + graft.removed;
        if src.node >= graft.start && src.node < removed_end {
            // The replaced range contained the source; nothing left to
            // remove.
            return Ok(());
        }
        let shift = |pos: u32| -> u32 {
            if pos >= removed_end {
                (i64::from(pos) + graft.delta) as u32
            } else {
                pos
            }
        };
        let shifted = Target {
            node: shift(src.node),
            parents: src.parents.iter().map(|&p| shift(p)).collect(),
            key: src.key,
        };
        self.remove_resolved(&shifted);
        Ok(())
    }

    // --- Internals ---

    /// Resolve source and destination for copy/move. `None` means the two
    /// pointers name the same node (no-op).
    fn resolve_copy_pair(&self, from: &str, pointer: &str) -> Result<Option<(Target, Target)>> {
        let src = self.resolve_target(from)?;
        if src.node == NIL_NODE {
            return Err(Error::Path {
                pointer: from.to_string(),
            });
        }
        let dst = self.resolve_target(pointer)?;
        if dst.node == src.node {
            return Ok(None);
        }
        // Position membership, not pointer-prefix matching: escaping makes
        // textual prefixes unreliable.
        if dst.parents.contains(&src.node) {
            return Err(Error::Path {
                pointer: pointer.to_string(),
            });
        }
        Ok(Some((src, dst)))
    }

    /// Add the signed span delta to every ancestor operand.
    fn update_parents(&mut self, parents: &[u32], delta: i64) {
        for &p in parents {
            let node = self.nodes[p as usize];
            debug_assert!(node.kind().is_container());
            let span = i64::from(node.operand()) + delta;
            debug_assert!(span > 0);
            self.nodes[p as usize] = node.with_operand(span as u32);
        }
    }

    /// Copy a foreign tree's nodes, re-mapping every atom id through this
    /// tree's table.
    fn reintern_payload(&mut self, value: &JsonTree) -> Vec<Node> {
        value
            .nodes
            .iter()
            .map(|&word| match word.kind() {
                Kind::Int | Kind::Float | Kind::String => {
                    let text = value.atoms.get(AtomId::from_raw(word.operand()));
                    Node::new(word.kind(), self.atoms.intern(text).raw())
                }
                _ => word,
            })
            .collect()
    }

    /// Detach a copy of one of this tree's own subtrees; ids are already
    /// valid here, so no re-interning.
    fn subtree_payload(&self, pos: u32) -> Vec<Node> {
        let span = self.span(pos) as usize;
        self.nodes[pos as usize..pos as usize + span].to_vec()
    }

    /// Replace the subtree at the target in place.
    fn splice_replace(&mut self, target: &Target, payload: Vec<Node>) -> Graft {
        let start = target.node;
        let removed = self.span(start);
        let delta = payload.len() as i64 - i64::from(removed);
        self.nodes
            .splice(start as usize..(start + removed) as usize, payload);
        self.update_parents(&target.parents, delta);
        Graft {
            start,
            removed,
            delta,
        }
    }

    /// Insert `payload` at `at`, shifting everything at or past it.
    fn splice_insert(&mut self, at: u32, parents: &[u32], payload: Vec<Node>) -> Graft {
        let delta = payload.len() as i64;
        self.nodes.splice(at as usize..at as usize, payload);
        self.update_parents(parents, delta);
        Graft {
            start: at,
            removed: 0,
            delta,
        }
    }

    /// `add` placement: create, append, insert-before, or replace.
    fn graft_add(&mut self, target: &Target, payload: Vec<Node>) -> Graft {
        if target.node == NIL_NODE {
            if target.parents.is_empty() {
                // Empty tree: the payload becomes the document.
                let delta = payload.len() as i64;
                self.nodes = payload;
                return Graft {
                    start: ROOT_NODE,
                    removed: 0,
                    delta,
                };
            }
            let &container = target
                .parents
                .last()
                .expect("nil target in a non-empty tree has a parent");
            let at = container + self.span(container);
            match self.kind(container) {
                Kind::Object => {
                    let key_id = self.atoms.intern(&target.key);
                    let mut pair = Vec::with_capacity(payload.len() + 2);
                    pair.push(Node::new(Kind::KeyValue, payload.len() as u32 + 2));
                    pair.push(Node::new(Kind::String, key_id.raw()));
                    pair.extend(payload);
                    self.splice_insert(at, &target.parents, pair)
                }
                Kind::Array => self.splice_insert(at, &target.parents, payload),
                _ => unreachable!("resolver only leaves nil targets under containers"),
            }
        } else if matches!(target.parents.last(), Some(&p) if self.kind(p) == Kind::Array) {
            // Existing array index: insert before it.
            self.splice_insert(target.node, &target.parents, payload)
        } else {
            // Existing object member or root: replace.
            self.splice_replace(target, payload)
        }
    }

    /// Delete the resolved subtree, dropping the enclosing key-value pair
    /// when the parent is an object.
    fn remove_resolved(&mut self, target: &Target) {
        if target.node == ROOT_NODE {
            self.nodes.clear();
            self.atoms = AtomTable::new();
            return;
        }
        let span = self.span(target.node);
        let in_pair =
            matches!(target.parents.last(), Some(&p) if self.kind(p) == Kind::KeyValue);
        let (start, count, parents) = if in_pair {
            // The pair marker and key go too; the marker is not a
            // surviving ancestor, so it is excluded from the span fixup.
            (
                target.node - 2,
                span + 2,
                &target.parents[..target.parents.len() - 1],
            )
        } else {
            (target.node, span, &target.parents[..])
        };
        self.nodes
            .drain(start as usize..(start + count) as usize);
        self.update_parents(parents, -i64::from(count));
    }
}
