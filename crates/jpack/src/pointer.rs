//! JSON Pointer resolution (RFC 6901).
//!
//! Two entry points over the same walk: [`JsonTree::resolve`] for reads
//! (any miss collapses to [`NIL_NODE`]) and [`JsonTree::resolve_target`]
//! for mutations, which keeps the chain of enclosing containers so the
//! patch operations can fix ancestor spans without re-scanning.
//!
//! Array tokens must be canonical base-10 indices (no sign, no leading
//! zeros); `-` addresses one past the last element and is only meaningful
//! as the final token of an `add`. Array elements are found by a linear
//! scan - no index map is kept.

use crate::error::{Error, Result};
use crate::node::Kind;
use crate::tree::{JsonTree, NIL_NODE, ROOT_NODE};

/// Output of the mutation resolver.
///
/// `parents` is the pre-order chain of container positions - Objects,
/// Arrays, and KeyValue markers - from the root down to the immediate
/// parent of `node`. `node` is [`NIL_NODE`] when the final token names a
/// not-yet-existing object key or the `-` array sentinel; `key` is the
/// final token's text, used when such a key is created.
#[derive(Debug, Clone)]
pub struct Target {
    pub node: u32,
    pub parents: Vec<u32>,
    pub key: String,
}

/// Split a pointer into unescaped reference tokens. `None` on malformed
/// input: a non-empty pointer not starting with `/`, or a stray `~`.
pub(crate) fn parse_pointer(pointer: &str) -> Option<Vec<String>> {
    if pointer.is_empty() {
        return Some(Vec::new());
    }
    let rest = pointer.strip_prefix('/')?;
    rest.split('/').map(unescape_token).collect()
}

fn unescape_token(token: &str) -> Option<String> {
    if !token.contains('~') {
        return Some(token.to_string());
    }
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(ch) = chars.next() {
        if ch != '~' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return None,
        }
    }
    Some(out)
}

/// Parse a canonical array index: digits only, no leading zero except for
/// "0" itself.
fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    token.parse().ok()
}

impl JsonTree {
    /// Resolve a pointer for reading: the target position, or [`NIL_NODE`]
    /// if any segment is missing, kind-mismatched, out of range, or the
    /// pointer is malformed.
    #[must_use]
    pub fn resolve(&self, pointer: &str) -> u32 {
        match self.resolve_target(pointer) {
            Ok(target) => target.node,
            Err(_) => NIL_NODE,
        }
    }

    /// Resolve a pointer for mutation.
    ///
    /// # Errors
    ///
    /// Returns `Error::Path` if the pointer is malformed, an intermediate
    /// segment does not resolve, or a final array index is out of range.
    /// A final token naming a missing object key or `-` is NOT an error:
    /// it comes back with `node == NIL_NODE` so `add` can create it.
    pub fn resolve_target(&self, pointer: &str) -> Result<Target> {
        let fail = || Error::Path {
            pointer: pointer.to_string(),
        };
        let tokens = parse_pointer(pointer).ok_or_else(fail)?;

        if self.is_empty() {
            // Only the root pointer means anything here; add() uses the
            // nil target to re-root the tree.
            return if tokens.is_empty() {
                Ok(Target {
                    node: NIL_NODE,
                    parents: Vec::new(),
                    key: String::new(),
                })
            } else {
                Err(fail())
            };
        }

        let mut node = ROOT_NODE;
        let mut parents = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            let last = i + 1 == tokens.len();
            match self.kind(node) {
                Kind::Object => {
                    let found = self
                        .keys(node)
                        .find(|&pair| self.pair_key(pair) == token.as_str());
                    match found {
                        Some(pair) => {
                            parents.push(node);
                            parents.push(pair);
                            node = self.pair_value(pair);
                        }
                        None if last => {
                            parents.push(node);
                            return Ok(Target {
                                node: NIL_NODE,
                                parents,
                                key: token.clone(),
                            });
                        }
                        None => return Err(fail()),
                    }
                }
                Kind::Array => {
                    if token == "-" {
                        if !last {
                            return Err(fail());
                        }
                        parents.push(node);
                        return Ok(Target {
                            node: NIL_NODE,
                            parents,
                            key: token.clone(),
                        });
                    }
                    let index = parse_index(token).ok_or_else(fail)?;
                    let child = self.sons(node).nth(index).ok_or_else(fail)?;
                    parents.push(node);
                    node = child;
                }
                _ => return Err(fail()),
            }
        }

        let key = tokens.last().cloned().unwrap_or_default();
        Ok(Target { node, parents, key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::from_json;

    fn sample() -> JsonTree {
        from_json(r#"{"a":1,"b":{"c":2,"d":3},"e":[4,5,6]}"#).unwrap()
    }

    #[test]
    fn test_root_pointer() {
        let tree = sample();
        assert_eq!(tree.resolve(""), ROOT_NODE);
        let t = tree.resolve_target("").unwrap();
        assert_eq!(t.node, ROOT_NODE);
        assert!(t.parents.is_empty());
    }

    #[test]
    fn test_object_and_array_walk() {
        let tree = sample();
        let c = tree.resolve("/b/c");
        assert_eq!(tree.kind(c), Kind::Int);
        assert_eq!(tree.atom_text(c), "2");

        let second = tree.resolve("/e/1");
        assert_eq!(tree.atom_text(second), "5");
    }

    #[test]
    fn test_read_misses_are_nil() {
        let tree = sample();
        assert_eq!(tree.resolve("/missing"), NIL_NODE);
        assert_eq!(tree.resolve("/a/deeper"), NIL_NODE);
        assert_eq!(tree.resolve("/e/3"), NIL_NODE);
        assert_eq!(tree.resolve("/e/x"), NIL_NODE);
        assert_eq!(tree.resolve("/e/01"), NIL_NODE);
        assert_eq!(tree.resolve("/e/-"), NIL_NODE);
        assert_eq!(tree.resolve("no-slash"), NIL_NODE);
        assert_eq!(tree.resolve("/b/~2"), NIL_NODE);
    }

    #[test]
    fn test_unescaping() {
        let tree = from_json(r#"{"a/b":1,"m~n":2,"~1":3}"#).unwrap();
        assert_eq!(tree.atom_text(tree.resolve("/a~1b")), "1");
        assert_eq!(tree.atom_text(tree.resolve("/m~0n")), "2");
        assert_eq!(tree.atom_text(tree.resolve("/~01")), "3");
    }

    #[test]
    fn test_empty_key_token() {
        let tree = from_json(r#"{"":{"": 1}}"#).unwrap();
        assert_eq!(tree.atom_text(tree.resolve("//")), "1");
    }

    #[test]
    fn test_mutation_target_parent_chain() {
        let tree = sample();
        let t = tree.resolve_target("/b/c").unwrap();
        // root object, pair "b", object b, pair "c"
        assert_eq!(t.parents.len(), 4);
        assert_eq!(t.parents[0], ROOT_NODE);
        assert_eq!(tree.kind(t.parents[1]), Kind::KeyValue);
        assert_eq!(tree.kind(t.parents[2]), Kind::Object);
        assert_eq!(tree.kind(t.parents[3]), Kind::KeyValue);
        assert_eq!(t.key, "c");
    }

    #[test]
    fn test_mutation_target_new_key() {
        let tree = sample();
        let t = tree.resolve_target("/b/new").unwrap();
        assert_eq!(t.node, NIL_NODE);
        assert_eq!(t.key, "new");
        assert_eq!(tree.kind(*t.parents.last().unwrap()), Kind::Object);
    }

    #[test]
    fn test_mutation_target_append_sentinel() {
        let tree = sample();
        let t = tree.resolve_target("/e/-").unwrap();
        assert_eq!(t.node, NIL_NODE);
        assert_eq!(t.key, "-");
        assert_eq!(tree.kind(*t.parents.last().unwrap()), Kind::Array);
    }

    #[test]
    fn test_mutation_target_failures() {
        let tree = sample();
        // Intermediate miss.
        assert!(tree.resolve_target("/x/y").is_err());
        // Descending into an atom.
        assert!(tree.resolve_target("/a/b").is_err());
        // Out-of-range index, including one-past-the-end.
        assert!(tree.resolve_target("/e/7").is_err());
        assert!(tree.resolve_target("/e/3").is_err());
        // Sentinel not in final position.
        assert!(tree.resolve_target("/e/-/x").is_err());
        // Malformed pointers.
        assert!(tree.resolve_target("a").is_err());
        assert!(tree.resolve_target("/e/~").is_err());
    }

    #[test]
    fn test_empty_tree_resolution() {
        let mut tree = from_json("1").unwrap();
        tree.remove("").unwrap();
        assert_eq!(tree.resolve(""), NIL_NODE);
        let t = tree.resolve_target("").unwrap();
        assert_eq!(t.node, NIL_NODE);
        assert!(t.parents.is_empty());
        assert!(tree.resolve_target("/a").is_err());
    }
}
