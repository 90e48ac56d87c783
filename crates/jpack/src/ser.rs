//! Minified text output.
//!
//! The serializer walks the node array with an explicit stack so that
//! arbitrarily deep documents cannot exhaust the call stack. Separators
//! are driven by a single `pending_comma` flag; number lexemes are written
//! byte-for-byte as the parser stored them, so a canonical minified input
//! round-trips unchanged.

use crate::node::Kind;
use crate::tree::{JsonTree, ROOT_NODE};

enum Frame {
    /// Emit the subtree rooted at this position.
    Node(u32),
    /// Emit a key, then the pair's value.
    Pair(u32),
    /// Close a container.
    End(char),
}

/// Serialize a tree to minified JSON. An empty tree yields the empty
/// string.
#[must_use]
pub fn to_json(tree: &JsonTree) -> String {
    let mut out = String::with_capacity(tree.len() * 4);
    if tree.is_empty() {
        return out;
    }

    let mut stack = vec![Frame::Node(ROOT_NODE)];
    let mut pending_comma = false;

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::End(close) => {
                out.push(close);
                pending_comma = true;
            }
            Frame::Pair(pair) => {
                if pending_comma {
                    out.push(',');
                }
                write_escaped(&mut out, tree.pair_key(pair));
                out.push(':');
                pending_comma = false;
                stack.push(Frame::Node(tree.pair_value(pair)));
            }
            Frame::Node(pos) => match tree.kind(pos) {
                Kind::Null => {
                    if pending_comma {
                        out.push(',');
                    }
                    out.push_str("null");
                    pending_comma = true;
                }
                Kind::Bool => {
                    if pending_comma {
                        out.push(',');
                    }
                    out.push_str(if tree.bool_value(pos) { "true" } else { "false" });
                    pending_comma = true;
                }
                Kind::Int | Kind::Float => {
                    if pending_comma {
                        out.push(',');
                    }
                    out.push_str(tree.atom_text(pos));
                    pending_comma = true;
                }
                Kind::String => {
                    if pending_comma {
                        out.push(',');
                    }
                    write_escaped(&mut out, tree.atom_text(pos));
                    pending_comma = true;
                }
                Kind::Array => {
                    if pending_comma {
                        out.push(',');
                    }
                    out.push('[');
                    pending_comma = false;
                    stack.push(Frame::End(']'));
                    let elems: Vec<u32> = tree.sons(pos).collect();
                    for &e in elems.iter().rev() {
                        stack.push(Frame::Node(e));
                    }
                }
                Kind::Object => {
                    if pending_comma {
                        out.push(',');
                    }
                    out.push('{');
                    pending_comma = false;
                    stack.push(Frame::End('}'));
                    let pairs: Vec<u32> = tree.keys(pos).collect();
                    for &p in pairs.iter().rev() {
                        stack.push(Frame::Pair(p));
                    }
                }
                Kind::KeyValue => unreachable!("pair markers are emitted via Frame::Pair"),
            },
        }
    }

    out
}

/// Write a string with RFC 8259 escaping: short escapes for the named
/// control characters, `\u00XX` for the rest below 0x20, everything else
/// verbatim.
fn write_escaped(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\x20' => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
