//! Packed in-memory JSON trees with pointer-addressed structural patching.
//!
//! A [`JsonTree`] stores a whole document as a flat pre-order array of
//! 32-bit node words - 3 bits of kind, 29 bits of operand - plus one
//! interned [`AtomTable`](atom::AtomTable) shared by all strings, keys,
//! and number lexemes. Containers carry the span of their subtree, so
//! navigation is pointer arithmetic and subtree replacement is a single
//! splice; mutations keep every ancestor span consistent.
//!
//! On top of that representation:
//!
//! - [`from_json`] parses text straight into packed form, keeping number
//!   lexemes verbatim; [`to_json`] writes minified text back out.
//! - [`JsonTree::resolve`] walks RFC 6901 JSON Pointers; the structural
//!   operations ([`add`](JsonTree::add), [`remove`](JsonTree::remove),
//!   [`replace`](JsonTree::replace), [`copy`](JsonTree::copy),
//!   [`move_value`](JsonTree::move_value), [`test`](JsonTree::test))
//!   follow RFC 6902 placement rules.
//! - [`JsonTree::sorted`] produces a canonically key-ordered
//!   [`SortedTree`] for order-insensitive equality and duplicate-key
//!   removal.
//!
//! # Example
//!
//! ```
//! use jpack::{JsonTree, from_json, to_json};
//!
//! let mut doc = from_json(r#"{"user":{"name":"amy"},"tags":["a"]}"#)?;
//! assert_eq!(doc.get_str_or("/user/name", ""), "amy");
//!
//! doc.add("/tags/-", &JsonTree::string("b"))?;
//! doc.replace("/user/name", &JsonTree::string("bob"))?;
//! doc.remove("/tags/0")?;
//! assert_eq!(to_json(&doc), r#"{"user":{"name":"bob"},"tags":["b"]}"#);
//! # Ok::<(), jpack::Error>(())
//! ```

pub mod atom;
pub mod error;
pub mod get;
pub mod json;
pub mod node;
pub mod parse;
pub mod patch;
pub mod pointer;
pub mod ser;
pub mod sort;
pub mod tree;

pub use error::{Error, Result};
pub use json::{from_value, to_value};
pub use node::Kind;
pub use parse::{from_json, from_json_bytes, from_json_named};
pub use pointer::Target;
pub use ser::to_json;
pub use sort::SortedTree;
pub use tree::{JsonTree, NIL_NODE, ROOT_NODE, TreeBuilder};
