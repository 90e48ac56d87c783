//! Conversion to and from `serde_json::Value`.
//!
//! This is the interop seam for code that already lives in the serde_json
//! ecosystem. Conversions preserve document meaning, not lexeme spelling:
//! numbers pass through `serde_json::Number`, so `1e3` comes back as
//! `1000.0`. Use [`from_json`](crate::from_json) /
//! [`to_json`](crate::to_json) when the textual form matters.

use serde_json::Value as JsonValue;

use crate::node::Kind;
use crate::tree::{JsonTree, ROOT_NODE, TreeBuilder};

/// Build a tree from a `serde_json::Value`.
///
/// Integral numbers become Int nodes, all others Float nodes; both store
/// the canonical `serde_json` rendering as their lexeme.
#[must_use]
pub fn from_value(value: &JsonValue) -> JsonTree {
    let mut builder = TreeBuilder::new();
    build_value(&mut builder, value);
    builder.finish()
}

fn build_value(builder: &mut TreeBuilder, value: &JsonValue) {
    match value {
        JsonValue::Null => builder.null(),
        JsonValue::Bool(b) => builder.boolean(*b),
        JsonValue::Number(n) => {
            if n.is_i64() || n.is_u64() {
                builder.integer_lexeme(&n.to_string());
            } else {
                builder.float_lexeme(&n.to_string());
            }
        }
        JsonValue::String(s) => builder.string(s),
        JsonValue::Array(items) => {
            builder.begin_array();
            for item in items {
                build_value(builder, item);
            }
            builder.end();
        }
        JsonValue::Object(fields) => {
            builder.begin_object();
            for (key, field) in fields {
                builder.key(key);
                build_value(builder, field);
            }
            builder.end();
        }
    }
}

/// Convert a tree to a `serde_json::Value`. An empty tree becomes `Null`.
///
/// Int lexemes outside `i64`/`u64` range degrade to `f64`; the rare
/// lexeme outside `f64` range (e.g. `1e999`) becomes `Null`, matching
/// what `serde_json::Number::from_f64` can represent.
#[must_use]
pub fn to_value(tree: &JsonTree) -> JsonValue {
    if tree.is_empty() {
        return JsonValue::Null;
    }
    value_at(tree, ROOT_NODE)
}

fn value_at(tree: &JsonTree, pos: u32) -> JsonValue {
    match tree.kind(pos) {
        Kind::Null => JsonValue::Null,
        Kind::Bool => JsonValue::Bool(tree.bool_value(pos)),
        Kind::Int => {
            let lexeme = tree.atom_text(pos);
            if let Ok(n) = lexeme.parse::<i64>() {
                JsonValue::Number(n.into())
            } else if let Ok(n) = lexeme.parse::<u64>() {
                JsonValue::Number(n.into())
            } else {
                float_value(lexeme)
            }
        }
        Kind::Float => float_value(tree.atom_text(pos)),
        Kind::String => JsonValue::String(tree.atom_text(pos).to_string()),
        Kind::Array => JsonValue::Array(tree.sons(pos).map(|c| value_at(tree, c)).collect()),
        Kind::Object => {
            let mut fields = serde_json::Map::new();
            for pair in tree.keys(pos) {
                fields.insert(
                    tree.pair_key(pair).to_string(),
                    value_at(tree, tree.pair_value(pair)),
                );
            }
            JsonValue::Object(fields)
        }
        Kind::KeyValue => unreachable!("pair markers are consumed by the Object arm"),
    }
}

fn float_value(lexeme: &str) -> JsonValue {
    lexeme
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or(JsonValue::Null, JsonValue::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::from_json;

    #[test]
    fn test_roundtrip_through_serde() {
        let text = r#"{"name":"alice","age":30,"tags":["a","b"],"extra":null}"#;
        let tree = from_json(text).unwrap();
        let value = to_value(&tree);
        let back = from_value(&value);
        assert!(tree.sorted().equal(&back.sorted()));

        let direct: JsonValue = serde_json::from_str(text).unwrap();
        assert_eq!(value, direct);
    }

    #[test]
    fn test_numbers() {
        let value: JsonValue = serde_json::from_str("[1,2.5,-7,18446744073709551615]").unwrap();
        let tree = from_value(&value);
        assert_eq!(tree.kind_at("/0"), Some(Kind::Int));
        assert_eq!(tree.kind_at("/1"), Some(Kind::Float));
        assert_eq!(tree.get_int_or("/2", 0), -7);
        assert_eq!(to_value(&tree), value);
    }

    #[test]
    fn test_lexeme_spelling_not_preserved() {
        let tree = from_json("1e3").unwrap();
        let value = to_value(&tree);
        assert_eq!(value, serde_json::json!(1000.0));
    }

    #[test]
    fn test_huge_int_degrades_to_float() {
        let tree = from_json("100000000000000000000").unwrap();
        assert_eq!(to_value(&tree), serde_json::json!(1e20));
    }

    #[test]
    fn test_empty_tree_is_null() {
        let mut tree = from_json("0").unwrap();
        tree.remove("").unwrap();
        assert_eq!(to_value(&tree), JsonValue::Null);
    }
}
