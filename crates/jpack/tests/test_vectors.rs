//! Tests using the `patches.json` test vectors.

use serde::Deserialize;
use serde_json::Value;

use jpack::{JsonTree, ROOT_NODE, from_value, to_value};

#[derive(Deserialize)]
struct PatchTest {
    description: String,
    doc: Value,
    op: String,
    path: String,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    expected: Option<Value>,
    #[serde(default)]
    error: bool,
    #[serde(default)]
    result: Option<bool>,
}

fn load() -> Vec<PatchTest> {
    let json = include_str!("testdata/patches.json");
    serde_json::from_str(json).expect("failed to parse test vectors")
}

#[test]
fn test_patch_vectors() {
    for case in &load() {
        let mut tree = from_value(&case.doc);
        let payload = case.value.as_ref().map(from_value);

        let outcome = match case.op.as_str() {
            "add" => tree.add(&case.path, payload.as_ref().unwrap()),
            "remove" => tree.remove(&case.path),
            "replace" => tree.replace(&case.path, payload.as_ref().unwrap()),
            "copy" => tree.copy(case.from.as_deref().unwrap(), &case.path),
            "move" => tree.move_value(case.from.as_deref().unwrap(), &case.path),
            "test" => {
                let got = tree
                    .test(&case.path, payload.as_ref().unwrap())
                    .unwrap_or_else(|e| panic!("test op failed for '{}': {e}", case.description));
                assert_eq!(got, case.result.unwrap(), "'{}'", case.description);
                continue;
            }
            other => panic!("unknown op '{other}' in '{}'", case.description),
        };

        if case.error {
            assert!(outcome.is_err(), "'{}' should fail", case.description);
            continue;
        }
        outcome.unwrap_or_else(|e| panic!("'{}' failed: {e}", case.description));

        // Spans must still be consistent after the mutation.
        assert_eq!(
            tree.span(ROOT_NODE) as usize,
            tree.len(),
            "span drift in '{}'",
            case.description
        );
        assert_eq!(
            to_value(&tree),
            *case.expected.as_ref().unwrap(),
            "wrong document after '{}'",
            case.description
        );
    }
}

#[test]
fn test_vector_docs_roundtrip_through_text() {
    for case in &load() {
        let text = serde_json::to_string(&case.doc).unwrap();
        let tree = jpack::from_json(&text)
            .unwrap_or_else(|e| panic!("parse failed for '{}': {e}", case.description));
        assert_eq!(
            jpack::to_json(&tree),
            text,
            "roundtrip failed for '{}'",
            case.description
        );
        // And a full re-parse of our own output parses to an equal tree.
        let again = jpack::from_json(&jpack::to_json(&tree)).unwrap();
        assert!(tree.structural_eq(&again), "'{}'", case.description);
    }
}

#[test]
fn test_sorted_equality_across_key_orders() {
    let a = from_value(&serde_json::json!({"x": [1, {"b": 2, "a": 1}], "y": null}));
    let b = from_value(&serde_json::json!({"y": null, "x": [1, {"a": 1, "b": 2}]}));
    assert!(a.sorted().equal(&b.sorted()));
    assert!(!a.structural_eq(&b));

    let c = from_value(&serde_json::json!({"x": [{"a": 1, "b": 2}, 1], "y": null}));
    assert!(!a.sorted().equal(&c.sorted()));
}

#[test]
fn test_mutations_preserve_meaning_under_serde_view() {
    let mut tree = from_value(&serde_json::json!({"users": [{"name": "amy"}]}));
    tree.add("/users/-", &JsonTree::string("placeholder")).unwrap();
    tree.replace("/users/1", &from_value(&serde_json::json!({"name": "bob"})))
        .unwrap();
    assert_eq!(
        to_value(&tree),
        serde_json::json!({"users": [{"name": "amy"}, {"name": "bob"}]})
    );
}
