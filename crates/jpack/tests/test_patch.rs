//! End-to-end patching scenarios across the public surface.

use jpack::{Error, JsonTree, ROOT_NODE, from_json, to_json};

/// Every mutation must leave the root span covering the whole node array.
fn assert_consistent(tree: &JsonTree) {
    if !tree.is_empty() {
        assert_eq!(tree.span(ROOT_NODE) as usize, tree.len());
    }
}

#[test]
fn test_pipeline_of_mutations_keeps_spans() {
    let mut tree = from_json(r#"{"a":1,"b":{"c":2,"d":3},"e":[4,5,6]}"#).unwrap();

    tree.replace("/e/2", &JsonTree::integer(7)).unwrap();
    assert_consistent(&tree);
    tree.add("/b/e", &from_json(r#"{"f":5}"#).unwrap()).unwrap();
    assert_consistent(&tree);
    tree.remove("/e/0").unwrap();
    assert_consistent(&tree);
    tree.copy("/b/e", "/copied").unwrap();
    assert_consistent(&tree);
    tree.move_value("/b/c", "/e/-").unwrap();
    assert_consistent(&tree);

    assert_eq!(
        to_json(&tree),
        r#"{"a":1,"b":{"d":3,"e":{"f":5}},"e":[5,7,2],"copied":{"f":5}}"#
    );
}

#[test]
fn test_copy_then_remove_restores_original() {
    let original = from_json(r#"{"a":{"deep":[1,2,{"x":null}]},"b":7}"#).unwrap();
    let mut tree = original.clone();
    tree.copy("/a", "/b2").unwrap();
    tree.remove("/b2").unwrap();
    assert!(tree.sorted().equal(&original.sorted()));
}

#[test]
fn test_add_then_remove_is_noop_on_canonical_form() {
    let original = from_json(r#"{"z":1,"a":[true]}"#).unwrap();
    let mut tree = original.clone();
    tree.add("/fresh", &from_json(r#"{"k":"v"}"#).unwrap())
        .unwrap();
    tree.add("/a/0", &JsonTree::null()).unwrap();
    tree.remove("/a/0").unwrap();
    tree.remove("/fresh").unwrap();
    assert!(tree.sorted().equal(&original.sorted()));
}

#[test]
fn test_move_is_copy_plus_remove() {
    let source = r#"{"from":{"v":[1,2]},"to":{}}"#;

    let mut moved = from_json(source).unwrap();
    moved.move_value("/from/v", "/to/v").unwrap();

    let mut manual = from_json(source).unwrap();
    manual.copy("/from/v", "/to/v").unwrap();
    manual.remove("/from/v").unwrap();

    assert!(moved.sorted().equal(&manual.sorted()));
    assert_eq!(to_json(&moved), r#"{"from":{},"to":{"v":[1,2]}}"#);
}

#[test]
fn test_move_ancestor_guard() {
    let mut tree = from_json(r#"{"a":{"b":{}}}"#).unwrap();
    assert!(matches!(
        tree.move_value("/a", "/a/b/inner"),
        Err(Error::Path { .. })
    ));
    // Moving a child up over its parent is fine.
    tree.move_value("/a/b", "/a").unwrap();
    assert_eq!(to_json(&tree), r#"{"a":{}}"#);
}

#[test]
fn test_cross_tree_payloads_reintern() {
    let mut dst = from_json(r#"{"kept":"text"}"#).unwrap();
    let src = from_json(r#"{"text":"kept","n":12}"#).unwrap();

    dst.add("/imported", &src).unwrap();
    assert_eq!(
        to_json(&dst),
        r#"{"kept":"text","imported":{"text":"kept","n":12}}"#
    );
    // Shared texts collapse to one atom each in the destination table.
    let sorted = dst.sorted();
    assert_eq!(sorted.as_tree().atoms().len(), 5); // kept, text, imported, n, 12
}

#[test]
fn test_escaped_pointers_in_mutations() {
    let mut tree = from_json(r#"{"a/b":1,"t~":{"x":2}}"#).unwrap();
    tree.replace("/a~1b", &JsonTree::integer(9)).unwrap();
    tree.remove("/t~0/x").unwrap();
    assert_eq!(to_json(&tree), r#"{"a/b":9,"t~":{}}"#);
}

#[test]
fn test_rebuild_from_empty() {
    let mut tree = from_json("null").unwrap();
    tree.remove("").unwrap();
    assert!(tree.is_empty());

    tree.add("", &from_json("{}").unwrap()).unwrap();
    tree.add("/list", &from_json("[]").unwrap()).unwrap();
    tree.add("/list/-", &JsonTree::integer(1)).unwrap();
    tree.add("/list/0", &JsonTree::integer(0)).unwrap();
    assert_eq!(to_json(&tree), r#"{"list":[0,1]}"#);
    assert_consistent(&tree);
}

#[test]
fn test_extract_is_unaffected_by_later_mutations() {
    let mut tree = from_json(r#"{"a":{"b":[1,2]}}"#).unwrap();
    let sub = tree.extract("/a/b").unwrap();
    tree.remove("/a").unwrap();
    assert_eq!(to_json(&sub), "[1,2]");
    assert_eq!(to_json(&tree), "{}");
}
