//! Example of pointer-based access and structural patching.
//!
//! cargo run --package jpack --example pointer_access

use jpack::{JsonTree, from_json, to_json};

fn main() -> Result<(), jpack::Error> {
    let mut doc = from_json(r#"{"users": [{"name": "Amy"}, {"name": "Bob"}]}"#)?;

    // Read through pointers.
    println!("second user: {}", doc.get_str_or("/users/1/name", "?"));

    // Restructure in place: every mutation keeps the packed spans intact.
    doc.add("/users/-", &from_json(r#"{"name": "Cora"}"#)?)?;
    doc.replace("/users/0/name", &JsonTree::string("Amelia"))?;
    doc.move_value("/users/1", "/retired")?;

    println!("document: {}", to_json(&doc));

    // Canonical form: keys sorted, order-insensitive comparison.
    let canon = doc.sorted();
    println!("canonical: {canon}");
    Ok(())
}
