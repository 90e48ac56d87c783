//! The packed JSON tree and its navigation primitives.
//!
//! A [`JsonTree`] owns a pre-order array of [`Node`] words plus the
//! [`AtomTable`] every atom id in those words refers to. Nodes are
//! addressed by their position in the array; the root is always position
//! 0. Positions are NOT stable across mutations - the patching surface
//! therefore takes JSON Pointers, and positions are only meant to be held
//! between mutations.

use std::fmt;

use crate::atom::{AtomId, AtomTable};
use crate::error::{Error, Result};
use crate::node::{Kind, Node};

/// Position of the root node.
pub const ROOT_NODE: u32 = 0;

/// Sentinel position meaning "not found". Never a valid node position.
pub const NIL_NODE: u32 = u32::MAX;

/// A JSON document as a packed pre-order node array plus an atom table.
///
/// Create one with [`from_json`](crate::from_json), a [`TreeBuilder`], or
/// the single-atom constructors; read it through the navigation methods
/// and [typed accessors](crate::JsonTree::get_int_or); restructure it
/// through the [pointer-addressed patch operations](crate::JsonTree::add).
#[derive(Clone, Default)]
pub struct JsonTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) atoms: AtomTable,
}

impl JsonTree {
    // --- Single-atom constructors ---

    /// Tree holding a single `null`.
    #[must_use]
    pub fn null() -> Self {
        Self::atom(Kind::Null, 0)
    }

    /// Tree holding a single boolean.
    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::atom(Kind::Bool, u32::from(value))
    }

    /// Tree holding a single integer.
    #[must_use]
    pub fn integer(value: i64) -> Self {
        let mut tree = JsonTree::default();
        let id = tree.atoms.intern(&value.to_string());
        tree.nodes.push(Node::new(Kind::Int, id.raw()));
        tree
    }

    /// Tree holding a single float.
    ///
    /// # Panics
    ///
    /// Panics if `value` is NaN or infinite (not representable in JSON).
    #[must_use]
    pub fn float(value: f64) -> Self {
        assert!(value.is_finite(), "non-finite float {value} is not JSON");
        let mut tree = JsonTree::default();
        let id = tree.atoms.intern(&format!("{value:?}"));
        tree.nodes.push(Node::new(Kind::Float, id.raw()));
        tree
    }

    /// Tree holding a single string.
    #[must_use]
    pub fn string(value: &str) -> Self {
        let mut tree = JsonTree::default();
        let id = tree.atoms.intern(value);
        tree.nodes.push(Node::new(Kind::String, id.raw()));
        tree
    }

    fn atom(kind: Kind, operand: u32) -> Self {
        JsonTree {
            nodes: vec![Node::new(kind, operand)],
            atoms: AtomTable::new(),
        }
    }

    // --- Size ---

    /// Number of node words in the tree.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no document at all (the state after removing
    /// the root).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The atom table shared by every atom in this tree.
    #[inline]
    #[must_use]
    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    // --- Navigation ---

    /// Kind of the node at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is not a valid position in this tree. Positions
    /// come from the resolver or the iterators and are valid until the
    /// next mutation.
    #[inline]
    #[must_use]
    pub fn kind(&self, pos: u32) -> Kind {
        self.nodes[pos as usize].kind()
    }

    /// Span of the subtree rooted at `pos`: 1 for atoms, the stored
    /// operand for containers.
    #[inline]
    #[must_use]
    pub fn span(&self, pos: u32) -> u32 {
        let node = self.nodes[pos as usize];
        if node.kind().is_atom() { 1 } else { node.operand() }
    }

    /// Position of the first child of a container.
    #[inline]
    #[must_use]
    pub fn first_son(pos: u32) -> u32 {
        pos + 1
    }

    /// Position of the next sibling: `pos` advanced past its subtree.
    #[inline]
    #[must_use]
    pub fn next_child(&self, pos: u32) -> u32 {
        pos + self.span(pos)
    }

    /// Iterator over the direct children of a container. For an Object the
    /// children are its KeyValue markers.
    #[must_use]
    pub fn sons(&self, pos: u32) -> Sons<'_> {
        debug_assert!(self.kind(pos).is_container());
        Sons {
            tree: self,
            cur: pos + 1,
            end: pos + self.span(pos),
        }
    }

    /// Iterator over the KeyValue marker positions of an Object.
    #[must_use]
    pub fn keys(&self, pos: u32) -> Sons<'_> {
        debug_assert_eq!(self.kind(pos), Kind::Object);
        self.sons(pos)
    }

    /// Key text of the KeyValue marker at `pair`.
    #[inline]
    #[must_use]
    pub fn pair_key(&self, pair: u32) -> &str {
        debug_assert_eq!(self.kind(pair), Kind::KeyValue);
        self.atom_text(pair + 1)
    }

    /// Position of the value subtree of the KeyValue marker at `pair`.
    #[inline]
    #[must_use]
    pub fn pair_value(&self, pair: u32) -> u32 {
        debug_assert_eq!(self.kind(pair), Kind::KeyValue);
        pair + 2
    }

    /// Position of the innermost container enclosing `pos`, or `None` for
    /// the root.
    ///
    /// This is an O(n) backward scan: the parent is the nearest preceding
    /// container whose span reaches past `pos`. Mutation paths never call
    /// it - they carry the ancestor chain from the resolver.
    #[must_use]
    pub fn parent(&self, pos: u32) -> Option<u32> {
        if pos == ROOT_NODE || pos as usize >= self.nodes.len() {
            return None;
        }
        let mut p = pos;
        while p > 0 {
            p -= 1;
            let node = self.nodes[p as usize];
            if node.kind().is_container() && p + node.operand() > pos {
                return Some(p);
            }
        }
        None
    }

    // --- Atom access ---

    /// Atom id stored in the node at `pos`, or [`AtomId::NIL`] for kinds
    /// that carry no atom.
    #[inline]
    #[must_use]
    pub fn atom_id(&self, pos: u32) -> AtomId {
        let node = self.nodes[pos as usize];
        match node.kind() {
            Kind::Int | Kind::Float | Kind::String => AtomId::from_raw(node.operand()),
            _ => AtomId::NIL,
        }
    }

    /// Text of the atom at `pos`: the unescaped string, or the verbatim
    /// number lexeme.
    ///
    /// # Panics
    ///
    /// Panics if the node at `pos` is not an Int, Float, or String.
    #[inline]
    #[must_use]
    pub fn atom_text(&self, pos: u32) -> &str {
        let id = self.atom_id(pos);
        assert!(!id.is_nil(), "node at {pos} carries no atom");
        self.atoms.get(id)
    }

    /// Boolean payload of the Bool node at `pos`.
    #[inline]
    #[must_use]
    pub fn bool_value(&self, pos: u32) -> bool {
        debug_assert_eq!(self.kind(pos), Kind::Bool);
        self.nodes[pos as usize].operand() == 1
    }

    // --- Structural comparison ---

    /// Order-sensitive structural equality of whole trees: same shape,
    /// same kinds, atoms equal by text. Object key order matters; compare
    /// [`sorted`](JsonTree::sorted) trees to ignore it.
    #[must_use]
    pub fn structural_eq(&self, other: &JsonTree) -> bool {
        if self.nodes.len() != other.nodes.len() {
            return false;
        }
        if self.is_empty() {
            return true;
        }
        self.subtree_eq(ROOT_NODE, other, ROOT_NODE)
    }

    /// Compare the subtree at `pos` against the subtree at `opos` of
    /// `other`. Atoms compare by text so the two trees may use different
    /// atom tables.
    pub(crate) fn subtree_eq(&self, pos: u32, other: &JsonTree, opos: u32) -> bool {
        let span = self.span(pos);
        if span != other.span(opos) {
            return false;
        }
        for i in 0..span {
            let a = self.nodes[(pos + i) as usize];
            let b = other.nodes[(opos + i) as usize];
            if a.kind() != b.kind() {
                return false;
            }
            let same = match a.kind() {
                Kind::Null => true,
                Kind::Bool | Kind::Object | Kind::Array | Kind::KeyValue => {
                    a.operand() == b.operand()
                }
                Kind::Int | Kind::Float | Kind::String => {
                    self.atoms.get(AtomId::from_raw(a.operand()))
                        == other.atoms.get(AtomId::from_raw(b.operand()))
                }
            };
            if !same {
                return false;
            }
        }
        true
    }

    // --- Subtree extraction ---

    /// Clone the subtree a pointer resolves to into a standalone tree.
    ///
    /// The new tree gets a fresh atom table holding only the atoms the
    /// subtree actually uses.
    ///
    /// # Errors
    ///
    /// Returns `Error::Path` if the pointer does not resolve.
    pub fn extract(&self, pointer: &str) -> Result<JsonTree> {
        let pos = self.resolve(pointer);
        if pos == NIL_NODE {
            return Err(Error::Path {
                pointer: pointer.to_string(),
            });
        }
        let span = self.span(pos) as usize;
        let mut out = JsonTree::default();
        out.nodes.reserve(span);
        for &word in &self.nodes[pos as usize..pos as usize + span] {
            out.nodes.push(match word.kind() {
                Kind::Int | Kind::Float | Kind::String => {
                    let text = self.atoms.get(AtomId::from_raw(word.operand()));
                    Node::new(word.kind(), out.atoms.intern(text).raw())
                }
                _ => word,
            });
        }
        Ok(out)
    }

    // --- Internal construction ---

    /// Append a node word and return its position.
    pub(crate) fn push(&mut self, node: Node) -> u32 {
        let pos = self.nodes.len() as u32;
        self.nodes.push(node);
        pos
    }

    /// Overwrite the operand at `pos` with the span from `pos` to the
    /// current end of the array.
    pub(crate) fn patch_span(&mut self, pos: u32) {
        let span = self.nodes.len() as u32 - pos;
        self.nodes[pos as usize] = self.nodes[pos as usize].with_operand(span);
    }
}

impl fmt::Display for JsonTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::ser::to_json(self))
    }
}

impl fmt::Debug for JsonTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("JsonTree");
        s.field("len", &self.nodes.len());
        if !self.is_empty() {
            s.field("root", &self.kind(ROOT_NODE).name());
        }
        s.field("atoms", &self.atoms.len()).finish()
    }
}

/// Iterator over direct child positions of a container.
pub struct Sons<'a> {
    tree: &'a JsonTree,
    cur: u32,
    end: u32,
}

impl Iterator for Sons<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.cur >= self.end {
            return None;
        }
        let pos = self.cur;
        self.cur = self.tree.next_child(pos);
        Some(pos)
    }
}

/// Incremental tree construction.
///
/// Push atoms and open/close containers in document order; every open
/// container (and the KeyValue pair behind every [`key`](TreeBuilder::key))
/// is back-patched with its span when it completes.
///
/// # Example
///
/// ```
/// use jpack::TreeBuilder;
///
/// let mut b = TreeBuilder::new();
/// b.begin_object();
/// b.key("answer");
/// b.integer(42);
/// b.end();
/// let tree = b.finish();
/// assert_eq!(tree.to_string(), r#"{"answer":42}"#);
/// ```
#[derive(Default)]
pub struct TreeBuilder {
    tree: JsonTree,
    open: Vec<Slot>,
}

enum Slot {
    Container(u32),
    Pair(u32),
}

impl TreeBuilder {
    /// Create a builder for an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `null`.
    pub fn null(&mut self) {
        self.tree.push(Node::new(Kind::Null, 0));
        self.value_done();
    }

    /// Append a boolean.
    pub fn boolean(&mut self, value: bool) {
        self.tree.push(Node::new(Kind::Bool, u32::from(value)));
        self.value_done();
    }

    /// Append an integer.
    pub fn integer(&mut self, value: i64) {
        self.integer_lexeme(&value.to_string());
    }

    /// Append an integer from its textual lexeme, stored verbatim.
    pub fn integer_lexeme(&mut self, lexeme: &str) {
        let id = self.tree.atoms.intern(lexeme);
        self.tree.push(Node::new(Kind::Int, id.raw()));
        self.value_done();
    }

    /// Append a float.
    ///
    /// # Panics
    ///
    /// Panics if `value` is NaN or infinite (not representable in JSON).
    pub fn float(&mut self, value: f64) {
        assert!(value.is_finite(), "non-finite float {value} is not JSON");
        self.float_lexeme(&format!("{value:?}"));
    }

    /// Append a float from its textual lexeme, stored verbatim.
    pub fn float_lexeme(&mut self, lexeme: &str) {
        let id = self.tree.atoms.intern(lexeme);
        self.tree.push(Node::new(Kind::Float, id.raw()));
        self.value_done();
    }

    /// Append a string.
    pub fn string(&mut self, value: &str) {
        let id = self.tree.atoms.intern(value);
        self.tree.push(Node::new(Kind::String, id.raw()));
        self.value_done();
    }

    /// Open an array. Close it with [`end`](TreeBuilder::end).
    pub fn begin_array(&mut self) {
        let pos = self.tree.push(Node::new(Kind::Array, 0));
        self.open.push(Slot::Container(pos));
    }

    /// Open an object. Close it with [`end`](TreeBuilder::end).
    pub fn begin_object(&mut self) {
        let pos = self.tree.push(Node::new(Kind::Object, 0));
        self.open.push(Slot::Container(pos));
    }

    /// Start a key-value pair inside the innermost open object. The next
    /// appended value becomes the pair's value.
    pub fn key(&mut self, key: &str) {
        debug_assert!(matches!(
            self.open.last(),
            Some(Slot::Container(pos)) if self.tree.kind(*pos) == Kind::Object
        ));
        let pair = self.tree.push(Node::new(Kind::KeyValue, 0));
        let id = self.tree.atoms.intern(key);
        self.tree.push(Node::new(Kind::String, id.raw()));
        self.open.push(Slot::Pair(pair));
    }

    /// Close the innermost open container.
    ///
    /// # Panics
    ///
    /// Panics if no container is open, or if an object key is still
    /// awaiting its value.
    pub fn end(&mut self) {
        match self.open.pop() {
            Some(Slot::Container(pos)) => self.tree.patch_span(pos),
            _ => panic!("end() without a matching begin"),
        }
        self.value_done();
    }

    /// Finish building and return the tree.
    ///
    /// # Panics
    ///
    /// Panics if containers are still open or no value was appended.
    #[must_use]
    pub fn finish(self) -> JsonTree {
        assert!(self.open.is_empty(), "unclosed container in builder");
        assert!(!self.tree.is_empty(), "builder holds no value");
        debug_assert_eq!(self.tree.span(ROOT_NODE) as usize, self.tree.len());
        self.tree
    }

    /// A completed value closes the enclosing key-value pair, if any.
    fn value_done(&mut self) {
        if let Some(Slot::Pair(pair)) = self.open.last() {
            let pair = *pair;
            self.tree.patch_span(pair);
            self.open.pop();
        }
    }
}
