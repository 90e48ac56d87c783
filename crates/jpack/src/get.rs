//! Typed pointer-addressed readers.
//!
//! The `get_*_or` readers take a caller-provided default and return it on
//! any miss or kind mismatch - the library's only implicit recovery. The
//! `try_*` readers surface the failure instead: `Error::Path` for a
//! missing node, `Error::Kind` for an incompatible one. Numeric readers
//! parse the stored lexeme on demand; floats also accept Int nodes.

use crate::error::{Error, Result};
use crate::node::Kind;
use crate::tree::{JsonTree, NIL_NODE};

impl JsonTree {
    /// Kind of the node a pointer resolves to, or `None` on a miss.
    #[must_use]
    pub fn kind_at(&self, pointer: &str) -> Option<Kind> {
        let pos = self.resolve(pointer);
        (pos != NIL_NODE).then(|| self.kind(pos))
    }

    /// Whether a pointer resolves to a node.
    #[must_use]
    pub fn contains(&self, pointer: &str) -> bool {
        self.resolve(pointer) != NIL_NODE
    }

    /// Boolean at `pointer`, or `default` on miss or kind mismatch.
    #[must_use]
    pub fn get_bool_or(&self, pointer: &str, default: bool) -> bool {
        self.try_bool(pointer).unwrap_or(default)
    }

    /// Integer at `pointer`, or `default` on miss, kind mismatch, or a
    /// lexeme that does not fit `i64`.
    #[must_use]
    pub fn get_int_or(&self, pointer: &str, default: i64) -> i64 {
        self.try_int(pointer).unwrap_or(default)
    }

    /// Float at `pointer` (Int nodes accepted), or `default` on miss or
    /// kind mismatch.
    #[must_use]
    pub fn get_float_or(&self, pointer: &str, default: f64) -> f64 {
        self.try_float(pointer).unwrap_or(default)
    }

    /// String at `pointer`, or `default` on miss or kind mismatch.
    #[must_use]
    pub fn get_str_or<'a>(&'a self, pointer: &str, default: &'a str) -> &'a str {
        self.try_str(pointer).unwrap_or(default)
    }

    /// Boolean at `pointer`.
    ///
    /// # Errors
    ///
    /// `Error::Path` on a miss, `Error::Kind` if the node is not a Bool.
    pub fn try_bool(&self, pointer: &str) -> Result<bool> {
        let pos = self.want(pointer, Kind::Bool)?;
        Ok(self.bool_value(pos))
    }

    /// Integer at `pointer`, parsed from its lexeme.
    ///
    /// # Errors
    ///
    /// `Error::Path` on a miss, `Error::Kind` if the node is not an Int
    /// or its lexeme does not fit `i64`.
    pub fn try_int(&self, pointer: &str) -> Result<i64> {
        let pos = self.want(pointer, Kind::Int)?;
        self.atom_text(pos).parse().map_err(|_| Error::Kind {
            wanted: Kind::Int,
            got: Kind::Int,
        })
    }

    /// Float at `pointer`, parsed from its lexeme. Int nodes convert.
    ///
    /// # Errors
    ///
    /// `Error::Path` on a miss, `Error::Kind` if the node is neither a
    /// Float nor an Int.
    pub fn try_float(&self, pointer: &str) -> Result<f64> {
        let pos = self.resolve_existing(pointer)?;
        let got = self.kind(pos);
        if got != Kind::Float && got != Kind::Int {
            return Err(Error::Kind {
                wanted: Kind::Float,
                got,
            });
        }
        self.atom_text(pos).parse().map_err(|_| Error::Kind {
            wanted: Kind::Float,
            got,
        })
    }

    /// String at `pointer`.
    ///
    /// # Errors
    ///
    /// `Error::Path` on a miss, `Error::Kind` if the node is not a String.
    pub fn try_str(&self, pointer: &str) -> Result<&str> {
        let pos = self.want(pointer, Kind::String)?;
        Ok(self.atom_text(pos))
    }

    fn resolve_existing(&self, pointer: &str) -> Result<u32> {
        let pos = self.resolve(pointer);
        if pos == NIL_NODE {
            return Err(Error::Path {
                pointer: pointer.to_string(),
            });
        }
        Ok(pos)
    }

    fn want(&self, pointer: &str, wanted: Kind) -> Result<u32> {
        let pos = self.resolve_existing(pointer)?;
        let got = self.kind(pos);
        if got != wanted {
            return Err(Error::Kind { wanted, got });
        }
        Ok(pos)
    }
}
