//! Error types for jpack operations.

use std::fmt;

use crate::node::Kind;

/// Error type for jpack operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The input was not valid JSON. Line and column are 1-based and point
    /// at the offending token.
    Parse {
        message: String,
        line: u32,
        column: u32,
    },

    /// A JSON Pointer could not be resolved: a required segment is missing,
    /// an array index is out of range, the pointer is malformed, or a
    /// copy/move source is an ancestor of its destination.
    Path { pointer: String },

    /// A typed accessor found a node of an incompatible kind.
    Kind { wanted: Kind, got: Kind },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse {
                message,
                line,
                column,
            } => {
                write!(f, "parse error at {line}:{column}: {message}")
            }
            Error::Path { pointer } => write!(f, "cannot resolve pointer {pointer:?}"),
            Error::Kind { wanted, got } => {
                write!(f, "expected {}, found {}", wanted.name(), got.name())
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result type alias for jpack operations.
pub type Result<T> = std::result::Result<T, Error>;
