//! Error types for TOML loading, saving and node conversion.
//!
//! Every failure is fail-fast and non-partial: a load that errors leaves the
//! target node untouched, a save that errors writes no bytes.
//!
//! ## Error Categories
//!
//! - **Parse errors**: malformed TOML text, with 1-based line/column
//! - **I/O errors**: source or sink failures, naming the operation that failed
//! - **Representability errors**: node values, keys or roots with no TOML encoding
//! - **Range errors**: integer literals wider than a node integer under the strict policy
//!
//! ## Examples
//!
//! ```rust
//! use toml_node::{Error, Loader};
//!
//! let loader = Loader::builder().build();
//! let result = loader.load_str("title = ");
//!
//! match result {
//!     Err(Error::Parse { line, .. }) => assert_eq!(line, 1),
//!     other => panic!("expected a parse error, got {:?}", other),
//! }
//! ```

use crate::node::{NodeKey, NodePath};
use std::fmt;
use thiserror::Error;

/// The I/O step that failed while reading a source or writing a sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoOperation {
    Open,
    Read,
    Write,
    Close,
}

impl fmt::Display for IoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IoOperation::Open => "open",
            IoOperation::Read => "read",
            IoOperation::Write => "write",
            IoOperation::Close => "close",
        };
        f.write_str(name)
    }
}

/// Represents all possible errors raised while converting between TOML and nodes.
///
/// Each variant carries enough context (a node path or a text position) to
/// locate the offending value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed TOML input
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// Source or sink failure
    #[error("IO error during {operation}: {message}")]
    Io {
        operation: IoOperation,
        message: String,
    },

    /// A node value has no TOML encoding
    #[error("Unrepresentable value at {path}: {type_name} ({reason})")]
    UnrepresentableValue {
        path: NodePath,
        type_name: String,
        reason: String,
    },

    /// The node handed to the serializer is not a map
    #[error("Invalid root shape: expected a map node, found {found}")]
    InvalidRootShape { found: String },

    /// A map key cannot be written as a TOML key
    #[error("Invalid key {key} at {path}: {reason}")]
    InvalidKey {
        path: NodePath,
        key: NodeKey,
        reason: String,
    },

    /// An integer literal does not fit in a node integer
    #[error("Integer {literal} at {path} is out of the 64-bit range")]
    RangeOverflow { path: NodePath, literal: String },

    /// The writing engine rejected a document
    #[error("Encoding error: {0}")]
    Encode(String),

    /// Custom error raised through the serde bridges
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a parse error at a 1-based line and column.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use toml_node::Error;
    ///
    /// let err = Error::parse(3, 7, "expected `=`");
    /// assert!(err.to_string().contains("line 3, column 7"));
    /// ```
    pub fn parse(line: usize, column: usize, msg: &str) -> Self {
        Error::Parse {
            line,
            column,
            message: msg.to_string(),
        }
    }

    /// Creates an I/O error for the given operation.
    pub fn io(operation: IoOperation, err: &std::io::Error) -> Self {
        Error::Io {
            operation,
            message: err.to_string(),
        }
    }

    /// Creates an I/O error from a plain message.
    pub fn io_msg(operation: IoOperation, msg: &str) -> Self {
        Error::Io {
            operation,
            message: msg.to_string(),
        }
    }

    pub fn unrepresentable(path: &NodePath, type_name: &str, reason: &str) -> Self {
        Error::UnrepresentableValue {
            path: path.clone(),
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_root(found: &str) -> Self {
        Error::InvalidRootShape {
            found: found.to_string(),
        }
    }

    pub fn invalid_key(path: &NodePath, key: &NodeKey, reason: &str) -> Self {
        Error::InvalidKey {
            path: path.clone(),
            key: key.clone(),
            reason: reason.to_string(),
        }
    }

    pub fn range_overflow(path: &NodePath, literal: impl fmt::Display) -> Self {
        Error::RangeOverflow {
            path: path.clone(),
            literal: literal.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use toml_node::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_operation() {
        let err = Error::io(
            IoOperation::Open,
            &std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let message = err.to_string();
        assert!(message.contains("during open"));
        assert!(message.contains("no such file"));
    }

    #[test]
    fn test_path_in_messages() {
        let path = NodePath::root()
            .child(NodeKey::from("servers"))
            .child(NodeKey::Index(1));
        let err = Error::unrepresentable(&path, "null", "no null literal");
        assert_eq!(
            err.to_string(),
            "Unrepresentable value at servers[1]: null (no null literal)"
        );

        let err = Error::range_overflow(&path, "1".repeat(40));
        assert!(err.to_string().contains("servers[1]"));
    }
}
