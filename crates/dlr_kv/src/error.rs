//! Error types for document parsing.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a KeyValues document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The text is not valid KeyValues syntax.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// The document ended while a block, array or string was still open.
    #[error("unexpected end of document: {0}")]
    UnexpectedEof(String),

    /// The KV3 root is not an object.
    #[error("document root must be an object")]
    RootNotObject,
}
