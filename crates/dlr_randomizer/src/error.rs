//! Error types for randomization.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A document that must hold top-level entries has none.
    #[error("{0} document has no top-level entries")]
    EmptyDocument(&'static str),

    /// Failed to serialize a categorized projection.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
