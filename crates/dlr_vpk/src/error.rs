use camino::Utf8PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VpkError>;

#[derive(Error, Debug)]
pub enum VpkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Entry paths must be relative, UTF-8, and free of NUL bytes.
    #[error("invalid entry path: {0}")]
    InvalidPath(String),

    #[error("duplicate entry: {0}")]
    DuplicateEntry(String),

    /// A VPK directory file addresses its data with 32-bit offsets.
    #[error("archive data exceeds 4 GiB")]
    TooLarge,

    #[error("not a directory: {0}")]
    NotADirectory(Utf8PathBuf),
}
