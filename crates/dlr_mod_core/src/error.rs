//! Error types for deployment planning.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DeployError>;

/// Conditions that stop a deployment from being planned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    /// Every addon slot from 01 to 99 is taken.
    #[error("no free addon slot: pak01 through pak99 are all in use")]
    CapacityExhausted,

    /// The loader configuration lacks a section the patch needs.
    #[error("malformed gameinfo: missing `{0}` section")]
    MalformedGameInfo(&'static str),
}
