//! Writer for single-file Valve Pak (VPK version 2) archives.
//!
//! Deadlock loads addons from `pakNN_dir.vpk` files in `game/citadel/addons`.
//! [`VpkBuilder`] packs a directory of compiled resources into one such
//! file, with every entry stored inline after the directory tree.

mod builder;
pub mod error;

pub use builder::*;
pub use error::{Result, VpkError};
