//! Document tree for Valve KeyValues files.
//!
//! This crate provides the tree every other Deadlock randomizer crate works
//! on, together with the two text formats the pipeline reads and writes:
//!
//! - **KeyValues3** (`.vdata`): [`kv3::parse`] / [`kv3::to_string`]
//! - **KeyValues** (`gameinfo.gi`, `libraryfolders.vdf`): [`kv1::parse`] / [`kv1::to_string`]
//!
//! # Example
//!
//! ```
//! use dlr_kv::kv3;
//!
//! # fn main() -> Result<(), dlr_kv::Error> {
//! let mut doc = kv3::parse(r#"{ hero_atlas = { _base = "hero_base" } }"#)?;
//!
//! let base = doc
//!     .root
//!     .find_path_mut(&["hero_atlas", "_base"])
//!     .expect("present in the document above");
//! base.set_value("hero_other");
//!
//! assert!(kv3::to_string(&doc).contains("hero_other"));
//! assert_eq!(doc.root.find_child("missing"), None);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod json;
pub mod kv1;
pub mod kv3;
mod lexer;
mod node;

pub use error::{Error, Result};
pub use json::to_flat_mapping;
pub use kv3::Kv3Document;
pub use node::{DocumentNode, Value};
