//! Core deployment logic for the Deadlock randomizer.
//!
//! This crate decides where a generated addon archive goes and whether the
//! game's loader configuration has to change for it to load, and finds the
//! Deadlock installation to deploy into.

pub mod deploy;
pub mod error;
mod steam;

pub use deploy::{
    apply_search_path_patch, next_free_slot, plan_deployment, plan_search_paths, AddonSlot,
    DeploymentPlan, SearchPathEntry, SearchPathKind, SearchPathPatch, SearchPaths,
};
pub use error::{DeployError, Result};
pub use steam::{
    auto_detect_deadlock, auto_detect_steam_path, deadlock_from_steam, find_app_library,
    is_valid_deadlock_path, is_valid_steam_path, DeadlockInstall, DEADLOCK_APP_ID,
};
