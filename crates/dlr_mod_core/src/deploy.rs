//! Addon slot allocation and loader search-path patching.
//!
//! Everything in this module is pure: callers list the addon directory and
//! parse `gameinfo.gi` themselves, hand the results in, and carry out the
//! returned [`DeploymentPlan`].

use crate::error::{DeployError, Result};
use dlr_kv::DocumentNode;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Highest numbered addon slot the game loads.
pub const MAX_ADDON_SLOT: u8 = 99;

/// Virtual path addon archives are mounted from.
pub const ADDONS_SEARCH_PATH: &str = "citadel/addons";

/// Base content identifiers accepted as `Mod`/`Write` targets, in the order
/// the canonical block lists them.
pub const BASE_CONTENT_IDS: [&str; 2] = ["citadel", "core"];

const GAME_INFO_KEY: &str = "GameInfo";
const FILE_SYSTEM_KEY: &str = "FileSystem";
const SEARCH_PATHS_KEY: &str = "SearchPaths";

static ADDON_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^pak(\d{2})_dir\.vpk$").expect("addon file pattern is valid"));

/// An occupied or chosen numbered addon slot (`pak01_dir.vpk` .. `pak99_dir.vpk`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddonSlot(u8);

impl AddonSlot {
    pub fn new(number: u8) -> Option<Self> {
        (1..=MAX_ADDON_SLOT).contains(&number).then_some(Self(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Parse an addon archive file name. Anything outside the numbered
    /// pattern, or a number outside 01..99, is not a slot.
    pub fn parse_file_name(name: &str) -> Option<Self> {
        let captures = ADDON_FILE_NAME.captures(name)?;
        captures[1].parse().ok().and_then(Self::new)
    }

    pub fn file_name(self) -> String {
        format!("pak{:02}_dir.vpk", self.0)
    }
}

impl fmt::Display for AddonSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pak{:02}", self.0)
    }
}

/// First free slot counting up from 01.
///
/// Duplicates in `occupied` are ignored. Fails with
/// [`DeployError::CapacityExhausted`] rather than reuse a taken slot.
pub fn next_free_slot(occupied: impl IntoIterator<Item = AddonSlot>) -> Result<AddonSlot> {
    let mut numbers: Vec<u8> = occupied.into_iter().map(AddonSlot::number).collect();
    numbers.sort_unstable();
    numbers.dedup();

    let mut candidate = 1u8;
    for number in numbers {
        if number != candidate {
            break;
        }
        candidate += 1;
    }

    AddonSlot::new(candidate).ok_or(DeployError::CapacityExhausted)
}

/// Kind of a search-path mount rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPathKind {
    Game,
    Mod,
    Write,
    /// Any other key (`Game_Language`, `AddonRoot`, ...), kept verbatim.
    Other(String),
}

impl SearchPathKind {
    fn from_key(key: &str) -> Self {
        match key {
            "Game" => SearchPathKind::Game,
            "Mod" => SearchPathKind::Mod,
            "Write" => SearchPathKind::Write,
            other => SearchPathKind::Other(other.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            SearchPathKind::Game => "Game",
            SearchPathKind::Mod => "Mod",
            SearchPathKind::Write => "Write",
            SearchPathKind::Other(key) => key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPathEntry {
    pub kind: SearchPathKind,
    pub path: String,
}

impl SearchPathEntry {
    pub fn new(kind: SearchPathKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Ordered search-path rules, independent of the document they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPaths {
    pub entries: Vec<SearchPathEntry>,
}

impl SearchPaths {
    /// Read a `SearchPaths` block. Nested blocks are ignored.
    pub fn from_block(block: &DocumentNode) -> Self {
        let entries = block
            .children()
            .iter()
            .filter_map(|child| {
                let path = child.value.as_str()?;
                Some(SearchPathEntry::new(SearchPathKind::from_key(&child.name), path))
            })
            .collect();
        Self { entries }
    }

    fn has(&self, kind: &SearchPathKind, accepted: &[&str]) -> bool {
        self.entries
            .iter()
            .any(|entry| &entry.kind == kind && accepted.contains(&entry.path.as_str()))
    }

    /// Whether addon archives are mounted and base content is writable.
    pub fn enables_addons(&self) -> bool {
        self.has(&SearchPathKind::Game, &[ADDONS_SEARCH_PATH])
            && self.has(&SearchPathKind::Mod, &BASE_CONTENT_IDS)
            && self.has(&SearchPathKind::Write, &BASE_CONTENT_IDS)
    }

    /// The block that enables addon loading.
    pub fn canonical() -> Self {
        let [citadel, core] = BASE_CONTENT_IDS;
        Self {
            entries: vec![
                SearchPathEntry::new(SearchPathKind::Game, ADDONS_SEARCH_PATH),
                SearchPathEntry::new(SearchPathKind::Mod, citadel),
                SearchPathEntry::new(SearchPathKind::Write, citadel),
                SearchPathEntry::new(SearchPathKind::Game, citadel),
                SearchPathEntry::new(SearchPathKind::Mod, core),
                SearchPathEntry::new(SearchPathKind::Write, core),
                SearchPathEntry::new(SearchPathKind::Game, core),
            ],
        }
    }

    pub fn to_block(&self) -> DocumentNode {
        let mut block = DocumentNode::object(SEARCH_PATHS_KEY, Vec::new());
        for entry in &self.entries {
            block.push(DocumentNode::new(entry.kind.key(), entry.path.as_str()));
        }
        block
    }
}

/// What to do with the loader configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPathPatch {
    /// Addons already load; leave the file alone.
    Unchanged,
    /// Replace the whole `SearchPaths` block with this one.
    Replace(SearchPaths),
}

impl SearchPathPatch {
    pub fn is_needed(&self) -> bool {
        matches!(self, SearchPathPatch::Replace(_))
    }
}

fn file_system(gameinfo: &DocumentNode) -> Result<&DocumentNode> {
    gameinfo
        .find_child(GAME_INFO_KEY)
        .ok_or(DeployError::MalformedGameInfo(GAME_INFO_KEY))?
        .find_child(FILE_SYSTEM_KEY)
        .ok_or(DeployError::MalformedGameInfo(FILE_SYSTEM_KEY))
}

/// Decide whether `gameinfo` (a parsed `gameinfo.gi` root) needs patching.
///
/// A missing `SearchPaths` block counts as addons not being enabled.
pub fn plan_search_paths(gameinfo: &DocumentNode) -> Result<SearchPathPatch> {
    let current = file_system(gameinfo)?
        .find_child(SEARCH_PATHS_KEY)
        .map(SearchPaths::from_block)
        .unwrap_or_default();

    if current.enables_addons() {
        tracing::debug!("search paths already mount addons");
        Ok(SearchPathPatch::Unchanged)
    } else {
        tracing::debug!(entries = current.entries.len(), "search paths need replacing");
        Ok(SearchPathPatch::Replace(SearchPaths::canonical()))
    }
}

/// Apply a patch produced by [`plan_search_paths`].
///
/// The existing `SearchPaths` block is replaced where it stands; when there
/// is none, the new block is appended to `FileSystem`. Any further
/// `SearchPaths` blocks are dropped.
pub fn apply_search_path_patch(gameinfo: &mut DocumentNode, patch: &SearchPathPatch) -> Result<()> {
    let SearchPathPatch::Replace(paths) = patch else {
        return Ok(());
    };

    let file_system = gameinfo
        .find_child_mut(GAME_INFO_KEY)
        .ok_or(DeployError::MalformedGameInfo(GAME_INFO_KEY))?
        .find_child_mut(FILE_SYSTEM_KEY)
        .ok_or(DeployError::MalformedGameInfo(FILE_SYSTEM_KEY))?;

    let block = paths.to_block();
    match file_system.child_index(SEARCH_PATHS_KEY) {
        Some(index) => {
            if let Some(existing) = file_system.child_at_mut(index) {
                existing.value = block.value;
            }
            // drop any later duplicates while keeping the first in place
            let mut seen = false;
            let kept: Vec<DocumentNode> = file_system
                .children()
                .iter()
                .filter(|child| {
                    if child.name != SEARCH_PATHS_KEY {
                        return true;
                    }
                    let first = !seen;
                    seen = true;
                    first
                })
                .cloned()
                .collect();
            file_system.value = dlr_kv::Value::Object(kept);
        }
        None => file_system.push(block),
    }
    Ok(())
}

/// Everything needed to install the archive into a numbered slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPlan {
    pub slot: AddonSlot,
    pub search_paths: SearchPathPatch,
}

impl DeploymentPlan {
    pub fn file_name(&self) -> String {
        self.slot.file_name()
    }
}

/// Plan an enabled install from the addon directory's file names and the
/// parsed `gameinfo.gi`.
pub fn plan_deployment<I, S>(addon_file_names: I, gameinfo: &DocumentNode) -> Result<DeploymentPlan>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let occupied: Vec<AddonSlot> = addon_file_names
        .into_iter()
        .filter_map(|name| AddonSlot::parse_file_name(name.as_ref()))
        .collect();
    let slot = next_free_slot(occupied.iter().copied())?;
    let search_paths = plan_search_paths(gameinfo)?;

    tracing::debug!(
        occupied = occupied.len(),
        slot = %slot,
        patch = search_paths.is_needed(),
        "planned deployment"
    );
    Ok(DeploymentPlan { slot, search_paths })
}
