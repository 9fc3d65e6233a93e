//! Steam and Deadlock path detection and validation utilities.

use camino::{Utf8Path, Utf8PathBuf};
use dlr_kv::{kv1, DocumentNode};
use std::fs;
use sysinfo::{Disks, System};

/// Deadlock's Steam app id.
pub const DEADLOCK_APP_ID: &str = "1422450";

/// A Deadlock installation rooted at `steamapps/common/Deadlock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlockInstall {
    pub root: Utf8PathBuf,
    /// `game/citadel`
    pub game_dir: Utf8PathBuf,
    pub addons_dir: Utf8PathBuf,
    pub gameinfo_path: Utf8PathBuf,
}

impl DeadlockInstall {
    /// Lay out the paths of an installation root without touching the disk.
    pub fn from_root(root: impl Into<Utf8PathBuf>) -> Self {
        let root = root.into();
        let game_dir = root.join("game").join("citadel");
        Self {
            addons_dir: game_dir.join("addons"),
            gameinfo_path: game_dir.join("gameinfo.gi"),
            game_dir,
            root,
        }
    }

    /// The installation inside a Steam library folder, if it exists.
    pub fn from_library(library: &Utf8Path) -> Option<Self> {
        let root = library.join("steamapps").join("common").join("Deadlock");
        root.is_dir().then(|| Self::from_root(root))
    }

    /// File names currently in the addons directory. A missing directory
    /// has no files.
    pub fn addon_file_names(&self) -> std::io::Result<Vec<String>> {
        if !self.addons_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.addons_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Validates if a path is a Deadlock installation root.
pub fn is_valid_deadlock_path(path: &Utf8Path) -> bool {
    DeadlockInstall::from_root(path).gameinfo_path.is_file()
}

/// Validates if a path is a Steam installation directory.
pub fn is_valid_steam_path(path: &Utf8Path) -> bool {
    library_folders_path(path).is_file()
}

fn library_folders_path(steam: &Utf8Path) -> Utf8PathBuf {
    steam.join("config").join("libraryfolders.vdf")
}

/// Find the library folder that lists `app_id` in a parsed
/// `libraryfolders.vdf`.
pub fn find_app_library(library_folders: &DocumentNode, app_id: &str) -> Option<Utf8PathBuf> {
    library_folders
        .find_child("libraryfolders")?
        .children()
        .iter()
        .find(|library| library.find_path(&["apps", app_id]).is_some())?
        .find_child("path")?
        .value
        .as_str()
        .map(Utf8PathBuf::from)
}

/// Get all available drives using sysinfo (cross-platform).
fn get_available_drives() -> Vec<String> {
    let disks = Disks::new_with_refreshed_list();

    let mut drives: Vec<String> = disks
        .iter()
        .filter_map(|disk| disk.mount_point().to_str().map(|s| s.to_string()))
        .collect();

    // Fallback to common Windows drives if detection fails
    if drives.is_empty() && cfg!(target_os = "windows") {
        drives = ["C:", "D:", "E:", "F:"].into_iter().map(String::from).collect();
    }

    drives
}

/// Detect Steam from the current user's registry key.
fn detect_from_registry() -> Option<Utf8PathBuf> {
    if cfg!(not(target_os = "windows")) {
        return None;
    }

    let output = std::process::Command::new("reg")
        .args(["query", "HKCU\\Software\\Valve\\Steam", "/v", "SteamPath"])
        .output()
        .ok()?;

    let stdout = String::from_utf8(output.stdout).ok()?;

    stdout
        .lines()
        .filter(|line| line.contains("SteamPath") && line.contains("REG_SZ"))
        .filter_map(|line| line.split("REG_SZ").nth(1))
        .map(|path| Utf8PathBuf::from(path.trim()))
        .find(|path| is_valid_steam_path(path))
}

/// Detect Steam from a running client process.
fn detect_from_running_process() -> Option<Utf8PathBuf> {
    let system = System::new_all();

    ["steam.exe", "steam"].into_iter().find_map(|name| {
        system.processes_by_name(name.as_ref()).find_map(|process| {
            let exe = process
                .exe()
                .and_then(|p| Utf8PathBuf::from_path_buf(p.to_path_buf()).ok())?;
            // Linux clients run from ~/.steam/steam/ubuntu12_32/steam
            exe.ancestors()
                .skip(1)
                .take(3)
                .find(|dir| is_valid_steam_path(dir))
                .map(Utf8Path::to_path_buf)
        })
    })
}

/// Check common installation paths on all available drives and in the
/// user's home directory.
fn detect_from_common_paths() -> Option<Utf8PathBuf> {
    let mut paths_to_check = Vec::new();

    for drive in get_available_drives() {
        let drive_root = Utf8PathBuf::from(drive.trim_end_matches(['\\', '/']));
        paths_to_check.push(drive_root.join("Program Files (x86)").join("Steam"));
        paths_to_check.push(drive_root.join("Program Files").join("Steam"));
        paths_to_check.push(drive_root.join("Steam"));
        paths_to_check.push(drive_root.join("SteamLibrary"));
    }

    if let Ok(home) = std::env::var("HOME") {
        let home = Utf8PathBuf::from(home);
        paths_to_check.push(home.join(".steam").join("steam"));
        paths_to_check.push(home.join(".local").join("share").join("Steam"));
    }

    paths_to_check
        .into_iter()
        .find(|path| is_valid_steam_path(path))
}

/// Auto-detect the Steam installation directory.
///
/// Detection methods (in order of reliability):
/// 1. Windows Registry (`HKCU\Software\Valve\Steam\SteamPath`)
/// 2. Running Steam process
/// 3. Common installation paths
pub fn auto_detect_steam_path() -> Option<Utf8PathBuf> {
    detect_from_registry()
        .or_else(detect_from_running_process)
        .or_else(detect_from_common_paths)
}

/// Locate Deadlock through a Steam installation's library folders.
pub fn deadlock_from_steam(steam: &Utf8Path) -> Option<DeadlockInstall> {
    let contents = fs::read_to_string(library_folders_path(steam)).ok()?;
    let library_folders = match kv1::parse(&contents) {
        Ok(root) => root,
        Err(err) => {
            tracing::warn!(%err, "could not parse libraryfolders.vdf");
            return None;
        }
    };
    let library = find_app_library(&library_folders, DEADLOCK_APP_ID)?;
    DeadlockInstall::from_library(&library)
}

/// Auto-detect the Deadlock installation.
pub fn auto_detect_deadlock() -> Option<DeadlockInstall> {
    let steam = auto_detect_steam_path()?;
    tracing::debug!(%steam, "found steam installation");
    deadlock_from_steam(&steam)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const LIBRARY_FOLDERS: &str = r#"
"libraryfolders"
{
    "0"
    {
        "path"      "C:\\Program Files (x86)\\Steam"
        "label"     ""
        "apps"
        {
            "228980"    "412343603"
        }
    }
    "1"
    {
        "path"      "D:\\SteamLibrary"
        "apps"
        {
            "1422450"   "21474836480"
        }
    }
}
"#;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn finds_library_holding_the_app() {
        let folders = kv1::parse(LIBRARY_FOLDERS).unwrap();
        assert_eq!(
            find_app_library(&folders, DEADLOCK_APP_ID),
            Some(Utf8PathBuf::from("D:\\SteamLibrary"))
        );
        assert_eq!(find_app_library(&folders, "570"), None);
    }

    #[test]
    fn install_layout() {
        let install = DeadlockInstall::from_root("/games/Deadlock");
        assert_eq!(install.game_dir, Utf8PathBuf::from("/games/Deadlock/game/citadel"));
        assert_eq!(
            install.addons_dir,
            Utf8PathBuf::from("/games/Deadlock/game/citadel/addons")
        );
        assert_eq!(
            install.gameinfo_path,
            Utf8PathBuf::from("/games/Deadlock/game/citadel/gameinfo.gi")
        );
    }

    #[test]
    fn resolves_install_through_steam_config() {
        let steam_dir = TempDir::new().unwrap();
        let library_dir = TempDir::new().unwrap();
        let steam = utf8(&steam_dir);
        let library = utf8(&library_dir);

        let install = DeadlockInstall::from_root(library.join("steamapps/common/Deadlock"));
        fs::create_dir_all(&install.game_dir).unwrap();
        fs::write(&install.gameinfo_path, "\"GameInfo\" { }").unwrap();

        fs::create_dir_all(steam.join("config")).unwrap();
        let vdf = format!(
            "\"libraryfolders\" {{ \"0\" {{ \"path\" \"{}\" \"apps\" {{ \"1422450\" \"1\" }} }} }}",
            library.as_str().replace('\\', "\\\\")
        );
        fs::write(steam.join("config/libraryfolders.vdf"), vdf).unwrap();

        assert!(is_valid_steam_path(&steam));
        assert!(is_valid_deadlock_path(&install.root));
        assert_eq!(deadlock_from_steam(&steam), Some(install));
    }

    #[test]
    fn lists_addon_files() {
        let dir = TempDir::new().unwrap();
        let install = DeadlockInstall::from_root(utf8(&dir));
        assert_eq!(install.addon_file_names().unwrap(), Vec::<String>::new());

        fs::create_dir_all(&install.addons_dir).unwrap();
        fs::write(install.addons_dir.join("pak02_dir.vpk"), b"").unwrap();
        fs::write(install.addons_dir.join("pak01_dir.vpk"), b"").unwrap();
        fs::create_dir_all(install.addons_dir.join("pak03_dir.vpk")).unwrap();

        assert_eq!(
            install.addon_file_names().unwrap(),
            vec!["pak01_dir.vpk".to_string(), "pak02_dir.vpk".to_string()]
        );
    }
}
