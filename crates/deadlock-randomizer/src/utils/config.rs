//! Application configuration management utilities.
//!
//! Settings are looked up in this order: command-line flag, environment
//! variable, `config.toml` next to the executable, built-in default.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;

pub const DEFAULT_ADDON_NAME: &str = "randomizer_mod";
pub const DEFAULT_CSDK_DIR: &str = "Reduced_CSDK_12";
pub const DEFAULT_ABILITIES_URL: &str = "https://raw.githubusercontent.com/SteamDatabase/GameTracking-Deadlock/refs/heads/master/game/citadel/pak01_dir/scripts/abilities.vdata";
pub const DEFAULT_HEROES_URL: &str = "https://raw.githubusercontent.com/SteamDatabase/GameTracking-Deadlock/refs/heads/master/game/citadel/pak01_dir/scripts/heroes.vdata";

/// Application-wide configuration stored in config.toml.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Deadlock installation root (`.../steamapps/common/Deadlock`).
    pub game_path: Option<Utf8PathBuf>,
    pub csdk_path: Option<Utf8PathBuf>,
    pub addon_name: Option<String>,
    pub out_path: Option<Utf8PathBuf>,
    pub res_path: Option<Utf8PathBuf>,
    pub abilities_url: Option<String>,
    pub heroes_url: Option<String>,
}

/// Returns the directory where the current executable resides.
pub fn install_dir() -> Option<Utf8PathBuf> {
    let exe = env::current_exe().ok()?;
    let parent = exe.parent()?;
    Utf8PathBuf::from_path_buf(parent.to_path_buf()).ok()
}

/// Returns the default configuration file path (config.toml).
pub fn default_config_path() -> Option<Utf8PathBuf> {
    install_dir().map(|dir| dir.join("config.toml"))
}

/// Loads the application configuration from config.toml.
/// Returns default configuration if file doesn't exist or cannot be parsed.
pub fn load_config() -> AppConfig {
    default_config_path()
        .and_then(|path| load_config_from(&path))
        .unwrap_or_default()
}

fn load_config_from(path: &Utf8Path) -> Option<AppConfig> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            tracing::warn!(%path, %err, "ignoring unreadable config file");
            None
        }
    }
}

/// Saves the application configuration to config.toml.
pub fn save_config(cfg: &AppConfig) -> io::Result<()> {
    let path = default_config_path().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Could not determine config path")
    })?;
    save_config_to(&path, cfg)
}

fn save_config_to(path: &Utf8Path, cfg: &AppConfig) -> io::Result<()> {
    let content = toml::to_string_pretty(cfg).map_err(io::Error::other)?;
    fs::write(path, content)
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub game_path: Option<Utf8PathBuf>,
    pub csdk_path: Utf8PathBuf,
    pub addon_name: String,
    pub out_path: Utf8PathBuf,
    pub res_path: Utf8PathBuf,
    pub abilities_url: String,
    pub heroes_url: String,
}

impl Settings {
    /// Resolve settings from the process environment and the saved config.
    pub fn from_environment(cfg: &AppConfig) -> io::Result<Self> {
        let cwd = Utf8PathBuf::from_path_buf(env::current_dir()?).map_err(|path| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("working directory is not UTF-8: {}", path.display()),
            )
        })?;
        Ok(Self::resolve(cfg, |key| env::var(key).ok(), &cwd))
    }

    /// Resolve settings with an explicit environment lookup.
    pub fn resolve(cfg: &AppConfig, env: impl Fn(&str) -> Option<String>, cwd: &Utf8Path) -> Self {
        let path_setting = |key: &str, saved: &Option<Utf8PathBuf>, default: Utf8PathBuf| {
            env(key)
                .filter(|value| !value.is_empty())
                .map(Utf8PathBuf::from)
                .or_else(|| saved.clone())
                .unwrap_or(default)
        };
        let text_setting = |key: &str, saved: &Option<String>, default: &str| {
            env(key)
                .filter(|value| !value.is_empty())
                .or_else(|| saved.clone())
                .unwrap_or_else(|| default.to_string())
        };

        let out_path = path_setting("OUT_PATH", &cfg.out_path, cwd.join("output"));
        Self {
            game_path: cfg.game_path.clone(),
            csdk_path: path_setting("CSDK_PATH", &cfg.csdk_path, cwd.join(DEFAULT_CSDK_DIR)),
            addon_name: text_setting("ADDON_NAME", &cfg.addon_name, DEFAULT_ADDON_NAME),
            res_path: path_setting("RES_PATH", &cfg.res_path, cwd.join("output").join("cache")),
            out_path,
            abilities_url: text_setting("VDATA_ABILITIES_URL", &cfg.abilities_url, DEFAULT_ABILITIES_URL),
            heroes_url: text_setting("VDATA_HEROES_URL", &cfg.heroes_url, DEFAULT_HEROES_URL),
        }
    }

    pub fn compiler_path(&self) -> Utf8PathBuf {
        self.csdk_path
            .join("game")
            .join("bin_tools")
            .join("win64")
            .join("resourcecompiler.exe")
    }

    /// Source directory the compiler reads the addon from.
    pub fn content_dir(&self) -> Utf8PathBuf {
        self.csdk_path
            .join("content")
            .join("citadel_addons")
            .join(&self.addon_name)
    }

    /// Directory the compiler writes the addon to.
    pub fn compiled_dir(&self) -> Utf8PathBuf {
        self.csdk_path
            .join("game")
            .join("citadel_addons")
            .join(&self.addon_name)
    }

    pub fn vpk_path(&self) -> Utf8PathBuf {
        self.out_path.join(format!("{}.vpk", self.addon_name))
    }

    pub fn abilities_cache(&self) -> Utf8PathBuf {
        self.res_path.join("abilities.vdata")
    }

    pub fn heroes_cache(&self) -> Utf8PathBuf {
        self.res_path.join("heroes.vdata")
    }

    pub fn json_dir(&self) -> Utf8PathBuf {
        self.res_path.join("json")
    }
}
