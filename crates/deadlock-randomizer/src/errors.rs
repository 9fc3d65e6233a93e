use camino::Utf8PathBuf;
use dlr_mod_core::DeployError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("CSDK is invalid or missing: {path} does not exist")]
    #[diagnostic(
        code(csdk::missing),
        help("Set CSDK_PATH or csdk_path in config.toml to a reduced CSDK 12 installation")
    )]
    CsdkMissing { path: Utf8PathBuf },

    #[error("Could not download {url} and no cached copy exists")]
    #[diagnostic(
        code(fetch::unavailable),
        help("Check your internet connection or point the URL at another copy of the file")
    )]
    VdataUnavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse {name}")]
    #[diagnostic(code(vdata::parse_error))]
    VdataParse {
        name: &'static str,
        #[source]
        source: dlr_kv::Error,
    },

    #[error("Randomization failed")]
    #[diagnostic(code(randomize::failed))]
    Randomize(#[from] dlr_randomizer::Error),

    #[error("Failed to write {path}")]
    #[diagnostic(code(vpk::write_failed))]
    VpkWrite {
        path: Utf8PathBuf,
        #[source]
        source: dlr_vpk::VpkError,
    },

    #[error("resourcecompiler exited with {status}")]
    #[diagnostic(code(csdk::compile_failed), help("Compiler output:\n{output}"))]
    CompilerFailed { status: String, output: String },

    #[error("Generated archive not found: {path}")]
    #[diagnostic(
        code(install::vpk_missing),
        help("Run 'deadlock-randomizer generate' first, or pass --vpk")
    )]
    VpkNotFound { path: Utf8PathBuf },

    #[error("Could not find a Steam or Deadlock installation")]
    #[diagnostic(
        code(install::game_not_found),
        help("To install manually, move the file into the game/citadel/addons folder of your game and rename it to pak##_dir.vpk to enable it (## is a number from 01 to 99)")
    )]
    GameNotFound,

    #[error("Failed to parse {path}")]
    #[diagnostic(code(install::gameinfo_parse_error))]
    GameInfoParse {
        path: Utf8PathBuf,
        #[source]
        source: dlr_kv::Error,
    },

    #[error("gameinfo.gi has no {section} section")]
    #[diagnostic(
        code(install::gameinfo_malformed),
        help("Verify the integrity of the game files in Steam")
    )]
    MalformedGameInfo { section: &'static str },

    #[error("No free addon slot")]
    #[diagnostic(
        code(install::capacity_exhausted),
        help("You don't have space for any additional mods. Remove some mod to enable the randomizer.")
    )]
    CapacityExhausted,

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl From<DeployError> for CliError {
    fn from(err: DeployError) -> Self {
        match err {
            DeployError::CapacityExhausted => Self::CapacityExhausted,
            DeployError::MalformedGameInfo(section) => Self::MalformedGameInfo { section },
        }
    }
}

impl CliError {
    pub fn csdk_missing(path: Utf8PathBuf) -> Self {
        Self::CsdkMissing { path }
    }

    pub fn vdata_parse(name: &'static str, source: dlr_kv::Error) -> Self {
        Self::VdataParse { name, source }
    }

    pub fn gameinfo_parse(path: Utf8PathBuf, source: dlr_kv::Error) -> Self {
        Self::GameInfoParse { path, source }
    }
}
