use camino::Utf8PathBuf;
use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    auto_detect_game_path, generate, install, reset_config, set_csdk_path, set_game_path,
    show_config, show_plan, GenerateArgs, InstallArgs, InstallMode,
};
use miette::Result;
use tracing_subscriber::EnvFilter;

mod commands;
mod errors;
mod utils;

const DEFAULT_LOG_FILTER: &str =
    "deadlock_randomizer=info,dlr_kv=info,dlr_randomizer=info,dlr_mod_core=info,dlr_vpk=info";
const VERBOSE_LOG_FILTER: &str =
    "deadlock_randomizer=debug,dlr_kv=debug,dlr_randomizer=debug,dlr_mod_core=debug,dlr_vpk=debug";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Log every decision the pipeline makes
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the game data, shuffle signature abilities and build the addon archive
    Generate {
        /// Seed for the shuffle; a random one is picked and printed when omitted
        #[arg(short, long)]
        seed: Option<u64>,

        /// The directory to write the archive to
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },
    /// Copy the generated archive into the game
    Install {
        /// How to install; prompts when omitted
        #[arg(short, long, value_enum)]
        mode: Option<InstallMode>,

        /// The archive to install (defaults to the generated one)
        #[arg(long)]
        vpk: Option<Utf8PathBuf>,

        /// Enable mods in gameinfo.gi without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Show which slot an install would use and whether gameinfo.gi needs patching
    Plan,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set the Deadlock installation folder
    SetGamePath {
        /// Path to steamapps/common/Deadlock
        path: String,
    },
    /// Set the reduced CSDK folder
    SetCsdkPath {
        /// Path to the CSDK root
        path: String,
    },
    /// Find the Deadlock installation through Steam
    AutoDetect,
    /// Reset configuration to defaults
    Reset,
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = parse_args();
    init_tracing(args.verbose);

    match args.command {
        Commands::Generate { seed, output } => generate(GenerateArgs { seed, output }),
        Commands::Install { mode, vpk, yes } => install(InstallArgs { mode, vpk, yes }),
        Commands::Plan => show_plan(),
        Commands::Config { command } => match command {
            ConfigCommands::Show => show_config(),
            ConfigCommands::SetGamePath { path } => set_game_path(path),
            ConfigCommands::SetCsdkPath { path } => set_csdk_path(path),
            ConfigCommands::AutoDetect => auto_detect_game_path(),
            ConfigCommands::Reset => reset_config(),
        },
    }
}
