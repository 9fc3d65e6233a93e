use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::{self, Settings};
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use dlr_kv::{kv1, DocumentNode};
use dlr_mod_core::{
    apply_search_path_patch, auto_detect_deadlock, is_valid_deadlock_path, plan_deployment,
    DeadlockInstall, DeploymentPlan,
};
use inquire::{Confirm, Select};
use miette::{IntoDiagnostic, Result};
use std::fmt;
use std::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InstallMode {
    /// Copy into the next free pakNN_dir.vpk slot and make sure addons load
    Enable,
    /// Copy under the addon name without enabling it
    Copy,
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallMode::Enable => write!(f, "Install and enable"),
            InstallMode::Copy => write!(f, "Install"),
        }
    }
}

#[derive(Debug)]
pub struct InstallArgs {
    pub mode: Option<InstallMode>,
    pub vpk: Option<Utf8PathBuf>,
    pub yes: bool,
}

/// Find the Deadlock installation from the config, falling back to
/// auto-detection.
pub(crate) fn resolve_install(settings: &Settings) -> Result<DeadlockInstall, CliError> {
    if let Some(path) = &settings.game_path {
        if is_valid_deadlock_path(path) {
            return Ok(DeadlockInstall::from_root(path.clone()));
        }
        tracing::warn!(%path, "configured game_path is not a Deadlock installation");
    }
    auto_detect_deadlock().ok_or(CliError::GameNotFound)
}

pub(crate) fn load_gameinfo(install: &DeadlockInstall) -> Result<DocumentNode> {
    let text = fs::read_to_string(&install.gameinfo_path).into_diagnostic()?;
    let gameinfo = kv1::parse(&text)
        .map_err(|e| CliError::gameinfo_parse(install.gameinfo_path.clone(), e))?;
    Ok(gameinfo)
}

pub fn install(args: InstallArgs) -> Result<()> {
    let settings = Settings::from_environment(&config::load_config()).into_diagnostic()?;
    let vpk = args.vpk.clone().unwrap_or_else(|| settings.vpk_path());
    if !vpk.is_file() {
        return Err(CliError::VpkNotFound { path: vpk }.into());
    }

    let install = resolve_install(&settings)?;
    println!(
        "  {} {}",
        "Deadlock:".bright_white().bold(),
        install.root.as_str().bright_green()
    );

    let mode = match args.mode {
        Some(mode) => mode,
        None => Select::new(
            "How would you like to install the randomizer?",
            vec![InstallMode::Enable, InstallMode::Copy],
        )
        .prompt()
        .into_diagnostic()?,
    };

    match mode {
        InstallMode::Enable => install_and_enable(&install, &vpk, args.yes),
        InstallMode::Copy => install_copy(&install, &vpk, &settings.addon_name),
    }
}

fn install_and_enable(install: &DeadlockInstall, vpk: &Utf8Path, yes: bool) -> Result<()> {
    let mut gameinfo = load_gameinfo(install)?;
    let names = install.addon_file_names().into_diagnostic()?;
    let plan = plan_deployment(&names, &gameinfo).map_err(CliError::from)?;

    let target = copy_into_addons(install, vpk, &plan.file_name())?;
    println!("{}", "✓ Randomizer installed!".bright_green().bold());
    println!();
    println_pad!("{} {}", "File:".bright_white().bold(), target.as_str().bright_green());

    if plan.search_paths.is_needed() {
        enable_mods(install, &mut gameinfo, &plan, yes)?;
    }

    println!();
    println_pad!(
        "{}",
        "To disable the randomizer, rename the file to anything else.".bright_cyan()
    );
    Ok(())
}

fn enable_mods(
    install: &DeadlockInstall,
    gameinfo: &mut DocumentNode,
    plan: &DeploymentPlan,
    yes: bool,
) -> Result<()> {
    let confirmed = yes
        || Confirm::new("You don't appear to have mods enabled. Would you like to enable them?")
            .with_default(true)
            .prompt()
            .into_diagnostic()?;

    if !confirmed {
        println_pad!(
            "{}",
            "Mods are not enabled, so the game will not load the randomizer.".bright_yellow()
        );
        return Ok(());
    }

    apply_search_path_patch(gameinfo, &plan.search_paths).map_err(CliError::from)?;
    fs::write(&install.gameinfo_path, kv1::to_string(gameinfo)).into_diagnostic()?;
    tracing::info!(path = %install.gameinfo_path, "enabled addon search paths");
    println_pad!("{}", "✓ Mods enabled".bright_green());
    Ok(())
}

fn install_copy(install: &DeadlockInstall, vpk: &Utf8Path, addon_name: &str) -> Result<()> {
    let target = copy_into_addons(install, vpk, &format!("{addon_name}.vpk"))?;
    println!("{}", "✓ Randomizer copied!".bright_green().bold());
    println!();
    println_pad!("{} {}", "File:".bright_white().bold(), target.as_str().bright_green());
    println!();
    println_pad!(
        "{}",
        "To enable, rename the file to pak##_dir.vpk, where ## is a free number from 01 to 99."
            .bright_cyan()
    );
    Ok(())
}

fn copy_into_addons(install: &DeadlockInstall, vpk: &Utf8Path, file_name: &str) -> Result<Utf8PathBuf> {
    fs::create_dir_all(&install.addons_dir).into_diagnostic()?;
    let target = install.addons_dir.join(file_name);
    fs::copy(vpk, &target).into_diagnostic()?;
    tracing::debug!(from = %vpk, to = %target, "copied archive");
    Ok(target)
}
