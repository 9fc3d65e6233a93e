use super::install::{load_gameinfo, resolve_install};
use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::{self, Settings};
use colored::Colorize;
use dlr_mod_core::{plan_deployment, SearchPathPatch};
use miette::{IntoDiagnostic, Result};

/// Print where an enabled install would go without changing anything.
pub fn show_plan() -> Result<()> {
    let settings = Settings::from_environment(&config::load_config()).into_diagnostic()?;
    let install = resolve_install(&settings)?;
    let gameinfo = load_gameinfo(&install)?;
    let names = install.addon_file_names().into_diagnostic()?;

    println!();
    println!(
        "  {} {}",
        "addons_dir:".bright_white(),
        install.addons_dir.as_str()
    );
    println!(
        "  {} {}",
        "installed_addons:".bright_white(),
        names.len()
    );

    let plan = plan_deployment(&names, &gameinfo).map_err(CliError::from)?;
    println!(
        "  {} {}",
        "target:".bright_white(),
        plan.file_name().bright_green()
    );

    match &plan.search_paths {
        SearchPathPatch::Unchanged => println!(
            "  {} {}",
            "gameinfo.gi:".bright_white(),
            "mods enabled ✓".bright_green()
        ),
        SearchPathPatch::Replace(paths) => {
            println!(
                "  {} {}",
                "gameinfo.gi:".bright_white(),
                "SearchPaths will be replaced with:".bright_yellow()
            );
            for entry in &paths.entries {
                println_pad!("{:<8} {}", entry.kind.key(), entry.path);
            }
        }
    }
    println!();
    Ok(())
}
