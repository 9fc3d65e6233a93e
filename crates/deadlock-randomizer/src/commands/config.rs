use crate::utils::config::{self, AppConfig};
use camino::Utf8PathBuf;
use colored::Colorize;
use dlr_mod_core::{auto_detect_deadlock, is_valid_deadlock_path};
use miette::Result;

fn update_config(update: impl FnOnce(&mut AppConfig)) -> Result<()> {
    let mut cfg = config::load_config();
    update(&mut cfg);
    config::save_config(&cfg).map_err(|e| miette::miette!("Failed to save config: {}", e))
}

/// Print a config path entry with status indicator
fn print_path_config(
    name: &str,
    path: Option<&Utf8PathBuf>,
    validator: impl Fn(&Utf8PathBuf) -> bool,
) {
    match path {
        Some(p) => {
            let status = if validator(p) {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            println!("  {} {} {}", format!("{}:", name).bright_white(), p, status);
        }
        None => print_unset(name),
    }
}

fn print_text_config(name: &str, value: Option<&String>) {
    match value {
        Some(v) => println!("  {} {}", format!("{}:", name).bright_white(), v),
        None => print_unset(name),
    }
}

fn print_unset(name: &str) {
    println!(
        "  {} {}",
        format!("{}:", name).bright_white(),
        "(not set)".bright_yellow()
    );
}

pub fn show_config() -> Result<()> {
    let cfg = config::load_config();
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    println!();
    println!("  {} {}", "config_file:".bright_white(), config_path);

    print_path_config("game_path", cfg.game_path.as_ref(), |p| {
        is_valid_deadlock_path(p.as_path())
    });
    print_path_config("csdk_path", cfg.csdk_path.as_ref(), |p| p.is_dir());
    print_text_config("addon_name", cfg.addon_name.as_ref());
    print_path_config("out_path", cfg.out_path.as_ref(), |p| p.is_dir());
    print_path_config("res_path", cfg.res_path.as_ref(), |p| p.is_dir());
    print_text_config("abilities_url", cfg.abilities_url.as_ref());
    print_text_config("heroes_url", cfg.heroes_url.as_ref());

    println!();
    Ok(())
}

pub fn set_game_path(path: String) -> Result<()> {
    let path = Utf8PathBuf::from(&path);
    if !is_valid_deadlock_path(path.as_path()) {
        eprintln!(
            "  {}",
            "The path must point to the Deadlock folder inside your Steam library.".bright_yellow()
        );
        eprintln!(
            "  {}",
            "Example: C:\\Program Files (x86)\\Steam\\steamapps\\common\\Deadlock".bright_yellow()
        );
        eprintln!();
        eprintln!(
            "  {} The folder does not contain game\\citadel\\gameinfo.gi",
            "•".bright_red()
        );

        return Err(miette::miette!("Invalid Deadlock path"));
    }

    update_config(|cfg| cfg.game_path = Some(path.clone()))?;

    println!("{}", "✓ Game path set successfully!".bright_green().bold());
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        path.as_str().bright_green()
    );

    Ok(())
}

pub fn set_csdk_path(path: String) -> Result<()> {
    let path = Utf8PathBuf::from(&path);
    let compiler = path.join("game/bin_tools/win64/resourcecompiler.exe");
    if !compiler.is_file() {
        eprintln!(
            "  {} {}",
            "•".bright_red(),
            format!("{} does not exist", compiler).bright_yellow()
        );
        return Err(miette::miette!("Invalid CSDK path"));
    }

    update_config(|cfg| cfg.csdk_path = Some(path.clone()))?;

    println!("{}", "✓ CSDK path set successfully!".bright_green().bold());
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        path.as_str().bright_green()
    );

    Ok(())
}

pub fn auto_detect_game_path() -> Result<()> {
    println!("{}", "Searching for Deadlock installation...".bright_cyan());
    println!();

    match auto_detect_deadlock() {
        Some(install) => {
            println!("{}", "✓ Found Deadlock!".bright_green().bold());
            println!();
            println!(
                "  {} {}",
                "Path:".bright_white().bold(),
                install.root.as_str().bright_green()
            );
            println!();

            update_config(|cfg| cfg.game_path = Some(install.root.clone()))?;

            println!(
                "{}",
                "✓ Configuration updated successfully!"
                    .bright_green()
                    .bold()
            );
        }
        None => {
            println!(
                "{}",
                "✗ Could not automatically detect Deadlock installation"
                    .bright_red()
                    .bold()
            );
            println!();
            println!(
                "  {}",
                "Steam may not be installed, or Deadlock is in a library Steam does not list."
                    .bright_yellow()
            );
            println!();
            println!(
                "  {} Use 'deadlock-randomizer config set-game-path <path>' to set the path manually",
                "•".bright_cyan()
            );
            println!(
                "  {} The path should point to: ...\\steamapps\\common\\Deadlock",
                "•".bright_cyan()
            );
        }
    }

    Ok(())
}

pub fn reset_config() -> Result<()> {
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    config::save_config(&AppConfig::default())
        .map_err(|e| miette::miette!("Failed to reset config: {}", e))?;

    println!(
        "{}",
        "✓ Configuration reset to defaults".bright_green().bold()
    );
    println!();
    println!("  {} {}", "Config file:".bright_white().bold(), config_path);
    println!();
    println!(
        "  {}",
        "Run 'deadlock-randomizer config auto-detect' to find your Deadlock installation"
            .bright_cyan()
    );

    Ok(())
}
