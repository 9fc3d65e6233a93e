use crate::errors::CliError;
use crate::println_pad;
use crate::utils::compiler::run_resource_compiler;
use crate::utils::config::{self, Settings};
use crate::utils::fetch::{fetch_vdata, Source};
use crate::utils::{remove_dir_if_exists, write_creating_parents};
use camino::Utf8PathBuf;
use colored::Colorize;
use dlr_kv::kv3;
use dlr_vpk::VpkBuilder;
use miette::{IntoDiagnostic, Result};
use rand::{rngs::StdRng, SeedableRng};
use std::fs;

#[derive(Debug)]
pub struct GenerateArgs {
    pub seed: Option<u64>,
    pub output: Option<Utf8PathBuf>,
}

pub fn generate(args: GenerateArgs) -> Result<()> {
    let mut settings = Settings::from_environment(&config::load_config()).into_diagnostic()?;
    if let Some(output) = args.output {
        settings.out_path = output;
    }

    if !settings.csdk_path.is_dir() {
        return Err(CliError::csdk_missing(settings.csdk_path.clone()).into());
    }
    fs::create_dir_all(&settings.out_path).into_diagnostic()?;
    fs::create_dir_all(&settings.res_path).into_diagnostic()?;

    println!("{}", "Fetching game data...".bright_cyan());
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .into_diagnostic()?;
    let (abilities_text, abilities_source) =
        fetch_vdata(&client, &settings.abilities_url, &settings.abilities_cache())?;
    let (heroes_text, heroes_source) =
        fetch_vdata(&client, &settings.heroes_url, &settings.heroes_cache())?;
    report_source("abilities.vdata", abilities_source);
    report_source("heroes.vdata", heroes_source);

    let mut abilities =
        kv3::parse(&abilities_text).map_err(|e| CliError::vdata_parse("abilities.vdata", e))?;
    let mut heroes =
        kv3::parse(&heroes_text).map_err(|e| CliError::vdata_parse("heroes.vdata", e))?;

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let randomized =
        dlr_randomizer::randomize(&mut abilities, &mut heroes, &mut rng).map_err(CliError::from)?;

    let json_dir = settings.json_dir();
    for (name, contents) in randomized
        .categorized
        .snapshot_files()
        .map_err(CliError::from)?
    {
        write_creating_parents(&json_dir.join(name), contents).into_diagnostic()?;
    }
    tracing::info!(dir = %json_dir, "wrote categorized snapshots");

    let content_dir = settings.content_dir();
    let compiled_dir = settings.compiled_dir();
    remove_dir_if_exists(&content_dir).into_diagnostic()?;
    remove_dir_if_exists(&compiled_dir).into_diagnostic()?;

    let scripts_dir = content_dir.join("scripts");
    let abilities_path = scripts_dir.join("abilities.vdata");
    let heroes_path = scripts_dir.join("heroes.vdata");
    write_creating_parents(&abilities_path, kv3::to_string(&abilities)).into_diagnostic()?;
    write_creating_parents(&heroes_path, kv3::to_string(&heroes)).into_diagnostic()?;

    println!("{}", "Compiling addon...".bright_cyan());
    run_resource_compiler(
        &settings.compiler_path(),
        &[abilities_path.as_path(), heroes_path.as_path()],
    )?;

    let vpk_path = settings.vpk_path();
    VpkBuilder::from_directory(&compiled_dir)
        .and_then(|builder| builder.save_to_file(&vpk_path))
        .map_err(|source| CliError::VpkWrite {
            path: vpk_path.clone(),
            source,
        })?;

    remove_dir_if_exists(&content_dir).into_diagnostic()?;
    remove_dir_if_exists(&compiled_dir).into_diagnostic()?;

    println!(
        "{}",
        "✓ Randomized mod generated successfully!".bright_green().bold()
    );
    println!();
    println_pad!("{} {}", "Seed:".bright_white().bold(), seed.to_string().bright_cyan());
    println_pad!(
        "{} {} heroes, {} slots",
        "Shuffled:".bright_white().bold(),
        randomized.table.heroes().len(),
        randomized.cells_written
    );
    println_pad!("{} {}", "Archive:".bright_white().bold(), vpk_path.as_str().bright_green());
    println!();
    println_pad!(
        "{}",
        "Run 'deadlock-randomizer install' to copy it into your game".bright_cyan()
    );

    Ok(())
}

fn report_source(name: &str, source: Source) {
    match source {
        Source::Downloaded => println_pad!("{} {}", "✓".bright_green(), name),
        Source::Unchanged => println_pad!("{} {} {}", "✓".bright_green(), name, "(unchanged)".dimmed()),
        Source::Cache => println_pad!(
            "{} {} {}",
            "!".bright_yellow(),
            name,
            "(download failed, using cached copy)".bright_yellow()
        ),
    }
}
