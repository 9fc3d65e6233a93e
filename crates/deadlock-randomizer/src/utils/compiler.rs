use crate::errors::CliError;
use camino::Utf8Path;
use std::process::Command;

/// Run the CSDK resource compiler over `inputs`.
///
/// A non-zero exit status is an error carrying whatever the compiler
/// printed.
pub fn run_resource_compiler(compiler: &Utf8Path, inputs: &[&Utf8Path]) -> Result<(), CliError> {
    if !compiler.is_file() {
        return Err(CliError::csdk_missing(compiler.to_path_buf()));
    }

    tracing::debug!(%compiler, ?inputs, "running resource compiler");
    let output = Command::new(compiler)
        .args(inputs.iter().map(|input| input.as_str()))
        .output()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines().filter(|line| !line.trim().is_empty()) {
        tracing::debug!(target: "resourcecompiler", "{line}");
    }

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(CliError::CompilerFailed {
        status: output.status.to_string(),
        output: format!("{}{}", stdout, stderr).trim_end().to_string(),
    })
}
