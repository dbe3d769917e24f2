//! Output of fetched release metadata.

use crate::error::{FormulaError, Result};
use crate::release::ReleaseMetadata;
use clap::ValueEnum;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON record
    #[value(alias = "structured")]
    Json,
    /// `key=value` lines for CI step outputs
    Env,
    /// Labeled lines for people
    #[default]
    Human,
}

/// Write `metadata` to `out` in `format`.
///
/// For [`OutputFormat::Env`] the same lines are also appended to `ci_output`
/// when a path is given. The path is resolved by the caller (normally from
/// `GITHUB_OUTPUT`); nothing here reads the environment.
pub fn emit<W: Write>(
    metadata: &ReleaseMetadata,
    format: OutputFormat,
    ci_output: Option<&Path>,
    out: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, metadata)?;
            writeln!(out)?;
        }
        OutputFormat::Env => {
            let lines = env_lines(metadata);
            if let Some(path) = ci_output {
                append_ci_output(path, &lines)?;
            }
            out.write_all(lines.as_bytes())?;
        }
        OutputFormat::Human => {
            writeln!(out, "Version: {}", metadata.version)?;
            writeln!(out, "URL: {}", metadata.url)?;
            writeln!(out, "SHA256: {}", metadata.sha256)?;
            writeln!(out, "Homepage: {}", metadata.homepage)?;
            writeln!(out, "Description: {}", metadata.description)?;
        }
    }
    Ok(())
}

fn env_lines(metadata: &ReleaseMetadata) -> String {
    metadata
        .fields()
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect()
}

fn append_ci_output(path: &Path, lines: &str) -> Result<()> {
    let io_err = |source| FormulaError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    file.write_all(lines.as_bytes()).map_err(io_err)?;

    tracing::debug!(path = %path.display(), "appended CI outputs");
    Ok(())
}
