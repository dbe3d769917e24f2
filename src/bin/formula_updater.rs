use brewtap::api::{PYPI_BASE_URL, PypiApi};
use brewtap::emit::{self, OutputFormat};
use brewtap::{colors, formula, logging};
use clap::{ArgGroup, Parser};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

const EXAMPLES: &str = "\
Examples:
  # Fetch latest version from PyPI
  formula-updater --fetch-version-from-pypi

  # Use specific version
  formula-updater --version 0.1.10

  # Generate formula file
  formula-updater --version 0.1.10 --output-formula Formula/kpf.rb

  # Output for GitHub Actions
  formula-updater --fetch-version-from-pypi --output-format env";

#[derive(Parser, Debug)]
#[command(name = "formula-updater")]
#[command(about = "Update or generate the Homebrew formula for the kpf package")]
#[command(after_help = EXAMPLES)]
#[command(group(
    ArgGroup::new("release")
        .required(true)
        .args(["release_version", "fetch_version_from_pypi"])
))]
struct Cli {
    /// Specific version to use
    #[arg(long = "version", value_name = "VERSION")]
    release_version: Option<String>,

    /// Fetch the latest version from PyPI
    #[arg(long, alias = "latest")]
    fetch_version_from_pypi: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    output_format: OutputFormat,

    /// Write formula to specified file
    #[arg(long, value_name = "PATH")]
    output_formula: Option<PathBuf>,

    /// Package name on PyPI
    #[arg(long, default_value = "kpf")]
    package_name: String,

    /// Package index JSON API base URL
    #[arg(long, env = "FORMULA_INDEX_URL", default_value = PYPI_BASE_URL)]
    index_url: String,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// File that receives `key=value` lines in env format
    #[arg(long, env = "GITHUB_OUTPUT", hide = true)]
    github_output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);
    colors::init_colors();

    tokio::select! {
        result = run(cli) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{} {}", "Error:".red().bold(), err);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n{} Interrupted", "Error:".red().bold());
            ExitCode::from(130)
        }
    }
}

async fn run(cli: Cli) -> brewtap::Result<()> {
    let api = PypiApi::with_base_url(&cli.index_url, Duration::from_secs(cli.timeout))?;
    let package = cli.package_name.as_str();

    let version = match cli.release_version {
        Some(version) => version,
        None => {
            let version = api.resolve_latest_version(package).await?;
            eprintln!("Latest version from PyPI: {}", version.cyan());
            version
        }
    };

    let metadata = api.fetch_release(package, &version).await?;

    // Written before anything reaches stdout so a failed write leaves no partial output.
    if let Some(path) = &cli.output_formula {
        formula::write_formula(&metadata, path)?;
        eprintln!("Formula written to {}", path.display().to_string().cyan());
    }

    let stdout = std::io::stdout();
    emit::emit(
        &metadata,
        cli.output_format,
        cli.github_output.as_deref(),
        &mut stdout.lock(),
    )
}
