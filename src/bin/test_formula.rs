use brewtap::orchestrator::{DEFAULT_BREW, DEFAULT_FORMULA_DIR};
use brewtap::{
    CommandRunner, DryRunRunner, FormulaError, Orchestrator, OrchestratorOptions, SystemRunner,
    colors, logging, ui,
};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

const EXAMPLES: &str = "\
Examples:
    test-formula kpf          # Test the kpf formula
    test-formula -f kpf       # Force reinstall and test
    test-formula -s kpf       # Test without uninstalling afterward
    test-formula -v -d kpf    # Verbose dry run";

#[derive(Parser, Debug)]
#[command(name = "test-formula")]
#[command(about = "Test a Homebrew formula locally with comprehensive cleanup and testing")]
#[command(after_help = EXAMPLES)]
#[command(disable_help_flag = true)]
struct Cli {
    /// Force reinstall even if formula is already installed
    #[arg(short, long)]
    force: bool,

    /// Skip uninstalling the formula after testing
    #[arg(short, long)]
    skip_uninstall: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show what would be done without executing
    #[arg(short, long)]
    dry_run: bool,

    /// Treat formula audit failures as fatal
    #[arg(long)]
    strict_audit: bool,

    /// Directory containing <formula-name>.rb
    #[arg(long, value_name = "DIR", default_value = DEFAULT_FORMULA_DIR)]
    formula_dir: PathBuf,

    /// Homebrew executable
    #[arg(long, value_name = "PROGRAM", env = "HOMEBREW_BREW_FILE", default_value = DEFAULT_BREW)]
    brew: String,

    /// Show this help message
    #[arg(short, long)]
    help: bool,

    /// Name of the formula to test
    formula_name: Option<String>,
}

impl Cli {
    fn options(&self, formula_name: String) -> OrchestratorOptions {
        OrchestratorOptions {
            formula_name,
            formula_dir: self.formula_dir.clone(),
            brew: self.brew.clone(),
            force_reinstall: self.force,
            skip_cleanup: self.skip_uninstall,
            verbose: self.verbose,
            strict_audit: self.strict_audit,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);
    colors::init_colors();

    let formula_name = match (&cli.formula_name, cli.help) {
        (_, true) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        (None, false) => {
            print_usage();
            return ExitCode::FAILURE;
        }
        (Some(name), false) => name.clone(),
    };
    let options = cli.options(formula_name);

    let task = if cli.dry_run {
        tokio::task::spawn_blocking(move || run(DryRunRunner, options))
    } else {
        tokio::task::spawn_blocking(move || run(SystemRunner, options))
    };

    tokio::select! {
        joined = task => {
            let result = joined.unwrap_or_else(|e| {
                Err(FormulaError::Other(anyhow::anyhow!("formula test task failed: {e}")))
            });
            match result {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    ui::error(err);
                    ExitCode::FAILURE
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            ui::error("Script interrupted");
            // Runtime shutdown would wait on the blocking task; the child got the signal too.
            std::process::exit(130)
        }
    }
}

fn run<R: CommandRunner>(runner: R, options: OrchestratorOptions) -> brewtap::Result<()> {
    Orchestrator::new(runner, options)?.run()
}

fn print_usage() {
    println!("{}", Cli::command().render_help());
}
