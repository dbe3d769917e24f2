//! Local install/test lifecycle for a formula file.
//!
//! The [`Orchestrator`] walks a fixed sequence of [`Step`]s:
//!
//! ```text
//! CheckPrereqs → (formula file check) → CheckInstalled [→ InstalledVersion]
//!   → Uninstall | skip → Audit → Install → ShowInfo → Test → Cleanup
//! ```
//!
//! Each step issues at most one `brew` subcommand through a
//! [`CommandRunner`] and carries a [`FailurePolicy`] that decides what a
//! non-zero exit means. A single driver ([`Orchestrator::execute`]) applies
//! the policy, so fatal and advisory handling is uniform.
//!
//! Cleanup runs after the audit/install/info/test block whether that block
//! succeeded or not; the block's first fatal error is returned afterwards.

use crate::error::{FormulaError, Result};
use crate::runner::{CommandOutput, CommandRunner, Invocation};
use crate::ui;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_BREW: &str = "brew";
pub const DEFAULT_FORMULA_DIR: &str = "Formula";

/// Settings taken from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorOptions {
    pub formula_name: String,
    /// Directory holding `<formula_name>.rb`
    pub formula_dir: PathBuf,
    /// Package manager executable
    pub brew: String,
    pub force_reinstall: bool,
    pub skip_cleanup: bool,
    /// Pass `--verbose` to install and test
    pub verbose: bool,
    /// Treat audit findings as fatal
    pub strict_audit: bool,
}

impl OrchestratorOptions {
    pub fn new(formula_name: impl Into<String>) -> Self {
        Self {
            formula_name: formula_name.into(),
            formula_dir: PathBuf::from(DEFAULT_FORMULA_DIR),
            brew: DEFAULT_BREW.to_string(),
            force_reinstall: false,
            skip_cleanup: false,
            verbose: false,
            strict_audit: false,
        }
    }

    /// `Formula/<name>.rb`; a tap-qualified `user/tap/name` uses its last segment
    pub fn formula_path(&self) -> PathBuf {
        let stem = self
            .formula_name
            .rsplit('/')
            .next()
            .unwrap_or(self.formula_name.as_str());
        self.formula_dir.join(format!("{stem}.rb"))
    }
}

/// Per-run state. Only `was_previously_installed` changes, once, after the install probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorState {
    pub formula_name: String,
    pub formula_file_path: PathBuf,
    pub was_previously_installed: bool,
    pub force_reinstall: bool,
    pub skip_cleanup: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    CheckPrereqs,
    CheckInstalled,
    InstalledVersion,
    Uninstall,
    Audit,
    Install,
    ShowInfo,
    Test,
    Cleanup,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::CheckPrereqs => "prerequisite check",
            Step::CheckInstalled => "installation check",
            Step::InstalledVersion => "installed version query",
            Step::Uninstall => "uninstall",
            Step::Audit => "audit",
            Step::Install => "install",
            Step::ShowInfo => "info",
            Step::Test => "test",
            Step::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// What a non-zero exit (or a command that cannot start) means for a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run
    Fatal,
    /// Warn and continue
    Advisory,
    /// The exit status answers a yes/no question
    Probe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    ExitedNonZero,
    /// The command could not be started
    NotStarted,
    /// The step did not apply to this run
    Skipped,
}

/// One line of the run transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: Step,
    pub command: Option<String>,
    pub outcome: StepOutcome,
}

pub struct Orchestrator<R> {
    runner: R,
    options: OrchestratorOptions,
    state: OrchestratorState,
    installed_version: Option<String>,
    transcript: Vec<StepRecord>,
}

impl<R: CommandRunner> Orchestrator<R> {
    /// # Errors
    ///
    /// [`FormulaError::InvalidFormulaName`] when the name could be mistaken
    /// for a path or a flag by the package manager. Dry runs accept any name.
    pub fn new(runner: R, options: OrchestratorOptions) -> Result<Self> {
        if !runner.is_dry_run() {
            validate_formula_name(&options.formula_name)?;
        }

        let state = OrchestratorState {
            formula_name: options.formula_name.clone(),
            formula_file_path: options.formula_path(),
            was_previously_installed: false,
            force_reinstall: options.force_reinstall,
            skip_cleanup: options.skip_cleanup,
        };

        Ok(Self {
            runner,
            options,
            state,
            installed_version: None,
            transcript: Vec::new(),
        })
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    /// Steps attempted so far, in order
    pub fn transcript(&self) -> &[StepRecord] {
        &self.transcript
    }

    /// Version reported by the package manager when the formula was already installed
    pub fn installed_version(&self) -> Option<&str> {
        self.installed_version.as_deref()
    }

    pub fn policy(&self, step: Step) -> FailurePolicy {
        match step {
            Step::CheckPrereqs | Step::Install | Step::Test => FailurePolicy::Fatal,
            Step::Audit if self.options.strict_audit => FailurePolicy::Fatal,
            Step::CheckInstalled => FailurePolicy::Probe,
            Step::InstalledVersion
            | Step::Uninstall
            | Step::Audit
            | Step::ShowInfo
            | Step::Cleanup => FailurePolicy::Advisory,
        }
    }

    /// Command line issued for `step`
    pub fn invocation(&self, step: Step) -> Invocation {
        let brew = self.options.brew.as_str();
        let name = self.state.formula_name.as_str();
        let path = self.state.formula_file_path.to_string_lossy();
        let verbose = self.options.verbose.then_some("--verbose");

        match step {
            Step::CheckPrereqs => Invocation::new(brew, ["--version"]).captured(),
            Step::CheckInstalled => Invocation::new(brew, ["list", name]).captured(),
            Step::InstalledVersion => {
                Invocation::new(brew, ["list", "--versions", name]).captured()
            }
            Step::Uninstall | Step::Cleanup => {
                Invocation::new(brew, ["uninstall", "--force", name])
            }
            Step::Audit => Invocation::new(brew, ["audit", "--strict", &*path]),
            Step::Install => Invocation::new(
                brew,
                ["install"]
                    .into_iter()
                    .chain(verbose)
                    .chain([&*path]),
            ),
            Step::ShowInfo => Invocation::new(brew, ["info", name]),
            Step::Test => Invocation::new(brew, ["test"].into_iter().chain(verbose).chain([name])),
        }
    }

    /// Run the whole workflow.
    ///
    /// # Errors
    ///
    /// The first fatal failure: missing package manager or formula file,
    /// failed install or test, or failed audit under `strict_audit`.
    pub fn run(&mut self) -> Result<()> {
        let name = self.state.formula_name.clone();
        ui::info(format!("Starting formula test for: {name}"));
        ui::gap();

        self.check_prereqs()?;
        self.check_formula_file()?;
        self.check_installed()?;
        self.uninstall_existing()?;
        ui::gap();

        let exercised = self.exercise();
        ui::gap();

        self.cleanup();
        ui::gap();
        exercised?;

        ui::success("Formula testing completed successfully!");
        if self.state.was_previously_installed && !self.runner.is_dry_run() {
            if self.state.skip_cleanup {
                ui::warning(format!(
                    "Note: the previously installed {name} was replaced by the tested build"
                ));
            } else {
                ui::warning(format!(
                    "Note: {name} was installed before this run and has been removed; reinstall it to restore it"
                ));
            }
        }
        Ok(())
    }

    /// Run one step and apply its failure policy.
    ///
    /// Returns `Ok(None)` when a non-fatal command could not be started.
    pub fn execute(&mut self, step: Step) -> Result<Option<CommandOutput>> {
        let invocation = self.invocation(step);
        let command = invocation.to_string();
        let policy = self.policy(step);

        match self.runner.run(&invocation) {
            Ok(output) => {
                let outcome = if output.success() {
                    StepOutcome::Succeeded
                } else {
                    StepOutcome::ExitedNonZero
                };
                self.record(step, Some(command.clone()), outcome);

                if outcome == StepOutcome::ExitedNonZero && policy == FailurePolicy::Fatal {
                    return Err(FormulaError::ExternalCommand {
                        command,
                        code: output.code,
                    });
                }
                Ok(Some(output))
            }
            Err(err) => {
                self.record(step, Some(command), StepOutcome::NotStarted);
                match policy {
                    FailurePolicy::Fatal => Err(err),
                    FailurePolicy::Advisory | FailurePolicy::Probe => {
                        ui::warning(format!("Could not run {step}: {err}"));
                        Ok(None)
                    }
                }
            }
        }
    }

    fn record(&mut self, step: Step, command: Option<String>, outcome: StepOutcome) {
        tracing::debug!(%step, ?outcome, "step finished");
        self.transcript.push(StepRecord {
            step,
            command,
            outcome,
        });
    }

    fn check_prereqs(&mut self) -> Result<()> {
        let output = self.execute(Step::CheckPrereqs)?.unwrap_or_default();
        let version = output
            .stdout
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .unwrap_or("version unknown");
        ui::info(format!("Homebrew found: {version}"));
        Ok(())
    }

    fn check_formula_file(&self) -> Result<()> {
        let path = &self.state.formula_file_path;
        if path.is_file() {
            ui::info(format!("Formula file found: {}", path.display()));
            return Ok(());
        }
        if self.runner.is_dry_run() {
            ui::warning(format!(
                "Formula file {} not found (ignored in dry run)",
                path.display()
            ));
            return Ok(());
        }
        Err(FormulaError::FormulaFileMissing(path.clone()))
    }

    fn check_installed(&mut self) -> Result<()> {
        let name = self.state.formula_name.clone();
        let installed = self
            .execute(Step::CheckInstalled)?
            .is_some_and(|output| output.success());

        if installed {
            let version = self
                .execute(Step::InstalledVersion)?
                .filter(CommandOutput::success)
                .and_then(|output| output.stdout.split_whitespace().last().map(str::to_string))
                .unwrap_or_else(|| "unknown".to_string());

            ui::warning(format!(
                "Formula {name} is already installed (version: {version})"
            ));
            if self.state.force_reinstall {
                ui::info("Force reinstall requested - will uninstall current version");
            } else {
                ui::info("Existing installation will be removed before testing");
            }
            self.installed_version = Some(version);
        } else {
            ui::info(format!("Formula {name} is not currently installed"));
        }

        self.state.was_previously_installed = installed;
        Ok(())
    }

    fn uninstall_existing(&mut self) -> Result<()> {
        let name = self.state.formula_name.clone();
        if !(self.state.was_previously_installed || self.state.force_reinstall) {
            self.record(Step::Uninstall, None, StepOutcome::Skipped);
            return Ok(());
        }

        ui::info(format!("Uninstalling existing {name}..."));
        match self.execute(Step::Uninstall)? {
            Some(output) if output.success() => {
                ui::success(format!("Successfully uninstalled {name}"));
            }
            Some(_) => ui::warning(format!("Uninstalling {name} failed; continuing")),
            None => {}
        }
        Ok(())
    }

    fn exercise(&mut self) -> Result<()> {
        self.audit()?;
        ui::gap();
        self.install()?;
        ui::gap();
        self.show_info()?;
        ui::gap();
        self.test()
    }

    fn audit(&mut self) -> Result<()> {
        ui::info("Running formula audit...");
        if let Some(output) = self.execute(Step::Audit)? {
            if output.success() {
                ui::success("Formula audit passed");
            } else {
                ui::warning("Formula audit had issues (this may not prevent installation)");
            }
        }
        Ok(())
    }

    fn install(&mut self) -> Result<()> {
        let name = self.state.formula_name.clone();
        ui::info(format!("Installing {name} from local formula..."));
        self.execute(Step::Install)?;
        ui::success(format!("Successfully installed {name}"));
        Ok(())
    }

    fn show_info(&mut self) -> Result<()> {
        ui::info("Formula information:");
        if let Some(output) = self.execute(Step::ShowInfo)? {
            if !output.success() {
                ui::warning("Could not display formula information");
            }
        }
        Ok(())
    }

    fn test(&mut self) -> Result<()> {
        let name = self.state.formula_name.clone();
        ui::info("Running formula tests...");
        self.execute(Step::Test)?;
        ui::success(format!("All tests passed for {name}"));
        Ok(())
    }

    fn cleanup(&mut self) {
        let name = self.state.formula_name.clone();
        if self.state.skip_cleanup {
            ui::info("Skipping cleanup (--skip-uninstall specified)");
            self.record(Step::Cleanup, None, StepOutcome::Skipped);
            return;
        }

        ui::info("Cleaning up test installation...");
        match self.execute(Step::Cleanup) {
            Ok(Some(output)) if output.success() => ui::success("Cleanup completed"),
            Ok(Some(_)) => ui::warning(format!("Cleanup failed; uninstall {name} manually")),
            Ok(None) => {}
            Err(err) => ui::warning(format!("Error during cleanup: {err}")),
        }
    }
}

/// Formula names are passed to `brew` as single arguments and used as a
/// file stem, so they must not look like paths or flags. Either a bare name
/// or the tap-qualified `user/tap/name` form.
pub fn validate_formula_name(name: &str) -> Result<()> {
    let segments: Vec<&str> = name.split('/').collect();
    let valid = matches!(segments.len(), 1 | 3) && segments.iter().all(|s| is_name_segment(s));

    if valid {
        Ok(())
    } else {
        Err(FormulaError::InvalidFormulaName(name.to_string()))
    }
}

fn is_name_segment(segment: &str) -> bool {
    segment
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric())
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '+'))
}
