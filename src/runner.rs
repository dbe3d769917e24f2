//! External command execution for the formula test harness.
//!
//! [`SystemRunner`] spawns real processes; [`DryRunRunner`] prints what would
//! have run and reports success without spawning anything.

use crate::error::{FormulaError, Result};
use crate::ui;
use std::fmt;
use std::io::ErrorKind;
use std::process::{Command, Stdio};

/// One external command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Capture stdout/stderr instead of passing them through to the terminal
    pub capture: bool,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            capture: false,
        }
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit status and (when captured) output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn succeeded() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands on behalf of the orchestrator.
///
/// A non-zero exit is not an error at this level; callers decide what it
/// means. `Err` is reserved for commands that could not be started.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// True when nothing is actually executed.
    fn is_dry_run(&self) -> bool {
        false
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        (**self).run(invocation)
    }

    fn is_dry_run(&self) -> bool {
        (**self).is_dry_run()
    }
}

/// Spawns processes with `std::process::Command`, blocking until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        tracing::debug!(command = %invocation, capture = invocation.capture, "running command");

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);

        let spawn_err = |e: std::io::Error| match e.kind() {
            ErrorKind::NotFound => FormulaError::PrerequisiteMissing(invocation.program.clone()),
            _ => FormulaError::IoError(e),
        };

        let output = if invocation.capture {
            let output = command.stdin(Stdio::null()).output().map_err(spawn_err)?;
            CommandOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
        } else {
            let status = command.status().map_err(spawn_err)?;
            CommandOutput {
                code: status.code(),
                ..CommandOutput::default()
            }
        };

        tracing::debug!(command = %invocation, code = ?output.code, "command finished");
        Ok(output)
    }
}

/// Echoes each command line and reports success with empty output.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        ui::dry_run(invocation);
        Ok(CommandOutput::succeeded())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
