//! Tagged status lines for the formula test harness.

use colored::Colorize;
use std::fmt::Display;

pub fn info(message: impl Display) {
    println!("{} {}", "[INFO]".blue(), message);
}

pub fn warning(message: impl Display) {
    println!("{} {}", "[WARNING]".yellow(), message);
}

pub fn success(message: impl Display) {
    println!("{} {}", "[SUCCESS]".green(), message);
}

/// Command line that a real run would execute.
pub fn dry_run(command: impl Display) {
    println!("  {} {}", "DRY RUN:".cyan(), command);
}

/// Errors go to stderr so they survive stdout redirection.
pub fn error(message: impl Display) {
    eprintln!("{} {}", "[ERROR]".red(), message);
}

/// Blank line between workflow stages.
pub fn gap() {
    println!();
}
