//! Terminal color control.
//!
//! `NO_COLOR` (https://no-color.org/) always wins. `CLICOLOR_FORCE` enables
//! colors even when stdout is not a terminal, `CLICOLOR=0` disables them, and
//! otherwise colors follow TTY detection.
use colored::control;

/// Decide whether to colorize from the relevant environment values.
pub fn should_colorize(
    no_color: Option<&str>,
    clicolor_force: Option<&str>,
    clicolor: Option<&str>,
    stdout_is_tty: bool,
) -> bool {
    if no_color.is_some() {
        return false;
    }
    if clicolor_force.is_some_and(|v| v != "0") {
        return true;
    }
    if clicolor == Some("0") {
        return false;
    }
    stdout_is_tty
}

/// Configure `colored` for the whole process. Call once, early in `main`.
pub fn init_colors() {
    let var = |name: &str| std::env::var(name).ok();
    let is_tty = std::io::IsTerminal::is_terminal(&std::io::stdout());

    control::set_override(should_colorize(
        var("NO_COLOR").as_deref(),
        var("CLICOLOR_FORCE").as_deref(),
        var("CLICOLOR").as_deref(),
        is_tty,
    ));
}
