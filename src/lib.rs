//! Tooling for the kpf Homebrew tap.
//!
//! Two independent workflows share this library:
//!
//! - **formula-updater**: [`PypiApi`] resolves a release on the package index,
//!   [`formula::render`] turns it into a formula and [`emit::emit`] reports the
//!   metadata for people or CI.
//! - **test-formula**: [`Orchestrator`] drives `brew` through audit, install,
//!   test and cleanup for a local formula file.

pub mod api;
pub mod colors;
pub mod emit;
pub mod error;
pub mod formula;
pub mod logging;
pub mod orchestrator;
pub mod release;
pub mod runner;
pub mod ui;

// Re-export commonly used types
pub use api::PypiApi;
pub use emit::OutputFormat;
pub use error::{FormulaError, Result};
pub use orchestrator::{Orchestrator, OrchestratorOptions};
pub use release::ReleaseMetadata;
pub use runner::{CommandRunner, DryRunRunner, SystemRunner};
