use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormulaError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed package index response: {0}")]
    MalformedResponse(String),

    #[error("Not found on package index: {0}")]
    NotFound(String),

    #[error("No source distribution found for {package} {version}")]
    NoSourceDistribution { package: String, version: String },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0} is not installed or not in PATH")]
    PrerequisiteMissing(String),

    #[error("Invalid formula name '{0}'")]
    InvalidFormulaName(String),

    #[error("Formula file {} not found", .0.display())]
    FormulaFileMissing(PathBuf),

    #[error("Command failed: {command}{}", exit_suffix(*code))]
    ExternalCommand { command: String, code: Option<i32> },

    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

fn exit_suffix(code: Option<i32>) -> String {
    match code {
        Some(code) => format!(" (exit status {code})"),
        None => " (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, FormulaError>;
