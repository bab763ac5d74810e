use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum KettleError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Git Error: {0}")]
    Git(#[from] Arc<git2::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    /// The descriptor text is malformed. Carries the 1-based line (0 when the
    /// error is not tied to a line).
    #[error("Parse error at line {0}: {1}")]
    ParseError(usize, String),

    #[error("Dependency resolution failed, missing: {}", .0.join(", "))]
    DependencyResolutionError(Vec<String>),

    #[error("Install step {} failed ({}): {command}", .index + 1, describe_status(.status))]
    StepExecutionError {
        index: usize,
        command: String,
        /// `None` when the process was killed by a signal or never started.
        status: Option<i32>,
    },

    #[error("Failed to fetch source '{0}': {1}")]
    FetchError(String, String),

    #[error("Installation Error: {0}")]
    InstallError(String),

    #[error("Build environment setup failed: {0}")]
    BuildEnvError(String),

    #[error("{failed} of {total} recipes failed to load")]
    RecipesFailed { failed: usize, total: usize },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "no exit status".to_string(),
    }
}

impl KettleError {
    /// Short name of the install stage this error belongs to.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ParseError(..) | Self::RecipesFailed { .. } => "load",
            Self::DependencyResolutionError(_) => "dependencies",
            Self::FetchError(..) | Self::Git(_) => "fetch",
            Self::StepExecutionError { .. } => "build",
            Self::Config(_) | Self::BuildEnvError(_) => "setup",
            _ => "install",
        }
    }
}

impl From<std::io::Error> for KettleError {
    fn from(err: std::io::Error) -> Self {
        KettleError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for KettleError {
    fn from(err: serde_json::Error) -> Self {
        KettleError::Json(Arc::new(err))
    }
}

impl From<git2::Error> for KettleError {
    fn from(err: git2::Error) -> Self {
        KettleError::Git(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, KettleError>;
