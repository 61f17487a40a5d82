//! Error types for build tasks.
//!
//! Errors are propagated to the task runner, which reports them and exits.
//! Nothing here is retried; the operator fixes the condition and re-runs.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for task operations
pub type Result<T> = std::result::Result<T, TasksError>;

/// Main error type for all task operations
#[derive(Error, Debug)]
pub enum TasksError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IO errors tied to a specific path
    #[error("Failed {action} {}: {source}", path.display())]
    Fs {
        /// What was being done
        action: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP errors, including non-success status codes
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid package reference string
    #[error("Invalid package reference '{reference}': {reason}")]
    InvalidReference {
        /// The offending string
        reference: String,
        /// What is wrong with it
        reason: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Required external tool is not installed
    #[error("Required tool '{tool}' was not found in PATH")]
    ToolNotFound {
        /// Tool name
        tool: String,
    },

    /// Interactive prompt was cancelled or failed
    #[error("Prompt failed: {0}")]
    Prompt(String),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

/// Attach a path and an action to an IO error.
pub trait FsContext<T> {
    /// Converts an IO error into [`TasksError::Fs`].
    fn fs_context(self, action: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> FsContext<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, action: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| TasksError::Fs {
            action,
            path: path.into(),
            source,
        })
    }
}

impl From<inquire::InquireError> for TasksError {
    fn from(e: inquire::InquireError) -> Self {
        TasksError::Prompt(e.to_string())
    }
}
