//! CLI error types and result alias.

use miette::Diagnostic;
use prax_testsync::SyncError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(prax_testsync::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(prax_testsync::config))]
    Config(String),

    /// Synchronizer error
    #[error("{0}")]
    #[diagnostic(code(prax_testsync::sync))]
    Sync(#[from] SyncError),

    /// One or more migration jobs failed
    #[error("Migration error: {0}")]
    #[diagnostic(
        code(prax_testsync::migration),
        help("run with --verbose to see each job's progress")
    )]
    Migration(String),
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}
