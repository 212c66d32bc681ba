//! CLI configuration handling.

use indexmap::IndexMap;
use prax_testsync::{ConnectionConfig, DEFAULT_JOB_CONNECTION, JobSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};

/// Default config file name (lives in project root)
pub const CONFIG_FILE_NAME: &str = "prax-testsync.toml";

/// Default migrations directory (relative to the config file)
pub const MIGRATIONS_DIR: &str = "migrations";

/// Prax TestSync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory of the migration files
    pub migrations_dir: PathBuf,

    /// Connection used by jobs that do not name one
    pub default_connection: String,

    /// Configured connections, in file order
    pub connections: IndexMap<String, ConnectionConfig>,

    /// Global job list; replaces every per-connection declaration when non-empty
    pub jobs: Vec<JobSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from(MIGRATIONS_DIR),
            default_connection: DEFAULT_JOB_CONNECTION.to_string(),
            connections: IndexMap::new(),
            jobs: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Err(CliError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.migrations_dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            config.migrations_dir = base.join(&config.migrations_dir);
        }
        Ok(config)
    }

    /// Jobs that replace the per-connection declarations.
    ///
    /// Jobs given on the command line win over the file's `[[jobs]]`.
    pub fn overrides(&self, cli_jobs: Vec<JobSpec>) -> Vec<JobSpec> {
        if cli_jobs.is_empty() {
            self.jobs.clone()
        } else {
            cli_jobs
        }
    }
}
