//! CLI command implementations.

pub mod drop;
pub mod dump;
pub mod status;
pub mod sync;
pub mod tables;
pub mod truncate;

use std::path::PathBuf;
use std::sync::Arc;

use prax_testsync::{
    ConfigResolver, ConnectionAliaser, ConnectionManager, ConsoleOutput, DirectoryMigrationRunner,
    Output,
};
use prax_testsync_sqlite::SqliteConnector;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::error::CliResult;

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> CliResult<()> {
    let ctx = Context::load(&cli)?;

    match cli.command {
        Command::Sync(args) => sync::run(&ctx, args).await,
        Command::Status(args) => status::run(&ctx, args).await,
        Command::Drop(args) => drop::run(&ctx, args).await,
        Command::Truncate(args) => truncate::run(&ctx, args).await,
        Command::Dump(args) => dump::run(&ctx, args).await,
        Command::Tables(args) => tables::run(&ctx, args).await,
    }
}

/// Everything a command needs, built once from the config file and flags.
pub struct Context {
    /// Parsed configuration.
    pub config: Config,
    /// Registry over the configured connections.
    pub registry: Arc<ConnectionManager>,
    /// Root directory of the migration files.
    pub migrations_dir: PathBuf,
    /// Whether progress is printed.
    pub verbose: bool,
}

impl Context {
    /// Load the config file named on the command line.
    ///
    /// Connections are aliased right away, so every command that names a
    /// connection resolves `default` to `test`.
    pub fn load(cli: &Cli) -> CliResult<Self> {
        let config = Config::load(&cli.config)?;
        let migrations_dir = cli
            .migrations_dir
            .clone()
            .unwrap_or_else(|| config.migrations_dir.clone());
        debug!(
            config = %cli.config.display(),
            migrations_dir = %migrations_dir.display(),
            connections = config.connections.len(),
            "Loaded configuration"
        );

        let registry = Arc::new(ConnectionManager::new(
            config.connections.clone(),
            Arc::new(SqliteConnector),
        ));
        ConnectionAliaser::shared().alias_connections(registry.as_ref());

        Ok(Self {
            config,
            registry,
            migrations_dir,
            verbose: cli.verbose,
        })
    }

    /// Progress sink for library calls.
    pub fn output(&self) -> Arc<dyn Output> {
        Arc::new(ConsoleOutput::new(self.verbose))
    }

    /// Migration runner reading from the migrations directory.
    pub fn runner(&self) -> Arc<DirectoryMigrationRunner> {
        Arc::new(DirectoryMigrationRunner::new(
            self.registry.clone(),
            self.migrations_dir.clone(),
        ))
    }

    /// Job resolver honoring the configured default connection.
    pub fn resolver(&self) -> ConfigResolver {
        ConfigResolver::new().with_default_connection(self.config.default_connection.as_str())
    }
}
