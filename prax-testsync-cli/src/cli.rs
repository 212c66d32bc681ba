//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use prax_testsync::JobSpec;
use std::path::PathBuf;

use crate::config::CONFIG_FILE_NAME;

/// Prax TestSync - Keep test databases in line with their migrations
#[derive(Parser, Debug)]
#[command(name = "prax-testsync")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "Prax TestSync - Keep test databases in line with their migrations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the connection registry
    #[arg(short, long, global = true, env = "PRAX_TESTSYNC_CONFIG", default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Root directory of the migration files (overrides the config file)
    #[arg(long, global = true)]
    pub migrations_dir: Option<PathBuf>,

    /// Print progress and enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rebuild stale test databases and run all migrations
    Sync(JobArgs),

    /// Show the migration status of every job
    Status(JobArgs),

    /// Drop every table of a connection
    Drop(ConnectionArgs),

    /// Empty every data table of a connection
    Truncate(ConnectionArgs),

    /// Rebuild a connection's schema from SQL dump files
    Dump(DumpArgs),

    /// List the tables of a connection
    Tables(TablesArgs),
}

// =============================================================================
// Sync / Status Commands
// =============================================================================

/// Arguments for the `sync` and `status` commands
#[derive(Args, Debug, Default)]
pub struct JobArgs {
    /// Only process these connections (replaces the configured jobs)
    #[arg(long = "connection", value_name = "NAME")]
    pub connections: Vec<String>,
}

impl JobArgs {
    /// Jobs given on the command line, one per connection.
    pub fn overrides(&self) -> Vec<JobSpec> {
        self.connections
            .iter()
            .map(|name| JobSpec::new().connection(name))
            .collect()
    }
}

// =============================================================================
// Drop / Truncate Commands
// =============================================================================

/// Arguments naming a single connection
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Connection name
    pub connection: String,
}

// =============================================================================
// Dump Command
// =============================================================================

/// Arguments for the `dump` command
#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Connection name
    pub connection: String,

    /// SQL files executed in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

// =============================================================================
// Tables Command
// =============================================================================

/// Arguments for the `tables` command
#[derive(Args, Debug)]
pub struct TablesArgs {
    /// Connection name
    pub connection: String,

    /// Include migration bookkeeping tables
    #[arg(short, long)]
    pub all: bool,
}
