//! # prax-testsync
//!
//! Test database lifecycle synchronizer for the Prax ORM.
//!
//! Before a test run, every test connection is brought in line with its
//! declared migrations. Connections whose applied history has drifted are
//! dropped and migrated from scratch; afterwards their data tables are emptied
//! while the migration bookkeeping survives.
//!
//! This crate provides:
//! - Resolution of per-connection `migrations` settings into a job list
//! - One-time aliasing of production connection names to `test_` connections
//! - Dialect-aware table listing, dropping, and truncation
//! - Staleness detection from migration status reports
//! - The [`Synchronizer`] that drives a whole run
//! - Schema import from SQL dump files
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │ ConfigResolver │────▶│ ConnectionAlias │────▶│ Status Inspector │
//! └────────────────┘     └─────────────────┘     └──────────────────┘
//!                                                         │
//!                                                  any stale? ── no ──▶ done
//!                                                         │
//!                                                         ▼
//!                  ┌──────────────┐     ┌─────────────┐     ┌──────────────┐
//!                  │ Drop (stale) │────▶│ Migrate all │────▶│ Truncate     │
//!                  └──────────────┘     └─────────────┘     │ (stale)      │
//!                                                           └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prax_testsync::{ConnectionManager, DirectoryMigrationRunner, Synchronizer};
//!
//! async fn bootstrap(registry: Arc<ConnectionManager>) -> prax_testsync::SyncResult<()> {
//!     let runner = DirectoryMigrationRunner::new(registry.clone(), "migrations");
//!     let report = Synchronizer::new(registry, Arc::new(runner)).run(&[]).await?;
//!     println!("rebuilt: {:?}", report.modified_connections());
//!     Ok(())
//! }
//! ```
//!
//! ## Bookkeeping tables
//!
//! Any table whose name ends in `phinxlog` records applied migrations. Such
//! tables are dropped along with the schema but never truncated.

pub mod alias;
pub mod cleaner;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod directory;
pub mod dump;
pub mod error;
pub mod introspect;
pub mod job;
pub mod output;
pub mod registry;
pub mod status;
pub mod sync;

#[cfg(test)]
mod testing;

// Re-exports
pub use alias::{AliasMap, AliasPair, ConnectionAliaser};
pub use cleaner::SchemaCleaner;
pub use config::ConfigResolver;
pub use connection::{Connection, execute_guarded, transactional, with_constraints_disabled};
pub use dialect::{Driver, MysqlDialect, PostgresDialect, SchemaDialect, SqliteDialect};
pub use directory::{DirectoryMigrationRunner, MigrationSource, bookkeeping_table};
pub use dump::SchemaDump;
pub use error::{SyncError, SyncResult};
pub use introspect::{
    BOOKKEEPING_SUFFIX, SchemaIntrospector, exclude_bookkeeping_tables, is_bookkeeping_table,
};
pub use job::{DEFAULT_JOB_CONNECTION, JobList, JobSpec, MigrationJob, MigrationsSetting};
pub use output::{ConsoleOutput, NullOutput, Output, OutputLevel, RecordingOutput, TracingOutput};
pub use registry::{ConnectionConfig, ConnectionManager, ConnectionRegistry, Connector};
pub use status::{
    MigrationRunner, MigrationState, MigrationStatusEntry, MigrationStatusInspector, StaleReason,
    is_stale, stale_reason,
};
pub use sync::{FailedJob, SyncReport, Synchronizer};
