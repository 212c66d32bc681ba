//! # Prax Testkit
//!
//! Keeps the test databases of a Prax application in line with their
//! migrations.
//!
//! Before a test run, every declared migration job is checked. Connections
//! whose applied history has drifted are dropped, migrated from scratch and
//! emptied; untouched connections keep their schema.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use indexmap::IndexMap;
//! use prax_testkit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> SyncResult<()> {
//!     let config: IndexMap<String, ConnectionConfig> = toml::from_str(
//!         r#"test = { driver = "sqlite", url = "tmp/test.db", migrations = true }"#,
//!     )
//!     .map_err(|e| SyncError::config(e.to_string()))?;
//!     let registry = Arc::new(ConnectionManager::new(config, Arc::new(SqliteConnector)));
//!     let runner = Arc::new(DirectoryMigrationRunner::new(registry.clone(), "migrations"));
//!
//!     let report = Synchronizer::new(registry, runner).run(&[]).await?;
//!     assert!(report.is_success());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use prax_testsync as testsync;

/// SQLite connections.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    pub use prax_testsync_sqlite::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use prax_testsync::{
        ConnectionConfig, ConnectionManager, ConnectionRegistry, DirectoryMigrationRunner, Driver,
        JobSpec, MigrationsSetting, SchemaCleaner, SchemaDump, SyncError, SyncReport, SyncResult,
        Synchronizer,
    };

    #[cfg(feature = "sqlite")]
    pub use prax_testsync_sqlite::{SqliteConfig, SqliteConnection, SqliteConnector};
}

// Re-export key types at the crate root
pub use prax_testsync::{SyncError, SyncResult, Synchronizer};
