//! SQLite support for the Prax test database synchronizer.
//!
//! This crate provides a [`SqliteConnection`] implementing the synchronizer's
//! `Connection` trait over `tokio-rusqlite`, and a [`SqliteConnector`] that
//! opens one per configured `sqlite` connection.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prax_testsync::{ConnectionManager, DirectoryMigrationRunner, Synchronizer};
//! use prax_testsync_sqlite::SqliteConnector;
//!
//! let registry = Arc::new(ConnectionManager::new(configs, Arc::new(SqliteConnector)));
//! let runner = DirectoryMigrationRunner::new(registry.clone(), "migrations");
//! let report = Synchronizer::new(registry, Arc::new(runner)).run(&[]).await?;
//! ```

pub mod config;
pub mod connection;
pub mod error;

pub use config::{DatabasePath, SqliteConfig};
pub use connection::{SqliteConnection, SqliteConnector};
pub use error::{SqliteError, SqliteResult};
