//! Error types for the test database synchronizer.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for synchronizer operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while synchronizing test databases.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed or contradictory migration configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A connection name that is neither configured nor aliased.
    #[error("Connection '{0}' is not configured")]
    UnknownConnection(String),

    /// Dropping or truncating the tables of a connection failed.
    #[error("Cleanup of connection '{connection}' failed: {message}")]
    Cleanup {
        /// Connection being cleaned.
        connection: String,
        /// Underlying failure.
        message: String,
    },

    /// The migration status of a connection could not be read.
    #[error("Cannot read migration status of connection '{connection}': {message}")]
    Status {
        /// Connection being inspected.
        connection: String,
        /// Underlying failure.
        message: String,
    },

    /// A migration run failed.
    #[error("Migration for connection '{connection}' failed: {message}")]
    Migration {
        /// Connection being migrated.
        connection: String,
        /// Underlying failure.
        message: String,
    },

    /// Database driver error.
    #[error("Database error: {0}")]
    Database(String),

    /// A schema or migration file could not be read.
    #[error("Cannot read '{}': {source}", path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a cleanup error for a connection.
    pub fn cleanup(connection: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Cleanup {
            connection: connection.into(),
            message: msg.into(),
        }
    }

    /// Create a status-inspection error for a connection.
    pub fn status(connection: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Status {
            connection: connection.into(),
            message: msg.into(),
        }
    }

    /// Create a migration error for a connection.
    pub fn migration(connection: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Migration {
            connection: connection.into(),
            message: msg.into(),
        }
    }

    /// Create an I/O error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts a synchronizer run.
    ///
    /// Migration failures are recorded per job and the run carries on; every
    /// other error stops the run where it happened.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Migration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::cleanup("test_2", "no such table: users");
        let msg = err.to_string();
        assert!(msg.contains("test_2"));
        assert!(msg.contains("no such table"));
    }

    #[test]
    fn test_io_error_names_path() {
        let err = SyncError::io(
            "schema/dump.sql",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("schema/dump.sql"));
    }

    #[test]
    fn test_is_fatal() {
        assert!(!SyncError::migration("test", "boom").is_fatal());
        assert!(SyncError::status("test", "boom").is_fatal());
        assert!(SyncError::cleanup("test", "boom").is_fatal());
        assert!(SyncError::config("bad").is_fatal());
    }
}
