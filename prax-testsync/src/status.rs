//! Migration status and staleness detection.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::job::MigrationJob;

/// Whether a migration has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    /// Applied.
    Up,
    /// Not applied.
    Down,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
        }
    }
}

/// One line of a migration status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatusEntry {
    /// Migration version or name.
    pub name: String,
    /// Applied or not.
    pub status: MigrationState,
    /// Recorded as applied but no longer declared.
    #[serde(default)]
    pub missing: bool,
}

impl MigrationStatusEntry {
    /// An applied migration that is still declared.
    pub fn up(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: MigrationState::Up,
            missing: false,
        }
    }

    /// A declared migration that has not been applied.
    pub fn down(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: MigrationState::Down,
            missing: false,
        }
    }

    /// An applied migration whose source has disappeared.
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: MigrationState::Up,
            missing: true,
        }
    }
}

/// Runs migrations and reports their status. Owns its own transactions.
#[async_trait::async_trait]
pub trait MigrationRunner: Send + Sync {
    /// Status of every migration relevant to `job`, in version order.
    async fn status(&self, job: &MigrationJob) -> SyncResult<Vec<MigrationStatusEntry>>;

    /// Apply the pending migrations of `job`.
    async fn migrate(&self, job: &MigrationJob) -> SyncResult<()>;
}

/// Why a connection has to be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// An applied migration is no longer declared.
    Missing(String),
    /// A declared migration is not applied.
    Pending(String),
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "applied migration {} is missing", name),
            Self::Pending(name) => write!(f, "migration {} is pending", name),
        }
    }
}

/// The first entry that makes the history untrustworthy, if any.
pub fn stale_reason(entries: &[MigrationStatusEntry]) -> Option<StaleReason> {
    entries.iter().find_map(|entry| match (entry.status, entry.missing) {
        (MigrationState::Up, true) => Some(StaleReason::Missing(entry.name.clone())),
        (MigrationState::Down, _) => Some(StaleReason::Pending(entry.name.clone())),
        (MigrationState::Up, false) => None,
    })
}

/// Whether a status snapshot calls for a drop and a fresh migration run.
pub fn is_stale(entries: &[MigrationStatusEntry]) -> bool {
    stale_reason(entries).is_some()
}

/// Asks the runner for a job's status and applies [`is_stale`].
#[derive(Clone)]
pub struct MigrationStatusInspector {
    runner: Arc<dyn MigrationRunner>,
}

impl MigrationStatusInspector {
    /// Create an inspector over a runner.
    pub fn new(runner: Arc<dyn MigrationRunner>) -> Self {
        Self { runner }
    }

    /// Why the job's connection is stale, or `None` when it is current.
    ///
    /// A runner failure is returned as [`SyncError::Status`].
    pub async fn inspect(&self, job: &MigrationJob) -> SyncResult<Option<StaleReason>> {
        let entries = self
            .runner
            .status(job)
            .await
            .map_err(|e| SyncError::status(&job.connection, e.to_string()))?;
        let reason = stale_reason(&entries);
        debug!(job = %job, entries = entries.len(), stale = reason.is_some(), "Inspected migration status");
        Ok(reason)
    }

    /// Whether the job's connection is stale.
    pub async fn is_stale(&self, job: &MigrationJob) -> SyncResult<bool> {
        Ok(self.inspect(job).await?.is_some())
    }
}
