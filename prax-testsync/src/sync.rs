//! The synchronizer: brings every test connection in line with its migrations.
//!
//! A run goes through the same phases every time:
//!
//! 1. resolve the job list
//! 2. alias the connections (first run of the process only)
//! 3. inspect the status of every job
//! 4. stop if nothing is stale, otherwise drop the stale connections,
//!    migrate every job, and truncate the stale connections

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info, instrument, warn};

use crate::alias::ConnectionAliaser;
use crate::cleaner::SchemaCleaner;
use crate::config::ConfigResolver;
use crate::error::{SyncError, SyncResult};
use crate::job::{JobList, JobSpec, MigrationJob};
use crate::output::{NullOutput, Output};
use crate::registry::ConnectionRegistry;
use crate::status::{MigrationRunner, MigrationStatusInspector, StaleReason};

/// A job whose migration run failed.
#[derive(Debug)]
pub struct FailedJob {
    /// The job.
    pub job: MigrationJob,
    /// What the runner reported.
    pub error: SyncError,
}

/// Outcome of one synchronizer run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Jobs the run worked from.
    pub jobs: JobList,
    /// Stale connections in first-seen order, with the first reason found.
    pub stale: IndexMap<String, StaleReason>,
    /// Connections that were dropped and migrated again.
    pub modified: IndexSet<String>,
    /// Jobs whose migration failed.
    pub failed: Vec<FailedJob>,
}

impl SyncReport {
    /// Whether the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.modified.is_empty()
    }

    /// Whether every attempted migration succeeded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Names of the modified connections, in order.
    pub fn modified_connections(&self) -> Vec<&str> {
        self.modified.iter().map(String::as_str).collect()
    }
}

/// Orchestrates resolution, inspection, cleanup, and migration.
pub struct Synchronizer {
    registry: Arc<dyn ConnectionRegistry>,
    runner: Arc<dyn MigrationRunner>,
    aliaser: Arc<ConnectionAliaser>,
    output: Arc<dyn Output>,
    resolver: ConfigResolver,
}

impl Synchronizer {
    /// Create a synchronizer over a registry and a migration runner.
    ///
    /// Uses the process-wide aliaser and reports nothing until an output is set.
    pub fn new(registry: Arc<dyn ConnectionRegistry>, runner: Arc<dyn MigrationRunner>) -> Self {
        Self {
            registry,
            runner,
            aliaser: ConnectionAliaser::shared(),
            output: Arc::new(NullOutput),
            resolver: ConfigResolver::default(),
        }
    }

    /// Report progress to `output`.
    pub fn with_output(mut self, output: Arc<dyn Output>) -> Self {
        self.output = output;
        self
    }

    /// Use a specific aliaser instead of the process-wide one.
    pub fn with_aliaser(mut self, aliaser: Arc<ConnectionAliaser>) -> Self {
        self.aliaser = aliaser;
        self
    }

    /// Use a specific config resolver.
    pub fn with_resolver(mut self, resolver: ConfigResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// The registry being synchronized.
    pub fn registry(&self) -> &Arc<dyn ConnectionRegistry> {
        &self.registry
    }

    /// Resolve the jobs a run with `overrides` would work from.
    pub fn resolve_jobs(&self, overrides: &[JobSpec]) -> SyncResult<JobList> {
        self.resolver
            .resolve_registry(self.registry.as_ref(), overrides)
    }

    /// Synchronize every connection.
    ///
    /// A non-empty `overrides` replaces the jobs declared in the registry.
    /// Migration failures are collected in the report; any other error stops
    /// the run.
    #[instrument(skip_all, fields(overrides = overrides.len()))]
    pub async fn run(&self, overrides: &[JobSpec]) -> SyncResult<SyncReport> {
        let jobs = self.resolve_jobs(overrides)?;
        self.aliaser.alias_connections(self.registry.as_ref());

        let stale = self.inspect_all(&jobs).await?;
        let mut report = SyncReport {
            jobs,
            ..SyncReport::default()
        };

        if stale.is_empty() {
            info!("All connections are up to date");
            self.output.success("No migration changes detected.");
            return Ok(report);
        }

        let cleaner = SchemaCleaner::new(Arc::clone(&self.output));

        info!(connections = stale.len(), "Dropping stale connections");
        for name in stale.keys() {
            cleaner.drop(self.registry.as_ref(), name).await?;
            report.modified.insert(name.clone());
        }

        info!(jobs = report.jobs.len(), "Running migrations");
        for job in &report.jobs {
            match self.runner.migrate(job).await {
                Ok(()) => {
                    self.output.success(&format!(
                        "Running for connection {} successful.",
                        job.connection
                    ));
                }
                Err(err) => {
                    warn!(job = %job, error = %err, "Migration failed");
                    self.output.error(&format!(
                        "Migration for connection {} failed.",
                        job.connection
                    ));
                    report.failed.push(FailedJob {
                        job: job.clone(),
                        error: err,
                    });
                }
            }
        }

        for name in stale.keys() {
            cleaner.truncate(self.registry.as_ref(), name).await?;
        }

        report.stale = stale;
        info!(
            modified = report.modified.len(),
            failed = report.failed.len(),
            "Synchronization finished"
        );
        Ok(report)
    }

    async fn inspect_all(&self, jobs: &JobList) -> SyncResult<IndexMap<String, StaleReason>> {
        let inspector = MigrationStatusInspector::new(Arc::clone(&self.runner));
        let mut stale = IndexMap::new();

        for job in jobs {
            if let Some(reason) = inspector.inspect(job).await? {
                debug!(job = %job, reason = %reason, "Connection is stale");
                stale.entry(job.connection.clone()).or_insert(reason);
            }
        }
        Ok(stale)
    }
}
