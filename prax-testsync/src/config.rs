//! Resolution of declared migration settings into a job list.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::SyncResult;
use crate::job::{DEFAULT_JOB_CONNECTION, JobList, JobSpec, MigrationJob, MigrationsSetting};
use crate::registry::ConnectionRegistry;

/// Turns per-connection `migrations` settings and caller overrides into a [`JobList`].
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    default_connection: String,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self {
            default_connection: DEFAULT_JOB_CONNECTION.to_string(),
        }
    }
}

impl ConfigResolver {
    /// Create a resolver defaulting jobs to `test`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another connection for jobs that never name one.
    pub fn with_default_connection(mut self, connection: impl Into<String>) -> Self {
        self.default_connection = connection.into();
        self
    }

    /// Connection used for jobs that never name one.
    pub fn default_connection(&self) -> &str {
        &self.default_connection
    }

    /// Collect the declared jobs of every connection, in declaration order.
    pub fn aggregate(&self, declared: &IndexMap<String, MigrationsSetting>) -> Vec<JobSpec> {
        declared
            .iter()
            .filter(|(_, setting)| setting.is_declared())
            .flat_map(|(name, setting)| setting.jobs_for(name))
            .collect()
    }

    /// Resolve the final job list.
    ///
    /// A non-empty `overrides` replaces the declared jobs outright. The result
    /// is never empty and every job carries a connection.
    pub fn resolve(
        &self,
        declared: &IndexMap<String, MigrationsSetting>,
        overrides: &[JobSpec],
    ) -> JobList {
        let specs = if overrides.is_empty() {
            self.aggregate(declared)
        } else {
            debug!(jobs = overrides.len(), "Using migration override");
            overrides.to_vec()
        };

        let mut jobs: Vec<MigrationJob> = specs
            .into_iter()
            .map(|spec| spec.resolve(&self.default_connection))
            .collect();

        if jobs.is_empty() {
            jobs.push(MigrationJob::new(self.default_connection.as_str()));
        }

        debug!(jobs = jobs.len(), "Resolved migration jobs");
        JobList::from(jobs)
    }

    /// Resolve against the settings held by a registry.
    pub fn resolve_registry(
        &self,
        registry: &dyn ConnectionRegistry,
        overrides: &[JobSpec],
    ) -> SyncResult<JobList> {
        Ok(self.resolve(&registry.declared_migrations(), overrides))
    }
}
