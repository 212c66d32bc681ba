//! Migration jobs and the shapes they are declared in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Connection used by jobs that never name one.
pub const DEFAULT_JOB_CONNECTION: &str = "test";

/// A job as declared in configuration, with every field optional.
///
/// Unknown keys are rejected, so a misspelled field never passes as an
/// empty spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobSpec {
    /// Connection to migrate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    /// Plugin whose migrations should run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    /// Sub-directory the migrations are read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Last migration version to apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl JobSpec {
    /// Create an empty job spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection.
    pub fn connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    /// Set the plugin.
    pub fn plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    /// Set the source.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the target version.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.connection.is_none()
            && self.plugin.is_none()
            && self.source.is_none()
            && self.target.is_none()
    }

    /// Fill in `connection` when it is missing or blank. An existing value is kept.
    pub fn or_connection(mut self, connection: &str) -> Self {
        if self.connection.as_deref().is_none_or(str::is_empty) {
            self.connection = Some(connection.to_string());
        }
        self
    }

    /// Turn the spec into a job, defaulting the connection.
    pub fn resolve(self, default_connection: &str) -> MigrationJob {
        let spec = self.or_connection(default_connection);
        MigrationJob {
            connection: spec.connection.unwrap_or_else(|| default_connection.to_string()),
            plugin: spec.plugin,
            source: spec.source,
            target: spec.target,
        }
    }
}

/// One unit of migration work against a single connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MigrationJob {
    /// Connection to migrate.
    pub connection: String,
    /// Plugin whose migrations should run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    /// Sub-directory the migrations are read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Last migration version to apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl MigrationJob {
    /// Create a job for a connection.
    pub fn new(connection: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            plugin: None,
            source: None,
            target: None,
        }
    }

    /// Set the plugin.
    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    /// Set the source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the target version.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

impl fmt::Display for MigrationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.connection)?;
        if let Some(plugin) = &self.plugin {
            write!(f, " plugin={}", plugin)?;
        }
        if let Some(source) = &self.source {
            write!(f, " source={}", source)?;
        }
        if let Some(target) = &self.target {
            write!(f, " target={}", target)?;
        }
        Ok(())
    }
}

/// Ordered, read-only list of resolved jobs.
///
/// Order is the order migrations run in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobList(Vec<MigrationJob>);

impl JobList {
    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the jobs in order.
    pub fn iter(&self) -> std::slice::Iter<'_, MigrationJob> {
        self.0.iter()
    }

    /// The jobs as a slice.
    pub fn as_slice(&self) -> &[MigrationJob] {
        &self.0
    }

    /// Distinct connection names, in first-seen order.
    pub fn connections(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for job in &self.0 {
            if !seen.contains(&job.connection.as_str()) {
                seen.push(&job.connection);
            }
        }
        seen
    }
}

impl From<Vec<MigrationJob>> for JobList {
    fn from(jobs: Vec<MigrationJob>) -> Self {
        Self(jobs)
    }
}

impl<'a> IntoIterator for &'a JobList {
    type Item = &'a MigrationJob;
    type IntoIter = std::slice::Iter<'a, MigrationJob>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The `migrations` setting of a connection.
///
/// Accepted shapes: missing or `false`, `true`, one job table, or a list of
/// job tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawMigrationsSetting", into = "RawMigrationsSetting")]
pub enum MigrationsSetting {
    /// No migrations declared.
    #[default]
    Absent,
    /// Run the default migrations of the connection itself.
    All,
    /// A single job.
    One(JobSpec),
    /// Several jobs.
    Many(Vec<JobSpec>),
}

impl MigrationsSetting {
    /// Whether the setting contributes any job.
    pub fn is_declared(&self) -> bool {
        match self {
            Self::Absent => false,
            Self::All => true,
            Self::One(spec) => !spec.is_empty(),
            Self::Many(specs) => !specs.is_empty(),
        }
    }

    /// Expand the setting into job specs owned by `connection`.
    ///
    /// Jobs that already name a connection keep it.
    pub fn jobs_for(&self, connection: &str) -> Vec<JobSpec> {
        match self {
            Self::Absent => Vec::new(),
            Self::All => vec![JobSpec::new().connection(connection)],
            Self::One(spec) if spec.is_empty() => Vec::new(),
            Self::One(spec) => vec![spec.clone().or_connection(connection)],
            Self::Many(specs) => specs
                .iter()
                .cloned()
                .map(|spec| spec.or_connection(connection))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawMigrationsSetting {
    Flag(bool),
    Many(Vec<JobSpec>),
    One(JobSpec),
}

impl From<RawMigrationsSetting> for MigrationsSetting {
    fn from(raw: RawMigrationsSetting) -> Self {
        match raw {
            RawMigrationsSetting::Flag(true) => Self::All,
            RawMigrationsSetting::Flag(false) => Self::Absent,
            RawMigrationsSetting::One(spec) => Self::One(spec),
            RawMigrationsSetting::Many(specs) => Self::Many(specs),
        }
    }
}

impl From<MigrationsSetting> for RawMigrationsSetting {
    fn from(setting: MigrationsSetting) -> Self {
        match setting {
            MigrationsSetting::Absent => Self::Flag(false),
            MigrationsSetting::All => Self::Flag(true),
            MigrationsSetting::One(spec) => Self::One(spec),
            MigrationsSetting::Many(specs) => Self::Many(specs),
        }
    }
}
