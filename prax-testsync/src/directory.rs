//! A migration runner reading `up.sql` files from a directory tree.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/                          application migrations
//! <root>/<source>/                 application migrations of a source
//! <root>/plugins/<plugin>/         plugin migrations
//! <root>/plugins/<plugin>/<source>/
//! ```
//!
//! Each migration is a `<14-digit version>_<name>/up.sql` directory. Applied
//! versions are recorded per directory: `phinxlog` for the application,
//! `<snake_source>_phinxlog` for a source, `<snake_plugin>_phinxlog` for a
//! plugin and `<snake_plugin>_<snake_source>_phinxlog` for a plugin source.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::connection::{Connection, transactional};
use crate::error::{SyncError, SyncResult};
use crate::introspect::{BOOKKEEPING_SUFFIX, SchemaIntrospector};
use crate::job::MigrationJob;
use crate::registry::ConnectionRegistry;
use crate::status::{MigrationRunner, MigrationStatusEntry};

/// A migration found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSource {
    /// 14-digit version.
    pub version: String,
    /// Human readable name.
    pub name: String,
    /// Directory holding `up.sql`.
    pub path: PathBuf,
}

impl MigrationSource {
    /// Path of the script to run.
    pub fn up_path(&self) -> PathBuf {
        self.path.join("up.sql")
    }
}

/// Split a migration directory name into (version, name).
pub fn parse_migration_name(dir_name: &str) -> SyncResult<(String, String)> {
    let (version, name) = dir_name.split_once('_').ok_or_else(|| {
        SyncError::config(format!("Invalid migration name format: {}", dir_name))
    })?;

    if version.len() != 14 || !version.chars().all(|c| c.is_ascii_digit()) {
        return Err(SyncError::config(format!(
            "Invalid migration version (expected timestamp): {}",
            version
        )));
    }

    Ok((version.to_string(), name.to_string()))
}

/// Every migration under `dir`, ordered by version. A missing directory has none.
pub async fn list_migrations(dir: &Path) -> SyncResult<Vec<MigrationSource>> {
    let mut migrations = Vec::new();
    if !dir.is_dir() {
        return Ok(migrations);
    }

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| SyncError::io(dir, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SyncError::io(dir, e))?
    {
        let path = entry.path();
        if !path.join("up.sql").is_file() {
            continue;
        }
        let Some(dir_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Ok((version, name)) = parse_migration_name(dir_name) else {
            continue;
        };
        migrations.push(MigrationSource {
            version,
            name,
            path,
        });
    }

    migrations.sort_by(|a, b| a.version.cmp(&b.version));
    Ok(migrations)
}

/// `FooPlugin` → `foo_plugin`, `Vendor/Bar` → `vendor_bar`.
fn underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '/' || c == '\\' || c == '-' || c == '.' {
            out.push('_');
            prev_lower = false;
        } else if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

/// Name of the table recording the applied migrations of `job`.
///
/// Every migrations directory gets its own table, so one job never sees
/// another job's versions as missing.
pub fn bookkeeping_table(job: &MigrationJob) -> String {
    let mut table = String::new();
    for part in [&job.plugin, &job.source].into_iter().flatten() {
        table.push_str(&underscore(part));
        table.push('_');
    }
    table.push_str(BOOKKEEPING_SUFFIX);
    table
}

/// Runs migrations from `up.sql` files and keeps a bookkeeping table per job.
pub struct DirectoryMigrationRunner {
    registry: Arc<dyn ConnectionRegistry>,
    root: PathBuf,
}

impl DirectoryMigrationRunner {
    /// Create a runner reading migrations below `root`.
    pub fn new(registry: Arc<dyn ConnectionRegistry>, root: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            root: root.into(),
        }
    }

    /// Root migrations directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the migrations of `job`.
    pub fn migrations_dir(&self, job: &MigrationJob) -> PathBuf {
        let base = match &job.plugin {
            Some(plugin) => self.root.join("plugins").join(plugin),
            None => self.root.clone(),
        };
        match &job.source {
            Some(source) => base.join(source),
            None => base,
        }
    }

    /// Migrations of `job` up to and including its target.
    async fn declared(&self, job: &MigrationJob) -> SyncResult<Vec<MigrationSource>> {
        let mut migrations = list_migrations(&self.migrations_dir(job)).await?;
        if let Some(target) = job.target.as_deref() {
            migrations.retain(|m| m.version.as_str() <= target);
        }
        Ok(migrations)
    }

    async fn applied(&self, conn: &dyn Connection, table: &str) -> SyncResult<BTreeSet<String>> {
        let tables = SchemaIntrospector::list_tables(conn).await?;
        if !tables.iter().any(|t| t == table) {
            return Ok(BTreeSet::new());
        }
        let sql = format!(
            "SELECT version FROM {} ORDER BY version",
            conn.dialect().quote_identifier(table)
        );
        Ok(conn.query_column(&sql).await?.into_iter().collect())
    }

    async fn ensure_table(&self, conn: &dyn Connection, table: &str) -> SyncResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             version BIGINT NOT NULL PRIMARY KEY, \
             migration_name VARCHAR(100) NULL, \
             start_time TIMESTAMP NULL, \
             end_time TIMESTAMP NULL, \
             breakpoint SMALLINT NOT NULL DEFAULT 0)",
            conn.dialect().quote_identifier(table)
        );
        conn.execute(&sql).await.map(|_| ())
    }
}

fn record_sql(conn: &dyn Connection, table: &str, migration: &MigrationSource, started: &str) -> String {
    let finished = Utc::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        "INSERT INTO {} (version, migration_name, start_time, end_time, breakpoint) \
         VALUES ({}, '{}', '{}', '{}', 0)",
        conn.dialect().quote_identifier(table),
        migration.version,
        migration.name.replace('\'', "''"),
        started,
        finished
    )
}

#[async_trait::async_trait]
impl MigrationRunner for DirectoryMigrationRunner {
    async fn status(&self, job: &MigrationJob) -> SyncResult<Vec<MigrationStatusEntry>> {
        let conn = self.registry.get(&job.connection).await?;
        let declared = self.declared(job).await?;
        let applied = self.applied(conn.as_ref(), &bookkeeping_table(job)).await?;

        let mut entries: Vec<MigrationStatusEntry> = declared
            .iter()
            .map(|m| {
                if applied.contains(&m.version) {
                    MigrationStatusEntry::up(&m.version)
                } else {
                    MigrationStatusEntry::down(&m.version)
                }
            })
            .collect();

        let known: BTreeSet<&str> = declared.iter().map(|m| m.version.as_str()).collect();
        entries.extend(
            applied
                .iter()
                .filter(|v| !known.contains(v.as_str()))
                .map(|version| MigrationStatusEntry::missing(version.as_str())),
        );
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    #[instrument(skip_all, fields(job = %job))]
    async fn migrate(&self, job: &MigrationJob) -> SyncResult<()> {
        let connection = job.connection.as_str();
        let conn = self
            .registry
            .get(connection)
            .await
            .map_err(|e| SyncError::migration(connection, e.to_string()))?;
        let table = bookkeeping_table(job);

        self.ensure_table(conn.as_ref(), &table)
            .await
            .map_err(|e| SyncError::migration(connection, e.to_string()))?;
        let applied = self
            .applied(conn.as_ref(), &table)
            .await
            .map_err(|e| SyncError::migration(connection, e.to_string()))?;

        for migration in self.declared(job).await? {
            if applied.contains(&migration.version) {
                continue;
            }

            let up_path = migration.up_path();
            let script = tokio::fs::read_to_string(&up_path)
                .await
                .map_err(|e| SyncError::io(&up_path, e))?;
            let started = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
            debug!(version = %migration.version, name = %migration.name, "Applying migration");

            let table = table.as_str();
            let migration_ref = &migration;
            transactional(conn.as_ref(), move |conn| {
                Box::pin(async move {
                    conn.execute_script(&script).await?;
                    conn.execute(&record_sql(conn, table, migration_ref, &started))
                        .await?;
                    Ok(())
                })
            })
            .await
            .map_err(|e| {
                SyncError::migration(connection, format!("{}: {}", migration.version, e))
            })?;

            info!(version = %migration.version, name = %migration.name, "Applied migration");
        }
        Ok(())
    }
}
