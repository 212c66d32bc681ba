//! Loading a test schema from SQL dump files instead of migrations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::alias::ConnectionAliaser;
use crate::cleaner::SchemaCleaner;
use crate::error::{SyncError, SyncResult};
use crate::output::{NullOutput, Output};
use crate::registry::ConnectionRegistry;

/// Rebuilds a connection from one or more schema files.
///
/// Connections are aliased before the target is looked up, so `default`
/// lands in `test`.
#[derive(Clone)]
pub struct SchemaDump {
    cleaner: SchemaCleaner,
    aliaser: Arc<ConnectionAliaser>,
    output: Arc<dyn Output>,
}

impl Default for SchemaDump {
    fn default() -> Self {
        Self::new(Arc::new(NullOutput))
    }
}

impl SchemaDump {
    /// Create a dump importer reporting to `output`.
    pub fn new(output: Arc<dyn Output>) -> Self {
        Self {
            cleaner: SchemaCleaner::new(Arc::clone(&output)),
            aliaser: ConnectionAliaser::shared(),
            output,
        }
    }

    /// Use a specific aliaser instead of the process-wide one.
    pub fn with_aliaser(mut self, aliaser: Arc<ConnectionAliaser>) -> Self {
        self.aliaser = aliaser;
        self
    }

    /// Drop the schema of `connection`, run every file in order, then empty the tables.
    ///
    /// Files are read one at a time; an unreadable file stops the import after
    /// the files before it have run.
    #[instrument(skip(self, registry, files), fields(files = files.len()))]
    pub async fn import<P: AsRef<Path>>(
        &self,
        registry: &dyn ConnectionRegistry,
        connection: &str,
        files: &[P],
    ) -> SyncResult<()> {
        self.aliaser.alias_connections(registry);
        let conn = registry.get(connection).await?;
        self.cleaner.drop_connection(conn.as_ref()).await?;

        for file in files {
            let path = file.as_ref();
            let sql = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| SyncError::io(PathBuf::from(path), e))?;

            self.output.info(&format!(
                "Dumping schema in file {} for connection {}.",
                path.display(),
                connection
            ));
            debug!(file = %path.display(), bytes = sql.len(), "Executing schema file");
            conn.execute_script(&sql).await?;
            self.output.success(&format!(
                "Dump of schema in file {} for connection {} successful.",
                path.display(),
                connection
            ));
        }

        self.cleaner.truncate_connection(conn.as_ref()).await
    }
}
