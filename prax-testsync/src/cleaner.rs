//! Dropping and truncating every table of a connection.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::connection::{Connection, execute_guarded};
use crate::error::{SyncError, SyncResult};
use crate::introspect::{SchemaIntrospector, exclude_bookkeeping_tables};
use crate::output::{NullOutput, Output};
use crate::registry::ConnectionRegistry;

/// Build the statements dropping `tables`.
pub fn drop_statements(conn: &dyn Connection, tables: &[String]) -> Vec<String> {
    let dialect = conn.dialect();
    tables
        .iter()
        .flat_map(|table| dialect.drop_table_sql(table))
        .collect()
}

/// Build the statements emptying `tables`.
pub fn truncate_statements(conn: &dyn Connection, tables: &[String]) -> Vec<String> {
    let dialect = conn.dialect();
    tables
        .iter()
        .flat_map(|table| dialect.truncate_table_sql(table))
        .collect()
}

/// Empties or removes the schema of a connection.
///
/// Each batch runs in one transaction with foreign-key checks suspended, so
/// tables can go in any order and a failure leaves the schema untouched.
#[derive(Clone)]
pub struct SchemaCleaner {
    output: Arc<dyn Output>,
}

impl Default for SchemaCleaner {
    fn default() -> Self {
        Self::new(Arc::new(NullOutput))
    }
}

impl SchemaCleaner {
    /// Create a cleaner reporting to `output`.
    pub fn new(output: Arc<dyn Output>) -> Self {
        Self { output }
    }

    /// Drop every table of the named connection, bookkeeping tables included.
    pub async fn drop(&self, registry: &dyn ConnectionRegistry, name: &str) -> SyncResult<()> {
        let conn = registry.get(name).await?;
        self.drop_connection(conn.as_ref()).await
    }

    /// Empty every data table of the named connection. Bookkeeping tables are kept.
    pub async fn truncate(&self, registry: &dyn ConnectionRegistry, name: &str) -> SyncResult<()> {
        let conn = registry.get(name).await?;
        self.truncate_connection(conn.as_ref()).await
    }

    /// Drop every table of an open connection.
    #[instrument(skip_all, fields(connection = conn.name()))]
    pub async fn drop_connection(&self, conn: &dyn Connection) -> SyncResult<()> {
        let name = conn.name().to_string();
        self.output
            .info(&format!("Dropping all tables for connection {}.", name));

        let tables = SchemaIntrospector::list_tables(conn)
            .await
            .map_err(|e| SyncError::cleanup(&name, e.to_string()))?;
        let statements = drop_statements(conn, &tables);
        debug!(tables = tables.len(), "Dropping tables");

        execute_guarded(conn, &statements)
            .await
            .map_err(|e| SyncError::cleanup(&name, e.to_string()))?;

        self.output
            .success(&format!("Dropped all tables for connection {}.", name));
        Ok(())
    }

    /// Empty every data table of an open connection.
    #[instrument(skip_all, fields(connection = conn.name()))]
    pub async fn truncate_connection(&self, conn: &dyn Connection) -> SyncResult<()> {
        let name = conn.name().to_string();
        self.output
            .info(&format!("Truncating all tables for connection {}.", name));

        let tables = SchemaIntrospector::list_tables(conn)
            .await
            .map_err(|e| SyncError::cleanup(&name, e.to_string()))?;
        let tables = exclude_bookkeeping_tables(tables);
        let statements = truncate_statements(conn, &tables);
        debug!(tables = tables.len(), "Truncating tables");

        execute_guarded(conn, &statements)
            .await
            .map_err(|e| SyncError::cleanup(&name, e.to_string()))?;

        self.output
            .success(&format!("Truncated all tables for connection {}.", name));
        Ok(())
    }
}
