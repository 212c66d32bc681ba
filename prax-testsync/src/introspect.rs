//! Listing the real tables of a connection.

use tracing::trace;

use crate::connection::Connection;
use crate::error::SyncResult;

/// Suffix of every migration bookkeeping table, plugin-prefixed or not.
pub const BOOKKEEPING_SUFFIX: &str = "phinxlog";

/// Whether `table` records applied migrations.
pub fn is_bookkeeping_table(table: &str) -> bool {
    table.ends_with(BOOKKEEPING_SUFFIX)
}

/// Remove bookkeeping tables, keeping the order of the rest.
pub fn exclude_bookkeeping_tables<I, S>(tables: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tables
        .into_iter()
        .map(Into::into)
        .filter(|table| !is_bookkeeping_table(table))
        .collect()
}

/// Reads table names through the connection's dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Every real table, bookkeeping tables included. Views are never listed.
    pub async fn list_tables(conn: &dyn Connection) -> SyncResult<Vec<String>> {
        let tables = conn.query_column(&conn.dialect().list_tables_sql()).await?;
        trace!(connection = conn.name(), tables = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// Every real table that holds application data.
    pub async fn list_data_tables(conn: &dyn Connection) -> SyncResult<Vec<String>> {
        Ok(exclude_bookkeeping_tables(Self::list_tables(conn).await?))
    }
}
