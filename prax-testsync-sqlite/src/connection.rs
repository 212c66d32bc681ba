//! SQLite connection handle and connector.

use std::sync::Arc;
use std::time::Duration;

use prax_testsync::{
    Connection, ConnectionConfig, Connector, Driver, SchemaDialect, SqliteDialect, SyncError,
    SyncResult,
};
use rusqlite::types::ValueRef;
use tracing::{debug, trace};

use crate::config::{DatabasePath, SqliteConfig};
use crate::error::{SqliteError, SqliteResult};

fn value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

/// One SQLite session.
///
/// All statements go through the same handle, so pragmas and open
/// transactions carry over from one call to the next.
pub struct SqliteConnection {
    name: String,
    conn: tokio_rusqlite::Connection,
    dialect: SqliteDialect,
}

impl SqliteConnection {
    /// Open the database described by `config`.
    pub async fn open(name: impl Into<String>, config: &SqliteConfig) -> SqliteResult<Self> {
        let name = name.into();
        let conn = match &config.path {
            DatabasePath::Memory => tokio_rusqlite::Connection::open_in_memory().await?,
            DatabasePath::File(path) => tokio_rusqlite::Connection::open(path).await?,
        };

        let init_sql = config.init_sql();
        let busy_timeout = config.busy_timeout_ms.map(|ms| Duration::from_millis(ms.into()));
        conn.call(move |conn| {
            if let Some(timeout) = busy_timeout {
                conn.busy_timeout(timeout)?;
            }
            conn.execute_batch(&init_sql)?;
            Ok(())
        })
        .await?;

        debug!(name = %name, path = ?config.path, "Opened SQLite connection");
        Ok(Self {
            name,
            conn,
            dialect: SqliteDialect,
        })
    }

    /// Open an in-memory database.
    pub async fn memory(name: impl Into<String>) -> SqliteResult<Self> {
        Self::open(name, &SqliteConfig::memory()).await
    }
}

#[async_trait::async_trait]
impl Connection for SqliteConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> &dyn SchemaDialect {
        &self.dialect
    }

    async fn execute(&self, sql: &str) -> SyncResult<u64> {
        let sql = sql.to_string();
        trace!(connection = %self.name, sql = %sql, "Executing statement");

        let affected = self
            .conn
            .call(move |conn| Ok(conn.execute(&sql, [])?))
            .await
            .map_err(SqliteError::from)?;
        Ok(affected as u64)
    }

    async fn execute_script(&self, sql: &str) -> SyncResult<()> {
        let sql = sql.to_string();
        debug!(connection = %self.name, bytes = sql.len(), "Executing script");

        self.conn
            .call(move |conn| Ok(conn.execute_batch(&sql)?))
            .await
            .map_err(SqliteError::from)?;
        Ok(())
    }

    async fn query_column(&self, sql: &str) -> SyncResult<Vec<String>> {
        let sql = sql.to_string();
        trace!(connection = %self.name, sql = %sql, "Executing query");

        let values = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], |row| Ok(value_to_text(row.get_ref(0)?)))?;
                let values: Result<Vec<_>, _> = rows.collect();
                Ok(values?)
            })
            .await
            .map_err(SqliteError::from)?;
        Ok(values)
    }
}

/// Opens [`SqliteConnection`]s for `sqlite` connection configs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

#[async_trait::async_trait]
impl Connector for SqliteConnector {
    async fn connect(&self, name: &str, config: &ConnectionConfig) -> SyncResult<Arc<dyn Connection>> {
        if config.driver != Driver::Sqlite {
            return Err(SyncError::config(format!(
                "connection '{}' uses driver '{}', only sqlite is supported",
                name, config.driver
            )));
        }
        let sqlite_config = SqliteConfig::from_url(&config.url)?;
        let conn: Arc<dyn Connection> = Arc::new(SqliteConnection::open(name, &sqlite_config).await?);
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use prax_testsync::{SchemaCleaner, SchemaIntrospector};

    async fn seeded() -> SqliteConnection {
        let conn = SqliteConnection::memory("test").await.unwrap();
        conn.execute_script(
            "CREATE TABLE authors (id INTEGER PRIMARY KEY);
             CREATE TABLE articles (id INTEGER PRIMARY KEY, author_id INTEGER REFERENCES authors(id));
             CREATE TABLE phinxlog (version BIGINT PRIMARY KEY);
             CREATE VIEW article_view AS SELECT * FROM articles;
             INSERT INTO authors VALUES (1);
             INSERT INTO articles VALUES (1, 1);
             INSERT INTO phinxlog VALUES (20200208100000);",
        )
        .await
        .unwrap();
        conn
    }

    async fn count(conn: &SqliteConnection, table: &str) -> String {
        conn.query_column(&format!("SELECT COUNT(*) FROM {}", table))
            .await
            .unwrap()
            .remove(0)
    }

    #[tokio::test]
    async fn test_list_tables_excludes_views() {
        let conn = seeded().await;
        let tables = SchemaIntrospector::list_tables(&conn).await.unwrap();
        assert_eq!(tables, vec!["articles", "authors", "phinxlog"]);
    }

    #[tokio::test]
    async fn test_query_column_as_text() {
        let conn = seeded().await;
        let versions = conn.query_column("SELECT version FROM phinxlog").await.unwrap();
        assert_eq!(versions, vec!["20200208100000"]);
    }

    #[tokio::test]
    async fn test_drop_restores_foreign_keys() {
        let conn = seeded().await;
        SchemaCleaner::default().drop_connection(&conn).await.unwrap();
        assert!(SchemaIntrospector::list_tables(&conn).await.unwrap().is_empty());

        let fk = conn.query_column("PRAGMA foreign_keys").await.unwrap();
        assert_eq!(fk, vec!["1"]);
    }

    #[tokio::test]
    async fn test_truncate_keeps_history() {
        let conn = seeded().await;
        SchemaCleaner::default().truncate_connection(&conn).await.unwrap();

        assert_eq!(count(&conn, "articles").await, "0");
        assert_eq!(count(&conn, "authors").await, "0");
        assert_eq!(count(&conn, "phinxlog").await, "1");
    }

    #[tokio::test]
    async fn test_failed_statement_is_database_error() {
        let conn = SqliteConnection::memory("test").await.unwrap();
        let err = conn.execute("DROP TABLE missing").await.unwrap_err();
        assert!(matches!(err, SyncError::Database(_)));
    }

    #[tokio::test]
    async fn test_connector_rejects_other_drivers() {
        let config = ConnectionConfig::new(Driver::Mysql, "mysql://localhost/test");
        let err = SqliteConnector.connect("test", &config).await.err().unwrap();
        assert!(matches!(err, SyncError::Config(_)));

        let config = ConnectionConfig::new(Driver::Sqlite, "sqlite::memory:");
        let conn = SqliteConnector.connect("test", &config).await.unwrap();
        assert_eq!(conn.name(), "test");
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let config = SqliteConfig::file(&path);

        let conn = SqliteConnection::open("test", &config).await.unwrap();
        conn.execute("CREATE TABLE users (id INTEGER)").await.unwrap();
        drop(conn);

        let reopened = SqliteConnection::open("test", &config).await.unwrap();
        assert_eq!(
            SchemaIntrospector::list_tables(&reopened).await.unwrap(),
            vec!["users"]
        );
    }
}
