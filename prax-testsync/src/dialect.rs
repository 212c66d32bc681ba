//! SQL dialects for listing, dropping, and truncating tables.
//!
//! Each supported database family gets one variant. The cleaner and the
//! introspector only ever talk to [`SchemaDialect`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Dialect-specific SQL used to clean a test schema.
pub trait SchemaDialect: Send + Sync + fmt::Debug {
    /// Short dialect name.
    fn name(&self) -> &'static str;

    /// Query whose first column lists every real table. Views must not appear.
    fn list_tables_sql(&self) -> String;

    /// Quote an identifier.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Statements dropping a table.
    fn drop_table_sql(&self, table: &str) -> Vec<String> {
        vec![format!("DROP TABLE {}", self.quote_identifier(table))]
    }

    /// Statements removing every row of a table.
    fn truncate_table_sql(&self, table: &str) -> Vec<String>;

    /// Statements suspending foreign-key checks.
    fn disable_constraints_sql(&self) -> Vec<String>;

    /// Statements restoring foreign-key checks.
    fn enable_constraints_sql(&self) -> Vec<String>;

    /// Whether suspending checks only lasts for the current transaction.
    ///
    /// Such dialects issue the suspend statements right after the
    /// transaction opens and never restore them explicitly.
    fn constraints_scoped_to_transaction(&self) -> bool {
        false
    }

    /// Statement opening a transaction.
    fn begin_sql(&self) -> &'static str {
        "BEGIN"
    }

    /// Statement committing a transaction.
    fn commit_sql(&self) -> &'static str {
        "COMMIT"
    }

    /// Statement rolling a transaction back.
    fn rollback_sql(&self) -> &'static str {
        "ROLLBACK"
    }
}

/// Quote with `quote`, doubling any embedded quote character.
fn quote_with(ident: &str, quote: char) -> String {
    let escaped = ident.replace(quote, &format!("{quote}{quote}"));
    format!("{quote}{escaped}{quote}")
}

/// MySQL / MariaDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl SchemaDialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn list_tables_sql(&self) -> String {
        "SHOW FULL TABLES WHERE Table_Type != 'VIEW'".to_string()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '`')
    }

    fn truncate_table_sql(&self, table: &str) -> Vec<String> {
        vec![format!("TRUNCATE TABLE {}", self.quote_identifier(table))]
    }

    fn disable_constraints_sql(&self) -> Vec<String> {
        vec!["SET FOREIGN_KEY_CHECKS = 0".to_string()]
    }

    fn enable_constraints_sql(&self) -> Vec<String> {
        vec!["SET FOREIGN_KEY_CHECKS = 1".to_string()]
    }

    fn begin_sql(&self) -> &'static str {
        "START TRANSACTION"
    }
}

/// PostgreSQL, restricted to one schema.
#[derive(Debug, Clone)]
pub struct PostgresDialect {
    schema: String,
}

impl PostgresDialect {
    /// Dialect for a given schema.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }

    /// The schema being listed.
    pub fn schema(&self) -> &str {
        &self.schema
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new("public")
    }
}

impl SchemaDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn list_tables_sql(&self) -> String {
        // pg_tables never contains views.
        format!(
            "SELECT tablename FROM pg_tables WHERE schemaname = '{}' ORDER BY tablename",
            self.schema.replace('\'', "''")
        )
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '"')
    }

    fn drop_table_sql(&self, table: &str) -> Vec<String> {
        vec![format!(
            "DROP TABLE IF EXISTS {} CASCADE",
            self.quote_identifier(table)
        )]
    }

    fn truncate_table_sql(&self, table: &str) -> Vec<String> {
        vec![format!(
            "TRUNCATE {} RESTART IDENTITY CASCADE",
            self.quote_identifier(table)
        )]
    }

    fn disable_constraints_sql(&self) -> Vec<String> {
        vec!["SET CONSTRAINTS ALL DEFERRED".to_string()]
    }

    fn enable_constraints_sql(&self) -> Vec<String> {
        vec!["SET CONSTRAINTS ALL IMMEDIATE".to_string()]
    }

    fn constraints_scoped_to_transaction(&self) -> bool {
        true
    }
}

/// SQLite.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SchemaDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn list_tables_sql(&self) -> String {
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            .to_string()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '"')
    }

    fn truncate_table_sql(&self, table: &str) -> Vec<String> {
        vec![format!("DELETE FROM {}", self.quote_identifier(table))]
    }

    // Must run outside a transaction; SQLite ignores the pragma inside one.
    fn disable_constraints_sql(&self) -> Vec<String> {
        vec!["PRAGMA foreign_keys = OFF".to_string()]
    }

    fn enable_constraints_sql(&self) -> Vec<String> {
        vec!["PRAGMA foreign_keys = ON".to_string()]
    }
}

/// Supported database families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// SQLite.
    #[default]
    Sqlite,
    /// MySQL / MariaDB.
    Mysql,
    /// PostgreSQL.
    #[serde(alias = "postgresql")]
    Postgres,
}

impl Driver {
    /// The dialect for this driver.
    pub fn dialect(&self) -> Arc<dyn SchemaDialect> {
        match self {
            Self::Sqlite => Arc::new(SqliteDialect),
            Self::Mysql => Arc::new(MysqlDialect),
            Self::Postgres => Arc::new(PostgresDialect::default()),
        }
    }

    /// Driver name as written in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Driver {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(SyncError::config(format!("unsupported driver '{}'", other))),
        }
    }
}
