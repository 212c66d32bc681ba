//! Connection handles and scoped execution helpers.

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::dialect::SchemaDialect;
use crate::error::SyncResult;

/// An open database connection the synchronizer can drive.
///
/// Transaction and constraint state must persist between calls, so an
/// implementation wraps exactly one underlying session.
#[async_trait::async_trait]
pub trait Connection: Send + Sync {
    /// Configured name of the connection.
    fn name(&self) -> &str;

    /// SQL dialect spoken by the connection.
    fn dialect(&self) -> &dyn SchemaDialect;

    /// Execute a single statement and return the number of affected rows.
    async fn execute(&self, sql: &str) -> SyncResult<u64>;

    /// Execute a script that may contain several statements.
    async fn execute_script(&self, sql: &str) -> SyncResult<()> {
        self.execute(sql).await.map(|_| ())
    }

    /// Run a query and return the first column of every row as text.
    async fn query_column(&self, sql: &str) -> SyncResult<Vec<String>>;

    /// Suspend foreign-key checks.
    async fn disable_constraints(&self) -> SyncResult<()> {
        for sql in self.dialect().disable_constraints_sql() {
            self.execute(&sql).await?;
        }
        Ok(())
    }

    /// Restore foreign-key checks.
    async fn enable_constraints(&self) -> SyncResult<()> {
        for sql in self.dialect().enable_constraints_sql() {
            self.execute(&sql).await?;
        }
        Ok(())
    }

    /// Open a transaction.
    async fn begin(&self) -> SyncResult<()> {
        self.execute(self.dialect().begin_sql()).await.map(|_| ())
    }

    /// Commit the open transaction.
    async fn commit(&self) -> SyncResult<()> {
        self.execute(self.dialect().commit_sql()).await.map(|_| ())
    }

    /// Roll the open transaction back.
    async fn rollback(&self) -> SyncResult<()> {
        self.execute(self.dialect().rollback_sql()).await.map(|_| ())
    }
}

/// Run `f` inside a transaction.
///
/// Commits when `f` succeeds, rolls back when it fails. The error of `f`
/// wins over a rollback error.
pub async fn transactional<'a, T, F>(conn: &'a dyn Connection, f: F) -> SyncResult<T>
where
    F: FnOnce(&'a dyn Connection) -> BoxFuture<'a, SyncResult<T>> + Send + 'a,
    T: Send + 'a,
{
    conn.begin().await?;
    match f(conn).await {
        Ok(value) => {
            conn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            debug!(connection = conn.name(), error = %err, "Rolling back transaction");
            if let Err(rollback_err) = conn.rollback().await {
                warn!(connection = conn.name(), error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

/// Run `f` with foreign-key checks suspended.
///
/// Checks are restored afterwards whether `f` succeeded or not.
pub async fn with_constraints_disabled<'a, T, F>(conn: &'a dyn Connection, f: F) -> SyncResult<T>
where
    F: FnOnce(&'a dyn Connection) -> BoxFuture<'a, SyncResult<T>> + Send + 'a,
    T: Send + 'a,
{
    conn.disable_constraints().await?;
    let result = f(conn).await;
    let restored = conn.enable_constraints().await;

    match (result, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), restored) => {
            if let Err(restore_err) = restored {
                warn!(connection = conn.name(), error = %restore_err, "Could not restore constraints");
            }
            Err(err)
        }
    }
}

/// Execute `statements` in order, in one transaction, with constraints suspended.
///
/// Dialects whose suspension is transaction-scoped suspend after `BEGIN`;
/// the rest suspend before it and restore after the transaction ends.
pub async fn execute_guarded(conn: &dyn Connection, statements: &[String]) -> SyncResult<()> {
    if conn.dialect().constraints_scoped_to_transaction() {
        return transactional(conn, move |conn| {
            Box::pin(async move {
                conn.disable_constraints().await?;
                run_statements(conn, statements).await
            })
        })
        .await;
    }

    with_constraints_disabled(conn, move |conn| {
        Box::pin(transactional(conn, move |conn| {
            Box::pin(run_statements(conn, statements))
        }))
    })
    .await
}

async fn run_statements(conn: &dyn Connection, statements: &[String]) -> SyncResult<()> {
    for sql in statements {
        debug!(connection = conn.name(), sql = %sql, "Executing statement");
        conn.execute(sql).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::PostgresDialect;
    use crate::error::SyncError;
    use crate::testing::FakeConnection;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_guarded_batch_order() {
        let conn = FakeConnection::new("test").with_tables(["a", "b"]);
        execute_guarded(&conn, &["DELETE FROM \"a\"".to_string()])
            .await
            .unwrap();

        assert_eq!(
            conn.executed(),
            vec![
                "PRAGMA foreign_keys = OFF",
                "BEGIN",
                "DELETE FROM \"a\"",
                "COMMIT",
                "PRAGMA foreign_keys = ON",
            ]
        );
    }

    #[tokio::test]
    async fn test_guarded_batch_defers_inside_transaction() {
        let conn = FakeConnection::new("test")
            .with_dialect(PostgresDialect::default())
            .with_tables(["a", "b"]);
        execute_guarded(&conn, &["DROP TABLE \"a\"".to_string()])
            .await
            .unwrap();

        assert_eq!(
            conn.executed(),
            vec![
                "BEGIN",
                "SET CONSTRAINTS ALL DEFERRED",
                "DROP TABLE \"a\"",
                "COMMIT",
            ]
        );
        assert_eq!(conn.tables(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_and_restores_constraints() {
        let conn = FakeConnection::new("test")
            .with_tables(["a", "b"])
            .fail_on("DROP TABLE \"b\"");
        let stmts = vec![
            "DROP TABLE \"a\"".to_string(),
            "DROP TABLE \"b\"".to_string(),
        ];

        let err = execute_guarded(&conn, &stmts).await.unwrap_err();
        assert!(matches!(err, SyncError::Database(_)));

        let executed = conn.executed();
        assert_eq!(executed.last().map(String::as_str), Some("PRAGMA foreign_keys = ON"));
        assert!(executed.contains(&"ROLLBACK".to_string()));
        assert!(!executed.contains(&"COMMIT".to_string()));
        // Rolled back to the state before the batch.
        assert_eq!(conn.tables(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_transactional_returns_value() {
        let conn = FakeConnection::new("test");
        let value = transactional(&conn, |_| Box::pin(async { Ok(7) }))
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(conn.executed(), vec!["BEGIN", "COMMIT"]);
    }
}
