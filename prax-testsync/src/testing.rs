//! In-memory fakes used by the unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::connection::Connection;
use crate::dialect::{SchemaDialect, SqliteDialect};
use crate::error::{SyncError, SyncResult};
use crate::job::MigrationJob;
use crate::registry::{ConnectionConfig, Connector};
use crate::status::{MigrationRunner, MigrationState, MigrationStatusEntry};

/// Shared, ordered record of everything the fakes were asked to do.
pub(crate) type EventLog = Arc<Mutex<Vec<String>>>;

pub(crate) fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    tables: Vec<String>,
    rows: BTreeMap<String, usize>,
}

#[derive(Debug, Default)]
struct FakeState {
    data: Snapshot,
    saved: Option<Snapshot>,
    executed: Vec<String>,
    fail_on: Vec<String>,
}

/// Connection that interprets just enough SQL to track tables and rows.
pub(crate) struct FakeConnection {
    name: String,
    dialect: Box<dyn SchemaDialect>,
    state: Mutex<FakeState>,
    log: EventLog,
}

fn ident_after<'s>(sql: &'s str, prefix: &str) -> Option<&'s str> {
    let rest = sql.strip_prefix(prefix)?.trim_start();
    let rest = rest.strip_prefix("IF NOT EXISTS ").unwrap_or(rest);
    let token = rest.split(|c: char| c.is_whitespace() || c == '(').next()?;
    Some(token.trim_matches('"'))
}

impl FakeConnection {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dialect: Box::new(SqliteDialect),
            state: Mutex::new(FakeState::default()),
            log: event_log(),
        }
    }

    pub(crate) fn with_dialect(mut self, dialect: impl SchemaDialect + 'static) -> Self {
        self.dialect = Box::new(dialect);
        self
    }

    pub(crate) fn with_log(mut self, log: &EventLog) -> Self {
        self.log = Arc::clone(log);
        self
    }

    pub(crate) fn with_tables<I, S>(self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut state = self.state.lock();
            for table in tables {
                let table = table.into();
                state.data.rows.insert(table.clone(), 1);
                state.data.tables.push(table);
            }
        }
        self
    }

    pub(crate) fn fail_on(self, fragment: &str) -> Self {
        self.state.lock().fail_on.push(fragment.to_string());
        self
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.state.lock().executed.clone()
    }

    pub(crate) fn tables(&self) -> Vec<String> {
        self.state.lock().data.tables.clone()
    }

    pub(crate) fn rows(&self, table: &str) -> usize {
        self.state.lock().data.rows.get(table).copied().unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl Connection for FakeConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> &dyn SchemaDialect {
        self.dialect.as_ref()
    }

    async fn execute(&self, sql: &str) -> SyncResult<u64> {
        self.log.lock().push(format!("{}: {}", self.name, sql));
        let mut state = self.state.lock();
        state.executed.push(sql.to_string());

        if state.fail_on.iter().any(|f| sql.contains(f.as_str())) {
            return Err(SyncError::database(format!("forced failure on `{}`", sql)));
        }

        if sql == "BEGIN" {
            state.saved = Some(state.data.clone());
        } else if sql == "COMMIT" {
            state.saved = None;
        } else if sql == "ROLLBACK" {
            if let Some(saved) = state.saved.take() {
                state.data = saved;
            }
        } else if let Some(table) = ident_after(sql, "DROP TABLE") {
            state.data.tables.retain(|t| t != table);
            state.data.rows.remove(table);
        } else if let Some(table) = ident_after(sql, "CREATE TABLE") {
            if !state.data.tables.iter().any(|t| t == table) {
                state.data.tables.push(table.to_string());
                state.data.rows.insert(table.to_string(), 0);
            }
        } else if let Some(table) = ident_after(sql, "INSERT INTO") {
            *state.data.rows.entry(table.to_string()).or_default() += 1;
        } else if let Some(table) = ident_after(sql, "DELETE FROM") {
            state.data.rows.insert(table.to_string(), 0);
        }
        Ok(0)
    }

    async fn query_column(&self, sql: &str) -> SyncResult<Vec<String>> {
        let state = self.state.lock();
        if state.fail_on.iter().any(|f| sql.contains(f.as_str())) {
            return Err(SyncError::database(format!("forced failure on `{}`", sql)));
        }
        if sql == self.dialect.list_tables_sql() {
            return Ok(state.data.tables.clone());
        }
        Ok(Vec::new())
    }
}

/// Connector handing out pre-built fake connections.
#[derive(Default)]
pub(crate) struct FakeConnector {
    connections: HashMap<String, Arc<FakeConnection>>,
    opened: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub(crate) fn add(&mut self, conn: FakeConnection) -> Arc<FakeConnection> {
        let conn = Arc::new(conn);
        self.connections
            .insert(conn.name().to_string(), Arc::clone(&conn));
        conn
    }

    pub(crate) fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

#[async_trait::async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        name: &str,
        _config: &ConnectionConfig,
    ) -> SyncResult<Arc<dyn Connection>> {
        self.opened.lock().push(name.to_string());
        let conn: Arc<dyn Connection> = self
            .connections
            .get(name)
            .cloned()
            .ok_or_else(|| SyncError::UnknownConnection(name.to_string()))?;
        Ok(conn)
    }
}

#[derive(Default)]
struct RunnerState {
    statuses: HashMap<String, Vec<MigrationStatusEntry>>,
    status_errors: HashSet<String>,
    migrate_failures: HashSet<String>,
}

/// Runner with scripted statuses; a successful migrate marks every entry up.
pub(crate) struct FakeRunner {
    state: Mutex<RunnerState>,
    log: EventLog,
}

impl FakeRunner {
    pub(crate) fn new(log: &EventLog) -> Self {
        Self {
            state: Mutex::new(RunnerState::default()),
            log: Arc::clone(log),
        }
    }

    pub(crate) fn with_status(self, job: &MigrationJob, entries: Vec<MigrationStatusEntry>) -> Self {
        self.state.lock().statuses.insert(job.to_string(), entries);
        self
    }

    pub(crate) fn failing_status(self, connection: &str) -> Self {
        self.state
            .lock()
            .status_errors
            .insert(connection.to_string());
        self
    }

    pub(crate) fn failing_migrate(self, connection: &str) -> Self {
        self.state
            .lock()
            .migrate_failures
            .insert(connection.to_string());
        self
    }
}

#[async_trait::async_trait]
impl MigrationRunner for FakeRunner {
    async fn status(&self, job: &MigrationJob) -> SyncResult<Vec<MigrationStatusEntry>> {
        self.log.lock().push(format!("status {}", job));
        let state = self.state.lock();
        if state.status_errors.contains(&job.connection) {
            return Err(SyncError::database("status table unreadable"));
        }
        Ok(state
            .statuses
            .get(&job.to_string())
            .cloned()
            .unwrap_or_default())
    }

    async fn migrate(&self, job: &MigrationJob) -> SyncResult<()> {
        self.log.lock().push(format!("migrate {}", job));
        let mut state = self.state.lock();
        if state.migrate_failures.contains(&job.connection) {
            return Err(SyncError::migration(&job.connection, "syntax error in up.sql"));
        }
        if let Some(entries) = state.statuses.get_mut(&job.to_string()) {
            entries.retain(|e| !e.missing);
            for entry in entries.iter_mut() {
                entry.status = MigrationState::Up;
            }
        }
        Ok(())
    }
}
