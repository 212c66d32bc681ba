//! Connection registry: configured connections, aliases, and open handles.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::connection::Connection;
use crate::dialect::Driver;
use crate::error::{SyncError, SyncResult};
use crate::job::MigrationsSetting;

/// Raw settings of one configured connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database family.
    #[serde(default)]
    pub driver: Driver,
    /// Connection URL or path.
    pub url: String,
    /// Declared migrations.
    #[serde(default, skip_serializing_if = "is_absent")]
    pub migrations: MigrationsSetting,
}

fn is_absent(setting: &MigrationsSetting) -> bool {
    matches!(setting, MigrationsSetting::Absent)
}

impl ConnectionConfig {
    /// Create a config for a driver and URL.
    pub fn new(driver: Driver, url: impl Into<String>) -> Self {
        Self {
            driver,
            url: url.into(),
            migrations: MigrationsSetting::Absent,
        }
    }

    /// Set the declared migrations.
    pub fn migrations(mut self, migrations: MigrationsSetting) -> Self {
        self.migrations = migrations;
        self
    }
}

/// The set of configured connections, consulted by the synchronizer.
#[async_trait::async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Configured connection names, in declaration order. Aliases are not included.
    fn configured(&self) -> Vec<String>;

    /// Raw settings of a configured connection.
    fn config(&self, name: &str) -> Option<ConnectionConfig>;

    /// Open (or reuse) the connection registered under `name` or an alias of it.
    async fn get(&self, name: &str) -> SyncResult<Arc<dyn Connection>>;

    /// Make `alias` resolve to the connection `source`.
    fn alias(&self, source: &str, alias: &str);

    /// The `migrations` setting of every configured connection.
    fn declared_migrations(&self) -> IndexMap<String, MigrationsSetting> {
        self.configured()
            .into_iter()
            .filter_map(|name| {
                let setting = self.config(&name)?.migrations;
                Some((name, setting))
            })
            .collect()
    }
}

/// Opens connections from their settings.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Open the connection `name`.
    async fn connect(&self, name: &str, config: &ConnectionConfig)
    -> SyncResult<Arc<dyn Connection>>;
}

/// Default registry: a fixed set of configs, lazily opened through a [`Connector`].
pub struct ConnectionManager {
    configs: IndexMap<String, ConnectionConfig>,
    connector: Arc<dyn Connector>,
    aliases: RwLock<HashMap<String, String>>,
    open: tokio::sync::Mutex<HashMap<String, Arc<dyn Connection>>>,
}

impl ConnectionManager {
    /// Create a manager over the given configs.
    pub fn new(configs: IndexMap<String, ConnectionConfig>, connector: Arc<dyn Connector>) -> Self {
        Self {
            configs,
            connector,
            aliases: RwLock::new(HashMap::new()),
            open: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// The connection name `name` resolves to.
    pub fn resolve(&self, name: &str) -> String {
        self.aliases
            .read()
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Current alias table (alias -> source).
    pub fn aliases(&self) -> HashMap<String, String> {
        self.aliases.read().clone()
    }
}

#[async_trait::async_trait]
impl ConnectionRegistry for ConnectionManager {
    fn configured(&self) -> Vec<String> {
        self.configs.keys().cloned().collect()
    }

    fn config(&self, name: &str) -> Option<ConnectionConfig> {
        self.configs.get(name).cloned()
    }

    async fn get(&self, name: &str) -> SyncResult<Arc<dyn Connection>> {
        let resolved = self.resolve(name);
        let config = self
            .configs
            .get(&resolved)
            .ok_or_else(|| SyncError::UnknownConnection(resolved.clone()))?;

        let mut open = self.open.lock().await;
        if let Some(conn) = open.get(&resolved) {
            trace!(name, resolved = %resolved, "Reusing open connection");
            return Ok(Arc::clone(conn));
        }

        debug!(name = %resolved, driver = %config.driver, "Opening connection");
        let conn = self.connector.connect(&resolved, config).await?;
        open.insert(resolved, Arc::clone(&conn));
        Ok(conn)
    }

    fn alias(&self, source: &str, alias: &str) {
        debug!(source, alias, "Aliasing connection");
        self.aliases
            .write()
            .insert(alias.to_string(), source.to_string());
    }
}
