//! Aliasing production connection names to their test counterparts.
//!
//! Application code that asks for `default` or `billing` during a test run
//! should transparently get `test` or `test_billing`. The aliases are set up
//! once per process; later calls are no-ops.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::registry::ConnectionRegistry;

/// Prefix that marks a test connection.
pub const TEST_PREFIX: &str = "test_";

/// Name of the main test connection.
pub const TEST_CONNECTION: &str = "test";

/// Name of the main application connection.
pub const APP_CONNECTION: &str = "default";

/// A single alias: `alias` resolves to `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasPair {
    /// The test connection that is actually used.
    pub source: String,
    /// The name that now resolves to `source`.
    pub alias: String,
}

/// Every alias established for the process, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    pairs: Vec<AliasPair>,
}

impl AliasMap {
    /// Derive the aliases for a list of configured connection names.
    ///
    /// `default` always resolves to `test`. A `test_`-prefixed name becomes the
    /// source for its unprefixed base; any other name becomes the alias of its
    /// `test_`-prefixed form.
    pub fn build<S: AsRef<str>>(configured: &[S]) -> Self {
        let mut map = Self::default();
        map.insert(TEST_CONNECTION, APP_CONNECTION);

        for name in configured.iter().map(AsRef::as_ref) {
            if name == TEST_CONNECTION || name == APP_CONNECTION {
                continue;
            }
            let (source, alias) = match name.strip_prefix(TEST_PREFIX) {
                Some(base) => (name.to_string(), base.to_string()),
                None => (format!("{}{}", TEST_PREFIX, name), name.to_string()),
            };
            if alias.is_empty() || map.resolve_source(&source).is_some() {
                continue;
            }
            map.insert(&source, &alias);
        }
        map
    }

    fn insert(&mut self, source: &str, alias: &str) {
        self.pairs.push(AliasPair {
            source: source.to_string(),
            alias: alias.to_string(),
        });
    }

    fn resolve_source(&self, source: &str) -> Option<&AliasPair> {
        self.pairs.iter().find(|p| p.source == source)
    }

    /// The connection an alias resolves to.
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.alias == alias)
            .map(|p| p.source.as_str())
    }

    /// The alias created for a test connection.
    pub fn alias_of(&self, source: &str) -> Option<&str> {
        self.resolve_source(source).map(|p| p.alias.as_str())
    }

    /// Iterate over the aliases.
    pub fn iter(&self) -> std::slice::Iter<'_, AliasPair> {
        self.pairs.iter()
    }

    /// Number of aliases.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no alias exists.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// One-time alias setup.
///
/// The map is computed and pushed into the registry on the first call only.
#[derive(Debug, Default)]
pub struct ConnectionAliaser {
    map: OnceLock<AliasMap>,
}

impl ConnectionAliaser {
    /// Create an aliaser that has not run yet.
    pub const fn new() -> Self {
        Self {
            map: OnceLock::new(),
        }
    }

    /// The aliaser shared by the whole process.
    pub fn shared() -> Arc<ConnectionAliaser> {
        static SHARED: OnceLock<Arc<ConnectionAliaser>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(ConnectionAliaser::new())))
    }

    /// Alias the registry's connections, once.
    pub fn alias_connections(&self, registry: &dyn ConnectionRegistry) -> &AliasMap {
        if let Some(map) = self.map.get() {
            debug!("Connections already aliased");
            return map;
        }
        self.map.get_or_init(|| {
            let map = AliasMap::build(&registry.configured());
            for pair in map.iter() {
                registry.alias(&pair.source, &pair.alias);
            }
            info!(aliases = map.len(), "Aliased test connections");
            map
        })
    }

    /// Whether the aliases have been set up.
    pub fn is_loaded(&self) -> bool {
        self.map.get().is_some()
    }

    /// The aliases, once set up.
    pub fn aliases(&self) -> Option<&AliasMap> {
        self.map.get()
    }
}
