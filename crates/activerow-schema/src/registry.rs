//! Process-wide table metadata cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use activerow_core::{Error, Result};

use crate::descriptor::TableSchema;
use crate::introspect::SchemaIntrospector;

/// Per-process cache of [`TableSchema`] descriptors.
///
/// The cache is append-only and read-mostly: `describe` introspects a table
/// at most once and serves `Arc` clones afterwards. `refresh` is the only
/// mutation besides first load and must be externally serialized by callers
/// that share a registry across threads.
pub struct SchemaRegistry {
    introspector: Box<dyn SchemaIntrospector>,
    cache: RwLock<HashMap<String, Arc<TableSchema>>>,
}

impl SchemaRegistry {
    /// Create a registry backed by the given introspector.
    pub fn new(introspector: Box<dyn SchemaIntrospector>) -> Self {
        Self {
            introspector,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The descriptor for a table.
    ///
    /// The first call per table performs one introspection round trip;
    /// subsequent calls are pure cache reads. Fails with `Error::Schema`
    /// when the table cannot be introspected or reports no columns.
    #[allow(clippy::result_large_err)]
    pub fn describe(&self, table: &str) -> Result<Arc<TableSchema>> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(schema) = cache.get(table) {
                return Ok(Arc::clone(schema));
            }
        }

        let schema = self.load(table)?;
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        // A racing describe may have loaded the same table; first write wins
        // so callers holding earlier Arcs stay consistent.
        let entry = cache
            .entry(table.to_string())
            .or_insert_with(|| Arc::clone(&schema));
        Ok(Arc::clone(entry))
    }

    /// Drop the cached descriptor and re-introspect.
    ///
    /// Used after schema changes. Records hydrated against the old
    /// descriptor keep their `Arc` and are unaffected.
    #[allow(clippy::result_large_err)]
    pub fn refresh(&self, table: &str) -> Result<Arc<TableSchema>> {
        let schema = self.load(table)?;
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(table.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Whether a table is already cached.
    pub fn is_cached(&self, table: &str) -> bool {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        cache.contains_key(table)
    }

    #[allow(clippy::result_large_err)]
    fn load(&self, table: &str) -> Result<Arc<TableSchema>> {
        tracing::debug!(table = table, "Introspecting table schema");
        let schema = self.introspector.introspect(table)?;
        if schema.columns.is_empty() {
            return Err(Error::schema(table, "table has no resolvable columns"));
        }
        Ok(Arc::new(schema))
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("SchemaRegistry")
            .field("cached_tables", &cache.len())
            .finish()
    }
}
