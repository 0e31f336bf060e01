//! Metadata cache strategies
//!
//! A cache hands out [`DatabaseProperties`] per backend. Loads are atomic:
//! a failed introspection never leaves an entry behind.

use crate::properties::DatabaseProperties;
use async_trait::async_trait;
use hadb_core::{CacheStrategy, Connection, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[async_trait]
pub trait DatabaseMetaDataCache: Send + Sync {
    /// Properties of the backend identified by `database_id`, introspected through `connection` if needed
    async fn database_properties(&self, database_id: &str, connection: &dyn Connection) -> Result<Arc<DatabaseProperties>>;

    /// Discard everything cached so the next request introspects again
    async fn flush(&self);
}

/// Introspects on every request
#[derive(Debug, Default)]
pub struct SimpleDatabaseMetaDataCache;

#[async_trait]
impl DatabaseMetaDataCache for SimpleDatabaseMetaDataCache {
    async fn database_properties(&self, database_id: &str, connection: &dyn Connection) -> Result<Arc<DatabaseProperties>> {
        tracing::debug!(database = %database_id, "Introspecting database metadata");
        Ok(Arc::new(DatabaseProperties::load(connection).await?))
    }

    async fn flush(&self) {}
}

/// Introspects each backend once and keeps the result until flushed
///
/// Loads are serialised, so concurrent requests for the same backend
/// introspect it once.
#[derive(Default)]
pub struct EagerDatabaseMetaDataCache {
    entries: Mutex<HashMap<String, Arc<DatabaseProperties>>>,
}

impl EagerDatabaseMetaDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the entry of one backend
    pub async fn flush_database(&self, database_id: &str) {
        self.entries.lock().await.remove(database_id);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl DatabaseMetaDataCache for EagerDatabaseMetaDataCache {
    async fn database_properties(&self, database_id: &str, connection: &dyn Connection) -> Result<Arc<DatabaseProperties>> {
        let mut entries = self.entries.lock().await;

        if let Some(properties) = entries.get(database_id) {
            return Ok(properties.clone());
        }

        tracing::debug!(database = %database_id, "Loading database metadata into cache");

        let properties = Arc::new(DatabaseProperties::load(connection).await?);
        entries.insert(database_id.to_string(), properties.clone());
        Ok(properties)
    }

    async fn flush(&self) {
        self.entries.lock().await.clear();
    }
}

/// Build the cache selected by configuration
pub fn create_metadata_cache(strategy: CacheStrategy) -> Arc<dyn DatabaseMetaDataCache> {
    match strategy {
        CacheStrategy::None => Arc::new(SimpleDatabaseMetaDataCache),
        CacheStrategy::Eager => Arc::new(EagerDatabaseMetaDataCache::new()),
    }
}
