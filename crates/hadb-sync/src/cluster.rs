//! Cluster handle consumed by synchronization jobs

use hadb_core::{Balancer, Codec, Database, HaConfig, PlainCodec, create_codec};
use hadb_metadata::{
    DatabaseMetaDataCache, Dialect, EagerDatabaseMetaDataCache, StandardDialect, create_metadata_cache,
};
use std::sync::Arc;

/// What a synchronization job needs from the cluster it repairs
pub trait DatabaseCluster<D: Database>: Send + Sync {
    fn id(&self) -> &str;

    /// Source selection and the live view of active backends
    fn balancer(&self) -> Arc<dyn Balancer<D>>;

    fn dialect(&self) -> Arc<dyn Dialect>;

    fn metadata_cache(&self) -> Arc<dyn DatabaseMetaDataCache>;

    /// Decodes stored credentials when connections are opened
    fn codec(&self) -> Arc<dyn Codec>;
}

/// Plain [`DatabaseCluster`] assembled from its parts
pub struct ClusterHandle<D> {
    id: String,
    balancer: Arc<dyn Balancer<D>>,
    dialect: Arc<dyn Dialect>,
    metadata_cache: Arc<dyn DatabaseMetaDataCache>,
    codec: Arc<dyn Codec>,
}

impl<D: Database> ClusterHandle<D> {
    /// A cluster with the standard dialect, an eager metadata cache and plain credentials
    pub fn new(id: impl Into<String>, balancer: Arc<dyn Balancer<D>>) -> Self {
        Self {
            id: id.into(),
            balancer,
            dialect: Arc::new(StandardDialect),
            metadata_cache: Arc::new(EagerDatabaseMetaDataCache::new()),
            codec: Arc::new(PlainCodec),
        }
    }

    /// A cluster whose cache strategy and codec follow `config`
    pub fn from_config(id: impl Into<String>, balancer: Arc<dyn Balancer<D>>, config: &HaConfig) -> Self {
        Self::new(id, balancer)
            .with_metadata_cache(create_metadata_cache(config.cache.strategy))
            .with_codec(create_codec(config.codec.kind))
    }

    pub fn with_dialect(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_metadata_cache(mut self, cache: Arc<dyn DatabaseMetaDataCache>) -> Self {
        self.metadata_cache = cache;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }
}

impl<D: Database> DatabaseCluster<D> for ClusterHandle<D> {
    fn id(&self) -> &str {
        &self.id
    }

    fn balancer(&self) -> Arc<dyn Balancer<D>> {
        self.balancer.clone()
    }

    fn dialect(&self) -> Arc<dyn Dialect> {
        self.dialect.clone()
    }

    fn metadata_cache(&self) -> Arc<dyn DatabaseMetaDataCache> {
        self.metadata_cache.clone()
    }

    fn codec(&self) -> Arc<dyn Codec> {
        self.codec.clone()
    }
}
