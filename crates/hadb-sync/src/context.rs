//! Runtime state of one resynchronization job

use crate::cluster::DatabaseCluster;
use crate::pool::WorkerPool;
use crate::registry::ConnectionRegistry;
use hadb_core::{Balancer, Connection, Database, Error, Result};
use hadb_metadata::{DatabaseMetaDataCache, DatabaseProperties, Dialect};
use std::sync::Arc;

/// Everything a synchronization strategy needs to repair one target backend
///
/// Built once per job: picks a live source, opens connections to source and
/// target, loads both backends' metadata and sizes a worker pool to the
/// active set. [`close`](Self::close) releases it all; using the context
/// afterwards is not supported.
pub struct SynchronizationContext<D: Database> {
    source: Arc<D>,
    target: Arc<D>,
    active: Arc<dyn Balancer<D>>,
    source_properties: Arc<DatabaseProperties>,
    target_properties: Arc<DatabaseProperties>,
    dialect: Arc<dyn Dialect>,
    registry: ConnectionRegistry,
    pool: WorkerPool,
}

impl<D: Database> SynchronizationContext<D> {
    /// Prepare to synchronize `target` from a currently active backend of `cluster`
    ///
    /// Fails with [`Error::NoActiveDatabases`] if the cluster has no live
    /// backend, or with the underlying error if either backend's metadata
    /// cannot be loaded. Nothing stays open on failure.
    pub async fn new(cluster: &dyn DatabaseCluster<D>, target: Arc<D>) -> Result<Self> {
        let balancer = cluster.balancer();

        let source = balancer
            .next()
            .ok_or_else(|| Error::NoActiveDatabases(cluster.id().to_string()))?;

        let pool = WorkerPool::new(balancer.active_count());
        let registry = ConnectionRegistry::new(cluster.codec());
        let cache = cluster.metadata_cache();

        let active: Vec<String> = balancer.backends().iter().map(|d| d.id().to_string()).collect();

        tracing::info!(
            cluster = %cluster.id(),
            source_database = %source.id(),
            target_database = %target.id(),
            active = ?active,
            workers = pool.capacity(),
            "Creating synchronization context"
        );

        let loaded = async {
            let target_properties = load_properties(cache.as_ref(), &registry, target.as_ref()).await?;
            let source_properties = load_properties(cache.as_ref(), &registry, source.as_ref()).await?;
            Ok::<_, Error>((source_properties, target_properties))
        }
        .await;

        let (source_properties, target_properties) = match loaded {
            Ok(properties) => properties,
            Err(e) => {
                registry.close().await;
                pool.shutdown();
                return Err(e);
            }
        };

        Ok(Self {
            source,
            target,
            active: balancer,
            source_properties,
            target_properties,
            dialect: cluster.dialect(),
            registry,
            pool,
        })
    }

    /// The job's connection to `database`, opened on first request
    pub async fn connection(&self, database: &D) -> Result<Arc<dyn Connection>> {
        self.registry.connection(database).await
    }

    pub fn source_database(&self) -> &Arc<D> {
        &self.source
    }

    pub fn target_database(&self) -> &Arc<D> {
        &self.target
    }

    /// Live view of the active backends
    ///
    /// Membership may change during the job and is not reflected in the
    /// pool's capacity.
    pub fn active_databases(&self) -> &Arc<dyn Balancer<D>> {
        &self.active
    }

    pub fn source_database_properties(&self) -> &Arc<DatabaseProperties> {
        &self.source_properties
    }

    pub fn target_database_properties(&self) -> &Arc<DatabaseProperties> {
        &self.target_properties
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn executor(&self) -> &WorkerPool {
        &self.pool
    }

    /// Close every connection opened for the job, then stop the worker pool
    pub async fn close(&self) {
        tracing::debug!(target_database = %self.target.id(), "Closing synchronization context");
        self.registry.close().await;
        self.pool.shutdown();
    }
}

async fn load_properties<D: Database>(
    cache: &dyn DatabaseMetaDataCache,
    registry: &ConnectionRegistry,
    database: &D,
) -> Result<Arc<DatabaseProperties>> {
    let connection = registry.connection(database).await?;
    cache.database_properties(database.id(), connection.as_ref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterHandle;
    use hadb_core::mock::{MockDatabase, MockSchema, StaticBalancer};
    use mockall::mock;

    mock! {
        pub ActiveSet {}
        impl Balancer<MockDatabase> for ActiveSet {
            fn next(&self) -> Option<Arc<MockDatabase>>;
            fn backends(&self) -> Vec<Arc<MockDatabase>>;
            fn active_count(&self) -> usize;
            fn contains(&self, database: &MockDatabase) -> bool;
        }
    }

    fn schema() -> MockSchema {
        MockSchema::new()
            .table("app", "items")
            .column("app", "items", "id", 4, "int4")
            .primary_key("app", "items", "items_pkey", &["id"])
    }

    #[tokio::test]
    async fn test_no_active_databases() {
        let mut balancer = MockActiveSet::new();
        balancer.expect_next().times(1).returning(|| None);
        balancer.expect_active_count().never();
        balancer.expect_backends().never();

        let cluster: ClusterHandle<MockDatabase> = ClusterHandle::new("cluster-a", Arc::new(balancer));
        let target = Arc::new(MockDatabase::new("db3", schema()));

        let result = SynchronizationContext::new(&cluster, target.clone()).await;
        match result {
            Err(Error::NoActiveDatabases(id)) => assert_eq!(id, "cluster-a"),
            _ => panic!("expected NoActiveDatabases"),
        }
        assert_eq!(target.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_pool_sized_to_active_count() {
        let source = Arc::new(MockDatabase::new("db1", schema()));
        let mut balancer = MockActiveSet::new();
        let next = source.clone();
        balancer.expect_next().returning(move || Some(next.clone()));
        balancer.expect_active_count().returning(|| 4);
        let listed = source.clone();
        balancer.expect_backends().times(1).returning(move || vec![listed.clone()]);

        let cluster: ClusterHandle<MockDatabase> = ClusterHandle::new("cluster-a", Arc::new(balancer));
        let target = Arc::new(MockDatabase::new("db5", schema()));

        let context = SynchronizationContext::new(&cluster, target).await.unwrap();
        assert_eq!(context.executor().capacity(), 4);
        assert_eq!(context.source_database().id(), "db1");
        assert_eq!(context.target_database().id(), "db5");
        context.close().await;
    }

    #[tokio::test]
    async fn test_connections_reused_from_construction() {
        let source = Arc::new(MockDatabase::new("db1", schema()));
        let target = Arc::new(MockDatabase::new("db2", schema()));
        let cluster: ClusterHandle<MockDatabase> = ClusterHandle::new("c", Arc::new(StaticBalancer::new(vec![source.clone()])));

        let context = SynchronizationContext::new(&cluster, target.clone()).await.unwrap();
        let first = context.connection(&target).await.unwrap();
        let second = context.connection(&target).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(target.connect_count(), 1);
        assert_eq!(source.connect_count(), 1);
        context.close().await;
    }

    #[tokio::test]
    async fn test_metadata_failure_releases_connections() {
        let source = Arc::new(MockDatabase::new("db1", schema().fail_on("primary_keys")));
        let target = Arc::new(MockDatabase::new("db2", schema()));
        let cluster: ClusterHandle<MockDatabase> = ClusterHandle::new("c", Arc::new(StaticBalancer::new(vec![source.clone()])));

        let err = SynchronizationContext::new(&cluster, target.clone())
            .await
            .err()
            .unwrap();
        assert!(err.is_data_access());
        assert_eq!(source.open_connections(), 0);
        assert_eq!(target.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_target_connect_failure_propagates() {
        let source = Arc::new(MockDatabase::new("db1", schema()));
        let target = Arc::new(MockDatabase::new("db2", schema()).failing_connect());
        let cluster: ClusterHandle<MockDatabase> = ClusterHandle::new("c", Arc::new(StaticBalancer::new(vec![source.clone()])));

        let result = SynchronizationContext::new(&cluster, target).await;
        assert!(matches!(result, Err(Error::DataAccess(_))));
        assert_eq!(source.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_active_view_is_live() {
        let source = Arc::new(MockDatabase::new("db1", schema()));
        let other = Arc::new(MockDatabase::new("db2", schema()));
        let target = Arc::new(MockDatabase::new("db3", schema()));
        let balancer = Arc::new(StaticBalancer::new(vec![source.clone()]));
        let cluster: ClusterHandle<MockDatabase> = ClusterHandle::new("c", balancer.clone());

        let context = SynchronizationContext::new(&cluster, target).await.unwrap();
        assert_eq!(context.executor().capacity(), 1);

        balancer.activate(other.clone());
        assert_eq!(context.active_databases().active_count(), 2);
        assert!(context.active_databases().contains(&other));
        assert_eq!(context.executor().capacity(), 1);
        context.close().await;
    }

    #[tokio::test]
    async fn test_close_survives_failing_connection() {
        let source = Arc::new(MockDatabase::new("db1", schema()));
        let broken = Arc::new(MockDatabase::new("db2", schema()).failing_close());
        let target = Arc::new(MockDatabase::new("db3", schema()));
        let cluster: ClusterHandle<MockDatabase> = ClusterHandle::new(
            "c",
            Arc::new(StaticBalancer::new(vec![source.clone(), broken.clone()])),
        );

        let context = SynchronizationContext::new(&cluster, target.clone()).await.unwrap();
        context.connection(&broken).await.unwrap();

        context.close().await;

        assert_eq!(source.open_connections(), 0);
        assert_eq!(target.open_connections(), 0);
        assert_eq!(broken.open_connections(), 1);
        assert!(context.executor().is_shutdown());
        assert!(matches!(context.executor().submit(async {}), Err(Error::PoolShutdown)));
    }
}
