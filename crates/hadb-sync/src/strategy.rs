//! Synchronization strategies and the job driver

use crate::cluster::DatabaseCluster;
use crate::context::SynchronizationContext;
use async_trait::async_trait;
use hadb_core::{Database, Result};
use hadb_telemetry::attributes::HADB_SOURCE_DATABASE;
use hadb_telemetry::synchronization_span;
use std::sync::Arc;
use tracing::Instrument;

/// Brings a target backend back in line with the active set
///
/// The context is shared so a strategy can hand clones of it to tasks on
/// the context's worker pool.
#[async_trait]
pub trait SynchronizationStrategy<D: Database>: Send + Sync {
    async fn synchronize(&self, context: Arc<SynchronizationContext<D>>) -> Result<()>;

    /// Short name recorded on the job's span
    fn name(&self) -> &str {
        "custom"
    }
}

/// Leaves the target untouched, for backends known to be in sync already
#[derive(Debug, Default, Clone, Copy)]
pub struct PassiveSynchronizationStrategy;

#[async_trait]
impl<D: Database> SynchronizationStrategy<D> for PassiveSynchronizationStrategy {
    async fn synchronize(&self, _context: Arc<SynchronizationContext<D>>) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "passive"
    }
}

/// Run one synchronization job against `target`
///
/// The context is always closed before returning, after every task the
/// strategy submitted has finished, whether or not the strategy succeeded.
pub async fn synchronize<D: Database>(
    cluster: &dyn DatabaseCluster<D>,
    target: Arc<D>,
    strategy: &dyn SynchronizationStrategy<D>,
) -> Result<()> {
    let span = synchronization_span(cluster.id(), target.id(), strategy.name());
    run_job(cluster, target, strategy).instrument(span).await
}

async fn run_job<D: Database>(
    cluster: &dyn DatabaseCluster<D>,
    target: Arc<D>,
    strategy: &dyn SynchronizationStrategy<D>,
) -> Result<()> {
    let context = Arc::new(SynchronizationContext::new(cluster, target).await?);
    tracing::Span::current().record(HADB_SOURCE_DATABASE, context.source_database().id());

    let result = strategy.synchronize(context.clone()).await;

    context.executor().shutdown();
    context.executor().await_termination().await;
    context.close().await;

    match &result {
        Ok(()) => tracing::info!(cluster = %cluster.id(), "Synchronization completed"),
        Err(e) => tracing::warn!(cluster = %cluster.id(), error = %e, "Synchronization failed"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterHandle;
    use hadb_core::Error;
    use hadb_core::mock::{MockDatabase, MockSchema, StaticBalancer};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn schema() -> MockSchema {
        MockSchema::new()
            .table("app", "items")
            .table("app", "tags")
            .column("app", "items", "id", 4, "int4")
            .column("app", "tags", "id", 4, "int4")
    }

    struct FailingStrategy;

    #[async_trait]
    impl SynchronizationStrategy<MockDatabase> for FailingStrategy {
        async fn synchronize(&self, _context: Arc<SynchronizationContext<MockDatabase>>) -> Result<()> {
            Err(Error::data_access("target rejected the copy"))
        }
    }

    /// Submits one task per source table, each touching the target connection
    #[derive(Default)]
    struct PerTableStrategy {
        completed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SynchronizationStrategy<MockDatabase> for PerTableStrategy {
        async fn synchronize(&self, context: Arc<SynchronizationContext<MockDatabase>>) -> Result<()> {
            for table in context.source_database_properties().tables() {
                let task_context = context.clone();
                let completed = self.completed.clone();
                let name = table.name().to_string();
                context.executor().submit(async move {
                    tokio::task::yield_now().await;
                    let target = task_context.target_database().clone();
                    let connection = task_context.connection(&target).await.unwrap();
                    assert!(!connection.is_closed().await.unwrap());
                    assert!(task_context.target_database_properties().table("app", &name).is_some());
                    completed.fetch_add(1, Ordering::SeqCst);
                })?;
            }
            Ok(())
        }
    }

    fn cluster(source: &Arc<MockDatabase>) -> ClusterHandle<MockDatabase> {
        ClusterHandle::new("c", Arc::new(StaticBalancer::new(vec![source.clone()])))
    }

    #[tokio::test]
    async fn test_passive_strategy_opens_and_releases() {
        let source = Arc::new(MockDatabase::new("db1", schema()));
        let target = Arc::new(MockDatabase::new("db2", schema()));

        synchronize(&cluster(&source), target.clone(), &PassiveSynchronizationStrategy)
            .await
            .unwrap();

        assert_eq!(source.connect_count(), 1);
        assert_eq!(target.connect_count(), 1);
        assert_eq!(source.open_connections(), 0);
        assert_eq!(target.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_failed_strategy_still_closes() {
        let source = Arc::new(MockDatabase::new("db1", schema()));
        let target = Arc::new(MockDatabase::new("db2", schema()));

        let err = synchronize(&cluster(&source), target.clone(), &FailingStrategy)
            .await
            .unwrap_err();

        assert!(err.is_data_access());
        assert_eq!(source.open_connections(), 0);
        assert_eq!(target.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_submitted_tasks_finish_before_close() {
        let source = Arc::new(MockDatabase::new("db1", schema()));
        let target = Arc::new(MockDatabase::new("db2", schema()));
        let strategy = PerTableStrategy::default();

        synchronize(&cluster(&source), target.clone(), &strategy).await.unwrap();

        assert_eq!(strategy.completed.load(Ordering::SeqCst), 2);
        assert_eq!(target.connect_count(), 1);
        assert_eq!(target.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_context_failure_skips_strategy() {
        let source = Arc::new(MockDatabase::new("db1", schema()));
        let target = Arc::new(MockDatabase::new("db2", schema()).failing_connect());
        let strategy = PerTableStrategy::default();

        let result = synchronize(&cluster(&source), target, &strategy).await;

        assert!(result.is_err());
        assert_eq!(strategy.completed.load(Ordering::SeqCst), 0);
    }
}
