//! Per-job connection registry

use hadb_core::{Codec, Connection, Database, Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

type Slot = Arc<OnceCell<Arc<dyn Connection>>>;

/// One lazily opened connection per backend
///
/// The map lock only guards finding or creating a backend's slot. Opening
/// happens on the slot itself, so backends never wait on each other while
/// concurrent requests for the same backend share a single open.
pub struct ConnectionRegistry {
    codec: Arc<dyn Codec>,
    slots: Mutex<Slots>,
}

#[derive(Default)]
struct Slots {
    open: HashMap<String, Slot>,
    closed: bool,
}

impl ConnectionRegistry {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            codec,
            slots: Mutex::new(Slots::default()),
        }
    }

    /// The connection to `database`, opened on first request
    ///
    /// Fails once the registry has been closed.
    pub async fn connection<D: Database>(&self, database: &D) -> Result<Arc<dyn Connection>> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            if slots.closed {
                return Err(Error::message(format!(
                    "Connection registry is closed; not opening {}",
                    database.id()
                )));
            }
            slots.open.entry(database.id().to_string()).or_default().clone()
        };

        let connection = slot
            .get_or_try_init(|| async {
                tracing::debug!(database = %database.id(), "Opening connection");
                database.connect(self.codec.as_ref()).await
            })
            .await?;

        Ok(connection.clone())
    }

    /// Number of connections opened so far
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .open
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close every open connection
    ///
    /// Opens still in flight are waited for and their connections closed
    /// too. A connection that fails to close is logged and skipped; the rest
    /// are still closed. The registry is empty and refuses new opens afterwards.
    pub async fn close(&self) {
        let slots: Vec<(String, Slot)> = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.closed = true;
            slots.open.drain().collect()
        };

        for (database, slot) in slots {
            // waits for an open in progress; an idle slot fails immediately
            let connection = slot
                .get_or_try_init(|| async { Err::<Arc<dyn Connection>, _>(Error::message("registry closed")) })
                .await;
            let Ok(connection) = connection else {
                continue;
            };

            match connection.is_closed().await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(database = %database, error = %e, "Failed to check connection state");
                    continue;
                }
            }

            match connection.close().await {
                Ok(()) => tracing::debug!(database = %database, "Closed connection"),
                Err(e) => tracing::warn!(database = %database, error = %e, "Failed to close connection"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hadb_core::PlainCodec;
    use hadb_core::mock::{MockDatabase, MockSchema};
    use std::time::Duration;

    fn registry() -> ConnectionRegistry {
        ConnectionRegistry::new(Arc::new(PlainCodec))
    }

    #[tokio::test]
    async fn test_same_backend_same_connection() {
        let registry = registry();
        let database = MockDatabase::new("db1", MockSchema::new());

        let first = registry.connection(&database).await.unwrap();
        let second = registry.connection(&database).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(database.connect_count(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_open_once() {
        let registry = Arc::new(registry());
        let database = Arc::new(MockDatabase::new("db1", MockSchema::new()).with_connect_delay(Duration::from_millis(20)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            let database = database.clone();
            handles.push(tokio::spawn(async move { registry.connection(database.as_ref()).await.unwrap() }));
        }

        let mut connections = Vec::new();
        for handle in handles {
            connections.push(handle.await.unwrap());
        }

        assert_eq!(database.connect_count(), 1);
        assert!(connections.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_backends_do_not_wait_on_each_other() {
        let registry = Arc::new(registry());
        let slow = Arc::new(MockDatabase::new("slow", MockSchema::new()).with_connect_delay(Duration::from_secs(60)));
        let fast = MockDatabase::new("fast", MockSchema::new());

        let pending = {
            let registry = registry.clone();
            let slow = slow.clone();
            tokio::spawn(async move { registry.connection(slow.as_ref()).await })
        };
        tokio::task::yield_now().await;

        let started = tokio::time::Instant::now();
        registry.connection(&fast).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!pending.is_finished());

        pending.await.unwrap().unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_open_leaves_no_connection() {
        let registry = registry();
        let broken = MockDatabase::new("db1", MockSchema::new()).failing_connect();

        assert!(registry.connection(&broken).await.is_err());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_close_survives_failing_connection() {
        let registry = registry();
        let healthy = MockDatabase::new("a", MockSchema::new());
        let broken = MockDatabase::new("b", MockSchema::new()).failing_close();
        let other = MockDatabase::new("c", MockSchema::new());

        registry.connection(&healthy).await.unwrap();
        registry.connection(&broken).await.unwrap();
        registry.connection(&other).await.unwrap();

        registry.close().await;

        assert_eq!(healthy.open_connections(), 0);
        assert_eq!(other.open_connections(), 0);
        assert_eq!(broken.open_connections(), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_waits_for_open_in_flight() {
        let registry = Arc::new(registry());
        let slow = Arc::new(MockDatabase::new("slow", MockSchema::new()).with_connect_delay(Duration::from_secs(5)));

        let pending = {
            let registry = registry.clone();
            let slow = slow.clone();
            tokio::spawn(async move { registry.connection(slow.as_ref()).await })
        };
        tokio::task::yield_now().await;

        registry.close().await;
        let connection = pending.await.unwrap().unwrap();

        assert_eq!(slow.connect_count(), 1);
        assert_eq!(slow.open_connections(), 0);
        assert!(connection.is_closed().await.unwrap());
    }

    #[tokio::test]
    async fn test_closed_registry_refuses_new_connections() {
        let registry = registry();
        let database = MockDatabase::new("a", MockSchema::new());

        registry.close().await;

        assert!(registry.connection(&database).await.is_err());
        assert_eq!(database.connect_count(), 0);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_close_skips_already_closed() {
        let registry = registry();
        let database = MockDatabase::new("a", MockSchema::new());

        let connection = registry.connection(&database).await.unwrap();
        connection.close().await.unwrap();

        registry.close().await;
        registry.close().await;
        assert_eq!(database.open_connections(), 0);
    }
}
