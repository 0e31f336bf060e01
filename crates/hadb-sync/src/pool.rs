//! Bounded worker pool for table-level synchronization work

use hadb_core::{Error, Result};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// Runs submitted tasks with at most `capacity` executing at once
///
/// After [`shutdown`](Self::shutdown) new submissions are rejected; tasks
/// already submitted still run to completion.
pub struct WorkerPool {
    capacity: usize,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    /// Serialises admission against shutdown
    admission: Mutex<()>,
}

impl WorkerPool {
    /// A pool running up to `capacity` tasks concurrently (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            permits: Arc::new(Semaphore::new(capacity)),
            tracker: TaskTracker::new(),
            admission: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tasks currently executing
    pub fn running(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Tasks submitted and not yet finished, running or waiting
    pub fn outstanding(&self) -> usize {
        self.tracker.len()
    }

    /// Queue `task` for execution
    pub fn submit<F>(&self, task: F) -> Result<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let _admission = self.admission.lock().unwrap_or_else(PoisonError::into_inner);
        if self.tracker.is_closed() {
            return Err(Error::PoolShutdown);
        }

        let permits = self.permits.clone();
        Ok(self.tracker.spawn(async move {
            // never closed, so acquisition only waits
            let _permit = permits.acquire_owned().await;
            task.await
        }))
    }

    /// Stop accepting tasks
    pub fn shutdown(&self) {
        let _admission = self.admission.lock().unwrap_or_else(PoisonError::into_inner);
        self.tracker.close();
    }

    pub fn is_shutdown(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Wait until the pool is shut down and every submitted task has finished
    pub async fn await_termination(&self) {
        self.tracker.wait().await;
    }
}
