//! Resynchronization of a cluster backend from the active set
//!
//! A [`SynchronizationContext`] gathers what one job needs: source and
//! target backends, their metadata, lazily opened connections and a worker
//! pool. Strategies run against it through [`synchronize`].

pub mod cluster;
pub mod context;
pub mod pool;
pub mod registry;
pub mod strategy;

pub use cluster::{ClusterHandle, DatabaseCluster};
pub use context::SynchronizationContext;
pub use pool::WorkerPool;
pub use registry::ConnectionRegistry;
pub use strategy::{PassiveSynchronizationStrategy, SynchronizationStrategy, synchronize};
