use std::sync::Arc;

/// Selects live backends and is the authoritative view of the active set
///
/// Membership can change at any time; callers holding a balancer observe
/// those changes.
pub trait Balancer<D>: Send + Sync {
    /// A currently active backend, if any
    fn next(&self) -> Option<Arc<D>>;

    /// The active backends at the time of the call
    fn backends(&self) -> Vec<Arc<D>>;

    fn active_count(&self) -> usize;

    fn contains(&self, database: &D) -> bool;
}
