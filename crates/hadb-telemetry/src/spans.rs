//! Span creation helpers

use crate::attributes::*;

/// Span covering one synchronization job
///
/// The source field is empty until the job has picked one; record it with
/// [`HADB_SOURCE_DATABASE`].
pub fn synchronization_span(cluster_id: &str, target_id: &str, strategy: &str) -> tracing::Span {
    tracing::info_span!(
        "synchronize",
        system = SYSTEM_NAME,
        { HADB_CLUSTER_ID } = %cluster_id,
        { HADB_TARGET_DATABASE } = %target_id,
        { HADB_STRATEGY } = %strategy,
        { HADB_SOURCE_DATABASE } = tracing::field::Empty,
    )
}

/// Helper to safely serialize to JSON string
pub fn safe_serialize<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<not serializable>".to_string())
}
