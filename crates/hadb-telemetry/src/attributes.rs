//! Field names recorded on synchronization spans

pub const SYSTEM_NAME: &str = "hadb";

pub const HADB_CLUSTER_ID: &str = "hadb.cluster.id";
pub const HADB_SOURCE_DATABASE: &str = "hadb.source.database";
pub const HADB_TARGET_DATABASE: &str = "hadb.target.database";
pub const HADB_STRATEGY: &str = "hadb.strategy";
