//! Database metadata cache
//!
//! This crate discovers and normalizes a backend's schema (tables, columns,
//! primary keys, foreign keys, unique constraints), decides how identifiers
//! must be quoted for each backend, and caches the result per backend.

pub mod cache;
pub mod dialect;
pub mod introspector;
pub mod properties;
pub mod quoting;
pub mod reserved;
pub mod types;

// Re-exports
pub use cache::{
    DatabaseMetaDataCache, EagerDatabaseMetaDataCache, SimpleDatabaseMetaDataCache, create_metadata_cache,
};
pub use dialect::{Dialect, StandardDialect};
pub use introspector::MetaDataIntrospector;
pub use properties::{DatabaseProperties, TableProperties};
pub use quoting::{CasePolicy, DialectFacts};
pub use types::{ColumnProperties, ForeignKeyConstraint, UniqueConstraint};
