//! Core contracts and types for the HA database synchronization core
//!
//! This crate provides the error taxonomy, configuration, and the traits the
//! core consumes from the surrounding cluster: backends, connections, driver
//! metadata, balancers and credential codecs.

pub mod balancer;
pub mod codec;
pub mod config;
pub mod connection;
pub mod database;
pub mod error;
pub mod metadata;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-exports
pub use balancer::Balancer;
pub use codec::{Base64Codec, Codec, PlainCodec, create_codec};
pub use config::{CacheConfig, CacheStrategy, CodecConfig, CodecKind, HaConfig, LoggingConfig};
pub use connection::{Connection, ResultSet};
pub use database::Database;
pub use error::{Error, Result};
pub use metadata::{ColumnRow, DatabaseMetaData, ImportedKeyRow, IndexRow, PrimaryKeyRow, TableRow};
