use crate::error::Result;
use crate::metadata::DatabaseMetaData;
use async_trait::async_trait;

/// Column metadata of an executed query
///
/// Holds driver resources until closed.
#[async_trait]
pub trait ResultSet: Send {
    fn column_count(&self) -> usize;

    /// Whether the zero-based column is populated automatically by the backend
    fn is_auto_increment(&self, column: usize) -> Result<bool>;

    async fn close(&mut self) -> Result<()>;
}

/// An open connection to a single backend
#[async_trait]
pub trait Connection: Send + Sync {
    fn metadata(&self) -> &dyn DatabaseMetaData;

    async fn execute_query(&self, sql: &str) -> Result<Box<dyn ResultSet>>;

    async fn is_closed(&self) -> Result<bool>;

    async fn close(&self) -> Result<()>;
}
