use crate::codec::Codec;
use crate::connection::Connection;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// One backend participating in the cluster
#[async_trait]
pub trait Database: Send + Sync + 'static {
    /// Identity of this backend within its cluster
    fn id(&self) -> &str;

    /// Open a new connection, decoding stored credentials with `codec`
    async fn connect(&self, codec: &dyn Codec) -> Result<Arc<dyn Connection>>;
}
