use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No active databases in cluster {0}")]
    NoActiveDatabases(String),

    #[error("Data access error: {0}")]
    DataAccess(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Worker pool is shut down; task rejected")]
    PoolShutdown,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Helper for creating data access errors
    ///
    /// # Example
    /// ```
    /// use hadb_core::Error;
    /// let err = Error::data_access("relation \"orders\" does not exist");
    /// ```
    pub fn data_access(msg: impl Into<String>) -> Self {
        Error::DataAccess(msg.into())
    }

    /// Helper for creating configuration errors
    ///
    /// # Example
    /// ```
    /// use hadb_core::Error;
    /// let err = Error::config_error("Unknown cache strategy");
    /// ```
    pub fn config_error(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Helper for creating general errors with a message
    pub fn message(msg: impl Into<String>) -> Self {
        Error::Other(anyhow::anyhow!("{}", msg.into()))
    }

    /// Whether this error came from talking to a backend
    pub fn is_data_access(&self) -> bool {
        matches!(self, Error::DataAccess(_))
    }
}
