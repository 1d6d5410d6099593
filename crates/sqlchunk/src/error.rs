//! Error types for sqlchunk

use thiserror::Error;

/// Result type alias for sqlchunk operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Boxed error coming from the underlying pooled client.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for statement assembly and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Configuration error (pool not initialized, missing connection fields, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request is missing required parts or is internally inconsistent.
    ///
    /// Raised before any statement is issued.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Failure reported by the pooled client, passed through unchanged
    #[error("Driver error: {0}")]
    Driver(#[source] DriverError),

    /// Connection acquisition error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Request decoding error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OrmError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid-request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Wrap an error coming from the pooled client
    pub fn driver(err: impl Into<DriverError>) -> Self {
        Self::Driver(err.into())
    }

    /// Create a connection acquisition error
    pub fn pool(message: impl Into<String>) -> Self {
        Self::Pool(message.into())
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is an invalid-request error
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    /// Check if this error came from the pooled client
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver(_))
    }

    /// Check if a connection could not be acquired
    pub fn is_pool(&self) -> bool {
        matches!(self, Self::Pool(_))
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
