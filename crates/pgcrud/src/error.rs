//! Error types for pgcrud

use thiserror::Error;

/// Result type alias for pgcrud operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for query composition and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error reported by tokio-postgres
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Query execution error reported by any other backend
    #[error("Database error: {0}")]
    Database(String),

    /// Filter spec that cannot be turned into a WHERE expression
    #[error("Malformed filter: {0}")]
    MalformedFilter(String),

    /// `?` placeholders and wildcard values do not line up
    #[error("Wildcard error: {0}")]
    Wildcard(String),

    /// UPDATE/DELETE that is neither row-bound nor unlocked with `all()`
    #[error("Unsafe bulk mutation: {0}")]
    UnsafeBulkMutation(String),

    /// Query descriptor that cannot be compiled to SQL
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Schema or configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Statement exceeded the configured timeout
    #[error("Query timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Statement rejected by a query hook
    #[error("Query aborted by hook: {0}")]
    Aborted(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a malformed filter error
    pub fn malformed_filter(message: impl Into<String>) -> Self {
        Self::MalformedFilter(message.into())
    }

    /// Create a wildcard mismatch error
    pub fn wildcard(message: impl Into<String>) -> Self {
        Self::Wildcard(message.into())
    }

    /// Create an unsafe bulk mutation error
    pub fn unsafe_bulk(message: impl Into<String>) -> Self {
        Self::UnsafeBulkMutation(message.into())
    }

    /// Create a malformed query error
    pub fn malformed_query(message: impl Into<String>) -> Self {
        Self::MalformedQuery(message.into())
    }

    /// Check if this is an unsafe bulk mutation error
    pub fn is_unsafe_bulk(&self) -> bool {
        matches!(self, Self::UnsafeBulkMutation(_))
    }

    /// Check if this is a wildcard mismatch error
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard(_))
    }

    /// Check if this is a malformed filter error
    pub fn is_malformed_filter(&self) -> bool {
        matches!(self, Self::MalformedFilter(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if the error was raised by the database backend
    pub fn is_database(&self) -> bool {
        matches!(self, Self::Query(_) | Self::Database(_))
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for OrmError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
