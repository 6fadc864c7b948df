//! Error types for pgcrud

use thiserror::Error;

/// Result type alias for pgcrud operations
pub type CrudResult<T> = Result<T, CrudError>;

/// Error types for database operations
#[derive(Debug, Error)]
pub enum CrudError {
    /// A precondition failed before anything was sent to the database.
    ///
    /// No connection is acquired when this is returned.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The driver rejected the statement (SQL error, constraint violation, ...).
    ///
    /// Carries the original `tokio_postgres` error.
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Acquiring a connection from the pool failed
    #[error("Pool error: {0}")]
    Pool(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Configuration could not be read, parsed or expanded
    #[error("Config error: {0}")]
    Config(String),
}

impl CrudError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this error was raised before reaching the database
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a driver error
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// SQLSTATE code of the underlying database error, if any (e.g. `23505`).
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Query(err) => err.as_db_error().map(|db| db.code().code()),
            _ => None,
        }
    }
}

impl From<deadpool_postgres::PoolError> for CrudError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
