use std::fmt::Display;

use thiserror::Error;

/// Errors that can occur while talking to the warehouse.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` error raised while preparing or executing a statement.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// A connection to the warehouse could not be established.
    #[error("connection error: {message}")]
    Connection { message: String },

    /// Query was rejected before reaching the warehouse.
    #[error("query rejected: {0}")]
    QueryRejected(String),

    /// Filter values cannot be turned into a query.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ::config::ConfigError),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WarehouseError {
    /// Wrap the cause of a failed connection attempt.
    pub fn connection(cause: impl Display) -> Self {
        Self::Connection {
            message: cause.to_string(),
        }
    }

    /// Whether this error means no connection could be created.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}
