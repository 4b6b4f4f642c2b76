use thiserror::Error;

/// Custom error type for adapter operations.
#[derive(Error, Debug)]
pub enum DbError {
    /// Statement execution failure reported by the driver (malformed SQL,
    /// constraint violation, ...). Propagated as-is.
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    /// The driver for the requested dialect was not compiled in.
    #[error("Driver unavailable: the {0} driver is not enabled in this build")]
    DriverUnavailable(String),
    /// Connection error (e.g., bad credentials, unreachable host).
    #[error("There was a problem connecting to the database: {0}")]
    ConnectionFailed(String),
    /// Abstract type without a native mapping, or a native type that cannot be parsed.
    #[error("The type: \"{0}\" is not supported")]
    UnsupportedType(String),
    #[error("The specified column doesn't exist: {column} (table {table})")]
    ColumnNotFound { table: String, column: String },
    #[error("Not connected to the database")]
    NotConnected,
    /// The dialect has no way of expressing the requested schema change.
    #[error("{operation} is not supported by the {dialect} adapter")]
    UnsupportedOperation {
        dialect: &'static str,
        operation: String,
    },
    /// A schema description that violates its own invariants.
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),
    /// Configuration error (e.g., invalid database URL or missing parameters).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    pub fn unsupported(dialect: &'static str, operation: impl Into<String>) -> Self {
        DbError::UnsupportedOperation {
            dialect,
            operation: operation.into(),
        }
    }

    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        DbError::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
