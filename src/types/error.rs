use thiserror::Error;

/// Coarse classification used by the scan components to decide how a
/// failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The provider could not hand out a connection.
    Connection,
    /// Execution, fetch or decoding failed while a scan was running.
    Query,
    /// Invalid sizes or settings, detected before any I/O.
    Configuration,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not connect to '{target}': {details}")]
    ConnectionFailure { target: String, details: String },

    #[error("Query failed: {details}")]
    QueryFailure { details: String },

    #[error("Invalid batch size {size}: batch size must be greater than zero")]
    InvalidBatchSize { size: usize },

    #[error("Invalid page size {size}: page size must be greater than zero")]
    InvalidPageSize { size: usize },

    #[error("Page offset overflow: {details}")]
    OffsetOverflow { details: String },

    #[error("Configuration error: {details}")]
    Config { details: String },

    #[error("SQL parsing error: {details}")]
    SqlParseError { details: String },

    #[error("Column '{name}' not found in table '{table}'")]
    ColumnNotFound { name: String, table: String },

    #[error("Column index {index} out of bounds")]
    ColumnIndexOutOfBounds { index: usize },

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Invalid data: {details}")]
    InvalidData { details: String },
}

impl DatabaseError {
    pub fn query(details: impl Into<String>) -> Self {
        Self::QueryFailure {
            details: details.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            DatabaseError::ConnectionFailure { .. } => ErrorClass::Connection,
            DatabaseError::InvalidBatchSize { .. }
            | DatabaseError::InvalidPageSize { .. }
            | DatabaseError::Config { .. } => ErrorClass::Configuration,
            _ => ErrorClass::Query,
        }
    }
}

/// Largest batch or page size that can be bound as a SQL LIMIT.
pub const MAX_FETCH_SIZE: usize = i64::MAX as usize;

pub type Result<T> = std::result::Result<T, DatabaseError>;
