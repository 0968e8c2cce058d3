//! Storage-layer errors for SQLite operations.

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("No database connection; bind a persist or retrieve location first")]
    NotConnected,

    #[error("Unsupported location: {location}")]
    UnsupportedLocation { location: String },

    #[error("Transaction already in progress")]
    TransactionInProgress,

    #[error("No transaction in progress")]
    NoTransaction,

    #[error("No table selected for the operation")]
    NoTableSelected,

    #[error("Table already exists: {table}")]
    TableExists { table: String },

    #[error("Table not found: {table}")]
    TableMissing { table: String },

    #[error("No pending column values to insert")]
    EmptyRow,

    #[error("No query is active")]
    NoQueryActive,

    #[error("No active row; call next() first")]
    NoActiveRow,

    #[error("Query declares no output columns")]
    NoOutputColumns,

    #[error("Column index {index} out of range ({count} columns)")]
    ColumnOutOfRange { index: usize, count: usize },

    #[error("Type mismatch reading column {index}: {message}")]
    TypeMismatch { index: usize, message: String },

    #[error("No database credentials available for {target}")]
    AuthUnavailable { target: String },
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
