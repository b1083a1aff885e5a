use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

use crate::types::SchemaError;

/// Errors raised by storage collaborators.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Arrow array or schema error.
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    /// Parquet read or write error.
    #[error("parquet error: {0}")]
    Parquet(#[from] ParquetError),
    /// File system error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Schema declared by or derived from storage is invalid.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    /// The storage format cannot represent the requested type.
    #[error("unsupported by storage: {0}")]
    Unsupported(String),
    /// A stored value does not match the column it is written to.
    #[error("column '{column}' expects {expected}, found {actual} value")]
    InvalidValue {
        /// Column (or nested path) being written.
        column: String,
        /// Declared descriptor.
        expected: String,
        /// Kind of the offending value.
        actual: &'static str,
    },
    /// The sink was already closed.
    #[error("row sink is closed")]
    Closed,
}
