use rowbridge_predicate::PredicateError;
use thiserror::Error;

use crate::types::SchemaError;

/// Errors raised while assembling scan or sink configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither a declared schema nor "read from source" was chosen.
    #[error("no schema source provided")]
    MissingSchema,
    /// The same setting was specified twice.
    #[error("{0} was already specified")]
    AlreadySet(&'static str),
    /// A column name is listed twice, compared case-insensitively.
    #[error("column '{0}' is listed more than once")]
    DuplicateColumn(String),
    /// A requested column is not part of the resolved schema.
    #[error("requested column '{0}' is not declared in the schema")]
    UnknownColumn(String),
    /// A requested column is missing from the file while the scan requires
    /// every column to be present.
    #[error("column '{0}' is required but missing from the source")]
    MissingColumn(String),
    /// The source schema does not follow the transactional row layout.
    #[error("not a transactional schema: {0}")]
    NotTransactional(String),
    /// The declared schema is invalid.
    #[error("invalid schema: {0}")]
    Schema(SchemaError),
    /// The search argument could not be encoded or decoded.
    #[error("invalid search argument: {0}")]
    SearchArgument(#[from] PredicateError),
    /// The configuration could not be encoded or decoded.
    #[error("configuration codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl From<SchemaError> for ConfigError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::DuplicateColumn(column) => ConfigError::DuplicateColumn(column),
            other => ConfigError::Schema(other),
        }
    }
}
