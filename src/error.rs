use rowbridge_predicate::PredicateError;
use thiserror::Error;

use crate::{
    config::ConfigError, convert::ConvertError, sarg::EvaluatorError, storage::StorageError,
    types::SchemaError,
};

/// Top-level error returned by row access, scans and writers.
#[derive(Debug, Error)]
pub enum Error {
    /// Schema error
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    /// Value conversion error
    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),
    /// Evaluator construction error
    #[error("evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),
    /// Search argument error
    #[error("predicate error: {0}")]
    Predicate(#[from] PredicateError),
    /// Storage collaborator error
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
