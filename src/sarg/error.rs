use rowbridge_predicate::Operator;
use thiserror::Error;

use crate::types::SchemaError;

/// Errors raised while binding predicate leaves to a schema.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    /// The leaf names a column the schema does not declare.
    #[error("predicate references unknown column '{0}'")]
    UnknownColumn(String),
    /// Only scalar, non-binary columns can be filtered.
    #[error("cannot evaluate predicates over column '{column}' of type {data_type}")]
    UnsupportedColumnType {
        /// Column name.
        column: String,
        /// Rendered column descriptor.
        data_type: String,
    },
    /// A literal cannot be coerced into the column's stored form.
    #[error("literal {literal} cannot be compared with column '{column}' of type {data_type}")]
    InvalidLiteral {
        /// Column name.
        column: String,
        /// Rendered column descriptor.
        data_type: String,
        /// Rendered literal.
        literal: String,
    },
    /// The leaf carries the wrong number of literals for its operator.
    #[error("{operator} on column '{column}' expects {expected} literals, got {actual}")]
    InvalidArity {
        /// Operator of the leaf.
        operator: Operator,
        /// Column name.
        column: String,
        /// Expected count, rendered.
        expected: &'static str,
        /// Supplied count.
        actual: usize,
    },
    /// The column descriptor itself is invalid.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}
