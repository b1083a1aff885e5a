use thiserror::Error;

use super::Operator;

/// Errors raised while composing or decoding a search argument.
#[derive(Debug, Error)]
pub enum PredicateError {
    /// A leaf was declared without a usable column name.
    #[error("predicate column name must not be empty")]
    EmptyColumn,
    /// A leaf received the wrong number of literals for its operator.
    #[error("invalid arity for {op} on column '{column}': expected {expected}, got {got}")]
    InvalidArity {
        /// Operator of the offending leaf.
        op: Operator,
        /// Column of the offending leaf.
        column: String,
        /// Human readable expectation.
        expected: &'static str,
        /// Literal count supplied.
        got: usize,
    },
    /// A group was closed without any clause in it.
    #[error("{0} group requires at least one clause")]
    EmptyGroup(&'static str),
    /// The expression tree references a leaf index that does not exist.
    #[error("expression references leaf {index} but only {len} leaves exist")]
    DanglingLeaf {
        /// Referenced index.
        index: usize,
        /// Number of leaves available.
        len: usize,
    },
    /// The blob could not be encoded or decoded.
    #[error("search argument blob codec error: {0}")]
    Blob(#[from] serde_json::Error),
}
