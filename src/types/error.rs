use thiserror::Error;

/// Errors raised while declaring or validating type descriptors.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A struct field was declared with an empty or whitespace-only name.
    #[error("column name must not be blank")]
    BlankColumn,
    /// Two struct fields share a name, compared case-insensitively.
    #[error("duplicate column name '{0}' (names are case-insensitive)")]
    DuplicateColumn(String),
    /// A descriptor carries parameters outside the supported range.
    #[error("invalid type {data_type}: {reason}")]
    InvalidType {
        /// Rendered descriptor.
        data_type: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Two descriptors expected to agree for the same column disagree.
    #[error("column '{column}' is declared as {expected} but stored as {actual}")]
    SchemaMismatch {
        /// Column name.
        column: String,
        /// Requested descriptor.
        expected: String,
        /// Descriptor found in storage.
        actual: String,
    },
}
