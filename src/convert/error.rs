use thiserror::Error;

/// Errors raised while converting a single value between domains.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The value is not of the kind the converter expects.
    #[error("unexpected {actual} value {value}, expected {expected}")]
    TypeMismatch {
        /// Rendered offending value.
        value: String,
        /// Kind of the offending value.
        actual: &'static str,
        /// Descriptor the converter was built for.
        expected: String,
    },
    /// The value has the right kind but cannot be represented by the column.
    #[error("value {value} is out of range for {target}")]
    OutOfRange {
        /// Rendered offending value.
        value: String,
        /// Descriptor the converter was built for.
        target: String,
    },
    /// A struct value has a different number of entries than the struct.
    #[error("struct expects {expected} values, got {actual}")]
    ArityMismatch {
        /// Number of declared fields.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },
    /// A stored union carries a tag with no matching variant.
    #[error("union tag {tag} has no variant (union declares {variants})")]
    UnknownUnionTag {
        /// Stored tag.
        tag: u8,
        /// Number of declared variants.
        variants: usize,
    },
    /// A conversion failed for a named field.
    #[error("field '{field}': {source}")]
    Field {
        /// Field name as requested by the caller.
        field: String,
        /// Underlying failure.
        #[source]
        source: Box<ConvertError>,
    },
}

impl ConvertError {
    /// Attaches a field name to this error.
    #[must_use]
    pub fn for_field(self, field: impl Into<String>) -> Self {
        ConvertError::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// The name of the field the error was raised for, if known.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            ConvertError::Field { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Unwraps field context down to the originating error.
    #[must_use]
    pub fn root(&self) -> &ConvertError {
        match self {
            ConvertError::Field { source, .. } => source.root(),
            other => other,
        }
    }
}
