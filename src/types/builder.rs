use super::{DataType, SchemaError, StructField, StructType};

/// Builds a [`StructType`] one column at a time.
///
/// ```
/// use rowbridge::types::{PrimitiveKind, StructType};
///
/// let schema = StructType::builder()
///     .column("id", PrimitiveKind::Long)
///     .column("name", PrimitiveKind::String)
///     .build()
///     .unwrap();
/// assert_eq!(schema.to_string(), "struct<id:bigint,name:string>");
/// ```
#[derive(Debug, Default, Clone)]
pub struct StructTypeBuilder {
    fields: Vec<StructField>,
}

impl StructTypeBuilder {
    /// Appends a column.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, data_type: impl Into<DataType>) -> Self {
        self.fields.push(StructField::new(name, data_type));
        self
    }

    /// Appends every column of `other`, in order.
    #[must_use]
    pub fn columns_of(mut self, other: &StructType) -> Self {
        self.fields.extend(other.fields().iter().cloned());
        self
    }

    /// Finishes the struct; names must be non-blank and unique ignoring case.
    pub fn build(self) -> Result<StructType, SchemaError> {
        StructType::try_new(self.fields)
    }
}
