//! Type descriptors for stored columns.
//!
//! A [`DataType`] is built once, programmatically or by introspecting a file,
//! and then shared read-only by every converter and evaluator derived from it.

mod builder;
mod error;

use std::{collections::HashSet, fmt};

pub use builder::StructTypeBuilder;
pub use error::SchemaError;
use serde::{Deserialize, Serialize};

/// Largest decimal precision a column may declare.
pub const MAX_DECIMAL_PRECISION: u8 = 38;
/// Largest declared length of a `char` column.
pub const MAX_CHAR_LENGTH: u32 = 255;
/// Largest declared length of a `varchar` column.
pub const MAX_VARCHAR_LENGTH: u32 = 65_535;
/// Largest number of variants a union may declare.
pub const MAX_UNION_VARIANTS: usize = 255;

/// Scalar column kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// UTF-8 text of unbounded length.
    String,
    /// `true` / `false`.
    Boolean,
    /// 8-bit signed integer.
    Byte,
    /// 16-bit signed integer.
    Short,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Zone-less date and time with nanosecond precision.
    Timestamp,
    /// Zone-less calendar date.
    Date,
    /// Fixed-point decimal.
    Decimal {
        /// Total number of significant digits.
        precision: u8,
        /// Digits after the decimal point.
        scale: u8,
    },
    /// Text truncated to a fixed maximum length.
    Char(u32),
    /// Text truncated to a variable maximum length.
    Varchar(u32),
    /// Opaque byte sequence.
    Binary,
}

impl PrimitiveKind {
    /// Checks the kind's parameters against the supported ranges.
    pub fn validate(self) -> Result<(), SchemaError> {
        let reason = match self {
            PrimitiveKind::Decimal { precision, scale } => {
                if precision == 0 || precision > MAX_DECIMAL_PRECISION {
                    Some(format!(
                        "precision must be within 1..={MAX_DECIMAL_PRECISION}"
                    ))
                } else if scale > precision {
                    Some(format!("scale {scale} exceeds precision {precision}"))
                } else {
                    None
                }
            }
            PrimitiveKind::Char(len) if len == 0 || len > MAX_CHAR_LENGTH => {
                Some(format!("length must be within 1..={MAX_CHAR_LENGTH}"))
            }
            PrimitiveKind::Varchar(len) if len == 0 || len > MAX_VARCHAR_LENGTH => {
                Some(format!("length must be within 1..={MAX_VARCHAR_LENGTH}"))
            }
            _ => None,
        };
        match reason {
            Some(reason) => Err(SchemaError::InvalidType {
                data_type: self.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveKind::String => f.write_str("string"),
            PrimitiveKind::Boolean => f.write_str("boolean"),
            PrimitiveKind::Byte => f.write_str("tinyint"),
            PrimitiveKind::Short => f.write_str("smallint"),
            PrimitiveKind::Int => f.write_str("int"),
            PrimitiveKind::Long => f.write_str("bigint"),
            PrimitiveKind::Float => f.write_str("float"),
            PrimitiveKind::Double => f.write_str("double"),
            PrimitiveKind::Timestamp => f.write_str("timestamp"),
            PrimitiveKind::Date => f.write_str("date"),
            PrimitiveKind::Decimal { precision, scale } => {
                write!(f, "decimal({precision},{scale})")
            }
            PrimitiveKind::Char(len) => write!(f, "char({len})"),
            PrimitiveKind::Varchar(len) => write!(f, "varchar({len})"),
            PrimitiveKind::Binary => f.write_str("binary"),
        }
    }
}

/// Descriptor of a column's type, potentially nested.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Scalar column.
    Primitive(PrimitiveKind),
    /// Ordered, named fields.
    Struct(StructType),
    /// Homogeneous list.
    List(Box<DataType>),
    /// Key/value map.
    Map(Box<DataType>, Box<DataType>),
    /// Tagged union; the tag is the variant's declaration index.
    Union(Vec<DataType>),
}

impl DataType {
    /// `array<element>`.
    pub fn list(element: impl Into<DataType>) -> Self {
        DataType::List(Box::new(element.into()))
    }

    /// `map<key,value>`.
    pub fn map(key: impl Into<DataType>, value: impl Into<DataType>) -> Self {
        DataType::Map(Box::new(key.into()), Box::new(value.into()))
    }

    /// `uniontype<variants...>`.
    pub fn union<I, T>(variants: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DataType>,
    {
        DataType::Union(variants.into_iter().map(Into::into).collect())
    }

    /// The scalar kind, if this is a primitive descriptor.
    #[must_use]
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            DataType::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// The struct descriptor, if this is one.
    #[must_use]
    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            DataType::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Validates this descriptor and every descriptor nested in it.
    pub fn validate(&self) -> Result<(), SchemaError> {
        match self {
            DataType::Primitive(kind) => kind.validate(),
            DataType::Struct(fields) => fields.validate(),
            DataType::List(element) => element.validate(),
            DataType::Map(key, value) => {
                key.validate()?;
                value.validate()
            }
            DataType::Union(variants) => {
                check_union_arity(self, variants.len())?;
                variants.iter().try_for_each(DataType::validate)
            }
        }
    }
}

pub(crate) fn check_union_arity(data_type: &DataType, variants: usize) -> Result<(), SchemaError> {
    if variants == 0 || variants > MAX_UNION_VARIANTS {
        return Err(SchemaError::InvalidType {
            data_type: data_type.to_string(),
            reason: format!("union must declare 1..={MAX_UNION_VARIANTS} variants"),
        });
    }
    Ok(())
}

impl From<PrimitiveKind> for DataType {
    fn from(kind: PrimitiveKind) -> Self {
        DataType::Primitive(kind)
    }
}

impl From<StructType> for DataType {
    fn from(fields: StructType) -> Self {
        DataType::Struct(fields)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Primitive(kind) => write!(f, "{kind}"),
            DataType::Struct(fields) => write!(f, "{fields}"),
            DataType::List(element) => write!(f, "array<{element}>"),
            DataType::Map(key, value) => write!(f, "map<{key},{value}>"),
            DataType::Union(variants) => {
                f.write_str("uniontype<")?;
                for (idx, variant) in variants.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{variant}")?;
                }
                f.write_str(">")
            }
        }
    }
}

/// One named field of a [`StructType`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructField {
    name: String,
    data_type: DataType,
}

impl StructField {
    /// Creates a field; the name is kept as declared.
    pub fn new(name: impl Into<String>, data_type: impl Into<DataType>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    /// Declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

/// Ordered list of uniquely named fields; also the shape of a whole row.
///
/// Names are unique ignoring case and every lookup is case-insensitive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<StructField>", into = "Vec<StructField>")]
pub struct StructType {
    fields: Vec<StructField>,
}

impl StructType {
    /// Creates a struct, rejecting blank and case-insensitively duplicated names.
    pub fn try_new(fields: Vec<StructField>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(SchemaError::BlankColumn);
            }
            if !seen.insert(field.name.to_lowercase()) {
                return Err(SchemaError::DuplicateColumn(field.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    /// Starts a column-at-a-time builder.
    #[must_use]
    pub fn builder() -> StructTypeBuilder {
        StructTypeBuilder::default()
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the struct has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The field at `ordinal`.
    #[must_use]
    pub fn field(&self, ordinal: usize) -> Option<&StructField> {
        self.fields.get(ordinal)
    }

    /// Ordinal of the field called `name`, ignoring case.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let needle = name.to_lowercase();
        self.fields
            .iter()
            .position(|field| field.name.to_lowercase() == needle)
    }

    /// The field called `name`, ignoring case, with its ordinal.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<(usize, &StructField)> {
        self.index_of(name)
            .map(|ordinal| (ordinal, &self.fields[ordinal]))
    }

    /// Declared field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(StructField::name)
    }

    /// Validates every field's descriptor.
    pub fn validate(&self) -> Result<(), SchemaError> {
        self.fields
            .iter()
            .try_for_each(|field| field.data_type.validate())
    }
}

impl TryFrom<Vec<StructField>> for StructType {
    type Error = SchemaError;

    fn try_from(fields: Vec<StructField>) -> Result<Self, Self::Error> {
        StructType::try_new(fields)
    }
}

impl From<StructType> for Vec<StructField> {
    fn from(value: StructType) -> Self {
        value.fields
    }
}

impl fmt::Display for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("struct<")?;
        for (idx, field) in self.fields.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", field.name, field.data_type)?;
        }
        f.write_str(">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_hive_names() {
        let schema = StructType::builder()
            .column("a", PrimitiveKind::String)
            .column("b", PrimitiveKind::Long)
            .column("c", DataType::list(PrimitiveKind::Decimal { precision: 10, scale: 2 }))
            .column(
                "d",
                DataType::map(PrimitiveKind::Varchar(8), DataType::union([
                    PrimitiveKind::Int,
                    PrimitiveKind::Char(3),
                ])),
            )
            .build()
            .expect("schema");
        assert_eq!(
            schema.to_string(),
            "struct<a:string,b:bigint,c:array<decimal(10,2)>,d:map<varchar(8),uniontype<int,char(3)>>>"
        );
    }

    #[test]
    fn lookups_ignore_case() {
        let schema = StructType::builder()
            .column("Name", PrimitiveKind::String)
            .column("AGE", PrimitiveKind::Int)
            .build()
            .expect("schema");
        assert_eq!(schema.index_of("name"), Some(0));
        assert_eq!(schema.index_of("age"), Some(1));
        assert_eq!(schema.index_of("missing"), None);
        let (ordinal, field) = schema.field_by_name("nAmE").expect("field");
        assert_eq!(ordinal, 0);
        assert_eq!(field.name(), "Name");
    }

    #[test]
    fn try_new_rejects_case_insensitive_duplicates() {
        let err = StructType::try_new(vec![
            StructField::new("A", PrimitiveKind::String),
            StructField::new("a", PrimitiveKind::Long),
        ])
        .expect_err("duplicate");
        assert!(matches!(err, SchemaError::DuplicateColumn(name) if name == "a"));
    }

    #[test]
    fn validate_checks_parameter_ranges() {
        let invalid = [
            DataType::from(PrimitiveKind::Decimal {
                precision: 0,
                scale: 0,
            }),
            DataType::from(PrimitiveKind::Decimal {
                precision: 39,
                scale: 2,
            }),
            DataType::from(PrimitiveKind::Decimal {
                precision: 4,
                scale: 5,
            }),
            DataType::from(PrimitiveKind::Char(0)),
            DataType::from(PrimitiveKind::Char(256)),
            DataType::from(PrimitiveKind::Varchar(65_536)),
            DataType::Union(Vec::new()),
            DataType::list(PrimitiveKind::Char(0)),
        ];
        for data_type in invalid {
            assert!(
                matches!(data_type.validate(), Err(SchemaError::InvalidType { .. })),
                "{data_type} should be rejected"
            );
        }
        DataType::from(PrimitiveKind::Decimal {
            precision: 38,
            scale: 38,
        })
        .validate()
        .expect("max decimal");
    }

    #[test]
    fn deserialize_revalidates_names() {
        let json = r#"[{"name":"x","data_type":{"Primitive":"Int"}},{"name":"X","data_type":{"Primitive":"Long"}}]"#;
        assert!(serde_json::from_str::<StructType>(json).is_err());

        let schema = StructType::builder()
            .column("x", PrimitiveKind::Int)
            .build()
            .expect("schema");
        let encoded = serde_json::to_string(&schema).expect("encode");
        let decoded: StructType = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, schema);
    }
}
