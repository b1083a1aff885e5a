//! The two value domains converters translate between.
//!
//! [`NativeValue`] is what application code reads and writes. [`StoredValue`]
//! is what the columnar storage layer holds in a row. Both are totally ordered
//! so they can key maps; nulls sort first and values of different kinds sort
//! by kind.

mod decimal;
mod text;

use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fmt,
    hash::{Hash, Hasher},
};

use chrono::{NaiveDate, NaiveDateTime};
pub use decimal::{Decimal, DecimalError, MAX_SCALE};
pub use text::CharString;

/// A value in the application-facing domain.
#[derive(Debug, Clone)]
pub enum NativeValue {
    /// Null is less than any non-Null value
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Decimal(Decimal),
    /// Ordered sequence; also the native shape of a struct.
    List(Vec<NativeValue>),
    Map(BTreeMap<NativeValue, NativeValue>),
}

impl NativeValue {
    /// Check if the value is null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    /// Short name of the value's kind, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            NativeValue::Null => "null",
            NativeValue::Boolean(_) => "boolean",
            NativeValue::Byte(_) => "byte",
            NativeValue::Short(_) => "short",
            NativeValue::Int(_) => "int",
            NativeValue::Long(_) => "long",
            NativeValue::Float(_) => "float",
            NativeValue::Double(_) => "double",
            NativeValue::String(_) => "string",
            NativeValue::Binary(_) => "binary",
            NativeValue::Date(_) => "date",
            NativeValue::Timestamp(_) => "timestamp",
            NativeValue::Decimal(_) => "decimal",
            NativeValue::List(_) => "list",
            NativeValue::Map(_) => "map",
        }
    }

    /// The text, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(value) => Some(value),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            NativeValue::Null => 0,
            NativeValue::Boolean(_) => 1,
            NativeValue::Byte(_) => 2,
            NativeValue::Short(_) => 3,
            NativeValue::Int(_) => 4,
            NativeValue::Long(_) => 5,
            NativeValue::Float(_) => 6,
            NativeValue::Double(_) => 7,
            NativeValue::String(_) => 8,
            NativeValue::Binary(_) => 9,
            NativeValue::Date(_) => 10,
            NativeValue::Timestamp(_) => 11,
            NativeValue::Decimal(_) => 12,
            NativeValue::List(_) => 13,
            NativeValue::Map(_) => 14,
        }
    }
}

impl PartialEq for NativeValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NativeValue {}

impl PartialOrd for NativeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NativeValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NativeValue::Null, NativeValue::Null) => Ordering::Equal,
            (NativeValue::Boolean(a), NativeValue::Boolean(b)) => a.cmp(b),
            (NativeValue::Byte(a), NativeValue::Byte(b)) => a.cmp(b),
            (NativeValue::Short(a), NativeValue::Short(b)) => a.cmp(b),
            (NativeValue::Int(a), NativeValue::Int(b)) => a.cmp(b),
            (NativeValue::Long(a), NativeValue::Long(b)) => a.cmp(b),
            (NativeValue::Float(a), NativeValue::Float(b)) => a.total_cmp(b),
            (NativeValue::Double(a), NativeValue::Double(b)) => a.total_cmp(b),
            (NativeValue::String(a), NativeValue::String(b)) => a.cmp(b),
            (NativeValue::Binary(a), NativeValue::Binary(b)) => a.cmp(b),
            (NativeValue::Date(a), NativeValue::Date(b)) => a.cmp(b),
            (NativeValue::Timestamp(a), NativeValue::Timestamp(b)) => a.cmp(b),
            (NativeValue::Decimal(a), NativeValue::Decimal(b)) => a.cmp(b),
            (NativeValue::List(a), NativeValue::List(b)) => a.cmp(b),
            (NativeValue::Map(a), NativeValue::Map(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for NativeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            NativeValue::Null => {}
            NativeValue::Boolean(v) => v.hash(state),
            NativeValue::Byte(v) => v.hash(state),
            NativeValue::Short(v) => v.hash(state),
            NativeValue::Int(v) => v.hash(state),
            NativeValue::Long(v) => v.hash(state),
            NativeValue::Float(v) => v.to_bits().hash(state),
            NativeValue::Double(v) => v.to_bits().hash(state),
            NativeValue::String(v) => v.hash(state),
            NativeValue::Binary(v) => v.hash(state),
            NativeValue::Date(v) => v.hash(state),
            NativeValue::Timestamp(v) => v.hash(state),
            NativeValue::Decimal(v) => v.hash(state),
            NativeValue::List(v) => v.hash(state),
            NativeValue::Map(v) => v.hash(state),
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Null => f.write_str("NULL"),
            NativeValue::Boolean(v) => write!(f, "{v}"),
            NativeValue::Byte(v) => write!(f, "{v}"),
            NativeValue::Short(v) => write!(f, "{v}"),
            NativeValue::Int(v) => write!(f, "{v}"),
            NativeValue::Long(v) => write!(f, "{v}"),
            NativeValue::Float(v) => write!(f, "{v}"),
            NativeValue::Double(v) => write!(f, "{v}"),
            NativeValue::String(v) => write!(f, "{v:?}"),
            NativeValue::Binary(v) => write!(f, "<{} bytes>", v.len()),
            NativeValue::Date(v) => write!(f, "{v}"),
            NativeValue::Timestamp(v) => write!(f, "{v}"),
            NativeValue::Decimal(v) => write!(f, "{v}"),
            NativeValue::List(values) => write_list(f, values),
            NativeValue::Map(entries) => write_map(f, entries),
        }
    }
}

/// A value in the storage-facing domain, as held by a [`crate::storage::StoredRow`].
#[derive(Debug, Clone)]
pub enum StoredValue {
    /// Null is less than any non-Null value
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    /// Days since 1970-01-01.
    Date(i32),
    /// Nanoseconds since 1970-01-01T00:00:00, zone-less.
    Timestamp(i64),
    /// Already at the column's scale.
    Decimal(Decimal),
    Char(CharString),
    Varchar(CharString),
    Struct(Vec<StoredValue>),
    List(Vec<StoredValue>),
    Map(BTreeMap<StoredValue, StoredValue>),
    /// `tag` is the declaration index of the variant holding `value`.
    Union {
        tag: u8,
        value: Box<StoredValue>,
    },
}

impl StoredValue {
    /// Check if the value is null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, StoredValue::Null)
    }

    /// Short name of the value's kind, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            StoredValue::Null => "null",
            StoredValue::Boolean(_) => "boolean",
            StoredValue::Byte(_) => "byte",
            StoredValue::Short(_) => "short",
            StoredValue::Int(_) => "int",
            StoredValue::Long(_) => "long",
            StoredValue::Float(_) => "float",
            StoredValue::Double(_) => "double",
            StoredValue::String(_) => "string",
            StoredValue::Binary(_) => "binary",
            StoredValue::Date(_) => "date",
            StoredValue::Timestamp(_) => "timestamp",
            StoredValue::Decimal(_) => "decimal",
            StoredValue::Char(_) => "char",
            StoredValue::Varchar(_) => "varchar",
            StoredValue::Struct(_) => "struct",
            StoredValue::List(_) => "list",
            StoredValue::Map(_) => "map",
            StoredValue::Union { .. } => "union",
        }
    }

    /// Compares two scalar values of the same kind.
    ///
    /// Returns `None` when either side is null, the kinds differ, the values
    /// are composite, or a float comparison involves NaN.
    #[must_use]
    pub fn compare(&self, other: &StoredValue) -> Option<Ordering> {
        match (self, other) {
            (StoredValue::Boolean(a), StoredValue::Boolean(b)) => Some(a.cmp(b)),
            (StoredValue::Byte(a), StoredValue::Byte(b)) => Some(a.cmp(b)),
            (StoredValue::Short(a), StoredValue::Short(b)) => Some(a.cmp(b)),
            (StoredValue::Int(a), StoredValue::Int(b)) => Some(a.cmp(b)),
            (StoredValue::Long(a), StoredValue::Long(b)) => Some(a.cmp(b)),
            (StoredValue::Float(a), StoredValue::Float(b)) => a.partial_cmp(b),
            (StoredValue::Double(a), StoredValue::Double(b)) => a.partial_cmp(b),
            (StoredValue::String(a), StoredValue::String(b)) => Some(a.cmp(b)),
            (StoredValue::Binary(a), StoredValue::Binary(b)) => Some(a.cmp(b)),
            (StoredValue::Date(a), StoredValue::Date(b)) => Some(a.cmp(b)),
            (StoredValue::Timestamp(a), StoredValue::Timestamp(b)) => Some(a.cmp(b)),
            (StoredValue::Decimal(a), StoredValue::Decimal(b)) => Some(a.cmp(b)),
            (StoredValue::Char(a), StoredValue::Char(b))
            | (StoredValue::Varchar(a), StoredValue::Varchar(b)) => {
                Some(a.value().cmp(b.value()))
            }
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            StoredValue::Null => 0,
            StoredValue::Boolean(_) => 1,
            StoredValue::Byte(_) => 2,
            StoredValue::Short(_) => 3,
            StoredValue::Int(_) => 4,
            StoredValue::Long(_) => 5,
            StoredValue::Float(_) => 6,
            StoredValue::Double(_) => 7,
            StoredValue::String(_) => 8,
            StoredValue::Binary(_) => 9,
            StoredValue::Date(_) => 10,
            StoredValue::Timestamp(_) => 11,
            StoredValue::Decimal(_) => 12,
            StoredValue::Char(_) => 13,
            StoredValue::Varchar(_) => 14,
            StoredValue::Struct(_) => 15,
            StoredValue::List(_) => 16,
            StoredValue::Map(_) => 17,
            StoredValue::Union { .. } => 18,
        }
    }
}

impl PartialEq for StoredValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StoredValue {}

impl PartialOrd for StoredValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StoredValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (StoredValue::Null, StoredValue::Null) => Ordering::Equal,
            (StoredValue::Float(a), StoredValue::Float(b)) => a.total_cmp(b),
            (StoredValue::Double(a), StoredValue::Double(b)) => a.total_cmp(b),
            (StoredValue::Char(a), StoredValue::Char(b))
            | (StoredValue::Varchar(a), StoredValue::Varchar(b)) => a.cmp(b),
            (StoredValue::Struct(a), StoredValue::Struct(b))
            | (StoredValue::List(a), StoredValue::List(b)) => a.cmp(b),
            (StoredValue::Map(a), StoredValue::Map(b)) => a.cmp(b),
            (
                StoredValue::Union { tag: a, value: x },
                StoredValue::Union { tag: b, value: y },
            ) => a.cmp(b).then_with(|| x.cmp(y)),
            _ => match self.compare(other) {
                Some(ordering) => ordering,
                None => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl Hash for StoredValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            StoredValue::Null => {}
            StoredValue::Boolean(v) => v.hash(state),
            StoredValue::Byte(v) => v.hash(state),
            StoredValue::Short(v) => v.hash(state),
            StoredValue::Int(v) => v.hash(state),
            StoredValue::Long(v) => v.hash(state),
            StoredValue::Float(v) => v.to_bits().hash(state),
            StoredValue::Double(v) => v.to_bits().hash(state),
            StoredValue::String(v) => v.hash(state),
            StoredValue::Binary(v) => v.hash(state),
            StoredValue::Date(v) => v.hash(state),
            StoredValue::Timestamp(v) => v.hash(state),
            StoredValue::Decimal(v) => v.hash(state),
            StoredValue::Char(v) | StoredValue::Varchar(v) => v.hash(state),
            StoredValue::Struct(v) | StoredValue::List(v) => v.hash(state),
            StoredValue::Map(v) => v.hash(state),
            StoredValue::Union { tag, value } => {
                tag.hash(state);
                value.hash(state);
            }
        }
    }
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredValue::Null => f.write_str("NULL"),
            StoredValue::Boolean(v) => write!(f, "{v}"),
            StoredValue::Byte(v) => write!(f, "{v}"),
            StoredValue::Short(v) => write!(f, "{v}"),
            StoredValue::Int(v) => write!(f, "{v}"),
            StoredValue::Long(v) => write!(f, "{v}"),
            StoredValue::Float(v) => write!(f, "{v}"),
            StoredValue::Double(v) => write!(f, "{v}"),
            StoredValue::String(v) => write!(f, "{v:?}"),
            StoredValue::Binary(v) => write!(f, "<{} bytes>", v.len()),
            StoredValue::Date(v) => write!(f, "date({v})"),
            StoredValue::Timestamp(v) => write!(f, "timestamp({v})"),
            StoredValue::Decimal(v) => write!(f, "{v}"),
            StoredValue::Char(v) | StoredValue::Varchar(v) => write!(f, "{:?}", v.value()),
            StoredValue::Struct(values) | StoredValue::List(values) => write_list(f, values),
            StoredValue::Map(entries) => write_map(f, entries),
            StoredValue::Union { tag, value } => write!(f, "{tag}:{value}"),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_str("]")
}

fn write_map<T: fmt::Display>(f: &mut fmt::Formatter<'_>, entries: &BTreeMap<T, T>) -> fmt::Result {
    f.write_str("{")?;
    for (idx, (key, value)) in entries.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{key}: {value}")?;
    }
    f.write_str("}")
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for NativeValue {
                fn from(value: $ty) -> Self {
                    NativeValue::$variant(value)
                }
            }

            impl From<$ty> for StoredValue {
                fn from(value: $ty) -> Self {
                    StoredValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Boolean,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => String,
    Vec<u8> => Binary,
    Decimal => Decimal,
}

impl From<&str> for NativeValue {
    fn from(value: &str) -> Self {
        NativeValue::String(value.to_owned())
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        StoredValue::String(value.to_owned())
    }
}

impl From<NaiveDate> for NativeValue {
    fn from(value: NaiveDate) -> Self {
        NativeValue::Date(value)
    }
}

impl From<NaiveDateTime> for NativeValue {
    fn from(value: NaiveDateTime) -> Self {
        NativeValue::Timestamp(value)
    }
}

impl From<Vec<NativeValue>> for NativeValue {
    fn from(values: Vec<NativeValue>) -> Self {
        NativeValue::List(values)
    }
}

impl<T: Into<NativeValue>> From<Option<T>> for NativeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(NativeValue::Null, Into::into)
    }
}

impl<T: Into<StoredValue>> From<Option<T>> for StoredValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(StoredValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sorts_first_and_kinds_do_not_mix() {
        assert!(NativeValue::Null < NativeValue::Boolean(false));
        assert_ne!(NativeValue::Int(1), NativeValue::Long(1));
        assert!(StoredValue::Null < StoredValue::Long(i64::MIN));
        assert_ne!(StoredValue::Int(1), StoredValue::Long(1));
    }

    #[test]
    fn compare_is_partial_over_scalars() {
        assert_eq!(
            StoredValue::Long(1).compare(&StoredValue::Long(2)),
            Some(Ordering::Less)
        );
        assert_eq!(StoredValue::Null.compare(&StoredValue::Null), None);
        assert_eq!(StoredValue::Long(1).compare(&StoredValue::Int(1)), None);
        assert_eq!(
            StoredValue::Double(f64::NAN).compare(&StoredValue::Double(1.0)),
            None
        );
        assert_eq!(
            StoredValue::Struct(vec![]).compare(&StoredValue::Struct(vec![])),
            None
        );
        assert_eq!(
            StoredValue::Varchar(CharString::new("abc", 5))
                .compare(&StoredValue::Varchar(CharString::new("abd", 3))),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn decimals_compare_numerically() {
        let a = StoredValue::Decimal("2.10".parse().expect("decimal"));
        let b = StoredValue::Decimal("2.1".parse().expect("decimal"));
        assert_eq!(a, b);
        assert_eq!(a.compare(&b), Some(Ordering::Equal));
    }

    #[test]
    fn values_can_key_maps() {
        let mut map = BTreeMap::new();
        map.insert(StoredValue::Double(1.5), StoredValue::from("x"));
        map.insert(StoredValue::Double(f64::NAN), StoredValue::from("nan"));
        map.insert(StoredValue::Double(1.5), StoredValue::from("y"));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&StoredValue::Double(1.5)), Some(&StoredValue::from("y")));
    }

    #[test]
    fn display_renders_nested_values() {
        let value = NativeValue::List(vec![
            NativeValue::from("a"),
            NativeValue::Null,
            NativeValue::Long(3),
        ]);
        assert_eq!(value.to_string(), r#"["a", NULL, 3]"#);
        let union = StoredValue::Union {
            tag: 1,
            value: Box::new(StoredValue::Long(7)),
        };
        assert_eq!(union.to_string(), "1:7");
    }
}
