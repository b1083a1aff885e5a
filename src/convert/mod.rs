//! Bidirectional converters between [`NativeValue`] and [`StoredValue`].
//!
//! A converter tree is built once per column from its [`DataType`] by a
//! [`ConverterFactory`] and then reused for every row. Composite converters
//! own their children for their whole lifetime.

mod error;
mod nested;
mod primitive;

use std::fmt;

pub use error::ConvertError;
pub use nested::{ListConverter, MapConverter, StructConverter, UnionConverter};
pub use primitive::{
    BinaryConverter, BooleanConverter, ByteConverter, CharConverter, DateConverter,
    DecimalConverter, DoubleConverter, FloatConverter, IntConverter, LongConverter,
    ShortConverter, StringConverter, TimestampConverter, VarcharConverter,
};

use crate::{
    types::{check_union_arity, DataType, SchemaError},
    value::{NativeValue, StoredValue},
};

/// Converts values of one [`DataType`] node between the two domains.
///
/// Implementors only handle non-null inputs; [`Converter::to_stored`] and
/// [`Converter::to_native`] map null to null without calling them.
pub trait Converter: fmt::Debug + Send + Sync {
    /// Converts a non-null native value into its stored form.
    fn to_stored_value(&self, value: &NativeValue) -> Result<StoredValue, ConvertError>;

    /// Converts a non-null stored value into its native form.
    fn to_native_value(&self, value: &StoredValue) -> Result<NativeValue, ConvertError>;

    /// Null-aware [`Converter::to_stored_value`].
    fn to_stored(&self, value: &NativeValue) -> Result<StoredValue, ConvertError> {
        if value.is_null() {
            return Ok(StoredValue::Null);
        }
        self.to_stored_value(value)
    }

    /// Null-aware [`Converter::to_native_value`].
    fn to_native(&self, value: &StoredValue) -> Result<NativeValue, ConvertError> {
        if value.is_null() {
            return Ok(NativeValue::Null);
        }
        self.to_native_value(value)
    }
}

/// Builds converter trees from type descriptors.
///
/// Custom factories can override individual kinds and hand everything else to
/// [`build_with`], which asks the factory again for every child so overrides
/// apply at any depth.
pub trait ConverterFactory: fmt::Debug + Send + Sync {
    /// Builds the converter for `data_type`; invalid descriptors fail here,
    /// never at first use.
    fn build(&self, data_type: &DataType) -> Result<Box<dyn Converter>, SchemaError>;
}

/// The stock factory: one converter per primitive kind plus the composite
/// converters in this module.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConverterFactory;

impl ConverterFactory for DefaultConverterFactory {
    fn build(&self, data_type: &DataType) -> Result<Box<dyn Converter>, SchemaError> {
        build_with(self, data_type)
    }
}

/// Builds the converter for `data_type`, asking `factory` for every child.
pub fn build_with(
    factory: &dyn ConverterFactory,
    data_type: &DataType,
) -> Result<Box<dyn Converter>, SchemaError> {
    match data_type {
        DataType::Primitive(kind) => {
            kind.validate()?;
            Ok(primitive::primitive_converter(*kind))
        }
        DataType::Struct(fields) => {
            let children = fields
                .fields()
                .iter()
                .map(|field| factory.build(field.data_type()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Box::new(StructConverter::new(children)))
        }
        DataType::List(element) => Ok(Box::new(ListConverter::new(factory.build(element)?))),
        DataType::Map(key, value) => Ok(Box::new(MapConverter::new(
            factory.build(key)?,
            factory.build(value)?,
        ))),
        DataType::Union(variants) => {
            check_union_arity(data_type, variants.len())?;
            let children = variants
                .iter()
                .map(|variant| factory.build(variant))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Box::new(UnionConverter::new(children)))
        }
    }
}
