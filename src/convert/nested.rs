//! Composite converters that recurse into child converters.

use std::collections::BTreeMap;

use super::{
    primitive::{native_mismatch, stored_mismatch},
    ConvertError, Converter,
};
use crate::value::{NativeValue, StoredValue};

/// Converts a struct positionally: the native side is an ordered list with one
/// entry per declared field.
#[derive(Debug)]
pub struct StructConverter {
    fields: Vec<Box<dyn Converter>>,
}

impl StructConverter {
    /// One child converter per field, in declaration order.
    #[must_use]
    pub fn new(fields: Vec<Box<dyn Converter>>) -> Self {
        Self { fields }
    }

    fn check_arity(&self, actual: usize) -> Result<(), ConvertError> {
        if actual != self.fields.len() {
            return Err(ConvertError::ArityMismatch {
                expected: self.fields.len(),
                actual,
            });
        }
        Ok(())
    }
}

impl Converter for StructConverter {
    fn to_stored_value(&self, value: &NativeValue) -> Result<StoredValue, ConvertError> {
        let NativeValue::List(values) = value else {
            return Err(native_mismatch(value, "struct"));
        };
        self.check_arity(values.len())?;
        self.fields
            .iter()
            .zip(values)
            .map(|(converter, value)| converter.to_stored(value))
            .collect::<Result<Vec<_>, _>>()
            .map(StoredValue::Struct)
    }

    fn to_native_value(&self, value: &StoredValue) -> Result<NativeValue, ConvertError> {
        let StoredValue::Struct(values) = value else {
            return Err(stored_mismatch(value, "struct"));
        };
        self.check_arity(values.len())?;
        self.fields
            .iter()
            .zip(values)
            .map(|(converter, value)| converter.to_native(value))
            .collect::<Result<Vec<_>, _>>()
            .map(NativeValue::List)
    }
}

/// Converts every element of a list independently.
#[derive(Debug)]
pub struct ListConverter {
    element: Box<dyn Converter>,
}

impl ListConverter {
    /// List of values converted by `element`.
    #[must_use]
    pub fn new(element: Box<dyn Converter>) -> Self {
        Self { element }
    }
}

impl Converter for ListConverter {
    fn to_stored_value(&self, value: &NativeValue) -> Result<StoredValue, ConvertError> {
        let NativeValue::List(values) = value else {
            return Err(native_mismatch(value, "list"));
        };
        values
            .iter()
            .map(|value| self.element.to_stored(value))
            .collect::<Result<Vec<_>, _>>()
            .map(StoredValue::List)
    }

    fn to_native_value(&self, value: &StoredValue) -> Result<NativeValue, ConvertError> {
        let StoredValue::List(values) = value else {
            return Err(stored_mismatch(value, "list"));
        };
        values
            .iter()
            .map(|value| self.element.to_native(value))
            .collect::<Result<Vec<_>, _>>()
            .map(NativeValue::List)
    }
}

/// Converts every key and value of a map independently.
///
/// Keys that collide after conversion keep the last entry.
#[derive(Debug)]
pub struct MapConverter {
    key: Box<dyn Converter>,
    value: Box<dyn Converter>,
}

impl MapConverter {
    /// Map whose keys and values are converted by the given converters.
    #[must_use]
    pub fn new(key: Box<dyn Converter>, value: Box<dyn Converter>) -> Self {
        Self { key, value }
    }
}

impl Converter for MapConverter {
    fn to_stored_value(&self, value: &NativeValue) -> Result<StoredValue, ConvertError> {
        let NativeValue::Map(entries) = value else {
            return Err(native_mismatch(value, "map"));
        };
        let mut stored = BTreeMap::new();
        for (key, value) in entries {
            stored.insert(self.key.to_stored(key)?, self.value.to_stored(value)?);
        }
        Ok(StoredValue::Map(stored))
    }

    fn to_native_value(&self, value: &StoredValue) -> Result<NativeValue, ConvertError> {
        let StoredValue::Map(entries) = value else {
            return Err(stored_mismatch(value, "map"));
        };
        let mut native = BTreeMap::new();
        for (key, value) in entries {
            native.insert(self.key.to_native(key)?, self.value.to_native(value)?);
        }
        Ok(NativeValue::Map(native))
    }
}

/// Converts a tagged union.
///
/// Writing tries each variant in declaration order and keeps the first one
/// that accepts the value, so a value several variants accept always lands in
/// the earliest of them. Only a type mismatch moves on to the next variant;
/// any other failure of a variant is the union's failure. Reading dispatches
/// on the stored tag.
#[derive(Debug)]
pub struct UnionConverter {
    variants: Vec<Box<dyn Converter>>,
}

impl UnionConverter {
    /// One child converter per variant, in declaration order.
    #[must_use]
    pub fn new(variants: Vec<Box<dyn Converter>>) -> Self {
        Self { variants }
    }
}

impl Converter for UnionConverter {
    fn to_stored_value(&self, value: &NativeValue) -> Result<StoredValue, ConvertError> {
        for (tag, variant) in self.variants.iter().enumerate() {
            let Ok(tag) = u8::try_from(tag) else {
                break;
            };
            match variant.to_stored(value) {
                Ok(stored) => {
                    return Ok(StoredValue::Union {
                        tag,
                        value: Box::new(stored),
                    })
                }
                Err(ConvertError::TypeMismatch { .. }) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(native_mismatch(value, "union"))
    }

    fn to_native_value(&self, value: &StoredValue) -> Result<NativeValue, ConvertError> {
        let StoredValue::Union { tag, value } = value else {
            return Err(stored_mismatch(value, "union"));
        };
        let variant = self
            .variants
            .get(usize::from(*tag))
            .ok_or(ConvertError::UnknownUnionTag {
                tag: *tag,
                variants: self.variants.len(),
            })?;
        variant.to_native(value)
    }
}
