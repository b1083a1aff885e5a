//! Conversions between rowbridge descriptors/rows and Arrow schemas/arrays.
//!
//! `char(n)` and `varchar(n)` have no Arrow counterpart; they travel as `Utf8`
//! fields tagged with [`TYPE_METADATA_KEY`] and [`LENGTH_METADATA_KEY`].
//! Unions map to dense Arrow unions whose type ids are the variant indices.

use std::{collections::HashMap, sync::Arc};

use arrow::{
    array::{
        Array, ArrayRef, BinaryArray, BooleanArray, Date32Array, Decimal128Array, Float32Array,
        Float64Array, Int16Array, Int32Array, Int64Array, Int8Array, LargeBinaryArray,
        LargeStringArray, ListArray, MapArray, StringArray, StructArray,
        TimestampNanosecondArray, UnionArray,
    },
    buffer::{NullBuffer, OffsetBuffer, ScalarBuffer},
    datatypes::{
        DataType as ArrowDataType, Field, Fields, Schema as ArrowSchema, TimeUnit, UnionFields,
        UnionMode,
    },
    record_batch::{RecordBatch, RecordBatchOptions},
};

use super::{StorageError, StoredRow};
use crate::{
    types::{DataType, PrimitiveKind, StructField, StructType},
    value::{CharString, Decimal, StoredValue},
};

/// Field metadata key naming the bounded text kind (`char` or `varchar`).
pub const TYPE_METADATA_KEY: &str = "rowbridge.type";
/// Field metadata key carrying the declared length of bounded text.
pub const LENGTH_METADATA_KEY: &str = "rowbridge.max_length";

const LIST_ITEM: &str = "element";
const MAP_ENTRIES: &str = "key_value";
const MAP_KEY: &str = "key";
const MAP_VALUE: &str = "value";
/// Arrow union type ids are non-negative `i8`s.
const MAX_ARROW_UNION_VARIANTS: usize = 128;

static NULL_VALUE: StoredValue = StoredValue::Null;

/// Converts a row schema into an Arrow schema; every field is nullable.
pub fn to_arrow_schema(schema: &StructType) -> Result<ArrowSchema, StorageError> {
    Ok(ArrowSchema::new(struct_fields(schema)?))
}

/// Converts one named column into an Arrow field.
pub fn to_arrow_field(name: &str, data_type: &DataType) -> Result<Field, StorageError> {
    arrow_field(name, data_type, true)
}

fn arrow_field(name: &str, data_type: &DataType, nullable: bool) -> Result<Field, StorageError> {
    let field = Field::new(name, to_arrow_type(data_type)?, nullable);
    let bounded = match data_type {
        DataType::Primitive(PrimitiveKind::Char(length)) => Some(("char", length)),
        DataType::Primitive(PrimitiveKind::Varchar(length)) => Some(("varchar", length)),
        _ => None,
    };
    Ok(match bounded {
        Some((kind, length)) => field.with_metadata(HashMap::from([
            (TYPE_METADATA_KEY.to_owned(), kind.to_owned()),
            (LENGTH_METADATA_KEY.to_owned(), length.to_string()),
        ])),
        None => field,
    })
}

/// Converts a descriptor into the Arrow type used to hold it.
pub fn to_arrow_type(data_type: &DataType) -> Result<ArrowDataType, StorageError> {
    Ok(match data_type {
        DataType::Primitive(kind) => match kind {
            PrimitiveKind::String | PrimitiveKind::Char(_) | PrimitiveKind::Varchar(_) => {
                ArrowDataType::Utf8
            }
            PrimitiveKind::Boolean => ArrowDataType::Boolean,
            PrimitiveKind::Byte => ArrowDataType::Int8,
            PrimitiveKind::Short => ArrowDataType::Int16,
            PrimitiveKind::Int => ArrowDataType::Int32,
            PrimitiveKind::Long => ArrowDataType::Int64,
            PrimitiveKind::Float => ArrowDataType::Float32,
            PrimitiveKind::Double => ArrowDataType::Float64,
            PrimitiveKind::Binary => ArrowDataType::Binary,
            PrimitiveKind::Date => ArrowDataType::Date32,
            PrimitiveKind::Timestamp => ArrowDataType::Timestamp(TimeUnit::Nanosecond, None),
            PrimitiveKind::Decimal { precision, scale } => {
                // scale <= precision <= 38
                ArrowDataType::Decimal128(*precision, *scale as i8)
            }
        },
        DataType::Struct(fields) => ArrowDataType::Struct(struct_fields(fields)?),
        DataType::List(element) => {
            ArrowDataType::List(Arc::new(to_arrow_field(LIST_ITEM, element)?))
        }
        DataType::Map(key, value) => {
            ArrowDataType::Map(Arc::new(map_entries_field(key, value)?), false)
        }
        DataType::Union(variants) => {
            ArrowDataType::Union(union_fields(data_type, variants)?, UnionMode::Dense)
        }
    })
}

fn struct_fields(schema: &StructType) -> Result<Fields, StorageError> {
    schema
        .fields()
        .iter()
        .map(|field| to_arrow_field(field.name(), field.data_type()))
        .collect::<Result<Vec<_>, _>>()
        .map(Fields::from)
}

fn map_entry_fields(key: &DataType, value: &DataType) -> Result<Fields, StorageError> {
    Ok(Fields::from(vec![
        arrow_field(MAP_KEY, key, false)?,
        arrow_field(MAP_VALUE, value, true)?,
    ]))
}

fn map_entries_field(key: &DataType, value: &DataType) -> Result<Field, StorageError> {
    Ok(Field::new(
        MAP_ENTRIES,
        ArrowDataType::Struct(map_entry_fields(key, value)?),
        false,
    ))
}

fn union_fields(data_type: &DataType, variants: &[DataType]) -> Result<UnionFields, StorageError> {
    if variants.len() > MAX_ARROW_UNION_VARIANTS {
        return Err(StorageError::Unsupported(format!(
            "{data_type} has more than {MAX_ARROW_UNION_VARIANTS} variants"
        )));
    }
    let fields = variants
        .iter()
        .enumerate()
        .map(|(idx, variant)| to_arrow_field(&format!("_{idx}"), variant))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(UnionFields::new(0..fields.len() as i8, fields))
}

/// Converts an Arrow schema (for example one read from a file footer) into a
/// row schema.
pub fn from_arrow_schema(schema: &ArrowSchema) -> Result<StructType, StorageError> {
    struct_from_fields(schema.fields())
}

fn struct_from_fields(fields: &Fields) -> Result<StructType, StorageError> {
    let fields = fields
        .iter()
        .map(|field| Ok(StructField::new(field.name().clone(), from_arrow_field(field)?)))
        .collect::<Result<Vec<_>, StorageError>>()?;
    Ok(StructType::try_new(fields)?)
}

/// Converts an Arrow field into the descriptor it holds.
pub fn from_arrow_field(field: &Field) -> Result<DataType, StorageError> {
    let unsupported = || {
        StorageError::Unsupported(format!(
            "arrow type {} of field '{}'",
            field.data_type(),
            field.name()
        ))
    };
    let kind = match field.data_type() {
        ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 => bounded_text_kind(field)?,
        ArrowDataType::Boolean => PrimitiveKind::Boolean,
        ArrowDataType::Int8 => PrimitiveKind::Byte,
        ArrowDataType::Int16 => PrimitiveKind::Short,
        ArrowDataType::Int32 => PrimitiveKind::Int,
        ArrowDataType::Int64 => PrimitiveKind::Long,
        ArrowDataType::Float32 => PrimitiveKind::Float,
        ArrowDataType::Float64 => PrimitiveKind::Double,
        ArrowDataType::Binary | ArrowDataType::LargeBinary => PrimitiveKind::Binary,
        ArrowDataType::Date32 => PrimitiveKind::Date,
        ArrowDataType::Timestamp(TimeUnit::Nanosecond, None) => PrimitiveKind::Timestamp,
        ArrowDataType::Decimal128(precision, scale) => PrimitiveKind::Decimal {
            precision: *precision,
            scale: u8::try_from(*scale).map_err(|_| unsupported())?,
        },
        ArrowDataType::Struct(children) => return Ok(DataType::Struct(struct_from_fields(children)?)),
        ArrowDataType::List(item) => return Ok(DataType::list(from_arrow_field(item)?)),
        ArrowDataType::Map(entries, _) => {
            let ArrowDataType::Struct(key_value) = entries.data_type() else {
                return Err(unsupported());
            };
            if key_value.len() != 2 {
                return Err(unsupported());
            }
            return Ok(DataType::map(
                from_arrow_field(&key_value[0])?,
                from_arrow_field(&key_value[1])?,
            ));
        }
        ArrowDataType::Union(fields, UnionMode::Dense) => {
            let mut variants = Vec::with_capacity(fields.len());
            for (idx, (type_id, variant)) in fields.iter().enumerate() {
                if usize::try_from(type_id).ok() != Some(idx) {
                    return Err(unsupported());
                }
                variants.push(from_arrow_field(variant)?);
            }
            return Ok(DataType::Union(variants));
        }
        _ => return Err(unsupported()),
    };
    Ok(DataType::Primitive(kind))
}

fn bounded_text_kind(field: &Field) -> Result<PrimitiveKind, StorageError> {
    let metadata = field.metadata();
    let Some(kind) = metadata.get(TYPE_METADATA_KEY) else {
        return Ok(PrimitiveKind::String);
    };
    let length = metadata
        .get(LENGTH_METADATA_KEY)
        .and_then(|length| length.parse::<u32>().ok())
        .ok_or_else(|| {
            StorageError::Unsupported(format!(
                "field '{}' is tagged {kind} without a valid length",
                field.name()
            ))
        })?;
    match kind.as_str() {
        "char" => Ok(PrimitiveKind::Char(length)),
        "varchar" => Ok(PrimitiveKind::Varchar(length)),
        other => Err(StorageError::Unsupported(format!(
            "field '{}' has unknown text kind {other}",
            field.name()
        ))),
    }
}

/// Builds a record batch holding `rows`, laid out by `schema`.
pub fn rows_to_batch(schema: &StructType, rows: &[StoredRow]) -> Result<RecordBatch, StorageError> {
    let arrow_schema = Arc::new(to_arrow_schema(schema)?);
    let columns = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(ordinal, field)| {
            let values: Vec<&StoredValue> = rows
                .iter()
                .map(|row| row.get(ordinal).unwrap_or(&NULL_VALUE))
                .collect();
            build_array(field.name(), field.data_type(), &values)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    Ok(RecordBatch::try_new_with_options(
        arrow_schema,
        columns,
        &options,
    )?)
}

/// Reads every row of `batch`, whose columns follow `schema` one to one.
pub fn batch_to_rows(schema: &StructType, batch: &RecordBatch) -> Result<Vec<StoredRow>, StorageError> {
    let ordinals: Vec<usize> = (0..schema.len()).collect();
    (0..batch.num_rows())
        .map(|index| {
            let mut row = StoredRow::for_schema(schema);
            read_row(schema, batch, &ordinals, index, &mut row)?;
            Ok(row)
        })
        .collect()
}

/// Overwrites `row` with row `index` of `batch`.
///
/// Batch column `k` holds schema column `ordinals[k]`; slots of columns the
/// batch does not carry are set to null.
pub fn read_row(
    schema: &StructType,
    batch: &RecordBatch,
    ordinals: &[usize],
    index: usize,
    row: &mut StoredRow,
) -> Result<(), StorageError> {
    if row.len() != schema.len() {
        *row = StoredRow::for_schema(schema);
    } else {
        row.clear();
    }
    for (column, ordinal) in batch.columns().iter().zip(ordinals) {
        let Some(field) = schema.field(*ordinal) else {
            continue;
        };
        row.set(*ordinal, value_at(field.data_type(), column.as_ref(), index)?);
    }
    Ok(())
}

fn invalid_value(path: &str, data_type: &DataType, value: &StoredValue) -> StorageError {
    StorageError::InvalidValue {
        column: path.to_owned(),
        expected: data_type.to_string(),
        actual: value.kind_name(),
    }
}

fn validity(values: &[&StoredValue]) -> Option<NullBuffer> {
    values
        .iter()
        .any(|value| value.is_null())
        .then(|| NullBuffer::from(values.iter().map(|value| !value.is_null()).collect::<Vec<_>>()))
}

macro_rules! scalar_array {
    ($array:ty, $path:expr, $data_type:expr, $values:expr, $pattern:pat => $out:expr) => {{
        let items = $values
            .iter()
            .map(|value| match value {
                StoredValue::Null => Ok(None),
                $pattern => Ok(Some($out)),
                other => Err(invalid_value($path, $data_type, other)),
            })
            .collect::<Result<Vec<_>, StorageError>>()?;
        Arc::new(<$array>::from(items)) as ArrayRef
    }};
}

fn build_array(
    path: &str,
    data_type: &DataType,
    values: &[&StoredValue],
) -> Result<ArrayRef, StorageError> {
    let array = match data_type {
        DataType::Primitive(kind) => match kind {
            PrimitiveKind::String => {
                scalar_array!(StringArray, path, data_type, values, StoredValue::String(v) => v.as_str())
            }
            PrimitiveKind::Char(_) => {
                scalar_array!(StringArray, path, data_type, values, StoredValue::Char(v) => v.value())
            }
            PrimitiveKind::Varchar(_) => {
                scalar_array!(StringArray, path, data_type, values, StoredValue::Varchar(v) => v.value())
            }
            PrimitiveKind::Boolean => {
                scalar_array!(BooleanArray, path, data_type, values, StoredValue::Boolean(v) => *v)
            }
            PrimitiveKind::Byte => {
                scalar_array!(Int8Array, path, data_type, values, StoredValue::Byte(v) => *v)
            }
            PrimitiveKind::Short => {
                scalar_array!(Int16Array, path, data_type, values, StoredValue::Short(v) => *v)
            }
            PrimitiveKind::Int => {
                scalar_array!(Int32Array, path, data_type, values, StoredValue::Int(v) => *v)
            }
            PrimitiveKind::Long => {
                scalar_array!(Int64Array, path, data_type, values, StoredValue::Long(v) => *v)
            }
            PrimitiveKind::Float => {
                scalar_array!(Float32Array, path, data_type, values, StoredValue::Float(v) => *v)
            }
            PrimitiveKind::Double => {
                scalar_array!(Float64Array, path, data_type, values, StoredValue::Double(v) => *v)
            }
            PrimitiveKind::Binary => {
                scalar_array!(BinaryArray, path, data_type, values, StoredValue::Binary(v) => v.as_slice())
            }
            PrimitiveKind::Date => {
                scalar_array!(Date32Array, path, data_type, values, StoredValue::Date(v) => *v)
            }
            PrimitiveKind::Timestamp => {
                scalar_array!(TimestampNanosecondArray, path, data_type, values, StoredValue::Timestamp(v) => *v)
            }
            PrimitiveKind::Decimal { precision, scale } => {
                let items = values
                    .iter()
                    .map(|value| match value {
                        StoredValue::Null => Ok(None),
                        StoredValue::Decimal(decimal) => decimal
                            .rescale(*scale)
                            .map(|decimal| Some(decimal.unscaled()))
                            .ok_or_else(|| invalid_value(path, data_type, value)),
                        other => Err(invalid_value(path, data_type, other)),
                    })
                    .collect::<Result<Vec<_>, StorageError>>()?;
                Arc::new(
                    Decimal128Array::from(items).with_precision_and_scale(*precision, *scale as i8)?,
                ) as ArrayRef
            }
        },
        DataType::Struct(struct_type) => {
            if struct_type.is_empty() {
                return Err(StorageError::Unsupported(format!(
                    "column '{path}' is a struct without fields"
                )));
            }
            if let Some(other) = values
                .iter()
                .find(|value| !matches!(value, StoredValue::Null | StoredValue::Struct(_)))
            {
                return Err(invalid_value(path, data_type, other));
            }
            let mut columns = Vec::with_capacity(struct_type.len());
            for (idx, field) in struct_type.fields().iter().enumerate() {
                let children: Vec<&StoredValue> = values
                    .iter()
                    .map(|value| match value {
                        StoredValue::Struct(children) => children.get(idx).unwrap_or(&NULL_VALUE),
                        _ => &NULL_VALUE,
                    })
                    .collect();
                columns.push(build_array(
                    &format!("{path}.{}", field.name()),
                    field.data_type(),
                    &children,
                )?);
            }
            Arc::new(StructArray::try_new(
                struct_fields(struct_type)?,
                columns,
                validity(values),
            )?) as ArrayRef
        }
        DataType::List(element) => {
            let mut lengths = Vec::with_capacity(values.len());
            let mut items: Vec<&StoredValue> = Vec::new();
            for value in values {
                match value {
                    StoredValue::List(children) => {
                        lengths.push(children.len());
                        items.extend(children.iter());
                    }
                    StoredValue::Null => lengths.push(0),
                    other => return Err(invalid_value(path, data_type, other)),
                }
            }
            let child = build_array(&format!("{path}[]"), element, &items)?;
            Arc::new(ListArray::try_new(
                Arc::new(to_arrow_field(LIST_ITEM, element)?),
                OffsetBuffer::from_lengths(lengths),
                child,
                validity(values),
            )?) as ArrayRef
        }
        DataType::Map(key, value_type) => {
            let mut lengths = Vec::with_capacity(values.len());
            let mut keys: Vec<&StoredValue> = Vec::new();
            let mut items: Vec<&StoredValue> = Vec::new();
            for value in values {
                match value {
                    StoredValue::Map(entries) => {
                        lengths.push(entries.len());
                        for (entry_key, entry_value) in entries {
                            if entry_key.is_null() {
                                return Err(invalid_value(
                                    &format!("{path}.{MAP_KEY}"),
                                    key,
                                    entry_key,
                                ));
                            }
                            keys.push(entry_key);
                            items.push(entry_value);
                        }
                    }
                    StoredValue::Null => lengths.push(0),
                    other => return Err(invalid_value(path, data_type, other)),
                }
            }
            let entries = StructArray::try_new(
                map_entry_fields(key, value_type)?,
                vec![
                    build_array(&format!("{path}.{MAP_KEY}"), key, &keys)?,
                    build_array(&format!("{path}.{MAP_VALUE}"), value_type, &items)?,
                ],
                None,
            )?;
            Arc::new(MapArray::try_new(
                Arc::new(map_entries_field(key, value_type)?),
                OffsetBuffer::from_lengths(lengths),
                entries,
                validity(values),
                false,
            )?) as ArrayRef
        }
        DataType::Union(variants) => {
            let fields = union_fields(data_type, variants)?;
            let mut type_ids = Vec::with_capacity(values.len());
            let mut offsets = Vec::with_capacity(values.len());
            let mut children: Vec<Vec<&StoredValue>> = vec![Vec::new(); variants.len()];
            for value in values {
                // Dense unions carry no validity; a null row is a null in variant 0.
                let (tag, inner) = match value {
                    StoredValue::Union { tag, value } => (*tag, &**value),
                    StoredValue::Null => (0, &NULL_VALUE),
                    other => return Err(invalid_value(path, data_type, other)),
                };
                let bucket = children
                    .get_mut(usize::from(tag))
                    .ok_or_else(|| invalid_value(path, data_type, value))?;
                let offset = i32::try_from(bucket.len()).map_err(|_| {
                    StorageError::Unsupported(format!("column '{path}' has too many union values"))
                })?;
                type_ids.push(tag as i8);
                offsets.push(offset);
                bucket.push(inner);
            }
            let arrays = variants
                .iter()
                .zip(&children)
                .enumerate()
                .map(|(idx, (variant, items))| build_array(&format!("{path}<{idx}>"), variant, items))
                .collect::<Result<Vec<_>, _>>()?;
            Arc::new(UnionArray::try_new(
                fields,
                ScalarBuffer::from(type_ids),
                Some(ScalarBuffer::from(offsets)),
                arrays,
            )?) as ArrayRef
        }
    };
    Ok(array)
}

fn downcast<'a, T: 'static>(array: &'a dyn Array, data_type: &DataType) -> Result<&'a T, StorageError> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        StorageError::Unsupported(format!(
            "arrow array of type {} cannot hold {data_type}",
            array.data_type()
        ))
    })
}

fn text_at(array: &dyn Array, data_type: &DataType, index: usize) -> Result<String, StorageError> {
    if let Some(strings) = array.as_any().downcast_ref::<StringArray>() {
        return Ok(strings.value(index).to_owned());
    }
    Ok(downcast::<LargeStringArray>(array, data_type)?
        .value(index)
        .to_owned())
}

/// Reads the value at `index` of `array`, which holds `data_type`.
pub fn value_at(data_type: &DataType, array: &dyn Array, index: usize) -> Result<StoredValue, StorageError> {
    if array.is_null(index) {
        return Ok(StoredValue::Null);
    }
    let value = match data_type {
        DataType::Primitive(kind) => match kind {
            PrimitiveKind::String => StoredValue::String(text_at(array, data_type, index)?),
            PrimitiveKind::Char(length) => {
                StoredValue::Char(CharString::new(text_at(array, data_type, index)?, *length))
            }
            PrimitiveKind::Varchar(length) => {
                StoredValue::Varchar(CharString::new(text_at(array, data_type, index)?, *length))
            }
            PrimitiveKind::Boolean => {
                StoredValue::Boolean(downcast::<BooleanArray>(array, data_type)?.value(index))
            }
            PrimitiveKind::Byte => {
                StoredValue::Byte(downcast::<Int8Array>(array, data_type)?.value(index))
            }
            PrimitiveKind::Short => {
                StoredValue::Short(downcast::<Int16Array>(array, data_type)?.value(index))
            }
            PrimitiveKind::Int => {
                StoredValue::Int(downcast::<Int32Array>(array, data_type)?.value(index))
            }
            PrimitiveKind::Long => {
                StoredValue::Long(downcast::<Int64Array>(array, data_type)?.value(index))
            }
            PrimitiveKind::Float => {
                StoredValue::Float(downcast::<Float32Array>(array, data_type)?.value(index))
            }
            PrimitiveKind::Double => {
                StoredValue::Double(downcast::<Float64Array>(array, data_type)?.value(index))
            }
            PrimitiveKind::Binary => match array.as_any().downcast_ref::<BinaryArray>() {
                Some(binary) => StoredValue::Binary(binary.value(index).to_vec()),
                None => StoredValue::Binary(
                    downcast::<LargeBinaryArray>(array, data_type)?
                        .value(index)
                        .to_vec(),
                ),
            },
            PrimitiveKind::Date => {
                StoredValue::Date(downcast::<Date32Array>(array, data_type)?.value(index))
            }
            PrimitiveKind::Timestamp => StoredValue::Timestamp(
                downcast::<TimestampNanosecondArray>(array, data_type)?.value(index),
            ),
            PrimitiveKind::Decimal { scale, .. } => {
                let unscaled = downcast::<Decimal128Array>(array, data_type)?.value(index);
                let decimal = Decimal::try_new(unscaled, *scale)
                    .map_err(|err| StorageError::Unsupported(err.to_string()))?;
                StoredValue::Decimal(decimal)
            }
        },
        DataType::Struct(struct_type) => {
            let array = downcast::<StructArray>(array, data_type)?;
            let children = struct_type
                .fields()
                .iter()
                .zip(array.columns())
                .map(|(field, column)| value_at(field.data_type(), column.as_ref(), index))
                .collect::<Result<Vec<_>, _>>()?;
            StoredValue::Struct(children)
        }
        DataType::List(element) => {
            let items = downcast::<ListArray>(array, data_type)?.value(index);
            let children = (0..items.len())
                .map(|idx| value_at(element, items.as_ref(), idx))
                .collect::<Result<Vec<_>, _>>()?;
            StoredValue::List(children)
        }
        DataType::Map(key, value_type) => {
            let entries = downcast::<MapArray>(array, data_type)?.value(index);
            let mut map = std::collections::BTreeMap::new();
            for idx in 0..entries.len() {
                map.insert(
                    value_at(key, entries.column(0).as_ref(), idx)?,
                    value_at(value_type, entries.column(1).as_ref(), idx)?,
                );
            }
            StoredValue::Map(map)
        }
        DataType::Union(variants) => {
            let union = downcast::<UnionArray>(array, data_type)?;
            let type_id = union.type_id(index);
            let variant = usize::try_from(type_id)
                .ok()
                .and_then(|tag| variants.get(tag))
                .ok_or_else(|| {
                    StorageError::Unsupported(format!("union type id {type_id} has no variant"))
                })?;
            let offset = union.value_offset(index);
            let inner = value_at(variant, union.child(type_id).as_ref(), offset)?;
            if inner.is_null() {
                StoredValue::Null
            } else {
                StoredValue::Union {
                    tag: type_id as u8,
                    value: Box::new(inner),
                }
            }
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn nested_schema() -> StructType {
        StructType::builder()
            .column("id", PrimitiveKind::Long)
            .column("code", PrimitiveKind::Char(2))
            .column("price", PrimitiveKind::Decimal { precision: 6, scale: 2 })
            .column(
                "point",
                StructType::builder()
                    .column("x", PrimitiveKind::Int)
                    .column("y", PrimitiveKind::Int)
                    .build()
                    .expect("point"),
            )
            .column("tags", DataType::list(PrimitiveKind::String))
            .column("attrs", DataType::map(PrimitiveKind::String, PrimitiveKind::Long))
            .column(
                "either",
                DataType::union([PrimitiveKind::String, PrimitiveKind::Long]),
            )
            .build()
            .expect("schema")
    }

    #[test]
    fn schema_survives_arrow_round_trip() {
        let schema = nested_schema();
        let arrow_schema = to_arrow_schema(&schema).expect("arrow schema");
        let code = arrow_schema.field_with_name("code").expect("code field");
        assert_eq!(code.data_type(), &ArrowDataType::Utf8);
        assert_eq!(
            code.metadata().get(TYPE_METADATA_KEY).map(String::as_str),
            Some("char")
        );
        assert_eq!(from_arrow_schema(&arrow_schema).expect("back"), schema);
    }

    #[test]
    fn rows_survive_batch_round_trip() {
        let schema = nested_schema();
        let full = StoredRow::from_values(vec![
            StoredValue::Long(1),
            StoredValue::Char(CharString::new("ab", 2)),
            StoredValue::Decimal("12.50".parse().expect("decimal")),
            StoredValue::Struct(vec![StoredValue::Int(3), StoredValue::Null]),
            StoredValue::List(vec![StoredValue::from("a"), StoredValue::Null]),
            StoredValue::Map(BTreeMap::from([(StoredValue::from("k"), StoredValue::Long(9))])),
            StoredValue::Union {
                tag: 1,
                value: Box::new(StoredValue::Long(5)),
            },
        ]);
        let empty = StoredRow::for_schema(&schema);
        let batch = rows_to_batch(&schema, &[full.clone(), empty.clone()]).expect("batch");
        assert_eq!(batch.num_rows(), 2);
        let rows = batch_to_rows(&schema, &batch).expect("rows");
        assert_eq!(rows, vec![full, empty]);
    }

    #[test]
    fn mismatched_values_are_reported_with_their_column() {
        let schema = StructType::builder()
            .column("n", PrimitiveKind::Long)
            .build()
            .expect("schema");
        let row = StoredRow::from_values(vec![StoredValue::from("oops")]);
        let err = rows_to_batch(&schema, &[row]).expect_err("mismatch");
        assert!(matches!(
            err,
            StorageError::InvalidValue { ref column, actual: "string", .. } if column == "n"
        ));
    }

    #[test]
    fn read_row_nulls_columns_missing_from_batch() {
        let schema = StructType::builder()
            .column("a", PrimitiveKind::Long)
            .column("b", PrimitiveKind::String)
            .build()
            .expect("schema");
        let projected = StructType::builder()
            .column("b", PrimitiveKind::String)
            .build()
            .expect("projected");
        let batch = rows_to_batch(
            &projected,
            &[StoredRow::from_values(vec![StoredValue::from("x")])],
        )
        .expect("batch");
        let mut row = StoredRow::from_values(vec![StoredValue::Long(7), StoredValue::Null]);
        read_row(&schema, &batch, &[1], 0, &mut row).expect("read");
        assert_eq!(row.values(), &[StoredValue::Null, StoredValue::from("x")]);
    }
}
