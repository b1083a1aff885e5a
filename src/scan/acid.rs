//! Transactional file layout.
//!
//! A transactional file wraps every user row in a six column envelope:
//! `operation:int, originalTransaction:bigint, bucket:int, rowId:bigint,
//! currentTransaction:bigint, row:struct<...>`. [`AcidRowSource`] unwraps the
//! envelope so scans see the user columns plus a [`RecordIdentifier`].

use crate::{
    config::ConfigError,
    storage::{RecordIdentifier, RowSource, StorageError, StoredRow},
    types::{DataType, PrimitiveKind, StructType},
    value::StoredValue,
};

const ORIGINAL_TRANSACTION: usize = 1;
const BUCKET: usize = 2;
const ROW_ID: usize = 3;
const ROW: usize = 5;
const ENVELOPE: [(&str, Option<PrimitiveKind>); 6] = [
    ("operation", Some(PrimitiveKind::Int)),
    ("originalTransaction", Some(PrimitiveKind::Long)),
    ("bucket", Some(PrimitiveKind::Int)),
    ("rowId", Some(PrimitiveKind::Long)),
    ("currentTransaction", Some(PrimitiveKind::Long)),
    ("row", None),
];

/// Returns the user row struct nested in a transactional envelope schema.
pub fn transactional_row_struct(schema: &StructType) -> Result<&StructType, ConfigError> {
    if schema.len() != ENVELOPE.len() {
        return Err(ConfigError::NotTransactional(format!(
            "expected {} columns, found {}",
            ENVELOPE.len(),
            schema.len()
        )));
    }
    for (field, (name, kind)) in schema.fields().iter().zip(ENVELOPE) {
        if !field.name().eq_ignore_ascii_case(name) {
            return Err(ConfigError::NotTransactional(format!(
                "expected column '{name}', found '{}'",
                field.name()
            )));
        }
        if let Some(kind) = kind {
            if field.data_type() != &DataType::Primitive(kind) {
                return Err(ConfigError::NotTransactional(format!(
                    "column '{name}' must be {kind}, found {}",
                    field.data_type()
                )));
            }
        }
    }
    schema
        .field(ROW)
        .and_then(|field| field.data_type().as_struct())
        .ok_or_else(|| ConfigError::NotTransactional("column 'row' must be a struct".to_owned()))
}

/// The transactional envelope for rows shaped like `row`.
pub fn transactional_schema(row: StructType) -> Result<StructType, ConfigError> {
    let mut builder = StructType::builder();
    for (name, kind) in ENVELOPE {
        builder = match kind {
            Some(kind) => builder.column(name, kind),
            None => builder.column(name, row.clone()),
        };
    }
    Ok(builder.build()?)
}

/// Presents a transactional source as a plain one over its user columns.
#[derive(Debug)]
pub struct AcidRowSource<S> {
    inner: S,
    schema: StructType,
    envelope: StoredRow,
    projection: Option<Vec<usize>>,
    current: Option<RecordIdentifier>,
}

impl<S: RowSource> AcidRowSource<S> {
    /// Wraps `inner`, whose schema must be a transactional envelope.
    pub fn new(inner: S) -> Result<Self, ConfigError> {
        let schema = transactional_row_struct(inner.schema())?.clone();
        let envelope = StoredRow::for_schema(inner.schema());
        Ok(Self {
            inner,
            schema,
            envelope,
            projection: None,
            current: None,
        })
    }

    /// Unwraps the inner source.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: RowSource> RowSource for AcidRowSource<S> {
    fn schema(&self) -> &StructType {
        &self.schema
    }

    fn project(&mut self, ordinals: &[usize]) -> Result<(), StorageError> {
        // Nested columns cannot be projected physically; read the whole
        // struct and null the rest after unwrapping.
        self.inner
            .project(&[ORIGINAL_TRANSACTION, BUCKET, ROW_ID, ROW])?;
        self.projection = Some(ordinals.to_vec());
        Ok(())
    }

    fn next(&mut self, row: &mut StoredRow) -> Result<bool, StorageError> {
        if !self.inner.next(&mut self.envelope)? {
            self.current = None;
            return Ok(false);
        }
        self.current = match (
            self.envelope.get(ORIGINAL_TRANSACTION),
            self.envelope.get(BUCKET),
            self.envelope.get(ROW_ID),
        ) {
            (
                Some(StoredValue::Long(write_id)),
                Some(StoredValue::Int(bucket_id)),
                Some(StoredValue::Long(row_id)),
            ) => Some(RecordIdentifier::new(*write_id, *bucket_id, *row_id)),
            _ => None,
        };

        *row = StoredRow::for_schema(&self.schema);
        match self.envelope.get(ROW) {
            Some(StoredValue::Struct(values)) => {
                for (ordinal, value) in values.iter().enumerate().take(self.schema.len()) {
                    let wanted = self
                        .projection
                        .as_ref()
                        .map_or(true, |ordinals| ordinals.contains(&ordinal));
                    if wanted {
                        row.set(ordinal, value.clone());
                    }
                }
            }
            Some(StoredValue::Null) | None => {}
            Some(other) => {
                return Err(StorageError::InvalidValue {
                    column: ENVELOPE[ROW].0.to_owned(),
                    expected: self.schema.to_string(),
                    actual: other.kind_name(),
                })
            }
        }
        Ok(true)
    }

    fn record_identifier(&self) -> Option<RecordIdentifier> {
        self.current
    }

    fn is_transactional(&self) -> bool {
        true
    }
}
