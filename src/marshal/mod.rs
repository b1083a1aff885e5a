//! Name-based field access over a stored row.
//!
//! A [`Row`] resolves each column name once into a [`FieldMarshaller`] and
//! keeps it for the lifetime of the row, so repeated access by name costs one
//! hash lookup plus the conversion itself.

use std::{
    collections::{hash_map::Entry, HashMap},
    fmt,
    sync::Arc,
};

use crate::{
    convert::{Converter, ConverterFactory, DefaultConverterFactory},
    error::Error,
    observability::{log_debug, log_trace},
    storage::{RecordIdentifier, StoredRow},
    types::{SchemaError, StructType},
    value::{NativeValue, StoredValue},
};

/// Accessor for one column of a [`StoredRow`].
pub enum FieldMarshaller {
    /// The column exists at `ordinal` and converts through `converter`.
    Present {
        /// Position of the column in the row.
        ordinal: usize,
        /// Declared column name, used to annotate conversion errors.
        name: String,
        /// Converter built for the column's descriptor.
        converter: Box<dyn Converter>,
    },
    /// The requested name is not part of the schema.
    Absent,
}

impl FieldMarshaller {
    /// Reads the column as a native value. Absent columns read as null.
    pub fn get(&self, row: &StoredRow) -> Result<NativeValue, Error> {
        match self {
            FieldMarshaller::Present {
                ordinal,
                name,
                converter,
            } => match row.get(*ordinal) {
                Some(stored) => Ok(converter
                    .to_native(stored)
                    .map_err(|err| err.for_field(name.as_str()))?),
                None => Ok(NativeValue::Null),
            },
            FieldMarshaller::Absent => Ok(NativeValue::Null),
        }
    }

    /// Reads the raw stored value; `None` for absent columns.
    pub fn get_stored<'r>(&self, row: &'r StoredRow) -> Option<&'r StoredValue> {
        match self {
            FieldMarshaller::Present { ordinal, .. } => row.get(*ordinal),
            FieldMarshaller::Absent => None,
        }
    }

    /// Converts `value` and stores it. Writing an absent column is a no-op.
    pub fn set(&self, row: &mut StoredRow, value: &NativeValue) -> Result<(), Error> {
        if let FieldMarshaller::Present {
            ordinal,
            name,
            converter,
        } = self
        {
            let stored = converter
                .to_stored(value)
                .map_err(|err| err.for_field(name.as_str()))?;
            row.set(*ordinal, stored);
        }
        Ok(())
    }

    /// True for [`FieldMarshaller::Present`].
    pub fn is_present(&self) -> bool {
        matches!(self, FieldMarshaller::Present { .. })
    }
}

impl fmt::Debug for FieldMarshaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldMarshaller::Present { ordinal, name, .. } => f
                .debug_struct("Present")
                .field("ordinal", ordinal)
                .field("name", name)
                .finish_non_exhaustive(),
            FieldMarshaller::Absent => f.write_str("Absent"),
        }
    }
}

/// A stored row paired with a schema, a converter factory and a lazily filled
/// name to marshaller cache.
///
/// Names are matched case-insensitively. The cache needs `&mut self`; share a
/// row between threads only behind external locking.
pub struct Row {
    schema: Arc<StructType>,
    factory: Arc<dyn ConverterFactory>,
    values: StoredRow,
    marshallers: HashMap<String, FieldMarshaller>,
    record_id: Option<RecordIdentifier>,
}

impl Row {
    /// A row of nulls shaped like `schema`.
    pub fn new(schema: Arc<StructType>, factory: Arc<dyn ConverterFactory>) -> Self {
        Self {
            values: StoredRow::for_schema(&schema),
            schema,
            factory,
            marshallers: HashMap::new(),
            record_id: None,
        }
    }

    /// A row using [`DefaultConverterFactory`].
    pub fn with_default_factory(schema: Arc<StructType>) -> Self {
        Self::new(schema, Arc::new(DefaultConverterFactory))
    }

    /// The row schema.
    pub fn schema(&self) -> &StructType {
        &self.schema
    }

    /// Reads column `name` as a native value.
    ///
    /// Unknown names read as null without building a converter or touching
    /// the stored row.
    pub fn get(&mut self, name: &str) -> Result<NativeValue, Error> {
        let marshaller = resolve(
            &mut self.marshallers,
            &self.schema,
            self.factory.as_ref(),
            name,
        )?;
        log_trace!(component = "marshal", event = "field_get", column = name);
        marshaller.get(&self.values)
    }

    /// Reads column `name` without conversion; `None` when the schema has no
    /// such column. Resolves through the same cache as [`Row::get`].
    pub fn get_stored(&mut self, name: &str) -> Result<Option<&StoredValue>, Error> {
        let marshaller = resolve(
            &mut self.marshallers,
            &self.schema,
            self.factory.as_ref(),
            name,
        )?;
        Ok(marshaller.get_stored(&self.values))
    }

    /// Converts and writes `value` to column `name`. Unknown names are
    /// silently ignored.
    pub fn set(&mut self, name: &str, value: impl Into<NativeValue>) -> Result<(), Error> {
        let marshaller = resolve(
            &mut self.marshallers,
            &self.schema,
            self.factory.as_ref(),
            name,
        )?;
        log_trace!(component = "marshal", event = "field_set", column = name);
        marshaller.set(&mut self.values, &value.into())
    }

    /// Reads every column in schema order.
    pub fn native_values(&mut self) -> Result<Vec<NativeValue>, Error> {
        let names: Vec<String> = self.schema.field_names().map(str::to_owned).collect();
        names.iter().map(|name| self.get(name)).collect()
    }

    /// The underlying stored row.
    pub fn stored_row(&self) -> &StoredRow {
        &self.values
    }

    /// Mutable access for sources that fill the row in place.
    pub fn stored_row_mut(&mut self) -> &mut StoredRow {
        &mut self.values
    }

    /// Identity of the current row when read from a transactional source.
    pub fn record_identifier(&self) -> Option<RecordIdentifier> {
        self.record_id
    }

    /// Replaces the row identity.
    pub fn set_record_identifier(&mut self, record_id: Option<RecordIdentifier>) {
        self.record_id = record_id;
    }

    /// Resets every column to null and drops the row identity. Cached
    /// marshallers are kept.
    pub fn clear(&mut self) {
        self.values.clear();
        self.record_id = None;
    }

    /// Number of column names resolved so far.
    pub fn cached_marshallers(&self) -> usize {
        self.marshallers.len()
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("schema", &self.schema)
            .field("values", &self.values)
            .field("record_id", &self.record_id)
            .finish_non_exhaustive()
    }
}

fn resolve<'a>(
    marshallers: &'a mut HashMap<String, FieldMarshaller>,
    schema: &StructType,
    factory: &dyn ConverterFactory,
    name: &str,
) -> Result<&'a FieldMarshaller, SchemaError> {
    match marshallers.entry(name.to_lowercase()) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            let marshaller = match schema.field_by_name(name) {
                Some((ordinal, field)) => FieldMarshaller::Present {
                    ordinal,
                    name: field.name().to_owned(),
                    converter: factory.build(field.data_type())?,
                },
                None => FieldMarshaller::Absent,
            };
            log_debug!(
                component = "marshal",
                event = "marshaller_resolved",
                column = %entry.key(),
                present = marshaller.is_present(),
            );
            Ok(entry.insert(marshaller))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        convert::{build_with, ConvertError},
        types::{DataType, PrimitiveKind},
    };

    #[derive(Debug, Default)]
    struct CountingFactory {
        builds: AtomicUsize,
    }

    impl ConverterFactory for CountingFactory {
        fn build(&self, data_type: &DataType) -> Result<Box<dyn Converter>, SchemaError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            build_with(self, data_type)
        }
    }

    fn schema() -> Arc<StructType> {
        Arc::new(
            StructType::builder()
                .column("a", PrimitiveKind::String)
                .column("Total", PrimitiveKind::Decimal { precision: 4, scale: 1 })
                .build()
                .expect("schema"),
        )
    }

    #[test]
    fn missing_column_reads_null_without_building_converters() {
        let factory = Arc::new(CountingFactory::default());
        let mut row = Row::new(schema(), factory.clone());

        assert_eq!(row.get("b").expect("missing"), NativeValue::Null);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 0);
        assert!(row.get_stored("b").expect("missing").is_none());

        row.set("b", "ignored").expect("no-op write");
        assert_eq!(row.stored_row(), &StoredRow::new(2));
        assert_eq!(factory.builds.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn names_resolve_once_case_insensitively() {
        let factory = Arc::new(CountingFactory::default());
        let mut row = Row::new(schema(), factory.clone());

        row.set("A", "hello").expect("set");
        assert_eq!(row.get("a").expect("get"), NativeValue::from("hello"));
        assert_eq!(
            row.get_stored("A").expect("stored"),
            Some(&StoredValue::from("hello"))
        );
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
        assert_eq!(row.cached_marshallers(), 1);
    }

    #[test]
    fn conversion_errors_name_the_column() {
        let mut row = Row::with_default_factory(schema());
        let err = row.set("total", true).expect_err("boolean into decimal");
        let Error::Convert(err) = err else {
            panic!("expected a conversion error, got {err:?}");
        };
        assert_eq!(err.field(), Some("Total"));
        assert!(matches!(err.root(), ConvertError::TypeMismatch { .. }));
    }

    #[test]
    fn decimal_writes_round_to_column_scale() {
        let mut row = Row::with_default_factory(schema());
        row.set("total", "3.45").expect("set");
        assert_eq!(
            row.get("total").expect("get"),
            NativeValue::Decimal("3.5".parse().expect("decimal"))
        );
    }

    #[test]
    fn clear_keeps_cache_and_drops_identity() {
        let mut row = Row::with_default_factory(schema());
        row.set("a", "x").expect("set");
        row.set_record_identifier(Some(RecordIdentifier::new(1, 2, 3)));
        row.clear();
        assert_eq!(row.native_values().expect("values"), vec![NativeValue::Null; 2]);
        assert_eq!(row.record_identifier(), None);
        assert_eq!(row.cached_marshallers(), 2);
    }
}
