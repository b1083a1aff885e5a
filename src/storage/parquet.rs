//! Parquet files as row sources and sinks.
//!
//! Column types are recovered from the footer's embedded Arrow schema, so
//! bounded text columns keep their declared lengths across a round trip.

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow::{datatypes::SchemaRef, record_batch::RecordBatch};
use parquet::{
    arrow::{
        arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder},
        ArrowWriter, ProjectionMask,
    },
    file::properties::WriterProperties,
};

use super::{
    arrow::{from_arrow_schema, read_row, rows_to_batch, to_arrow_schema},
    RowSink, RowSource, StorageError, StoredRow,
};
use crate::{
    observability::log_debug,
    types::{DataType, StructType},
};

/// Rows fetched from the file per decoded batch.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Reads rows from a parquet file, decoding only projected columns.
pub struct ParquetRowSource {
    path: PathBuf,
    schema: StructType,
    batch_size: usize,
    projection: Option<Vec<usize>>,
    reader: Option<ParquetRecordBatchReader>,
    ordinals: Vec<usize>,
    batch: Option<RecordBatch>,
    position: usize,
}

impl ParquetRowSource {
    /// Opens `path` and reads its schema from the footer. Row groups are not
    /// decoded until the first call to [`RowSource::next`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?;
        let schema = from_arrow_schema(builder.schema())?;
        log_debug!(
            component = "storage",
            event = "parquet_opened",
            path = %path.display(),
            rows = builder.metadata().file_metadata().num_rows(),
            columns = schema.len(),
        );
        Ok(Self {
            path,
            schema,
            batch_size: DEFAULT_BATCH_SIZE,
            projection: None,
            reader: None,
            ordinals: Vec::new(),
            batch: None,
            position: 0,
        })
    }

    /// Overrides [`DEFAULT_BATCH_SIZE`].
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn start(&mut self) -> Result<ParquetRecordBatchReader, StorageError> {
        let mut builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&self.path)?)?
            .with_batch_size(self.batch_size);
        self.ordinals = match &self.projection {
            Some(projection) => {
                let mut ordinals: Vec<usize> = projection
                    .iter()
                    .copied()
                    .filter(|ordinal| *ordinal < self.schema.len())
                    .collect();
                ordinals.sort_unstable();
                ordinals.dedup();
                let mask = ProjectionMask::roots(builder.parquet_schema(), ordinals.iter().copied());
                builder = builder.with_projection(mask);
                ordinals
            }
            None => (0..self.schema.len()).collect(),
        };
        Ok(builder.build()?)
    }
}

impl std::fmt::Debug for ParquetRowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetRowSource")
            .field("path", &self.path)
            .field("schema", &self.schema)
            .field("projection", &self.projection)
            .field("started", &self.reader.is_some())
            .finish()
    }
}

impl RowSource for ParquetRowSource {
    fn schema(&self) -> &StructType {
        &self.schema
    }

    fn project(&mut self, ordinals: &[usize]) -> Result<(), StorageError> {
        if self.reader.is_some() {
            return Err(StorageError::Unsupported(
                "projection must be set before the first row is read".to_owned(),
            ));
        }
        self.projection = Some(ordinals.to_vec());
        Ok(())
    }

    fn next(&mut self, row: &mut StoredRow) -> Result<bool, StorageError> {
        loop {
            if let Some(batch) = &self.batch {
                if self.position < batch.num_rows() {
                    read_row(&self.schema, batch, &self.ordinals, self.position, row)?;
                    self.position += 1;
                    return Ok(true);
                }
            }
            if self.reader.is_none() {
                self.reader = Some(self.start()?);
            }
            let Some(reader) = self.reader.as_mut() else {
                return Ok(false);
            };
            match reader.next() {
                Some(batch) => {
                    self.batch = Some(batch?);
                    self.position = 0;
                }
                None => {
                    self.batch = None;
                    return Ok(false);
                }
            }
        }
    }
}

/// Buffers rows and writes them to a parquet file in batches.
pub struct ParquetRowSink {
    schema: StructType,
    arrow_schema: SchemaRef,
    writer: Option<ArrowWriter<File>>,
    buffer: Vec<StoredRow>,
    batch_size: usize,
}

impl ParquetRowSink {
    /// Creates (or truncates) `path` for rows shaped like `schema`.
    ///
    /// Parquet has no union type, so schemas containing one are rejected.
    pub fn create(path: impl AsRef<Path>, schema: StructType) -> Result<Self, StorageError> {
        if let Some(field) = schema
            .fields()
            .iter()
            .find(|field| contains_union(field.data_type()))
        {
            return Err(StorageError::Unsupported(format!(
                "parquet cannot store union column '{}'",
                field.name()
            )));
        }
        let arrow_schema = Arc::new(to_arrow_schema(&schema)?);
        let properties = WriterProperties::builder()
            .set_created_by(concat!("rowbridge version ", env!("CARGO_PKG_VERSION")).to_owned())
            .build();
        let writer = ArrowWriter::try_new(
            File::create(path.as_ref())?,
            arrow_schema.clone(),
            Some(properties),
        )?;
        Ok(Self {
            schema,
            arrow_schema,
            writer: Some(writer),
            buffer: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Overrides [`DEFAULT_BATCH_SIZE`].
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// The Arrow schema written to the footer.
    #[must_use]
    pub fn arrow_schema(&self) -> &SchemaRef {
        &self.arrow_schema
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let writer = self.writer.as_mut().ok_or(StorageError::Closed)?;
        let batch = rows_to_batch(&self.schema, &self.buffer)?;
        writer.write(&batch)?;
        self.buffer.clear();
        Ok(())
    }
}

impl std::fmt::Debug for ParquetRowSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetRowSink")
            .field("schema", &self.schema)
            .field("buffered", &self.buffer.len())
            .field("closed", &self.writer.is_none())
            .finish()
    }
}

impl RowSink for ParquetRowSink {
    fn write(&mut self, row: &StoredRow) -> Result<(), StorageError> {
        if self.writer.is_none() {
            return Err(StorageError::Closed);
        }
        self.buffer.push(row.clone());
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.flush()?;
        if let Some(writer) = self.writer.take() {
            let metadata = writer.close()?;
            log_debug!(
                component = "storage",
                event = "parquet_closed",
                rows = metadata.num_rows,
            );
        }
        Ok(())
    }
}

fn contains_union(data_type: &DataType) -> bool {
    match data_type {
        DataType::Primitive(_) => false,
        DataType::Struct(fields) => fields
            .fields()
            .iter()
            .any(|field| contains_union(field.data_type())),
        DataType::List(element) => contains_union(element),
        DataType::Map(key, value) => contains_union(key) || contains_union(value),
        DataType::Union(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        types::PrimitiveKind,
        value::{CharString, StoredValue},
    };

    fn schema() -> StructType {
        StructType::builder()
            .column("id", PrimitiveKind::Long)
            .column("name", PrimitiveKind::Varchar(8))
            .column("scores", DataType::list(PrimitiveKind::Double))
            .build()
            .expect("schema")
    }

    fn row(id: i64, name: &str) -> StoredRow {
        StoredRow::from_values(vec![
            StoredValue::Long(id),
            StoredValue::Varchar(CharString::new(name, 8)),
            StoredValue::List(vec![StoredValue::Double(0.5)]),
        ])
    }

    #[test]
    fn rows_round_trip_across_batches() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("rows.parquet");

        let mut sink = ParquetRowSink::create(&path, schema())
            .expect("create")
            .with_batch_size(2);
        let written: Vec<StoredRow> = (0..5).map(|id| row(id, "row")).collect();
        for row in &written {
            sink.write(row).expect("write");
        }
        sink.close().expect("close");
        assert!(matches!(sink.write(&written[0]), Err(StorageError::Closed)));

        let mut source = ParquetRowSource::open(&path)
            .expect("open")
            .with_batch_size(3);
        assert_eq!(source.schema(), &schema());
        let mut read = Vec::new();
        let mut current = StoredRow::default();
        while source.next(&mut current).expect("next") {
            read.push(current.clone());
        }
        assert_eq!(read, written);
        assert!(!source.next(&mut current).expect("still exhausted"));
    }

    #[test]
    fn projection_skips_other_columns() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("projected.parquet");
        let mut sink = ParquetRowSink::create(&path, schema()).expect("create");
        sink.write(&row(7, "seven")).expect("write");
        sink.close().expect("close");

        let mut source = ParquetRowSource::open(&path).expect("open");
        source.project(&[1]).expect("project");
        let mut current = StoredRow::default();
        assert!(source.next(&mut current).expect("next"));
        assert_eq!(
            current.values(),
            &[
                StoredValue::Null,
                StoredValue::Varchar(CharString::new("seven", 8)),
                StoredValue::Null,
            ]
        );
        assert!(source.project(&[0]).is_err());
    }

    #[test]
    fn unions_are_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let schema = StructType::builder()
            .column(
                "u",
                DataType::list(DataType::union([PrimitiveKind::Int, PrimitiveKind::String])),
            )
            .build()
            .expect("schema");
        let err = ParquetRowSink::create(dir.path().join("u.parquet"), schema)
            .expect_err("unions");
        assert!(matches!(err, StorageError::Unsupported(_)));
    }
}
