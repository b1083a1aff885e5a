//! Row fetch/filter loop and the matching write path.
//!
//! A [`RecordReader`] pulls raw rows from a [`RowSource`] into a [`Row`],
//! skipping rows the configured [`RowFilter`] rejects. A [`RecordWriter`]
//! appends rows to a [`RowSink`].

mod acid;
mod projection;

use std::sync::Arc;

pub use acid::{transactional_row_struct, transactional_schema, AcidRowSource};
pub use projection::{read_columns, ColumnProjection, ProjectionMode};

use crate::{
    convert::{ConverterFactory, DefaultConverterFactory},
    error::Error,
    marshal::Row,
    observability::{log_debug, log_trace},
    sarg::{AcceptAll, RowFilter},
    storage::{RowSink, RowSource},
    types::StructType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    AwaitingRow,
    Done,
}

/// Reads filtered rows from a [`RowSource`].
#[derive(Debug)]
pub struct RecordReader<S> {
    source: S,
    schema: Arc<StructType>,
    factory: Arc<dyn ConverterFactory>,
    filter: Box<dyn RowFilter>,
    attach_record_identifiers: bool,
    state: ReaderState,
    rows_read: u64,
    rows_skipped: u64,
}

impl<S: RowSource> RecordReader<S> {
    /// A reader accepting every row of `source`.
    pub fn new(source: S) -> Self {
        let schema = Arc::new(source.schema().clone());
        Self {
            source,
            schema,
            factory: Arc::new(DefaultConverterFactory),
            filter: Box::new(AcceptAll),
            attach_record_identifiers: true,
            state: ReaderState::AwaitingRow,
            rows_read: 0,
            rows_skipped: 0,
        }
    }

    /// Replaces the row-level filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Box<dyn RowFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Replaces the factory used by rows from [`RecordReader::create_row`].
    #[must_use]
    pub fn with_converter_factory(mut self, factory: Arc<dyn ConverterFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Whether identifiers of transactional sources are copied onto rows.
    #[must_use]
    pub fn with_record_identifiers(mut self, attach: bool) -> Self {
        self.attach_record_identifiers = attach;
        self
    }

    /// Schema of the rows produced.
    pub fn schema(&self) -> &Arc<StructType> {
        &self.schema
    }

    /// A row shaped for [`RecordReader::next`].
    pub fn create_row(&self) -> Row {
        Row::new(self.schema.clone(), self.factory.clone())
    }

    /// Overwrites `row` with the next accepted row. Returns `false` once the
    /// source is exhausted; later calls keep returning `false` without
    /// touching the source.
    pub fn next(&mut self, row: &mut Row) -> Result<bool, Error> {
        loop {
            match self.state {
                ReaderState::Done => return Ok(false),
                ReaderState::AwaitingRow => {
                    if !self.source.next(row.stored_row_mut())? {
                        self.state = ReaderState::Done;
                        log_debug!(
                            component = "scan",
                            event = "scan_done",
                            rows_read = self.rows_read,
                            rows_skipped = self.rows_skipped,
                        );
                        return Ok(false);
                    }
                    if !self.filter.accept(row)? {
                        self.rows_skipped += 1;
                        log_trace!(component = "scan", event = "row_skipped");
                        continue;
                    }
                    let record_id = if self.attach_record_identifiers
                        && self.source.is_transactional()
                    {
                        self.source.record_identifier()
                    } else {
                        None
                    };
                    row.set_record_identifier(record_id);
                    self.rows_read += 1;
                    return Ok(true);
                }
            }
        }
    }

    /// Rows handed out so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Rows rejected by the filter so far.
    pub fn rows_skipped(&self) -> u64 {
        self.rows_skipped
    }

    /// True once the source is exhausted.
    pub fn is_done(&self) -> bool {
        self.state == ReaderState::Done
    }

    /// Unwraps the source.
    pub fn into_source(self) -> S {
        self.source
    }
}

/// Appends rows to a [`RowSink`].
#[derive(Debug)]
pub struct RecordWriter<K> {
    sink: K,
    schema: Arc<StructType>,
    factory: Arc<dyn ConverterFactory>,
    rows_written: u64,
}

impl<K: RowSink> RecordWriter<K> {
    /// A writer for rows shaped like `schema`.
    pub fn new(sink: K, schema: Arc<StructType>) -> Self {
        Self {
            sink,
            schema,
            factory: Arc::new(DefaultConverterFactory),
            rows_written: 0,
        }
    }

    /// Replaces the factory used by rows from [`RecordWriter::create_row`].
    #[must_use]
    pub fn with_converter_factory(mut self, factory: Arc<dyn ConverterFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Schema of the rows written.
    pub fn schema(&self) -> &Arc<StructType> {
        &self.schema
    }

    /// An empty row to fill and pass to [`RecordWriter::write`].
    pub fn create_row(&self) -> Row {
        Row::new(self.schema.clone(), self.factory.clone())
    }

    /// Appends the stored form of `row`.
    pub fn write(&mut self, row: &Row) -> Result<(), Error> {
        self.sink.write(row.stored_row())?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flushes and closes the sink.
    pub fn close(&mut self) -> Result<(), Error> {
        self.sink.close()?;
        log_debug!(
            component = "scan",
            event = "writer_closed",
            rows_written = self.rows_written,
        );
        Ok(())
    }

    /// Rows written so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Unwraps the sink.
    pub fn into_sink(self) -> K {
        self.sink
    }
}
