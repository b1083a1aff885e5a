//! In-memory row collaborators.

use std::collections::VecDeque;

use super::{RecordIdentifier, RowSink, RowSource, StorageError, StoredRow};
use crate::{types::StructType, value::StoredValue};

/// Serves rows from memory.
#[derive(Debug, Clone)]
pub struct MemoryRowSource {
    schema: StructType,
    rows: VecDeque<(StoredRow, Option<RecordIdentifier>)>,
    projection: Option<Vec<usize>>,
    current: Option<RecordIdentifier>,
    transactional: bool,
}

impl MemoryRowSource {
    /// A plain source over `rows`.
    pub fn new(schema: StructType, rows: impl IntoIterator<Item = StoredRow>) -> Self {
        Self {
            schema,
            rows: rows.into_iter().map(|row| (row, None)).collect(),
            projection: None,
            current: None,
            transactional: false,
        }
    }

    /// A transactional source whose rows carry identifiers.
    pub fn transactional(
        schema: StructType,
        rows: impl IntoIterator<Item = (StoredRow, RecordIdentifier)>,
    ) -> Self {
        Self {
            schema,
            rows: rows.into_iter().map(|(row, id)| (row, Some(id))).collect(),
            projection: None,
            current: None,
            transactional: true,
        }
    }

    /// Rows not yet served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowSource for MemoryRowSource {
    fn schema(&self) -> &StructType {
        &self.schema
    }

    fn project(&mut self, ordinals: &[usize]) -> Result<(), StorageError> {
        self.projection = Some(ordinals.to_vec());
        Ok(())
    }

    fn next(&mut self, row: &mut StoredRow) -> Result<bool, StorageError> {
        let Some((next, id)) = self.rows.pop_front() else {
            self.current = None;
            return Ok(false);
        };
        *row = StoredRow::new(self.schema.len());
        for (ordinal, value) in next.into_values().into_iter().enumerate() {
            let wanted = self
                .projection
                .as_ref()
                .map_or(true, |ordinals| ordinals.contains(&ordinal));
            if wanted && ordinal < self.schema.len() {
                row.set(ordinal, value);
            }
        }
        self.current = id;
        Ok(true)
    }

    fn record_identifier(&self) -> Option<RecordIdentifier> {
        self.current
    }

    fn is_transactional(&self) -> bool {
        self.transactional
    }
}

/// Collects written rows in memory.
#[derive(Debug, Clone)]
pub struct MemoryRowSink {
    schema: StructType,
    rows: Vec<StoredRow>,
    closed: bool,
}

impl MemoryRowSink {
    /// An empty, open sink for rows shaped like `schema`.
    #[must_use]
    pub fn new(schema: StructType) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            closed: false,
        }
    }

    /// The schema rows are written with.
    #[must_use]
    pub fn schema(&self) -> &StructType {
        &self.schema
    }

    /// Rows written so far.
    #[must_use]
    pub fn rows(&self) -> &[StoredRow] {
        &self.rows
    }

    /// True once [`RowSink::close`] was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Turns the written rows into a source with the same schema.
    #[must_use]
    pub fn into_source(self) -> MemoryRowSource {
        MemoryRowSource::new(self.schema, self.rows)
    }
}

impl RowSink for MemoryRowSink {
    fn write(&mut self, row: &StoredRow) -> Result<(), StorageError> {
        if self.closed {
            return Err(StorageError::Closed);
        }
        let mut copy = row.clone();
        if copy.len() < self.schema.len() {
            copy.set(self.schema.len() - 1, StoredValue::Null);
        }
        self.rows.push(copy);
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.closed = true;
        Ok(())
    }
}
