//! The storage-engine side of a scan: row containers and the traits raw row
//! producers and consumers implement.

pub mod arrow;
mod error;
pub mod memory;
pub mod parquet;

pub use error::StorageError;
use serde::{Deserialize, Serialize};

use crate::{types::StructType, value::StoredValue};

/// Mutable container for one row in the stored domain, addressed by ordinal.
///
/// Sources overwrite the same container on every fetch, so references into it
/// must not outlive the next call to [`RowSource::next`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredRow {
    values: Vec<StoredValue>,
}

impl StoredRow {
    /// A row of `len` nulls.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![StoredValue::Null; len],
        }
    }

    /// A row of nulls shaped like `schema`.
    #[must_use]
    pub fn for_schema(schema: &StructType) -> Self {
        Self::new(schema.len())
    }

    /// Wraps already-stored values.
    #[must_use]
    pub fn from_values(values: Vec<StoredValue>) -> Self {
        Self { values }
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the row has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value at `ordinal`.
    #[must_use]
    pub fn get(&self, ordinal: usize) -> Option<&StoredValue> {
        self.values.get(ordinal)
    }

    /// Overwrites the value at `ordinal`, growing the row with nulls if needed.
    pub fn set(&mut self, ordinal: usize, value: StoredValue) {
        if ordinal >= self.values.len() {
            self.values.resize(ordinal + 1, StoredValue::Null);
        }
        self.values[ordinal] = value;
    }

    /// All slots in ordinal order.
    #[must_use]
    pub fn values(&self) -> &[StoredValue] {
        &self.values
    }

    /// Unwraps the slots.
    #[must_use]
    pub fn into_values(self) -> Vec<StoredValue> {
        self.values
    }

    /// Resets every slot to null, keeping the length.
    pub fn clear(&mut self) {
        self.values.fill(StoredValue::Null);
    }
}

/// Identity of a row in a transactional file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordIdentifier {
    /// Transaction that wrote the row.
    pub write_id: i64,
    /// Bucket the row belongs to.
    pub bucket_id: i32,
    /// Position of the row within its write.
    pub row_id: i64,
}

impl RecordIdentifier {
    /// Creates an identifier.
    #[must_use]
    pub fn new(write_id: i64, bucket_id: i32, row_id: i64) -> Self {
        Self {
            write_id,
            bucket_id,
            row_id,
        }
    }
}

/// Producer of raw rows, typically a file reader.
pub trait RowSource: std::fmt::Debug {
    /// The full schema of the rows this source produces.
    fn schema(&self) -> &StructType;

    /// Restricts reading to the given ordinals of [`RowSource::schema`]; other
    /// slots are left null. Sources that cannot project may read everything.
    fn project(&mut self, ordinals: &[usize]) -> Result<(), StorageError> {
        let _ = ordinals;
        Ok(())
    }

    /// Overwrites `row` with the next row. Returns `false` once exhausted.
    fn next(&mut self, row: &mut StoredRow) -> Result<bool, StorageError>;

    /// Identity of the row most recently produced by [`RowSource::next`].
    fn record_identifier(&self) -> Option<RecordIdentifier> {
        None
    }

    /// True when rows carry a [`RecordIdentifier`].
    fn is_transactional(&self) -> bool {
        false
    }
}

/// Consumer of raw rows, typically a file writer.
pub trait RowSink {
    /// Appends one row.
    fn write(&mut self, row: &StoredRow) -> Result<(), StorageError>;

    /// Flushes and finishes the sink. Writing afterwards fails.
    fn close(&mut self) -> Result<(), StorageError>;
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn schema(&self) -> &StructType {
        (**self).schema()
    }

    fn project(&mut self, ordinals: &[usize]) -> Result<(), StorageError> {
        (**self).project(ordinals)
    }

    fn next(&mut self, row: &mut StoredRow) -> Result<bool, StorageError> {
        (**self).next(row)
    }

    fn record_identifier(&self) -> Option<RecordIdentifier> {
        (**self).record_identifier()
    }

    fn is_transactional(&self) -> bool {
        (**self).is_transactional()
    }
}

impl<S: RowSink + ?Sized> RowSink for Box<S> {
    fn write(&mut self, row: &StoredRow) -> Result<(), StorageError> {
        (**self).write(row)
    }

    fn close(&mut self) -> Result<(), StorageError> {
        (**self).close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_grows_and_clear_keeps_length() {
        let mut row = StoredRow::new(1);
        row.set(2, StoredValue::Long(7));
        assert_eq!(row.len(), 3);
        assert_eq!(row.get(1), Some(&StoredValue::Null));
        assert_eq!(row.get(2), Some(&StoredValue::Long(7)));
        row.clear();
        assert_eq!(row.values(), &[StoredValue::Null, StoredValue::Null, StoredValue::Null]);
    }
}
