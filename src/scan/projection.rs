use serde::{Deserialize, Serialize};

use crate::{
    config::ConfigError,
    error::Error,
    observability::log_warn,
    types::{SchemaError, StructType},
};

/// How a scan treats requested columns the source does not contain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionMode {
    /// Missing columns read as null.
    #[default]
    Lenient,
    /// Missing columns fail the scan at open time.
    RequireAll,
}

/// The physical columns a scan reads, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnProjection {
    ordinals: Vec<usize>,
    names: Vec<String>,
    missing: Vec<String>,
}

impl ColumnProjection {
    /// Source ordinals to read, ascending.
    pub fn ordinals(&self) -> &[usize] {
        &self.ordinals
    }

    /// Source column names to read, matching [`ColumnProjection::ordinals`].
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Requested columns absent from the source; they read as null.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }
}

/// Derives the source columns to read for `requested`.
///
/// A requested column whose source type differs is a
/// [`SchemaError::SchemaMismatch`]. A column absent from `actual` is recorded as
/// missing, or fails with [`ConfigError::MissingColumn`] under
/// [`ProjectionMode::RequireAll`].
pub fn read_columns(
    requested: &StructType,
    actual: &StructType,
    mode: ProjectionMode,
) -> Result<ColumnProjection, Error> {
    let mut ordinals = Vec::with_capacity(requested.len());
    let mut missing = Vec::new();
    for field in requested.fields() {
        match actual.field_by_name(field.name()) {
            Some((ordinal, found)) => {
                if found.data_type() != field.data_type() {
                    return Err(SchemaError::SchemaMismatch {
                        column: field.name().to_owned(),
                        expected: field.data_type().to_string(),
                        actual: found.data_type().to_string(),
                    }
                    .into());
                }
                ordinals.push(ordinal);
            }
            None if mode == ProjectionMode::RequireAll => {
                return Err(ConfigError::MissingColumn(field.name().to_owned()).into());
            }
            None => {
                log_warn!(
                    component = "scan",
                    event = "column_missing",
                    column = field.name(),
                );
                missing.push(field.name().to_owned());
            }
        }
    }
    ordinals.sort_unstable();
    ordinals.dedup();
    let names = ordinals
        .iter()
        .filter_map(|ordinal| actual.field(*ordinal))
        .map(|field| field.name().to_owned())
        .collect();
    Ok(ColumnProjection {
        ordinals,
        names,
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveKind;

    fn actual() -> StructType {
        StructType::builder()
            .column("id", PrimitiveKind::Long)
            .column("Name", PrimitiveKind::String)
            .column("score", PrimitiveKind::Double)
            .build()
            .expect("actual")
    }

    #[test]
    fn projection_follows_source_order() {
        let requested = StructType::builder()
            .column("score", PrimitiveKind::Double)
            .column("name", PrimitiveKind::String)
            .column("extra", PrimitiveKind::Int)
            .build()
            .expect("requested");
        let projection =
            read_columns(&requested, &actual(), ProjectionMode::Lenient).expect("projection");
        assert_eq!(projection.ordinals(), &[1, 2]);
        assert_eq!(projection.names(), &["Name".to_owned(), "score".to_owned()]);
        assert_eq!(projection.missing(), &["extra".to_owned()]);
    }

    #[test]
    fn require_all_rejects_missing_columns() {
        let requested = StructType::builder()
            .column("extra", PrimitiveKind::Int)
            .build()
            .expect("requested");
        let err = read_columns(&requested, &actual(), ProjectionMode::RequireAll)
            .expect_err("missing");
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingColumn(column)) if column == "extra"
        ));
    }

    #[test]
    fn type_disagreement_is_a_schema_mismatch() {
        let requested = StructType::builder()
            .column("id", PrimitiveKind::Int)
            .build()
            .expect("requested");
        let err = read_columns(&requested, &actual(), ProjectionMode::Lenient)
            .expect_err("mismatch");
        assert!(matches!(
            err,
            Error::Schema(SchemaError::SchemaMismatch { .. })
        ));
    }
}
