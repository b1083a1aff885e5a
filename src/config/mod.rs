//! Scan and sink configuration.
//!
//! [`ScanConfig`] is plain serde data so a host can attach it to a job and
//! rebuild the scan elsewhere. [`SourceBuilder`] and [`SinkBuilder`] validate
//! settings as they are made and report the first problem on `build`.

mod error;

use std::{collections::HashSet, sync::Arc};

pub use error::ConfigError;
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    marshal::Row,
    observability::log_info,
    sarg::{AcceptAll, RowFilter, SearchArgument, SearchArgumentFilter},
    scan::{read_columns, AcidRowSource, ProjectionMode, RecordReader, RecordWriter},
    storage::{RowSink, RowSource},
    types::{StructField, StructType},
};

/// Where a scan takes its schema from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchemaSource {
    /// Columns and types declared up front.
    Declared(StructType),
    /// Whatever the source reports.
    FromSource,
}

fn default_row_level_filter() -> bool {
    true
}

/// Serializable description of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Schema the requested columns are resolved against.
    pub schema: SchemaSource,
    /// Subset of the schema to read; `None` reads every column.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    /// Search argument blob, see [`SearchArgument::to_blob`].
    #[serde(default)]
    pub search_argument: Option<String>,
    /// Re-check the search argument against every row.
    #[serde(default = "default_row_level_filter")]
    pub row_level_filter: bool,
    /// Treatment of requested columns missing from the source.
    #[serde(default)]
    pub projection_mode: ProjectionMode,
    /// Unwrap the transactional envelope of the source.
    #[serde(default)]
    pub transactional: bool,
    /// Copy record identifiers of transactional rows onto each row.
    #[serde(default)]
    pub prepend_row_id: bool,
}

impl ScanConfig {
    /// Encodes the configuration as JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a configuration produced by [`ScanConfig::to_json`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builds a validated [`Source`].
#[derive(Debug, Default)]
pub struct SourceBuilder {
    schema: Option<SchemaSource>,
    columns: Option<Vec<String>>,
    search_argument: Option<String>,
    row_level_filter: Option<bool>,
    projection_mode: ProjectionMode,
    transactional: bool,
    prepend_row_id: bool,
    error: Option<ConfigError>,
}

impl SourceBuilder {
    /// An empty builder; a schema source must be chosen before `build`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the columns and types to read.
    #[must_use]
    pub fn declared_schema(self, schema: StructType) -> Self {
        self.schema_source(SchemaSource::Declared(schema))
    }

    /// Declares the schema from its fields; names repeated ignoring case are
    /// reported by `build`.
    #[must_use]
    pub fn declared_fields(mut self, fields: Vec<StructField>) -> Self {
        match StructType::try_new(fields) {
            Ok(schema) => self.schema_source(SchemaSource::Declared(schema)),
            Err(err) => {
                self.fail(err.into());
                self
            }
        }
    }

    /// Takes the schema from the source itself.
    #[must_use]
    pub fn schema_from_source(self) -> Self {
        self.schema_source(SchemaSource::FromSource)
    }

    fn schema_source(mut self, source: SchemaSource) -> Self {
        if self.schema.is_some() {
            self.fail(ConfigError::AlreadySet("schema"));
        } else {
            self.schema = Some(source);
        }
        self
    }

    /// Restricts the scan to the named columns.
    #[must_use]
    pub fn columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        if self.columns.is_some() {
            self.fail(ConfigError::AlreadySet("columns"));
            return self;
        }
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        if let Some(duplicate) = columns
            .iter()
            .find(|column| !seen.insert(column.to_lowercase()))
        {
            self.fail(ConfigError::DuplicateColumn(duplicate.clone()));
        }
        self.columns = Some(columns);
        self
    }

    /// Pushes `argument` down to the scan.
    #[must_use]
    pub fn search_argument(mut self, argument: &SearchArgument) -> Self {
        if self.search_argument.is_some() {
            self.fail(ConfigError::AlreadySet("search argument"));
            return self;
        }
        match argument.to_blob() {
            Ok(blob) => self.search_argument = Some(blob),
            Err(err) => self.fail(err.into()),
        }
        self
    }

    /// Enables or disables the per-row re-check of the search argument.
    #[must_use]
    pub fn row_level_filter(mut self, enabled: bool) -> Self {
        if self.row_level_filter.is_some() {
            self.fail(ConfigError::AlreadySet("row level filter"));
        } else {
            self.row_level_filter = Some(enabled);
        }
        self
    }

    /// Sets how missing columns are treated.
    #[must_use]
    pub fn projection_mode(mut self, mode: ProjectionMode) -> Self {
        self.projection_mode = mode;
        self
    }

    /// Reads a transactional source, optionally keeping record identifiers.
    #[must_use]
    pub fn transactional(mut self, prepend_row_id: bool) -> Self {
        self.transactional = true;
        self.prepend_row_id = prepend_row_id;
        self
    }

    fn fail(&mut self, error: ConfigError) {
        self.error.get_or_insert(error);
    }

    /// Validates the settings.
    pub fn build(self) -> Result<Source, ConfigError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Source::try_from_config(ScanConfig {
            schema: self.schema.ok_or(ConfigError::MissingSchema)?,
            columns: self.columns,
            search_argument: self.search_argument,
            row_level_filter: self.row_level_filter.unwrap_or(true),
            projection_mode: self.projection_mode,
            transactional: self.transactional,
            prepend_row_id: self.prepend_row_id,
        })
    }
}

/// A validated scan description that opens readers over row sources.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    config: ScanConfig,
}

impl Source {
    /// Starts a [`SourceBuilder`].
    pub fn builder() -> SourceBuilder {
        SourceBuilder::new()
    }

    /// Validates a configuration built elsewhere, for example one decoded
    /// with [`ScanConfig::from_json`].
    pub fn try_from_config(config: ScanConfig) -> Result<Self, ConfigError> {
        if let SchemaSource::Declared(schema) = &config.schema {
            schema.validate()?;
            if let Some(columns) = &config.columns {
                select_columns(schema, columns)?;
            }
        }
        if let Some(blob) = &config.search_argument {
            SearchArgument::from_blob(blob)?;
        }
        Ok(Self { config })
    }

    /// The underlying configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Resolves the schema against `source`, restricts physical reads to the
    /// requested and filtered columns, and returns a reader.
    pub fn open<S>(&self, source: S) -> Result<RecordReader<Box<dyn RowSource>>, Error>
    where
        S: RowSource + 'static,
    {
        let config = &self.config;
        let mut source: Box<dyn RowSource> = if config.transactional {
            Box::new(AcidRowSource::new(source)?)
        } else {
            Box::new(source)
        };
        let actual = source.schema().clone();
        let resolved = match &config.schema {
            SchemaSource::Declared(schema) => schema.clone(),
            SchemaSource::FromSource => actual.clone(),
        };
        let requested = match &config.columns {
            Some(columns) => select_columns(&resolved, columns)?,
            None => resolved.clone(),
        };

        let argument = match (&config.search_argument, config.row_level_filter) {
            (Some(blob), true) => Some(SearchArgument::from_blob(blob)?),
            _ => None,
        };
        let mut read = requested.fields().to_vec();
        if let Some(argument) = &argument {
            for leaf in argument.leaves() {
                if read.iter().any(|field| field.name().eq_ignore_ascii_case(leaf.column())) {
                    continue;
                }
                if let Some((_, field)) = resolved.field_by_name(leaf.column()) {
                    read.push(field.clone());
                }
            }
        }
        let projection = read_columns(
            &StructType::try_new(read)?,
            &actual,
            config.projection_mode,
        )?;
        source.project(projection.ordinals())?;

        let filter: Box<dyn RowFilter> = match argument {
            Some(argument) => Box::new(SearchArgumentFilter::new(argument, &resolved)?),
            None => Box::new(AcceptAll),
        };
        log_info!(
            component = "scan",
            event = "scan_opened",
            columns = projection.ordinals().len(),
            missing = projection.missing().len(),
            row_level_filter = config.search_argument.is_some() && config.row_level_filter,
            transactional = config.transactional,
        );
        Ok(RecordReader::new(source)
            .with_filter(filter)
            .with_record_identifiers(config.prepend_row_id))
    }
}

fn select_columns(schema: &StructType, columns: &[String]) -> Result<StructType, ConfigError> {
    let fields = columns
        .iter()
        .map(|column| {
            schema
                .field_by_name(column)
                .map(|(_, field)| field.clone())
                .ok_or_else(|| ConfigError::UnknownColumn(column.clone()))
        })
        .collect::<Result<Vec<StructField>, _>>()?;
    Ok(StructType::try_new(fields)?)
}

/// Builds a validated [`Sink`].
#[derive(Debug, Default)]
pub struct SinkBuilder {
    schema: Option<StructType>,
    error: Option<ConfigError>,
}

impl SinkBuilder {
    /// An empty builder; a schema must be declared before `build`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the schema of written rows.
    #[must_use]
    pub fn declared_schema(mut self, schema: StructType) -> Self {
        if self.schema.is_some() {
            self.error
                .get_or_insert(ConfigError::AlreadySet("schema"));
        } else {
            self.schema = Some(schema);
        }
        self
    }

    /// Declares the schema of written rows from its fields.
    #[must_use]
    pub fn declared_fields(mut self, fields: Vec<StructField>) -> Self {
        match StructType::try_new(fields) {
            Ok(schema) => self.declared_schema(schema),
            Err(err) => {
                self.error.get_or_insert(err.into());
                self
            }
        }
    }

    /// Validates the settings.
    pub fn build(self) -> Result<Sink, ConfigError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let schema = self.schema.ok_or(ConfigError::MissingSchema)?;
        schema.validate()?;
        Ok(Sink {
            schema: Arc::new(schema),
        })
    }
}

/// A validated write description.
#[derive(Debug, Clone, PartialEq)]
pub struct Sink {
    schema: Arc<StructType>,
}

impl Sink {
    /// Starts a [`SinkBuilder`].
    pub fn builder() -> SinkBuilder {
        SinkBuilder::new()
    }

    /// The declared schema.
    pub fn schema(&self) -> &StructType {
        &self.schema
    }

    /// Returns a writer over `sink` plus an empty row to fill.
    pub fn open<K: RowSink>(&self, sink: K) -> (RecordWriter<K>, Row) {
        let writer = RecordWriter::new(sink, self.schema.clone());
        let row = writer.create_row();
        (writer, row)
    }
}
