use std::sync::Arc;

use rowbridge::{
    config::{Sink, Source},
    marshal::Row,
    sarg::SearchArgument,
    scan::ProjectionMode,
    storage::{
        parquet::{ParquetRowSink, ParquetRowSource},
        RowSource,
    },
    types::{DataType, PrimitiveKind, StructType},
    value::{Decimal, NativeValue},
    Error,
};
use tempfile::TempDir;

fn schema() -> StructType {
    StructType::builder()
        .column("id", PrimitiveKind::Long)
        .column("code", PrimitiveKind::Char(3))
        .column("price", PrimitiveKind::Decimal { precision: 6, scale: 2 })
        .column("tags", DataType::list(PrimitiveKind::String))
        .build()
        .expect("schema")
}

fn write_file(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("items.parquet");
    let sink = Sink::builder()
        .declared_schema(schema())
        .build()
        .expect("sink");
    let (mut writer, mut row) = sink.open(
        ParquetRowSink::create(&path, schema())
            .expect("parquet sink")
            .with_batch_size(2),
    );
    for id in 0..5i64 {
        row.clear();
        row.set("id", id).expect("id");
        row.set("code", format!("c{id}xx")).expect("code");
        row.set("price", format!("{id}.125")).expect("price");
        row.set("tags", vec![NativeValue::from("t")]).expect("tags");
        writer.write(&row).expect("write");
    }
    writer.close().expect("close");
    path
}

#[test]
fn parquet_rows_round_trip_with_declared_types() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_file(&dir);

    let source = ParquetRowSource::open(&path).expect("open");
    assert_eq!(source.schema(), &schema());

    let scan = Source::builder()
        .schema_from_source()
        .build()
        .expect("source");
    let mut reader = scan.open(source).expect("reader");
    let mut row = reader.create_row();
    let mut rows = Vec::new();
    while reader.next(&mut row).expect("next") {
        rows.push(row.native_values().expect("values"));
    }
    assert_eq!(rows.len(), 5);
    assert_eq!(
        rows[3],
        vec![
            NativeValue::Long(3),
            NativeValue::from("c3x"),
            NativeValue::Decimal("3.13".parse::<Decimal>().expect("decimal")),
            NativeValue::List(vec![NativeValue::from("t")]),
        ]
    );
}

#[test]
fn parquet_scan_filters_and_projects() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_file(&dir);

    let argument = SearchArgument::builder()
        .greater_than_equals("id", 3i64)
        .build()
        .expect("argument");
    let scan = Source::builder()
        .schema_from_source()
        .columns(["code"])
        .search_argument(&argument)
        .build()
        .expect("source");
    let mut reader = scan
        .open(ParquetRowSource::open(&path).expect("open"))
        .expect("reader");
    let mut row = reader.create_row();
    let mut codes = Vec::new();
    while reader.next(&mut row).expect("next") {
        codes.push(row.get("code").expect("code"));
        assert_eq!(row.get("price").expect("price"), NativeValue::Null);
    }
    assert_eq!(codes, vec![NativeValue::from("c3x"), NativeValue::from("c4x")]);
    assert_eq!(reader.rows_skipped(), 3);
}

#[test]
fn parquet_scan_rejects_conflicting_declarations() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_file(&dir);

    let declared = StructType::builder()
        .column("id", PrimitiveKind::Int)
        .build()
        .expect("declared");
    let scan = Source::builder()
        .declared_schema(declared)
        .projection_mode(ProjectionMode::RequireAll)
        .build()
        .expect("source");
    let err = scan
        .open(ParquetRowSource::open(&path).expect("open"))
        .expect_err("type mismatch");
    assert!(matches!(err, Error::Schema(_)));
}

#[test]
fn parquet_sink_rejects_unions() {
    let dir = TempDir::new().expect("tempdir");
    let schema = StructType::builder()
        .column("u", DataType::union([PrimitiveKind::Int, PrimitiveKind::String]))
        .build()
        .expect("schema");
    assert!(ParquetRowSink::create(dir.path().join("u.parquet"), schema).is_err());

    // Rows can still hold unions in memory.
    let mut row = Row::with_default_factory(Arc::new(
        StructType::builder()
            .column("u", DataType::union([PrimitiveKind::Int, PrimitiveKind::String]))
            .build()
            .expect("schema"),
    ));
    row.set("u", "text").expect("union");
    assert_eq!(row.get("u").expect("u"), NativeValue::from("text"));
}
