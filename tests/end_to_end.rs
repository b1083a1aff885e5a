use std::{collections::BTreeMap, sync::Arc};

use rowbridge::{
    config::{Sink, Source},
    convert::{ConverterFactory, DefaultConverterFactory},
    marshal::Row,
    sarg::{SearchArgument, SearchArgumentFilter, TruthValue},
    scan::RecordReader,
    storage::{memory::MemoryRowSink, RowSink},
    types::{DataType, PrimitiveKind, StructType},
    value::{NativeValue, StoredValue},
};

fn single_column(kind: PrimitiveKind) -> StructType {
    StructType::builder()
        .column("a", kind)
        .build()
        .expect("schema")
}

fn write_all(schema: StructType, values: Vec<NativeValue>) -> MemoryRowSink {
    let sink = Sink::builder()
        .declared_schema(schema.clone())
        .build()
        .expect("sink");
    let (mut writer, mut row) = sink.open(MemoryRowSink::new(schema));
    for value in values {
        row.set("a", value).expect("set");
        writer.write(&row).expect("write");
    }
    writer.close().expect("close");
    writer.into_sink()
}

#[test]
fn strings_written_then_read_back_in_order() {
    let sink = write_all(
        single_column(PrimitiveKind::String),
        vec![NativeValue::from("hello"), NativeValue::Null],
    );
    assert!(sink.is_closed());

    let mut reader = RecordReader::new(sink.into_source());
    let mut row = reader.create_row();
    let mut read = Vec::new();
    while reader.next(&mut row).expect("next") {
        read.push(row.get("a").expect("a"));
    }
    assert_eq!(read, vec![NativeValue::from("hello"), NativeValue::Null]);
    assert_eq!(reader.rows_skipped(), 0);
}

#[test]
fn equality_filter_accepts_only_matching_row() {
    let sink = write_all(
        single_column(PrimitiveKind::Long),
        vec![NativeValue::Long(0), NativeValue::Long(1), NativeValue::Null],
    );
    let argument = SearchArgument::builder()
        .equals("a", 1i64)
        .build()
        .expect("argument");
    let scan = Source::builder()
        .schema_from_source()
        .search_argument(&argument)
        .build()
        .expect("source");

    let mut reader = scan.open(sink.into_source()).expect("open");
    let mut row = reader.create_row();
    let mut read = Vec::new();
    while reader.next(&mut row).expect("next") {
        read.push(row.get_stored("a").expect("a").cloned());
    }
    assert_eq!(read, vec![Some(StoredValue::Long(1))]);
    assert_eq!(reader.rows_skipped(), 2);
}

#[test]
fn between_filter_verdicts_over_rows() {
    let schema = Arc::new(single_column(PrimitiveKind::Long));
    let argument = SearchArgument::builder()
        .between("a", 1i64, 3i64)
        .build()
        .expect("argument");
    let filter = SearchArgumentFilter::new(argument, &schema).expect("filter");

    let mut row = Row::with_default_factory(schema);
    let mut verdicts = Vec::new();
    for value in [Some(0i64), Some(1), Some(2), Some(3), Some(4), None] {
        row.set("a", value).expect("set");
        verdicts.push(filter.evaluate(&mut row).expect("verdict"));
    }
    assert_eq!(
        verdicts,
        vec![
            TruthValue::No,
            TruthValue::Yes,
            TruthValue::Yes,
            TruthValue::Yes,
            TruthValue::No,
            TruthValue::Unknown,
        ]
    );
}

#[test]
fn nested_columns_round_trip_through_rows() {
    let schema = StructType::builder()
        .column(
            "person",
            StructType::builder()
                .column("name", PrimitiveKind::Varchar(4))
                .column("born", PrimitiveKind::Date)
                .build()
                .expect("person"),
        )
        .column("scores", DataType::map(PrimitiveKind::String, PrimitiveKind::Double))
        .column(
            "either",
            DataType::union([PrimitiveKind::String, PrimitiveKind::Long]),
        )
        .build()
        .expect("schema");
    let born = chrono::NaiveDate::from_ymd_opt(1999, 12, 31).expect("date");

    let mut sink = MemoryRowSink::new(schema.clone());
    let mut row = Row::with_default_factory(Arc::new(schema.clone()));
    row.set(
        "person",
        NativeValue::List(vec![NativeValue::from("Alexandra"), NativeValue::from(born)]),
    )
    .expect("person");
    row.set(
        "scores",
        NativeValue::Map(BTreeMap::from([(NativeValue::from("x"), NativeValue::Double(1.5))])),
    )
    .expect("scores");
    row.set("either", 42i64).expect("either");
    sink.write(row.stored_row()).expect("write");

    let factory: Arc<dyn ConverterFactory> = Arc::new(DefaultConverterFactory);
    let mut reader = RecordReader::new(sink.into_source()).with_converter_factory(factory);
    let mut read = reader.create_row();
    assert!(reader.next(&mut read).expect("row"));
    assert_eq!(
        read.get("PERSON").expect("person"),
        NativeValue::List(vec![NativeValue::from("Alex"), NativeValue::from(born)])
    );
    assert_eq!(read.get("either").expect("either"), NativeValue::Long(42));
    assert_eq!(
        read.get_stored("either").expect("either"),
        Some(&StoredValue::Union {
            tag: 1,
            value: Box::new(StoredValue::Long(42)),
        })
    );
}
