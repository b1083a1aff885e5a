//! One converter per scalar column kind.

use chrono::{DateTime, Datelike, NaiveDate};

use super::{ConvertError, Converter};
use crate::{
    types::PrimitiveKind,
    value::{CharString, Decimal, NativeValue, StoredValue},
};

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;
const NANOS_PER_SECOND: i64 = 1_000_000_000;

pub(crate) fn native_mismatch(value: &NativeValue, expected: impl ToString) -> ConvertError {
    ConvertError::TypeMismatch {
        value: value.to_string(),
        actual: value.kind_name(),
        expected: expected.to_string(),
    }
}

pub(crate) fn stored_mismatch(value: &StoredValue, expected: impl ToString) -> ConvertError {
    ConvertError::TypeMismatch {
        value: value.to_string(),
        actual: value.kind_name(),
        expected: expected.to_string(),
    }
}

fn out_of_range(value: impl ToString, target: impl ToString) -> ConvertError {
    ConvertError::OutOfRange {
        value: value.to_string(),
        target: target.to_string(),
    }
}

/// Returns the stock converter for `kind`; `kind` must already be validated.
pub(crate) fn primitive_converter(kind: PrimitiveKind) -> Box<dyn Converter> {
    match kind {
        PrimitiveKind::String => Box::new(StringConverter),
        PrimitiveKind::Boolean => Box::new(BooleanConverter),
        PrimitiveKind::Byte => Box::new(ByteConverter),
        PrimitiveKind::Short => Box::new(ShortConverter),
        PrimitiveKind::Int => Box::new(IntConverter),
        PrimitiveKind::Long => Box::new(LongConverter),
        PrimitiveKind::Float => Box::new(FloatConverter),
        PrimitiveKind::Double => Box::new(DoubleConverter),
        PrimitiveKind::Binary => Box::new(BinaryConverter),
        PrimitiveKind::Timestamp => Box::new(TimestampConverter),
        PrimitiveKind::Date => Box::new(DateConverter),
        PrimitiveKind::Decimal { precision, scale } => {
            Box::new(DecimalConverter::new(precision, scale))
        }
        PrimitiveKind::Char(length) => Box::new(CharConverter::new(length)),
        PrimitiveKind::Varchar(length) => Box::new(VarcharConverter::new(length)),
    }
}

macro_rules! scalar_converter {
    ($($(#[$meta:meta])* $name:ident => $variant:ident, $kind:expr;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Default, Clone, Copy)]
            pub struct $name;

            impl Converter for $name {
                #[allow(clippy::clone_on_copy)]
                fn to_stored_value(&self, value: &NativeValue) -> Result<StoredValue, ConvertError> {
                    match value {
                        NativeValue::$variant(v) => Ok(StoredValue::$variant(v.clone())),
                        other => Err(native_mismatch(other, $kind)),
                    }
                }

                #[allow(clippy::clone_on_copy)]
                fn to_native_value(&self, value: &StoredValue) -> Result<NativeValue, ConvertError> {
                    match value {
                        StoredValue::$variant(v) => Ok(NativeValue::$variant(v.clone())),
                        other => Err(stored_mismatch(other, $kind)),
                    }
                }
            }
        )*
    };
}

scalar_converter! {
    /// `string` columns.
    StringConverter => String, PrimitiveKind::String;
    /// `boolean` columns.
    BooleanConverter => Boolean, PrimitiveKind::Boolean;
    /// `tinyint` columns.
    ByteConverter => Byte, PrimitiveKind::Byte;
    /// `smallint` columns.
    ShortConverter => Short, PrimitiveKind::Short;
    /// `int` columns.
    IntConverter => Int, PrimitiveKind::Int;
    /// `bigint` columns.
    LongConverter => Long, PrimitiveKind::Long;
    /// `float` columns.
    FloatConverter => Float, PrimitiveKind::Float;
    /// `double` columns.
    DoubleConverter => Double, PrimitiveKind::Double;
    /// `binary` columns.
    BinaryConverter => Binary, PrimitiveKind::Binary;
}

/// `date` columns: a calendar date stored as days since 1970-01-01.
///
/// No time zone is involved in either direction.
#[derive(Debug, Default, Clone, Copy)]
pub struct DateConverter;

impl Converter for DateConverter {
    fn to_stored_value(&self, value: &NativeValue) -> Result<StoredValue, ConvertError> {
        match value {
            NativeValue::Date(date) => Ok(StoredValue::Date(
                date.num_days_from_ce() - EPOCH_DAYS_FROM_CE,
            )),
            other => Err(native_mismatch(other, PrimitiveKind::Date)),
        }
    }

    fn to_native_value(&self, value: &StoredValue) -> Result<NativeValue, ConvertError> {
        match value {
            StoredValue::Date(days) => days
                .checked_add(EPOCH_DAYS_FROM_CE)
                .and_then(NaiveDate::from_num_days_from_ce_opt)
                .map(NativeValue::Date)
                .ok_or_else(|| out_of_range(value, PrimitiveKind::Date)),
            other => Err(stored_mismatch(other, PrimitiveKind::Date)),
        }
    }
}

/// `timestamp` columns: zone-less date-time stored as nanoseconds since
/// 1970-01-01T00:00:00.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampConverter;

impl Converter for TimestampConverter {
    fn to_stored_value(&self, value: &NativeValue) -> Result<StoredValue, ConvertError> {
        match value {
            NativeValue::Timestamp(ts) => ts
                .and_utc()
                .timestamp_nanos_opt()
                .map(StoredValue::Timestamp)
                .ok_or_else(|| out_of_range(value, PrimitiveKind::Timestamp)),
            other => Err(native_mismatch(other, PrimitiveKind::Timestamp)),
        }
    }

    fn to_native_value(&self, value: &StoredValue) -> Result<NativeValue, ConvertError> {
        match value {
            StoredValue::Timestamp(nanos) => {
                let seconds = nanos.div_euclid(NANOS_PER_SECOND);
                let subsec = nanos.rem_euclid(NANOS_PER_SECOND) as u32;
                DateTime::from_timestamp(seconds, subsec)
                    .map(|ts| NativeValue::Timestamp(ts.naive_utc()))
                    .ok_or_else(|| out_of_range(value, PrimitiveKind::Timestamp))
            }
            other => Err(stored_mismatch(other, PrimitiveKind::Timestamp)),
        }
    }
}

/// `decimal(p,s)` columns.
///
/// Accepts decimal text or a [`Decimal`] of any scale and rounds it half away
/// from zero to the column scale. Values needing more than `p` digits at that
/// scale are out of range.
#[derive(Debug, Clone, Copy)]
pub struct DecimalConverter {
    precision: u8,
    scale: u8,
}

impl DecimalConverter {
    /// Converter for `decimal(precision,scale)`.
    #[must_use]
    pub fn new(precision: u8, scale: u8) -> Self {
        Self { precision, scale }
    }

    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Decimal {
            precision: self.precision,
            scale: self.scale,
        }
    }

    fn enforce(&self, decimal: Decimal, original: &NativeValue) -> Result<Decimal, ConvertError> {
        decimal
            .rescale(self.scale)
            .filter(|rescaled| rescaled.precision() <= self.precision)
            .ok_or_else(|| out_of_range(original, self.kind()))
    }
}

impl Converter for DecimalConverter {
    fn to_stored_value(&self, value: &NativeValue) -> Result<StoredValue, ConvertError> {
        let decimal = match value {
            NativeValue::Decimal(decimal) => *decimal,
            NativeValue::String(text) => text
                .parse::<Decimal>()
                .map_err(|_| native_mismatch(value, self.kind()))?,
            other => return Err(native_mismatch(other, self.kind())),
        };
        Ok(StoredValue::Decimal(self.enforce(decimal, value)?))
    }

    fn to_native_value(&self, value: &StoredValue) -> Result<NativeValue, ConvertError> {
        match value {
            StoredValue::Decimal(decimal) => Ok(NativeValue::Decimal(*decimal)),
            other => Err(stored_mismatch(other, self.kind())),
        }
    }
}

/// `char(n)` columns; text longer than `n` is truncated on write.
#[derive(Debug, Clone, Copy)]
pub struct CharConverter {
    length: u32,
}

impl CharConverter {
    /// Converter for `char(length)`.
    #[must_use]
    pub fn new(length: u32) -> Self {
        Self { length }
    }
}

impl Converter for CharConverter {
    fn to_stored_value(&self, value: &NativeValue) -> Result<StoredValue, ConvertError> {
        match value {
            NativeValue::String(text) => Ok(StoredValue::Char(CharString::new(
                text.as_str(),
                self.length,
            ))),
            other => Err(native_mismatch(other, PrimitiveKind::Char(self.length))),
        }
    }

    fn to_native_value(&self, value: &StoredValue) -> Result<NativeValue, ConvertError> {
        match value {
            StoredValue::Char(text) => Ok(NativeValue::String(text.value().to_owned())),
            other => Err(stored_mismatch(other, PrimitiveKind::Char(self.length))),
        }
    }
}

/// `varchar(n)` columns; text longer than `n` is truncated on write.
#[derive(Debug, Clone, Copy)]
pub struct VarcharConverter {
    length: u32,
}

impl VarcharConverter {
    /// Converter for `varchar(length)`.
    #[must_use]
    pub fn new(length: u32) -> Self {
        Self { length }
    }
}

impl Converter for VarcharConverter {
    fn to_stored_value(&self, value: &NativeValue) -> Result<StoredValue, ConvertError> {
        match value {
            NativeValue::String(text) => Ok(StoredValue::Varchar(CharString::new(
                text.as_str(),
                self.length,
            ))),
            other => Err(native_mismatch(other, PrimitiveKind::Varchar(self.length))),
        }
    }

    fn to_native_value(&self, value: &StoredValue) -> Result<NativeValue, ConvertError> {
        match value {
            StoredValue::Varchar(text) => Ok(NativeValue::String(text.value().to_owned())),
            other => Err(stored_mismatch(other, PrimitiveKind::Varchar(self.length))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn round_trip(kind: PrimitiveKind, native: NativeValue) -> StoredValue {
        let converter = primitive_converter(kind);
        let stored = converter.to_stored(&native).expect("to stored");
        let back = converter.to_native(&stored).expect("to native");
        assert_eq!(back, native, "round trip through {kind}");
        stored
    }

    #[test]
    fn every_kind_round_trips() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).expect("date");
        let ts = NaiveDateTime::parse_from_str("1969-12-31 23:59:59.5", "%Y-%m-%d %H:%M:%S%.f")
            .expect("timestamp");
        let cases = [
            (PrimitiveKind::String, NativeValue::from("hello")),
            (PrimitiveKind::Boolean, NativeValue::Boolean(true)),
            (PrimitiveKind::Byte, NativeValue::Byte(-8)),
            (PrimitiveKind::Short, NativeValue::Short(300)),
            (PrimitiveKind::Int, NativeValue::Int(-70_000)),
            (PrimitiveKind::Long, NativeValue::Long(1 << 40)),
            (PrimitiveKind::Float, NativeValue::Float(1.5)),
            (PrimitiveKind::Double, NativeValue::Double(-2.25)),
            (PrimitiveKind::Binary, NativeValue::Binary(vec![0, 1, 255])),
            (PrimitiveKind::Date, NativeValue::Date(date)),
            (PrimitiveKind::Timestamp, NativeValue::Timestamp(ts)),
            (
                PrimitiveKind::Decimal {
                    precision: 5,
                    scale: 2,
                },
                NativeValue::Decimal("123.45".parse().expect("decimal")),
            ),
            (PrimitiveKind::Char(5), NativeValue::from("abc")),
            (PrimitiveKind::Varchar(5), NativeValue::from("abcde")),
        ];
        for (kind, native) in cases {
            round_trip(kind, native);
        }
    }

    #[test]
    fn null_short_circuits_both_directions() {
        let converter = primitive_converter(PrimitiveKind::Long);
        assert_eq!(
            converter.to_stored(&NativeValue::Null).expect("stored"),
            StoredValue::Null
        );
        assert_eq!(
            converter.to_native(&StoredValue::Null).expect("native"),
            NativeValue::Null
        );
    }

    #[test]
    fn numeric_kinds_are_strict() {
        let err = LongConverter
            .to_stored(&NativeValue::Int(1))
            .expect_err("int is not long");
        assert!(matches!(
            err,
            ConvertError::TypeMismatch { actual: "int", .. }
        ));
    }

    #[test]
    fn dates_are_days_since_epoch() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("date");
        assert_eq!(round_trip(PrimitiveKind::Date, NativeValue::Date(epoch)), StoredValue::Date(0));
        let before = NaiveDate::from_ymd_opt(1969, 12, 31).expect("date");
        assert_eq!(
            round_trip(PrimitiveKind::Date, NativeValue::Date(before)),
            StoredValue::Date(-1)
        );
        let err = DateConverter
            .to_native(&StoredValue::Date(i32::MAX))
            .expect_err("out of range");
        assert!(matches!(err, ConvertError::OutOfRange { .. }));
    }

    #[test]
    fn timestamps_are_nanos_since_epoch() {
        let ts = NaiveDateTime::parse_from_str("1970-01-01 00:00:01.000000002", "%Y-%m-%d %H:%M:%S%.f")
            .expect("timestamp");
        assert_eq!(
            round_trip(PrimitiveKind::Timestamp, NativeValue::Timestamp(ts)),
            StoredValue::Timestamp(1_000_000_002)
        );
        let far = NaiveDate::from_ymd_opt(3000, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("timestamp");
        let err = TimestampConverter
            .to_stored(&NativeValue::Timestamp(far))
            .expect_err("beyond i64 nanos");
        assert!(matches!(err, ConvertError::OutOfRange { .. }));
    }

    #[test]
    fn decimal_rounds_to_column_scale() {
        let converter = DecimalConverter::new(2, 1);
        for (input, expected) in [("2.1", "2.1"), ("1.23", "1.2"), ("3.45", "3.5")] {
            let stored = converter
                .to_stored(&NativeValue::from(input))
                .expect("decimal");
            let StoredValue::Decimal(decimal) = &stored else {
                panic!("expected decimal, got {stored:?}");
            };
            assert_eq!(decimal.to_string(), expected, "storing {input}");
        }
        let native = converter
            .to_stored(&NativeValue::Decimal("1.25".parse().expect("decimal")))
            .expect("decimal input");
        assert_eq!(native, StoredValue::Decimal("1.3".parse().expect("decimal")));
    }

    #[test]
    fn decimal_rejects_overflow_and_garbage() {
        let converter = DecimalConverter::new(2, 1);
        assert!(matches!(
            converter.to_stored(&NativeValue::from("123.4")),
            Err(ConvertError::OutOfRange { .. })
        ));
        assert!(matches!(
            converter.to_stored(&NativeValue::from("twelve")),
            Err(ConvertError::TypeMismatch { .. })
        ));
        assert!(matches!(
            converter.to_stored(&NativeValue::Double(1.0)),
            Err(ConvertError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn char_and_varchar_truncate_on_write() {
        let stored = CharConverter::new(3)
            .to_stored(&NativeValue::from("abcdef"))
            .expect("char");
        assert_eq!(stored, StoredValue::Char(CharString::new("abc", 3)));
        let stored = VarcharConverter::new(4)
            .to_stored(&NativeValue::from("abcdef"))
            .expect("varchar");
        assert_eq!(
            VarcharConverter::new(4).to_native(&stored).expect("native"),
            NativeValue::from("abcd")
        );
    }
}
