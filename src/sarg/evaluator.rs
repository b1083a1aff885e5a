use std::cmp::Ordering;

use rowbridge_predicate::{Literal, Operator, PredicateLeaf, TruthValue};

use super::EvaluatorError;
use crate::{
    error::Error,
    marshal::Row,
    types::{DataType, PrimitiveKind, StructType},
    value::{CharString, Decimal, StoredValue},
};

/// Builds [`Evaluator`]s for predicate leaves against one schema.
#[derive(Debug, Clone, Copy)]
pub struct EvaluatorFactory<'a> {
    schema: &'a StructType,
}

impl<'a> EvaluatorFactory<'a> {
    /// A factory resolving columns in `schema`.
    pub fn new(schema: &'a StructType) -> Self {
        Self { schema }
    }

    /// Binds `leaf` to its column, coercing every literal into the column's
    /// stored form up front.
    pub fn build(&self, leaf: &PredicateLeaf) -> Result<Evaluator, EvaluatorError> {
        let (_, field) = self
            .schema
            .field_by_name(leaf.column())
            .ok_or_else(|| EvaluatorError::UnknownColumn(leaf.column().to_owned()))?;
        let data_type = field.data_type();
        let kind = match data_type {
            DataType::Primitive(PrimitiveKind::Binary) | DataType::Struct(_)
            | DataType::List(_) | DataType::Map(..) | DataType::Union(_) => {
                return Err(EvaluatorError::UnsupportedColumnType {
                    column: field.name().to_owned(),
                    data_type: data_type.to_string(),
                })
            }
            DataType::Primitive(kind) => *kind,
        };
        kind.validate()?;

        let coerce = |literal: &Literal| coerce_literal(kind, literal).ok_or_else(|| {
            EvaluatorError::InvalidLiteral {
                column: field.name().to_owned(),
                data_type: data_type.to_string(),
                literal: literal.to_string(),
            }
        });
        let literals = leaf.literals();
        let arity = |expected: &'static str, ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(EvaluatorError::InvalidArity {
                    operator: leaf.operator(),
                    column: field.name().to_owned(),
                    expected,
                    actual: literals.len(),
                })
            }
        };

        let comparison = match leaf.operator() {
            Operator::Equals | Operator::NullSafeEquals => {
                arity("exactly 1", literals.len() == 1)?;
                Comparison::Equals(coerce(&literals[0])?)
            }
            Operator::LessThan | Operator::LessThanEquals => {
                arity("exactly 1", literals.len() == 1)?;
                Comparison::LessThan {
                    literal: coerce(&literals[0])?,
                    threshold: if leaf.operator() == Operator::LessThan {
                        0
                    } else {
                        -1
                    },
                }
            }
            Operator::In => {
                arity("at least 1", !literals.is_empty())?;
                Comparison::In(literals.iter().map(coerce).collect::<Result<_, _>>()?)
            }
            Operator::Between => {
                arity("exactly 2", literals.len() == 2)?;
                Comparison::Between {
                    lower: coerce(&literals[0])?,
                    upper: coerce(&literals[1])?,
                }
            }
            Operator::IsNull => Comparison::IsNull,
        };
        Ok(Evaluator {
            column: field.name().to_owned(),
            comparison,
        })
    }
}

/// Narrows a generic literal to the stored form of `kind`.
fn coerce_literal(kind: PrimitiveKind, literal: &Literal) -> Option<StoredValue> {
    let value = match (kind, literal) {
        (PrimitiveKind::Byte, Literal::Long(v)) => StoredValue::Byte(*v as i8),
        (PrimitiveKind::Short, Literal::Long(v)) => StoredValue::Short(*v as i16),
        (PrimitiveKind::Int, Literal::Long(v)) => StoredValue::Int(*v as i32),
        (PrimitiveKind::Long, Literal::Long(v)) => StoredValue::Long(*v),
        (PrimitiveKind::Float, Literal::Float(v)) => StoredValue::Float(*v as f32),
        (PrimitiveKind::Double, Literal::Float(v)) => StoredValue::Double(*v),
        (PrimitiveKind::String, Literal::String(v)) => StoredValue::String(v.clone()),
        (PrimitiveKind::Char(length), Literal::String(v)) => {
            StoredValue::Char(CharString::new(v.as_str(), length))
        }
        (PrimitiveKind::Varchar(length), Literal::String(v)) => {
            StoredValue::Varchar(CharString::new(v.as_str(), length))
        }
        (PrimitiveKind::Decimal { .. }, Literal::Decimal(v)) => {
            StoredValue::Decimal(v.parse::<Decimal>().ok()?)
        }
        (PrimitiveKind::Timestamp, Literal::Timestamp(v)) => StoredValue::Timestamp(*v),
        (PrimitiveKind::Date, Literal::Date(v)) => StoredValue::Date(*v),
        (PrimitiveKind::Boolean, Literal::Boolean(v)) => StoredValue::Boolean(*v),
        _ => return None,
    };
    Some(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Comparison {
    Equals(StoredValue),
    /// Yes when `literal.compare(value) > threshold`: 0 for `<`, -1 for `<=`.
    LessThan {
        literal: StoredValue,
        threshold: i8,
    },
    In(Vec<StoredValue>),
    Between {
        lower: StoredValue,
        upper: StoredValue,
    },
    IsNull,
}

/// One predicate leaf bound to a column and pre-coerced literals.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluator {
    column: String,
    comparison: Comparison,
}

impl Evaluator {
    /// Declared name of the bound column.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Evaluates against the bound column of `row`. A column the row does not
    /// carry evaluates like a null.
    pub fn evaluate_row(&self, row: &mut Row) -> Result<TruthValue, Error> {
        Ok(self.evaluate(row.get_stored(&self.column)?))
    }

    /// Evaluates against one raw stored value.
    ///
    /// Every comparison yields `Unknown` on null; `IS NULL` never does.
    pub fn evaluate(&self, value: Option<&StoredValue>) -> TruthValue {
        let value = match value {
            Some(value) if !value.is_null() => value,
            _ => {
                return match self.comparison {
                    Comparison::IsNull => TruthValue::Yes,
                    _ => TruthValue::Unknown,
                }
            }
        };
        match &self.comparison {
            Comparison::IsNull => TruthValue::No,
            Comparison::Equals(literal) => match literal.compare(value) {
                Some(ordering) => TruthValue::from(ordering == Ordering::Equal),
                None => TruthValue::Unknown,
            },
            Comparison::LessThan { literal, threshold } => match literal.compare(value) {
                Some(ordering) => TruthValue::from(ordering as i8 > *threshold),
                None => TruthValue::Unknown,
            },
            Comparison::In(literals) => {
                let mut verdict = TruthValue::No;
                for literal in literals {
                    match literal.compare(value) {
                        Some(Ordering::Equal) => return TruthValue::Yes,
                        Some(_) => {}
                        None => verdict = TruthValue::Unknown,
                    }
                }
                verdict
            }
            Comparison::Between { lower, upper } => {
                match (lower.compare(value), value.compare(upper)) {
                    (Some(low), Some(high)) => {
                        TruthValue::from(low != Ordering::Greater && high != Ordering::Greater)
                    }
                    _ => TruthValue::Unknown,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> StructType {
        StructType::builder()
            .column("a", PrimitiveKind::Long)
            .column("s", PrimitiveKind::Short)
            .column("code", PrimitiveKind::Char(2))
            .column("price", PrimitiveKind::Decimal { precision: 5, scale: 2 })
            .column("ratio", PrimitiveKind::Double)
            .column("blob", PrimitiveKind::Binary)
            .column("tags", DataType::list(PrimitiveKind::String))
            .build()
            .expect("schema")
    }

    fn build(leaf: PredicateLeaf) -> Result<Evaluator, EvaluatorError> {
        EvaluatorFactory::new(&schema()).build(&leaf)
    }

    fn verdicts(evaluator: &Evaluator, values: &[StoredValue]) -> Vec<TruthValue> {
        values
            .iter()
            .map(|value| evaluator.evaluate(Some(value)))
            .collect()
    }

    #[test]
    fn between_is_inclusive_and_unknown_on_null() {
        let evaluator = build(PredicateLeaf::new(
            Operator::Between,
            "a",
            vec![Literal::Long(1), Literal::Long(3)],
        ))
        .expect("between");
        let values: Vec<StoredValue> = (0..5).map(StoredValue::Long).collect();
        assert_eq!(
            verdicts(&evaluator, &values),
            vec![
                TruthValue::No,
                TruthValue::Yes,
                TruthValue::Yes,
                TruthValue::Yes,
                TruthValue::No
            ]
        );
        assert_eq!(evaluator.evaluate(Some(&StoredValue::Null)), TruthValue::Unknown);
        assert_eq!(evaluator.evaluate(None), TruthValue::Unknown);
    }

    #[test]
    fn less_than_thresholds() {
        let values = [StoredValue::Long(1), StoredValue::Long(2), StoredValue::Long(3)];
        let strict = build(PredicateLeaf::new(Operator::LessThan, "a", vec![Literal::Long(2)]))
            .expect("lt");
        assert_eq!(
            verdicts(&strict, &values),
            vec![TruthValue::Yes, TruthValue::No, TruthValue::No]
        );
        let inclusive = build(PredicateLeaf::new(
            Operator::LessThanEquals,
            "a",
            vec![Literal::Long(2)],
        ))
        .expect("lte");
        assert_eq!(
            verdicts(&inclusive, &values),
            vec![TruthValue::Yes, TruthValue::Yes, TruthValue::No]
        );
    }

    #[test]
    fn literals_are_narrowed_to_the_column_kind() {
        let evaluator = build(PredicateLeaf::new(Operator::Equals, "S", vec![Literal::Long(7)]))
            .expect("short");
        assert_eq!(evaluator.column(), "s");
        assert_eq!(evaluator.evaluate(Some(&StoredValue::Short(7))), TruthValue::Yes);

        let evaluator = build(PredicateLeaf::new(
            Operator::Equals,
            "code",
            vec![Literal::from("abc")],
        ))
        .expect("char");
        assert_eq!(
            evaluator.evaluate(Some(&StoredValue::Char(CharString::new("ab", 2)))),
            TruthValue::Yes
        );

        let evaluator = build(PredicateLeaf::new(
            Operator::LessThan,
            "price",
            vec![Literal::Decimal("10.5".to_owned())],
        ))
        .expect("decimal");
        assert_eq!(
            evaluator.evaluate(Some(&StoredValue::Decimal("10.49".parse().expect("decimal")))),
            TruthValue::Yes
        );
    }

    #[test]
    fn in_list_and_null_checks() {
        let evaluator = build(PredicateLeaf::new(
            Operator::In,
            "a",
            vec![Literal::Long(1), Literal::Long(5)],
        ))
        .expect("in");
        assert_eq!(evaluator.evaluate(Some(&StoredValue::Long(5))), TruthValue::Yes);
        assert_eq!(evaluator.evaluate(Some(&StoredValue::Long(2))), TruthValue::No);
        assert_eq!(evaluator.evaluate(Some(&StoredValue::Null)), TruthValue::Unknown);

        let is_null = build(PredicateLeaf::new(Operator::IsNull, "a", Vec::new())).expect("null");
        assert_eq!(is_null.evaluate(None), TruthValue::Yes);
        assert_eq!(is_null.evaluate(Some(&StoredValue::Long(0))), TruthValue::No);
    }

    #[test]
    fn nan_compares_as_unknown() {
        let evaluator = build(PredicateLeaf::new(
            Operator::Equals,
            "ratio",
            vec![Literal::Float(0.5)],
        ))
        .expect("double");
        assert_eq!(
            evaluator.evaluate(Some(&StoredValue::Double(f64::NAN))),
            TruthValue::Unknown
        );
    }

    #[test]
    fn construction_errors() {
        assert!(matches!(
            build(PredicateLeaf::new(Operator::Equals, "missing", vec![Literal::Long(1)])),
            Err(EvaluatorError::UnknownColumn(column)) if column == "missing"
        ));
        assert!(matches!(
            build(PredicateLeaf::new(Operator::IsNull, "blob", Vec::new())),
            Err(EvaluatorError::UnsupportedColumnType { .. })
        ));
        assert!(matches!(
            build(PredicateLeaf::new(Operator::IsNull, "tags", Vec::new())),
            Err(EvaluatorError::UnsupportedColumnType { .. })
        ));
        assert!(matches!(
            build(PredicateLeaf::new(Operator::Equals, "a", vec![Literal::from("1")])),
            Err(EvaluatorError::InvalidLiteral { .. })
        ));
        assert!(matches!(
            build(PredicateLeaf::new(Operator::Equals, "a", vec![Literal::Null])),
            Err(EvaluatorError::InvalidLiteral { .. })
        ));
        assert!(matches!(
            build(PredicateLeaf::new(Operator::Between, "a", vec![Literal::Long(1)])),
            Err(EvaluatorError::InvalidArity { actual: 1, .. })
        ));
    }
}
