use std::fmt;

use rowbridge_predicate::{SearchArgument, TruthValue};

use super::{Evaluator, EvaluatorError, EvaluatorFactory};
use crate::{error::Error, marshal::Row, types::StructType};

/// Accept/reject decision over raw rows.
pub trait RowFilter: fmt::Debug + Send + Sync {
    /// True when `row` should be handed upstream.
    fn accept(&self, row: &mut Row) -> Result<bool, Error>;
}

/// Accepts every row; used when row-level filtering is off.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl RowFilter for AcceptAll {
    fn accept(&self, _: &mut Row) -> Result<bool, Error> {
        Ok(true)
    }
}

/// Evaluates a [`SearchArgument`] per row with three-valued logic.
///
/// Only a final `Yes` accepts; `No` and `Unknown` both reject.
#[derive(Debug, Clone)]
pub struct SearchArgumentFilter {
    argument: SearchArgument,
    evaluators: Vec<Evaluator>,
}

impl SearchArgumentFilter {
    /// Builds one evaluator per leaf of `argument` against `schema`.
    pub fn new(argument: SearchArgument, schema: &StructType) -> Result<Self, EvaluatorError> {
        let factory = EvaluatorFactory::new(schema);
        let evaluators = argument
            .leaves()
            .iter()
            .map(|leaf| factory.build(leaf))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            argument,
            evaluators,
        })
    }

    /// Reconstitutes the argument from its blob form, then binds it.
    pub fn from_blob(blob: &str, schema: &StructType) -> Result<Self, Error> {
        Ok(Self::new(SearchArgument::from_blob(blob)?, schema)?)
    }

    /// The bound search argument.
    pub fn argument(&self) -> &SearchArgument {
        &self.argument
    }

    /// The final verdict for `row`.
    pub fn evaluate(&self, row: &mut Row) -> Result<TruthValue, Error> {
        let leaf_values = self
            .evaluators
            .iter()
            .map(|evaluator| evaluator.evaluate_row(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.argument.evaluate(&leaf_values))
    }
}

impl RowFilter for SearchArgumentFilter {
    fn accept(&self, row: &mut Row) -> Result<bool, Error> {
        Ok(self.evaluate(row)?.is_yes())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::{
        convert::{build_with, Converter, ConverterFactory},
        types::{DataType, PrimitiveKind, SchemaError},
        value::StoredValue,
    };

    fn row(schema: &Arc<StructType>, value: Option<i64>) -> Row {
        let mut row = Row::with_default_factory(schema.clone());
        row.set("a", value).expect("set");
        row
    }

    #[test]
    fn not_between_inverts_known_verdicts_only() {
        let schema = Arc::new(
            StructType::builder()
                .column("a", PrimitiveKind::Long)
                .build()
                .expect("schema"),
        );
        let argument = SearchArgument::builder()
            .not_group(|group| group.between("a", 1i64, 3i64))
            .build()
            .expect("argument");
        let filter = SearchArgumentFilter::new(argument, &schema).expect("filter");

        let verdicts: Vec<TruthValue> = [Some(0), Some(2), Some(4), None]
            .into_iter()
            .map(|value| filter.evaluate(&mut row(&schema, value)).expect("verdict"))
            .collect();
        assert_eq!(
            verdicts,
            vec![
                TruthValue::Yes,
                TruthValue::No,
                TruthValue::Yes,
                TruthValue::Unknown
            ]
        );
        assert!(!filter.accept(&mut row(&schema, None)).expect("verdict"));
        assert!(AcceptAll.accept(&mut row(&schema, None)).expect("verdict"));
    }

    #[test]
    fn filters_survive_blob_round_trip() {
        let schema = StructType::builder()
            .column("name", PrimitiveKind::String)
            .build()
            .expect("schema");
        let blob = SearchArgument::builder()
            .equals("NAME", "x")
            .build()
            .expect("argument")
            .to_blob()
            .expect("blob");
        let filter = SearchArgumentFilter::from_blob(&blob, &schema).expect("filter");
        assert_eq!(filter.argument().leaves().len(), 1);

        let mut row = Row::with_default_factory(Arc::new(schema));
        row.set("name", "x").expect("set");
        assert!(filter.accept(&mut row).expect("verdict"));
    }

    #[derive(Debug, Default)]
    struct CountingFactory {
        builds: AtomicUsize,
    }

    impl ConverterFactory for CountingFactory {
        fn build(&self, data_type: &DataType) -> Result<Box<dyn Converter>, SchemaError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            build_with(self, data_type)
        }
    }

    #[test]
    fn columns_resolve_once_across_rows() {
        let schema = Arc::new(
            StructType::builder()
                .column("A", PrimitiveKind::Long)
                .build()
                .expect("schema"),
        );
        let argument = SearchArgument::builder()
            .or_group(|group| group.equals("a", 2i64).is_null("a"))
            .build()
            .expect("argument");
        let filter = SearchArgumentFilter::new(argument, &schema).expect("filter");
        let factory = Arc::new(CountingFactory::default());
        let mut row = Row::new(schema, factory.clone());

        let mut accepted = Vec::new();
        for value in 0..5i64 {
            row.stored_row_mut().set(0, StoredValue::Long(value));
            if filter.accept(&mut row).expect("verdict") {
                accepted.push(value);
            }
        }
        assert_eq!(accepted, vec![2]);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
        assert_eq!(row.cached_marshallers(), 1);
    }

    #[test]
    fn unknown_columns_fail_at_construction() {
        let schema = StructType::builder()
            .column("a", PrimitiveKind::Long)
            .build()
            .expect("schema");
        let argument = SearchArgument::builder()
            .is_null("b")
            .build()
            .expect("argument");
        assert!(matches!(
            SearchArgumentFilter::new(argument, &schema),
            Err(EvaluatorError::UnknownColumn(_))
        ));
    }
}
