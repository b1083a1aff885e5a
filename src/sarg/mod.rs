//! Row-level evaluation of pushed-down search arguments.
//!
//! Leaves are bound to schema columns once by [`EvaluatorFactory`]; each row is
//! then judged by reading raw stored values, never by converting to the native
//! domain.

mod error;
mod evaluator;
mod filter;

pub use error::EvaluatorError;
pub use evaluator::{Evaluator, EvaluatorFactory};
pub use filter::{AcceptAll, RowFilter, SearchArgumentFilter};
pub use rowbridge_predicate::{
    ExpressionTree, ExpressionVisitor, Literal, Operator, PredicateError, PredicateLeaf,
    SearchArgument, SearchArgumentBuilder, TruthValue,
};
