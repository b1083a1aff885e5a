#![deny(missing_docs)]
//! rowbridge search-argument facade crate.
//!
//! A search argument is a boolean expression tree whose leaves each compare a
//! single column against literal values. The tree is storage agnostic: it is
//! built once by a query planner, shipped to scans as an opaque blob, and
//! evaluated per row with three-valued logic once every leaf has produced a
//! [`TruthValue`].

mod core;

pub use core::{
    ExpressionTree, ExpressionVisitor, Literal, Operator, PredicateError, PredicateLeaf,
    SearchArgument, SearchArgumentBuilder, TruthValue,
};
