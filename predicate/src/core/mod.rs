#![deny(missing_docs)]
//! Core search-argument structures shared by rowbridge scans.

mod builder;
mod error;
mod leaf;
mod truth;
mod visitor;

use std::{convert::Infallible, fmt};

pub use builder::SearchArgumentBuilder;
pub use error::PredicateError;
pub use leaf::{Literal, Operator, PredicateLeaf};
use serde::{Deserialize, Serialize};
pub use truth::TruthValue;
pub use visitor::ExpressionVisitor;

/// Boolean structure over the leaves of a [`SearchArgument`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExpressionTree {
    /// Conjunction of the children.
    And(Vec<ExpressionTree>),
    /// Disjunction of the children.
    Or(Vec<ExpressionTree>),
    /// Negation of the child.
    Not(Box<ExpressionTree>),
    /// Reference into the argument's leaf table.
    Leaf(usize),
    /// Fixed verdict.
    Constant(TruthValue),
}

impl ExpressionTree {
    fn max_leaf(&self) -> Option<usize> {
        match self {
            ExpressionTree::Leaf(index) => Some(*index),
            ExpressionTree::Constant(_) => None,
            ExpressionTree::Not(inner) => inner.max_leaf(),
            ExpressionTree::And(children) | ExpressionTree::Or(children) => {
                children.iter().filter_map(ExpressionTree::max_leaf).max()
            }
        }
    }
}

impl fmt::Display for ExpressionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(
            f: &mut fmt::Formatter<'_>,
            name: &str,
            children: &[ExpressionTree],
        ) -> fmt::Result {
            write!(f, "{name}(")?;
            for (idx, child) in children.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{child}")?;
            }
            f.write_str(")")
        }

        match self {
            ExpressionTree::And(children) => list(f, "and", children),
            ExpressionTree::Or(children) => list(f, "or", children),
            ExpressionTree::Not(inner) => write!(f, "not({inner})"),
            ExpressionTree::Leaf(index) => write!(f, "leaf-{index}"),
            ExpressionTree::Constant(value) => write!(f, "{value}"),
        }
    }
}

/// A pushed-down predicate: de-duplicated leaves plus the tree combining them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchArgument {
    leaves: Vec<PredicateLeaf>,
    expression: ExpressionTree,
}

impl SearchArgument {
    /// Assembles a search argument, checking every leaf reference.
    pub fn try_new(
        leaves: Vec<PredicateLeaf>,
        expression: ExpressionTree,
    ) -> Result<Self, PredicateError> {
        if let Some(index) = expression.max_leaf() {
            if index >= leaves.len() {
                return Err(PredicateError::DanglingLeaf {
                    index,
                    len: leaves.len(),
                });
            }
        }
        Ok(Self { leaves, expression })
    }

    /// Starts a builder whose top-level clauses are AND-ed.
    #[must_use]
    pub fn builder() -> SearchArgumentBuilder {
        SearchArgumentBuilder::and()
    }

    /// The leaf table; [`ExpressionTree::Leaf`] indexes into it.
    #[must_use]
    pub fn leaves(&self) -> &[PredicateLeaf] {
        &self.leaves
    }

    /// The boolean structure over the leaves.
    #[must_use]
    pub fn expression(&self) -> &ExpressionTree {
        &self.expression
    }

    /// Combines per-leaf verdicts into the argument's verdict.
    ///
    /// `leaf_values[i]` is the verdict of `leaves()[i]`; a missing entry is
    /// treated as [`TruthValue::Unknown`].
    #[must_use]
    pub fn evaluate(&self, leaf_values: &[TruthValue]) -> TruthValue {
        let mut visitor = TruthValueVisitor { leaf_values };
        match visitor.visit_argument(self) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Encodes the argument as an opaque, configuration-safe blob.
    pub fn to_blob(&self) -> Result<String, PredicateError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reconstitutes an argument produced by [`SearchArgument::to_blob`].
    pub fn from_blob(blob: &str) -> Result<Self, PredicateError> {
        let decoded: SearchArgument = serde_json::from_str(blob)?;
        Self::try_new(decoded.leaves, decoded.expression)
    }
}

impl fmt::Display for SearchArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, leaf) in self.leaves.iter().enumerate() {
            writeln!(f, "leaf-{idx} = {leaf}")?;
        }
        write!(f, "expr = {}", self.expression)
    }
}

struct TruthValueVisitor<'a> {
    leaf_values: &'a [TruthValue],
}

impl ExpressionVisitor for TruthValueVisitor<'_> {
    type Error = Infallible;
    type Value = TruthValue;

    fn visit_leaf(
        &mut self,
        index: usize,
        _leaf: &PredicateLeaf,
    ) -> Result<Self::Value, Self::Error> {
        Ok(self
            .leaf_values
            .get(index)
            .copied()
            .unwrap_or(TruthValue::Unknown))
    }

    fn visit_constant(&mut self, value: TruthValue) -> Result<Self::Value, Self::Error> {
        Ok(value)
    }

    fn combine_not(&mut self, child: Self::Value) -> Result<Self::Value, Self::Error> {
        Ok(child.not())
    }

    fn combine_and(&mut self, children: Vec<Self::Value>) -> Result<Self::Value, Self::Error> {
        Ok(children.into_iter().fold(TruthValue::Yes, TruthValue::and))
    }

    fn combine_or(&mut self, children: Vec<Self::Value>) -> Result<Self::Value, Self::Error> {
        Ok(children.into_iter().fold(TruthValue::No, TruthValue::or))
    }
}
