//! Builder for composing search arguments.

use super::{
    ExpressionTree, Literal, Operator, PredicateError, PredicateLeaf, SearchArgument,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BuilderCombine {
    Conjunction,
    Disjunction,
}

impl BuilderCombine {
    fn name(self) -> &'static str {
        match self {
            BuilderCombine::Conjunction => "and",
            BuilderCombine::Disjunction => "or",
        }
    }
}

#[derive(Clone, Debug)]
enum Clause {
    Leaf(PredicateLeaf),
    And(Vec<Clause>),
    Or(Vec<Clause>),
    Not(Box<Clause>),
}

impl Clause {
    fn negate(self) -> Clause {
        match self {
            Clause::Not(inner) => *inner,
            other => Clause::Not(Box::new(other)),
        }
    }
}

/// Builder for composing search arguments incrementally.
///
/// Errors (blank column names, empty groups, bad literal counts) are recorded
/// as they happen and reported once by [`SearchArgumentBuilder::build`], so
/// the fluent chain never has to be broken up.
#[derive(Debug)]
pub struct SearchArgumentBuilder {
    combine: BuilderCombine,
    clauses: Vec<Clause>,
    error: Option<PredicateError>,
}

impl SearchArgumentBuilder {
    const fn new(combine: BuilderCombine) -> Self {
        Self {
            combine,
            clauses: Vec::new(),
            error: None,
        }
    }

    /// Creates a builder that emits an `AND` of all clauses.
    #[must_use]
    pub fn and() -> Self {
        Self::new(BuilderCombine::Conjunction)
    }

    /// Creates a builder that emits an `OR` of all clauses.
    #[must_use]
    pub fn or() -> Self {
        Self::new(BuilderCombine::Disjunction)
    }

    /// Adds `column = literal`.
    #[must_use]
    pub fn equals<C, L>(self, column: C, literal: L) -> Self
    where
        C: AsRef<str>,
        L: Into<Literal>,
    {
        self.leaf(Operator::Equals, column, vec![literal.into()])
    }

    /// Adds `column <=> literal`.
    #[must_use]
    pub fn null_safe_equals<C, L>(self, column: C, literal: L) -> Self
    where
        C: AsRef<str>,
        L: Into<Literal>,
    {
        self.leaf(Operator::NullSafeEquals, column, vec![literal.into()])
    }

    /// Adds `column < literal`.
    #[must_use]
    pub fn less_than<C, L>(self, column: C, literal: L) -> Self
    where
        C: AsRef<str>,
        L: Into<Literal>,
    {
        self.leaf(Operator::LessThan, column, vec![literal.into()])
    }

    /// Adds `column <= literal`.
    #[must_use]
    pub fn less_than_equals<C, L>(self, column: C, literal: L) -> Self
    where
        C: AsRef<str>,
        L: Into<Literal>,
    {
        self.leaf(Operator::LessThanEquals, column, vec![literal.into()])
    }

    /// Adds `column > literal`, spelled `NOT(column <= literal)`.
    #[must_use]
    pub fn greater_than<C, L>(self, column: C, literal: L) -> Self
    where
        C: AsRef<str>,
        L: Into<Literal>,
    {
        self.negated_leaf(Operator::LessThanEquals, column, vec![literal.into()])
    }

    /// Adds `column >= literal`, spelled `NOT(column < literal)`.
    #[must_use]
    pub fn greater_than_equals<C, L>(self, column: C, literal: L) -> Self
    where
        C: AsRef<str>,
        L: Into<Literal>,
    {
        self.negated_leaf(Operator::LessThan, column, vec![literal.into()])
    }

    /// Adds `column IN (literals...)`.
    #[must_use]
    pub fn in_list<C, I, L>(self, column: C, literals: I) -> Self
    where
        C: AsRef<str>,
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        let literals: Vec<Literal> = literals.into_iter().map(Into::into).collect();
        self.leaf(Operator::In, column, literals)
    }

    /// Adds `column BETWEEN lower AND upper`.
    #[must_use]
    pub fn between<C, L, U>(self, column: C, lower: L, upper: U) -> Self
    where
        C: AsRef<str>,
        L: Into<Literal>,
        U: Into<Literal>,
    {
        self.leaf(Operator::Between, column, vec![lower.into(), upper.into()])
    }

    /// Adds `column IS NULL`.
    #[must_use]
    pub fn is_null<C>(self, column: C) -> Self
    where
        C: AsRef<str>,
    {
        self.leaf(Operator::IsNull, column, Vec::new())
    }

    /// Adds a nested conjunction built by the supplied closure.
    #[must_use]
    pub fn and_group<F>(self, build: F) -> Self
    where
        F: FnOnce(SearchArgumentBuilder) -> SearchArgumentBuilder,
    {
        self.branch(BuilderCombine::Conjunction, false, build)
    }

    /// Adds a nested disjunction built by the supplied closure.
    #[must_use]
    pub fn or_group<F>(self, build: F) -> Self
    where
        F: FnOnce(SearchArgumentBuilder) -> SearchArgumentBuilder,
    {
        self.branch(BuilderCombine::Disjunction, false, build)
    }

    /// Adds the negation of the conjunction built by the supplied closure.
    #[must_use]
    pub fn not_group<F>(self, build: F) -> Self
    where
        F: FnOnce(SearchArgumentBuilder) -> SearchArgumentBuilder,
    {
        self.branch(BuilderCombine::Conjunction, true, build)
    }

    /// Consumes the builder and returns the composed search argument.
    pub fn build(self) -> Result<SearchArgument, PredicateError> {
        let clause = self.into_clause()?;
        let mut leaves = Vec::new();
        let expression = intern(clause, &mut leaves);
        SearchArgument::try_new(leaves, expression)
    }

    fn branch<F>(mut self, combine: BuilderCombine, negate: bool, build: F) -> Self
    where
        F: FnOnce(SearchArgumentBuilder) -> SearchArgumentBuilder,
    {
        match build(SearchArgumentBuilder::new(combine)).into_clause() {
            Ok(clause) => {
                let clause = if negate { clause.negate() } else { clause };
                self.clauses.push(clause);
            }
            Err(err) => self.record(err),
        }
        self
    }

    fn leaf<C>(mut self, operator: Operator, column: C, literals: Vec<Literal>) -> Self
    where
        C: AsRef<str>,
    {
        if let Some(leaf) = self.checked_leaf(operator, column.as_ref(), literals) {
            self.clauses.push(Clause::Leaf(leaf));
        }
        self
    }

    fn negated_leaf<C>(mut self, operator: Operator, column: C, literals: Vec<Literal>) -> Self
    where
        C: AsRef<str>,
    {
        if let Some(leaf) = self.checked_leaf(operator, column.as_ref(), literals) {
            self.clauses.push(Clause::Leaf(leaf).negate());
        }
        self
    }

    fn checked_leaf(
        &mut self,
        operator: Operator,
        column: &str,
        literals: Vec<Literal>,
    ) -> Option<PredicateLeaf> {
        if column.trim().is_empty() {
            self.record(PredicateError::EmptyColumn);
            return None;
        }
        if operator == Operator::In && literals.is_empty() {
            self.record(PredicateError::InvalidArity {
                op: operator,
                column: column.to_lowercase(),
                expected: "at least 1",
                got: 0,
            });
            return None;
        }
        Some(PredicateLeaf::new(operator, column, literals))
    }

    fn record(&mut self, err: PredicateError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn into_clause(self) -> Result<Clause, PredicateError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let mut acc = Vec::with_capacity(self.clauses.len());
        for clause in self.clauses {
            match (self.combine, clause) {
                (BuilderCombine::Conjunction, Clause::And(mut nested))
                | (BuilderCombine::Disjunction, Clause::Or(mut nested)) => acc.append(&mut nested),
                (_, other) => acc.push(other),
            }
        }
        match acc.len() {
            0 => Err(PredicateError::EmptyGroup(self.combine.name())),
            1 => Ok(acc.remove(0)),
            _ => Ok(match self.combine {
                BuilderCombine::Conjunction => Clause::And(acc),
                BuilderCombine::Disjunction => Clause::Or(acc),
            }),
        }
    }
}

impl Default for SearchArgumentBuilder {
    fn default() -> Self {
        Self::and()
    }
}

fn intern(clause: Clause, leaves: &mut Vec<PredicateLeaf>) -> ExpressionTree {
    match clause {
        Clause::Leaf(leaf) => {
            let index = match leaves.iter().position(|existing| existing == &leaf) {
                Some(index) => index,
                None => {
                    leaves.push(leaf);
                    leaves.len() - 1
                }
            };
            ExpressionTree::Leaf(index)
        }
        Clause::And(children) => {
            ExpressionTree::And(children.into_iter().map(|c| intern(c, leaves)).collect())
        }
        Clause::Or(children) => {
            ExpressionTree::Or(children.into_iter().map(|c| intern(c, leaves)).collect())
        }
        Clause::Not(inner) => ExpressionTree::Not(Box::new(intern(*inner, leaves))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_is_rejected() {
        let err = SearchArgumentBuilder::and().build().expect_err("empty");
        assert!(matches!(err, PredicateError::EmptyGroup("and")));
    }

    #[test]
    fn empty_nested_group_is_rejected() {
        let err = SearchArgumentBuilder::and()
            .equals("a", 1i64)
            .or_group(|group| group)
            .build()
            .expect_err("empty group");
        assert!(matches!(err, PredicateError::EmptyGroup("or")));
    }

    #[test]
    fn blank_column_is_rejected() {
        let err = SearchArgumentBuilder::and()
            .equals("  ", 1i64)
            .build()
            .expect_err("blank column");
        assert!(matches!(err, PredicateError::EmptyColumn));
    }

    #[test]
    fn empty_in_list_is_rejected() {
        let err = SearchArgumentBuilder::and()
            .in_list("a", Vec::<i64>::new())
            .build()
            .expect_err("empty in");
        assert!(matches!(
            err,
            PredicateError::InvalidArity {
                op: Operator::In,
                got: 0,
                ..
            }
        ));
    }

    #[test]
    fn identical_leaves_share_an_index() {
        let argument = SearchArgumentBuilder::or()
            .equals("a", 1i64)
            .and_group(|group| group.equals("A", 1i64).is_null("b"))
            .build()
            .expect("valid argument");
        assert_eq!(argument.leaves().len(), 2);
        assert_eq!(
            argument.expression(),
            &ExpressionTree::Or(vec![
                ExpressionTree::Leaf(0),
                ExpressionTree::And(vec![ExpressionTree::Leaf(0), ExpressionTree::Leaf(1)]),
            ])
        );
    }

    #[test]
    fn greater_than_equals_is_negated_less_than() {
        let argument = SearchArgumentBuilder::and()
            .greater_than_equals("a", 3i64)
            .build()
            .expect("valid argument");
        assert_eq!(argument.leaves()[0].operator(), Operator::LessThan);
        assert_eq!(
            argument.expression(),
            &ExpressionTree::Not(Box::new(ExpressionTree::Leaf(0)))
        );
    }

    #[test]
    fn double_negation_collapses() {
        let argument = SearchArgumentBuilder::and()
            .not_group(|group| group.greater_than("a", 3i64))
            .build()
            .expect("valid argument");
        assert_eq!(argument.expression(), &ExpressionTree::Leaf(0));
        assert_eq!(argument.leaves()[0].operator(), Operator::LessThanEquals);
    }

    #[test]
    fn nested_conjunctions_flatten() {
        let argument = SearchArgumentBuilder::and()
            .equals("a", 1i64)
            .and_group(|group| group.equals("b", 2i64).equals("c", 3i64))
            .build()
            .expect("valid argument");
        assert_eq!(
            argument.expression(),
            &ExpressionTree::And(vec![
                ExpressionTree::Leaf(0),
                ExpressionTree::Leaf(1),
                ExpressionTree::Leaf(2),
            ])
        );
    }
}
