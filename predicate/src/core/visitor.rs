use super::{ExpressionTree, PredicateLeaf, SearchArgument, TruthValue};

/// Visitor that walks a search argument's expression tree bottom-up.
///
/// Leaves are resolved through the argument's leaf table, so a leaf shared by
/// several branches is visited once per reference.
pub trait ExpressionVisitor {
    /// Error type used when evaluation fails.
    type Error;
    /// Concrete value type produced while walking the tree.
    type Value;

    /// Evaluates the leaf stored at `index`.
    fn visit_leaf(
        &mut self,
        index: usize,
        leaf: &PredicateLeaf,
    ) -> Result<Self::Value, Self::Error>;

    /// Evaluates a constant node.
    fn visit_constant(&mut self, value: TruthValue) -> Result<Self::Value, Self::Error>;

    /// Combines the result of a negated child.
    fn combine_not(&mut self, child: Self::Value) -> Result<Self::Value, Self::Error>;

    /// Combines an `AND` node from its children's results.
    fn combine_and(&mut self, children: Vec<Self::Value>) -> Result<Self::Value, Self::Error>;

    /// Combines an `OR` node from its children's results.
    fn combine_or(&mut self, children: Vec<Self::Value>) -> Result<Self::Value, Self::Error>;

    /// Visits the whole search argument.
    fn visit_argument(&mut self, argument: &SearchArgument) -> Result<Self::Value, Self::Error> {
        self.visit_node(argument.expression(), argument.leaves())
    }

    /// Internal helper that evaluates a node recursively.
    fn visit_node(
        &mut self,
        node: &ExpressionTree,
        leaves: &[PredicateLeaf],
    ) -> Result<Self::Value, Self::Error> {
        match node {
            ExpressionTree::Leaf(index) => match leaves.get(*index) {
                Some(leaf) => self.visit_leaf(*index, leaf),
                None => {
                    debug_assert!(false, "SearchArgument validates leaf indices");
                    self.visit_constant(TruthValue::Unknown)
                }
            },
            ExpressionTree::Constant(value) => self.visit_constant(*value),
            ExpressionTree::Not(inner) => {
                let child = self.visit_node(inner, leaves)?;
                self.combine_not(child)
            }
            ExpressionTree::And(children) => {
                let mut values = Vec::with_capacity(children.len());
                for child in children {
                    values.push(self.visit_node(child, leaves)?);
                }
                self.combine_and(values)
            }
            ExpressionTree::Or(children) => {
                let mut values = Vec::with_capacity(children.len());
                for child in children {
                    values.push(self.visit_node(child, leaves)?);
                }
                self.combine_or(values)
            }
        }
    }
}
