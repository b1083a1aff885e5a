use std::fmt;

use serde::{Deserialize, Serialize};

/// Operator applied by a single predicate leaf.
///
/// Greater-than comparisons are not first-class: they are spelled as the
/// negation of [`Operator::LessThanEquals`] / [`Operator::LessThan`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `col = literal`.
    Equals,
    /// `col <=> literal`; differs from `Equals` only in how NULL columns are
    /// treated by the surrounding tree.
    NullSafeEquals,
    /// `col < literal`.
    LessThan,
    /// `col <= literal`.
    LessThanEquals,
    /// `col IN (literal, ...)`.
    In,
    /// `col BETWEEN lower AND upper`, both bounds inclusive.
    Between,
    /// `col IS NULL`.
    IsNull,
}

impl Operator {
    /// Returns a textual representation of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NullSafeEquals => "<=>",
            Operator::LessThan => "<",
            Operator::LessThanEquals => "<=",
            Operator::In => "IN",
            Operator::Between => "BETWEEN",
            Operator::IsNull => "IS NULL",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal in its generic, storage-independent form.
///
/// Every integral column kind receives a [`Literal::Long`], every floating kind
/// a [`Literal::Float`], and char/varchar columns a [`Literal::String`]; the
/// evaluator factory narrows them to the column's stored representation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// SQL `NULL`.
    Null,
    /// Boolean literal.
    Boolean(bool),
    /// Any integral literal.
    Long(i64),
    /// Any floating point literal.
    Float(f64),
    /// Text literal.
    String(String),
    /// Decimal literal in canonical text form, e.g. `"12.50"`.
    Decimal(String),
    /// Nanoseconds since `1970-01-01T00:00:00`, zone-less.
    Timestamp(i64),
    /// Days since `1970-01-01`.
    Date(i32),
}

impl Literal {
    /// Returns true for [`Literal::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Short name of the literal kind, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Boolean(_) => "boolean",
            Literal::Long(_) => "long",
            Literal::Float(_) => "float",
            Literal::String(_) => "string",
            Literal::Decimal(_) => "decimal",
            Literal::Timestamp(_) => "timestamp",
            Literal::Date(_) => "date",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("NULL"),
            Literal::Boolean(v) => write!(f, "{v}"),
            Literal::Long(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v}"),
            Literal::String(v) => write!(f, "'{v}'"),
            Literal::Decimal(v) => write!(f, "{v}BD"),
            Literal::Timestamp(v) => write!(f, "timestamp({v})"),
            Literal::Date(v) => write!(f, "date({v})"),
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Long(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Long(i64::from(value))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_owned())
    }
}

/// One atomic column comparison within a search argument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredicateLeaf {
    operator: Operator,
    column: String,
    literals: Vec<Literal>,
}

impl PredicateLeaf {
    /// Creates a leaf; the column name is stored lower-cased.
    ///
    /// Literal arity is not validated here; [`crate::SearchArgumentBuilder`]
    /// does that before a leaf ever reaches a search argument.
    #[must_use]
    pub fn new<C>(operator: Operator, column: C, literals: Vec<Literal>) -> Self
    where
        C: AsRef<str>,
    {
        Self {
            operator,
            column: column.as_ref().to_lowercase(),
            literals,
        }
    }

    /// The leaf's operator.
    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The lower-cased column name the leaf is bound to.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The single literal of a scalar comparison, if present.
    #[must_use]
    pub fn literal(&self) -> Option<&Literal> {
        self.literals.first()
    }

    /// All literals, in declaration order.
    #[must_use]
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }
}

impl fmt::Display for PredicateLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            Operator::IsNull => write!(f, "{} IS NULL", self.column),
            Operator::In | Operator::Between => {
                write!(f, "{} {} (", self.column, self.operator)?;
                for (idx, literal) in self.literals.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{literal}")?;
                }
                f.write_str(")")
            }
            op => match self.literals.first() {
                Some(literal) => write!(f, "{} {op} {literal}", self.column),
                None => write!(f, "{} {op} ?", self.column),
            },
        }
    }
}
