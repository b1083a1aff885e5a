use std::fmt;

use serde::{Deserialize, Serialize};

/// Kleene three-valued truth, the verdict type of every leaf and tree node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TruthValue {
    /// The row satisfies the predicate.
    Yes,
    /// The row does not satisfy the predicate.
    No,
    /// The predicate compared against `NULL`; nothing is known.
    Unknown,
}

impl TruthValue {
    /// Conjunction: `No` dominates, then `Unknown`.
    #[must_use]
    pub fn and(self, other: TruthValue) -> TruthValue {
        match (self, other) {
            (TruthValue::No, _) | (_, TruthValue::No) => TruthValue::No,
            (TruthValue::Unknown, _) | (_, TruthValue::Unknown) => TruthValue::Unknown,
            (TruthValue::Yes, TruthValue::Yes) => TruthValue::Yes,
        }
    }

    /// Disjunction: `Yes` dominates, then `Unknown`.
    #[must_use]
    pub fn or(self, other: TruthValue) -> TruthValue {
        match (self, other) {
            (TruthValue::Yes, _) | (_, TruthValue::Yes) => TruthValue::Yes,
            (TruthValue::Unknown, _) | (_, TruthValue::Unknown) => TruthValue::Unknown,
            (TruthValue::No, TruthValue::No) => TruthValue::No,
        }
    }

    /// Negation; `Unknown` stays `Unknown`.
    #[must_use]
    pub fn not(self) -> TruthValue {
        match self {
            TruthValue::Yes => TruthValue::No,
            TruthValue::No => TruthValue::Yes,
            TruthValue::Unknown => TruthValue::Unknown,
        }
    }

    /// Returns true only for [`TruthValue::Yes`].
    #[must_use]
    pub fn is_yes(self) -> bool {
        matches!(self, TruthValue::Yes)
    }
}

impl From<bool> for TruthValue {
    fn from(value: bool) -> Self {
        if value {
            TruthValue::Yes
        } else {
            TruthValue::No
        }
    }
}

impl fmt::Display for TruthValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TruthValue::Yes => "YES",
            TruthValue::No => "NO",
            TruthValue::Unknown => "UNKNOWN",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::TruthValue::{self, *};

    const ALL: [TruthValue; 3] = [Yes, No, Unknown];

    #[test]
    fn and_follows_kleene_table() {
        assert_eq!(Yes.and(Yes), Yes);
        assert_eq!(Yes.and(Unknown), Unknown);
        assert_eq!(Unknown.and(No), No);
        assert_eq!(Unknown.and(Unknown), Unknown);
        for value in ALL {
            assert_eq!(No.and(value), No);
            assert_eq!(value.and(Yes), value);
        }
    }

    #[test]
    fn or_follows_kleene_table() {
        assert_eq!(No.or(No), No);
        assert_eq!(No.or(Unknown), Unknown);
        assert_eq!(Unknown.or(Yes), Yes);
        for value in ALL {
            assert_eq!(Yes.or(value), Yes);
            assert_eq!(value.or(No), value);
        }
    }

    #[test]
    fn not_keeps_unknown() {
        assert_eq!(Yes.not(), No);
        assert_eq!(No.not(), Yes);
        assert_eq!(Unknown.not(), Unknown);
        assert!(!Unknown.not().is_yes());
    }
}
