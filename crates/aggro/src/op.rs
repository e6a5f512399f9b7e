//! Filter operators.
//!
//! The [`FilterOp`] enum names the kind of test a [`FilterSpec`] performs.
//! Predicate and test-function filters are `Eq` filters, as are plain
//! equality filters.
//!
//! [`FilterSpec`]: crate::FilterSpec

use std::cmp::Ordering;

/// Operator of a registered filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// Equality, or an arbitrary test function.
    Eq,
    /// Membership in a set of values.
    In,
    /// Greater than or equal.
    Gte,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
}

impl FilterOp {
    /// Returns `true` for the four range operators.
    pub fn is_range(self) -> bool {
        matches!(
            self,
            FilterOp::Gte | FilterOp::Lte | FilterOp::Gt | FilterOp::Lt
        )
    }

    /// Evaluates a range comparison given the ordering of field against bound.
    ///
    /// `Eq` and `In` are not ordering-based and always return `false`.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Gte => ordering != Ordering::Less,
            FilterOp::Lt => ordering == Ordering::Less,
            FilterOp::Lte => ordering != Ordering::Greater,
            FilterOp::Eq | FilterOp::In => false,
        }
    }

    /// Returns the symbol of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::In => "in",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Lt => "<",
        }
    }
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_ops() {
        assert!(FilterOp::Gte.is_range());
        assert!(FilterOp::Lt.is_range());
        assert!(!FilterOp::Eq.is_range());
        assert!(!FilterOp::In.is_range());
    }

    #[test]
    fn eval_ordering() {
        assert!(FilterOp::Gte.eval_ordering(Ordering::Equal));
        assert!(FilterOp::Gte.eval_ordering(Ordering::Greater));
        assert!(!FilterOp::Gte.eval_ordering(Ordering::Less));

        assert!(FilterOp::Lte.eval_ordering(Ordering::Equal));
        assert!(!FilterOp::Lte.eval_ordering(Ordering::Greater));

        assert!(!FilterOp::Gt.eval_ordering(Ordering::Equal));
        assert!(FilterOp::Lt.eval_ordering(Ordering::Less));

        assert!(!FilterOp::Eq.eval_ordering(Ordering::Equal));
    }

    #[test]
    fn display() {
        assert_eq!(FilterOp::Gte.to_string(), ">=");
        assert_eq!(FilterOp::In.to_string(), "in");
    }
}
