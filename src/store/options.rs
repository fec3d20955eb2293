//! # Options Compiler
//!
//! Extracts limit, skip and sort directives from a list query.

use serde::Serialize;

use crate::operator::{Direction, OpValue, Operation, Operator};

/// Result-set shaping options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QueryOptions {
    /// Maximum number of results. `None` means unbounded.
    pub limit: Option<u64>,

    /// Number of results to skip.
    pub skip: Option<u64>,

    /// Sort keys, primary key first.
    pub sort: Vec<Sort>,
}

/// A single sort key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Sort {
    /// The column to sort by.
    pub column: String,

    /// The sort direction.
    pub direction: Direction,
}

impl QueryOptions {
    /// Compile the pagination operators in `operators`.
    ///
    /// Only top-level operators are considered. When `Limit` or `Skip` repeat,
    /// the last occurrence wins. Every `Order` appends a sort key in sequence
    /// order.
    #[must_use]
    pub fn compile(operators: &[Operator]) -> Self {
        let mut options = Self::default();

        for op in operators {
            match (op.operation(), op.value()) {
                (Operation::Limit, OpValue::Count(n)) => options.limit = Some(*n),
                (Operation::Skip, OpValue::Count(n)) => options.skip = Some(*n),
                (Operation::Order, OpValue::Direction(direction)) => options.sort.push(Sort {
                    column: op.column().to_string(),
                    direction: *direction,
                }),
                _ => {}
            }
        }

        options
    }

    /// Cap the limit at `max`. An unbounded limit becomes `max`.
    #[must_use]
    pub fn capped(mut self, max: Option<u64>) -> Self {
        if let Some(max) = max {
            self.limit = Some(self.limit.map_or(max, |limit| limit.min(max)));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pagination() {
        let options = QueryOptions::compile(&[Operator::equal("a", 1).unwrap()]);
        assert_eq!(options, QueryOptions::default());
    }

    #[test]
    fn last_limit_wins() {
        let operators = [
            Operator::limit(10).unwrap(),
            Operator::skip(4).unwrap(),
            Operator::limit(2).unwrap(),
        ];
        let options = QueryOptions::compile(&operators);
        assert_eq!(options.limit, Some(2));
        assert_eq!(options.skip, Some(4));
    }

    #[test]
    fn sort_order_preserved() {
        let operators = [
            Operator::order("status", Direction::Ascending).unwrap(),
            Operator::equal("a", 1).unwrap(),
            Operator::order("createdAt", Direction::Descending).unwrap(),
        ];
        let options = QueryOptions::compile(&operators);
        assert_eq!(
            options.sort,
            vec![
                Sort {
                    column: "status".into(),
                    direction: Direction::Ascending
                },
                Sort {
                    column: "createdAt".into(),
                    direction: Direction::Descending
                },
            ]
        );
    }

    #[test]
    fn zero_limit_kept() {
        let options = QueryOptions::compile(&[Operator::limit(0).unwrap()]);
        assert_eq!(options.limit, Some(0));
    }

    #[test]
    fn cap_limit() {
        let options = QueryOptions::compile(&[Operator::limit(500).unwrap()]);
        assert_eq!(options.capped(Some(100)).limit, Some(100));

        let options = QueryOptions::compile(&[]);
        assert_eq!(options.clone().capped(Some(100)).limit, Some(100));
        assert_eq!(options.capped(None).limit, None);
    }
}
