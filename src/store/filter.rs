//! # Filter Compiler
//!
//! Lowers the predicate operators of a list query into a store-agnostic
//! [`FilterTree`].

use serde::Serialize;

use crate::operator::{OpValue, Operation, Operator};
use crate::value::Value;
use crate::{Result, malformed};

/// A compiled predicate.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub enum FilterTree {
    /// Matches every document. Produced when a query has no predicates.
    #[default]
    All,

    /// A single column condition.
    Condition(Condition),

    /// Every child must match. An empty conjunction matches everything.
    And(Vec<FilterTree>),

    /// At least one child must match. An empty disjunction matches nothing.
    Or(Vec<FilterTree>),
}

/// A test applied to a single column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Condition {
    /// The column under test.
    pub column: String,

    /// The test to apply.
    pub test: Test,
}

/// The test part of a [`Condition`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Test {
    /// Compare the column with a value.
    Compare(Cmp, Value),

    /// The column is present (`true`) or absent (`false`). A column holding
    /// null counts as absent.
    Exists(bool),

    /// The column is one of the values.
    In(Vec<Value>),

    /// The column is none of the values.
    NotIn(Vec<Value>),
}

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Cmp {
    /// Equal to.
    Eq,

    /// Not equal to.
    Ne,

    /// Greater than.
    Gt,

    /// Greater than or equal to.
    Ge,

    /// Less than.
    Lt,

    /// Less than or equal to.
    Le,
}

impl FilterTree {
    /// Compile `operators` into a filter tree.
    ///
    /// Pagination operators at the top level are skipped: they belong to the
    /// options compiler. The remaining top-level operators are conjoined. With
    /// none, the tree is [`FilterTree::All`]; with one, the tree is that
    /// operator's node.
    ///
    /// Nested `And`/`Or` operators always produce their node, even when they
    /// hold a single child.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when a
    /// pagination operator appears inside an `And` or `Or`.
    pub fn compile(operators: &[Operator]) -> Result<Self> {
        let mut conjuncts = operators
            .iter()
            .filter(|op| !op.operation().is_pagination())
            .map(compile_node)
            .collect::<Result<Vec<_>>>()?;

        Ok(match conjuncts.len() {
            0 => Self::All,
            1 => conjuncts.remove(0),
            _ => Self::And(conjuncts),
        })
    }

    /// Whether the tree matches every document.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

fn compile_node(operator: &Operator) -> Result<FilterTree> {
    let column = operator.column();
    let operation = operator.operation();

    let test = match (operation, operator.value()) {
        (Operation::And | Operation::Or, OpValue::Nested(nested)) => {
            let children = nested
                .iter()
                .map(|child| {
                    if child.operation().is_pagination() {
                        return Err(malformed!(
                            "{} is not allowed inside {operation}",
                            child.operation()
                        ));
                    }
                    compile_node(child)
                })
                .collect::<Result<Vec<_>>>()?;

            return Ok(if operation == Operation::And {
                FilterTree::And(children)
            } else {
                FilterTree::Or(children)
            });
        }
        (Operation::Equal, OpValue::Scalar(v)) => Test::Compare(Cmp::Eq, v.clone()),
        (Operation::NotEqual, OpValue::Scalar(v)) => Test::Compare(Cmp::Ne, v.clone()),
        (Operation::GreaterThan, OpValue::Scalar(v)) => Test::Compare(Cmp::Gt, v.clone()),
        (Operation::GreaterThanOrEqual, OpValue::Scalar(v)) => Test::Compare(Cmp::Ge, v.clone()),
        (Operation::LessThan, OpValue::Scalar(v)) => Test::Compare(Cmp::Lt, v.clone()),
        (Operation::LessThanOrEqual, OpValue::Scalar(v)) => Test::Compare(Cmp::Le, v.clone()),
        (Operation::Exists, OpValue::Flag(flag)) => Test::Exists(*flag),
        (Operation::In, OpValue::List(values)) => Test::In(values.clone()),
        (Operation::NotIn, OpValue::List(values)) => Test::NotIn(values.clone()),
        (operation, _) => {
            // unreachable through the public builders
            return Err(malformed!("{operation} carries a value of the wrong shape"));
        }
    };

    Ok(FilterTree::Condition(Condition {
        column: column.to_string(),
        test,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::operator::Direction;

    fn eq(column: &str, value: &str) -> FilterTree {
        FilterTree::Condition(Condition {
            column: column.into(),
            test: Test::Compare(Cmp::Eq, Value::from(value)),
        })
    }

    #[test]
    fn empty_is_all() {
        assert_eq!(FilterTree::compile(&[]).unwrap(), FilterTree::All);

        let only_pagination = [
            Operator::limit(5).unwrap(),
            Operator::skip(10).unwrap(),
            Operator::order("name", Direction::Ascending).unwrap(),
        ];
        assert!(FilterTree::compile(&only_pagination).unwrap().is_all());
    }

    #[test]
    fn single_unwrapped() {
        let tree = FilterTree::compile(&[Operator::equal("name", "x").unwrap()]).unwrap();
        assert_eq!(tree, eq("name", "x"));
    }

    #[test]
    fn top_level_conjunction() {
        let operators = [
            Operator::equal("a", "1").unwrap(),
            Operator::limit(1).unwrap(),
            Operator::equal("b", "2").unwrap(),
        ];
        let tree = FilterTree::compile(&operators).unwrap();
        assert_eq!(tree, FilterTree::And(vec![eq("a", "1"), eq("b", "2")]));
    }

    #[test]
    fn nested_single_child_kept() {
        let operators = [Operator::or([Operator::equal("a", "1").unwrap()])];
        let tree = FilterTree::compile(&operators).unwrap();
        assert_eq!(tree, FilterTree::Or(vec![eq("a", "1")]));
    }

    #[test]
    fn nested_tree() {
        let operators = [
            Operator::or([
                Operator::equal("username", "ada").unwrap(),
                Operator::and([
                    Operator::equal("email", "ada@example.com").unwrap(),
                    Operator::exists("deletedAt", false).unwrap(),
                ]),
            ]),
            Operator::is_in("status", ["open"]).unwrap(),
        ];
        let tree = FilterTree::compile(&operators).unwrap();

        let expected = FilterTree::And(vec![
            FilterTree::Or(vec![
                eq("username", "ada"),
                FilterTree::And(vec![
                    eq("email", "ada@example.com"),
                    FilterTree::Condition(Condition {
                        column: "deletedAt".into(),
                        test: Test::Exists(false),
                    }),
                ]),
            ]),
            FilterTree::Condition(Condition {
                column: "status".into(),
                test: Test::In(vec![Value::from("open")]),
            }),
        ]);
        assert_eq!(tree, expected);
    }

    #[test]
    fn nested_pagination_rejected() {
        let operators = [Operator::and([
            Operator::equal("a", "1").unwrap(),
            Operator::limit(3).unwrap(),
        ])];
        let Err(Error::MalformedQuery(detail)) = FilterTree::compile(&operators) else {
            panic!("should reject nested pagination");
        };
        assert_eq!(detail, "Limit is not allowed inside And");
    }

    #[test]
    fn empty_combinators() {
        let tree = FilterTree::compile(&[Operator::or([])]).unwrap();
        assert_eq!(tree, FilterTree::Or(vec![]));
        let tree = FilterTree::compile(&[Operator::and([])]).unwrap();
        assert_eq!(tree, FilterTree::And(vec![]));
    }
}
