//! # Operators
//!
//! An [`Operator`] is a single filter, sort or pagination directive. A
//! sequence of operators describes a complete list query: predicate operators
//! are implicitly ANDed together, while `Limit`, `Skip` and `Order` shape the
//! result set.
//!
//! Operators can only be built through the constructors on [`Operator`], so
//! the value carried by an operator always has the shape its [`Operation`]
//! expects.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::value::Value;
use crate::{Result, malformed};

/// The closed set of operations an [`Operator`] can perform.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Operation {
    /// Column equals value.
    Equal,
    /// Column does not equal value.
    NotEqual,
    /// Column is greater than value.
    GreaterThan,
    /// Column is greater than or equal to value.
    GreaterThanOrEqual,
    /// Column is less than value.
    LessThan,
    /// Column is less than or equal to value.
    LessThanOrEqual,
    /// Column is (or is not) present.
    Exists,
    /// Column is one of a set of values.
    In,
    /// Column is none of a set of values.
    NotIn,
    /// All nested operators match.
    And,
    /// At least one nested operator matches.
    Or,
    /// Return at most this many results.
    Limit,
    /// Skip this many results.
    Skip,
    /// Sort results by a column.
    Order,
}

impl Operation {
    /// Whether the operation shapes the result set (`Limit`, `Skip`, `Order`)
    /// rather than contributing to the filter.
    #[must_use]
    pub const fn is_pagination(self) -> bool {
        matches!(self, Self::Limit | Self::Skip | Self::Order)
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sort ascending.
    #[default]
    #[display("asc")]
    Ascending,

    /// Sort descending.
    #[display("desc")]
    Descending,
}

/// The value carried by an [`Operator`]. The variant is fixed by the
/// operator's [`Operation`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum OpValue {
    /// A scalar for comparison operations.
    Scalar(Value),

    /// The presence flag for `Exists`.
    Flag(bool),

    /// The candidate set for `In`/`NotIn`. May be empty.
    List(Vec<Value>),

    /// Sub-predicates for `And`/`Or`.
    Nested(Vec<Operator>),

    /// The count for `Limit`/`Skip`.
    Count(u64),

    /// The direction for `Order`.
    Direction(Direction),
}

/// A single filter, sort or pagination directive.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Operator {
    column: String,
    operation: Operation,
    value: OpValue,
}

impl Operator {
    /// Column equals `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when
    /// `column` is blank.
    pub fn equal(column: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::compare(Operation::Equal, column, value)
    }

    /// Column does not equal `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when
    /// `column` is blank.
    pub fn not_equal(column: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::compare(Operation::NotEqual, column, value)
    }

    /// Column is greater than `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when
    /// `column` is blank.
    pub fn greater_than(column: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::compare(Operation::GreaterThan, column, value)
    }

    /// Column is greater than or equal to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when
    /// `column` is blank.
    pub fn greater_than_or_equal(
        column: impl Into<String>, value: impl Into<Value>,
    ) -> Result<Self> {
        Self::compare(Operation::GreaterThanOrEqual, column, value)
    }

    /// Column is less than `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when
    /// `column` is blank.
    pub fn less_than(column: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::compare(Operation::LessThan, column, value)
    }

    /// Column is less than or equal to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when
    /// `column` is blank.
    pub fn less_than_or_equal(column: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::compare(Operation::LessThanOrEqual, column, value)
    }

    /// Column is present (`true`) or absent (`false`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when
    /// `column` is blank.
    pub fn exists(column: impl Into<String>, exists: bool) -> Result<Self> {
        Ok(Self {
            column: required(column, Operation::Exists)?,
            operation: Operation::Exists,
            value: OpValue::Flag(exists),
        })
    }

    /// Column is one of `values`. An empty set matches nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when
    /// `column` is blank.
    pub fn is_in<V: Into<Value>>(
        column: impl Into<String>, values: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        Self::membership(Operation::In, column, values)
    }

    /// Column is none of `values`. An empty set matches everything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when
    /// `column` is blank.
    pub fn not_in<V: Into<Value>>(
        column: impl Into<String>, values: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        Self::membership(Operation::NotIn, column, values)
    }

    /// All of `operators` match.
    #[must_use]
    pub fn and(operators: impl IntoIterator<Item = Self>) -> Self {
        Self {
            column: String::new(),
            operation: Operation::And,
            value: OpValue::Nested(operators.into_iter().collect()),
        }
    }

    /// At least one of `operators` matches.
    #[must_use]
    pub fn or(operators: impl IntoIterator<Item = Self>) -> Self {
        Self {
            column: String::new(),
            operation: Operation::Or,
            value: OpValue::Nested(operators.into_iter().collect()),
        }
    }

    /// Return at most `count` results.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when
    /// `count` is negative.
    pub fn limit(count: i64) -> Result<Self> {
        Self::pagination(Operation::Limit, count)
    }

    /// Skip the first `count` results.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when
    /// `count` is negative.
    pub fn skip(count: i64) -> Result<Self> {
        Self::pagination(Operation::Skip, count)
    }

    /// Sort results by `column`. Repeated `order` operators form a multi-key
    /// sort, the first being the primary key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when
    /// `column` is blank.
    pub fn order(column: impl Into<String>, direction: Direction) -> Result<Self> {
        Ok(Self {
            column: required(column, Operation::Order)?,
            operation: Operation::Order,
            value: OpValue::Direction(direction),
        })
    }

    /// The target column. Empty for `And`, `Or`, `Limit` and `Skip`.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The operation performed.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// The value carried by the operator.
    #[must_use]
    pub const fn value(&self) -> &OpValue {
        &self.value
    }

    fn compare(
        operation: Operation, column: impl Into<String>, value: impl Into<Value>,
    ) -> Result<Self> {
        Ok(Self {
            column: required(column, operation)?,
            operation,
            value: OpValue::Scalar(value.into()),
        })
    }

    fn membership<V: Into<Value>>(
        operation: Operation, column: impl Into<String>, values: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        Ok(Self {
            column: required(column, operation)?,
            operation,
            value: OpValue::List(values.into_iter().map(Into::into).collect()),
        })
    }

    fn pagination(operation: Operation, count: i64) -> Result<Self> {
        let Ok(count) = u64::try_from(count) else {
            return Err(malformed!("{operation} must not be negative, got {count}"));
        };
        Ok(Self {
            column: String::new(),
            operation,
            value: OpValue::Count(count),
        })
    }
}

fn required(column: impl Into<String>, operation: Operation) -> Result<String> {
    let column = column.into();
    if column.trim().is_empty() {
        return Err(malformed!("{operation} requires a column, received empty value"));
    }
    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn comparison_shape() {
        let op = Operator::greater_than("priority", 2).unwrap();
        assert_eq!(op.column(), "priority");
        assert_eq!(op.operation(), Operation::GreaterThan);
        assert_eq!(op.value(), &OpValue::Scalar(Value::Int(2)));
    }

    #[test]
    fn blank_column() {
        let Err(Error::MalformedQuery(detail)) = Operator::equal("  ", "x") else {
            panic!("should reject a blank column");
        };
        assert_eq!(detail, "Equal requires a column, received empty value");
        assert!(Operator::exists("", true).is_err());
        assert!(Operator::order("", Direction::Ascending).is_err());
        assert!(Operator::is_in("", ["a"]).is_err());
    }

    #[test]
    fn negative_pagination() {
        let Err(Error::MalformedQuery(detail)) = Operator::limit(-1) else {
            panic!("should reject a negative limit");
        };
        assert_eq!(detail, "Limit must not be negative, got -1");
        assert!(Operator::skip(-5).is_err());
        assert_eq!(Operator::skip(0).unwrap().value(), &OpValue::Count(0));
    }

    #[test]
    fn empty_membership_kept() {
        let op = Operator::not_in("status", Vec::<Value>::new()).unwrap();
        assert_eq!(op.value(), &OpValue::List(vec![]));
    }

    #[test]
    fn combinators_ignore_column() {
        let op = Operator::or([Operator::equal("a", 1).unwrap(), Operator::equal("b", 2).unwrap()]);
        assert_eq!(op.column(), "");
        let OpValue::Nested(nested) = op.value() else {
            panic!("should be nested");
        };
        assert_eq!(nested.len(), 2);
    }

    #[test]
    fn pagination_kinds() {
        assert!(Operation::Limit.is_pagination());
        assert!(Operation::Order.is_pagination());
        assert!(!Operation::And.is_pagination());
        assert!(!Operation::NotIn.is_pagination());
    }
}
