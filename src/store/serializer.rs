//! # Serializer
//!
//! Serializer is used by store adapters to lower a compiled [`Query`] into
//! the store's native query syntax.

use crate::Result;
use crate::operator::Direction;
use crate::store::{FilterTree, Query, QueryOptions, Test};

/// Serializer is used to generate queries native to the underlying
/// document store.
///
/// The `Serializer` trait is intended to be used to generate one or more query
/// clauses concatenated using AND/OR conjunctions. In turn a clause may
/// contain one or more conditions or nested clauses.
///
/// A condition consists of a field and a [`Test`].
pub trait Serializer {
    /// The type of clause used by the serializer.
    type Clause: Clause;

    /// Creates a new query clause that uses an OR conjunction to join clause
    /// conditions. A clause closed without conditions matches nothing.
    fn or_clause(&mut self) -> &mut Self::Clause;

    /// Creates a new query clause that uses an AND conjunction to join clause
    /// conditions. A clause closed without conditions matches everything.
    fn and_clause(&mut self) -> &mut Self::Clause;

    /// Adds a sort key. Called once per key, primary key first.
    fn order(&mut self, field: &str, direction: Direction);

    /// Sets a limit and offset to limit the number of results returned.
    fn limit(&mut self, limit: Option<u64>, skip: Option<u64>);
}

/// A `Clause` is used to generate a query clause containing one or more
/// conditions.
pub trait Clause: Serializer {
    /// Adds a condition to the clause.
    fn condition(&mut self, field: &str, test: &Test);

    /// Closes the clause.
    fn close(&mut self);
}

/// `Serialize` is used to provide overridable query serialization.
pub trait Serialize {
    /// Serialize the query using the given `Serializer`.
    ///
    /// # Errors
    ///
    /// Returns an error when the serializer cannot represent the query.
    fn serialize<S: Serializer>(&self, serializer: &mut S) -> Result<()>;
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: &mut S) -> Result<()> {
        self.filter.serialize(serializer)?;
        self.options.serialize(serializer)
    }
}

impl Serialize for FilterTree {
    fn serialize<S: Serializer>(&self, serializer: &mut S) -> Result<()> {
        match self {
            Self::All => {}
            Self::Condition(condition) => {
                let clause = serializer.and_clause();
                clause.condition(&condition.column, &condition.test);
                clause.close();
            }
            Self::And(children) => {
                let clause = serializer.and_clause();
                serialize_children(children, clause)?;
                clause.close();
            }
            Self::Or(children) => {
                let clause = serializer.or_clause();
                serialize_children(children, clause)?;
                clause.close();
            }
        }
        Ok(())
    }
}

// Conditions are added to the open clause directly, nested trees open their
// own clause.
fn serialize_children<C: Clause>(children: &[FilterTree], clause: &mut C) -> Result<()> {
    for child in children {
        match child {
            FilterTree::Condition(condition) => {
                clause.condition(&condition.column, &condition.test);
            }
            FilterTree::All => clause.and_clause().close(),
            FilterTree::And(_) | FilterTree::Or(_) => child.serialize(clause)?,
        }
    }
    Ok(())
}

impl Serialize for QueryOptions {
    fn serialize<S: Serializer>(&self, serializer: &mut S) -> Result<()> {
        for sort in &self.sort {
            serializer.order(&sort.column, sort.direction);
        }
        if self.limit.is_some() || self.skip.is_some() {
            serializer.limit(self.limit, self.skip);
        }
        Ok(())
    }
}
