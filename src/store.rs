//! # Store
//!
//! Compiles an operator sequence into a store-agnostic [`Query`]: a
//! [`FilterTree`] predicate plus [`QueryOptions`]. Both compilers are pure and
//! deterministic, so the same sequence always yields the same query.
//!
//! Store adapters lower the compiled query with the [`serializer`] traits.

mod filter;
mod options;
pub mod serializer;

use serde::Serialize;

pub use self::filter::{Cmp, Condition, FilterTree, Test};
pub use self::options::{QueryOptions, Sort};
use crate::Result;
use crate::operator::Operator;

/// A compiled list query.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Query {
    /// The predicate documents must satisfy.
    pub filter: FilterTree,

    /// Limit, skip and sort options.
    pub options: QueryOptions,
}

impl Query {
    /// Compile `operators` into a query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`](crate::Error::MalformedQuery) when a
    /// pagination operator is nested inside `And` or `Or`.
    pub fn compile(operators: &[Operator]) -> Result<Self> {
        Ok(Self {
            filter: FilterTree::compile(operators)?,
            options: QueryOptions::compile(operators),
        })
    }
}
