//! # Serialize
//!
//! Store adapters that lower a compiled [`Query`](support_store::Query) into
//! native query syntax by implementing the
//! [`Serializer`](support_store::store::serializer::Serializer) and
//! [`Clause`](support_store::store::serializer::Clause) traits.

pub mod mongo;
pub mod sql;

use support_store::Result;

pub use self::mongo::{Mongo, MongoQuery};
pub use self::sql::{Sql, SqlQuery};

/// `QuerySerializer` is used to provide overridable query serialization.
///
/// Each adapter wraps a compiled [`Query`](support_store::Query) and produces
/// the adapter's native output.
///
/// # Example
///
/// ```rust
/// use store_serialize::{QuerySerializer, SqlQuery};
/// use support_store::{Operator, Query};
///
/// let query = Query::compile(&[Operator::equal("name", "Hardware")?])?;
/// let sql = SqlQuery::new("categories", &query).serialize()?;
/// assert_eq!(sql.statement, r#"SELECT * FROM "categories" WHERE ("name" = $1)"#);
/// # Ok::<(), support_store::Error>(())
/// ```
pub trait QuerySerializer {
    /// The output type of the serialization.
    type Output;

    /// Serialize the query to the output type.
    ///
    /// # Errors
    ///
    /// Returns an error when the query cannot be represented.
    fn serialize(&self) -> Result<Self::Output>;
}

impl QuerySerializer for MongoQuery<'_> {
    type Output = mongo::Output;

    fn serialize(&self) -> Result<Self::Output> {
        use support_store::store::serializer::Serialize;

        let mut serializer = Mongo::new();
        self.query().serialize(&mut serializer)?;
        Ok(serializer.output())
    }
}

impl QuerySerializer for SqlQuery<'_> {
    type Output = sql::Output;

    fn serialize(&self) -> Result<Self::Output> {
        use support_store::store::serializer::Serialize;

        let mut serializer = Sql::new(self.table());
        self.query().serialize(&mut serializer)?;
        Ok(serializer.output())
    }
}
