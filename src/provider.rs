//! # Provider
//!
//! Traits implemented by document-store adapters.

use std::future::Future;

use thiserror::Error;

use crate::store::Query;
use crate::value::Id;

/// A stored document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// The `DocumentStore` trait is used by implementers to provide document
/// storage capability.
///
/// Implementations receive a compiled [`Query`] and are expected to lower it
/// into their native syntax, typically with a
/// [`Serializer`](crate::store::serializer::Serializer).
///
/// Errors that callers can act on should be returned as a [`StoreError`]
/// (possibly wrapped in context) so repositories can classify them. Any other
/// error is treated as the store being unavailable.
pub trait DocumentStore: Send + Sync {
    /// Declare a unique index on `field` of `collection`. Must be idempotent.
    fn ensure_unique(
        &self, collection: &str, field: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Queries `collection` for documents matching `query`, applying its sort,
    /// skip and limit options in that order.
    fn find(
        &self, collection: &str, query: &Query,
    ) -> impl Future<Output = anyhow::Result<Vec<Document>>> + Send;

    /// Store a new document in `collection`.
    fn insert(
        &self, collection: &str, document: Document,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Replace the document with identity `id` in `collection`, returning
    /// `false` when no document matched.
    fn update(
        &self, collection: &str, id: &Id, document: Document,
    ) -> impl Future<Output = anyhow::Result<bool>> + Send;
}

/// Store failures that repositories map to specific caller-facing errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A write would break a unique index.
    #[error("duplicate value for unique field {field} in {collection}")]
    DuplicateKey {
        /// The collection written to.
        collection: String,

        /// The field whose unique index was violated.
        field: String,
    },

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
