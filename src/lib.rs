//! # Support Store
//!
//! A multi-tenant document-store access layer for the support desk.
//!
//! The crate is built around a small, composable query algebra. Callers
//! describe what they want as an ordered sequence of [`Operator`] values
//! (comparisons, membership, existence, AND/OR nesting, limit, skip and
//! ordering). Repositories hand that sequence to two pure compilers:
//!
//! - the filter compiler, producing a store-agnostic [`FilterTree`], and
//! - the options compiler, producing [`QueryOptions`] (limit, skip, sort).
//!
//! A [`DocumentStore`] implementation (or a
//! [`Serializer`](store::serializer::Serializer) adapter) lowers the compiled
//! [`Query`] into the store's native syntax. The compilers never emit store
//! syntax themselves.
//!
//! ```rust
//! use support_store::{Direction, Operator, Query};
//!
//! let operators = [
//!     Operator::equal("name", "Hardware")?,
//!     Operator::is_in("status", ["open", "pending"])?,
//!     Operator::order("createdAt", Direction::Descending)?,
//!     Operator::limit(20)?,
//! ];
//! let query = Query::compile(&operators)?;
//! assert_eq!(query.options.limit, Some(20));
//! # Ok::<(), support_store::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod entities;
mod error;
pub mod operator;
pub mod provider;
pub mod repository;
pub mod service;
pub mod store;
mod value;

pub use crate::config::Config;
pub use crate::context::Context;
pub use crate::error::Error;
pub use crate::operator::{Direction, OpValue, Operation, Operator};
pub use crate::provider::{Document, DocumentStore, StoreError};
pub use crate::repository::{Entity, Repository};
pub use crate::store::{Cmp, Condition, FilterTree, Query, QueryOptions, Sort, Test};
pub use crate::value::{Id, Value};

/// Result type for store operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The document field holding an entity's identity.
pub const ID_FIELD: &str = "id";
