//! # Repository
//!
//! A generic repository over a [`DocumentStore`], shared by every entity.
//!
//! Repositories are stateless apart from the store handle and their
//! [`Config`]. Every list-style read goes through the same compilers, and
//! `get` is `list` with an identity filter and a limit of one.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::context::Context;
use crate::entities::{
    Audit, Category, FieldDefinition, Ticket, TicketDefinition, TicketStatus, User,
};
use crate::operator::Operator;
use crate::provider::{Document, DocumentStore};
use crate::store::Query;
use crate::value::Id;
use crate::{Error, ID_FIELD, Result, invalid};

/// A persisted record managed by a [`Repository`].
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The collection the entity is stored in.
    const COLLECTION: &'static str;

    /// Fields that must be unique across the collection.
    const UNIQUE: &'static [&'static str] = &[];

    /// The entity's identity.
    fn id(&self) -> Id;

    /// Set the entity's identity.
    fn set_id(&mut self, id: Id);

    /// The entity's audit fields.
    fn audit(&self) -> &Audit;

    /// The entity's audit fields, for stamping.
    fn audit_mut(&mut self) -> &mut Audit;

    /// Check the entity's attributes against its domain rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] describing the first rule broken.
    fn validate(&self) -> Result<()>;
}

/// Category repository.
pub type CategoryRepository<S> = Repository<Category, S>;

/// Ticket repository.
pub type TicketRepository<S> = Repository<Ticket, S>;

/// Ticket definition repository.
pub type TicketDefinitionRepository<S> = Repository<TicketDefinition, S>;

/// Ticket status repository.
pub type TicketStatusRepository<S> = Repository<TicketStatus, S>;

/// Field definition repository.
pub type FieldDefinitionRepository<S> = Repository<FieldDefinition, S>;

/// User repository.
pub type UserRepository<S> = Repository<User, S>;

/// Data access for a single entity type.
pub struct Repository<E, S> {
    store: Arc<S>,
    config: Config,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S> Clone for Repository<E, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity, S> fmt::Debug for Repository<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("collection", &E::COLLECTION)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E: Entity, S: DocumentStore> Repository<E, S> {
    /// Create a repository with the default configuration.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, Config::default())
    }

    /// Create a repository with the given configuration.
    pub const fn with_config(store: Arc<S>, config: Config) -> Self {
        Self {
            store,
            config,
            _entity: PhantomData,
        }
    }

    /// The repository's configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Declare the entity's unique indexes with the store.
    ///
    /// # Errors
    ///
    /// Returns the classified store error when an index cannot be created.
    pub async fn init(&self, ctx: &Context) -> Result<()> {
        for field in E::UNIQUE {
            ctx.run(self.config.query_timeout, self.store.ensure_unique(E::COLLECTION, field))
                .await
                .inspect_err(|e| tracing::warn!(collection = E::COLLECTION, field, "ensure unique: {e}"))?;
        }
        Ok(())
    }

    /// Fetch the entity with identity `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no entity has that identity, or the
    /// error from [`Repository::list`].
    pub async fn get(&self, ctx: &Context, id: &Id) -> Result<E> {
        let operators = [Operator::equal(ID_FIELD, id)?, Operator::limit(1)?];
        let entities = self.list(ctx, &operators).await?;
        entities
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("no {} with id {id}", E::COLLECTION)))
    }

    /// List the entities matching `operators`.
    ///
    /// With no operators every entity is returned, subject to the configured
    /// maximum limit, in store order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`] when the operators do not compile,
    /// [`Error::Canceled`] or [`Error::DeadlineExceeded`] when the request
    /// ends first, and the classified store error when the store fails.
    pub async fn list(&self, ctx: &Context, operators: &[Operator]) -> Result<Vec<E>> {
        let mut query = Query::compile(operators)?;
        query.options = query.options.capped(self.config.max_limit);
        tracing::debug!(collection = E::COLLECTION, ?query, "find");

        let documents = ctx
            .run(self.config.query_timeout, self.store.find(E::COLLECTION, &query))
            .await
            .inspect_err(|e| tracing::warn!(collection = E::COLLECTION, "find: {e}"))?;
        tracing::debug!(collection = E::COLLECTION, count = documents.len(), "found");

        documents.into_iter().map(decode).collect()
    }

    /// Persist a new entity. The entity must already carry its identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the entity breaks a domain rule and
    /// [`Error::UniqueConstraint`] when the store reports a duplicate.
    pub async fn create(&self, ctx: &Context, entity: E) -> Result<E> {
        if entity.id().is_nil() {
            return Err(invalid!("id is required, received empty value"));
        }
        entity.validate()?;

        let document = encode(&entity)?;
        ctx.run(self.config.query_timeout, self.store.insert(E::COLLECTION, document))
            .await
            .inspect_err(|e| tracing::warn!(collection = E::COLLECTION, "insert: {e}"))?;
        tracing::debug!(collection = E::COLLECTION, id = %entity.id(), "inserted");

        Ok(entity)
    }

    /// Replace the entity with identity `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the entity breaks a domain rule or
    /// carries a different identity, [`Error::NotFound`] when no entity has
    /// identity `id`, and [`Error::UniqueConstraint`] when the store reports a
    /// duplicate.
    pub async fn update(&self, ctx: &Context, id: &Id, entity: E) -> Result<E> {
        if entity.id() != *id {
            return Err(invalid!("id {} does not match target {id}", entity.id()));
        }
        entity.validate()?;

        let document = encode(&entity)?;
        let matched = ctx
            .run(self.config.query_timeout, self.store.update(E::COLLECTION, id, document))
            .await
            .inspect_err(|e| tracing::warn!(collection = E::COLLECTION, "update: {e}"))?;
        if !matched {
            return Err(Error::NotFound(format!("no {} with id {id}", E::COLLECTION)));
        }
        tracing::debug!(collection = E::COLLECTION, %id, "updated");

        Ok(entity)
    }
}

fn encode<E: Entity>(entity: &E) -> Result<Document> {
    match serde_json::to_value(entity)? {
        serde_json::Value::Object(document) => Ok(document),
        _ => Err(Error::Server(format!("{} did not encode as a document", E::COLLECTION))),
    }
}

fn decode<E: Entity>(document: Document) -> Result<E> {
    serde_json::from_value(serde_json::Value::Object(document))
        .map_err(|e| Error::Server(format!("issue decoding {} document: {e}", E::COLLECTION)))
}
