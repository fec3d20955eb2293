//! # Service
//!
//! Services compose repositories and add the behavior that belongs around
//! persistence: identity assignment, audit stamping from the acting user,
//! cross-entity checks and error logging.
//!
//! Every collaborator is passed in at construction. The clock and identity
//! generator default to the system clock and random UUIDs and can be swapped
//! for deterministic ones in tests.

mod ticket;
mod user;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

pub use self::ticket::TicketService;
pub use self::user::UserService;
use crate::config::Config;
use crate::context::Context;
use crate::entities::Category;
use crate::operator::Operator;
use crate::provider::DocumentStore;
use crate::repository::{Entity, Repository};
use crate::value::Id;
use crate::{Error, Result};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Source of new entity identities.
pub trait IdGenerator: Send + Sync {
    /// A new, unused identity.
    fn generate(&self) -> Id;
}

/// The system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random (v4) UUID identities.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Id {
        Id::new()
    }
}

/// Category service.
pub type CategoryService<S> = EntityService<Category, S>;

/// Create, read and update for a single entity type, with audit stamping.
pub struct EntityService<E, S> {
    repository: Repository<E, S>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl<E, S> Clone for EntityService<E, S> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            clock: Arc::clone(&self.clock),
            ids: Arc::clone(&self.ids),
        }
    }
}

impl<E: Entity, S> fmt::Debug for EntityService<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityService").field("repository", &self.repository).finish_non_exhaustive()
    }
}

impl<E: Entity, S: DocumentStore> EntityService<E, S> {
    /// Create a service over `store` using the system clock and random
    /// identities.
    pub fn new(store: Arc<S>, config: Config) -> Self {
        Self {
            repository: Repository::with_config(store, config),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
        }
    }

    /// Use `clock` for audit timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `ids` for new identities.
    #[must_use]
    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// The underlying repository.
    pub const fn repository(&self) -> &Repository<E, S> {
        &self.repository
    }

    /// Declare the entity's unique indexes.
    ///
    /// # Errors
    ///
    /// Returns the classified store error when an index cannot be created.
    pub async fn init(&self, ctx: &Context) -> Result<()> {
        logged("init", E::COLLECTION, self.repository.init(ctx).await)
    }

    /// Fetch the entity with identity `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no entity has that identity.
    pub async fn get(&self, ctx: &Context, id: &Id) -> Result<E> {
        logged("get", E::COLLECTION, self.repository.get(ctx, id).await)
    }

    /// List the entities matching `operators`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`] when the operators do not compile, or
    /// the classified store error.
    pub async fn list(&self, ctx: &Context, operators: &[Operator]) -> Result<Vec<E>> {
        logged("list", E::COLLECTION, self.repository.list(ctx, operators).await)
    }

    /// Assign a new identity, stamp creation by the acting user and persist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] without an acting user,
    /// [`Error::Validation`] when the entity breaks a domain rule and
    /// [`Error::UniqueConstraint`] on a duplicate.
    pub async fn create(&self, ctx: &Context, mut entity: E) -> Result<E> {
        let result = async {
            let user = ctx.user_id()?;
            entity.set_id(self.ids.generate());
            entity.audit_mut().created(Some(user), self.clock.now());
            self.repository.create(ctx, entity).await
        };
        logged("create", E::COLLECTION, result.await)
    }

    /// Stamp an update by the acting user and replace the entity with
    /// identity `id`. The stored creation audit is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] without an acting user,
    /// [`Error::NotFound`] when no entity has identity `id` and
    /// [`Error::Validation`] when the entity breaks a domain rule.
    pub async fn update(&self, ctx: &Context, id: &Id, entity: E) -> Result<E> {
        self.update_with(ctx, id, entity, |_, _| {}).await
    }

    /// Like [`EntityService::update`], letting `merge` carry attributes over
    /// from the stored entity before persistence.
    ///
    /// # Errors
    ///
    /// As [`EntityService::update`].
    pub async fn update_with<F>(&self, ctx: &Context, id: &Id, mut entity: E, merge: F) -> Result<E>
    where
        F: FnOnce(&E, &mut E) + Send,
    {
        let result = async {
            let user = ctx.user_id()?;
            let stored = self.repository.get(ctx, id).await?;

            merge(&stored, &mut entity);
            entity.set_id(*id);
            *entity.audit_mut() = stored.audit().clone();
            entity.audit_mut().updated(Some(user), self.clock.now());

            self.repository.update(ctx, id, entity).await
        };
        logged("update", E::COLLECTION, result.await)
    }

    // Create without requiring an acting user. The new entity is its own
    // creator unless the context names one.
    async fn register(&self, ctx: &Context, mut entity: E) -> Result<E> {
        let id = self.ids.generate();
        entity.set_id(id);
        entity.audit_mut().created(Some(ctx.user().unwrap_or(id)), self.clock.now());
        self.repository.create(ctx, entity).await
    }
}

// Log a failed service call. Server-side failures are errors, caller
// faults are only of interest when debugging.
fn logged<T>(operation: &str, collection: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if e.code() >= 500 {
            tracing::error!(collection, operation, code = e.code(), "{}", e.detail());
        } else {
            tracing::debug!(collection, operation, code = e.code(), "{}", e.detail());
        }
    }
    result
}

// A missing referenced entity is a fault in the entity being written.
fn missing_reference(error: Error, what: &str, id: &Id) -> Error {
    match error {
        Error::NotFound(_) => Error::Validation(format!("{what} {id} does not exist")),
        other => other,
    }
}
