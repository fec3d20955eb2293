//! User service: registration, login lookup and profile updates.
//!
//! Credentials are stored as given. Hashing and strength checks belong to the
//! caller, and no user returned by this service carries its credential.

use std::sync::Arc;

use crate::config::Config;
use crate::context::Context;
use crate::entities::{EMAIL, USERNAME, User};
use crate::provider::DocumentStore;
use crate::repository::Entity;
use crate::service::{Clock, EntityService, IdGenerator, logged};
use crate::value::Id;
use crate::{Error, Operator, Result};

/// Users.
pub struct UserService<S> {
    users: EntityService<User, S>,
}

impl<S> Clone for UserService<S> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
        }
    }
}

impl<S: DocumentStore> UserService<S> {
    /// Create a user service over `store`.
    pub fn new(store: Arc<S>, config: Config) -> Self {
        Self {
            users: EntityService::new(store, config),
        }
    }

    /// Use `clock` for audit timestamps.
    #[must_use]
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: self.users.with_clock(clock),
        }
    }

    /// Use `ids` for new identities.
    #[must_use]
    pub fn with_ids(self, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            users: self.users.with_ids(ids),
        }
    }

    /// Declare the unique username and email indexes.
    ///
    /// # Errors
    ///
    /// Returns the classified store error when an index cannot be created.
    pub async fn init(&self, ctx: &Context) -> Result<()> {
        self.users.init(ctx).await
    }

    /// Fetch the user with identity `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no user has that identity.
    pub async fn get(&self, ctx: &Context, id: &Id) -> Result<User> {
        self.users.get(ctx, id).await.map(User::redacted)
    }

    /// List the users matching `operators`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`] when the operators do not compile, or
    /// the classified store error.
    pub async fn list(&self, ctx: &Context, operators: &[Operator]) -> Result<Vec<User>> {
        let users = self.users.list(ctx, operators).await?;
        Ok(users.into_iter().map(User::redacted).collect())
    }

    /// Find the user whose username or email is `login`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no user matches.
    pub async fn find_by_login(&self, ctx: &Context, login: &str) -> Result<User> {
        self.stored_by_login(ctx, login).await.map(User::redacted)
    }

    /// Find the user whose username or email is `login` and check the stored
    /// credential with `verify`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] when no user matches or `verify`
    /// rejects the credential.
    pub async fn verify_login<F>(&self, ctx: &Context, login: &str, verify: F) -> Result<User>
    where
        F: FnOnce(&str) -> bool + Send,
    {
        let rejected = || Error::Unauthorized("invalid login or password".into());

        let user = match self.stored_by_login(ctx, login).await {
            Ok(user) => user,
            Err(Error::NotFound(_)) => return Err(rejected()),
            Err(e) => return Err(e),
        };
        match user.password.as_deref() {
            Some(credential) if verify(credential) => Ok(user.redacted()),
            _ => Err(rejected()),
        }
    }

    /// Register a new user. Registration needs no acting user: the new user
    /// is recorded as its own creator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a registration field is missing and
    /// [`Error::UniqueConstraint`] when the username or email is taken.
    pub async fn register(&self, ctx: &Context, user: User) -> Result<User> {
        let result = async {
            user.validate()?;

            let operators = [
                Operator::or([
                    Operator::equal(USERNAME, user.username.as_str())?,
                    Operator::equal(EMAIL, user.email.as_str())?,
                ]),
                Operator::limit(1)?,
            ];
            if !self.users.repository().list(ctx, &operators).await?.is_empty() {
                return Err(Error::UniqueConstraint("username or email is already registered".into()));
            }

            self.users.register(ctx, user).await
        };
        logged("register", User::COLLECTION, result.await).map(User::redacted)
    }

    /// Update a user. The stored credential is kept unless `user` carries a
    /// new one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] without an acting user,
    /// [`Error::NotFound`] for an unknown `id` and [`Error::Validation`] when
    /// a field is missing.
    pub async fn update(&self, ctx: &Context, id: &Id, user: User) -> Result<User> {
        let merge = |stored: &User, user: &mut User| {
            if user.password.is_none() {
                user.password.clone_from(&stored.password);
            }
        };
        self.users.update_with(ctx, id, user, merge).await.map(User::redacted)
    }

    async fn stored_by_login(&self, ctx: &Context, login: &str) -> Result<User> {
        let operators = [
            Operator::or([Operator::equal(USERNAME, login)?, Operator::equal(EMAIL, login)?]),
            Operator::limit(1)?,
        ];
        let users = self.users.repository().list(ctx, &operators).await?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("no user with login {login}")))
    }
}
