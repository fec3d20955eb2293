//! # Context
//!
//! The per-request context carried into every repository call: a
//! cancellation signal, an optional deadline, and the acting user.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::provider::StoreError;
use crate::value::Id;
use crate::{Error, Result};

/// Request context.
///
/// Cloning a context shares its cancellation signal: canceling any clone
/// cancels them all.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
    user: Option<Id>,
}

impl Context {
    /// Create a context with no deadline and no acting user.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Give the context a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Give the context an absolute deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the acting user.
    #[must_use]
    pub const fn with_user(mut self, user: Id) -> Self {
        self.user = Some(user);
        self
    }

    /// Cancel the request. In-flight and future store calls made with this
    /// context (or any clone) fail with [`Error::Canceled`].
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the request has been canceled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The request deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The acting user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<Id> {
        self.user
    }

    /// The acting user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] when the context carries no user.
    pub fn user_id(&self) -> Result<Id> {
        self.user.ok_or_else(|| Error::Unauthorized("no acting user in request context".into()))
    }

    /// Run a store call under this context.
    ///
    /// The call is abandoned when the context is canceled or its deadline
    /// passes. When the context has no deadline, `timeout` (if any) applies
    /// from now. Store errors are mapped to crate errors.
    pub(crate) async fn run<T, F>(&self, timeout: Option<Duration>, call: F) -> Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let deadline = self.deadline.or_else(|| timeout.map(|timeout| Instant::now() + timeout));
        let expired = async {
            match deadline {
                Some(deadline) => time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(Error::Canceled("request canceled".into())),
            () = expired => Err(Error::DeadlineExceeded("request deadline exceeded".into())),
            result = call => result.map_err(classify),
        }
    }
}

// Map an adapter error to the crate error a caller can act on.
fn classify(error: anyhow::Error) -> Error {
    if let Some(store_error) = error.downcast_ref::<StoreError>() {
        return match store_error {
            StoreError::DuplicateKey { collection, field } => {
                Error::UniqueConstraint(format!("{field} already exists in {collection}"))
            }
            StoreError::Unavailable(reason) => Error::StoreUnavailable(reason.clone()),
        };
    }
    match error.downcast::<Error>() {
        Ok(error) => error,
        Err(error) => Error::StoreUnavailable(format!("{error:#}")),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Context as _, anyhow};

    use super::*;

    #[tokio::test]
    async fn passes_result() {
        let ctx = Context::new();
        let value = ctx.run(None, async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn canceled_first() {
        let ctx = Context::new();
        ctx.clone().cancel();
        assert!(ctx.is_canceled());

        let Err(Error::Canceled(_)) = ctx.run(None, async { Ok(()) }).await else {
            panic!("should be canceled");
        };
    }

    #[tokio::test]
    async fn deadline_passed() {
        let ctx = Context::new().with_timeout(Duration::from_millis(10));
        let slow = async {
            time::sleep(Duration::from_secs(5)).await;
            Ok(())
        };
        let Err(Error::DeadlineExceeded(_)) = ctx.run(None, slow).await else {
            panic!("should exceed deadline");
        };
    }

    #[tokio::test]
    async fn default_timeout() {
        let ctx = Context::new();
        let slow = async {
            time::sleep(Duration::from_secs(5)).await;
            Ok(())
        };
        let Err(Error::DeadlineExceeded(_)) =
            ctx.run(Some(Duration::from_millis(10)), slow).await
        else {
            panic!("should exceed default timeout");
        };
    }

    #[tokio::test]
    async fn classify_errors() {
        let ctx = Context::new();

        let duplicate = async {
            Err::<(), _>(StoreError::DuplicateKey {
                collection: "categories".into(),
                field: "name".into(),
            })
            .context("inserting category")
        };
        let Err(Error::UniqueConstraint(detail)) = ctx.run(None, duplicate).await else {
            panic!("should be a unique constraint error");
        };
        assert_eq!(detail, "name already exists in categories");

        let Err(Error::StoreUnavailable(_)) =
            ctx.run(None, async { Err::<(), _>(anyhow!("connection reset")) }).await
        else {
            panic!("should be unavailable");
        };
    }

    #[test]
    fn acting_user() {
        let Err(Error::Unauthorized(_)) = Context::new().user_id() else {
            panic!("should be unauthorized");
        };
        let user = Id::new();
        assert_eq!(Context::new().with_user(user).user_id().unwrap(), user);
    }
}
