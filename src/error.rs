//! # Store Errors

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Store access errors.
///
/// Each variant renders as a small JSON document carrying a status code and a
/// human-readable detail, ready for a consuming HTTP layer to pass on.
#[derive(Error, Debug, Deserialize)]
pub enum Error {
    /// An operator sequence violates shape invariants. Always a caller bug.
    #[error(r#"{{"code": 400, "detail": "{0}"}}"#)]
    MalformedQuery(String),

    /// Entity attributes failed domain rules.
    #[error(r#"{{"code": 400, "detail": "{0}"}}"#)]
    Validation(String),

    /// The request carries no acting user.
    #[error(r#"{{"code": 401, "detail": "{0}"}}"#)]
    Unauthorized(String),

    /// No entity matched.
    #[error(r#"{{"code": 404, "detail": "{0}"}}"#)]
    NotFound(String),

    /// The store rejected a write that would break a uniqueness constraint.
    #[error(r#"{{"code": 409, "detail": "{0}"}}"#)]
    UniqueConstraint(String),

    /// The originating request was canceled before the store replied.
    #[error(r#"{{"code": 499, "detail": "{0}"}}"#)]
    Canceled(String),

    /// The store could not be reached or failed in transit.
    #[error(r#"{{"code": 503, "detail": "{0}"}}"#)]
    StoreUnavailable(String),

    /// The request deadline passed before the store replied.
    #[error(r#"{{"code": 504, "detail": "{0}"}}"#)]
    DeadlineExceeded(String),

    /// The store returned something the crate could not make sense of.
    #[error(r#"{{"code": 500, "detail": "{0}"}}"#)]
    Server(String),
}

impl Error {
    /// The status code associated with the error.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::MalformedQuery(_) | Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::UniqueConstraint(_) => 409,
            Self::Canceled(_) => 499,
            Self::Server(_) => 500,
            Self::StoreUnavailable(_) => 503,
            Self::DeadlineExceeded(_) => 504,
        }
    }

    /// The human-readable detail carried by the error.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::MalformedQuery(detail)
            | Self::Validation(detail)
            | Self::Unauthorized(detail)
            | Self::NotFound(detail)
            | Self::UniqueConstraint(detail)
            | Self::Canceled(detail)
            | Self::StoreUnavailable(detail)
            | Self::DeadlineExceeded(detail)
            | Self::Server(detail) => detail,
        }
    }

    /// Transform the error into its JSON representation.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StoreErrorBody {
            code: self.code(),
            detail: self.detail(),
        }
        .serialize(serializer)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Server(error.to_string())
    }
}

/// Construct an `Error::MalformedQuery` error from a string or existing error
/// value.
///
/// # Example
///
/// ```
/// use support_store::{Error, malformed};
///
/// fn check(column: &str) -> Result<(), Error> {
///     if column.is_empty() {
///         return Err(malformed!("column is required for {}", "Equal"));
///     }
///     Ok(())
/// }
/// assert!(check("").is_err());
/// ```
#[macro_export]
macro_rules! malformed {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::MalformedQuery(format!($fmt, $($arg)*))
    };
    ($err:expr $(,)?) => {
        $crate::Error::MalformedQuery(format!($err))
    };
}

/// Construct an `Error::Validation` error from a string or existing error
/// value.
#[macro_export]
macro_rules! invalid {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::Validation(format!($fmt, $($arg)*))
    };
    ($err:expr $(,)?) => {
        $crate::Error::Validation(format!($err))
    };
}

// Error response for serializing errors to JSON.
#[derive(Serialize)]
struct StoreErrorBody<'a> {
    code: u16,
    detail: &'a str,
}
