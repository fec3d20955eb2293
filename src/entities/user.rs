use serde::{Deserialize, Serialize};

use crate::Result;
use crate::entities::{Audit, required};
use crate::repository::Entity;
use crate::value::Id;

/// Column holding a user's login name.
pub const USERNAME: &str = "username";

/// Column holding a user's email address.
pub const EMAIL: &str = "email";

/// A person who can sign in to the support desk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User identity.
    pub id: Id,

    /// Given name.
    pub first_name: String,

    /// Family name.
    pub last_name: String,

    /// Unique email address.
    pub email: String,

    /// Unique login name.
    pub username: String,

    /// The stored credential. Only present on the way in; services strip it
    /// from every user they return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Audit fields.
    #[serde(flatten)]
    pub audit: Audit,
}

impl User {
    /// The user without its credential.
    #[must_use]
    pub fn redacted(mut self) -> Self {
        self.password = None;
        self
    }
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    const UNIQUE: &'static [&'static str] = &[USERNAME, EMAIL];

    fn id(&self) -> Id {
        self.id
    }

    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn validate(&self) -> Result<()> {
        required("first name", &self.first_name)?;
        required("last name", &self.last_name)?;
        required("email address", &self.email)?;
        required("username", &self.username)?;
        required("password", self.password.as_deref().unwrap_or_default())
    }
}
