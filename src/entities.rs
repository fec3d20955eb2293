//! # Entities
//!
//! The records persisted by the repositories. Entities are plain data with
//! field-presence validation; identity and audit fields are assigned by the
//! services before persistence.
//!
//! Documents use camelCase field names, and every entity carries its
//! identity in the `id` field.

mod category;
mod field_definition;
mod ticket;
mod ticket_definition;
mod ticket_status;
mod user;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use self::category::Category;
pub use self::field_definition::{FieldDefinition, FieldKind};
pub use self::ticket::{FieldValue, Ticket};
pub use self::ticket_definition::TicketDefinition;
pub use self::ticket_status::TicketStatus;
pub use self::user::{EMAIL, USERNAME, User};
use crate::value::Id;
use crate::{Result, invalid};

/// Who created and last updated an entity, and when.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Audit {
    /// The user who created the entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Id>,

    /// When the entity was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// The user who last updated the entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<Id>,

    /// When the entity was last updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Audit {
    /// Stamp creation (and first update) by `user` at `now`.
    pub const fn created(&mut self, user: Option<Id>, now: DateTime<Utc>) {
        self.created_by = user;
        self.created_at = Some(now);
        self.updated_by = user;
        self.updated_at = Some(now);
    }

    /// Stamp an update by `user` at `now`.
    pub const fn updated(&mut self, user: Option<Id>, now: DateTime<Utc>) {
        self.updated_by = user;
        self.updated_at = Some(now);
    }
}

// A string attribute must contain more than whitespace.
fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid!("{field} is required, received empty value"));
    }
    Ok(())
}

// An identity attribute must be set.
fn required_id(field: &str, value: &Id) -> Result<()> {
    if value.is_nil() {
        return Err(invalid!("{field} is required, received empty value"));
    }
    Ok(())
}
