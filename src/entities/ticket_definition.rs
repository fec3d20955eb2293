use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Audit, required};
use crate::repository::Entity;
use crate::value::Id;
use crate::{Result, invalid};

/// A type of ticket and the fields tickets of that type carry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDefinition {
    /// Definition identity.
    pub id: Id,

    /// Unique display name.
    pub name: String,

    /// Field definitions attached to tickets of this type, in display order.
    pub fields: Vec<Id>,

    /// Disabled definitions cannot be used for new tickets.
    #[serde(default)]
    pub disabled: bool,

    /// Who disabled the definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_by: Option<Id>,

    /// When the definition was disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_at: Option<DateTime<Utc>>,

    /// Audit fields.
    #[serde(flatten)]
    pub audit: Audit,
}

impl Entity for TicketDefinition {
    const COLLECTION: &'static str = "ticketDefinitions";
    const UNIQUE: &'static [&'static str] = &["name"];

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
        required("name", &self.name)?;
        if self.fields.is_empty() {
            return Err(invalid!("fields is required, received empty array"));
        }

        let mut seen = HashSet::with_capacity(self.fields.len());
        if let Some(duplicate) = self.fields.iter().find(|id| !seen.insert(**id)) {
            return Err(invalid!("field {duplicate} is listed more than once"));
        }
        Ok(())
    }
}
