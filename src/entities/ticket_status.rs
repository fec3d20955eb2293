use serde::{Deserialize, Serialize};

use crate::Result;
use crate::entities::{Audit, required};
use crate::repository::Entity;
use crate::value::Id;

/// A state a ticket can be in, such as open or closed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStatus {
    /// Status identity.
    pub id: Id,

    /// Unique display name.
    pub name: String,

    /// Tickets placed in a locked status cannot move to another status.
    #[serde(default)]
    pub locked: bool,

    /// Audit fields.
    #[serde(flatten)]
    pub audit: Audit,
}

impl Entity for TicketStatus {
    const COLLECTION: &'static str = "ticketStatuses";
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
        required("name", &self.name)
    }
}
