use serde::{Deserialize, Serialize};

use crate::Result;
use crate::entities::{Audit, required};
use crate::repository::Entity;
use crate::value::Id;

/// A node in the ticket category hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category identity.
    pub id: Id,

    /// The parent category, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Id>,

    /// Display name.
    pub name: String,

    /// Audit fields.
    #[serde(flatten)]
    pub audit: Audit,
}

impl Entity for Category {
    const COLLECTION: &'static str = "categories";

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
        if self.parent_id.is_some_and(|parent| parent == self.id) {
            return Err(crate::invalid!("a category cannot be its own parent"));
        }
        Ok(())
    }
}
