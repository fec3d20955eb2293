use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entities::{Audit, required_id};
use crate::repository::Entity;
use crate::value::{Id, Value};
use crate::{Result, invalid};

/// A ticket submitted to the support desk.
///
/// The ticket's definition dictates which fields it carries.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Ticket identity.
    pub id: Id,

    /// The user who submitted the ticket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<Id>,

    /// The user the ticket is assigned to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Id>,

    /// Current status.
    pub status_id: Id,

    /// The definition the ticket was created from.
    pub definition_id: Id,

    /// The category the ticket is filed under.
    pub category_id: Id,

    /// Field values, one per field definition.
    #[serde(default)]
    pub fields: Vec<FieldValue>,

    /// Audit fields.
    #[serde(flatten)]
    pub audit: Audit,
}

/// The value of a single ticket field.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FieldValue {
    /// The field definition the value is for.
    pub id: Id,

    /// The value.
    pub value: Value,
}

impl Ticket {
    /// The value for field definition `id`, if present.
    #[must_use]
    pub fn field(&self, id: &Id) -> Option<&Value> {
        self.fields.iter().find(|field| &field.id == id).map(|field| &field.value)
    }
}

impl Entity for Ticket {
    const COLLECTION: &'static str = "tickets";

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
        required_id("statusId", &self.status_id)?;
        required_id("definitionId", &self.definition_id)?;
        required_id("categoryId", &self.category_id)?;

        let mut seen = HashSet::with_capacity(self.fields.len());
        if let Some(duplicate) = self.fields.iter().find(|field| !seen.insert(field.id)) {
            return Err(invalid!("field {} has more than one value", duplicate.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn references_required() {
        let ticket = Ticket {
            status_id: Id::new(),
            ..Ticket::default()
        };
        let Err(Error::Validation(detail)) = ticket.validate() else {
            panic!("should require a definition");
        };
        assert_eq!(detail, "definitionId is required, received empty value");
    }

    #[test]
    fn field_lookup() {
        let field = Id::new();
        let ticket = Ticket {
            fields: vec![FieldValue {
                id: field,
                value: Value::from("printer on fire"),
            }],
            ..Ticket::default()
        };
        assert_eq!(ticket.field(&field), Some(&Value::from("printer on fire")));
        assert_eq!(ticket.field(&Id::new()), None);
    }
}
