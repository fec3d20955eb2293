use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::entities::{Audit, required};
use crate::repository::Entity;
use crate::value::{Id, Value};
use crate::{Error, Result, invalid};

/// The kind of value a ticket field holds.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text.
    #[display("string")]
    String,

    /// An integer or decimal number.
    #[display("number")]
    Number,

    /// True or false.
    #[display("boolean")]
    Boolean,

    /// One of the definition's options.
    #[display("list")]
    List,
}

impl FieldKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [Self::String, Self::Number, Self::Boolean, Self::List];

    /// Whether `value` is an acceptable value for a field of this kind.
    /// `options` is consulted for [`FieldKind::List`] only.
    #[must_use]
    pub fn accepts(self, value: &Value, options: &[Value]) -> bool {
        match self {
            Self::String => matches!(value, Value::Str(_)),
            Self::Number => matches!(value, Value::Int(_) | Value::Float(_)),
            Self::Boolean => matches!(value, Value::Bool(_)),
            Self::List => options.contains(value),
        }
    }
}

impl FromStr for FieldKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|kind| kind.to_string() == s).ok_or_else(|| {
            let all = Self::ALL.map(|kind| kind.to_string()).join(", ");
            invalid!("invalid value for kind provided, got {s}, expected one of {all}")
        })
    }
}

/// A field that can be attached to tickets through a ticket definition.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct FieldDefinition {
    /// Field identity.
    pub id: Id,

    /// Unique field name.
    pub name: String,

    /// What the field captures.
    pub description: String,

    /// Tickets must carry a value for required fields.
    #[serde(default)]
    pub required: bool,

    /// Hidden fields are not shown to the submitter.
    #[serde(default)]
    pub hidden: bool,

    /// Values of hashed fields are stored hashed.
    #[serde(default)]
    pub hash: bool,

    /// The kind of value the field holds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,

    /// The allowed values when the kind is [`FieldKind::List`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,

    /// Disabled fields are not offered on new tickets.
    #[serde(default)]
    pub disabled: bool,

    /// Who disabled the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_by: Option<Id>,

    /// When the field was disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_at: Option<DateTime<Utc>>,

    /// Audit fields.
    #[serde(flatten)]
    pub audit: Audit,
}

impl Entity for FieldDefinition {
    const COLLECTION: &'static str = "fieldDefinitions";
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
        required("description", &self.description)?;
        let Some(kind) = self.kind else {
            return Err(invalid!("kind is required, received empty value"));
        };
        if kind == FieldKind::List && self.options.is_empty() {
            return Err(invalid!("options cannot be empty when kind is {kind}"));
        }
        Ok(())
    }
}
