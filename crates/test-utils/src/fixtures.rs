//! Entity fixtures and deterministic service collaborators.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use support_store::entities::{
    Category, FieldDefinition, FieldKind, TicketDefinition, TicketStatus, User,
};
use support_store::service::{Clock, IdGenerator};
use support_store::{Id, Value};

/// A clock stuck at a fixed instant, movable by tests.
#[derive(Debug)]
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    /// A clock reading `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = now;
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new(timestamp(2024, 1, 1))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Hands out a fixed list of identities in order, then random ones.
#[derive(Debug, Default)]
pub struct QueuedIds(Mutex<Vec<Id>>);

impl QueuedIds {
    /// Identities to hand out first, in order.
    #[must_use]
    pub fn new(ids: impl IntoIterator<Item = Id>) -> Self {
        let mut ids: Vec<Id> = ids.into_iter().collect();
        ids.reverse();
        Self(Mutex::new(ids))
    }
}

impl IdGenerator for QueuedIds {
    fn generate(&self) -> Id {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).pop().unwrap_or_default()
    }
}

/// Midnight UTC on the given day.
///
/// # Panics
///
/// Panics when the date does not exist.
#[must_use]
pub fn timestamp(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single().expect("should be a valid date")
}

/// A category with identity `id`.
#[must_use]
pub fn category(id: Id, name: &str) -> Category {
    Category {
        id,
        name: name.to_string(),
        ..Category::default()
    }
}

/// A ticket status (without identity).
#[must_use]
pub fn status(name: &str, locked: bool) -> TicketStatus {
    TicketStatus {
        name: name.to_string(),
        locked,
        ..TicketStatus::default()
    }
}

/// A field definition (without identity).
#[must_use]
pub fn field(name: &str, kind: FieldKind, required: bool) -> FieldDefinition {
    let options = if kind == FieldKind::List {
        vec![Value::from("low"), Value::from("medium"), Value::from("high")]
    } else {
        vec![]
    };
    FieldDefinition {
        name: name.to_string(),
        description: format!("The {name} of the ticket"),
        required,
        kind: Some(kind),
        options,
        ..FieldDefinition::default()
    }
}

/// A ticket definition (without identity) listing `fields`.
#[must_use]
pub fn definition(name: &str, fields: impl IntoIterator<Item = Id>) -> TicketDefinition {
    TicketDefinition {
        name: name.to_string(),
        fields: fields.into_iter().collect(),
        ..TicketDefinition::default()
    }
}

/// A complete registration (without identity) for `username`.
#[must_use]
pub fn user(username: &str) -> User {
    User {
        first_name: "Test".into(),
        last_name: username.to_string(),
        email: format!("{username}@example.com"),
        username: username.to_string(),
        password: Some("correct horse battery staple".into()),
        ..User::default()
    }
}
