//! Services
//!
//! Identity assignment, audit stamping and the cross-entity checks the
//! ticket and user services add around the repositories.

use std::sync::Arc;

use support_store::entities::{Category, FieldKind, FieldValue, Ticket, TicketDefinition};
use support_store::service::{CategoryService, Clock, IdGenerator, TicketService, UserService};
use support_store::{Config, Context, Error, Id, Value};
use test_utils::MemoryStore;
use test_utils::fixtures::{FixedClock, QueuedIds, definition, field, status, timestamp, user};

#[tokio::test]
async fn audit_stamping() {
    test_utils::init_tracing();
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(timestamp(2024, 5, 1)));
    let id = Id::new();
    let service = CategoryService::new(store, Config::default())
        .with_clock(clock.clone())
        .with_ids(Arc::new(QueuedIds::new([id])));

    let alice = Id::new();
    let bob = Id::new();

    // --------------------------------------------------
    // Alice creates a category. The service assigns its identity.
    // --------------------------------------------------
    let ctx = Context::new().with_user(alice);
    let draft = Category {
        name: "Hardware".into(),
        ..Category::default()
    };
    let created = service.create(&ctx, draft).await.expect("should create");
    assert_eq!(created.id, id);
    assert_eq!(created.audit.created_by, Some(alice));
    assert_eq!(created.audit.created_at, Some(timestamp(2024, 5, 1)));
    assert_eq!(created.audit.updated_by, Some(alice));

    // --------------------------------------------------
    // Bob renames it a month later. Creation stamps survive.
    // --------------------------------------------------
    clock.set(timestamp(2024, 6, 1));
    let ctx = Context::new().with_user(bob);
    let rename = Category {
        name: "Devices".into(),
        ..Category::default()
    };
    let updated = service.update(&ctx, &id, rename).await.expect("should update");
    assert_eq!(updated.id, id);
    assert_eq!(updated.audit.created_by, Some(alice));
    assert_eq!(updated.audit.created_at, Some(timestamp(2024, 5, 1)));
    assert_eq!(updated.audit.updated_by, Some(bob));
    assert_eq!(updated.audit.updated_at, Some(timestamp(2024, 6, 1)));

    let stored = service.get(&Context::new(), &id).await.expect("should get");
    assert_eq!(stored, updated);
}

// Reads need no acting user, writes do.
#[tokio::test]
async fn acting_user() {
    let store = Arc::new(MemoryStore::new());
    let service = CategoryService::new(Arc::clone(&store), Config::default());
    let ctx = Context::new();

    let draft = Category {
        name: "Hardware".into(),
        ..Category::default()
    };
    let Err(error @ Error::Unauthorized(_)) = service.create(&ctx, draft.clone()).await else {
        panic!("should require a user");
    };
    assert_eq!(error.code(), 401);

    let created =
        service.create(&ctx.clone().with_user(Id::new()), draft).await.expect("should create");
    let Err(Error::Unauthorized(_)) = service.update(&ctx, &created.id, created.clone()).await
    else {
        panic!("should require a user");
    };

    assert_eq!(service.list(&ctx, &[]).await.expect("should list").len(), 1);
}

#[tokio::test]
async fn update_missing() {
    let service = CategoryService::new(Arc::new(MemoryStore::new()), Config::default());
    let ctx = Context::new().with_user(Id::new());

    let Err(Error::NotFound(_)) = service.update(&ctx, &Id::new(), Category::default()).await
    else {
        panic!("should not be found");
    };
}

// --------------------------------------------------
// Tickets
// --------------------------------------------------

struct Desk {
    service: TicketService<MemoryStore>,
    ctx: Context,
    open: Id,
    closed: Id,
    priority: Id,
    summary: Id,
    definition: Id,
}

// A desk with open and closed (locked) statuses, a required list field, an
// optional string field, and a definition using both.
async fn desk() -> Desk {
    let store = Arc::new(MemoryStore::new());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::default());
    let service = TicketService::new(store, &Config::default()).with_clock(&clock);
    let ctx = Context::new().with_user(Id::new());
    service.init(&ctx).await.expect("should create indexes");

    let open = service.statuses().create(&ctx, status("open", false)).await.expect("should create");
    let closed =
        service.statuses().create(&ctx, status("closed", true)).await.expect("should create");
    let priority = service
        .fields()
        .create(&ctx, field("priority", FieldKind::List, true))
        .await
        .expect("should create");
    let summary = service
        .fields()
        .create(&ctx, field("summary", FieldKind::String, false))
        .await
        .expect("should create");
    let definition = service
        .create_definition(&ctx, definition("Incident", [priority.id, summary.id]))
        .await
        .expect("should create");

    Desk {
        service,
        ctx,
        open: open.id,
        closed: closed.id,
        priority: priority.id,
        summary: summary.id,
        definition: definition.id,
    }
}

impl Desk {
    fn ticket(&self, fields: impl IntoIterator<Item = (Id, Value)>) -> Ticket {
        Ticket {
            status_id: self.open,
            definition_id: self.definition,
            category_id: Id::new(),
            fields: fields.into_iter().map(|(id, value)| FieldValue { id, value }).collect(),
            ..Ticket::default()
        }
    }
}

#[tokio::test]
async fn definitions() {
    let desk = desk().await;
    let defs = &desk.service;

    let unknown = Id::new();
    let Err(Error::Validation(detail)) =
        defs.create_definition(&desk.ctx, definition("Request", [desk.priority, unknown])).await
    else {
        panic!("should reject an unknown field");
    };
    assert_eq!(detail, format!("field definition {unknown} does not exist"));

    let Err(Error::Validation(detail)) = defs
        .create_definition(&desk.ctx, definition("Request", [desk.priority, desk.priority]))
        .await
    else {
        panic!("should reject a repeated field");
    };
    assert_eq!(detail, format!("field {} is listed more than once", desk.priority));

    let Err(Error::UniqueConstraint(_)) =
        defs.create_definition(&desk.ctx, definition("Incident", [desk.summary])).await
    else {
        panic!("should reject a duplicate name");
    };

    // narrowing an existing definition keeps its identity
    let narrowed = defs
        .update_definition(&desk.ctx, &desk.definition, definition("Incident", [desk.priority]))
        .await
        .expect("should update");
    assert_eq!(narrowed.id, desk.definition);
    assert_eq!(narrowed.fields, vec![desk.priority]);
}

#[tokio::test]
async fn create_ticket() {
    let desk = desk().await;
    let submitter = Id::new();
    let ctx = Context::new().with_user(submitter);

    let ticket = desk.ticket([
        (desk.priority, Value::from("high")),
        (desk.summary, Value::from("VPN drops every hour")),
    ]);
    let created = desk.service.create_ticket(&ctx, ticket).await.expect("should create");
    assert_eq!(created.submitted_by, Some(submitter));
    assert_eq!(created.audit.created_by, Some(submitter));
    assert_eq!(created.field(&desk.priority), Some(&Value::from("high")));

    let stored = desk.service.tickets().get(&ctx, &created.id).await.expect("should get");
    assert_eq!(stored, created);
}

// Text that looks like a timestamp or an identity is still text after a
// save and reload, so the reloaded ticket can be saved again.
#[tokio::test]
async fn shaped_text_fields() {
    let desk = desk().await;
    let ctx = &desk.ctx;

    // --------------------------------------------------
    // A summary holding a timestamp-shaped string.
    // --------------------------------------------------
    let ticket = desk.ticket([
        (desk.priority, Value::from("low")),
        (desk.summary, Value::from("2024-05-01T00:00:00Z")),
    ]);
    let created = desk.service.create_ticket(ctx, ticket).await.expect("should create");

    let stored = desk.service.tickets().get(ctx, &created.id).await.expect("should get");
    assert_eq!(stored.field(&desk.summary), Some(&Value::from("2024-05-01T00:00:00Z")));
    assert_eq!(stored, created);

    let updated =
        desk.service.update_ticket(ctx, &created.id, stored).await.expect("should update");
    assert_eq!(updated.field(&desk.summary), Some(&Value::from("2024-05-01T00:00:00Z")));

    // --------------------------------------------------
    // The summary changes to an identity-shaped string.
    // --------------------------------------------------
    let shaped = Id::new().to_string();
    let mut edited = updated.clone();
    edited.fields.retain(|field| field.id != desk.summary);
    edited.fields.push(FieldValue {
        id: desk.summary,
        value: Value::from(shaped.as_str()),
    });
    desk.service.update_ticket(ctx, &created.id, edited).await.expect("should update");

    let stored = desk.service.tickets().get(ctx, &created.id).await.expect("should get");
    assert_eq!(stored.field(&desk.summary), Some(&Value::Str(shaped)));
    desk.service.update_ticket(ctx, &created.id, stored).await.expect("should update");
}

#[tokio::test]
async fn ticket_fields() {
    let desk = desk().await;
    let ctx = &desk.ctx;

    // a required field is missing
    let ticket = desk.ticket([(desk.summary, Value::from("printer jam"))]);
    let Err(Error::Validation(detail)) = desk.service.create_ticket(ctx, ticket).await else {
        panic!("should require priority");
    };
    assert_eq!(detail, "field priority is required, received empty value");

    // a list value outside the options
    let ticket = desk.ticket([(desk.priority, Value::from("urgent"))]);
    let Err(Error::Validation(detail)) = desk.service.create_ticket(ctx, ticket).await else {
        panic!("should reject the value");
    };
    assert_eq!(detail, "value for field priority is not a valid list");

    // a value of the wrong kind
    let ticket = desk.ticket([(desk.priority, Value::from("low")), (desk.summary, Value::from(3))]);
    let Err(Error::Validation(_)) = desk.service.create_ticket(ctx, ticket).await else {
        panic!("should reject the value");
    };

    // a field the definition does not list
    let stray = Id::new();
    let ticket = desk.ticket([(desk.priority, Value::from("low")), (stray, Value::from(true))]);
    let Err(Error::Validation(detail)) = desk.service.create_ticket(ctx, ticket).await else {
        panic!("should reject the field");
    };
    assert_eq!(detail, format!("field {stray} is not part of ticket definition Incident"));

    // an unknown status
    let mut ticket = desk.ticket([(desk.priority, Value::from("low"))]);
    let unknown = Id::new();
    ticket.status_id = unknown;
    let Err(Error::Validation(detail)) = desk.service.create_ticket(ctx, ticket).await else {
        panic!("should reject the status");
    };
    assert_eq!(detail, format!("ticket status {unknown} does not exist"));

    // an unknown definition
    let mut ticket = desk.ticket([]);
    let unknown = Id::new();
    ticket.definition_id = unknown;
    let Err(Error::Validation(detail)) = desk.service.create_ticket(ctx, ticket).await else {
        panic!("should reject the definition");
    };
    assert_eq!(detail, format!("ticket definition {unknown} does not exist"));

    assert!(desk.service.tickets().list(ctx, &[]).await.expect("should list").is_empty());
}

#[tokio::test]
async fn locked_status() {
    let desk = desk().await;
    let ctx = &desk.ctx;

    let ticket = desk.ticket([(desk.priority, Value::from("low"))]);
    let created = desk.service.create_ticket(ctx, ticket).await.expect("should create");

    // close the ticket; the submitter and definition cannot be changed
    let mut closing = created.clone();
    closing.status_id = desk.closed;
    closing.submitted_by = Some(Id::new());
    closing.definition_id = Id::new();
    let closed =
        desk.service.update_ticket(ctx, &created.id, closing).await.expect("should update");
    assert_eq!(closed.status_id, desk.closed);
    assert_eq!(closed.submitted_by, created.submitted_by);
    assert_eq!(closed.definition_id, desk.definition);

    // a closed ticket cannot be reopened
    let mut reopening = closed.clone();
    reopening.status_id = desk.open;
    let Err(Error::Validation(detail)) =
        desk.service.update_ticket(ctx, &created.id, reopening).await
    else {
        panic!("should stay closed");
    };
    assert_eq!(detail, format!("ticket {} is in locked status closed", created.id));

    // other fields can still change
    let mut annotated = closed.clone();
    annotated.fields.push(FieldValue {
        id: desk.summary,
        value: Value::from("resolved by restart"),
    });
    desk.service.update_ticket(ctx, &created.id, annotated).await.expect("should update");
}

#[tokio::test]
async fn disabled_definition() {
    let desk = desk().await;
    let ctx = &desk.ctx;

    let stored = desk.service.definitions().get(ctx, &desk.definition).await.expect("should get");
    let disabled = TicketDefinition {
        disabled: true,
        ..stored
    };
    desk.service
        .update_definition(ctx, &desk.definition, disabled)
        .await
        .expect("should update");

    let ticket = desk.ticket([(desk.priority, Value::from("low"))]);
    let Err(Error::Validation(detail)) = desk.service.create_ticket(ctx, ticket).await else {
        panic!("should reject a disabled definition");
    };
    assert_eq!(detail, "ticket definition Incident is disabled");
}

// --------------------------------------------------
// Users
// --------------------------------------------------

#[tokio::test]
async fn registration() {
    let store = Arc::new(MemoryStore::new());
    let id = Id::new();
    let ids: Arc<dyn IdGenerator> = Arc::new(QueuedIds::new([id]));
    let service = UserService::new(Arc::clone(&store), Config::default()).with_ids(ids);
    let ctx = Context::new();
    service.init(&ctx).await.expect("should create indexes");

    // --------------------------------------------------
    // Ada registers. No acting user is needed.
    // --------------------------------------------------
    let ada = service.register(&ctx, user("ada")).await.expect("should register");
    assert_eq!(ada.id, id);
    assert_eq!(ada.audit.created_by, Some(id));
    assert!(ada.password.is_none());

    // the credential is stored but never returned
    let stored = store.documents("users").await;
    assert_eq!(stored[0]["password"], "correct horse battery staple");
    assert!(service.get(&ctx, &id).await.expect("should get").password.is_none());
    assert!(service.list(&ctx, &[]).await.expect("should list")[0].password.is_none());

    // --------------------------------------------------
    // The same username or email cannot register twice.
    // --------------------------------------------------
    let Err(Error::UniqueConstraint(_)) = service.register(&ctx, user("ada")).await else {
        panic!("should reject a second ada");
    };
    let mut imposter = user("grace");
    imposter.email = "ada@example.com".into();
    let Err(Error::UniqueConstraint(_)) = service.register(&ctx, imposter).await else {
        panic!("should reject a reused email");
    };

    let mut incomplete = user("grace");
    incomplete.password = None;
    let Err(Error::Validation(detail)) = service.register(&ctx, incomplete).await else {
        panic!("should require a password");
    };
    assert_eq!(detail, "password is required, received empty value");
}

#[tokio::test]
async fn login() {
    let store = Arc::new(MemoryStore::new());
    let service = UserService::new(store, Config::default());
    let ctx = Context::new();
    let ada = service.register(&ctx, user("ada")).await.expect("should register");

    let by_name = service.find_by_login(&ctx, "ada").await.expect("should find");
    let by_email = service.find_by_login(&ctx, "ada@example.com").await.expect("should find");
    assert_eq!(by_name, ada);
    assert_eq!(by_email, ada);

    let Err(Error::NotFound(_)) = service.find_by_login(&ctx, "grace").await else {
        panic!("should not be found");
    };

    let verified = service
        .verify_login(&ctx, "ada", |stored| stored == "correct horse battery staple")
        .await
        .expect("should verify");
    assert_eq!(verified.id, ada.id);
    assert!(verified.password.is_none());

    let Err(Error::Unauthorized(wrong)) = service.verify_login(&ctx, "ada", |_| false).await
    else {
        panic!("should reject the password");
    };
    let Err(Error::Unauthorized(unknown)) = service.verify_login(&ctx, "grace", |_| true).await
    else {
        panic!("should reject the login");
    };
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn profile_update() {
    let store = Arc::new(MemoryStore::new());
    let service = UserService::new(Arc::clone(&store), Config::default());
    let ada = service.register(&Context::new(), user("ada")).await.expect("should register");
    let ctx = Context::new().with_user(ada.id);

    // a profile update without a credential keeps the stored one
    let mut renamed = ada.clone();
    renamed.first_name = "Augusta".into();
    let updated = service.update(&ctx, &ada.id, renamed).await.expect("should update");
    assert_eq!(updated.first_name, "Augusta");
    assert!(updated.password.is_none());
    assert_eq!(store.documents("users").await[0]["password"], "correct horse battery staple");

    let mut changed = updated.clone();
    changed.password = Some("tr0ub4dor".into());
    service.update(&ctx, &ada.id, changed).await.expect("should update");
    assert_eq!(store.documents("users").await[0]["password"], "tr0ub4dor");
}
