//! Ticket service: tickets together with the definitions, statuses and field
//! definitions they reference.

use std::sync::Arc;

use crate::config::Config;
use crate::context::Context;
use crate::entities::{FieldDefinition, Ticket, TicketDefinition, TicketStatus};
use crate::provider::DocumentStore;
use crate::repository::Entity;
use crate::service::{Clock, EntityService, IdGenerator, logged, missing_reference};
use crate::value::Id;
use crate::{Error, ID_FIELD, Operator, Result, invalid};

/// Tickets and their supporting entities.
pub struct TicketService<S> {
    tickets: EntityService<Ticket, S>,
    definitions: EntityService<TicketDefinition, S>,
    statuses: EntityService<TicketStatus, S>,
    fields: EntityService<FieldDefinition, S>,
}

impl<S> Clone for TicketService<S> {
    fn clone(&self) -> Self {
        Self {
            tickets: self.tickets.clone(),
            definitions: self.definitions.clone(),
            statuses: self.statuses.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl<S: DocumentStore> TicketService<S> {
    /// Create a ticket service over `store`.
    pub fn new(store: Arc<S>, config: &Config) -> Self {
        Self {
            tickets: EntityService::new(Arc::clone(&store), config.clone()),
            definitions: EntityService::new(Arc::clone(&store), config.clone()),
            statuses: EntityService::new(Arc::clone(&store), config.clone()),
            fields: EntityService::new(store, config.clone()),
        }
    }

    /// Use `clock` for audit timestamps.
    #[must_use]
    pub fn with_clock(self, clock: &Arc<dyn Clock>) -> Self {
        Self {
            tickets: self.tickets.with_clock(Arc::clone(clock)),
            definitions: self.definitions.with_clock(Arc::clone(clock)),
            statuses: self.statuses.with_clock(Arc::clone(clock)),
            fields: self.fields.with_clock(Arc::clone(clock)),
        }
    }

    /// Use `ids` for new identities.
    #[must_use]
    pub fn with_ids(self, ids: &Arc<dyn IdGenerator>) -> Self {
        Self {
            tickets: self.tickets.with_ids(Arc::clone(ids)),
            definitions: self.definitions.with_ids(Arc::clone(ids)),
            statuses: self.statuses.with_ids(Arc::clone(ids)),
            fields: self.fields.with_ids(Arc::clone(ids)),
        }
    }

    /// Ticket reads.
    pub const fn tickets(&self) -> &EntityService<Ticket, S> {
        &self.tickets
    }

    /// Ticket definition reads and writes.
    pub const fn definitions(&self) -> &EntityService<TicketDefinition, S> {
        &self.definitions
    }

    /// Ticket status reads and writes.
    pub const fn statuses(&self) -> &EntityService<TicketStatus, S> {
        &self.statuses
    }

    /// Field definition reads and writes.
    pub const fn fields(&self) -> &EntityService<FieldDefinition, S> {
        &self.fields
    }

    /// Declare the unique indexes of every entity the service manages.
    ///
    /// # Errors
    ///
    /// Returns the classified store error when an index cannot be created.
    pub async fn init(&self, ctx: &Context) -> Result<()> {
        self.tickets.init(ctx).await?;
        self.definitions.init(ctx).await?;
        self.statuses.init(ctx).await?;
        self.fields.init(ctx).await
    }

    /// Create a ticket definition after checking every field it lists
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`](crate::Error::Validation) when the
    /// definition is invalid or lists an unknown field, and
    /// [`Error::UniqueConstraint`](crate::Error::UniqueConstraint) when the
    /// name is taken.
    pub async fn create_definition(
        &self, ctx: &Context, definition: TicketDefinition,
    ) -> Result<TicketDefinition> {
        let checked = async {
            definition.validate()?;
            self.resolve_fields(ctx, &definition.fields).await
        };
        logged("create", "ticketDefinitions", checked.await)?;
        self.definitions.create(ctx, definition).await
    }

    /// Update a ticket definition after checking every field it lists
    /// exists.
    ///
    /// # Errors
    ///
    /// As [`TicketService::create_definition`], plus
    /// [`Error::NotFound`](crate::Error::NotFound) for an unknown `id`.
    pub async fn update_definition(
        &self, ctx: &Context, id: &Id, definition: TicketDefinition,
    ) -> Result<TicketDefinition> {
        let checked = async {
            definition.validate()?;
            self.resolve_fields(ctx, &definition.fields).await
        };
        logged("update", "ticketDefinitions", checked.await)?;
        self.definitions.update(ctx, id, definition).await
    }

    /// Create a ticket. The acting user becomes the submitter.
    ///
    /// The ticket's definition and status must exist, the definition must be
    /// enabled, every field value must belong to the definition and suit the
    /// field's kind, and every required field must have a value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`](crate::Error::Unauthorized) without an
    /// acting user and [`Error::Validation`](crate::Error::Validation) when
    /// any check fails.
    pub async fn create_ticket(&self, ctx: &Context, mut ticket: Ticket) -> Result<Ticket> {
        let checked = async {
            let user = ctx.user_id()?;
            ticket.validate()?;
            self.status(ctx, &ticket.status_id).await?;
            self.check_fields(ctx, &ticket).await?;
            Ok::<_, Error>(user)
        };
        let user = logged("create", "tickets", checked.await)?;

        ticket.submitted_by = Some(user);
        self.tickets.create(ctx, ticket).await
    }

    /// Update a ticket.
    ///
    /// A ticket in a locked status keeps that status. The submitter and
    /// definition are carried over from the stored ticket.
    ///
    /// # Errors
    ///
    /// As [`TicketService::create_ticket`], plus
    /// [`Error::NotFound`](crate::Error::NotFound) for an unknown `id`.
    pub async fn update_ticket(&self, ctx: &Context, id: &Id, mut ticket: Ticket) -> Result<Ticket> {
        let checked = async {
            ctx.user_id()?;
            let stored = self.tickets.repository().get(ctx, id).await?;
            ticket.submitted_by = stored.submitted_by;
            ticket.definition_id = stored.definition_id;
            ticket.validate()?;

            if ticket.status_id != stored.status_id {
                let current = self.status(ctx, &stored.status_id).await?;
                if current.locked {
                    return Err(invalid!("ticket {id} is in locked status {}", current.name));
                }
                self.status(ctx, &ticket.status_id).await?;
            }
            self.check_fields(ctx, &ticket).await
        };
        logged("update", "tickets", checked.await)?;
        self.tickets.update(ctx, id, ticket).await
    }

    async fn status(&self, ctx: &Context, id: &Id) -> Result<TicketStatus> {
        self.statuses
            .repository()
            .get(ctx, id)
            .await
            .map_err(|e| missing_reference(e, "ticket status", id))
    }

    // Fetch the field definitions with identities `ids` in one query,
    // failing when any is missing.
    async fn resolve_fields(&self, ctx: &Context, ids: &[Id]) -> Result<Vec<FieldDefinition>> {
        let found = self.fields.repository().list(ctx, &[Operator::is_in(ID_FIELD, ids)?]).await?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|f| f.id == **id)) {
            return Err(invalid!("field definition {missing} does not exist"));
        }
        Ok(found)
    }

    async fn check_fields(&self, ctx: &Context, ticket: &Ticket) -> Result<()> {
        let definition = self
            .definitions
            .repository()
            .get(ctx, &ticket.definition_id)
            .await
            .map_err(|e| missing_reference(e, "ticket definition", &ticket.definition_id))?;
        if definition.disabled {
            return Err(invalid!("ticket definition {} is disabled", definition.name));
        }

        let fields = self.resolve_fields(ctx, &definition.fields).await?;
        for value in &ticket.fields {
            let Some(field) = fields.iter().find(|f| f.id == value.id) else {
                return Err(invalid!(
                    "field {} is not part of ticket definition {}",
                    value.id,
                    definition.name
                ));
            };
            let Some(kind) = field.kind else {
                return Err(invalid!("field {} has no kind", field.name));
            };
            if !kind.accepts(&value.value, &field.options) {
                return Err(invalid!("value for field {} is not a valid {kind}", field.name));
            }
        }

        if let Some(field) = fields.iter().find(|f| f.required && ticket.field(&f.id).is_none()) {
            return Err(invalid!("field {} is required, received empty value", field.name));
        }
        Ok(())
    }
}
