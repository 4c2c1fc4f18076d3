//! Event repository: create, read, update, close and delete events.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tally_core::event::{EventService, EventStats, EventStatus};
use tally_shared::types::{EventId, UserId};
use tally_shared::{AppError, AppResult};
use uuid::Uuid;

use crate::entities::{
    collectors, events, expense_beneficiaries, expense_payers, expenses, participants,
    payment_requests, settlements, users,
};
use crate::repositories::ledger::amount;
use crate::repositories::scope::{
    creator_of, db_error, event_status, load_for_member, lock_event, now,
};

/// Input for creating an event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    /// Event name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// ISO currency code.
    pub currency: String,
}

/// Input for updating an event. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventInput {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description; a blank string clears it.
    #[serde(default)]
    pub description: Option<String>,
    /// New status; only closing is allowed.
    #[serde(default)]
    pub status: Option<EventStatus>,
}

/// An event with its headline numbers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    /// Event id.
    pub id: EventId,
    /// Event name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Currency code.
    pub currency: String,
    /// Status.
    pub status: EventStatus,
    /// Creator.
    pub created_by: UserId,
    /// True when the caller created the event.
    pub is_creator: bool,
    /// Headline numbers.
    pub stats: EventStats,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl EventDetail {
    fn new(event: &events::Model, viewer: UserId, stats: EventStats) -> AppResult<Self> {
        Ok(Self {
            id: EventId::from_uuid(event.id),
            name: event.name.clone(),
            description: event.description.clone(),
            currency: event.currency.clone(),
            status: event_status(event)?,
            created_by: creator_of(event),
            is_creator: creator_of(event) == viewer,
            stats,
            created_at: event.created_at.with_timezone(&Utc),
            updated_at: event.updated_at.with_timezone(&Utc),
        })
    }
}

/// Stats for several events at once.
async fn stats_for<C: ConnectionTrait>(
    conn: &C,
    event_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, EventStats>> {
    let mut members: HashMap<Uuid, usize> = HashMap::new();
    for p in participants::Entity::find()
        .filter(participants::Column::EventId.is_in(event_ids.to_vec()))
        .filter(participants::Column::LeftAt.is_null())
        .all(conn)
        .await
        .map_err(db_error)?
    {
        *members.entry(p.event_id).or_default() += 1;
    }

    let mut totals: HashMap<Uuid, Vec<Decimal>> = HashMap::new();
    for e in expenses::Entity::find()
        .filter(expenses::Column::EventId.is_in(event_ids.to_vec()))
        .all(conn)
        .await
        .map_err(db_error)?
    {
        totals.entry(e.event_id).or_default().push(amount(e.total));
    }

    Ok(event_ids
        .iter()
        .map(|id| {
            let count = members.get(id).copied().unwrap_or(0);
            let expense_totals = totals.get(id).map(Vec::as_slice).unwrap_or_default();
            (*id, EventStats::compute(count, expense_totals))
        })
        .collect())
}

async fn detail_of<C: ConnectionTrait>(
    conn: &C,
    event: &events::Model,
    viewer: UserId,
) -> AppResult<EventDetail> {
    let stats = stats_for(conn, &[event.id])
        .await?
        .remove(&event.id)
        .unwrap_or_else(|| EventStats::compute(0, &[]));
    EventDetail::new(event, viewer, stats)
}

/// Event repository.
#[derive(Debug, Clone)]
pub struct EventRepository {
    db: DatabaseConnection,
}

impl EventRepository {
    /// Creates a new event repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an event with the creator as its first participant.
    ///
    /// The creator's participant name and bank details come from their profile.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for bad fields, `NotFound` for an unknown user.
    pub async fn create(&self, creator: UserId, input: CreateEventInput) -> AppResult<EventDetail> {
        let draft =
            EventService::validate_new(&input.name, input.description.as_deref(), &input.currency)?;

        let txn = self.db.begin().await.map_err(db_error)?;

        let user = users::Entity::find_by_id(creator.into_inner())
            .one(&txn)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::NotFound(format!("user {creator}")))?;

        let ts = now();
        let event = events::ActiveModel {
            id: Set(EventId::new().into_inner()),
            name: Set(draft.name),
            description: Set(draft.description),
            currency: Set(draft.currency.as_str().to_string()),
            status: Set(EventStatus::Active.as_str().to_string()),
            created_by: Set(user.id),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&txn)
        .await
        .map_err(db_error)?;

        let bank = user.bank_info();
        participants::ActiveModel {
            id: Set(Uuid::now_v7()),
            event_id: Set(event.id),
            user_id: Set(Some(user.id)),
            name: Set(user.name.clone()),
            bank_name: Set(bank.bank_name),
            account_number: Set(bank.account_number),
            account_holder: Set(bank.account_holder),
            joined_at: Set(ts),
            left_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(db_error)?;

        let detail = detail_of(&txn, &event, creator).await?;
        txn.commit().await.map_err(db_error)?;

        tracing::info!(event_id = %event.id, creator = %creator, "Event created");
        Ok(detail)
    }

    /// Events the user currently participates in, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<EventDetail>> {
        let event_ids: Vec<Uuid> = participants::Entity::find()
            .filter(participants::Column::UserId.eq(user_id.into_inner()))
            .filter(participants::Column::LeftAt.is_null())
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|p| p.event_id)
            .collect();
        if event_ids.is_empty() {
            return Ok(vec![]);
        }

        let events = events::Entity::find()
            .filter(events::Column::Id.is_in(event_ids.clone()))
            .order_by_desc(events::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        let mut stats = stats_for(&self.db, &event_ids).await?;

        events
            .iter()
            .map(|event| {
                let s = stats
                    .remove(&event.id)
                    .unwrap_or_else(|| EventStats::compute(0, &[]));
                EventDetail::new(event, user_id, s)
            })
            .collect()
    }

    /// One event, visible to its participants.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown event, `PermissionDenied` for non-members.
    pub async fn get(&self, event_id: EventId, requester: UserId) -> AppResult<EventDetail> {
        let (event, _) = load_for_member(&self.db, event_id, requester).await?;
        detail_of(&self.db, &event, requester).await
    }

    /// Renames, re-describes or closes an event. Creator only.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` unless the requester created the event
    /// - `InvalidInput` for bad fields or an attempt to reopen
    pub async fn update(
        &self,
        event_id: EventId,
        requester: UserId,
        input: UpdateEventInput,
    ) -> AppResult<EventDetail> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let event = lock_event(&txn, event_id).await?;
        EventService::ensure_creator(requester, creator_of(&event), "update the event")?;
        let current = event_status(&event)?;

        let mut active: events::ActiveModel = event.into();
        if let Some(name) = input.name.as_deref() {
            active.name = Set(EventService::validate_name(name)?);
        }
        if input.description.is_some() {
            active.description = Set(EventService::validate_description(
                input.description.as_deref(),
            )?);
        }
        if let Some(status) = input.status {
            let next = EventService::transition(current, status)?;
            active.status = Set(next.as_str().to_string());
            if next != current {
                tracing::info!(event_id = %event_id, status = %next, "Event status changed");
            }
        }
        active.updated_at = Set(now());

        let event = active.update(&txn).await.map_err(db_error)?;
        let detail = detail_of(&txn, &event, requester).await?;
        txn.commit().await.map_err(db_error)?;

        Ok(detail)
    }

    /// Deletes an event and everything it owns. Creator only.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` unless the requester created the event, `NotFound` for an unknown event.
    pub async fn delete(&self, event_id: EventId, requester: UserId) -> AppResult<()> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let event = lock_event(&txn, event_id).await?;
        EventService::ensure_creator(requester, creator_of(&event), "delete the event")?;

        let id = event_id.into_inner();
        let expense_ids: Vec<Uuid> = expenses::Entity::find()
            .filter(expenses::Column::EventId.eq(id))
            .all(&txn)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|e| e.id)
            .collect();

        // Children first so the order does not depend on cascade support.
        settlements::Entity::delete_many()
            .filter(settlements::Column::EventId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        payment_requests::Entity::delete_many()
            .filter(payment_requests::Column::EventId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        collectors::Entity::delete_many()
            .filter(collectors::Column::EventId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        expense_payers::Entity::delete_many()
            .filter(expense_payers::Column::ExpenseId.is_in(expense_ids.clone()))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        expense_beneficiaries::Entity::delete_many()
            .filter(expense_beneficiaries::Column::ExpenseId.is_in(expense_ids))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        expenses::Entity::delete_many()
            .filter(expenses::Column::EventId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        participants::Entity::delete_many()
            .filter(participants::Column::EventId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        events::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        tracing::info!(event_id = %event_id, "Event deleted");
        Ok(())
    }
}
