//! Lookups that scope every ledger operation to one event.
//!
//! Generic over [`ConnectionTrait`] so the same checks run on the pool or
//! inside an open transaction.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    SqlErr, prelude::DateTimeWithTimeZone,
};
use tally_core::event::EventStatus;
use tally_shared::types::{EventId, ParticipantId, UserId};
use tally_shared::{AppError, AppResult};

use crate::entities::{events, participants};

/// Logs a storage failure and hides its details from callers.
pub(crate) fn db_error(err: DbErr) -> AppError {
    tracing::error!(error = %err, "Database operation failed");
    AppError::Internal("database operation failed".to_string())
}

/// Like [`db_error`], but unique violations become `AlreadyExists`.
pub(crate) fn insert_error(err: DbErr, what: &str) -> AppError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        tracing::warn!(error = %err, "Duplicate {what}");
        return AppError::AlreadyExists(format!("{what} already exists"));
    }
    db_error(err)
}

pub(crate) fn now() -> DateTimeWithTimeZone {
    chrono::Utc::now().into()
}

pub(crate) async fn find_event<C: ConnectionTrait>(
    conn: &C,
    event_id: EventId,
) -> AppResult<events::Model> {
    events::Entity::find_by_id(event_id.into_inner())
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))
}

/// Loads the event with `FOR UPDATE`.
///
/// Every transaction that writes to an event takes this lock before reading
/// anything else, so writes to one event apply one at a time and a balance
/// check cannot race an expense or settlement insert. `SQLite` has no row
/// locks and serializes writers on its own.
pub(crate) async fn lock_event<C: ConnectionTrait>(
    conn: &C,
    event_id: EventId,
) -> AppResult<events::Model> {
    events::Entity::find_by_id(event_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))
}

/// Loads the event with `FOR SHARE`, holding off writers until the
/// surrounding read transaction ends.
pub(crate) async fn share_event<C: ConnectionTrait>(
    conn: &C,
    event_id: EventId,
) -> AppResult<events::Model> {
    events::Entity::find_by_id(event_id.into_inner())
        .lock_shared()
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))
}

pub(crate) fn event_status(event: &events::Model) -> AppResult<EventStatus> {
    Ok(event.status.parse::<EventStatus>()?)
}

pub(crate) fn creator_of(event: &events::Model) -> UserId {
    UserId::from_uuid(event.created_by)
}

/// The caller's active participant row, if any.
pub(crate) async fn find_member<C: ConnectionTrait>(
    conn: &C,
    event_id: EventId,
    user_id: UserId,
) -> AppResult<Option<participants::Model>> {
    participants::Entity::find()
        .filter(participants::Column::EventId.eq(event_id.into_inner()))
        .filter(participants::Column::UserId.eq(user_id.into_inner()))
        .filter(participants::Column::LeftAt.is_null())
        .one(conn)
        .await
        .map_err(db_error)
}

/// The caller's active participant row; `PermissionDenied` otherwise.
pub(crate) async fn require_member<C: ConnectionTrait>(
    conn: &C,
    event_id: EventId,
    user_id: UserId,
) -> AppResult<participants::Model> {
    find_member(conn, event_id, user_id).await?.ok_or_else(|| {
        AppError::PermissionDenied("you are not a participant of this event".to_string())
    })
}

/// Event must exist and the caller must be in it.
pub(crate) async fn load_for_member<C: ConnectionTrait>(
    conn: &C,
    event_id: EventId,
    user_id: UserId,
) -> AppResult<(events::Model, participants::Model)> {
    let event = find_event(conn, event_id).await?;
    let member = require_member(conn, event_id, user_id).await?;
    Ok((event, member))
}

/// [`load_for_member`] with the event row locked for writing.
pub(crate) async fn lock_for_member<C: ConnectionTrait>(
    conn: &C,
    event_id: EventId,
    user_id: UserId,
) -> AppResult<(events::Model, participants::Model)> {
    let event = lock_event(conn, event_id).await?;
    let member = require_member(conn, event_id, user_id).await?;
    Ok((event, member))
}

/// An active participant of the event; `NotFound` otherwise.
pub(crate) async fn find_active_participant<C: ConnectionTrait>(
    conn: &C,
    event_id: EventId,
    participant_id: ParticipantId,
) -> AppResult<participants::Model> {
    participants::Entity::find_by_id(participant_id.into_inner())
        .filter(participants::Column::EventId.eq(event_id.into_inner()))
        .filter(participants::Column::LeftAt.is_null())
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::NotFound(format!("participant {participant_id}")))
}

/// Every participant row of the event, active or not, in join order.
pub(crate) async fn all_participants<C: ConnectionTrait>(
    conn: &C,
    event_id: EventId,
) -> AppResult<Vec<participants::Model>> {
    participants::Entity::find()
        .filter(participants::Column::EventId.eq(event_id.into_inner()))
        .order_by_asc(participants::Column::JoinedAt)
        .order_by_asc(participants::Column::Id)
        .all(conn)
        .await
        .map_err(db_error)
}
