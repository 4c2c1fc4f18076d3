//! Event routes: lifecycle, summary and balances.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use serde_json::{Value, json};
use tally_db::EventRepository;
use tally_db::LedgerRepository;
use tally_db::repositories::{CreateEventInput, EventDetail, EventOverview, UpdateEventInput};
use tally_shared::types::EventId;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::{AppState, middleware::AuthUser};

/// Creates the event routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events))
        .route("/events", post(create_event))
        .route("/events/{event_id}", get(get_event))
        .route("/events/{event_id}", patch(update_event))
        .route("/events/{event_id}", delete(delete_event))
        .route("/events/{event_id}/summary", get(get_summary))
        .route("/events/{event_id}/balances", get(get_balances))
}

/// POST `/events` - Create an event; the caller becomes its first participant.
async fn create_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<CreateEventInput>,
) -> ApiResult<(StatusCode, Json<EventDetail>)> {
    let repo = EventRepository::new((*state.db).clone());
    let event = state.within_deadline(repo.create(auth.user_id(), input)).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET `/events` - Events the caller participates in.
async fn list_events(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Value>> {
    let repo = EventRepository::new((*state.db).clone());
    let events = state.within_deadline(repo.list_for_user(auth.user_id())).await?;
    Ok(Json(json!({ "events": events })))
}

/// GET `/events/{event_id}`
async fn get_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> ApiResult<Json<EventDetail>> {
    let repo = EventRepository::new((*state.db).clone());
    let event = state.within_deadline(repo.get(event_id, auth.user_id())).await?;
    Ok(Json(event))
}

/// PATCH `/events/{event_id}` - Rename, describe or close. Creator only.
async fn update_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
    ApiJson(input): ApiJson<UpdateEventInput>,
) -> ApiResult<Json<EventDetail>> {
    let repo = EventRepository::new((*state.db).clone());
    let event = state
        .within_deadline(repo.update(event_id, auth.user_id(), input))
        .await?;
    Ok(Json(event))
}

/// DELETE `/events/{event_id}` - Creator only.
async fn delete_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> ApiResult<StatusCode> {
    let repo = EventRepository::new((*state.db).clone());
    state.within_deadline(repo.delete(event_id, auth.user_id())).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/events/{event_id}/summary` - Balances, settlement plan and collector.
async fn get_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> ApiResult<Json<EventOverview>> {
    let repo = LedgerRepository::new((*state.db).clone());
    let overview = state.within_deadline(repo.summary(event_id, auth.user_id())).await?;
    Ok(Json(overview))
}

/// GET `/events/{event_id}/balances` - Raw per-participant totals.
async fn get_balances(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> ApiResult<Json<Value>> {
    let repo = LedgerRepository::new((*state.db).clone());
    let balances = state.within_deadline(repo.balances(event_id, auth.user_id())).await?;
    Ok(Json(json!({ "balances": balances })))
}
