//! Participant routes: join, leave, guests and removal.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use serde_json::{Value, json};
use tally_db::ParticipantRepository;
use tally_db::repositories::{
    AddGuestInput, JoinEventInput, ParticipantView, UpdateParticipantInput,
};
use tally_shared::types::{EventId, ParticipantId};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::{AppState, middleware::AuthUser};

/// Creates the participant routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{event_id}/participants", get(list_participants))
        .route("/events/{event_id}/participants", post(add_guest))
        .route("/events/{event_id}/participants/{participant_id}", patch(update_participant))
        .route("/events/{event_id}/participants/{participant_id}", delete(kick_participant))
        .route("/events/{event_id}/join", post(join_event))
        .route("/events/{event_id}/leave", post(leave_event))
}

/// GET `/events/{event_id}/participants` - Active participants in join order.
async fn list_participants(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> ApiResult<Json<Value>> {
    let repo = ParticipantRepository::new((*state.db).clone());
    let participants = state.within_deadline(repo.list(event_id, auth.user_id())).await?;
    Ok(Json(json!({ "participants": participants })))
}

/// POST `/events/{event_id}/join` - Body fields default to the caller's profile; send `{}` to use it as is.
async fn join_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
    ApiJson(input): ApiJson<JoinEventInput>,
) -> ApiResult<(StatusCode, Json<ParticipantView>)> {
    let repo = ParticipantRepository::new((*state.db).clone());
    let participant = state
        .within_deadline(repo.join(event_id, auth.user_id(), input))
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

/// POST `/events/{event_id}/leave`
async fn leave_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> ApiResult<StatusCode> {
    let repo = ParticipantRepository::new((*state.db).clone());
    state.within_deadline(repo.leave(event_id, auth.user_id())).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/events/{event_id}/participants` - Add a guest without a login.
async fn add_guest(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
    ApiJson(input): ApiJson<AddGuestInput>,
) -> ApiResult<(StatusCode, Json<ParticipantView>)> {
    let repo = ParticipantRepository::new((*state.db).clone());
    let participant = state
        .within_deadline(repo.add_guest(event_id, auth.user_id(), input))
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

/// PATCH `/events/{event_id}/participants/{participant_id}`
async fn update_participant(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((event_id, participant_id)): ApiPath<(EventId, ParticipantId)>,
    ApiJson(input): ApiJson<UpdateParticipantInput>,
) -> ApiResult<Json<ParticipantView>> {
    let repo = ParticipantRepository::new((*state.db).clone());
    let participant = state
        .within_deadline(repo.update(event_id, auth.user_id(), participant_id, input))
        .await?;
    Ok(Json(participant))
}

/// DELETE `/events/{event_id}/participants/{participant_id}` - Creator only.
async fn kick_participant(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((event_id, participant_id)): ApiPath<(EventId, ParticipantId)>,
) -> ApiResult<StatusCode> {
    let repo = ParticipantRepository::new((*state.db).clone());
    state
        .within_deadline(repo.kick(event_id, auth.user_id(), participant_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
