//! Settlement routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use tally_db::SettlementRepository;
use tally_db::repositories::{CreateSettlementInput, SettlementView};
use tally_shared::types::EventId;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::{AppState, middleware::AuthUser};

/// Creates the settlement routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{event_id}/settlements", get(list_settlements))
        .route("/events/{event_id}/settlements", post(create_settlement))
}

async fn list_settlements(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> ApiResult<Json<Value>> {
    let repo = SettlementRepository::new((*state.db).clone());
    let settlements = state.within_deadline(repo.list(event_id, auth.user_id())).await?;
    Ok(Json(json!({ "settlements": settlements })))
}

/// POST `/events/{event_id}/settlements` - Record a direct payment between participants.
async fn create_settlement(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
    ApiJson(input): ApiJson<CreateSettlementInput>,
) -> ApiResult<(StatusCode, Json<SettlementView>)> {
    let repo = SettlementRepository::new((*state.db).clone());
    let settlement = state
        .within_deadline(repo.create(event_id, auth.user_id(), input))
        .await?;
    Ok((StatusCode::CREATED, Json(settlement)))
}
