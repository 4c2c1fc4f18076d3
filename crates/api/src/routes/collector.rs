//! Collector and payment link routes.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use tally_core::payment::PaymentLink;
use tally_db::CollectorRepository;
use tally_db::repositories::{CollectorView, PaymentLinkInput, SetCollectorInput};
use tally_shared::types::EventId;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::{AppState, middleware::AuthUser};

/// Creates the collector routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{event_id}/collector", get(get_collector))
        .route("/events/{event_id}/collector", put(set_collector))
        .route("/events/{event_id}/payment-link", post(payment_link))
}

async fn get_collector(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> ApiResult<Json<CollectorView>> {
    let repo = CollectorRepository::new((*state.db).clone());
    let collector = state.within_deadline(repo.get(event_id, auth.user_id())).await?;
    Ok(Json(collector))
}

/// PUT `/events/{event_id}/collector` - Replace the active collector. Creator only.
async fn set_collector(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
    ApiJson(input): ApiJson<SetCollectorInput>,
) -> ApiResult<Json<CollectorView>> {
    let repo = CollectorRepository::new((*state.db).clone());
    let collector = state
        .within_deadline(repo.set(event_id, auth.user_id(), input))
        .await?;
    Ok(Json(collector))
}

/// POST `/events/{event_id}/payment-link` - Transfer link to the receiver, or to the collector.
async fn payment_link(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
    ApiJson(input): ApiJson<PaymentLinkInput>,
) -> ApiResult<Json<PaymentLink>> {
    let repo = CollectorRepository::new((*state.db).clone());
    let link = state
        .within_deadline(repo.payment_link(
            event_id,
            auth.user_id(),
            input,
            state.link_renderer.as_ref(),
        ))
        .await?;
    Ok(Json(link))
}
