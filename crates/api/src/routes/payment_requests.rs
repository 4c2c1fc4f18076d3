//! Payment request routes.
//!
//! The payer opens a request; the receiver confirms it, which records the
//! settlement, or cancels it.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use tally_db::PaymentRequestRepository;
use tally_db::repositories::{CreatePaymentRequestInput, PaymentRequestView};
use tally_shared::types::{EventId, PaymentRequestId};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::{AppState, middleware::AuthUser};

/// Creates the payment request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{event_id}/payment-requests", get(list_requests))
        .route("/events/{event_id}/payment-requests", post(create_request))
        .route("/events/{event_id}/payment-requests/{request_id}/confirm", post(confirm_request))
        .route("/events/{event_id}/payment-requests/{request_id}/cancel", post(cancel_request))
}

/// GET `/events/{event_id}/payment-requests` - Requests the caller pays or receives.
async fn list_requests(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> ApiResult<Json<Value>> {
    let repo = PaymentRequestRepository::new((*state.db).clone());
    let requests = state.within_deadline(repo.list(event_id, auth.user_id())).await?;
    Ok(Json(json!({ "paymentRequests": requests })))
}

async fn create_request(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
    ApiJson(input): ApiJson<CreatePaymentRequestInput>,
) -> ApiResult<(StatusCode, Json<PaymentRequestView>)> {
    let repo = PaymentRequestRepository::new((*state.db).clone());
    let request = state
        .within_deadline(repo.create(event_id, auth.user_id(), input))
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn confirm_request(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((event_id, request_id)): ApiPath<(EventId, PaymentRequestId)>,
) -> ApiResult<Json<PaymentRequestView>> {
    let repo = PaymentRequestRepository::new((*state.db).clone());
    let request = state
        .within_deadline(repo.confirm(event_id, request_id, auth.user_id()))
        .await?;
    Ok(Json(request))
}

async fn cancel_request(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((event_id, request_id)): ApiPath<(EventId, PaymentRequestId)>,
) -> ApiResult<Json<PaymentRequestView>> {
    let repo = PaymentRequestRepository::new((*state.db).clone());
    let request = state
        .within_deadline(repo.cancel(event_id, request_id, auth.user_id()))
        .await?;
    Ok(Json(request))
}
