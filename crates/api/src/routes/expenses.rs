//! Expense routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use tally_db::ExpenseRepository;
use tally_db::repositories::{ExpenseDetail, ExpenseInput};
use tally_shared::types::{EventId, ExpenseId};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::{AppState, middleware::AuthUser};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{event_id}/expenses", get(list_expenses))
        .route("/events/{event_id}/expenses", post(create_expense))
        .route("/events/{event_id}/expenses/{expense_id}", get(get_expense))
        .route("/events/{event_id}/expenses/{expense_id}", put(update_expense))
        .route("/events/{event_id}/expenses/{expense_id}", delete(delete_expense))
}

/// GET `/events/{event_id}/expenses` - Transaction list, newest first.
async fn list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
) -> ApiResult<Json<Value>> {
    let repo = ExpenseRepository::new((*state.db).clone());
    let items = state.within_deadline(repo.list(event_id, auth.user_id())).await?;
    Ok(Json(json!({ "transactions": items })))
}

/// POST `/events/{event_id}/expenses`
async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<EventId>,
    ApiJson(input): ApiJson<ExpenseInput>,
) -> ApiResult<(StatusCode, Json<ExpenseDetail>)> {
    let repo = ExpenseRepository::new((*state.db).clone());
    let expense = state
        .within_deadline(repo.create(event_id, auth.user_id(), input))
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// GET `/events/{event_id}/expenses/{expense_id}`
async fn get_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((event_id, expense_id)): ApiPath<(EventId, ExpenseId)>,
) -> ApiResult<Json<ExpenseDetail>> {
    let repo = ExpenseRepository::new((*state.db).clone());
    let expense = state
        .within_deadline(repo.get(event_id, expense_id, auth.user_id()))
        .await?;
    Ok(Json(expense))
}

/// PUT `/events/{event_id}/expenses/{expense_id}` - Replaces the whole breakdown.
async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((event_id, expense_id)): ApiPath<(EventId, ExpenseId)>,
    ApiJson(input): ApiJson<ExpenseInput>,
) -> ApiResult<Json<ExpenseDetail>> {
    let repo = ExpenseRepository::new((*state.db).clone());
    let expense = state
        .within_deadline(repo.update(event_id, expense_id, auth.user_id(), input))
        .await?;
    Ok(Json(expense))
}

/// DELETE `/events/{event_id}/expenses/{expense_id}`
async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((event_id, expense_id)): ApiPath<(EventId, ExpenseId)>,
) -> ApiResult<StatusCode> {
    let repo = ExpenseRepository::new((*state.db).clone());
    state
        .within_deadline(repo.delete(event_id, expense_id, auth.user_id()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
