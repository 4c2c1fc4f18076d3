//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Bearer token middleware and the `AuthUser` extractor
//! - The single mapping from `AppError` to HTTP responses

pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::header::AUTHORIZATION;
use sea_orm::DatabaseConnection;
use tally_core::payment::PaymentLinkRenderer;
use tally_db::with_deadline;
use tally_shared::{AppResult, JwtService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Renders payment links.
    pub link_renderer: Arc<dyn PaymentLinkRenderer>,
    /// Bound for a single ledger operation.
    pub ledger_timeout: Duration,
    /// Bound for a whole HTTP request.
    pub request_timeout: Duration,
}

impl AppState {
    /// Runs a ledger operation under the configured deadline.
    pub async fn within_deadline<T, F>(&self, op: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        with_deadline(self.ledger_timeout, op).await
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new(std::iter::once(AUTHORIZATION)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
