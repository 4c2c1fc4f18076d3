//! Tally API server.
//!
//! Loads configuration, connects the ledger store and serves the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tally_api::{AppState, create_router};
use tally_core::payment::QuickLinkRenderer;
use tally_db::connect_with;
use tally_shared::{AppConfig, JwtConfig, JwtService};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tally=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = connect_with(&config.database)
        .await
        .context("failed to connect to database")?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)
            .context("jwt.access_token_expiry_secs is out of range")?,
    });

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        link_renderer: Arc::new(QuickLinkRenderer::new(config.payment_link.base_url.clone())),
        ledger_timeout: Duration::from_millis(config.ledger.operation_timeout_ms),
        request_timeout: Duration::from_secs(config.server.request_timeout_secs),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
