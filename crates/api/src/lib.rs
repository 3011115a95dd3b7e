//! # Gestipc API
//!
//! Web surface of the volunteer-management system: the one-time-token
//! login bridge, the bot-approved web login flow, and the staff-facing
//! service endpoints.
//!
//! ## Architecture
//!
//! - **Routes**: endpoint definitions and URL structure
//! - **Handlers**: request processing logic
//! - **Middleware**: error mapping to HTTP responses
//! - **Config**: environment configuration
//!
//! The API uses Axum as the web framework and SQLx for persistence;
//! outbound Telegram traffic goes through `gestipc-telegram`.

/// Configuration module for API settings
pub mod config;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::Router;
use eyre::Result;
use gestipc_telegram::{BotApi, TelegramApi};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

/// Shared application state accessible to all request handlers.
pub struct ApiState {
    /// PostgreSQL connection pool
    pub db_pool: PgPool,
    /// Outbound Telegram client; absent when no bot token is configured,
    /// in which case channel side effects are skipped with a warning.
    pub telegram: Option<Arc<dyn TelegramApi>>,
    /// Group chat where availability polls live
    pub survey_chat_id: Option<i64>,
}

/// Start the API server with the provided configuration and database
/// connection.
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let telegram: Option<Arc<dyn TelegramApi>> = match &config.telegram_bot_token {
        Some(token) => Some(Arc::new(BotApi::new(token))),
        None => {
            warn!("TELEGRAM_BOT_TOKEN not configured; channel side effects disabled");
            None
        }
    };

    let state = Arc::new(ApiState {
        db_pool,
        telegram,
        survey_chat_id: config.survey_chat_id,
    });

    let app = Router::new()
        .merge(routes::health::routes())
        .merge(routes::auth::routes())
        .merge(routes::directory::routes())
        .merge(routes::service::routes())
        .merge(routes::task::routes())
        .with_state(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let origins = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect::<Vec<_>>();
        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::ACCEPT,
            ])
            .allow_origin(origins)
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    let app = app.layer(tower_http::timeout::TimeoutLayer::new(
        std::time::Duration::from_secs(config.request_timeout),
    ));

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
