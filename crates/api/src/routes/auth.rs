use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/auth/login/:token", get(handlers::auth::token_login))
        .route("/auth/web-login", post(handlers::auth::request_web_login))
        .route(
            "/auth/web-login/:token",
            get(handlers::auth::web_login_status),
        )
}
