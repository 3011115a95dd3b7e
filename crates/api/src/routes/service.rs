use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/services", post(handlers::service::create_service))
        .route(
            "/services/:id",
            get(handlers::service::get_service).delete(handlers::service::delete_service),
        )
}
