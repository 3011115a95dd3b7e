use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/service-types",
            get(handlers::task::list_service_types).post(handlers::task::create_service_type),
        )
        .route("/tasks", post(handlers::task::create_task))
        .route("/tasks/:id", get(handlers::task::get_task))
}
