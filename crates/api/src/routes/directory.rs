use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/organizations",
            post(handlers::directory::create_organization),
        )
        .route("/volunteers", post(handlers::directory::create_volunteer))
        .route(
            "/volunteers/:fiscal_code",
            get(handlers::directory::get_volunteer),
        )
        .route(
            "/volunteers/:fiscal_code/certifications",
            post(handlers::directory::add_certification),
        )
}
