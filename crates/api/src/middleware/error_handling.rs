//! Maps domain errors to HTTP responses with consistent JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gestipc_core::errors::GestError;
use serde_json::json;

/// Application error wrapper that provides HTTP status code mapping.
///
/// Wraps [`GestError`] and implements `IntoResponse`, so handlers can
/// return `Result<Json<T>, AppError>` and use `?` throughout.
#[derive(Debug)]
pub struct AppError(pub GestError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GestError::NotFound(_) => StatusCode::NOT_FOUND,
            GestError::Validation(_) => StatusCode::BAD_REQUEST,
            GestError::AlreadyClockedIn(_) | GestError::NoOpenEntry => StatusCode::CONFLICT,
            GestError::NotAssigned => StatusCode::FORBIDDEN,
            GestError::Channel(_) => StatusCode::BAD_GATEWAY,
            GestError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            GestError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.0.to_string();
        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}

impl From<GestError> for AppError {
    fn from(err: GestError) -> Self {
        AppError(err)
    }
}

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(GestError::Database(err))
    }
}
