use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use gestipc_core::errors::GestError;
use gestipc_core::models::service::{
    CreateServiceRequest, CreateServiceResponse, GetServiceResponse,
};
use gestipc_db::repositories::service as service_repo;
use gestipc_telegram::availability;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

/// Create a service. The availability poll is published asynchronously,
/// strictly after the insert has completed, so no reader can ever see a
/// poll reference that does not exist in the channel.
#[axum::debug_handler]
pub async fn create_service(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<Json<CreateServiceResponse>, AppError> {
    let name = payload.name.trim();
    if name.len() < 3 || name.len() > 150 {
        return Err(AppError(GestError::Validation(
            "service name must be between 3 and 150 characters".to_string(),
        )));
    }

    if let Some(type_id) = payload.service_type_id {
        service_repo::get_service_type_by_id(&state.db_pool, type_id)
            .await
            .map_err(GestError::Database)?
            .ok_or_else(|| GestError::NotFound(format!("service type {type_id} not found")))?;
    }

    let service = service_repo::create_service(
        &state.db_pool,
        name,
        payload.starts_at,
        payload.service_type_id,
        payload.send_message,
    )
    .await
    .map_err(GestError::Database)?;

    info!("Service created via API: {} ({})", service.name, service.id);

    if let Some(telegram) = state.telegram.clone() {
        let pool = state.db_pool.clone();
        let survey_chat_id = state.survey_chat_id;
        let service_id = service.id;
        tokio::spawn(async move {
            if let Err(e) = availability::send_availability_poll(
                telegram.as_ref(),
                &pool,
                survey_chat_id,
                service_id,
            )
            .await
            {
                error!("Failed to send availability poll for {}: {:?}", service_id, e);
            }
        });
    }

    Ok(Json(CreateServiceResponse {
        id: service.id,
        name: service.name,
        starts_at: service.starts_at,
    }))
}

/// Fetch a service with every recorded availability answer.
#[axum::debug_handler]
pub async fn get_service(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<GetServiceResponse>, AppError> {
    let service = service_repo::get_service_by_id(&state.db_pool, id)
        .await
        .map_err(GestError::Database)?
        .ok_or_else(|| GestError::NotFound(format!("service {id} not found")))?;

    let answers = service_repo::list_answers(&state.db_pool, id)
        .await
        .map_err(GestError::Database)?;

    Ok(Json(GetServiceResponse {
        service: service.to_model(),
        answers: answers.iter().map(|a| a.to_model()).collect(),
    }))
}

/// Delete a service. Retracting the poll message is best-effort: a
/// channel failure is logged and never blocks the deletion.
#[axum::debug_handler]
pub async fn delete_service(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = service_repo::delete_service(&state.db_pool, id)
        .await
        .map_err(GestError::Database)?
        .ok_or_else(|| GestError::NotFound(format!("service {id} not found")))?;

    info!("Service deleted: {} ({})", service.name, service.id);

    if let (Some(telegram), Some(message_id)) = (state.telegram.clone(), service.poll_message_id) {
        let survey_chat_id = state.survey_chat_id;
        tokio::spawn(async move {
            availability::retract_availability_poll(telegram.as_ref(), survey_chat_id, message_id)
                .await;
        });
    }

    Ok(StatusCode::NO_CONTENT)
}
