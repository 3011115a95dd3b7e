use axum::{
    Json,
    extract::{Path, State},
};
use gestipc_core::errors::GestError;
use gestipc_core::models::service::{
    CreateServiceTypeRequest, ServiceType, ServiceTypeDetailResponse,
};
use gestipc_core::models::task::{CreateTaskRequest, TaskDetailResponse};
use gestipc_core::models::volunteer::normalize_fiscal_code;
use gestipc_db::repositories::{service as service_repo, task as task_repo};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

/// Create (or fetch) a service type and replace nothing: template rows
/// are appended in the order given.
#[axum::debug_handler]
pub async fn create_service_type(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateServiceTypeRequest>,
) -> Result<Json<ServiceTypeDetailResponse>, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError(GestError::Validation(
            "service type name must not be empty".to_string(),
        )));
    }

    let service_type = service_repo::get_or_create_service_type(&state.db_pool, name)
        .await
        .map_err(GestError::Database)?;

    for (position, description) in payload.checklist.iter().enumerate() {
        service_repo::add_template_item(
            &state.db_pool,
            service_type.id,
            description.trim(),
            position as i32,
        )
        .await
        .map_err(GestError::Database)?;
    }

    let template = service_repo::list_template_items(&state.db_pool, service_type.id)
        .await
        .map_err(GestError::Database)?;

    Ok(Json(ServiceTypeDetailResponse {
        service_type: service_type.to_model(),
        template: template.iter().map(|t| t.to_model()).collect(),
    }))
}

#[axum::debug_handler]
pub async fn list_service_types(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<ServiceType>>, AppError> {
    let types = service_repo::list_service_types(&state.db_pool)
        .await
        .map_err(GestError::Database)?;

    Ok(Json(types.iter().map(|t| t.to_model()).collect()))
}

/// Create a scheduled task; its checklist is seeded from the service
/// type's template.
#[axum::debug_handler]
pub async fn create_task(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<Json<TaskDetailResponse>, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError(GestError::Validation(
            "task name must not be empty".to_string(),
        )));
    }

    if let Some(type_id) = payload.service_type_id {
        service_repo::get_service_type_by_id(&state.db_pool, type_id)
            .await
            .map_err(GestError::Database)?
            .ok_or_else(|| GestError::NotFound(format!("service type {type_id} not found")))?;
    }

    let mut assignees = Vec::with_capacity(payload.assignees.len());
    for raw in &payload.assignees {
        assignees.push(normalize_fiscal_code(raw)?);
    }

    let task = task_repo::create_task(
        &state.db_pool,
        name,
        payload.description.trim(),
        payload.service_type_id,
        payload.deadline,
        &assignees,
    )
    .await
    .map_err(GestError::Database)?;

    info!("Scheduled task created: {} ({})", task.name, task.id);

    let checklist = task_repo::list_checklist_items(&state.db_pool, task.id)
        .await
        .map_err(GestError::Database)?;

    Ok(Json(TaskDetailResponse {
        task: task.to_model(),
        checklist: checklist.iter().map(|i| i.to_model()).collect(),
    }))
}

#[axum::debug_handler]
pub async fn get_task(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskDetailResponse>, AppError> {
    let task = task_repo::get_task_by_id(&state.db_pool, id)
        .await
        .map_err(GestError::Database)?
        .ok_or_else(|| GestError::NotFound(format!("task {id} not found")))?;

    let checklist = task_repo::list_checklist_items(&state.db_pool, task.id)
        .await
        .map_err(GestError::Database)?;

    Ok(Json(TaskDetailResponse {
        task: task.to_model(),
        checklist: checklist.iter().map(|i| i.to_model()).collect(),
    }))
}
