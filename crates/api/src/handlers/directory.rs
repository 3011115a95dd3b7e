use axum::{
    Json,
    extract::{Path, State},
};
use gestipc_core::errors::GestError;
use gestipc_core::models::volunteer::{
    Certification, CreateCertificationRequest, CreateOrganizationRequest, CreateVolunteerRequest,
    Organization, Volunteer, VolunteerDetailResponse, normalize_fiscal_code,
};
use gestipc_db::repositories::{time_entry as time_entry_repo, volunteer as volunteer_repo};
use std::sync::Arc;
use tracing::info;

use crate::{ApiState, middleware::error_handling::AppError};

#[axum::debug_handler]
pub async fn create_organization(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateOrganizationRequest>,
) -> Result<Json<Organization>, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError(GestError::Validation(
            "organization name must not be empty".to_string(),
        )));
    }

    let organization = volunteer_repo::create_organization(&state.db_pool, name)
        .await
        .map_err(GestError::Database)?;

    Ok(Json(organization.to_model()))
}

#[axum::debug_handler]
pub async fn create_volunteer(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateVolunteerRequest>,
) -> Result<Json<Volunteer>, AppError> {
    let fiscal_code = normalize_fiscal_code(&payload.fiscal_code)?;

    if let Some(org_id) = payload.organization_id {
        volunteer_repo::get_organization_by_id(&state.db_pool, org_id)
            .await
            .map_err(GestError::Database)?
            .ok_or_else(|| GestError::NotFound(format!("organization {org_id} not found")))?;
    }

    let volunteer = volunteer_repo::create_volunteer(
        &state.db_pool,
        &fiscal_code,
        payload.first_name.trim(),
        payload.last_name.trim(),
        payload.organization_id,
    )
    .await
    .map_err(GestError::Database)?;

    info!("Volunteer created: {}", volunteer.fiscal_code);

    Ok(Json(volunteer.to_model()))
}

/// Identity record with certifications and the open session, if any.
#[axum::debug_handler]
pub async fn get_volunteer(
    State(state): State<Arc<ApiState>>,
    Path(fiscal_code): Path<String>,
) -> Result<Json<VolunteerDetailResponse>, AppError> {
    let fiscal_code = normalize_fiscal_code(&fiscal_code)?;

    let volunteer = volunteer_repo::get_volunteer_by_fiscal_code(&state.db_pool, &fiscal_code)
        .await
        .map_err(GestError::Database)?
        .ok_or_else(|| GestError::NotFound(format!("volunteer {fiscal_code} not found")))?;

    let certifications = volunteer_repo::get_certifications(&state.db_pool, &fiscal_code)
        .await
        .map_err(GestError::Database)?;

    let open_entry = time_entry_repo::open_entry(&state.db_pool, &fiscal_code)
        .await
        .map_err(GestError::Database)?
        .map(|e| e.to_model())
        .transpose()?;

    Ok(Json(VolunteerDetailResponse {
        volunteer: volunteer.to_model(),
        certifications: certifications.iter().map(|c| c.to_model()).collect(),
        open_entry,
    }))
}

#[axum::debug_handler]
pub async fn add_certification(
    State(state): State<Arc<ApiState>>,
    Path(fiscal_code): Path<String>,
    Json(payload): Json<CreateCertificationRequest>,
) -> Result<Json<Certification>, AppError> {
    let fiscal_code = normalize_fiscal_code(&fiscal_code)?;

    volunteer_repo::get_volunteer_by_fiscal_code(&state.db_pool, &fiscal_code)
        .await
        .map_err(GestError::Database)?
        .ok_or_else(|| GestError::NotFound(format!("volunteer {fiscal_code} not found")))?;

    let certification = volunteer_repo::add_certification(
        &state.db_pool,
        &fiscal_code,
        payload.name.trim(),
        payload.expires_at,
    )
    .await
    .map_err(GestError::Database)?;

    Ok(Json(certification.to_model()))
}
