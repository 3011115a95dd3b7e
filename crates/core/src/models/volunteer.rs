use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{GestError, GestResult};

pub const FISCAL_CODE_LEN: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volunteer {
    /// Italian codice fiscale, the natural key. Immutable once created.
    pub fiscal_code: String,
    pub first_name: String,
    pub last_name: String,
    pub organization_id: Option<Uuid>,
    pub is_staff: bool,
}

impl Volunteer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certification {
    pub id: Uuid,
    pub volunteer_fiscal_code: String,
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

// Wire types for the directory endpoints.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVolunteerRequest {
    pub fiscal_code: String,
    pub first_name: String,
    pub last_name: String,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCertificationRequest {
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolunteerDetailResponse {
    pub volunteer: Volunteer,
    pub certifications: Vec<Certification>,
    pub open_entry: Option<crate::models::time_entry::TimeEntry>,
}

/// Normalize and validate a fiscal code: 16 alphanumeric characters,
/// stored uppercase.
pub fn normalize_fiscal_code(raw: &str) -> GestResult<String> {
    let code = raw.trim().to_uppercase();

    if code.len() != FISCAL_CODE_LEN {
        return Err(GestError::Validation(format!(
            "fiscal code must be {FISCAL_CODE_LEN} characters, got {}",
            code.len()
        )));
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(GestError::Validation(
            "fiscal code must be alphanumeric".to_string(),
        ));
    }

    Ok(code)
}
