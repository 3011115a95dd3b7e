use chrono::{DateTime, Utc};
use gestipc_core::errors::GestResult;
use gestipc_core::models::service::{
    Answer, AvailabilityEntry, ChecklistTemplateItem, Service, ServiceType,
};
use gestipc_core::models::task::{ChecklistItem, ScheduledTask};
use gestipc_core::models::telegram::{LoginToken, WebLoginRequest, WebLoginStatus};
use gestipc_core::models::time_entry::{LinkTarget, TimeEntry};
use gestipc_core::models::volunteer::{Certification, Organization, Volunteer};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbOrganization {
    pub id: Uuid,
    pub name: String,
}

impl DbOrganization {
    pub fn to_model(&self) -> Organization {
        Organization {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbVolunteer {
    pub fiscal_code: String,
    pub first_name: String,
    pub last_name: String,
    pub organization_id: Option<Uuid>,
    pub is_staff: bool,
}

impl DbVolunteer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn to_model(&self) -> Volunteer {
        Volunteer {
            fiscal_code: self.fiscal_code.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            organization_id: self.organization_id,
            is_staff: self.is_staff,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCertification {
    pub id: Uuid,
    pub volunteer_fiscal_code: String,
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl DbCertification {
    pub fn to_model(&self) -> Certification {
        Certification {
            id: self.id,
            volunteer_fiscal_code: self.volunteer_fiscal_code.clone(),
            name: self.name.clone(),
            expires_at: self.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbServiceType {
    pub id: Uuid,
    pub name: String,
}

impl DbServiceType {
    pub fn to_model(&self) -> ServiceType {
        ServiceType {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbChecklistTemplateItem {
    pub id: Uuid,
    pub service_type_id: Uuid,
    pub description: String,
    pub position: i32,
}

impl DbChecklistTemplateItem {
    pub fn to_model(&self) -> ChecklistTemplateItem {
        ChecklistTemplateItem {
            id: self.id,
            service_type_id: self.service_type_id,
            description: self.description.clone(),
            position: self.position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbService {
    pub id: Uuid,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub service_type_id: Option<Uuid>,
    pub poll_id: Option<String>,
    pub poll_message_id: Option<i64>,
    pub send_message: bool,
    pub poll_closed: bool,
    pub notification_sent: bool,
}

impl DbService {
    pub fn to_model(&self) -> Service {
        Service {
            id: self.id,
            name: self.name.clone(),
            starts_at: self.starts_at,
            service_type_id: self.service_type_id,
            poll_id: self.poll_id.clone(),
            poll_message_id: self.poll_message_id,
            send_message: self.send_message,
            poll_closed: self.poll_closed,
            notification_sent: self.notification_sent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailabilityEntry {
    pub id: Uuid,
    pub volunteer_fiscal_code: String,
    pub service_id: Uuid,
    pub answer: Option<String>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl DbAvailabilityEntry {
    pub fn answer(&self) -> Option<Answer> {
        self.answer.as_deref().and_then(Answer::from_code)
    }

    pub fn to_model(&self) -> AvailabilityEntry {
        AvailabilityEntry {
            id: self.id,
            volunteer_fiscal_code: self.volunteer_fiscal_code.clone(),
            service_id: self.service_id,
            answer: self.answer(),
            answered_at: self.answered_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbScheduledTask {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type_id: Option<Uuid>,
    pub deadline: DateTime<Utc>,
    pub notification_sent: bool,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DbScheduledTask {
    pub fn to_model(&self) -> ScheduledTask {
        ScheduledTask {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            service_type_id: self.service_type_id,
            deadline: self.deadline,
            notification_sent: self.notification_sent,
            completed: self.completed,
            completed_at: self.completed_at,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbChecklistItem {
    pub id: Uuid,
    pub task_id: Uuid,
    pub description: String,
    pub position: i32,
    pub done: bool,
    pub done_by: Option<String>,
    pub done_at: Option<DateTime<Utc>>,
}

impl DbChecklistItem {
    pub fn to_model(&self) -> ChecklistItem {
        ChecklistItem {
            id: self.id,
            task_id: self.task_id,
            description: self.description.clone(),
            position: self.position,
            done: self.done,
            done_by: self.done_by.clone(),
            done_at: self.done_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTimeEntry {
    pub id: Uuid,
    pub volunteer_fiscal_code: String,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    pub notes: String,
    pub service_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl DbTimeEntry {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    pub fn link(&self) -> GestResult<LinkTarget> {
        LinkTarget::from_columns(self.service_id, self.task_id)
    }

    pub fn duration_minutes(&self) -> Option<f64> {
        let clock_out = self.clock_out?;
        Some(clock_out.signed_duration_since(self.clock_in).num_seconds() as f64 / 60.0)
    }

    /// Fails only when the row violates the single-link constraint.
    pub fn to_model(&self) -> GestResult<TimeEntry> {
        Ok(TimeEntry {
            id: self.id,
            volunteer_fiscal_code: self.volunteer_fiscal_code.clone(),
            clock_in: self.clock_in,
            clock_out: self.clock_out,
            notes: self.notes.clone(),
            link: self.link()?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTelegramAccount {
    pub telegram_id: i64,
    pub chat_id: i64,
    pub volunteer_fiscal_code: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbTelegramAccount {
    pub fn is_linked(&self) -> bool {
        self.volunteer_fiscal_code.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbLoginToken {
    pub token: String,
    pub telegram_id: i64,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl DbLoginToken {
    pub fn to_model(&self) -> LoginToken {
        LoginToken {
            token: self.token.clone(),
            telegram_id: self.telegram_id,
            created_at: self.created_at,
            used_at: self.used_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbWebLoginRequest {
    pub token: String,
    pub volunteer_fiscal_code: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl DbWebLoginRequest {
    pub fn status(&self) -> Option<WebLoginStatus> {
        WebLoginStatus::from_code(&self.status)
    }

    /// Domain view of the row; `None` when the stored status code is
    /// unknown.
    pub fn to_model(&self) -> Option<WebLoginRequest> {
        Some(WebLoginRequest {
            token: self.token.clone(),
            volunteer_fiscal_code: self.volunteer_fiscal_code.clone(),
            status: self.status()?,
            created_at: self.created_at,
            resolved_at: self.resolved_at,
        })
    }
}
