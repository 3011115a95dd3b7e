use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceType {
    pub id: Uuid,
    pub name: String,
}

/// Template row owned by a service type, copied into every scheduled
/// task of that type at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistTemplateItem {
    pub id: Uuid,
    pub service_type_id: Uuid,
    pub description: String,
    pub position: i32,
}

/// One scheduled event volunteers are invited to.
///
/// Poll lifecycle: created with `poll_id` unset, a poll is published to
/// the survey chat exactly once (`poll_id` acts as the sent latch), the
/// poll is stopped near the start time (`poll_closed`), and a reminder
/// batch goes out shortly before the event (`notification_sent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    #[serde(rename = "si")]
    Yes,
    No,
    #[serde(rename = "forse")]
    Maybe,
}

impl Answer {
    /// Poll options are presented in a fixed order: Sì / No / Forse.
    pub fn from_option_index(index: usize) -> Option<Answer> {
        match index {
            0 => Some(Answer::Yes),
            1 => Some(Answer::No),
            2 => Some(Answer::Maybe),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Answer::Yes => "si",
            Answer::No => "no",
            Answer::Maybe => "forse",
        }
    }

    pub fn from_code(code: &str) -> Option<Answer> {
        match code {
            "si" => Some(Answer::Yes),
            "no" => Some(Answer::No),
            "forse" => Some(Answer::Maybe),
            _ => None,
        }
    }

    /// User-facing label, as shown in poll options and reminders.
    pub fn display(&self) -> &'static str {
        match self {
            Answer::Yes => "Sì",
            Answer::No => "No",
            Answer::Maybe => "Forse",
        }
    }
}

/// One row per (volunteer, service) pair. Re-answering overwrites the
/// row; a retracted vote clears both `answer` and `answered_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityEntry {
    pub id: Uuid,
    pub volunteer_fiscal_code: String,
    pub service_id: Uuid,
    pub answer: Option<Answer>,
    pub answered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub service_type_id: Option<Uuid>,
    #[serde(default = "default_send_message")]
    pub send_message: bool,
}

fn default_send_message() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceResponse {
    pub id: Uuid,
    pub name: String,
    pub starts_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetServiceResponse {
    pub service: Service,
    pub answers: Vec<AvailabilityEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceTypeRequest {
    pub name: String,
    /// Checklist template descriptions, in order.
    #[serde(default)]
    pub checklist: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTypeDetailResponse {
    pub service_type: ServiceType,
    pub template: Vec<ChecklistTemplateItem>,
}
