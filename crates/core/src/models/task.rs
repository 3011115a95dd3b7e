use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A deadline-bound assignment with a completion checklist, independent
/// of a dated service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub task_id: Uuid,
    pub description: String,
    pub position: i32,
    pub done: bool,
    pub done_by: Option<String>,
    pub done_at: Option<DateTime<Utc>>,
}

impl ChecklistItem {
    pub fn is_pending(&self) -> bool {
        !self.done
    }
}

// Wire types for the task endpoints.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub service_type_id: Option<Uuid>,
    pub deadline: DateTime<Utc>,
    /// Fiscal codes of the assigned volunteers.
    #[serde(default)]
    pub assignees: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetailResponse {
    pub task: ScheduledTask,
    pub checklist: Vec<ChecklistItem>,
}
