use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{GestError, GestResult};

/// Exclusive link of a time entry to the activity it was worked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LinkTarget {
    #[default]
    None,
    Service(Uuid),
    Task(Uuid),
}

impl LinkTarget {
    /// Decode from the two nullable storage columns. A row with both set
    /// violates the `time_entry_single_link` constraint and is rejected
    /// here as well.
    pub fn from_columns(service_id: Option<Uuid>, task_id: Option<Uuid>) -> GestResult<Self> {
        match (service_id, task_id) {
            (None, None) => Ok(LinkTarget::None),
            (Some(s), None) => Ok(LinkTarget::Service(s)),
            (None, Some(t)) => Ok(LinkTarget::Task(t)),
            (Some(_), Some(_)) => Err(GestError::Validation(
                "time entry linked to both a service and a task".to_string(),
            )),
        }
    }

    pub fn into_columns(self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            LinkTarget::None => (None, None),
            LinkTarget::Service(s) => (Some(s), None),
            LinkTarget::Task(t) => (None, Some(t)),
        }
    }
}

/// One clock-in/clock-out session for one volunteer. `clock_out = None`
/// means the session is still open; at most one open session may exist
/// per volunteer at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub volunteer_fiscal_code: String,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    pub notes: String,
    pub link: LinkTarget,
    pub created_at: DateTime<Utc>,
}

impl TimeEntry {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    /// Fractional minutes between clock-in and clock-out, `None` while
    /// the session is open.
    pub fn duration_minutes(&self) -> Option<f64> {
        let clock_out = self.clock_out?;
        let delta = clock_out.signed_duration_since(self.clock_in);
        Some(delta.num_seconds() as f64 / 60.0)
    }
}

/// Closed-session totals for one volunteer over one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub total_minutes: f64,
    pub closed_sessions: i64,
    pub open_since: Option<DateTime<Utc>>,
}

impl MonthlySummary {
    /// Whole hours and leftover minutes, for display.
    pub fn hours_and_minutes(&self) -> (i64, i64) {
        let total = self.total_minutes as i64;
        (total / 60, total % 60)
    }
}
