use chrono::{DateTime, Utc};
use gestipc_core::errors::GestResult;
use gestipc_core::models::service::Answer;
use gestipc_core::models::time_entry::{LinkTarget, MonthlySummary};
use mockall::mock;
use uuid::Uuid;

use crate::models::{DbAvailabilityEntry, DbChecklistItem, DbScheduledTask, DbService, DbTimeEntry};

// Mock repositories for testing

mock! {
    pub ServiceRepo {
        pub async fn create_service(
            &self,
            name: &'static str,
            starts_at: DateTime<Utc>,
            service_type_id: Option<Uuid>,
            send_message: bool,
        ) -> eyre::Result<DbService>;

        pub async fn get_service_by_id(&self, id: Uuid) -> eyre::Result<Option<DbService>>;

        pub async fn find_service_by_poll_id(
            &self,
            poll_id: &'static str,
        ) -> eyre::Result<Option<DbService>>;

        pub async fn set_poll_refs(
            &self,
            id: Uuid,
            poll_id: &'static str,
            poll_message_id: i64,
        ) -> eyre::Result<bool>;

        pub async fn upsert_answer(
            &self,
            fiscal_code: &'static str,
            service_id: Uuid,
            answer: Option<Answer>,
            answered_at: Option<DateTime<Utc>>,
        ) -> eyre::Result<DbAvailabilityEntry>;
    }
}

mock! {
    pub TimeEntryRepo {
        pub async fn clock_in(
            &self,
            fiscal_code: &'static str,
            clock_in: DateTime<Utc>,
            link: LinkTarget,
        ) -> GestResult<DbTimeEntry>;

        pub async fn clock_out(
            &self,
            fiscal_code: &'static str,
            clock_out: DateTime<Utc>,
        ) -> GestResult<DbTimeEntry>;

        pub async fn open_entry(
            &self,
            fiscal_code: &'static str,
        ) -> eyre::Result<Option<DbTimeEntry>>;

        pub async fn monthly_summary(
            &self,
            fiscal_code: &'static str,
            month_start: DateTime<Utc>,
            month_end: DateTime<Utc>,
        ) -> eyre::Result<MonthlySummary>;
    }
}

mock! {
    pub TaskRepo {
        pub async fn get_task_by_id(&self, id: Uuid) -> eyre::Result<Option<DbScheduledTask>>;

        pub async fn is_assigned(
            &self,
            task_id: Uuid,
            fiscal_code: &'static str,
        ) -> eyre::Result<bool>;

        pub async fn complete_item(
            &self,
            id: Uuid,
            fiscal_code: &'static str,
            done_at: DateTime<Utc>,
        ) -> eyre::Result<Option<DbChecklistItem>>;

        pub async fn pending_item_count(&self, task_id: Uuid) -> eyre::Result<i64>;

        pub async fn complete_task(
            &self,
            id: Uuid,
            completed_at: DateTime<Utc>,
        ) -> eyre::Result<Option<(DbScheduledTask, u64)>>;
    }
}
