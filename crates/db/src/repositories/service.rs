use crate::models::{DbAvailabilityEntry, DbChecklistTemplateItem, DbService, DbServiceType};
use chrono::{DateTime, Utc};
use eyre::Result;
use gestipc_core::models::service::Answer;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

// Service types

pub async fn get_or_create_service_type(
    pool: &Pool<Postgres>,
    name: &str,
) -> Result<DbServiceType> {
    // The no-op update makes RETURNING yield the row on conflict too.
    let service_type = sqlx::query_as::<_, DbServiceType>(
        r#"
        INSERT INTO service_types (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id, name
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(service_type)
}

pub async fn get_service_type_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbServiceType>> {
    let service_type = sqlx::query_as::<_, DbServiceType>(
        r#"
        SELECT id, name
        FROM service_types
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(service_type)
}

pub async fn list_service_types(pool: &Pool<Postgres>) -> Result<Vec<DbServiceType>> {
    let service_types = sqlx::query_as::<_, DbServiceType>(
        r#"
        SELECT id, name
        FROM service_types
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(service_types)
}

pub async fn add_template_item(
    pool: &Pool<Postgres>,
    service_type_id: Uuid,
    description: &str,
    position: i32,
) -> Result<DbChecklistTemplateItem> {
    let item = sqlx::query_as::<_, DbChecklistTemplateItem>(
        r#"
        INSERT INTO checklist_template_items (id, service_type_id, description, position)
        VALUES ($1, $2, $3, $4)
        RETURNING id, service_type_id, description, position
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(service_type_id)
    .bind(description)
    .bind(position)
    .fetch_one(pool)
    .await?;

    Ok(item)
}

pub async fn list_template_items(
    pool: &Pool<Postgres>,
    service_type_id: Uuid,
) -> Result<Vec<DbChecklistTemplateItem>> {
    let items = sqlx::query_as::<_, DbChecklistTemplateItem>(
        r#"
        SELECT id, service_type_id, description, position
        FROM checklist_template_items
        WHERE service_type_id = $1
        ORDER BY position, description
        "#,
    )
    .bind(service_type_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

// Services

const SERVICE_COLUMNS: &str = "id, name, starts_at, service_type_id, poll_id, poll_message_id, \
                               send_message, poll_closed, notification_sent";

pub async fn create_service(
    pool: &Pool<Postgres>,
    name: &str,
    starts_at: DateTime<Utc>,
    service_type_id: Option<Uuid>,
    send_message: bool,
) -> Result<DbService> {
    let id = Uuid::new_v4();

    tracing::debug!("Creating service: id={}, name={}", id, name);

    let service = sqlx::query_as::<_, DbService>(&format!(
        r#"
        INSERT INTO services (id, name, starts_at, service_type_id, send_message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {SERVICE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name)
    .bind(starts_at)
    .bind(service_type_id)
    .bind(send_message)
    .fetch_one(pool)
    .await?;

    Ok(service)
}

pub async fn get_service_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbService>> {
    let service = sqlx::query_as::<_, DbService>(&format!(
        r#"
        SELECT {SERVICE_COLUMNS}
        FROM services
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(service)
}

pub async fn find_service_by_poll_id(
    pool: &Pool<Postgres>,
    poll_id: &str,
) -> Result<Option<DbService>> {
    let service = sqlx::query_as::<_, DbService>(&format!(
        r#"
        SELECT {SERVICE_COLUMNS}
        FROM services
        WHERE poll_id = $1
        "#
    ))
    .bind(poll_id)
    .fetch_optional(pool)
    .await?;

    Ok(service)
}

/// Delete a service and return the deleted row, so the caller can
/// retract the poll message afterwards. Availability rows cascade.
pub async fn delete_service(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbService>> {
    let service = sqlx::query_as::<_, DbService>(&format!(
        r#"
        DELETE FROM services
        WHERE id = $1
        RETURNING {SERVICE_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(service)
}

/// Record the external poll reference. Scoped to the primary key and
/// conditional on no poll being attached yet, so a concurrent send or a
/// stale in-memory object cannot clobber an existing reference.
pub async fn set_poll_refs(
    pool: &Pool<Postgres>,
    id: Uuid,
    poll_id: &str,
    poll_message_id: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE services
        SET poll_id = $2, poll_message_id = $3
        WHERE id = $1 AND poll_id IS NULL
        "#,
    )
    .bind(id)
    .bind(poll_id)
    .bind(poll_message_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Services whose poll should be stopped: starting before the cutoff,
/// poll message sent, poll still open.
pub async fn list_closable_polls(
    pool: &Pool<Postgres>,
    cutoff: DateTime<Utc>,
) -> Result<Vec<DbService>> {
    let services = sqlx::query_as::<_, DbService>(&format!(
        r#"
        SELECT {SERVICE_COLUMNS}
        FROM services
        WHERE starts_at <= $1
          AND poll_message_id IS NOT NULL
          AND poll_closed = FALSE
        "#
    ))
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(services)
}

pub async fn mark_poll_closed(pool: &Pool<Postgres>, id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE services
        SET poll_closed = TRUE
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Services eligible for the pre-start reminder batch: starting inside
/// the window and not yet latched. The lower bound keeps past services
/// out even if a sweep was delayed.
pub async fn list_due_reminders(
    pool: &Pool<Postgres>,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<DbService>> {
    let services = sqlx::query_as::<_, DbService>(&format!(
        r#"
        SELECT {SERVICE_COLUMNS}
        FROM services
        WHERE starts_at >= $1
          AND starts_at <= $2
          AND notification_sent = FALSE
        "#
    ))
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await?;

    Ok(services)
}

pub async fn mark_notification_sent(pool: &Pool<Postgres>, id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE services
        SET notification_sent = TRUE
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

// Availability answers

/// Record (or overwrite) a volunteer's answer for a service. Passing
/// `None` retracts: both the answer and its timestamp are cleared.
pub async fn upsert_answer(
    pool: &Pool<Postgres>,
    fiscal_code: &str,
    service_id: Uuid,
    answer: Option<Answer>,
    answered_at: Option<DateTime<Utc>>,
) -> Result<DbAvailabilityEntry> {
    let entry = sqlx::query_as::<_, DbAvailabilityEntry>(
        r#"
        INSERT INTO availability_entries (id, volunteer_fiscal_code, service_id, answer, answered_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (volunteer_fiscal_code, service_id)
        DO UPDATE SET answer = $4, answered_at = $5
        RETURNING id, volunteer_fiscal_code, service_id, answer, answered_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(fiscal_code)
    .bind(service_id)
    .bind(answer.map(|a| a.as_code()))
    .bind(answered_at)
    .fetch_one(pool)
    .await?;

    Ok(entry)
}

pub async fn get_answer(
    pool: &Pool<Postgres>,
    fiscal_code: &str,
    service_id: Uuid,
) -> Result<Option<DbAvailabilityEntry>> {
    let entry = sqlx::query_as::<_, DbAvailabilityEntry>(
        r#"
        SELECT id, volunteer_fiscal_code, service_id, answer, answered_at
        FROM availability_entries
        WHERE volunteer_fiscal_code = $1 AND service_id = $2
        "#,
    )
    .bind(fiscal_code)
    .bind(service_id)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

pub async fn list_answers(
    pool: &Pool<Postgres>,
    service_id: Uuid,
) -> Result<Vec<DbAvailabilityEntry>> {
    let entries = sqlx::query_as::<_, DbAvailabilityEntry>(
        r#"
        SELECT id, volunteer_fiscal_code, service_id, answer, answered_at
        FROM availability_entries
        WHERE service_id = $1
        ORDER BY answered_at
        "#,
    )
    .bind(service_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Everyone invited to the service who did not decline: answered Yes or
/// Maybe, or never answered.
pub async fn list_participants(
    pool: &Pool<Postgres>,
    service_id: Uuid,
) -> Result<Vec<DbAvailabilityEntry>> {
    let entries = sqlx::query_as::<_, DbAvailabilityEntry>(
        r#"
        SELECT id, volunteer_fiscal_code, service_id, answer, answered_at
        FROM availability_entries
        WHERE service_id = $1
          AND (answer IS NULL OR answer <> 'no')
        "#,
    )
    .bind(service_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
