use crate::models::{DbChecklistItem, DbScheduledTask};
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, name, description, service_type_id, deadline, notification_sent, \
                            completed, completed_at, created_at";

const ITEM_COLUMNS: &str = "id, task_id, description, position, done, done_by, done_at";

/// Create a task, assign volunteers and seed its checklist from the
/// service type's template, all in one transaction.
pub async fn create_task(
    pool: &Pool<Postgres>,
    name: &str,
    description: &str,
    service_type_id: Option<Uuid>,
    deadline: DateTime<Utc>,
    assignees: &[String],
) -> Result<DbScheduledTask> {
    let id = Uuid::new_v4();

    tracing::debug!("Creating scheduled task: id={}, name={}", id, name);

    let mut tx = pool.begin().await?;

    let task = sqlx::query_as::<_, DbScheduledTask>(&format!(
        r#"
        INSERT INTO scheduled_tasks (id, name, description, service_type_id, deadline)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {TASK_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(service_type_id)
    .bind(deadline)
    .fetch_one(&mut *tx)
    .await?;

    for fiscal_code in assignees {
        sqlx::query(
            r#"
            INSERT INTO task_assignments (task_id, volunteer_fiscal_code)
            VALUES ($1, $2)
            ON CONFLICT (task_id, volunteer_fiscal_code) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(fiscal_code)
        .execute(&mut *tx)
        .await?;
    }

    if let Some(type_id) = service_type_id {
        sqlx::query(
            r#"
            INSERT INTO checklist_items (id, task_id, description, position)
            SELECT gen_random_uuid(), $1, description, position
            FROM checklist_template_items
            WHERE service_type_id = $2
            "#,
        )
        .bind(id)
        .bind(type_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(task)
}

pub async fn get_task_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbScheduledTask>> {
    let task = sqlx::query_as::<_, DbScheduledTask>(&format!(
        r#"
        SELECT {TASK_COLUMNS}
        FROM scheduled_tasks
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(task)
}

pub async fn is_assigned(pool: &Pool<Postgres>, task_id: Uuid, fiscal_code: &str) -> Result<bool> {
    let assigned = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM task_assignments
            WHERE task_id = $1 AND volunteer_fiscal_code = $2
        );
        "#,
    )
    .bind(task_id)
    .bind(fiscal_code)
    .fetch_one(pool)
    .await?;

    Ok(assigned)
}

pub async fn list_assignees(pool: &Pool<Postgres>, task_id: Uuid) -> Result<Vec<String>> {
    let assignees = sqlx::query_scalar::<_, String>(
        r#"
        SELECT volunteer_fiscal_code
        FROM task_assignments
        WHERE task_id = $1
        "#,
    )
    .bind(task_id)
    .fetch_all(pool)
    .await?;

    Ok(assignees)
}

/// Tasks whose 48-hour reminder is due: deadline inside the window and
/// not yet latched.
pub async fn list_due_reminders(
    pool: &Pool<Postgres>,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<DbScheduledTask>> {
    let tasks = sqlx::query_as::<_, DbScheduledTask>(&format!(
        r#"
        SELECT {TASK_COLUMNS}
        FROM scheduled_tasks
        WHERE deadline >= $1
          AND deadline <= $2
          AND notification_sent = FALSE
          AND completed = FALSE
        "#
    ))
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await?;

    Ok(tasks)
}

pub async fn mark_notification_sent(pool: &Pool<Postgres>, id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE scheduled_tasks
        SET notification_sent = TRUE
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

// Checklist items

pub async fn list_checklist_items(
    pool: &Pool<Postgres>,
    task_id: Uuid,
) -> Result<Vec<DbChecklistItem>> {
    let items = sqlx::query_as::<_, DbChecklistItem>(&format!(
        r#"
        SELECT {ITEM_COLUMNS}
        FROM checklist_items
        WHERE task_id = $1
        ORDER BY position, description
        "#
    ))
    .bind(task_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

pub async fn get_checklist_item(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbChecklistItem>> {
    let item = sqlx::query_as::<_, DbChecklistItem>(&format!(
        r#"
        SELECT {ITEM_COLUMNS}
        FROM checklist_items
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(item)
}

pub async fn add_checklist_item(
    pool: &Pool<Postgres>,
    task_id: Uuid,
    description: &str,
    position: i32,
) -> Result<DbChecklistItem> {
    let item = sqlx::query_as::<_, DbChecklistItem>(&format!(
        r#"
        INSERT INTO checklist_items (id, task_id, description, position)
        VALUES ($1, $2, $3, $4)
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(task_id)
    .bind(description)
    .bind(position)
    .fetch_one(pool)
    .await?;

    Ok(item)
}

/// Mark an item done. Conditional on it being pending, so a double tap
/// records the first completer only; returns None when already done.
pub async fn complete_item(
    pool: &Pool<Postgres>,
    id: Uuid,
    fiscal_code: &str,
    done_at: DateTime<Utc>,
) -> Result<Option<DbChecklistItem>> {
    let item = sqlx::query_as::<_, DbChecklistItem>(&format!(
        r#"
        UPDATE checklist_items
        SET done = TRUE, done_by = $2, done_at = $3
        WHERE id = $1 AND done = FALSE
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(fiscal_code)
    .bind(done_at)
    .fetch_optional(pool)
    .await?;

    Ok(item)
}

pub async fn pending_item_count(pool: &Pool<Postgres>, task_id: Uuid) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM checklist_items
        WHERE task_id = $1 AND done = FALSE
        "#,
    )
    .bind(task_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Flip the task to completed and force-close every open time entry
/// linked to it, in one transaction. Returns None when the task was
/// already completed (the latch), along with no side effects.
pub async fn complete_task(
    pool: &Pool<Postgres>,
    id: Uuid,
    completed_at: DateTime<Utc>,
) -> Result<Option<(DbScheduledTask, u64)>> {
    let mut tx = pool.begin().await?;

    let task = sqlx::query_as::<_, DbScheduledTask>(&format!(
        r#"
        UPDATE scheduled_tasks
        SET completed = TRUE, completed_at = $2
        WHERE id = $1 AND completed = FALSE
        RETURNING {TASK_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(completed_at)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(task) = task else {
        tx.rollback().await?;
        return Ok(None);
    };

    let closed = sqlx::query(
        r#"
        UPDATE time_entries
        SET clock_out = $2
        WHERE task_id = $1 AND clock_out IS NULL
        "#,
    )
    .bind(id)
    .bind(completed_at)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    Ok(Some((task, closed)))
}
