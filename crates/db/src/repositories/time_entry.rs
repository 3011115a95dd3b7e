use crate::models::DbTimeEntry;
use chrono::{DateTime, Utc};
use eyre::Result;
use gestipc_core::errors::{GestError, GestResult};
use gestipc_core::models::time_entry::{LinkTarget, MonthlySummary};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const ENTRY_COLUMNS: &str =
    "id, volunteer_fiscal_code, clock_in, clock_out, notes, service_id, task_id, created_at";

/// Name of the partial unique index guarding "one open entry per
/// volunteer"; a violation means a concurrent clock-in won.
const ONE_OPEN_INDEX: &str = "idx_time_entries_one_open";

/// Open a new session. The database rejects a second open entry for the
/// same volunteer; that rejection surfaces as `AlreadyClockedIn`.
pub async fn clock_in(
    pool: &Pool<Postgres>,
    fiscal_code: &str,
    clock_in: DateTime<Utc>,
    link: LinkTarget,
) -> GestResult<DbTimeEntry> {
    let (service_id, task_id) = link.into_columns();

    let result = sqlx::query_as::<_, DbTimeEntry>(&format!(
        r#"
        INSERT INTO time_entries (id, volunteer_fiscal_code, clock_in, service_id, task_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {ENTRY_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(fiscal_code)
    .bind(clock_in)
    .bind(service_id)
    .bind(task_id)
    .fetch_one(pool)
    .await;

    match result {
        Ok(entry) => Ok(entry),
        Err(sqlx::Error::Database(db_err)) if db_err.constraint() == Some(ONE_OPEN_INDEX) => {
            let since = open_entry(pool, fiscal_code)
                .await
                .map_err(GestError::Database)?
                .map(|e| e.clock_in)
                .unwrap_or(clock_in);
            Err(GestError::AlreadyClockedIn(since))
        }
        Err(e) => Err(GestError::Database(eyre::Report::new(e))),
    }
}

/// Close the volunteer's open session, returning the closed row.
pub async fn clock_out(
    pool: &Pool<Postgres>,
    fiscal_code: &str,
    clock_out: DateTime<Utc>,
) -> GestResult<DbTimeEntry> {
    let entry = sqlx::query_as::<_, DbTimeEntry>(&format!(
        r#"
        UPDATE time_entries
        SET clock_out = $2
        WHERE volunteer_fiscal_code = $1 AND clock_out IS NULL
        RETURNING {ENTRY_COLUMNS}
        "#
    ))
    .bind(fiscal_code)
    .bind(clock_out)
    .fetch_optional(pool)
    .await
    .map_err(|e| GestError::Database(eyre::Report::new(e)))?;

    entry.ok_or(GestError::NoOpenEntry)
}

pub async fn open_entry(pool: &Pool<Postgres>, fiscal_code: &str) -> Result<Option<DbTimeEntry>> {
    let entry = sqlx::query_as::<_, DbTimeEntry>(&format!(
        r#"
        SELECT {ENTRY_COLUMNS}
        FROM time_entries
        WHERE volunteer_fiscal_code = $1 AND clock_out IS NULL
        "#
    ))
    .bind(fiscal_code)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

/// Closed-session totals for entries whose clock-in falls inside
/// [month_start, month_end), plus the open session if any.
pub async fn monthly_summary(
    pool: &Pool<Postgres>,
    fiscal_code: &str,
    month_start: DateTime<Utc>,
    month_end: DateTime<Utc>,
) -> Result<MonthlySummary> {
    let (total_minutes, closed_sessions): (Option<f64>, i64) = sqlx::query_as(
        r#"
        SELECT SUM(EXTRACT(EPOCH FROM (clock_out - clock_in)) / 60.0)::FLOAT8,
               COUNT(*)
        FROM time_entries
        WHERE volunteer_fiscal_code = $1
          AND clock_out IS NOT NULL
          AND clock_in >= $2
          AND clock_in < $3
        "#,
    )
    .bind(fiscal_code)
    .bind(month_start)
    .bind(month_end)
    .fetch_one(pool)
    .await?;

    let open = open_entry(pool, fiscal_code).await?;

    Ok(MonthlySummary {
        total_minutes: total_minutes.unwrap_or(0.0),
        closed_sessions,
        open_since: open.map(|e| e.clock_in),
    })
}

pub async fn list_open_entries_for_task(
    pool: &Pool<Postgres>,
    task_id: Uuid,
) -> Result<Vec<DbTimeEntry>> {
    let entries = sqlx::query_as::<_, DbTimeEntry>(&format!(
        r#"
        SELECT {ENTRY_COLUMNS}
        FROM time_entries
        WHERE task_id = $1 AND clock_out IS NULL
        "#
    ))
    .bind(task_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
