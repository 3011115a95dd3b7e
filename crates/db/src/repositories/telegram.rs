use crate::models::DbTelegramAccount;
use chrono::Utc;
use eyre::Result;
use gestipc_core::errors::{GestError, GestResult};
use sqlx::{Pool, Postgres};

const ACCOUNT_COLUMNS: &str = "telegram_id, chat_id, volunteer_fiscal_code, username, \
                               first_name, last_name, created_at, updated_at";

/// Insert or refresh the profile row for a Telegram identity. The
/// volunteer link, if any, is left untouched.
pub async fn upsert_account(
    pool: &Pool<Postgres>,
    telegram_id: i64,
    chat_id: i64,
    username: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Result<DbTelegramAccount> {
    let now = Utc::now();

    let account = sqlx::query_as::<_, DbTelegramAccount>(&format!(
        r#"
        INSERT INTO telegram_accounts (telegram_id, chat_id, username, first_name, last_name,
                                       created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        ON CONFLICT (telegram_id)
        DO UPDATE SET chat_id = $2, username = $3, first_name = $4, last_name = $5, updated_at = $6
        RETURNING {ACCOUNT_COLUMNS}
        "#
    ))
    .bind(telegram_id)
    .bind(chat_id)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(account)
}

pub async fn get_account(
    pool: &Pool<Postgres>,
    telegram_id: i64,
) -> Result<Option<DbTelegramAccount>> {
    let account = sqlx::query_as::<_, DbTelegramAccount>(&format!(
        r#"
        SELECT {ACCOUNT_COLUMNS}
        FROM telegram_accounts
        WHERE telegram_id = $1
        "#
    ))
    .bind(telegram_id)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

pub async fn get_account_by_volunteer(
    pool: &Pool<Postgres>,
    fiscal_code: &str,
) -> Result<Option<DbTelegramAccount>> {
    let account = sqlx::query_as::<_, DbTelegramAccount>(&format!(
        r#"
        SELECT {ACCOUNT_COLUMNS}
        FROM telegram_accounts
        WHERE volunteer_fiscal_code = $1
        "#
    ))
    .bind(fiscal_code)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Link a Telegram identity to a volunteer. The unique constraint on
/// the volunteer column rejects a volunteer already linked to another
/// account.
pub async fn link_account(
    pool: &Pool<Postgres>,
    telegram_id: i64,
    fiscal_code: &str,
) -> GestResult<DbTelegramAccount> {
    let result = sqlx::query_as::<_, DbTelegramAccount>(&format!(
        r#"
        UPDATE telegram_accounts
        SET volunteer_fiscal_code = $2, updated_at = $3
        WHERE telegram_id = $1
        RETURNING {ACCOUNT_COLUMNS}
        "#
    ))
    .bind(telegram_id)
    .bind(fiscal_code)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await;

    match result {
        Ok(Some(account)) => Ok(account),
        Ok(None) => Err(GestError::NotFound(format!(
            "Telegram account {telegram_id} not found"
        ))),
        Err(sqlx::Error::Database(db_err))
            if db_err.constraint() == Some("telegram_accounts_volunteer_fiscal_code_key") =>
        {
            Err(GestError::Validation(
                "volunteer already linked to another Telegram account".to_string(),
            ))
        }
        Err(e) => Err(GestError::Database(eyre::Report::new(e))),
    }
}

/// Accounts linked to staff volunteers, for completion notices.
pub async fn list_staff_accounts(pool: &Pool<Postgres>) -> Result<Vec<DbTelegramAccount>> {
    let accounts = sqlx::query_as::<_, DbTelegramAccount>(
        r#"
        SELECT a.telegram_id, a.chat_id, a.volunteer_fiscal_code, a.username,
               a.first_name, a.last_name, a.created_at, a.updated_at
        FROM telegram_accounts a
        JOIN volunteers v ON v.fiscal_code = a.volunteer_fiscal_code
        WHERE v.is_staff = TRUE
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(accounts)
}
