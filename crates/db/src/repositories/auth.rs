use crate::models::{DbLoginToken, DbWebLoginRequest};
use chrono::{DateTime, Duration, Utc};
use eyre::Result;
use gestipc_core::models::telegram::{LOGIN_TOKEN_VALIDITY_MINUTES, WebLoginStatus};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sqlx::{Pool, Postgres};

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

pub async fn create_login_token(pool: &Pool<Postgres>, telegram_id: i64) -> Result<DbLoginToken> {
    let token = sqlx::query_as::<_, DbLoginToken>(
        r#"
        INSERT INTO login_tokens (token, telegram_id, created_at)
        VALUES ($1, $2, $3)
        RETURNING token, telegram_id, created_at, used_at
        "#,
    )
    .bind(random_token())
    .bind(telegram_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(token)
}

/// Redeem a token: single-use and time-boxed, both enforced in the
/// UPDATE condition so two concurrent redemptions cannot both succeed.
pub async fn redeem_login_token(
    pool: &Pool<Postgres>,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<DbLoginToken>> {
    let earliest = now - Duration::minutes(LOGIN_TOKEN_VALIDITY_MINUTES);

    let redeemed = sqlx::query_as::<_, DbLoginToken>(
        r#"
        UPDATE login_tokens
        SET used_at = $2
        WHERE token = $1 AND used_at IS NULL AND created_at >= $3
        RETURNING token, telegram_id, created_at, used_at
        "#,
    )
    .bind(token)
    .bind(now)
    .bind(earliest)
    .fetch_optional(pool)
    .await?;

    Ok(redeemed)
}

pub async fn get_login_token(pool: &Pool<Postgres>, token: &str) -> Result<Option<DbLoginToken>> {
    let login_token = sqlx::query_as::<_, DbLoginToken>(
        r#"
        SELECT token, telegram_id, created_at, used_at
        FROM login_tokens
        WHERE token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(login_token)
}

pub async fn create_web_login_request(
    pool: &Pool<Postgres>,
    fiscal_code: &str,
) -> Result<DbWebLoginRequest> {
    let request = sqlx::query_as::<_, DbWebLoginRequest>(
        r#"
        INSERT INTO web_login_requests (token, volunteer_fiscal_code, status, created_at)
        VALUES ($1, $2, 'pending', $3)
        RETURNING token, volunteer_fiscal_code, status, created_at, resolved_at
        "#,
    )
    .bind(random_token())
    .bind(fiscal_code)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(request)
}

pub async fn get_web_login_request(
    pool: &Pool<Postgres>,
    token: &str,
) -> Result<Option<DbWebLoginRequest>> {
    let request = sqlx::query_as::<_, DbWebLoginRequest>(
        r#"
        SELECT token, volunteer_fiscal_code, status, created_at, resolved_at
        FROM web_login_requests
        WHERE token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

/// Move a pending request to its final status. Conditional on it still
/// being pending; returns None when it was already resolved or expired.
pub async fn resolve_web_login_request(
    pool: &Pool<Postgres>,
    token: &str,
    status: WebLoginStatus,
    resolved_at: DateTime<Utc>,
) -> Result<Option<DbWebLoginRequest>> {
    let request = sqlx::query_as::<_, DbWebLoginRequest>(
        r#"
        UPDATE web_login_requests
        SET status = $2, resolved_at = $3
        WHERE token = $1 AND status = 'pending'
        RETURNING token, volunteer_fiscal_code, status, created_at, resolved_at
        "#,
    )
    .bind(token)
    .bind(status.as_code())
    .bind(resolved_at)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}
