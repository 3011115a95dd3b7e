use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use gestipc_core::errors::GestError;
use gestipc_core::models::telegram::{
    TokenLoginResponse, WebLoginCreatedResponse, WebLoginRequestBody, WebLoginStatus,
    WebLoginStatusResponse,
};
use gestipc_core::models::volunteer::normalize_fiscal_code;
use gestipc_db::repositories::{
    auth as auth_repo, telegram as telegram_repo, volunteer as volunteer_repo,
};
use gestipc_telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{ApiState, middleware::error_handling::AppError};

/// Redeem a one-time login token issued via the bot's /login command.
#[axum::debug_handler]
pub async fn token_login(
    State(state): State<Arc<ApiState>>,
    Path(token): Path<String>,
) -> Result<Json<TokenLoginResponse>, AppError> {
    let now = Utc::now();

    let Some(redeemed) = auth_repo::redeem_login_token(&state.db_pool, &token, now)
        .await
        .map_err(GestError::Database)?
    else {
        // Distinguish a dead link from a never-issued one.
        let known = auth_repo::get_login_token(&state.db_pool, &token)
            .await
            .map_err(GestError::Database)?;
        return Err(match known {
            Some(token) if !token.to_model().is_valid(now) => AppError(GestError::Validation(
                "login link expired or already used; request a new one with /login".to_string(),
            )),
            Some(_) => AppError(GestError::Validation(
                "login link could not be redeemed".to_string(),
            )),
            None => AppError(GestError::NotFound("login token not found".to_string())),
        });
    };

    let account = telegram_repo::get_account(&state.db_pool, redeemed.telegram_id)
        .await
        .map_err(GestError::Database)?;
    let fiscal_code = account
        .and_then(|a| a.volunteer_fiscal_code)
        .ok_or_else(|| GestError::Validation("account is not linked to a volunteer".to_string()))?;

    let volunteer = volunteer_repo::get_volunteer_by_fiscal_code(&state.db_pool, &fiscal_code)
        .await
        .map_err(GestError::Database)?
        .ok_or_else(|| GestError::NotFound(format!("volunteer {fiscal_code} not found")))?;

    info!("Token login for volunteer {}", volunteer.fiscal_code);

    Ok(Json(TokenLoginResponse {
        fiscal_code: volunteer.fiscal_code,
        first_name: volunteer.first_name,
        last_name: volunteer.last_name,
    }))
}

/// Open a pending web-login request and push the approve/deny prompt to
/// the volunteer's private chat.
#[axum::debug_handler]
pub async fn request_web_login(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<WebLoginRequestBody>,
) -> Result<Json<WebLoginCreatedResponse>, AppError> {
    let fiscal_code = normalize_fiscal_code(&payload.fiscal_code)?;

    let volunteer = volunteer_repo::get_volunteer_by_fiscal_code(&state.db_pool, &fiscal_code)
        .await
        .map_err(GestError::Database)?
        .ok_or_else(|| GestError::NotFound("volunteer not found".to_string()))?;

    let account = telegram_repo::get_account_by_volunteer(&state.db_pool, &fiscal_code)
        .await
        .map_err(GestError::Database)?
        .ok_or_else(|| {
            GestError::Validation("volunteer has no linked Telegram account".to_string())
        })?;

    let request = auth_repo::create_web_login_request(&state.db_pool, &fiscal_code)
        .await
        .map_err(GestError::Database)?;

    match &state.telegram {
        Some(telegram) => {
            let keyboard = InlineKeyboardMarkup::new(vec![vec![
                InlineKeyboardButton::callback(
                    "✅ Approva",
                    format!("web_login:approve:{}", request.token),
                ),
                InlineKeyboardButton::callback(
                    "❌ Rifiuta",
                    format!("web_login:deny:{}", request.token),
                ),
            ]]);
            let text = format!(
                "🔐 Richiesta di accesso web per {} {}.\n\n\
                 Se sei stato tu, approva entro 10 minuti.",
                volunteer.first_name, volunteer.last_name
            );

            if let Err(e) = telegram
                .send_message(account.chat_id, &text, Some(keyboard))
                .await
            {
                // The request still exists and will expire on its own.
                warn!("Failed to push web login prompt: {}", e);
            }
        }
        None => warn!("Telegram not configured; web login request will expire unanswered"),
    }

    Ok(Json(WebLoginCreatedResponse {
        token: request.token,
    }))
}

/// Poll the decision of a pending web-login request.
#[axum::debug_handler]
pub async fn web_login_status(
    State(state): State<Arc<ApiState>>,
    Path(token): Path<String>,
) -> Result<Json<WebLoginStatusResponse>, AppError> {
    let request = auth_repo::get_web_login_request(&state.db_pool, &token)
        .await
        .map_err(GestError::Database)?
        .ok_or_else(|| GestError::NotFound("web login request not found".to_string()))?;

    let now = Utc::now();
    let model = request
        .to_model()
        .ok_or_else(|| GestError::Validation(format!("unknown status {}", request.status)))?;

    // Pending requests past the validity window flip to expired on read.
    if model.is_expired(now) {
        let expired =
            auth_repo::resolve_web_login_request(&state.db_pool, &token, WebLoginStatus::Expired, now)
                .await
                .map_err(GestError::Database)?;
        return Ok(Json(WebLoginStatusResponse {
            status: WebLoginStatus::Expired,
            resolved_at: expired.and_then(|r| r.resolved_at),
        }));
    }

    Ok(Json(WebLoginStatusResponse {
        status: model.status,
        resolved_at: request.resolved_at,
    }))
}
