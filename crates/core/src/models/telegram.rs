use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a bot-issued login token stays redeemable.
pub const LOGIN_TOKEN_VALIDITY_MINUTES: i64 = 10;

/// One-time web login token issued via the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginToken {
    pub token: String,
    pub telegram_id: i64,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl LoginToken {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none()
            && now.signed_duration_since(self.created_at)
                <= Duration::minutes(LOGIN_TOKEN_VALIDITY_MINUTES)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebLoginStatus {
    Pending,
    Approved,
    Denied,
    Expired,
}

impl WebLoginStatus {
    pub fn as_code(&self) -> &'static str {
        match self {
            WebLoginStatus::Pending => "pending",
            WebLoginStatus::Approved => "approved",
            WebLoginStatus::Denied => "denied",
            WebLoginStatus::Expired => "expired",
        }
    }

    pub fn from_code(code: &str) -> Option<WebLoginStatus> {
        match code {
            "pending" => Some(WebLoginStatus::Pending),
            "approved" => Some(WebLoginStatus::Approved),
            "denied" => Some(WebLoginStatus::Denied),
            "expired" => Some(WebLoginStatus::Expired),
            _ => None,
        }
    }
}

/// A web client asking to log in as a volunteer; the decision arrives
/// asynchronously from the volunteer's Telegram chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebLoginRequest {
    pub token: String,
    pub volunteer_fiscal_code: String,
    pub status: WebLoginStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl WebLoginRequest {
    /// A pending request older than the token validity window is dead.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == WebLoginStatus::Pending
            && now.signed_duration_since(self.created_at)
                > Duration::minutes(LOGIN_TOKEN_VALIDITY_MINUTES)
    }
}

// Wire types for the web login bridge.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebLoginRequestBody {
    pub fiscal_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebLoginCreatedResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebLoginStatusResponse {
    pub status: WebLoginStatus,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLoginResponse {
    pub fiscal_code: String,
    pub first_name: String,
    pub last_name: String,
}
