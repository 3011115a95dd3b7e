use eyre::{Result, eyre};
use serde::Deserialize;
use std::env;

/// Configuration for the Telegram bot.
///
/// The survey chat is optional: without it the bot still handles
/// commands and callbacks, but availability polls and group notices are
/// skipped with a warning.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Telegram bot token (required)
    pub token: String,
    /// Database connection URL (required)
    pub database_url: String,
    /// Base URL of the web application (required for login links)
    pub web_base_url: String,
    /// Group chat where availability polls are published
    pub survey_chat_id: Option<i64>,
}

impl BotConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| eyre!("TELEGRAM_BOT_TOKEN environment variable not set"))?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| eyre!("DATABASE_URL environment variable not set"))?;

        let web_base_url = env::var("WEB_BASE_URL")
            .map_err(|_| eyre!("WEB_BASE_URL environment variable not set"))?;

        let survey_chat_id = match env::var("TELEGRAM_SURVEY_CHAT_ID") {
            Ok(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| eyre!("TELEGRAM_SURVEY_CHAT_ID must be a valid chat id"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            token,
            database_url,
            web_base_url,
            survey_chat_id,
        })
    }

    /// One-time login URL for a freshly issued token.
    pub fn login_url(&self, token: &str) -> String {
        format!("{}/auth/login/{}", self.web_base_url.trim_end_matches('/'), token)
    }
}
