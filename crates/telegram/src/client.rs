use async_trait::async_trait;
use eyre::{Result, eyre};
use mockall::automock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{
    ApiResponse, BotCommand, InlineKeyboardMarkup, Message, Poll, Update,
};

/// Outbound surface of the Bot API. Handlers and sweeps depend on this
/// trait so tests can substitute [`MockTelegramApi`].
#[automock]
#[async_trait]
pub trait TelegramApi: Send + Sync {
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>>;

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message>;

    /// Publish a non-anonymous single-answer poll.
    async fn send_poll(&self, chat_id: i64, question: &str, options: Vec<String>)
    -> Result<Message>;

    async fn stop_poll(&self, chat_id: i64, message_id: i64) -> Result<Poll>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()>;

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message>;

    async fn answer_callback_query(&self, callback_query_id: &str, text: Option<String>)
    -> Result<()>;

    async fn set_my_commands(&self, commands: Vec<BotCommand>) -> Result<()>;
}

/// HTTPS client for `api.telegram.org`.
#[derive(Debug, Clone)]
pub struct BotApi {
    http: reqwest::Client,
    base_url: String,
}

impl BotApi {
    pub fn new(token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("https://api.telegram.org/bot{token}"),
        }
    }

    /// Point the client at a different server (tests, local bot API).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn call<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T> {
        debug!("Bot API call: {}", method);

        let response: ApiResponse<T> = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(eyre!(
                "{} failed: {}",
                method,
                response.description.unwrap_or_else(|| "unknown error".to_string())
            ));
        }

        response
            .result
            .ok_or_else(|| eyre!("{} returned ok without a result", method))
    }
}

#[derive(Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: Vec<&'static str>,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct SendPollRequest<'a> {
    chat_id: i64,
    question: &'a str,
    options: Vec<String>,
    is_anonymous: bool,
    allows_multiple_answers: bool,
}

#[derive(Serialize)]
struct MessageRef {
    chat_id: i64,
    message_id: i64,
}

#[derive(Serialize)]
struct EditMessageTextRequest<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct AnswerCallbackQueryRequest<'a> {
    callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
struct SetMyCommandsRequest {
    commands: Vec<BotCommand>,
}

#[async_trait]
impl TelegramApi for BotApi {
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &GetUpdatesRequest {
                offset,
                timeout: timeout_secs,
                allowed_updates: vec!["message", "callback_query", "poll_answer"],
            },
        )
        .await
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message> {
        self.call(
            "sendMessage",
            &SendMessageRequest {
                chat_id,
                text,
                reply_markup: keyboard,
            },
        )
        .await
    }

    async fn send_poll(
        &self,
        chat_id: i64,
        question: &str,
        options: Vec<String>,
    ) -> Result<Message> {
        self.call(
            "sendPoll",
            &SendPollRequest {
                chat_id,
                question,
                options,
                is_anonymous: false,
                allows_multiple_answers: false,
            },
        )
        .await
    }

    async fn stop_poll(&self, chat_id: i64, message_id: i64) -> Result<Poll> {
        self.call("stopPoll", &MessageRef { chat_id, message_id }).await
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        // deleteMessage returns a bare boolean.
        let _: bool = self
            .call("deleteMessage", &MessageRef { chat_id, message_id })
            .await?;
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message> {
        self.call(
            "editMessageText",
            &EditMessageTextRequest {
                chat_id,
                message_id,
                text,
                reply_markup: keyboard,
            },
        )
        .await
    }

    async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<String>,
    ) -> Result<()> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQueryRequest {
                    callback_query_id,
                    text,
                },
            )
            .await?;
        Ok(())
    }

    async fn set_my_commands(&self, commands: Vec<BotCommand>) -> Result<()> {
        let _: bool = self
            .call("setMyCommands", &SetMyCommandsRequest { commands })
            .await?;
        Ok(())
    }
}
