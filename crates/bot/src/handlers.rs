use eyre::Result;
use gestipc_db::DbPool;
use gestipc_db::models::DbVolunteer;
use gestipc_db::repositories::{telegram as telegram_repo, volunteer as volunteer_repo};
use gestipc_telegram::TelegramApi;
use gestipc_telegram::availability;
use gestipc_telegram::types::{Message, Update, User};
use std::sync::Arc;
use tracing::{debug, info};

pub mod callbacks;
pub mod commands;

use crate::config::BotConfig;
use crate::session::SessionStore;

/// Shared context passed to every handler.
#[derive(Clone)]
pub struct BotContext {
    pub api: Arc<dyn TelegramApi>,
    pub pool: DbPool,
    pub config: BotConfig,
    pub sessions: SessionStore,
}

impl BotContext {
    /// Resolve the sender to a linked volunteer, replying with the
    /// registration hint when that fails.
    pub async fn linked_volunteer(&self, chat_id: i64, user: &User) -> Result<Option<DbVolunteer>> {
        let account = telegram_repo::get_account(&self.pool, user.id).await?;

        let fiscal_code = match account.and_then(|a| a.volunteer_fiscal_code) {
            Some(fiscal_code) => fiscal_code,
            None => {
                self.api
                    .send_message(
                        chat_id,
                        "❌ Non sei ancora registrato.\nUsa /start per associare il tuo account.",
                        None,
                    )
                    .await?;
                return Ok(None);
            }
        };

        let volunteer = volunteer_repo::get_volunteer_by_fiscal_code(&self.pool, &fiscal_code)
            .await?;
        Ok(volunteer)
    }
}

/// Route one update to its handler.
pub async fn dispatch_update(ctx: &BotContext, update: Update) -> Result<()> {
    if let Some(poll_answer) = update.poll_answer {
        return availability::record_poll_answer(
            ctx.api.as_ref(),
            &ctx.pool,
            ctx.config.survey_chat_id,
            &poll_answer.poll_id,
            &poll_answer.user,
            &poll_answer.option_ids,
        )
        .await;
    }

    if let Some(callback) = update.callback_query {
        return callbacks::handle_callback(ctx, callback).await;
    }

    if let Some(message) = update.message {
        return handle_message(ctx, message).await;
    }

    Ok(())
}

async fn handle_message(ctx: &BotContext, message: Message) -> Result<()> {
    if !message.new_chat_members.is_empty() {
        return greet_new_members(ctx, &message).await;
    }

    let Some(user) = message.from.clone() else {
        return Ok(());
    };
    let Some(text) = message.text.clone() else {
        return Ok(());
    };

    if let Some(command) = parse_command(&text) {
        info!("Received command: {}", command);
        return commands::handle_command(ctx, &command, &message, &user).await;
    }

    // Free text only matters inside a conversation.
    if ctx.sessions.get(message.chat.id).await.is_some() {
        return commands::handle_conversation_text(ctx, &message, &user, text.trim()).await;
    }

    debug!("Ignoring text outside any conversation from chat {}", message.chat.id);
    Ok(())
}

/// Extract the command name from a `/command` or `/command@botname`
/// message, lowercased and without arguments.
fn parse_command(text: &str) -> Option<String> {
    let text = text.trim();
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);

    if name.is_empty() {
        return None;
    }

    Some(name.to_lowercase())
}

/// Welcome users joining the group chat and store their account row so
/// a later /start can link it.
async fn greet_new_members(ctx: &BotContext, message: &Message) -> Result<()> {
    for member in &message.new_chat_members {
        telegram_repo::upsert_account(
            &ctx.pool,
            member.id,
            message.chat.id,
            member.username.as_deref(),
            member.first_name.as_deref(),
            member.last_name.as_deref(),
        )
        .await?;

        let name = member.first_name.as_deref().unwrap_or("volontario");
        info!("New member joined: {} ({})", name, member.id);

        ctx.api
            .send_message(
                message.chat.id,
                &format!(
                    "Ciao {name}! 👋\n\n\
                     Per utilizzare il bot e accedere a tutte le funzionalità, \
                     avvia una chat privata con me per associare il tuo account \
                     Telegram al tuo profilo volontario."
                ),
                None,
            )
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_command;

    #[test]
    fn parses_plain_and_mentioned_commands() {
        assert_eq!(parse_command("/start"), Some("start".to_string()));
        assert_eq!(parse_command("/Start"), Some("start".to_string()));
        assert_eq!(parse_command("/ore@gestipc_bot"), Some("ore".to_string()));
        assert_eq!(parse_command("/entrata adesso"), Some("entrata".to_string()));
        assert_eq!(parse_command("ciao"), None);
        assert_eq!(parse_command("/"), None);
    }
}
