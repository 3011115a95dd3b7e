//! Couples a service to its external availability poll: publishing the
//! poll, recording answers, retracting the message when the service is
//! deleted.

use chrono::Utc;
use eyre::Result;
use gestipc_core::models::service::Answer;
use gestipc_db::DbPool;
use gestipc_db::repositories::{service as service_repo, telegram as telegram_repo};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::TelegramApi;
use crate::types::User;

/// Fixed poll options; the index order is the contract behind
/// [`Answer::from_option_index`].
pub fn poll_options() -> Vec<String> {
    vec![
        "✅ Sì".to_string(),
        "❌ No".to_string(),
        "🤔 Forse".to_string(),
    ]
}

/// Publish the availability poll for a service and persist the poll
/// reference.
///
/// At-most-once: skipped when a poll reference already exists, when the
/// service opted out of announcements, or when no survey chat is
/// configured. Channel failures are logged and swallowed; an unannounced
/// service is still a valid service.
pub async fn send_availability_poll(
    api: &dyn TelegramApi,
    pool: &DbPool,
    survey_chat_id: Option<i64>,
    service_id: Uuid,
) -> Result<()> {
    let Some(service) = service_repo::get_service_by_id(pool, service_id).await? else {
        warn!("Service {} vanished before its poll was sent", service_id);
        return Ok(());
    };

    if !service.send_message {
        debug!("Service {} has announcements disabled, skipping poll", service.id);
        return Ok(());
    }

    if service.poll_id.is_some() {
        info!("Service {} already has a poll, skipping", service.id);
        return Ok(());
    }

    let Some(chat_id) = survey_chat_id else {
        warn!("Survey chat not configured, skipping poll for service {}", service.id);
        return Ok(());
    };

    let question = format!(
        "📢 {} - {}\nSei disponibile?",
        service.name,
        service.starts_at.format("%d/%m/%Y")
    );

    let message = match api.send_poll(chat_id, &question, poll_options()).await {
        Ok(message) => message,
        Err(e) => {
            warn!("Failed to send poll for service {}: {}", service.id, e);
            return Ok(());
        }
    };

    let Some(poll) = message.poll else {
        warn!("sendPoll response for service {} carried no poll", service.id);
        return Ok(());
    };

    let recorded =
        service_repo::set_poll_refs(pool, service.id, &poll.id, message.message_id).await?;
    if recorded {
        info!(
            "Created poll {} (message_id={}) for service {}",
            poll.id, message.message_id, service.id
        );
    } else {
        // A concurrent send won the conditional update; ours stands as
        // an orphan poll in the chat.
        warn!("Service {} already had a poll recorded, not overwriting", service.id);
    }

    Ok(())
}

/// Best-effort removal of the poll message of a deleted service.
pub async fn retract_availability_poll(
    api: &dyn TelegramApi,
    survey_chat_id: Option<i64>,
    poll_message_id: i64,
) {
    let Some(chat_id) = survey_chat_id else {
        return;
    };

    if let Err(e) = api.delete_message(chat_id, poll_message_id).await {
        warn!("Failed to retract poll message {}: {}", poll_message_id, e);
    }
}

/// Translate a poll answer event into an availability row.
///
/// Unknown polls are ignored (a poll created by hand in the chat is not
/// ours); unregistered voters get a notice in the survey chat and
/// nothing recorded; an empty option list retracts the stored answer.
pub async fn record_poll_answer(
    api: &dyn TelegramApi,
    pool: &DbPool,
    survey_chat_id: Option<i64>,
    poll_id: &str,
    user: &User,
    option_ids: &[usize],
) -> Result<()> {
    let Some(service) = service_repo::find_service_by_poll_id(pool, poll_id).await? else {
        debug!("Poll {} not associated with any service, ignoring", poll_id);
        return Ok(());
    };

    let account = telegram_repo::get_account(pool, user.id).await?;
    let fiscal_code = match account.and_then(|a| a.volunteer_fiscal_code) {
        Some(fiscal_code) => fiscal_code,
        None => {
            info!("Unregistered user {} answered poll {}", user.id, poll_id);
            if let Some(chat_id) = survey_chat_id {
                let name = user.first_name.as_deref().unwrap_or("volontario");
                let notice = format!(
                    "⚠️ {name}, la tua risposta non è stata registrata: \
                     avvia una chat privata con il bot e usa /start per \
                     associare il tuo account."
                );
                if let Err(e) = api.send_message(chat_id, &notice, None).await {
                    warn!("Failed to send registration notice: {}", e);
                }
            }
            return Ok(());
        }
    };

    let answer = option_ids.first().and_then(|&i| Answer::from_option_index(i));
    let answered_at = answer.map(|_| Utc::now());

    service_repo::upsert_answer(pool, &fiscal_code, service.id, answer, answered_at).await?;

    info!(
        "Poll answer: {} responded {:?} for service {}",
        fiscal_code, answer, service.id
    );

    Ok(())
}
