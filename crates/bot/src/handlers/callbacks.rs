use chrono::Utc;
use eyre::Result;
use gestipc_core::errors::GestError;
use gestipc_core::models::telegram::WebLoginStatus;
use gestipc_core::models::time_entry::LinkTarget;
use gestipc_db::models::DbVolunteer;
use gestipc_db::repositories::{
    auth as auth_repo, service as service_repo, task as task_repo, telegram as telegram_repo,
    time_entry as time_entry_repo, volunteer as volunteer_repo,
};
use gestipc_telegram::types::{CallbackQuery, Message};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::checklist;
use crate::handlers::BotContext;
use crate::handlers::commands::{format_datetime, format_time};
use crate::session::ConversationState;

/// Route an inline-button press by its `prefix:data` payload.
pub async fn handle_callback(ctx: &BotContext, callback: CallbackQuery) -> Result<()> {
    // Acknowledge immediately so the client stops its spinner.
    ctx.api.answer_callback_query(&callback.id, None).await.ok();

    let Some(data) = callback.data.clone() else {
        return Ok(());
    };
    let Some(message) = callback.message.clone() else {
        // Too old for Telegram to carry the original message; nothing
        // left to edit.
        warn!("Callback {} without message, ignoring", data);
        return Ok(());
    };

    let Some((prefix, payload)) = data.split_once(':') else {
        warn!("Malformed callback data: {}", data);
        return Ok(());
    };

    match prefix {
        "stype" => handle_service_type(ctx, &message, payload).await,
        "clock_in" => handle_clock_in(ctx, &callback, &message, payload).await,
        "task_start" => handle_task_start(ctx, &callback, &message, payload).await,
        "chk" => handle_checklist_toggle(ctx, &callback, &message, payload).await,
        "web_login" => handle_web_login(ctx, &message, payload).await,
        _ => {
            warn!("Unknown callback prefix: {}", prefix);
            Ok(())
        }
    }
}

/// Resolve the callback sender to a linked volunteer, editing the
/// source message with a registration hint when that fails.
async fn linked_volunteer(
    ctx: &BotContext,
    callback: &CallbackQuery,
    message: &Message,
) -> Result<Option<DbVolunteer>> {
    let account = telegram_repo::get_account(&ctx.pool, callback.from.id).await?;

    let fiscal_code = match account.and_then(|a| a.volunteer_fiscal_code) {
        Some(fiscal_code) => fiscal_code,
        None => {
            ctx.api
                .edit_message_text(
                    message.chat.id,
                    message.message_id,
                    "❌ Non sei registrato. Usa /start per associare il tuo account.",
                    None,
                )
                .await?;
            return Ok(None);
        }
    };

    let volunteer =
        volunteer_repo::get_volunteer_by_fiscal_code(&ctx.pool, &fiscal_code).await?;
    Ok(volunteer)
}

// Service creation: type picked from the inline keyboard.

async fn handle_service_type(ctx: &BotContext, message: &Message, payload: &str) -> Result<()> {
    // Only meaningful while the chat is choosing a type.
    if ctx.sessions.get(message.chat.id).await != Some(ConversationState::AwaitingServiceType) {
        return Ok(());
    }

    if payload == "new" {
        ctx.api
            .edit_message_text(
                message.chat.id,
                message.message_id,
                "📋 Creazione nuovo servizio\n\n\
                 Inserisci il nome del nuovo tipo di servizio:",
                None,
            )
            .await?;
        ctx.sessions
            .set(message.chat.id, ConversationState::AwaitingNewTypeName)
            .await;
        return Ok(());
    }

    let Ok(type_id) = payload.parse::<Uuid>() else {
        warn!("Invalid service type id in callback: {}", payload);
        return Ok(());
    };

    let Some(service_type) = service_repo::get_service_type_by_id(&ctx.pool, type_id).await? else {
        ctx.api
            .edit_message_text(
                message.chat.id,
                message.message_id,
                "❌ Tipo non trovato. Riprova con /nuovoservizio.",
                None,
            )
            .await?;
        ctx.sessions.clear(message.chat.id).await;
        return Ok(());
    };

    ctx.api
        .edit_message_text(
            message.chat.id,
            message.message_id,
            &format!(
                "Tipo: {}\n\nInserisci il nome del servizio:",
                service_type.name
            ),
            None,
        )
        .await?;
    ctx.sessions
        .set(
            message.chat.id,
            ConversationState::AwaitingServiceName {
                type_id: Some(service_type.id),
            },
        )
        .await;

    Ok(())
}

// Reminder button: clock in against a service.

async fn handle_clock_in(
    ctx: &BotContext,
    callback: &CallbackQuery,
    message: &Message,
    payload: &str,
) -> Result<()> {
    let Some(volunteer) = linked_volunteer(ctx, callback, message).await? else {
        return Ok(());
    };

    let Ok(service_id) = payload.parse::<Uuid>() else {
        warn!("Invalid service id in clock_in callback: {}", payload);
        return Ok(());
    };

    let Some(service) = service_repo::get_service_by_id(&ctx.pool, service_id).await? else {
        ctx.api
            .edit_message_text(
                message.chat.id,
                message.message_id,
                "❌ Servizio non trovato.",
                None,
            )
            .await?;
        return Ok(());
    };

    match time_entry_repo::clock_in(
        &ctx.pool,
        &volunteer.fiscal_code,
        Utc::now(),
        LinkTarget::Service(service.id),
    )
    .await
    {
        Ok(entry) => {
            ctx.api
                .edit_message_text(
                    message.chat.id,
                    message.message_id,
                    &format!(
                        "✅ Entrata registrata alle {} per il servizio \"{}\".\n\n\
                         Buon lavoro! Usa /uscita quando hai finito.",
                        format_time(entry.clock_in),
                        service.name
                    ),
                    None,
                )
                .await?;
            info!(
                "Clock-in via button: {} for service {}",
                volunteer.fiscal_code, service.name
            );
        }
        Err(GestError::AlreadyClockedIn(since)) => {
            ctx.api
                .edit_message_text(
                    message.chat.id,
                    message.message_id,
                    &format!(
                        "⚠️ Hai già un'entrata aperta dalle {}.\n\n\
                         Usa /uscita per registrare l'uscita prima di una nuova entrata.",
                        format_datetime(since)
                    ),
                    None,
                )
                .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

// Task reminder button: clock in against a task and show its checklist.

async fn handle_task_start(
    ctx: &BotContext,
    callback: &CallbackQuery,
    message: &Message,
    payload: &str,
) -> Result<()> {
    let Some(volunteer) = linked_volunteer(ctx, callback, message).await? else {
        return Ok(());
    };

    let Ok(task_id) = payload.parse::<Uuid>() else {
        warn!("Invalid task id in task_start callback: {}", payload);
        return Ok(());
    };

    let Some(task) = task_repo::get_task_by_id(&ctx.pool, task_id).await? else {
        ctx.api
            .edit_message_text(
                message.chat.id,
                message.message_id,
                "❌ Attività non trovata.",
                None,
            )
            .await?;
        return Ok(());
    };

    if !task_repo::is_assigned(&ctx.pool, task.id, &volunteer.fiscal_code).await? {
        ctx.api
            .edit_message_text(
                message.chat.id,
                message.message_id,
                "❌ Non sei assegnato a questa attività.",
                None,
            )
            .await?;
        return Ok(());
    }

    match time_entry_repo::clock_in(
        &ctx.pool,
        &volunteer.fiscal_code,
        Utc::now(),
        LinkTarget::Task(task.id),
    )
    .await
    {
        Ok(entry) => {
            ctx.api
                .edit_message_text(
                    message.chat.id,
                    message.message_id,
                    &format!(
                        "✅ Entrata registrata alle {} per \"{}\".",
                        format_time(entry.clock_in),
                        task.name
                    ),
                    None,
                )
                .await?;

            let (text, keyboard) = checklist::build_checklist_message(&ctx.pool, &task).await?;
            ctx.api
                .send_message(message.chat.id, &text, keyboard)
                .await?;
            info!(
                "Clock-in via task button: {} for task {}",
                volunteer.fiscal_code, task.name
            );
        }
        Err(GestError::AlreadyClockedIn(since)) => {
            ctx.api
                .edit_message_text(
                    message.chat.id,
                    message.message_id,
                    &format!(
                        "⚠️ Hai già un'entrata aperta dalle {}.\n\
                         Usa /uscita prima di iniziare.",
                        format_datetime(since)
                    ),
                    None,
                )
                .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

// Checklist item button.

async fn handle_checklist_toggle(
    ctx: &BotContext,
    callback: &CallbackQuery,
    message: &Message,
    payload: &str,
) -> Result<()> {
    let account = telegram_repo::get_account(&ctx.pool, callback.from.id).await?;
    let Some(fiscal_code) = account.and_then(|a| a.volunteer_fiscal_code) else {
        ctx.api
            .answer_callback_query(
                &callback.id,
                Some("Non sei registrato. Usa /start nel bot.".to_string()),
            )
            .await
            .ok();
        return Ok(());
    };

    let Ok(item_id) = payload.parse::<Uuid>() else {
        warn!("Invalid checklist item id in callback: {}", payload);
        return Ok(());
    };

    let Some(item) = task_repo::get_checklist_item(&ctx.pool, item_id).await? else {
        return Ok(());
    };
    let Some(task) = task_repo::get_task_by_id(&ctx.pool, item.task_id).await? else {
        return Ok(());
    };

    if !task_repo::is_assigned(&ctx.pool, task.id, &fiscal_code).await? {
        // Visible toast instead of a silent drop, so a tap from the
        // wrong account is not mistaken for a dead button.
        ctx.api
            .answer_callback_query(
                &callback.id,
                Some("Non sei assegnato a questa attività.".to_string()),
            )
            .await
            .ok();
        return Ok(());
    }

    // First completer wins; a second tap just refreshes the view.
    task_repo::complete_item(&ctx.pool, item.id, &fiscal_code, Utc::now()).await?;

    let (text, keyboard) = checklist::build_checklist_message(&ctx.pool, &task).await?;
    if let Err(e) = ctx
        .api
        .edit_message_text(message.chat.id, message.message_id, &text, keyboard)
        .await
    {
        // Unchanged content makes Telegram reject the edit; harmless.
        warn!("Checklist edit failed: {}", e);
    }

    if task_repo::pending_item_count(&ctx.pool, task.id).await? == 0 {
        complete_task(ctx, task.id).await?;
    }

    Ok(())
}

/// All items done: latch the task completed, close its open entries and
/// tell the staff.
async fn complete_task(ctx: &BotContext, task_id: Uuid) -> Result<()> {
    let Some((task, closed)) =
        task_repo::complete_task(&ctx.pool, task_id, Utc::now()).await?
    else {
        return Ok(());
    };

    info!(
        "Task {} completed, {} open entries force-closed",
        task.name, closed
    );

    let staff = telegram_repo::list_staff_accounts(&ctx.pool).await?;
    for account in staff {
        if let Err(e) = ctx
            .api
            .send_message(
                account.chat_id,
                &format!(
                    "Attività completata!\n\n\
                     {}\n\
                     Tutti gli elementi della checklist sono stati completati.\n\
                     Le timbrature aperte sono state chiuse automaticamente.",
                    task.name
                ),
                None,
            )
            .await
        {
            error!("Failed to notify staff {}: {}", account.telegram_id, e);
        }
    }

    Ok(())
}

// Web login approval.

fn status_label(status: WebLoginStatus) -> &'static str {
    match status {
        WebLoginStatus::Pending => "In attesa",
        WebLoginStatus::Approved => "Approvata",
        WebLoginStatus::Denied => "Rifiutata",
        WebLoginStatus::Expired => "Scaduta",
    }
}

async fn handle_web_login(ctx: &BotContext, message: &Message, payload: &str) -> Result<()> {
    let Some((action, token)) = payload.split_once(':') else {
        warn!("Malformed web_login callback: {}", payload);
        return Ok(());
    };

    let Some(request) = auth_repo::get_web_login_request(&ctx.pool, token).await? else {
        ctx.api
            .edit_message_text(
                message.chat.id,
                message.message_id,
                "❌ Richiesta non trovata o già elaborata.",
                None,
            )
            .await?;
        return Ok(());
    };

    let now = Utc::now();

    let Some(model) = request.to_model() else {
        warn!("Web login request {} has unknown status {}", token, request.status);
        return Ok(());
    };

    if model.status != WebLoginStatus::Pending {
        ctx.api
            .edit_message_text(
                message.chat.id,
                message.message_id,
                &format!(
                    "Questa richiesta è già stata elaborata: {}",
                    status_label(model.status)
                ),
                None,
            )
            .await?;
        return Ok(());
    }

    if model.is_expired(now) {
        auth_repo::resolve_web_login_request(&ctx.pool, token, WebLoginStatus::Expired, now)
            .await?;
        ctx.api
            .edit_message_text(
                message.chat.id,
                message.message_id,
                "⏱️ Richiesta scaduta.",
                None,
            )
            .await?;
        return Ok(());
    }

    let volunteer =
        volunteer_repo::get_volunteer_by_fiscal_code(&ctx.pool, &request.volunteer_fiscal_code)
            .await?;
    let full_name = volunteer
        .map(|v| v.full_name())
        .unwrap_or_else(|| request.volunteer_fiscal_code.clone());

    match action {
        "approve" => {
            auth_repo::resolve_web_login_request(&ctx.pool, token, WebLoginStatus::Approved, now)
                .await?;
            ctx.api
                .edit_message_text(
                    message.chat.id,
                    message.message_id,
                    &format!(
                        "✅ Accesso approvato per {full_name}.\n\n\
                         La sessione web è ora attiva."
                    ),
                    None,
                )
                .await?;
        }
        "deny" => {
            auth_repo::resolve_web_login_request(&ctx.pool, token, WebLoginStatus::Denied, now)
                .await?;
            ctx.api
                .edit_message_text(
                    message.chat.id,
                    message.message_id,
                    "❌ Accesso rifiutato.\n\n\
                     Se non hai richiesto tu l'accesso, qualcuno potrebbe aver \
                     tentato di accedere con il tuo codice fiscale.",
                    None,
                )
                .await?;
        }
        _ => warn!("Unknown web_login action: {}", action),
    }

    Ok(())
}
