use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Europe::Rome;
use eyre::Result;
use gestipc_core::errors::GestError;
use gestipc_core::models::time_entry::LinkTarget;
use gestipc_core::models::volunteer::normalize_fiscal_code;
use gestipc_db::repositories::{
    auth as auth_repo, service as service_repo, telegram as telegram_repo,
    time_entry as time_entry_repo, volunteer as volunteer_repo,
};
use gestipc_telegram::availability;
use gestipc_telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup, Message, User};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::handlers::BotContext;
use crate::session::ConversationState;

/// Render a UTC instant as local Italian wall-clock time.
pub(crate) fn format_time(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Rome).format("%H:%M").to_string()
}

pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Rome).format("%d/%m/%Y %H:%M").to_string()
}

pub async fn handle_command(
    ctx: &BotContext,
    command: &str,
    message: &Message,
    user: &User,
) -> Result<()> {
    match command {
        "start" => start(ctx, message, user).await,
        "help" => help(ctx, message, user).await,
        "profilo" => profile(ctx, message, user).await,
        "entrata" => clock_in(ctx, message, user).await,
        "uscita" => clock_out(ctx, message, user).await,
        "ore" => hours_summary(ctx, message, user).await,
        "login" => login(ctx, message, user).await,
        "nuovoservizio" => new_service(ctx, message, user).await,
        "annulla" | "cancel" => cancel(ctx, message).await,
        _ => {
            debug!("Unknown command: {}", command);
            Ok(())
        }
    }
}

pub async fn handle_conversation_text(
    ctx: &BotContext,
    message: &Message,
    user: &User,
    text: &str,
) -> Result<()> {
    let Some(state) = ctx.sessions.get(message.chat.id).await else {
        return Ok(());
    };

    match state {
        ConversationState::AwaitingFiscalCode => handle_fiscal_code(ctx, message, user, text).await,
        ConversationState::AwaitingNewTypeName => handle_new_type_name(ctx, message, text).await,
        ConversationState::AwaitingServiceName { type_id } => {
            handle_service_name(ctx, message, type_id, text).await
        }
        ConversationState::AwaitingServiceDate { type_id, name } => {
            handle_service_date(ctx, message, type_id, name, text).await
        }
        ConversationState::AwaitingServiceTime {
            type_id,
            name,
            date,
        } => handle_service_time(ctx, message, type_id, name, date, text).await,
        // Type selection happens via the inline keyboard, not free text.
        ConversationState::AwaitingServiceType => Ok(()),
    }
}

// Registration

async fn start(ctx: &BotContext, message: &Message, user: &User) -> Result<()> {
    let account = telegram_repo::upsert_account(
        &ctx.pool,
        user.id,
        message.chat.id,
        user.username.as_deref(),
        user.first_name.as_deref(),
        user.last_name.as_deref(),
    )
    .await?;

    if let Some(fiscal_code) = &account.volunteer_fiscal_code {
        let volunteer =
            volunteer_repo::get_volunteer_by_fiscal_code(&ctx.pool, fiscal_code).await?;
        let name = volunteer
            .map(|v| v.first_name)
            .unwrap_or_else(|| "volontario".to_string());

        ctx.api
            .send_message(
                message.chat.id,
                &format!(
                    "Bentornato, {name}! 👋\n\n\
                     Il tuo account è già associato.\n\
                     Usa /help per vedere i comandi disponibili."
                ),
                None,
            )
            .await?;
        return Ok(());
    }

    let name = user.first_name.as_deref().unwrap_or("volontario");
    ctx.api
        .send_message(
            message.chat.id,
            &format!(
                "Ciao {name}! 👋\n\n\
                 Benvenuto nel bot di gestione volontari.\n\n\
                 Per associare il tuo account Telegram al tuo profilo volontario, \
                 inserisci il tuo codice fiscale:"
            ),
            None,
        )
        .await?;
    ctx.sessions
        .set(message.chat.id, ConversationState::AwaitingFiscalCode)
        .await;

    Ok(())
}

async fn handle_fiscal_code(
    ctx: &BotContext,
    message: &Message,
    user: &User,
    text: &str,
) -> Result<()> {
    let fiscal_code = match normalize_fiscal_code(text) {
        Ok(code) => code,
        Err(_) => {
            ctx.api
                .send_message(
                    message.chat.id,
                    "❌ Il codice fiscale deve essere di 16 caratteri.\n\
                     Riprova o usa /annulla per annullare.",
                    None,
                )
                .await?;
            return Ok(());
        }
    };

    let Some(volunteer) =
        volunteer_repo::get_volunteer_by_fiscal_code(&ctx.pool, &fiscal_code).await?
    else {
        ctx.api
            .send_message(
                message.chat.id,
                "❌ Codice fiscale non trovato nel sistema.\n\n\
                 Verifica di aver inserito il codice correttamente o contatta \
                 l'amministratore se non sei ancora registrato.\n\n\
                 Riprova o usa /annulla per annullare.",
                None,
            )
            .await?;
        return Ok(());
    };

    match telegram_repo::link_account(&ctx.pool, user.id, &fiscal_code).await {
        Ok(_) => {}
        Err(GestError::Validation(_)) => {
            ctx.api
                .send_message(
                    message.chat.id,
                    "❌ Questo volontario è già associato ad un altro account Telegram.\n\n\
                     Se pensi sia un errore, contatta l'amministratore.",
                    None,
                )
                .await?;
            ctx.sessions.clear(message.chat.id).await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let org_name = match volunteer.organization_id {
        Some(org_id) => volunteer_repo::get_organization_by_id(&ctx.pool, org_id)
            .await?
            .map(|o| o.name),
        None => None,
    };

    ctx.api
        .send_message(
            message.chat.id,
            &format!(
                "✅ Associazione completata!\n\n\
                 Benvenuto, {} {}!\n\
                 Organizzazione: {}\n\n\
                 Usa /help per vedere i comandi disponibili.",
                volunteer.first_name,
                volunteer.last_name,
                org_name.as_deref().unwrap_or("Non assegnata")
            ),
            None,
        )
        .await?;
    ctx.sessions.clear(message.chat.id).await;

    Ok(())
}

async fn cancel(ctx: &BotContext, message: &Message) -> Result<()> {
    ctx.sessions.clear(message.chat.id).await;
    ctx.api
        .send_message(
            message.chat.id,
            "Operazione annullata.\nUsa /start per ricominciare.",
            None,
        )
        .await?;
    Ok(())
}

// Informational commands

async fn help(ctx: &BotContext, message: &Message, user: &User) -> Result<()> {
    let account = telegram_repo::get_account(&ctx.pool, user.id).await?;
    let linked = account.map(|a| a.is_linked()).unwrap_or(false);

    let text = if linked {
        "📋 Comandi disponibili:\n\n\
         /start - Avvia il bot\n\
         /profilo - Visualizza il tuo profilo\n\
         /entrata - Registra entrata\n\
         /uscita - Registra uscita\n\
         /ore - Riepilogo ore del mese\n\
         /nuovoservizio - Crea un nuovo servizio\n\
         /login - Ottieni link di accesso al sito\n\
         /help - Mostra questo messaggio"
    } else {
        "📋 Comandi disponibili:\n\n\
         /start - Avvia il bot e associa il tuo account\n\
         /help - Mostra questo messaggio"
    };

    ctx.api.send_message(message.chat.id, text, None).await?;
    Ok(())
}

async fn profile(ctx: &BotContext, message: &Message, user: &User) -> Result<()> {
    let Some(volunteer) = ctx.linked_volunteer(message.chat.id, user).await? else {
        return Ok(());
    };

    let org_name = match volunteer.organization_id {
        Some(org_id) => volunteer_repo::get_organization_by_id(&ctx.pool, org_id)
            .await?
            .map(|o| o.name),
        None => None,
    };

    ctx.api
        .send_message(
            message.chat.id,
            &format!(
                "👤 Il tuo profilo:\n\n\
                 Nome: {} {}\n\
                 Codice Fiscale: {}\n\
                 Organizzazione: {}",
                volunteer.first_name,
                volunteer.last_name,
                volunteer.fiscal_code,
                org_name.as_deref().unwrap_or("Non assegnata")
            ),
            None,
        )
        .await?;
    Ok(())
}

// Time tracking

async fn clock_in(ctx: &BotContext, message: &Message, user: &User) -> Result<()> {
    let Some(volunteer) = ctx.linked_volunteer(message.chat.id, user).await? else {
        return Ok(());
    };

    match time_entry_repo::clock_in(
        &ctx.pool,
        &volunteer.fiscal_code,
        Utc::now(),
        LinkTarget::None,
    )
    .await
    {
        Ok(entry) => {
            ctx.api
                .send_message(
                    message.chat.id,
                    &format!(
                        "✅ Entrata registrata alle {}.\n\n\
                         Buon lavoro! Usa /uscita quando hai finito.",
                        format_time(entry.clock_in)
                    ),
                    None,
                )
                .await?;
        }
        Err(GestError::AlreadyClockedIn(since)) => {
            ctx.api
                .send_message(
                    message.chat.id,
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

async fn clock_out(ctx: &BotContext, message: &Message, user: &User) -> Result<()> {
    let Some(volunteer) = ctx.linked_volunteer(message.chat.id, user).await? else {
        return Ok(());
    };

    match time_entry_repo::clock_out(&ctx.pool, &volunteer.fiscal_code, Utc::now()).await {
        Ok(entry) => {
            let minutes = entry.duration_minutes().unwrap_or(0.0) as i64;

            ctx.api
                .send_message(
                    message.chat.id,
                    &format!(
                        "✅ Uscita registrata alle {}.\n\n\
                         Durata: {}h {}m\n\
                         Grazie per il tuo servizio!",
                        format_time(entry.clock_out.unwrap_or_else(Utc::now)),
                        minutes / 60,
                        minutes % 60
                    ),
                    None,
                )
                .await?;
        }
        Err(GestError::NoOpenEntry) => {
            ctx.api
                .send_message(
                    message.chat.id,
                    "❌ Non hai nessuna entrata aperta.\n\n\
                     Usa /entrata per registrare un'entrata.",
                    None,
                )
                .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Start and end of the month containing `now`.
pub(crate) fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    let end = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    (start, end)
}

async fn hours_summary(ctx: &BotContext, message: &Message, user: &User) -> Result<()> {
    let Some(volunteer) = ctx.linked_volunteer(message.chat.id, user).await? else {
        return Ok(());
    };

    let now = Utc::now();
    let (month_start, month_end) = month_bounds(now);

    let summary = time_entry_repo::monthly_summary(
        &ctx.pool,
        &volunteer.fiscal_code,
        month_start,
        month_end,
    )
    .await?;

    let (hours, minutes) = summary.hours_and_minutes();
    let mut text = format!(
        "📊 Riepilogo ore - {}\n\n\
         Totale: {}h {}m\n\
         Sessioni completate: {}",
        now.with_timezone(&Rome).format("%B %Y"),
        hours,
        minutes,
        summary.closed_sessions
    );

    if let Some(open_since) = summary.open_since {
        text.push_str(&format!(
            "\n\n⏱️ Entrata in corso dalle {}",
            format_time(open_since)
        ));
    }

    ctx.api.send_message(message.chat.id, &text, None).await?;
    Ok(())
}

// Web access

async fn login(ctx: &BotContext, message: &Message, user: &User) -> Result<()> {
    let account = telegram_repo::get_account(&ctx.pool, user.id).await?;
    let Some(account) = account.filter(|a| a.is_linked()) else {
        ctx.api
            .send_message(
                message.chat.id,
                "❌ Il tuo account Telegram non è ancora associato.\n\
                 Usa /start per completare l'associazione.",
                None,
            )
            .await?;
        return Ok(());
    };

    let token = auth_repo::create_login_token(&ctx.pool, account.telegram_id).await?;

    ctx.api
        .send_message(
            message.chat.id,
            &format!(
                "🔐 Ecco il tuo link di accesso:\n\n\
                 {}\n\n\
                 ⚠️ Il link è valido per 10 minuti e può essere usato una sola volta.",
                ctx.config.login_url(&token.token)
            ),
            None,
        )
        .await?;
    Ok(())
}

// Service creation flow

async fn new_service(ctx: &BotContext, message: &Message, user: &User) -> Result<()> {
    let Some(_volunteer) = ctx.linked_volunteer(message.chat.id, user).await? else {
        return Ok(());
    };

    let types = service_repo::list_service_types(&ctx.pool).await?;

    let mut buttons: Vec<InlineKeyboardButton> = types
        .iter()
        .map(|t| InlineKeyboardButton::callback(t.name.clone(), format!("stype:{}", t.id)))
        .collect();
    buttons.push(InlineKeyboardButton::callback("➕ Nuovo tipo", "stype:new"));

    ctx.api
        .send_message(
            message.chat.id,
            "📋 Creazione nuovo servizio\n\nSeleziona il tipo di servizio:",
            Some(InlineKeyboardMarkup::single_column(buttons)),
        )
        .await?;
    ctx.sessions
        .set(message.chat.id, ConversationState::AwaitingServiceType)
        .await;

    Ok(())
}

async fn handle_new_type_name(ctx: &BotContext, message: &Message, text: &str) -> Result<()> {
    if text.len() < 2 {
        ctx.api
            .send_message(
                message.chat.id,
                "❌ Il nome del tipo deve essere di almeno 2 caratteri.\n\
                 Riprova o usa /annulla per annullare.",
                None,
            )
            .await?;
        return Ok(());
    }
    if text.len() > 150 {
        ctx.api
            .send_message(
                message.chat.id,
                "❌ Il nome del tipo non può superare i 150 caratteri.\n\
                 Riprova o usa /annulla per annullare.",
                None,
            )
            .await?;
        return Ok(());
    }

    let service_type = service_repo::get_or_create_service_type(&ctx.pool, text).await?;

    ctx.api
        .send_message(
            message.chat.id,
            &format!(
                "Tipo selezionato: {}\n\nInserisci il nome del servizio:",
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

async fn handle_service_name(
    ctx: &BotContext,
    message: &Message,
    type_id: Option<Uuid>,
    text: &str,
) -> Result<()> {
    if text.len() < 3 {
        ctx.api
            .send_message(
                message.chat.id,
                "❌ Il nome deve essere di almeno 3 caratteri.\n\
                 Riprova o usa /annulla per annullare.",
                None,
            )
            .await?;
        return Ok(());
    }
    if text.len() > 150 {
        ctx.api
            .send_message(
                message.chat.id,
                "❌ Il nome non può superare i 150 caratteri.\n\
                 Riprova o usa /annulla per annullare.",
                None,
            )
            .await?;
        return Ok(());
    }

    ctx.api
        .send_message(
            message.chat.id,
            &format!(
                "Nome: {text}\n\nInserisci la data del servizio (formato: GG/MM/AAAA):"
            ),
            None,
        )
        .await?;
    ctx.sessions
        .set(
            message.chat.id,
            ConversationState::AwaitingServiceDate {
                type_id,
                name: text.to_string(),
            },
        )
        .await;

    Ok(())
}

async fn handle_service_date(
    ctx: &BotContext,
    message: &Message,
    type_id: Option<Uuid>,
    name: String,
    text: &str,
) -> Result<()> {
    let Ok(date) = NaiveDate::parse_from_str(text, "%d/%m/%Y") else {
        ctx.api
            .send_message(
                message.chat.id,
                "❌ Formato data non valido.\n\
                 Usa il formato GG/MM/AAAA (es. 25/01/2026).\n\n\
                 Riprova o usa /annulla per annullare.",
                None,
            )
            .await?;
        return Ok(());
    };

    ctx.api
        .send_message(
            message.chat.id,
            &format!(
                "Data: {}\n\nInserisci l'ora del servizio (formato: HH:MM):",
                date.format("%d/%m/%Y")
            ),
            None,
        )
        .await?;
    ctx.sessions
        .set(
            message.chat.id,
            ConversationState::AwaitingServiceTime {
                type_id,
                name,
                date,
            },
        )
        .await;

    Ok(())
}

async fn handle_service_time(
    ctx: &BotContext,
    message: &Message,
    type_id: Option<Uuid>,
    name: String,
    date: NaiveDate,
    text: &str,
) -> Result<()> {
    let Ok(time) = NaiveTime::parse_from_str(text, "%H:%M") else {
        ctx.api
            .send_message(
                message.chat.id,
                "❌ Formato ora non valido.\n\
                 Usa il formato HH:MM (es. 14:30).\n\n\
                 Riprova o usa /annulla per annullare.",
                None,
            )
            .await?;
        return Ok(());
    };

    // Entered times are Italian wall-clock.
    let naive = date.and_time(time);
    let starts_at = match Rome.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            ctx.api
                .send_message(
                    message.chat.id,
                    "❌ Ora non valida per la data scelta (cambio ora legale).\n\
                     Riprova o usa /annulla per annullare.",
                    None,
                )
                .await?;
            return Ok(());
        }
    };

    let type_name = match type_id {
        Some(id) => service_repo::get_service_type_by_id(&ctx.pool, id)
            .await?
            .map(|t| t.name),
        None => None,
    };

    let service = service_repo::create_service(&ctx.pool, &name, starts_at, type_id, true).await?;
    info!("Service created via bot: {} ({})", service.name, service.id);

    // The row is committed; publishing the poll can run on its own.
    if let Err(e) = availability::send_availability_poll(
        ctx.api.as_ref(),
        &ctx.pool,
        ctx.config.survey_chat_id,
        service.id,
    )
    .await
    {
        error!("Failed to send availability poll for {}: {:?}", service.id, e);
    }

    let type_line = type_name
        .map(|t| format!("📂 {t}\n"))
        .unwrap_or_default();
    ctx.api
        .send_message(
            message.chat.id,
            &format!(
                "✅ Servizio creato!\n\n\
                 📌 {}\n\
                 {}\
                 📅 {}\n\n\
                 Il sondaggio di disponibilità è stato inviato.",
                name,
                type_line,
                format_datetime(starts_at)
            ),
            None,
        )
        .await?;
    ctx.sessions.clear(message.chat.id).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::month_bounds;
    use chrono::{TimeZone, Utc};

    #[test]
    fn month_bounds_mid_year() {
        let now = Utc.with_ymd_and_hms(2026, 1, 25, 14, 30, 0).unwrap();
        let (start, end) = month_bounds(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn month_bounds_december_rolls_over() {
        let now = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 0).unwrap();
        let (start, end) = month_bounds(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }
}
