//! Periodic sweeps: poll closing, service reminders, task reminders.
//!
//! Every sweep selects "due and not yet latched" rows, so a delayed run
//! still picks its work up, and the per-entity latches keep external
//! side effects at-most-once. A failure on one row never aborts the
//! rest of the batch.

use chrono::{Duration, Utc};
use eyre::Result;
use gestipc_db::models::{DbScheduledTask, DbService};
use gestipc_db::repositories::{service as service_repo, task as task_repo, telegram as telegram_repo};
use gestipc_telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use std::time::Duration as StdDuration;
use tracing::{debug, error, info};

use crate::handlers::BotContext;
use crate::handlers::commands::format_datetime;

/// Polls stop this far ahead of the service start.
const POLL_CLOSE_LEAD_HOURS: i64 = 12;

/// Reminders go out when a service starts within this window.
const SERVICE_REMINDER_MINUTES: i64 = 31;

/// Task reminders go out when the deadline is within this window.
const TASK_REMINDER_HOURS: i64 = 48;

const SERVICE_SWEEP_SECS: u64 = 60;
const POLL_SWEEP_SECS: u64 = 300;
const TASK_SWEEP_SECS: u64 = 60;

/// Spawn the three sweep loops for the lifetime of the process.
pub fn spawn_sweeps(ctx: &BotContext) {
    let reminder_ctx = ctx.clone();
    tokio::spawn(async move {
        let mut ticker = sweep_ticker(SERVICE_SWEEP_SECS);
        loop {
            ticker.tick().await;
            if let Err(e) = send_service_reminders(&reminder_ctx).await {
                error!("Service reminder sweep failed: {:?}", e);
            }
        }
    });

    let poll_ctx = ctx.clone();
    tokio::spawn(async move {
        let mut ticker = sweep_ticker(POLL_SWEEP_SECS);
        loop {
            ticker.tick().await;
            if let Err(e) = close_expiring_polls(&poll_ctx).await {
                error!("Poll closing sweep failed: {:?}", e);
            }
        }
    });

    let task_ctx = ctx.clone();
    tokio::spawn(async move {
        let mut ticker = sweep_ticker(TASK_SWEEP_SECS);
        loop {
            ticker.tick().await;
            if let Err(e) = send_task_reminders(&task_ctx).await {
                error!("Task reminder sweep failed: {:?}", e);
            }
        }
    });
}

fn sweep_ticker(period_secs: u64) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(StdDuration::from_secs(period_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker
}

/// Stop polls of services starting within the lead window.
pub async fn close_expiring_polls(ctx: &BotContext) -> Result<()> {
    let cutoff = Utc::now() + Duration::hours(POLL_CLOSE_LEAD_HOURS);
    let services = service_repo::list_closable_polls(&ctx.pool, cutoff).await?;

    let Some(chat_id) = ctx.config.survey_chat_id else {
        if !services.is_empty() {
            debug!("Survey chat not configured, cannot close {} polls", services.len());
        }
        return Ok(());
    };

    for service in services {
        let Some(message_id) = service.poll_message_id else {
            continue;
        };

        match ctx.api.stop_poll(chat_id, message_id).await {
            Ok(_) => info!("Closed poll for service {} ({})", service.id, service.name),
            Err(e) => error!("Failed to close poll for service {}: {}", service.id, e),
        }

        // Latch regardless: a poll Telegram refuses to stop (deleted
        // message, already closed) should not be retried forever.
        service_repo::mark_poll_closed(&ctx.pool, service.id).await?;
    }

    Ok(())
}

/// Remind everyone who did not decline a service starting soon, with a
/// clock-in button.
pub async fn send_service_reminders(ctx: &BotContext) -> Result<()> {
    let now = Utc::now();
    let until = now + Duration::minutes(SERVICE_REMINDER_MINUTES);
    let services = service_repo::list_due_reminders(&ctx.pool, now, until).await?;

    for service in services {
        if let Err(e) = remind_service(ctx, &service).await {
            error!("Failed reminder batch for service {}: {:?}", service.id, e);
            // Latch not set; the next sweep retries this service.
        }
    }

    Ok(())
}

async fn remind_service(ctx: &BotContext, service: &DbService) -> Result<()> {
    let participants = service_repo::list_participants(&ctx.pool, service.id).await?;

    for entry in participants {
        let account =
            telegram_repo::get_account_by_volunteer(&ctx.pool, &entry.volunteer_fiscal_code)
                .await?;
        let Some(account) = account else {
            debug!("No telegram account for volunteer {}", entry.volunteer_fiscal_code);
            continue;
        };

        let answer_text = entry
            .answer()
            .map(|a| a.display().to_string())
            .unwrap_or_else(|| "non data".to_string());
        let keyboard = InlineKeyboardMarkup::single_column(vec![InlineKeyboardButton::callback(
            "✅ Registra entrata",
            format!("clock_in:{}", service.id),
        )]);

        let text = format!(
            "⏰ Promemoria!\n\n\
             Il servizio \"{}\" inizia tra 30 minuti.\n\
             📅 {}\n\n\
             La tua risposta: {}",
            service.name,
            format_datetime(service.starts_at),
            answer_text
        );

        if let Err(e) = ctx
            .api
            .send_message(account.chat_id, &text, Some(keyboard))
            .await
        {
            error!("Failed to send reminder to {}: {}", account.telegram_id, e);
        }
    }

    service_repo::mark_notification_sent(&ctx.pool, service.id).await?;
    info!("Marked service {} as notified", service.id);

    Ok(())
}

/// Remind assignees of tasks approaching their deadline, with a
/// start-task button.
pub async fn send_task_reminders(ctx: &BotContext) -> Result<()> {
    let now = Utc::now();
    let until = now + Duration::hours(TASK_REMINDER_HOURS);
    let tasks = task_repo::list_due_reminders(&ctx.pool, now, until).await?;

    for task in tasks {
        if let Err(e) = remind_task(ctx, &task).await {
            error!("Failed reminder batch for task {}: {:?}", task.id, e);
        }
    }

    Ok(())
}

async fn remind_task(ctx: &BotContext, task: &DbScheduledTask) -> Result<()> {
    let assignees = task_repo::list_assignees(&ctx.pool, task.id).await?;

    for fiscal_code in assignees {
        let account =
            telegram_repo::get_account_by_volunteer(&ctx.pool, &fiscal_code).await?;
        let Some(account) = account else {
            continue;
        };

        let keyboard = InlineKeyboardMarkup::single_column(vec![InlineKeyboardButton::callback(
            "Inizia Timbratura",
            format!("task_start:{}", task.id),
        )]);

        let text = format!(
            "Attività programmata in scadenza!\n\n\
             {}\n\
             Scadenza: {}\n\n\
             Premi il pulsante per registrare la tua entrata e visualizzare \
             la checklist.",
            task.name,
            format_datetime(task.deadline)
        );

        if let Err(e) = ctx
            .api
            .send_message(account.chat_id, &text, Some(keyboard))
            .await
        {
            error!("Failed to send task reminder to {}: {}", account.telegram_id, e);
        }
    }

    task_repo::mark_notification_sent(&ctx.pool, task.id).await?;
    info!("Sent reminders for scheduled task {} ({})", task.id, task.name);

    Ok(())
}
