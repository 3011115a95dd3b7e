use eyre::Result;
use gestipc_db::DbPool;
use gestipc_telegram::types::BotCommand;
use gestipc_telegram::{BotApi, TelegramApi};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub mod checklist;
pub mod config;
pub mod handlers;
pub mod jobs;
pub mod session;

use handlers::BotContext;
use session::SessionStore;

/// How long a getUpdates call blocks server-side.
const LONG_POLL_SECS: u64 = 30;

/// Start the Telegram bot: register the command menu, spawn the
/// periodic sweeps and run the long-polling update loop until the
/// process is stopped.
pub async fn start_bot(config: config::BotConfig, pool: DbPool) -> Result<()> {
    info!("Starting Telegram bot");

    let api: Arc<dyn TelegramApi> = Arc::new(BotApi::new(&config.token));
    let ctx = BotContext {
        api,
        pool,
        config,
        sessions: SessionStore::new(),
    };

    if let Err(e) = ctx.api.set_my_commands(command_menu()).await {
        warn!("Failed to register command menu: {}", e);
    }

    jobs::spawn_sweeps(&ctx);

    info!("Connecting to Telegram...");
    run_update_loop(ctx).await
}

/// The commands shown in the Telegram menu.
fn command_menu() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Avvia il bot"),
        BotCommand::new("help", "Mostra i comandi disponibili"),
        BotCommand::new("profilo", "Visualizza il tuo profilo"),
        BotCommand::new("entrata", "Registra entrata"),
        BotCommand::new("uscita", "Registra uscita"),
        BotCommand::new("ore", "Riepilogo ore del mese"),
        BotCommand::new("nuovoservizio", "Crea un nuovo servizio"),
        BotCommand::new("login", "Ottieni link di accesso al sito"),
    ]
}

async fn run_update_loop(ctx: BotContext) -> Result<()> {
    let mut offset: Option<i64> = None;

    loop {
        let updates = match ctx.api.get_updates(offset, LONG_POLL_SECS).await {
            Ok(updates) => updates,
            Err(e) => {
                error!("getUpdates failed: {}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            if let Err(e) = handlers::dispatch_update(&ctx, update).await {
                // A failing handler must not take the loop down.
                error!("Error handling update: {:?}", e);
            }
        }
    }
}
