use color_eyre::eyre::Result;
use dotenv::dotenv;
use gestipc_bot::config::BotConfig;
use gestipc_db::{create_pool, schema::initialize_database};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting gestipc Telegram bot");

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = BotConfig::from_env()?;

    // Create database connection pool
    let db_pool = create_pool(&config.database_url).await?;

    // Initialize database schema
    initialize_database(&db_pool).await?;

    // Start the Telegram bot
    match gestipc_bot::start_bot(config, db_pool).await {
        Ok(_) => info!("Telegram bot shut down gracefully"),
        Err(e) => error!("Telegram bot error: {}", e),
    }

    Ok(())
}
