use finsight::{bot, config, errors::Result};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    // 3. Load ledger settings
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;
    info!(
        reporting_currency = %app_config.reporting_currency,
        rates = app_config.rates.len(),
        "Loaded configuration"
    );

    // 4. Connect and make sure every table exists
    let database = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&database)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;

    // 5. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))?;

    bot::run_bot(token, database, app_config).await
}
