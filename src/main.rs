use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fbdocbot::access::AccessStore;
use fbdocbot::bot::{schema, BotContext};
use fbdocbot::config::BotConfig;
use fbdocbot::db::PgInventoryStore;
use fbdocbot::dialogue::DocDialogueState;
use fbdocbot::inventory::{InMemoryInventoryStore, InventoryStore};
use fbdocbot::localization::init_localization;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;

    // Initialize logging; RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting FB Document Telegram Bot");

    init_localization(&config.default_language).context("Failed to load translations")?;

    let access = AccessStore::open(config.data_store_file.clone(), config.admin_ids.clone())?;

    let inventory: Arc<dyn InventoryStore> = match &config.database_url {
        Some(url) => {
            info!("Using Postgres inventory store");
            Arc::new(PgInventoryStore::connect(url).await?)
        }
        None => {
            info!("DATABASE_URL not set, inventory is kept in memory");
            Arc::new(InMemoryInventoryStore::new())
        }
    };

    let ctx = BotContext::new(access, inventory);

    // Initialize the bot
    let bot = Bot::new(&config.bot_token);

    info!("Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![InMemStorage::<DocDialogueState>::new(), ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
