use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;

use tubevault::cli::Cli;
use tubevault::core::config::{self, AppConfig};
use tubevault::core::{init_logger, log_startup_configuration};
use tubevault::download::ytdlp;
use tubevault::storage;
use tubevault::telegram::{create_bot, schema, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Loads configuration from the environment, wires up the storage backend
/// and handler tree, and runs the dispatcher until interrupted.
///
/// # Errors
/// Returns an error if initialization fails (logging, configuration, bot
/// creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    let mut app_config = AppConfig::from_env()?;
    if let Some(cookies) = cli.cookies {
        app_config.cookies_file = Some(cookies);
    }

    log_startup_configuration(&app_config);

    // Best effort: report the downloader version. A missing binary fails
    // per-request rather than at startup.
    ytdlp::probe_ytdlp_version(&app_config.ytdl_bin).await;

    let bot = create_bot(&app_config.bot_token)?;
    let store = storage::create_store(&app_config.storage)?;
    let deps = HandlerDeps::new(Arc::new(app_config), store);

    log::info!("Bot is running...");
    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    log::info!("Bot stopped.");

    Ok(())
}
