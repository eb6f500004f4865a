//! Radmin Bot - Main Entry Point
//!
//! A Telegram bot that answers slash commands, including shell execution
//! for allow-listed admins.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use radmin_bot::Bot;
use radmin_bot::config::{BotIdentity, BotSettings};
use radmin_bot::telegram::{BotApi, Transport};

/// Telegram bot for remote server administration.
#[derive(Parser, Debug)]
#[command(name = "radmin_bot")]
#[command(about = "Answer Telegram slash commands, including admin-only shell access")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let identity =
        BotIdentity::from_env().context("Failed to load bot identity from environment")?;
    let settings = BotSettings::from_env_with_defaults();

    if identity.admins().is_empty() {
        warn!("ADMINS is empty: every admin-only command will be denied");
    } else {
        info!("Admins: {}", identity.admins().len());
    }

    let transport: Arc<dyn Transport> =
        Arc::new(BotApi::with_base_url(identity.token(), &settings.api_url));

    let bot = Bot::new(identity, settings).context("Failed to register bot commands")?;
    info!(
        "Registered {} commands (prefix: {})",
        bot.registry().len(),
        bot.settings().command_prefix
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut poller = bot.poller(transport);

    let poller_handle = tokio::spawn(async move { poller.run(stop_rx).await });

    info!("Bot is running. Use Ctrl+C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Received Ctrl+C, shutting down...");

    // The poller finishes the batch it is dispatching before it stops.
    let _ = stop_tx.send(true);
    let stats = poller_handle.await.context("Poller task panicked")?;

    info!(
        "Stopped after {} messages ({} transport failures)",
        stats.messages, stats.transport_failures
    );
    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
