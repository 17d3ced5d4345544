//! # Main Entry Point
//!
//! Initializes the application:
//! - Domain: Configuration and Types
//! - Infrastructure: VK transport, Catalog client, Error recorder
//! - Application: Store, Router, Dispatcher, Poll loop, Control surface

mod application;
mod domain;
mod infrastructure;
mod strings;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use crate::application::control::BotControl;
use crate::application::dispatcher::EventDispatcher;
use crate::application::poll_loop::PollLoop;
use crate::application::router::IntentRouter;
use crate::application::store::ConversationStore;
use crate::domain::config::AppConfig;
use crate::infrastructure::catalog::CatalogClient;
use crate::infrastructure::error_log::ErrorRecorder;
use crate::infrastructure::vk::VkClient;

/// How many recent errors the in-memory recorder keeps for diagnostics.
const ERROR_RING_CAPACITY: usize = 256;

#[derive(Parser)]
#[command(name = "aquabot", about = "VK ticket bot for the YES aquapark")]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "data/config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // 1. Load Configuration
    let config = AppConfig::load(&args.config).context("Failed to load configuration")?;

    // 2. Logging Setup
    if !std::path::Path::new("data").exists() {
        fs::create_dir("data").context("Failed to create data directory")?;
    }

    let file_appender = tracing_appender::rolling::never("data", "bot.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper=warn,reqwest=warn"));

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .init();

    tracing::info!("Starting aquabot...");

    // 3. Initialize Infrastructure
    let errors = Arc::new(ErrorRecorder::new(ERROR_RING_CAPACITY));
    let vk = Arc::new(VkClient::new(config.vk.clone()));
    let catalog = Arc::new(CatalogClient::new(config.catalog.clone()));

    // 4. Initialize Application Components
    let store = Arc::new(ConversationStore::new());
    let control = Arc::new(BotControl::new(args.config.clone(), config.commands.clone()));
    let router = IntentRouter::new(
        store.clone(),
        catalog,
        control.clone(),
        errors.clone(),
        config.tickets.clone(),
    );
    let dispatcher = EventDispatcher::new(router, vk.clone(), store.clone(), errors.clone());
    let poll_loop = PollLoop::new(&config, vk, dispatcher, control, errors);

    // 5. Shutdown Handling
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_cancel.cancel();
        }
    });

    // 6. Run the Event Loop
    poll_loop.run(cancel).await?;

    Ok(())
}
