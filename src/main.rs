use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use teloxide::update_listeners::Polling;

use rethumb::cli::{Cli, Commands};
use rethumb::core::web_server::{health_router, start_health_server};
use rethumb::core::{config, init_logger, log_configuration, SessionStore};
use rethumb::download::ReuploadPipeline;
use rethumb::storage::ThumbnailStore;
use rethumb::telegram::{
    create_bot, schema, setup_bot_commands, Flow, FlowConfig, HandlerDeps, TelegramTransport, Transport,
};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, thumbnail file, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up global panic handler so panics inside handlers end up in the log file
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Load environment variables from .env if present (before any config static is read)
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run { webhook }) => {
            log::info!("Running bot in normal mode (webhook: {})", webhook);
            run_bot(webhook).await
        }
        Some(Commands::Thumbnails) => print_thumbnails().await,
        None => {
            // No command specified - default to running the bot
            log::info!("No command specified, running bot in default mode");
            run_bot(false).await
        }
    }
}

/// Prints the stored user → thumbnail mapping
async fn print_thumbnails() -> Result<()> {
    let store = ThumbnailStore::load(config::THUMBNAILS_PATH.as_str()).await?;

    println!("🖼️  {} thumbnail(s) in {}", store.len().await, store.path().display());
    for (user, thumbnail) in store.entries().await {
        println!("{:>14}  {}", user, thumbnail);
    }
    Ok(())
}

async fn run_bot(use_webhook: bool) -> Result<()> {
    let bot_init_start = std::time::Instant::now();
    log::info!("Starting bot...");
    log_configuration();

    let bot = create_bot()?;

    let thumbnails = Arc::new(ThumbnailStore::load(config::THUMBNAILS_PATH.as_str()).await?);
    let sessions = Arc::new(SessionStore::new(config::session::timeout()));
    let transport: Arc<dyn Transport> = Arc::new(TelegramTransport::new(bot.clone()));
    let pipeline = ReuploadPipeline::new(Arc::clone(&transport), config::TEMP_FILES_DIR.as_str());
    let flow = Flow::new(transport, thumbnails, sessions, pipeline, FlowConfig::from_env());

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let handler = schema(HandlerDeps::new(Arc::new(flow)));
    let addr = SocketAddr::from(([0, 0, 0, 0], *config::PORT));

    // Check if webhook mode is enabled
    let webhook_url = if use_webhook { config::WEBHOOK_URL.clone() } else { None };
    if use_webhook && webhook_url.is_none() {
        log::warn!("--webhook given but WEBHOOK_URL is not set, falling back to long polling");
    }

    if let Some(url) = webhook_url {
        // Webhook mode: teloxide's router and /health share one listener
        let url = url::Url::parse(&url)?;
        log::info!("Starting bot in webhook mode at {}", url);

        let (listener, stop_flag, router) = webhooks::axum_to_router(bot.clone(), webhooks::Options::new(addr, url))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to set webhook: {}", e))?;
        let app = router.merge(health_router());

        let tcp = tokio::net::TcpListener::bind(addr).await?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await {
                log::error!("Webhook server error: {}", e);
            }
        });

        log::info!("🎉 Bot initialization complete in {:.2}s", bot_init_start.elapsed().as_secs_f64());

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    } else {
        // Long polling mode (default)
        tokio::spawn(async move {
            if let Err(e) = start_health_server(addr.port()).await {
                log::error!("Health server error: {}", e);
            }
        });

        log::info!("Starting bot in long polling mode");
        log::info!("🎉 Bot initialization complete in {:.2}s", bot_init_start.elapsed().as_secs_f64());

        // Create polling listener that drops pending updates on start
        let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    }

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
