use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use channel_video_relay::backfill::{BackfillConfig, HistoryBackfiller};
use channel_video_relay::config::Config;
use channel_video_relay::constants::ALLOWED_UPDATES;
use channel_video_relay::delivery::DeliveryClient;
use channel_video_relay::listener::{listen_loop, start_listening};
use channel_video_relay::pipeline::Pipeline;
use channel_video_relay::router::LiveEventRouter;
use channel_video_relay::telegram::TelegramClient;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting channel-video-relay");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        channel_id = ?config.channel_id,
        fallback_chat_id = config.fallback_chat_id,
        backend_url = %config.backend_url,
        allowed_updates = ?ALLOWED_UPDATES,
        forward_require_target_channel = config.forward_require_target_channel,
        "Configuration loaded"
    );
    if !config.forward_require_target_channel {
        info!("Forwarded videos are accepted from any chat");
    }

    let telegram = TelegramClient::new(&config).context("Failed to build Telegram client")?;
    let delivery = DeliveryClient::new(&config).context("Failed to build backend client")?;
    let pipeline = Pipeline::new(delivery);

    // Handlers are ready before any update is received.
    let router = LiveEventRouter::new(telegram.clone(), pipeline.clone(), &config);

    if let Err(e) = start_listening(&telegram).await {
        error!("Failed to start listener: {e}");
        error!("Check that:");
        error!("  1. BOT_TOKEN is correct");
        error!("  2. The bot is an administrator of the channel");
        error!("  3. The bot is allowed to read messages");
        error!("  4. The network connection works");
        error!("  5. The Telegram Bot API is reachable");
        return Err(e).context("Failed to start listening");
    }

    let listen_handle = tokio::spawn(listen_loop(
        telegram.clone(),
        router,
        config.live_poll_timeout,
    ));

    let backfill_handle = if config.backfill_enabled {
        let backfiller = HistoryBackfiller::new(telegram, pipeline, BackfillConfig::from(&config));
        Some(tokio::spawn(async move {
            let summary = backfiller.run().await;
            if summary.aborted.is_some() {
                warn!("History backfill incomplete; continuing with live updates only");
            }
            info!("Fully started, listening for new channel posts");
        }))
    } else {
        info!("History backfill disabled; listening for new channel posts");
        None
    };

    shutdown_signal().await;

    info!("Shutting down...");

    listen_handle.abort();
    if let Some(handle) = backfill_handle {
        handle.abort();
    }

    info!("Shutdown complete");

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,channel_video_relay=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
