use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use misiones_bot::config::Config;
use misiones_bot::knowledge::KnowledgeBase;
use misiones_bot::telegram::TelegramClient;
use misiones_bot::webhook::{BotState, router};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let file_writer = config.log_dir.as_ref().map(|log_dir| {
        std::fs::create_dir_all(log_dir).ok();
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("misiones-bot.log"))
            .unwrap_or_else(|e| {
                eprintln!("Failed to open log file in {}: {e}", log_dir.display());
                std::process::exit(1);
            });
        tracing_appender::non_blocking(log_file)
    });
    let (file_writer, _guard) = match file_writer {
        Some((writer, guard)) => (Some(writer), Some(guard)),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                )
        }))
        .init();

    info!("🚀 Starting misiones-bot...");

    let knowledge = match &config.knowledge_path {
        Some(path) => match KnowledgeBase::load(path) {
            Ok(kb) => {
                info!("Loaded knowledge base from {}", path.display());
                kb
            }
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        },
        None => {
            info!("Using built-in knowledge base");
            KnowledgeBase::default()
        }
    };
    info!(
        "{} centers, {} schedules, {} tutors",
        knowledge.centers.len(),
        knowledge.schedules.len(),
        knowledge.tutors.len()
    );

    if config.telegram_bot_token.is_empty() {
        warn!("TELEGRAM_BOT_TOKEN is not set, Telegram will reject every send");
    }

    let telegram = TelegramClient::new(&config.telegram_bot_token, config.telegram_api_url.clone());
    let state = Arc::new(BotState::new(knowledge, telegram));
    let app = router(state, &config.webhook_path);

    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {e}", config.bind_addr);
            std::process::exit(1);
        }
    };
    info!("Webhook listening on http://{}{}", config.bind_addr, config.webhook_path);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {e}");
    }

    info!("👋 Shut down");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
