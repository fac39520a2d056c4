mod artifact;
mod config;
mod event;
mod handlers;
mod keepalive;
mod messenger;
mod payload;
mod recognize;
mod router;
mod server;
#[cfg(test)]
mod testing;
mod youtube;

use config::BotConfig;
use dotenvy::dotenv;
use event::InboundEvent;
use log::info;
use teloxide::{error_handlers::LoggingErrorHandler, prelude::*, Bot};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),
    #[error("Telegram could not provide the file: {0}")]
    FileResolution(String),
    #[error("Platform error: {0}")]
    Platform(String),
    #[error("Download error: {0}")]
    Download(#[from] teloxide::DownloadError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Video host error: {0}")]
    Video(#[from] youtube::VideoError),
    #[error("Recognition error: {0}")]
    Recognize(#[from] recognize::RecognizeError),
    #[error("File of {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BotError>;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load environment variables
    dotenv().ok();

    info!("Starting music finder bot");

    let config = BotConfig::from_env()?;
    info!(
        "Using recognizer {:?}, yt-dlp at {:?}",
        config.recognizer, config.ytdlp_bin
    );

    let services = handlers::Services::from_config(&config);
    let bot = Bot::new(&config.telegram_token);

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<handlers::Command>()
                .endpoint(handlers::command_handler),
        )
        .branch(
            Update::filter_message()
                .filter_map(InboundEvent::from_message)
                .endpoint(handlers::event_handler),
        )
        .branch(
            Update::filter_callback_query()
                .filter_map(InboundEvent::from_callback)
                .endpoint(handlers::event_handler),
        );

    tokio::spawn(server::serve(config.port));

    match &config.keepalive_url {
        Some(url) => {
            keepalive::spawn(url.clone(), config.keepalive_interval);
        }
        None => info!("KEEPALIVE_URL not set, keepalive pinger disabled"),
    }

    info!("Bot started. Listening for updates...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![config, services])
        .default_handler(|upd| async move {
            log::debug!("Ignoring unsupported update {}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error from the update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");
    Ok(())
}
