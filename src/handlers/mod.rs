pub mod download;
pub mod recognize;
pub mod search;

use crate::config::BotConfig;
use crate::event::InboundEvent;
use crate::messenger::Keyboard;
use crate::payload::{DownloadRequest, MediaFormat};
use crate::recognize::Recognizer;
use crate::router;
use crate::youtube::{SearchProvider, VideoHost, ytdlp::YtDlp};
use log::error;
use std::sync::Arc;
use teloxide::{prelude::*, utils::command::BotCommands};

/// External collaborators shared by all handlers.
#[derive(Clone)]
pub struct Services {
    pub search: Arc<dyn SearchProvider>,
    pub video: Arc<dyn VideoHost>,
    pub recognizer: Arc<dyn Recognizer>,
}

impl Services {
    pub fn from_config(config: &BotConfig) -> Self {
        let ytdlp = Arc::new(YtDlp::new(&config.ytdlp_bin));
        Self {
            search: ytdlp.clone(),
            video: ytdlp,
            recognizer: crate::recognize::from_config(config),
        }
    }
}

/// The MP3/MP4 button pair for a video.
pub fn download_keyboard(video_id: &str) -> Keyboard {
    Keyboard::default()
        .button(
            "🎵 Download MP3",
            DownloadRequest::new(MediaFormat::Audio, video_id).encode(),
        )
        .button(
            "🎬 Download MP4",
            DownloadRequest::new(MediaFormat::Video, video_id).encode(),
        )
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Display this help text")]
    Help,
}

pub async fn command_handler(bot: Bot, msg: Message, cmd: Command) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            let welcome_text = "👋 Hello! I'm a universal music bot.\n\n\
                🔻 What I can do:\n\
                🔍 Search: send me a song name.\n\
                🎤 Recognize: send a voice message, audio file or video note.\n\
                📥 Download: send a YouTube link.\n\n\
                🚀 Send me something to get started!";

            bot.send_message(msg.chat.id, welcome_text).await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
    }
    Ok(())
}

/// Runs one event to completion. Failures end here, logged, so the
/// dispatcher never sees them.
pub async fn event_handler(
    bot: Bot,
    event: InboundEvent,
    config: BotConfig,
    services: Services,
) -> ResponseResult<()> {
    if let Err(e) = router::dispatch(&bot, &services, &config, &event).await {
        error!("Chat {}: failed to handle event: {}", event.chat_id().0, e);
    }
    Ok(())
}
