use super::Services;
use crate::Result;
use crate::messenger::{Messenger, OutgoingMedia, remove_quietly};
use crate::payload::{DownloadRequest, MediaFormat};
use crate::youtube::MediaStream;
use log::{error, info, warn};
use teloxide::types::ChatId;

pub const DOWNLOAD_FAILED: &str =
    "🚫 The file is too large or the server failed. YouTube may be blocking the server.";
pub const EXPIRED_BUTTON: &str = "This button has expired.";

/// A press on one of the download buttons.
pub async fn handle_button(
    messenger: &dyn Messenger,
    services: &Services,
    chat_id: ChatId,
    query_id: &str,
    payload: &str,
) -> Result<()> {
    let request: DownloadRequest = match payload.parse() {
        Ok(request) => request,
        Err(e) => {
            warn!("Chat {}: ignoring button press: {}", chat_id.0, e);
            messenger.acknowledge(query_id, EXPIRED_BUTTON).await?;
            return Ok(());
        }
    };

    // Telegram keeps the button spinning until the press is answered.
    if let Err(e) = messenger.acknowledge(query_id, "📥 Downloading...").await {
        warn!("Chat {}: failed to answer button press: {}", chat_id.0, e);
    }

    info!(
        "Chat {}: streaming {} for video {}",
        chat_id.0,
        request.format.token(),
        request.video_id
    );

    let status = messenger
        .send_text(
            chat_id,
            &format!(
                "🚀 Starting {} download...",
                request.format.token().to_uppercase()
            ),
        )
        .await?;

    let result = relay(messenger, services, chat_id, &request).await;
    remove_quietly(messenger, chat_id, status).await;

    if let Err(e) = result {
        error!(
            "Chat {}: download of {} failed: {}",
            chat_id.0, request.video_id, e
        );
        messenger.send_text(chat_id, DOWNLOAD_FAILED).await?;
    }
    Ok(())
}

async fn relay(
    messenger: &dyn Messenger,
    services: &Services,
    chat_id: ChatId,
    request: &DownloadRequest,
) -> Result<()> {
    let MediaStream {
        reader,
        file_name,
        process,
    } = services
        .video
        .open_stream(&request.video_id, request.format)
        .await?;

    let media = OutgoingMedia {
        format: request.format,
        reader,
        file_name,
        caption: match request.format {
            MediaFormat::Audio => None,
            MediaFormat::Video => Some("🎬 Here you go!".to_string()),
        },
    };

    let sent = messenger.send_media(chat_id, media).await;

    // yt-dlp dying mid-stream looks like a clean EOF to the upload.
    match process {
        Some(producer) if sent.is_err() => producer.abort().await,
        Some(producer) => producer.finish().await?,
        None => {}
    }

    sent
}
