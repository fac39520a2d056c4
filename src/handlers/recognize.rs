use super::Services;
use crate::artifact::AudioArtifact;
use crate::config::BotConfig;
use crate::event::AudioInput;
use crate::messenger::{
    Card, Keyboard, Messenger, RemoteFile, deliver_card, escape_markdown_v2, remove_quietly,
};
use crate::payload::{DownloadRequest, MediaFormat};
use crate::recognize::Track;
use crate::{BotError, Result};
use log::{error, info, warn};
use teloxide::types::ChatId;
use tokio::io::AsyncWriteExt;

pub const FILE_TOO_LARGE: &str = "⚠️ The file is too large. Please send a shorter clip.";
pub const NOT_IDENTIFIED: &str =
    "😔 Sorry, I couldn't identify this song. Try recording with less background noise.";
pub const SYSTEM_ERROR: &str = "⚠️ System error, or this file format is not supported.";

/// Identifies the song in a voice note, audio file or video note.
pub async fn handle_audio(
    messenger: &dyn Messenger,
    services: &Services,
    config: &BotConfig,
    chat_id: ChatId,
    input: &AudioInput,
) -> Result<()> {
    info!(
        "Chat {}: recognizing {:?} from user {} ({} bytes)",
        chat_id.0, input.kind, input.sender_id, input.size
    );

    let status = messenger
        .send_text(chat_id, "🎧 Listening... analysing the audio.")
        .await?;

    let outcome = identify(messenger, services, config, input).await;
    remove_quietly(messenger, chat_id, status).await;

    match outcome {
        Ok(Some(track)) => {
            info!(
                "Chat {}: identified {:?} by {:?}",
                chat_id.0, track.title, track.performer
            );
            let card = track_card(services, &track).await;
            if let Err(e) = deliver_card(messenger, chat_id, card).await {
                error!("Chat {}: failed to send track card: {}", chat_id.0, e);
                messenger.send_text(chat_id, SYSTEM_ERROR).await?;
            }
        }
        Ok(None) => {
            info!("Chat {}: no match", chat_id.0);
            messenger.send_text(chat_id, NOT_IDENTIFIED).await?;
        }
        Err(BotError::FileTooLarge { size, limit }) => {
            warn!(
                "Chat {}: rejected {} byte file (limit {})",
                chat_id.0, size, limit
            );
            messenger.send_text(chat_id, FILE_TOO_LARGE).await?;
        }
        Err(e) => {
            error!("Chat {}: recognition failed: {}", chat_id.0, e);
            messenger.send_text(chat_id, SYSTEM_ERROR).await?;
        }
    }
    Ok(())
}

async fn identify(
    messenger: &dyn Messenger,
    services: &Services,
    config: &BotConfig,
    input: &AudioInput,
) -> Result<Option<Track>> {
    check_size(input.size, config.max_recognition_bytes)?;

    let remote = messenger.resolve_file(&input.file_id).await?;
    check_size(remote.size, config.max_recognition_bytes)?;

    let artifact = AudioArtifact::create(&config.temp_dir, input.sender_id)?;
    let result = recognize_artifact(messenger, services, &remote, &artifact).await;
    artifact.release();
    result
}

async fn recognize_artifact(
    messenger: &dyn Messenger,
    services: &Services,
    remote: &RemoteFile,
    artifact: &AudioArtifact,
) -> Result<Option<Track>> {
    let mut writer = artifact.writer()?;
    messenger.fetch_file(remote, &mut writer).await?;
    writer.flush().await?;
    drop(writer);

    Ok(services.recognizer.recognize(artifact.path()).await?)
}

fn check_size(size: u64, limit: u64) -> Result<()> {
    if size > limit {
        return Err(BotError::FileTooLarge { size, limit });
    }
    Ok(())
}

/// The identified track, with a download button when YouTube has it.
async fn track_card(services: &Services, track: &Track) -> Card {
    let query = format!("{} {}", track.title, track.performer);
    let keyboard = match services.search.search(query.trim(), 1).await {
        Ok(results) => results.into_iter().next().map(|video| {
            Keyboard::default().button(
                "📥 Download MP3",
                DownloadRequest::new(MediaFormat::Audio, video.video_id).encode(),
            )
        }),
        Err(e) => {
            warn!("Follow-up search for {:?} failed: {}", query, e);
            None
        }
    };

    Card {
        photo_url: track.cover_url.clone(),
        caption: format!(
            "🎹 *Song identified\\!*\n\n🎤 *Artist:* {}\n🎼 *Title:* {}",
            escape_markdown_v2(&track.performer),
            escape_markdown_v2(&track.title)
        ),
        keyboard,
    }
}
