use super::{Services, download_keyboard};
use crate::Result;
use crate::messenger::{
    Card, Messenger, deliver_card, escape_markdown_v2, escape_markdown_v2_url, remove_quietly,
};
use crate::payload::is_valid_video_id;
use crate::youtube::{SearchResult, VideoInfo, find_youtube_link};
use log::{error, info, warn};
use teloxide::types::ChatId;

pub const NOTHING_FOUND: &str = "❌ Nothing found.";
pub const SEARCH_FAILED: &str = "⚠️ Search failed. Please try again later.";
pub const INVALID_LINK: &str = "❌ The link is invalid or YouTube blocked it.";

const SEARCH_LIMIT: usize = 1;

/// Free text is either a YouTube link or a search phrase.
pub async fn handle_text(
    messenger: &dyn Messenger,
    services: &Services,
    chat_id: ChatId,
    text: &str,
) -> Result<()> {
    match find_youtube_link(text) {
        Some(url) => handle_link(messenger, services, chat_id, &url).await,
        None => handle_phrase(messenger, services, chat_id, text.trim()).await,
    }
}

async fn handle_link(
    messenger: &dyn Messenger,
    services: &Services,
    chat_id: ChatId,
    url: &str,
) -> Result<()> {
    info!("Chat {}: resolving link {}", chat_id.0, url);

    let status = messenger.send_text(chat_id, "⏳ Checking the link...").await?;
    let info = services.video.fetch_info(url).await;
    remove_quietly(messenger, chat_id, status).await;

    let delivered = match info {
        // channels and playlists resolve too, but their ids can't be downloaded
        Ok(info) if !is_valid_video_id(&info.video_id) => {
            warn!(
                "Chat {}: {} resolved to non-video id {:?}",
                chat_id.0, url, info.video_id
            );
            false
        }
        Ok(info) => match deliver_card(messenger, chat_id, link_card(&info)).await {
            Ok(_) => true,
            Err(e) => {
                error!("Chat {}: failed to send card for {}: {}", chat_id.0, url, e);
                false
            }
        },
        Err(e) => {
            error!("Chat {}: metadata fetch for {} failed: {}", chat_id.0, url, e);
            false
        }
    };

    if !delivered {
        messenger.send_text(chat_id, INVALID_LINK).await?;
    }
    Ok(())
}

async fn handle_phrase(
    messenger: &dyn Messenger,
    services: &Services,
    chat_id: ChatId,
    phrase: &str,
) -> Result<()> {
    info!("Chat {}: searching for {:?}", chat_id.0, phrase);

    let status = messenger
        .send_text(chat_id, &format!("🔎 Searching for \"{}\"...", phrase))
        .await?;
    let results = services.search.search(phrase, SEARCH_LIMIT).await;
    remove_quietly(messenger, chat_id, status).await;

    match results {
        Ok(results) => match results.into_iter().next() {
            Some(top) => {
                if let Err(e) = deliver_card(messenger, chat_id, search_card(&top)).await {
                    error!("Chat {}: failed to send result card: {}", chat_id.0, e);
                    messenger.send_text(chat_id, SEARCH_FAILED).await?;
                }
            }
            None => {
                messenger.send_text(chat_id, NOTHING_FOUND).await?;
            }
        },
        Err(e) => {
            error!("Chat {}: search for {:?} failed: {}", chat_id.0, phrase, e);
            messenger.send_text(chat_id, SEARCH_FAILED).await?;
        }
    }
    Ok(())
}

fn link_card(info: &VideoInfo) -> Card {
    Card {
        photo_url: Some(info.thumbnail_url.clone()),
        caption: format!(
            "📹 *{}*\n\nChoose a format:",
            escape_markdown_v2(&info.title)
        ),
        keyboard: Some(download_keyboard(&info.video_id)),
    }
}

fn search_card(result: &SearchResult) -> Card {
    Card {
        photo_url: Some(result.thumbnail_url.clone()),
        caption: format!(
            "🎼 *Found:* {}\n👤 *Channel:* {}\n⏱ *Duration:* {}\n🔗 [Watch on YouTube]({})",
            escape_markdown_v2(&result.title),
            escape_markdown_v2(&result.author),
            escape_markdown_v2(&result.duration_label),
            escape_markdown_v2_url(&result.page_url),
        ),
        keyboard: Some(download_keyboard(&result.video_id)),
    }
}
