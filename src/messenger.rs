use crate::payload::MediaFormat;
use crate::{BotError, Result};
use async_trait::async_trait;
use teloxide::{
    net::Download,
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode},
};
use tokio::io::AsyncRead;

/// Escapes special characters for Telegram MarkdownV2 format
pub fn escape_markdown_v2(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|' | '{' | '}' | '.' | '!' | '\\' => {
                format!("\\{}", c)
            }
            _ => c.to_string(),
        })
        .collect()
}

/// Inside `(...)` of a MarkdownV2 link only `)` and `\` need escaping.
pub fn escape_markdown_v2_url(url: &str) -> String {
    url.replace('\\', "\\\\").replace(')', "\\)")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

/// Inline keyboard, one button per row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub buttons: Vec<Button>,
}

impl Keyboard {
    pub fn button(mut self, label: impl Into<String>, payload: impl Into<String>) -> Self {
        self.buttons.push(Button {
            label: label.into(),
            payload: payload.into(),
        });
        self
    }

    fn into_markup(self) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::new(
            self.buttons
                .into_iter()
                .map(|b| vec![InlineKeyboardButton::callback(b.label, b.payload)]),
        )
    }
}

/// A MarkdownV2 message, with a photo when `photo_url` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub photo_url: Option<String>,
    pub caption: String,
    pub keyboard: Option<Keyboard>,
}

pub struct OutgoingMedia {
    pub format: MediaFormat,
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub file_name: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub size: u64,
}

/// Everything the handlers need from the messaging platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageId>;

    async fn send_card(&self, chat_id: ChatId, card: Card) -> Result<MessageId>;

    /// Uploads `media` while it is being read; nothing is buffered locally.
    async fn send_media(&self, chat_id: ChatId, media: OutgoingMedia) -> Result<()>;

    async fn remove_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()>;

    async fn acknowledge(&self, query_id: &str, text: &str) -> Result<()>;

    async fn resolve_file(&self, file_id: &str) -> Result<RemoteFile>;

    async fn fetch_file(&self, file: &RemoteFile, dest: &mut tokio::fs::File) -> Result<()>;
}

/// Deletes a status message, logging instead of failing.
pub async fn remove_quietly(messenger: &dyn Messenger, chat_id: ChatId, message_id: MessageId) {
    if let Err(e) = messenger.remove_message(chat_id, message_id).await {
        log::warn!("Failed to delete status message {}: {}", message_id.0, e);
    }
}

/// Sends `card`, falling back to a text-only card when Telegram refuses the photo.
pub async fn deliver_card(
    messenger: &dyn Messenger,
    chat_id: ChatId,
    card: Card,
) -> Result<MessageId> {
    if card.photo_url.is_none() {
        return messenger.send_card(chat_id, card).await;
    }

    match messenger.send_card(chat_id, card.clone()).await {
        Ok(id) => Ok(id),
        Err(e) => {
            log::warn!("Chat {}: photo card rejected, sending text only: {}", chat_id.0, e);
            let text_only = Card {
                photo_url: None,
                ..card
            };
            messenger.send_card(chat_id, text_only).await
        }
    }
}

#[async_trait]
impl Messenger for Bot {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageId> {
        let sent = self.send_message(chat_id, text).await?;
        Ok(sent.id)
    }

    async fn send_card(&self, chat_id: ChatId, card: Card) -> Result<MessageId> {
        let markup = card.keyboard.map(Keyboard::into_markup);

        let sent = match card.photo_url {
            Some(photo_url) => {
                let url = reqwest::Url::parse(&photo_url).map_err(|e| {
                    BotError::Platform(format!("Invalid photo URL {}: {}", photo_url, e))
                })?;
                let mut request = self
                    .send_photo(chat_id, InputFile::url(url))
                    .caption(card.caption)
                    .parse_mode(ParseMode::MarkdownV2);
                if let Some(markup) = markup {
                    request = request.reply_markup(markup);
                }
                request.await?
            }
            None => {
                let mut request = self
                    .send_message(chat_id, card.caption)
                    .parse_mode(ParseMode::MarkdownV2);
                if let Some(markup) = markup {
                    request = request.reply_markup(markup);
                }
                request.await?
            }
        };

        Ok(sent.id)
    }

    async fn send_media(&self, chat_id: ChatId, media: OutgoingMedia) -> Result<()> {
        let input = InputFile::read(media.reader).file_name(media.file_name);

        match media.format {
            MediaFormat::Audio => {
                let mut request = self.send_audio(chat_id, input);
                if let Some(caption) = media.caption {
                    request = request.caption(caption);
                }
                request.await?;
            }
            MediaFormat::Video => {
                let mut request = self.send_video(chat_id, input).supports_streaming(true);
                if let Some(caption) = media.caption {
                    request = request.caption(caption);
                }
                request.await?;
            }
        }
        Ok(())
    }

    async fn remove_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.delete_message(chat_id, message_id).await?;
        Ok(())
    }

    async fn acknowledge(&self, query_id: &str, text: &str) -> Result<()> {
        self.answer_callback_query(query_id.to_string())
            .text(text)
            .await?;
        Ok(())
    }

    async fn resolve_file(&self, file_id: &str) -> Result<RemoteFile> {
        let file = self
            .get_file(file_id.to_string())
            .await
            .map_err(|e| BotError::FileResolution(e.to_string()))?;

        if file.path.is_empty() {
            return Err(BotError::FileResolution(format!(
                "no download path for file {}",
                file_id
            )));
        }

        Ok(RemoteFile {
            path: file.path,
            size: u64::from(file.meta.size),
        })
    }

    async fn fetch_file(&self, file: &RemoteFile, dest: &mut tokio::fs::File) -> Result<()> {
        self.download_file(&file.path, dest).await?;
        Ok(())
    }
}
