use teloxide::types::{CallbackQuery, ChatId, FileMeta, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioKind {
    Voice,
    Audio,
    VideoNote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioInput {
    pub kind: AudioKind,
    pub file_id: String,
    /// Size reported by the message; zero when Telegram did not say.
    pub size: u64,
    pub sender_id: u64,
}

/// One incoming update the bot knows how to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Text {
        chat_id: ChatId,
        text: String,
    },
    Audio {
        chat_id: ChatId,
        input: AudioInput,
    },
    ButtonPress {
        chat_id: ChatId,
        query_id: String,
        payload: String,
    },
}

impl InboundEvent {
    pub fn from_message(msg: Message) -> Option<Self> {
        let chat_id = msg.chat.id;

        if let Some(text) = msg.text() {
            return Some(InboundEvent::Text {
                chat_id,
                text: text.to_string(),
            });
        }

        let (kind, file) = audio_file(&msg)?;
        // Channel posts have no sender; the chat id is unique enough there.
        let sender_id = msg
            .from()
            .map(|user| user.id.0)
            .unwrap_or(chat_id.0.unsigned_abs());

        Some(InboundEvent::Audio {
            chat_id,
            input: AudioInput {
                kind,
                file_id: file.id.clone(),
                size: u64::from(file.size),
                sender_id,
            },
        })
    }

    pub fn from_callback(query: CallbackQuery) -> Option<Self> {
        let payload = query.data?;
        let chat_id = query
            .message
            .as_ref()
            .map(|msg| msg.chat.id)
            .unwrap_or(ChatId(query.from.id.0 as i64));

        Some(InboundEvent::ButtonPress {
            chat_id,
            query_id: query.id,
            payload,
        })
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            InboundEvent::Text { chat_id, .. }
            | InboundEvent::Audio { chat_id, .. }
            | InboundEvent::ButtonPress { chat_id, .. } => *chat_id,
        }
    }
}

fn audio_file(msg: &Message) -> Option<(AudioKind, &FileMeta)> {
    if let Some(voice) = msg.voice() {
        return Some((AudioKind::Voice, &voice.file));
    }
    if let Some(audio) = msg.audio() {
        return Some((AudioKind::Audio, &audio.file));
    }
    if let Some(note) = msg.video_note() {
        return Some((AudioKind::VideoNote, &note.file));
    }
    None
}
