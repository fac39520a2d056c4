//! In-memory collaborators for handler tests.

use crate::config::BotConfig;
use crate::handlers::Services;
use crate::messenger::{Card, Messenger, OutgoingMedia, RemoteFile};
use crate::payload::MediaFormat;
use crate::recognize::{RecognizeError, Recognizer, Track};
use crate::youtube::{
    MediaStream, SearchProvider, SearchResult, VideoError, VideoHost, VideoInfo,
};
use crate::{BotError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use teloxide::types::{ChatId, MessageId};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub fn search_result(id: &str, title: &str) -> SearchResult {
    SearchResult {
        video_id: id.to_string(),
        title: title.to_string(),
        author: "Channel".to_string(),
        thumbnail_url: format!("https://img/{}.jpg", id),
        duration_label: "3:05".to_string(),
        page_url: format!("https://www.youtube.com/watch?v={}", id),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text(String),
    Card(Card),
    Media {
        format: MediaFormat,
        file_name: String,
        bytes: usize,
    },
    Removed(MessageId),
    Ack(String),
    Resolved(String),
    Fetched(String),
}

pub struct FakeMessenger {
    events: Mutex<Vec<Sent>>,
    next_id: AtomicI32,
    remote_bytes: Vec<u8>,
    remote_size: Option<u64>,
    fail_deletes: bool,
    fail_resolve: bool,
    fail_fetch: bool,
    fail_media: bool,
    fail_photos: bool,
}

impl Default for FakeMessenger {
    fn default() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(100),
            remote_bytes: b"OggS fake voice note".to_vec(),
            remote_size: None,
            fail_deletes: false,
            fail_resolve: false,
            fail_fetch: false,
            fail_media: false,
            fail_photos: false,
        }
    }
}

impl FakeMessenger {
    pub fn remote_size(mut self, size: u64) -> Self {
        self.remote_size = Some(size);
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn failing_resolve(mut self) -> Self {
        self.fail_resolve = true;
        self
    }

    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn failing_media(mut self) -> Self {
        self.fail_media = true;
        self
    }

    /// Rejects every card that carries a photo, as Telegram does for URLs it can't fetch.
    pub fn failing_photos(mut self) -> Self {
        self.fail_photos = true;
        self
    }

    pub fn remote_bytes(&self) -> Vec<u8> {
        self.remote_bytes.clone()
    }

    pub fn events(&self) -> Vec<Sent> {
        self.events.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Sent::Text(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn cards(&self) -> Vec<Card> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Sent::Card(card) => Some(card),
                _ => None,
            })
            .collect()
    }

    pub fn removed(&self) -> Vec<MessageId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Sent::Removed(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Sent::Fetched(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: Sent) {
        self.events.lock().unwrap().push(event);
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send_text(&self, _chat_id: ChatId, text: &str) -> Result<MessageId> {
        self.record(Sent::Text(text.to_string()));
        Ok(self.next_message_id())
    }

    async fn send_card(&self, _chat_id: ChatId, card: Card) -> Result<MessageId> {
        if self.fail_photos && card.photo_url.is_some() {
            return Err(BotError::Platform(
                "Bad Request: wrong file identifier/HTTP URL specified".to_string(),
            ));
        }
        self.record(Sent::Card(card));
        Ok(self.next_message_id())
    }

    async fn send_media(&self, _chat_id: ChatId, mut media: OutgoingMedia) -> Result<()> {
        if self.fail_media {
            // rejected after the first chunk, with the rest of the stream unread
            let mut chunk = [0u8; 16];
            media.reader.read(&mut chunk).await?;
            return Err(BotError::Platform("Request Entity Too Large".to_string()));
        }
        let mut data = Vec::new();
        media.reader.read_to_end(&mut data).await?;
        self.record(Sent::Media {
            format: media.format,
            file_name: media.file_name,
            bytes: data.len(),
        });
        Ok(())
    }

    async fn remove_message(&self, _chat_id: ChatId, message_id: MessageId) -> Result<()> {
        if self.fail_deletes {
            return Err(BotError::Platform("message can't be deleted".to_string()));
        }
        self.record(Sent::Removed(message_id));
        Ok(())
    }

    async fn acknowledge(&self, _query_id: &str, text: &str) -> Result<()> {
        self.record(Sent::Ack(text.to_string()));
        Ok(())
    }

    async fn resolve_file(&self, file_id: &str) -> Result<RemoteFile> {
        if self.fail_resolve {
            return Err(BotError::FileResolution("file is temporarily unavailable".to_string()));
        }
        self.record(Sent::Resolved(file_id.to_string()));
        Ok(RemoteFile {
            path: format!("voice/{}.oga", file_id),
            size: self
                .remote_size
                .unwrap_or(self.remote_bytes.len() as u64),
        })
    }

    async fn fetch_file(&self, file: &RemoteFile, dest: &mut tokio::fs::File) -> Result<()> {
        self.record(Sent::Fetched(file.path.clone()));
        if self.fail_fetch {
            let half = self.remote_bytes.len() / 2;
            dest.write_all(&self.remote_bytes[..half]).await?;
            return Err(BotError::Io(std::io::Error::other("connection reset")));
        }
        dest.write_all(&self.remote_bytes).await?;
        Ok(())
    }
}

pub struct FakeSearch {
    results: Option<Vec<SearchResult>>,
    queries: Mutex<Vec<String>>,
}

impl Default for FakeSearch {
    fn default() -> Self {
        Self::returning(Vec::new())
    }
}

impl FakeSearch {
    pub fn returning(results: Vec<SearchResult>) -> Self {
        Self {
            results: Some(results),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            results: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str, _limit: usize) -> std::result::Result<Vec<SearchResult>, VideoError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.results
            .clone()
            .ok_or_else(|| VideoError::Process("HTTP Error 429: Too Many Requests".to_string()))
    }
}

#[derive(Default)]
pub struct FakeVideo {
    info: Option<VideoInfo>,
    stream: Option<Vec<u8>>,
    fetched: Mutex<Vec<String>>,
    opened: Mutex<Vec<(String, MediaFormat)>>,
}

impl FakeVideo {
    pub fn with_info(id: &str, title: &str) -> Self {
        Self {
            info: Some(VideoInfo {
                video_id: id.to_string(),
                title: title.to_string(),
                thumbnail_url: format!("https://img/{}.jpg", id),
            }),
            ..Self::default()
        }
    }

    pub fn streaming(bytes: Vec<u8>) -> Self {
        Self {
            stream: Some(bytes),
            ..Self::default()
        }
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn opened_streams(&self) -> Vec<(String, MediaFormat)> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoHost for FakeVideo {
    async fn fetch_info(&self, url: &str) -> std::result::Result<VideoInfo, VideoError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.info
            .clone()
            .ok_or_else(|| VideoError::Process("Video unavailable".to_string()))
    }

    async fn open_stream(
        &self,
        video_id: &str,
        format: MediaFormat,
    ) -> std::result::Result<MediaStream, VideoError> {
        self.opened
            .lock()
            .unwrap()
            .push((video_id.to_string(), format));
        let bytes = self
            .stream
            .clone()
            .ok_or_else(|| VideoError::Process("Sign in to confirm you're not a bot".to_string()))?;
        Ok(MediaStream {
            reader: Box::new(std::io::Cursor::new(bytes)),
            file_name: format!("{}.{}", video_id, format.token()),
            process: None,
        })
    }
}

/// A `yt-dlp` stand-in: a shell script running `body`, whatever the arguments.
#[cfg(unix)]
pub fn stub_ytdlp(dir: &Path, body: &str) -> crate::youtube::ytdlp::YtDlp {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("yt-dlp");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    crate::youtube::ytdlp::YtDlp::new(path.to_string_lossy())
}

enum Outcome {
    Match(Track),
    NoMatch,
    Fail,
}

pub struct FakeRecognizer {
    outcome: Outcome,
    seen: Mutex<Vec<(PathBuf, Option<Vec<u8>>)>>,
}

impl Default for FakeRecognizer {
    fn default() -> Self {
        Self::no_match()
    }
}

impl FakeRecognizer {
    fn with(outcome: Outcome) -> Self {
        Self {
            outcome,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn matching(title: &str, performer: &str) -> Self {
        Self::with(Outcome::Match(Track {
            title: title.to_string(),
            performer: performer.to_string(),
            cover_url: Some("https://img/cover.jpg".to_string()),
        }))
    }

    pub fn no_match() -> Self {
        Self::with(Outcome::NoMatch)
    }

    pub fn failing() -> Self {
        Self::with(Outcome::Fail)
    }

    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn file_existed_during_call(&self) -> bool {
        let seen = self.seen.lock().unwrap();
        !seen.is_empty() && seen.iter().all(|(_, bytes)| bytes.is_some())
    }

    pub fn seen_bytes(&self) -> Vec<Vec<u8>> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, bytes)| bytes.clone())
            .collect()
    }
}

#[async_trait]
impl Recognizer for FakeRecognizer {
    async fn recognize(&self, path: &Path) -> std::result::Result<Option<Track>, RecognizeError> {
        let bytes = std::fs::read(path).ok();
        self.seen
            .lock()
            .unwrap()
            .push((path.to_path_buf(), bytes));

        match &self.outcome {
            Outcome::Match(track) => Ok(Some(track.clone())),
            Outcome::NoMatch => Ok(None),
            Outcome::Fail => Err(RecognizeError::Format("invalid data found when processing input".to_string())),
        }
    }
}

/// Fakes wired into [`Services`], with a private temp dir for artifacts.
pub struct Harness {
    pub messenger: FakeMessenger,
    pub search: Arc<FakeSearch>,
    pub video: Arc<FakeVideo>,
    pub recognizer: Arc<FakeRecognizer>,
    pub services: Services,
    pub config: BotConfig,
    pub temp_dir: TempDir,
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }
}

#[derive(Default)]
pub struct HarnessBuilder {
    messenger: FakeMessenger,
    search: FakeSearch,
    video: FakeVideo,
    recognizer: FakeRecognizer,
}

impl HarnessBuilder {
    pub fn with_messenger(mut self, messenger: FakeMessenger) -> Self {
        self.messenger = messenger;
        self
    }

    pub fn with_search(mut self, search: FakeSearch) -> Self {
        self.search = search;
        self
    }

    pub fn with_video(mut self, video: FakeVideo) -> Self {
        self.video = video;
        self
    }

    pub fn with_recognizer(mut self, recognizer: FakeRecognizer) -> Self {
        self.recognizer = recognizer;
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.messenger = self.messenger.failing_deletes();
        self
    }

    pub fn build(self) -> Harness {
        let temp_dir = TempDir::new().unwrap();
        let temp_path = temp_dir.path().to_string_lossy().into_owned();
        let config = BotConfig::from_lookup(|key| match key {
            "TELEGRAM_BOT_TOKEN" => Some("123:test".to_string()),
            "TEMP_DIR" => Some(temp_path.clone()),
            _ => None,
        })
        .unwrap();

        let search = Arc::new(self.search);
        let video = Arc::new(self.video);
        let recognizer = Arc::new(self.recognizer);
        let services = Services {
            search: search.clone(),
            video: video.clone(),
            recognizer: recognizer.clone(),
        };

        Harness {
            messenger: self.messenger,
            search,
            video,
            recognizer,
            services,
            config,
            temp_dir,
        }
    }
}
