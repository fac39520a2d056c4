pub mod link;
pub mod ytdlp;

pub use link::*;

use crate::payload::MediaFormat;
use async_trait::async_trait;
use log::warn;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("yt-dlp not found or not executable: {0}")]
    NotInstalled(String),
    #[error("yt-dlp failed: {0}")]
    Process(String),
    #[error("Invalid yt-dlp output: {0}")]
    InvalidOutput(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub thumbnail_url: String,
    pub duration_label: String,
    pub page_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
}

/// A readable media stream. `process` is the producer behind `reader`, if any,
/// and must be finished or aborted once the reader is done with.
pub struct MediaStream {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub file_name: String,
    pub process: Option<StreamProducer>,
}

/// A child process writing media to its stdout. Its stderr is drained in the
/// background so a chatty producer never blocks on a full pipe.
pub struct StreamProducer {
    child: Child,
    stderr: Option<JoinHandle<String>>,
}

impl StreamProducer {
    pub fn new(mut child: Child) -> Self {
        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut text = String::new();
                if let Err(e) = pipe.read_to_string(&mut text).await {
                    warn!("Failed to read producer stderr: {}", e);
                }
                text
            })
        });
        Self { child, stderr }
    }

    /// Waits for the producer to exit. A non-zero exit means the stream was cut short.
    pub async fn finish(mut self) -> Result<(), VideoError> {
        let status = self.child.wait().await?;
        let stderr = match self.stderr.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(VideoError::Process(format!(
                "stream producer exited with {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// Kills the producer after the consumer gave up on the stream.
    pub async fn abort(mut self) {
        if let Err(e) = self.child.kill().await {
            warn!("Failed to stop stream producer: {}", e);
        }
        if let Some(task) = self.stderr.take() {
            task.abort();
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Ordered candidates for `query`; an empty list is not an error.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, VideoError>;
}

#[async_trait]
pub trait VideoHost: Send + Sync {
    async fn fetch_info(&self, url: &str) -> Result<VideoInfo, VideoError>;

    async fn open_stream(
        &self,
        video_id: &str,
        format: MediaFormat,
    ) -> Result<MediaStream, VideoError>;
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

pub fn default_thumbnail(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", video_id)
}

/// `m:ss` below an hour, `h:mm:ss` above, `live` when the length is unknown.
pub fn format_duration(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| s.is_finite() && *s >= 0.0) else {
        return "live".to_string();
    };
    let total = seconds.round() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
