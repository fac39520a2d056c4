pub mod audd;
pub mod songrec;

use crate::config::BotConfig;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecognizeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Unsupported or corrupted audio: {0}")]
    Format(String),
    #[error("Invalid response format: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("Recognizer not found or not executable: {0}")]
    NotInstalled(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerProvider {
    Songrec,
    Audd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub title: String,
    pub performer: String,
    pub cover_url: Option<String>,
}

#[async_trait]
pub trait Recognizer: Send + Sync {
    /// `Ok(None)` means the audio was readable but matched nothing.
    async fn recognize(&self, path: &Path) -> Result<Option<Track>, RecognizeError>;
}

pub fn from_config(config: &BotConfig) -> Arc<dyn Recognizer> {
    match config.recognizer {
        RecognizerProvider::Songrec => Arc::new(songrec::Songrec::new(&config.songrec_bin)),
        RecognizerProvider::Audd => Arc::new(audd::Audd::new(
            &config.audd_api_url,
            config.audd_api_token.clone().unwrap_or_default(),
        )),
    }
}
