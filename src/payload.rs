use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DOWNLOAD_PREFIX: &str = "dl_";
/// Telegram rejects callback data longer than 64 bytes; `dl_mp3_` takes 7.
pub const MAX_VIDEO_ID_LEN: usize = 57;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PayloadError {
    #[error("unknown callback payload: {0}")]
    UnknownAction(String),
    #[error("unknown media format: {0}")]
    UnknownFormat(String),
    #[error("invalid video id: {0:?}")]
    InvalidVideoId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Audio,
    Video,
}

impl MediaFormat {
    pub fn token(self) -> &'static str {
        match self {
            MediaFormat::Audio => "mp3",
            MediaFormat::Video => "mp4",
        }
    }

    fn from_token(token: &str) -> Result<Self, PayloadError> {
        match token {
            "mp3" => Ok(MediaFormat::Audio),
            "mp4" => Ok(MediaFormat::Video),
            other => Err(PayloadError::UnknownFormat(other.to_string())),
        }
    }
}

/// A download button's self-describing payload: `dl_<mp3|mp4>_<video id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub format: MediaFormat,
    pub video_id: String,
}

impl DownloadRequest {
    pub fn new(format: MediaFormat, video_id: impl Into<String>) -> Self {
        Self {
            format,
            video_id: video_id.into(),
        }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DownloadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}_{}", DOWNLOAD_PREFIX, self.format.token(), self.video_id)
    }
}

impl FromStr for DownloadRequest {
    type Err = PayloadError;

    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        let rest = payload
            .strip_prefix(DOWNLOAD_PREFIX)
            .ok_or_else(|| PayloadError::UnknownAction(payload.to_string()))?;

        // Video ids may themselves contain '_', so only the first separator counts.
        let (token, video_id) = rest
            .split_once('_')
            .ok_or_else(|| PayloadError::UnknownFormat(rest.to_string()))?;

        let format = MediaFormat::from_token(token)?;

        if !is_valid_video_id(video_id) {
            return Err(PayloadError::InvalidVideoId(video_id.to_string()));
        }

        Ok(Self::new(format, video_id))
    }
}

pub fn is_valid_video_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_VIDEO_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
